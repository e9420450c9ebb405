//! Descriptive statistics
//!
//! Summaries follow the shape of a dataframe `describe()`: count, mean, sample
//! standard deviation, min, quartiles and max per column. NaN values are
//! skipped; infinities take part in the arithmetic.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::convert::{csv_to_markdown, DocumentConverter};
use crate::error::{AnalyzerError, Result};
use crate::features::round2;
use crate::table::{column_values, Columnar};
use crate::types::Dataset;

/// Row labels of a statistics file, in order
pub const STATISTIC_NAMES: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Linear interpolation percentile of a sorted slice, `p` in 0..=100
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let rank = (p / 100.0) * (len as f64 - 1.0);
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            if lo == hi {
                return sorted[lo];
            }
            let frac = rank - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}

/// Summary of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: f64,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    /// Describe `values`, ignoring NaN
    pub fn describe(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = if n == 0 {
            f64::NAN
        } else {
            sorted.iter().sum::<f64>() / n as f64
        };
        let std = if n < 2 {
            f64::NAN
        } else {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };

        Self {
            count: n as f64,
            mean,
            std,
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: percentile(&sorted, 25.0),
            q50: percentile(&sorted, 50.0),
            q75: percentile(&sorted, 75.0),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }

    /// Values in [`STATISTIC_NAMES`] order
    pub fn values(&self) -> [f64; 8] {
        [
            self.count, self.mean, self.std, self.min, self.q25, self.q50, self.q75, self.max,
        ]
    }

    /// Every value rounded to 2 decimals
    pub fn rounded(&self) -> Self {
        Self {
            count: round2(self.count),
            mean: round2(self.mean),
            std: round2(self.std),
            min: round2(self.min),
            q25: round2(self.q25),
            q50: round2(self.q50),
            q75: round2(self.q75),
            max: round2(self.max),
        }
    }
}

/// Rounded summaries of several columns under display labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsTable {
    pub labels: Vec<String>,
    pub summaries: Vec<Summary>,
}

impl StatisticsTable {
    /// Summarize `columns` (column, label) of `rows`, keeping the given order
    pub fn summarize<T: Columnar>(rows: &[T], columns: &[(&str, &str)]) -> Result<Self> {
        let mut labels = Vec::with_capacity(columns.len());
        let mut summaries = Vec::with_capacity(columns.len());
        for (column, label) in columns {
            let values = column_values(rows, column)?;
            labels.push(label.to_string());
            summaries.push(Summary::describe(&values).rounded());
        }
        Ok(Self { labels, summaries })
    }

    pub fn get(&self, label: &str) -> Option<&Summary> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| &self.summaries[i])
    }

    /// Write as CSV: an unnamed index column of statistic names, then one
    /// column per label.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| AnalyzerError::io(path, e))?;
        let mut writer = csv::Writer::from_writer(file);
        let csv_err = |source| AnalyzerError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut header = vec![String::new()];
        header.extend(self.labels.iter().cloned());
        writer.write_record(&header).map_err(csv_err)?;

        for (i, name) in STATISTIC_NAMES.iter().enumerate() {
            let mut record = vec![name.to_string()];
            record.extend(self.summaries.iter().map(|s| format_value(s.values()[i])));
            writer.write_record(&record).map_err(csv_err)?;
        }

        writer
            .flush()
            .map_err(|e| AnalyzerError::io(path, e))
    }
}

/// Two-decimal cell text; NaN is an empty cell
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:.2}")
    }
}

/// Files produced for one statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsArtifacts {
    pub dataset: Dataset,
    pub csv: PathBuf,
    /// Absent when conversion failed
    pub markdown: Option<PathBuf>,
}

/// Writes statistics summaries into the statistics directory
pub struct StatisticsWriter<'a> {
    directory: &'a Path,
    converter: &'a dyn DocumentConverter,
}

impl<'a> StatisticsWriter<'a> {
    pub fn new(directory: &'a Path, converter: &'a dyn DocumentConverter) -> Self {
        Self {
            directory,
            converter,
        }
    }

    /// Summarize the dataset's summary columns and write
    /// `<dataset>_statistics.csv`, then its Markdown rendering.
    pub fn write<T: Columnar>(&self, dataset: Dataset, rows: &[T]) -> Result<StatisticsArtifacts> {
        let table = StatisticsTable::summarize(rows, dataset.summary_columns())?;
        let csv = self
            .directory
            .join(format!("{}.csv", dataset.statistics_file_stem()));
        table.write_csv(&csv)?;
        info!("Wrote {} statistics for {} rows to {}", dataset, rows.len(), csv.display());

        let markdown = csv_to_markdown(self.converter, &csv);
        Ok(StatisticsArtifacts {
            dataset,
            csv,
            markdown,
        })
    }
}
