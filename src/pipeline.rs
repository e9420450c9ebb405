//! Pipeline orchestration
//!
//! This module provides the public entry point of the analyzer. It runs the
//! stages over the three datasets and assembles the report:
//!
//! 1. CsvIngest - read each dataset directory into one table
//! 2. FeatureDeriver - typed records with derived features
//! 3. DateRangeFilter - keep the configured window
//! 4. StatisticsWriter + charts - per-dataset summaries and plots
//! 5. Merger - sleep and activity joined on date, with its own summary
//! 6. ReportAssembler - narrative, statistics, top days and plot list

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::info;
use uuid::Uuid;

use crate::charts::{ChartRenderer, PlotReference};
use crate::config::AnalyzerConfig;
use crate::convert::DocumentConverter;
use crate::datasets::{ActivityDeriver, ActivityStageDeriver, FeatureDeriver, SleepDeriver};
use crate::error::{AnalyzerError, Result};
use crate::ingest::read_csv_dir;
use crate::merge::merge;
use crate::report::{ReportAssembler, ReportInputs, ReportOutcome, RowCounts, RunManifest};
use crate::statistics::{StatisticsArtifacts, StatisticsWriter};
use crate::table::Dated;
use crate::types::Dataset;
use crate::window::{DateWindow, DerivedTable};

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub rows: RowCounts,
    pub statistics: Vec<StatisticsArtifacts>,
    pub plots: Vec<PlotReference>,
    pub report: ReportOutcome,
    pub manifest: PathBuf,
    pub elapsed: Duration,
}

/// Run the whole analysis with the converter named in `config`.
///
/// # Example
/// ```ignore
/// let config = AnalyzerConfig {
///     input_directory: "export".into(),
///     ..AnalyzerConfig::default()
/// };
/// let summary = analyze(&config)?;
/// println!("report at {}", summary.report.markdown.display());
/// ```
pub fn analyze(config: &AnalyzerConfig) -> Result<RunSummary> {
    MifitAnalyzer::new(config.clone()).run()
}

/// Analyzer with an injectable converter and report date
pub struct MifitAnalyzer {
    config: AnalyzerConfig,
    converter: Box<dyn DocumentConverter>,
    today: NaiveDate,
}

impl MifitAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let converter = config.converter.build();
        Self {
            config,
            converter,
            today: Local::now().date_naive(),
        }
    }

    /// Replace the converter chosen by the configuration
    pub fn with_converter(mut self, converter: Box<dyn DocumentConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Date printed in the report header
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn input_dir(&self, dataset: Dataset) -> PathBuf {
        let subdirectory = dataset.input_subdirectory().unwrap_or_else(|| dataset.as_str());
        self.config.input_directory.join(subdirectory)
    }

    /// Stages 1-3 for one dataset
    fn load<D>(
        &self,
        deriver: &D,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DerivedTable<D::Output>>
    where
        D: FeatureDeriver,
        D::Output: Dated,
    {
        let dataset = deriver.dataset();

        // Stage 1: Combine every CSV file of the dataset
        let raw = read_csv_dir(&self.input_dir(dataset))?;

        // Stage 2: Typed records plus derived features
        let table = DerivedTable::new(deriver.derive(&raw)?);
        info!("Derived {} {} records", table.len(), dataset);

        // Stage 3: Date window, bounds defaulting to the data's own range
        let table = match table.window(start, end) {
            Some(window) => table.filter(&window),
            None => table,
        };
        info!("{} {} records inside the date window", table.len(), dataset);
        Ok(table)
    }

    pub fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        info!("Run {} started with input {}", run_id, self.config.input_directory.display());

        let layout = self.config.layout();
        layout.create_dirs()?;
        let (start, end) = self.config.window_bounds()?;

        let sleep = self.load(&SleepDeriver::new(self.config.hours_difference), start, end)?;
        let activity = self.load(&ActivityDeriver, start, end)?;
        let activity_stage = self.load(&ActivityStageDeriver, start, end)?;

        // Stage 4: Statistics and charts per dataset
        let writer = StatisticsWriter::new(&layout.statistics, self.converter.as_ref());
        let charts = ChartRenderer::new(&layout.plots, &self.config.charts);
        let mut statistics = vec![
            writer.write(Dataset::Sleep, sleep.rows())?,
            writer.write(Dataset::Activity, activity.rows())?,
            writer.write(Dataset::ActivityStage, activity_stage.rows())?,
        ];
        let mut plots = charts.sleep(sleep.rows());
        plots.extend(charts.activity(activity.rows()));

        // Stage 5: Sleep and activity on the same days
        let merged = merge(sleep.rows(), activity.rows())?;
        statistics.push(writer.write(Dataset::SleepActivity, &merged)?);
        plots.extend(charts.sleep_activity(&merged));
        plots.extend(charts.activity_stage(activity_stage.rows()));

        // Stage 6: Report
        let assembler = ReportAssembler::new(&self.config, &layout, self.converter.as_ref());
        let report = assembler.assemble(
            ReportInputs {
                sleep: sleep.rows(),
                activity: activity.rows(),
                merged: &merged,
                statistics: &statistics,
                plots: &plots,
            },
            self.today,
        )?;

        let rows = RowCounts {
            sleep: sleep.len(),
            activity: activity.len(),
            activity_stage: activity_stage.len(),
            sleep_activity: merged.len(),
        };
        let manifest = RunManifest {
            run_id,
            generated_on: self.today,
            version: crate::VERSION.to_string(),
            window: DateWindow::of(activity.rows()),
            rows: rows.clone(),
            totals: report.totals.clone(),
            plots: plots.clone(),
        };
        let manifest_path = layout.report.join("manifest.json");
        manifest.write(&manifest_path)?;

        let elapsed = started.elapsed();
        info!("Run {} finished in {:.2?}", run_id, elapsed);

        Ok(RunSummary {
            run_id,
            rows,
            statistics,
            plots,
            report,
            manifest: manifest_path,
            elapsed,
        })
    }
}

/// Input directories that exist and the CSV files found in each
pub fn inspect_inputs(input_directory: &Path) -> Vec<(Dataset, Result<Vec<PathBuf>>)> {
    [Dataset::Sleep, Dataset::Activity, Dataset::ActivityStage]
        .into_iter()
        .filter_map(|dataset| {
            let subdirectory = dataset.input_subdirectory()?;
            let files = crate::ingest::find_csv_files(&input_directory.join(subdirectory))
                .and_then(|files| {
                    if files.is_empty() {
                        Err(AnalyzerError::NoInputFiles(input_directory.join(subdirectory)))
                    } else {
                        Ok(files)
                    }
                });
            Some((dataset, files))
        })
        .collect()
}
