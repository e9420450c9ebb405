//! Per-dataset feature derivation
//!
//! Each record kind (sleep, activity, activity stage) has a deriver that parses
//! the rows of a [`RawTable`] into typed records and appends the derived
//! calendar, duration and ratio features.

mod activity;
mod activity_stage;
mod sleep;

pub use activity::ActivityDeriver;
pub use activity_stage::ActivityStageDeriver;
pub use sleep::SleepDeriver;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{AnalyzerError, Result};
use crate::features::{parse_date, parse_timestamp};
use crate::table::RawTable;
use crate::types::Dataset;

/// Trait for dataset feature derivers
///
/// Derivation is a pure function of each raw record: the same raw record
/// always yields the same derived record, independent of row order or of any
/// filtering applied afterwards.
pub trait FeatureDeriver {
    /// Typed raw record
    type Raw;
    /// Raw record plus derived features
    type Output;

    fn dataset(&self) -> Dataset;

    /// Parse the rows of a combined table into typed raw records
    fn parse(&self, table: &RawTable) -> Result<Vec<Self::Raw>>;

    /// Compute the derived features of one record
    fn derive_record(&self, raw: &Self::Raw) -> Self::Output;

    /// Parse and derive every row of `table`
    fn derive(&self, table: &RawTable) -> Result<Vec<Self::Output>> {
        let raw = self.parse(table)?;
        Ok(raw.iter().map(|r| self.derive_record(r)).collect())
    }
}

/// Row-level cell parsing with errors that point at the offending row
struct RowParser<'a> {
    dataset: Dataset,
    /// 1-based data row number
    row: usize,
    cells: &'a [String],
}

impl<'a> RowParser<'a> {
    fn new(dataset: Dataset, index: usize, cells: &'a [String]) -> Self {
        Self {
            dataset,
            row: index + 1,
            cells,
        }
    }

    fn invalid(&self, column: &str, value: &str, expected: &str) -> AnalyzerError {
        AnalyzerError::InvalidRecord {
            dataset: self.dataset.to_string(),
            row: self.row,
            message: format!("column '{column}' has value '{value}', expected {expected}"),
        }
    }

    fn cell(&self, index: usize) -> &'a str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    /// Floating point cell; an empty cell is NaN
    fn number(&self, index: usize, column: &str) -> Result<f64> {
        let value = self.cell(index);
        if value.is_empty() {
            return Ok(f64::NAN);
        }
        value
            .parse::<f64>()
            .map_err(|_| self.invalid(column, value, "a number"))
    }

    /// Non-negative whole count; `"120.0"` is accepted as 120
    fn count(&self, index: usize, column: &str) -> Result<u64> {
        let value = self.cell(index);
        if let Ok(n) = value.parse::<u64>() {
            return Ok(n);
        }
        match value.parse::<f64>() {
            Ok(f) if f >= 0.0 && f.fract() == 0.0 && f.is_finite() => Ok(f as u64),
            _ => Err(self.invalid(column, value, "a non-negative whole number")),
        }
    }

    fn date(&self, index: usize, column: &str) -> Result<NaiveDate> {
        let value = self.cell(index);
        parse_date(value).ok_or_else(|| self.invalid(column, value, "a date or epoch seconds"))
    }

    fn timestamp(&self, index: usize, column: &str) -> Result<NaiveDateTime> {
        let value = self.cell(index);
        parse_timestamp(value)
            .ok_or_else(|| self.invalid(column, value, "a timestamp or epoch seconds"))
    }
}
