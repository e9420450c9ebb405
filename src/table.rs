//! Tabular views over records
//!
//! [`RawTable`] is the untyped result of reading a directory of CSV files.
//! [`Columnar`] and [`Dated`] give typed records the by-name column access the
//! statistics and filtering stages need.

use chrono::NaiveDate;

use crate::error::{AnalyzerError, Result};

/// Rows of one or more CSV files sharing a header
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from literal headers and rows
    pub fn from_rows<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let mut table = Self::new(headers.into_iter().map(Into::into).collect());
        for row in rows {
            table.push(row.into_iter().map(Into::into).collect());
        }
        table
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Resolve every name in `columns`, failing on the first one that is absent
    pub fn require_columns<const N: usize>(
        &self,
        dataset: &str,
        columns: [&str; N],
    ) -> Result<[usize; N]> {
        let mut indices = [0usize; N];
        for (slot, name) in indices.iter_mut().zip(columns) {
            *slot = self
                .column_index(name)
                .ok_or_else(|| AnalyzerError::MissingColumn {
                    dataset: dataset.to_string(),
                    column: name.to_string(),
                })?;
        }
        Ok(indices)
    }
}

/// Numeric by-name column access for derived records
pub trait Columnar {
    /// Names of every numeric column the record type exposes
    const COLUMNS: &'static [&'static str];

    /// Value of a numeric column, `None` when the record has no such column
    fn value(&self, column: &str) -> Option<f64>;
}

/// Records attributed to a calendar day
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Extract one column from a slice of records, failing when it is unknown
pub fn column_values<T: Columnar>(rows: &[T], column: &str) -> Result<Vec<f64>> {
    if !T::COLUMNS.contains(&column) {
        return Err(AnalyzerError::ColumnNotFound(column.to_string()));
    }
    Ok(rows
        .iter()
        .map(|row| row.value(column).unwrap_or(f64::NAN))
        .collect())
}
