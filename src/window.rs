//! Date window filtering
//!
//! A [`DerivedTable`] owns the derived records of one dataset together with the
//! date range they covered when loaded. Filtering by a [`DateWindow`] equal to
//! that range is a no-op, so re-filtering with the same bounds never changes
//! the result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::table::Dated;

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Min/max date of `rows`, `None` when there are no rows
    pub fn of<T: Dated>(rows: &[T]) -> Option<Self> {
        let mut dates = rows.iter().map(Dated::date);
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end })
    }

    /// Fill in missing bounds from `range`
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, range: DateWindow) -> Self {
        Self {
            start: start.unwrap_or(range.start),
            end: end.unwrap_or(range.end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Derived records of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable<T> {
    rows: Vec<T>,
    /// Date range of the rows as first loaded, kept across filtering
    loaded_range: Option<DateWindow>,
}

impl<T: Dated> DerivedTable<T> {
    pub fn new(rows: Vec<T>) -> Self {
        let loaded_range = DateWindow::of(&rows);
        Self { rows, loaded_range }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Date range of the rows as first loaded
    pub fn loaded_range(&self) -> Option<DateWindow> {
        self.loaded_range
    }

    /// Date range of the current rows
    pub fn date_range(&self) -> Option<DateWindow> {
        DateWindow::of(&self.rows)
    }

    /// Window with missing bounds defaulted to the loaded range
    pub fn window(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<DateWindow> {
        self.loaded_range
            .map(|range| DateWindow::resolve(start, end, range))
    }

    /// Keep only rows whose date lies inside `window`.
    ///
    /// Returns the table untouched when `window` equals the loaded range.
    pub fn filter(self, window: &DateWindow) -> Self {
        if self.loaded_range.as_ref() == Some(window) {
            return self;
        }

        let before = self.rows.len();
        let rows: Vec<T> = self
            .rows
            .into_iter()
            .filter(|row| window.contains(row.date()))
            .collect();
        debug!(
            "Date window {}..={} kept {} of {} rows",
            window.start,
            window.end,
            rows.len(),
            before
        );

        Self {
            rows,
            loaded_range: self.loaded_range,
        }
    }
}
