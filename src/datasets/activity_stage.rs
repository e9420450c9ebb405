//! Activity stage dataset deriver
//!
//! Raw columns: `date`, `start`, `stop`, `steps`, `distance`, `calories`.
//! `start`/`stop` are full timestamps or, as in the bracelet export, a bare
//! time of day that belongs to the row's `date`.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::error::Result;
use crate::features::{calendar_of_date, decimal_hour, parse_time_of_day, weekday_index};
use crate::table::{Columnar, Dated, RawTable};
use crate::types::{ActivityStageRecord, Dataset, DerivedActivityStage};

use super::{FeatureDeriver, RowParser};

const REQUIRED_COLUMNS: [&str; 6] = ["date", "start", "stop", "steps", "distance", "calories"];

/// Activity stage deriver
///
/// Zero-length stages are kept: their per-minute ratios are NaN (0/0) or
/// infinite (x/0), following IEEE arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityStageDeriver;

impl ActivityStageDeriver {
    fn stage_timestamp(
        row: &RowParser<'_>,
        index: usize,
        column: &str,
        date: NaiveDate,
    ) -> Result<NaiveDateTime> {
        match parse_time_of_day(row.cell(index)) {
            Some(time) => Ok(date.and_time(time)),
            None => row.timestamp(index, column),
        }
    }
}

impl FeatureDeriver for ActivityStageDeriver {
    type Raw = ActivityStageRecord;
    type Output = DerivedActivityStage;

    fn dataset(&self) -> Dataset {
        Dataset::ActivityStage
    }

    fn parse(&self, table: &RawTable) -> Result<Vec<ActivityStageRecord>> {
        let [date, start, stop, steps, distance, calories] =
            table.require_columns(Dataset::ActivityStage.as_str(), REQUIRED_COLUMNS)?;

        table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                let row = RowParser::new(Dataset::ActivityStage, i, cells);
                let day = row.date(date, "date")?;
                let start_ts = Self::stage_timestamp(&row, start, "start", day)?;
                let mut stop_ts = Self::stage_timestamp(&row, stop, "stop", day)?;
                // A time-of-day stage that ends before it starts ran past midnight
                if stop_ts < start_ts && parse_time_of_day(row.cell(stop)).is_some() {
                    stop_ts += Duration::days(1);
                }
                Ok(ActivityStageRecord {
                    date: day,
                    start: start_ts,
                    stop: stop_ts,
                    steps: row.count(steps, "steps")?,
                    distance: row.number(distance, "distance")?,
                    calories: row.number(calories, "calories")?,
                })
            })
            .collect()
    }

    fn derive_record(&self, raw: &ActivityStageRecord) -> DerivedActivityStage {
        let minute_difference = (raw.stop - raw.start).num_seconds() as f64 / 60.0;
        let steps_per_minute = raw.steps as f64 / minute_difference;
        let meters_per_minute = raw.distance / minute_difference;
        let meters_per_second = meters_per_minute / 60.0;
        let kilometers_per_hour = meters_per_second * 3600.0 / 1000.0;

        DerivedActivityStage {
            raw: raw.clone(),
            minute_difference,
            steps_per_minute,
            meters_per_minute,
            meters_per_second,
            kilometers_per_hour,
            start_hour: decimal_hour(raw.start),
            stop_hour: decimal_hour(raw.stop),
            calendar: calendar_of_date(raw.date),
        }
    }

    fn derive(&self, table: &RawTable) -> Result<Vec<DerivedActivityStage>> {
        let raw = self.parse(table)?;
        let derived: Vec<DerivedActivityStage> = raw.iter().map(|r| self.derive_record(r)).collect();

        let zero_length = derived.iter().filter(|d| d.minute_difference == 0.0).count();
        if zero_length > 0 {
            warn!(
                "{} activity stages have zero duration; their per-minute ratios are NaN or infinite",
                zero_length
            );
        }

        Ok(derived)
    }
}

impl Columnar for DerivedActivityStage {
    const COLUMNS: &'static [&'static str] = &[
        "steps",
        "distance",
        "calories",
        "minute_difference",
        "steps_per_minute",
        "meters_per_minute",
        "meters_per_second",
        "kilometers_per_hour",
        "start_hour",
        "stop_hour",
        "weekday",
    ];

    fn value(&self, column: &str) -> Option<f64> {
        let value = match column {
            "steps" => self.raw.steps as f64,
            "distance" => self.raw.distance,
            "calories" => self.raw.calories,
            "minute_difference" => self.minute_difference,
            "steps_per_minute" => self.steps_per_minute,
            "meters_per_minute" => self.meters_per_minute,
            "meters_per_second" => self.meters_per_second,
            "kilometers_per_hour" => self.kilometers_per_hour,
            "start_hour" => self.start_hour,
            "stop_hour" => self.stop_hour,
            "weekday" => weekday_index(self.calendar.weekday) as f64,
            _ => return None,
        };
        Some(value)
    }
}

impl Dated for DerivedActivityStage {
    fn date(&self) -> NaiveDate {
        self.raw.date
    }
}
