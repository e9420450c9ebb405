//! Activity dataset deriver
//!
//! Raw columns: `date` (epoch seconds or ISO date), `steps`, `distance`,
//! `runDistance`, `calories`.

use chrono::NaiveDate;

use crate::error::Result;
use crate::features::{calendar_of_date, month_index, weekday_index};
use crate::table::{Columnar, Dated, RawTable};
use crate::types::{ActivityRecord, Dataset, DerivedActivity};

use super::{FeatureDeriver, RowParser};

const REQUIRED_COLUMNS: [&str; 5] = ["date", "steps", "distance", "runDistance", "calories"];

/// Daily activity deriver
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityDeriver;

impl FeatureDeriver for ActivityDeriver {
    type Raw = ActivityRecord;
    type Output = DerivedActivity;

    fn dataset(&self) -> Dataset {
        Dataset::Activity
    }

    fn parse(&self, table: &RawTable) -> Result<Vec<ActivityRecord>> {
        let [date, steps, distance, run_distance, calories] =
            table.require_columns(Dataset::Activity.as_str(), REQUIRED_COLUMNS)?;

        table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                let row = RowParser::new(Dataset::Activity, i, cells);
                Ok(ActivityRecord {
                    date: row.date(date, "date")?,
                    steps: row.count(steps, "steps")?,
                    distance: row.number(distance, "distance")?,
                    run_distance: row.number(run_distance, "runDistance")?,
                    calories: row.number(calories, "calories")?,
                })
            })
            .collect()
    }

    fn derive_record(&self, raw: &ActivityRecord) -> DerivedActivity {
        DerivedActivity {
            raw: raw.clone(),
            calendar: calendar_of_date(raw.date),
        }
    }
}

impl Columnar for DerivedActivity {
    const COLUMNS: &'static [&'static str] = &[
        "steps",
        "distance",
        "runDistance",
        "calories",
        "date_weekday",
        "date_month",
        "year",
    ];

    fn value(&self, column: &str) -> Option<f64> {
        let value = match column {
            "steps" => self.raw.steps as f64,
            "distance" => self.raw.distance,
            "runDistance" => self.raw.run_distance,
            "calories" => self.raw.calories,
            "date_weekday" => weekday_index(self.calendar.weekday) as f64,
            "date_month" => month_index(self.calendar.month) as f64,
            "year" => self.calendar.year as f64,
            _ => return None,
        };
        Some(value)
    }
}

impl Dated for DerivedActivity {
    fn date(&self) -> NaiveDate {
        self.raw.date
    }
}
