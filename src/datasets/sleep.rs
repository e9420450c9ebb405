//! Sleep dataset deriver
//!
//! Raw columns: `date`, `start`, `stop` (epoch seconds), `deepSleepTime`,
//! `shallowSleepTime` (minutes).

use chrono::NaiveDate;

use crate::error::Result;
use crate::features::{calendar, decimal_hour, month_index, round2, shift_hours, weekday_index};
use crate::table::{Columnar, Dated, RawTable};
use crate::types::{Dataset, DerivedSleep, SleepRecord};

use super::{FeatureDeriver, RowParser};

const REQUIRED_COLUMNS: [&str; 5] = ["date", "start", "stop", "deepSleepTime", "shallowSleepTime"];

/// Sleep deriver
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepDeriver {
    /// Offset (hours) added to the UTC start/stop timestamps to get local time
    hours_difference: i32,
}

impl SleepDeriver {
    pub fn new(hours_difference: i32) -> Self {
        Self { hours_difference }
    }
}

impl FeatureDeriver for SleepDeriver {
    type Raw = SleepRecord;
    type Output = DerivedSleep;

    fn dataset(&self) -> Dataset {
        Dataset::Sleep
    }

    fn parse(&self, table: &RawTable) -> Result<Vec<SleepRecord>> {
        let [date, start, stop, deep, shallow] =
            table.require_columns(Dataset::Sleep.as_str(), REQUIRED_COLUMNS)?;

        table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                let row = RowParser::new(Dataset::Sleep, i, cells);
                Ok(SleepRecord {
                    date: row.date(date, "date")?,
                    start: row.timestamp(start, "start")?,
                    stop: row.timestamp(stop, "stop")?,
                    deep_sleep_time: row.number(deep, "deepSleepTime")?,
                    shallow_sleep_time: row.number(shallow, "shallowSleepTime")?,
                })
            })
            .collect()
    }

    fn derive_record(&self, raw: &SleepRecord) -> DerivedSleep {
        let total_sleep_time = raw.deep_sleep_time + raw.shallow_sleep_time;

        let deep_sleep_time_hours = round2(raw.deep_sleep_time / 60.0);
        let shallow_sleep_time_hours = round2(raw.shallow_sleep_time / 60.0);
        let total_sleep_time_hours = round2(total_sleep_time / 60.0);

        let start_real = shift_hours(raw.start, self.hours_difference);
        let stop_real = shift_hours(raw.stop, self.hours_difference);

        DerivedSleep {
            raw: raw.clone(),
            total_sleep_time,
            deep_sleep_time_hours,
            shallow_sleep_time_hours,
            total_sleep_time_hours,
            start_real,
            stop_real,
            start_time_real: decimal_hour(start_real),
            stop_time_real: decimal_hour(stop_real),
            start_calendar: calendar(start_real),
            stop_calendar: calendar(stop_real),
            // 0/0 stays NaN
            deep_total_sleep_ratio: deep_sleep_time_hours / total_sleep_time_hours,
        }
    }
}

impl Columnar for DerivedSleep {
    const COLUMNS: &'static [&'static str] = &[
        "deepSleepTime",
        "shallowSleepTime",
        "totalSleepTime",
        "deepSleepTime_hours",
        "shallowSleepTime_hours",
        "totalSleepTime_hours",
        "start_time_real",
        "stop_time_real",
        "start_weekday_real",
        "stop_weekday_real",
        "start_month_real",
        "stop_month_real",
        "year_real",
        "deep_total_sleep_ratio",
    ];

    fn value(&self, column: &str) -> Option<f64> {
        let value = match column {
            "deepSleepTime" => self.raw.deep_sleep_time,
            "shallowSleepTime" => self.raw.shallow_sleep_time,
            "totalSleepTime" => self.total_sleep_time,
            "deepSleepTime_hours" => self.deep_sleep_time_hours,
            "shallowSleepTime_hours" => self.shallow_sleep_time_hours,
            "totalSleepTime_hours" => self.total_sleep_time_hours,
            "start_time_real" => self.start_time_real,
            "stop_time_real" => self.stop_time_real,
            "start_weekday_real" => weekday_index(self.start_calendar.weekday) as f64,
            "stop_weekday_real" => weekday_index(self.stop_calendar.weekday) as f64,
            "start_month_real" => month_index(self.start_calendar.month) as f64,
            "stop_month_real" => month_index(self.stop_calendar.month) as f64,
            "year_real" => self.start_calendar.year as f64,
            "deep_total_sleep_ratio" => self.deep_total_sleep_ratio,
            _ => return None,
        };
        Some(value)
    }
}

impl Dated for DerivedSleep {
    fn date(&self) -> NaiveDate {
        self.raw.date
    }
}
