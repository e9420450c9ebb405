//! Sleep + activity merge
//!
//! Inner join of the derived sleep and activity records on calendar date.
//! Days present on only one side are dropped: the bracelet can log a night of
//! sleep without a paired activity day and vice versa.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AnalyzerError, Result};
use crate::features::{month_index, weekday_index};
use crate::table::{Columnar, Dated};
use crate::types::{Calendar, DerivedActivity, DerivedSleep};

/// One day with both a sleep session and an activity summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepActivityRecord {
    pub date: NaiveDate,
    pub total_sleep_time_hours: f64,
    pub deep_sleep_time_hours: f64,
    pub shallow_sleep_time_hours: f64,
    pub start_time_real: f64,
    pub stop_time_real: f64,
    pub deep_total_sleep_ratio: f64,
    pub steps: u64,
    pub distance: f64,
    pub run_distance: f64,
    pub calories: f64,
    /// Calendar of the activity day
    pub calendar: Calendar,
}

impl SleepActivityRecord {
    fn join(sleep: &DerivedSleep, activity: &DerivedActivity) -> Self {
        Self {
            date: sleep.raw.date,
            total_sleep_time_hours: sleep.total_sleep_time_hours,
            deep_sleep_time_hours: sleep.deep_sleep_time_hours,
            shallow_sleep_time_hours: sleep.shallow_sleep_time_hours,
            start_time_real: sleep.start_time_real,
            stop_time_real: sleep.stop_time_real,
            deep_total_sleep_ratio: sleep.deep_total_sleep_ratio,
            steps: activity.raw.steps,
            distance: activity.raw.distance,
            run_distance: activity.raw.run_distance,
            calories: activity.raw.calories,
            calendar: activity.calendar,
        }
    }
}

impl Columnar for SleepActivityRecord {
    const COLUMNS: &'static [&'static str] = &[
        "totalSleepTime_hours",
        "deepSleepTime_hours",
        "shallowSleepTime_hours",
        "start_time_real",
        "stop_time_real",
        "deep_total_sleep_ratio",
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
            "totalSleepTime_hours" => self.total_sleep_time_hours,
            "deepSleepTime_hours" => self.deep_sleep_time_hours,
            "shallowSleepTime_hours" => self.shallow_sleep_time_hours,
            "start_time_real" => self.start_time_real,
            "stop_time_real" => self.stop_time_real,
            "deep_total_sleep_ratio" => self.deep_total_sleep_ratio,
            "steps" => self.steps as f64,
            "distance" => self.distance,
            "runDistance" => self.run_distance,
            "calories" => self.calories,
            "date_weekday" => weekday_index(self.calendar.weekday) as f64,
            "date_month" => month_index(self.calendar.month) as f64,
            "year" => self.calendar.year as f64,
            _ => return None,
        };
        Some(value)
    }
}

impl Dated for SleepActivityRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Inner join on date.
///
/// Output follows sleep row order; a date repeated on either side yields every
/// sleep × activity pair for it, activity rows in their own order.
pub fn merge(sleep: &[DerivedSleep], activity: &[DerivedActivity]) -> Result<Vec<SleepActivityRecord>> {
    let mut by_date: HashMap<NaiveDate, Vec<&DerivedActivity>> = HashMap::new();
    for record in activity {
        by_date.entry(record.raw.date).or_default().push(record);
    }

    let merged: Vec<SleepActivityRecord> = sleep
        .iter()
        .flat_map(|s| {
            by_date
                .get(&s.raw.date)
                .into_iter()
                .flatten()
                .map(move |a| SleepActivityRecord::join(s, a))
        })
        .collect();

    if merged.is_empty() {
        return Err(AnalyzerError::EmptyJoin);
    }

    if merged.len() < sleep.len() || merged.len() < activity.len() {
        warn!(
            "{} sleep and {} activity rows merged into {} days; unmatched days are dropped",
            sleep.len(),
            activity.len(),
            merged.len()
        );
    } else {
        info!("Merged {} sleep+activity days", merged.len());
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{ActivityDeriver, FeatureDeriver, SleepDeriver};
    use crate::table::RawTable;
    use pretty_assertions::assert_eq;

    fn sleep(dates: &[&str]) -> Vec<DerivedSleep> {
        let table = RawTable::from_rows(
            ["date", "start", "stop", "deepSleepTime", "shallowSleepTime"],
            dates
                .iter()
                .map(|d| vec![d.to_string(), "1672612200".into(), "1672637400".into(), "60".into(), "360".into()]),
        );
        SleepDeriver::new(0).derive(&table).unwrap()
    }

    fn activity(rows: &[(&str, u64)]) -> Vec<DerivedActivity> {
        let table = RawTable::from_rows(
            ["date", "steps", "distance", "runDistance", "calories"],
            rows.iter()
                .map(|(d, steps)| vec![d.to_string(), steps.to_string(), "5000".into(), "0".into(), "200".into()]),
        );
        ActivityDeriver.derive(&table).unwrap()
    }

    #[test]
    fn test_inner_join_keeps_only_shared_dates() {
        let merged = merge(
            &sleep(&["2023-01-01", "2023-01-02", "2023-01-04"]),
            &activity(&[("2023-01-02", 9000), ("2023-01-03", 100), ("2023-01-04", 4000)]),
        )
        .unwrap();

        let dates: Vec<String> = merged.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2023-01-02", "2023-01-04"]);
        assert_eq!(merged[0].steps, 9000);
        assert_eq!(merged[0].total_sleep_time_hours, 7.0);
        assert_eq!(merged[1].value("steps"), Some(4000.0));
    }

    #[test]
    fn test_merged_count_bounded_by_inputs_without_duplicates() {
        let s = sleep(&["2023-01-01", "2023-01-02", "2023-01-03"]);
        let a = activity(&[("2023-01-02", 1), ("2023-01-03", 2)]);
        let merged = merge(&s, &a).unwrap();
        assert!(merged.len() <= s.len().min(a.len()));
    }

    #[test]
    fn test_duplicate_dates_yield_every_pair() {
        let merged = merge(
            &sleep(&["2023-01-01", "2023-01-01"]),
            &activity(&[("2023-01-01", 10), ("2023-01-01", 20)]),
        )
        .unwrap();

        let steps: Vec<u64> = merged.iter().map(|r| r.steps).collect();
        assert_eq!(steps, vec![10, 20, 10, 20]);
    }

    #[test]
    fn test_disjoint_dates_fail() {
        let err = merge(&sleep(&["2023-01-01"]), &activity(&[("2023-02-01", 1)])).unwrap_err();
        assert!(matches!(err, AnalyzerError::EmptyJoin));
    }
}
