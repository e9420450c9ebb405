//! Core types for the MiFit analyzer pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw records as exported by the bracelet, derived feature records,
//! and the merged sleep+activity record.

use chrono::{Month, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Dataset identifier, used for directory names, file names and log context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Sleep,
    Activity,
    ActivityStage,
    SleepActivity,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Sleep => "sleep",
            Dataset::Activity => "activity",
            Dataset::ActivityStage => "activity_stage",
            Dataset::SleepActivity => "sleep_activity",
        }
    }

    /// Subdirectory of the input root holding this dataset's CSV files.
    ///
    /// The merged dataset has no input of its own.
    pub fn input_subdirectory(&self) -> Option<&'static str> {
        match self {
            Dataset::Sleep => Some("SLEEP"),
            Dataset::Activity => Some("ACTIVITY"),
            Dataset::ActivityStage => Some("ACTIVITY_STAGE"),
            Dataset::SleepActivity => None,
        }
    }

    /// Base name (without extension) of the statistics summary files
    pub fn statistics_file_stem(&self) -> String {
        format!("{}_statistics", self.as_str())
    }

    /// Ordered (column, display label) pairs summarized for this dataset
    pub fn summary_columns(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Dataset::Sleep => SLEEP_SUMMARY_COLUMNS,
            Dataset::Activity => ACTIVITY_SUMMARY_COLUMNS,
            Dataset::ActivityStage => ACTIVITY_STAGE_SUMMARY_COLUMNS,
            Dataset::SleepActivity => SLEEP_ACTIVITY_SUMMARY_COLUMNS,
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const SLEEP_SUMMARY_COLUMNS: &[(&str, &str)] = &[
    ("totalSleepTime_hours", "Total sleep time (hours)"),
    ("deepSleepTime_hours", "Deep sleep time (hours)"),
    ("shallowSleepTime_hours", "Shallow sleep time (hours)"),
    ("start_time_real", "Start sleep time"),
    ("stop_time_real", "Stop sleep time"),
    ("deep_total_sleep_ratio", "Deep sleep time/Total sleep time ratio"),
];

const ACTIVITY_SUMMARY_COLUMNS: &[(&str, &str)] = &[
    ("steps", "Steps"),
    ("distance", "Distance"),
    ("runDistance", "Run distance"),
    ("calories", "Calories"),
];

const ACTIVITY_STAGE_SUMMARY_COLUMNS: &[(&str, &str)] = &[
    ("distance", "Distance, (meters)"),
    ("calories", "Calories"),
    ("steps", "Steps"),
    ("minute_difference", "Stage duration, (minutes)"),
    ("steps_per_minute", "Steps/min"),
    ("meters_per_minute", "m/min"),
    ("meters_per_second", "m/s"),
    ("kilometers_per_hour", "km/h"),
];

const SLEEP_ACTIVITY_SUMMARY_COLUMNS: &[(&str, &str)] = &[
    ("totalSleepTime_hours", "Total sleep time (hours)"),
    ("deepSleepTime_hours", "Deep sleep time (hours)"),
    ("shallowSleepTime_hours", "Shallow sleep time (hours)"),
    ("start_time_real", "Start sleep time"),
    ("stop_time_real", "Stop sleep time"),
    ("deep_total_sleep_ratio", "Deep sleep time/Total sleep time ratio"),
    ("steps", "Steps"),
    ("distance", "Distance"),
    ("runDistance", "Run distance"),
    ("calories", "Calories"),
];

/// Calendar breakdown of a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub weekday: Weekday,
    pub month: Month,
    pub year: i32,
}

/// One sleep session as exported by the bracelet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Calendar day the session is attributed to
    pub date: NaiveDate,
    /// Session start (UTC)
    pub start: NaiveDateTime,
    /// Session end (UTC)
    pub stop: NaiveDateTime,
    /// Deep sleep duration (minutes)
    pub deep_sleep_time: f64,
    /// Shallow sleep duration (minutes)
    pub shallow_sleep_time: f64,
}

/// One day of activity totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub date: NaiveDate,
    pub steps: u64,
    /// Walked distance (meters)
    pub distance: f64,
    /// Run distance (meters)
    pub run_distance: f64,
    pub calories: f64,
}

/// One activity "stage" segment (a continuous walk or run)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStageRecord {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub steps: u64,
    /// Distance (meters)
    pub distance: f64,
    pub calories: f64,
}

/// Sleep record with derived features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSleep {
    pub raw: SleepRecord,
    /// Deep + shallow (minutes)
    pub total_sleep_time: f64,
    pub deep_sleep_time_hours: f64,
    pub shallow_sleep_time_hours: f64,
    pub total_sleep_time_hours: f64,
    /// Start shifted by the configured timezone offset
    pub start_real: NaiveDateTime,
    /// Stop shifted by the configured timezone offset
    pub stop_real: NaiveDateTime,
    /// Decimal hour of `start_real`
    pub start_time_real: f64,
    /// Decimal hour of `stop_real`
    pub stop_time_real: f64,
    pub start_calendar: Calendar,
    pub stop_calendar: Calendar,
    /// Deep / total sleep hours; NaN when total is zero
    pub deep_total_sleep_ratio: f64,
}

/// Activity record with derived features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedActivity {
    pub raw: ActivityRecord,
    pub calendar: Calendar,
}

/// Activity stage record with derived kinematics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedActivityStage {
    pub raw: ActivityStageRecord,
    /// stop - start (minutes)
    pub minute_difference: f64,
    pub steps_per_minute: f64,
    pub meters_per_minute: f64,
    pub meters_per_second: f64,
    pub kilometers_per_hour: f64,
    /// Decimal hour of `start`
    pub start_hour: f64,
    /// Decimal hour of `stop`
    pub stop_hour: f64,
    pub calendar: Calendar,
}
