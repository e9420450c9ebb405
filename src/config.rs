//! Run configuration
//!
//! Every setting has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! input_directory = "data"
//! start_date = "2023.01.01"
//! daily_steps_goal = 10000
//!
//! [charts]
//! width = 1600
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::convert::ConverterKind;
use crate::error::{AnalyzerError, Result};

/// Chart rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub enabled: bool,
    /// Pixels
    pub width: u32,
    /// Pixels
    pub height: u32,
    pub title_font_size: u32,
    pub label_font_size: u32,
    /// TrueType font; a system font is looked up when unset
    pub font_path: Option<PathBuf>,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 1200,
            height: 800,
            title_font_size: 20,
            label_font_size: 16,
            font_path: None,
        }
    }
}

/// Settings of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Root holding the `SLEEP`, `ACTIVITY` and `ACTIVITY_STAGE` directories
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    /// Window start, in `date_format`
    pub start_date: Option<String>,
    /// Window end, in `date_format`
    pub end_date: Option<String>,
    pub date_format: String,
    /// Hours added to UTC sleep timestamps
    pub hours_difference: i32,
    pub daily_steps_goal: u64,
    pub user_name: String,
    pub top_step_days_number: usize,
    pub converter: ConverterKind,
    /// Convert the Markdown report to HTML
    pub render_html: bool,
    pub charts: ChartStyle,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("data"),
            output_directory: PathBuf::from("results"),
            start_date: None,
            end_date: None,
            date_format: "%Y.%m.%d".to_string(),
            hours_difference: 0,
            daily_steps_goal: 8000,
            user_name: "Username".to_string(),
            top_step_days_number: 10,
            converter: ConverterKind::Builtin,
            render_html: true,
            charts: ChartStyle::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| AnalyzerError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| AnalyzerError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AnalyzerError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AnalyzerError::io(parent, e))?;
        }
        fs::write(path, self.to_toml()?).map_err(|e| AnalyzerError::io(path, e))
    }

    /// Parsed window bounds; a start after the end is rejected
    pub fn window_bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let start = self
            .start_date
            .as_deref()
            .map(|s| parse_date_with_format(s, &self.date_format))
            .transpose()?;
        let end = self
            .end_date
            .as_deref()
            .map(|s| parse_date_with_format(s, &self.date_format))
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AnalyzerError::Config(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        Ok((start, end))
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_directory)
    }
}

/// Parse a date with a strftime-style format. Formats carrying a time of
/// day are accepted; the time is dropped.
pub fn parse_date_with_format(value: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format)
        .or_else(|_| NaiveDateTime::parse_from_str(value.trim(), format).map(|dt| dt.date()))
        .map_err(|_| AnalyzerError::InvalidDate {
            value: value.to_string(),
            format: format.to_string(),
        })
}

/// Format a date with a strftime-style format, rejecting unknown specifiers
pub fn format_date_with(date: NaiveDate, format: &str) -> Result<String> {
    use std::fmt::Write;

    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .map_err(|_| AnalyzerError::Config(format!("invalid date format '{format}'")))?;
    Ok(out)
}

/// Output directory tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub statistics: PathBuf,
    pub plots: PathBuf,
    pub report: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            statistics: root.join("statistics"),
            plots: root.join("plots"),
            report: root.join("report"),
            root,
        }
    }

    /// Create every directory; existing ones are left alone
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [&self.statistics, &self.plots, &self.report] {
            fs::create_dir_all(dir).map_err(|e| AnalyzerError::io(dir, e))?;
        }
        Ok(())
    }

    /// Create every directory and write then remove a marker file in each
    pub fn check_writable(&self) -> Result<()> {
        self.create_dirs()?;
        for dir in [&self.statistics, &self.plots, &self.report] {
            let marker = dir.join(".mifit-write-check");
            fs::write(&marker, b"").map_err(|e| AnalyzerError::io(&marker, e))?;
            fs::remove_file(&marker).map_err(|e| AnalyzerError::io(&marker, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.date_format, "%Y.%m.%d");
        assert_eq!(config.daily_steps_goal, 8000);
        assert_eq!(config.top_step_days_number, 10);
        assert_eq!(config.user_name, "Username");
        assert_eq!(config.charts.width, 1200);
        assert_eq!(config.converter, ConverterKind::Builtin);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalyzerConfig::from_toml_str(
            r#"
            user_name = "Alex"
            converter = "pandoc"

            [charts]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.user_name, "Alex");
        assert_eq!(config.converter, ConverterKind::Pandoc);
        assert!(!config.charts.enabled);
        assert_eq!(config.charts.height, 800);
        assert_eq!(config.daily_steps_goal, 8000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AnalyzerConfig::from_toml_str("daily_steps_goal = \"many\"").unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("mifit.toml");
        let config = AnalyzerConfig {
            start_date: Some("2023.01.01".into()),
            hours_difference: 3,
            ..AnalyzerConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(AnalyzerConfig::from_toml_file(&path).unwrap(), config);
    }

    #[test]
    fn test_window_bounds() {
        let config = AnalyzerConfig {
            start_date: Some("2023.01.05".into()),
            ..AnalyzerConfig::default()
        };
        let (start, end) = config.window_bounds().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 1, 5));
        assert_eq!(end, None);

        let reversed = AnalyzerConfig {
            start_date: Some("2023.02.01".into()),
            end_date: Some("2023.01.01".into()),
            ..AnalyzerConfig::default()
        };
        assert!(matches!(reversed.window_bounds(), Err(AnalyzerError::Config(_))));
    }

    #[test]
    fn test_parse_date_with_format() {
        assert_eq!(
            parse_date_with_format("2023-03-04 10:00", "%Y-%m-%d %H:%M").unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 4).unwrap()
        );
        let err = parse_date_with_format("04/03/2023", "%Y.%m.%d").unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidDate { .. }));
    }

    #[test]
    fn test_format_date_with() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 9).unwrap();
        assert_eq!(format_date_with(date, "%Y.%m.%d").unwrap(), "2023.01.09");
        assert!(matches!(format_date_with(date, "%Q"), Err(AnalyzerError::Config(_))));
    }

    #[test]
    fn test_layout_create_dirs_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path().join("results"));

        layout.create_dirs().unwrap();
        layout.create_dirs().unwrap();

        assert!(layout.statistics.is_dir());
        assert!(layout.plots.is_dir());
        assert!(layout.report.is_dir());
    }

    #[test]
    fn test_check_writable() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path().join("results"));

        layout.check_writable().unwrap();

        assert!(layout.report.is_dir());
        assert!(!layout.report.join(".mifit-write-check").exists());
    }

    #[test]
    fn test_check_writable_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("results");
        fs::write(&root, "not a directory").unwrap();

        let err = OutputLayout::new(&root).check_writable().unwrap_err();
        assert!(matches!(err, AnalyzerError::Io { .. }));
    }
}
