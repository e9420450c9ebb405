//! Report assembly
//!
//! The report is a Markdown document with a fixed section order: front
//! matter, headline narrative, sleep, activity and activity stage statistics,
//! the top step days table, then the chart list. The statistics sections are
//! read back from the Markdown files this run's statistics stage produced, so
//! a conversion that failed fails the run.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::charts::PlotReference;
use crate::config::{format_date_with, AnalyzerConfig, OutputLayout};
use crate::convert::{csv_to_markdown, DocumentConverter};
use crate::error::{AnalyzerError, Result};
use crate::statistics::StatisticsArtifacts;
use crate::features::{round2, weekday_name};
use crate::merge::SleepActivityRecord;
use crate::table::Dated;
use crate::types::{Dataset, DerivedActivity, DerivedSleep};
use crate::window::DateWindow;

const TOP_STEP_DAYS_STEM: &str = "top_step_days";
const TOP_STEP_DAYS_COLUMNS: [&str; 5] = ["Date", "Day", "Steps", "Distance", "Run distance"];

/// Headline totals of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalRecords {
    pub start_date: String,
    pub end_date: String,
    /// Calendar days from first to last activity day, both included
    pub span_days: i64,
    /// Activity days with data
    pub available_days: usize,
    pub available_days_percent: f64,
    pub daily_steps_goal: u64,
    pub daily_steps_goal_achieved_days: usize,
    pub daily_steps_goal_achieved_days_percent: f64,
    pub total_sleep_days_number: f64,
    pub total_sleep_days_percent: f64,
    pub total_distance_kilometers: f64,
    pub total_distance_kilosteps: f64,
    pub total_burned_kilocalories: f64,
    pub total_run_kilometers: f64,
    /// Meters per step
    pub stride_length: f64,
}

/// Total distance over total steps; NaN without steps
pub fn stride_length(distance: f64, steps: u64) -> f64 {
    if steps == 0 {
        return f64::NAN;
    }
    distance / steps as f64
}

impl TotalRecords {
    pub fn compute(
        sleep: &[DerivedSleep],
        activity: &[DerivedActivity],
        daily_steps_goal: u64,
        date_format: &str,
    ) -> Result<Self> {
        let window = DateWindow::of(activity);
        let (start_date, end_date) = match window {
            Some(w) => (format_date_with(w.start, date_format)?, format_date_with(w.end, date_format)?),
            None => (String::new(), String::new()),
        };
        let span_days = window.map(|w| w.days()).unwrap_or(0);
        let days = activity.len();

        let achieved = activity
            .iter()
            .filter(|a| a.raw.steps >= daily_steps_goal)
            .count();
        let sleep_hours: f64 = sleep.iter().map(|s| s.total_sleep_time_hours).sum();
        let distance: f64 = activity.iter().map(|a| a.raw.distance).sum();
        let steps: u64 = activity.iter().map(|a| a.raw.steps).sum();
        let calories: f64 = activity.iter().map(|a| a.raw.calories).sum();
        let run_distance: f64 = activity.iter().map(|a| a.raw.run_distance).sum();

        let sleep_days = sleep_hours / 24.0;

        Ok(Self {
            start_date,
            end_date,
            span_days,
            available_days: days,
            available_days_percent: round2(days as f64 / span_days as f64 * 100.0),
            daily_steps_goal,
            daily_steps_goal_achieved_days: achieved,
            daily_steps_goal_achieved_days_percent: round2(achieved as f64 / days as f64 * 100.0),
            total_sleep_days_number: round2(sleep_days),
            total_sleep_days_percent: round2(sleep_days / span_days as f64 * 100.0),
            total_distance_kilometers: round2(distance / 1000.0),
            total_distance_kilosteps: round2(steps as f64 / 1000.0),
            total_burned_kilocalories: round2(calories / 1000.0),
            total_run_kilometers: round2(run_distance / 1000.0),
            stride_length: round2(stride_length(distance, steps)),
        })
    }

    /// Headline paragraph, one sentence per paragraph
    pub fn narrative(&self, merged_days: usize) -> String {
        let n = display_number;
        [
            format!(
                "You have been wearing a fitness bracelet from {} to {}.",
                self.start_date, self.end_date
            ),
            format!(
                "Data are available for {} ({}%) days out of {} total days.",
                self.available_days,
                n(self.available_days_percent),
                self.span_days
            ),
            format!("Your daily steps goal is {} steps a day.", self.daily_steps_goal),
            format!(
                "You have successfully achieved your daily steps goal during {} ({}%) days in total.",
                self.daily_steps_goal_achieved_days,
                n(self.daily_steps_goal_achieved_days_percent)
            ),
            format!(
                "You slept for {} ({}%) days in total.",
                n(self.total_sleep_days_number),
                n(self.total_sleep_days_percent)
            ),
            format!("You walked {} kilometers in total.", n(self.total_distance_kilometers)),
            format!("You walked {} thousand steps in total.", n(self.total_distance_kilosteps)),
            format!("You burned {} kilocalories while walking.", n(self.total_burned_kilocalories)),
            format!("You ran {} kilometers.", n(self.total_run_kilometers)),
            format!("Your stride length is {} meter.", n(self.stride_length)),
            format!("Sleep and activity were both recorded on {merged_days} days."),
        ]
        .iter()
        .map(|line| format!("{line}\n\n"))
        .collect()
    }
}

/// Whole numbers keep one decimal, as in `12.0`
fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Plain CSV number: no trailing `.0` on whole values
fn plain_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// The `n` days with the most steps, highest first. Ties keep input order.
pub fn top_step_days(activity: &[DerivedActivity], n: usize) -> Vec<&DerivedActivity> {
    let mut ranked: Vec<&DerivedActivity> = activity.iter().collect();
    ranked.sort_by(|a, b| b.raw.steps.cmp(&a.raw.steps));
    ranked.truncate(n);
    ranked
}

fn write_top_step_days(rows: &[&DerivedActivity], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| AnalyzerError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    let csv_err = |source| AnalyzerError::Csv {
        path: path.to_path_buf(),
        source,
    };

    writer.write_record(TOP_STEP_DAYS_COLUMNS).map_err(csv_err)?;
    for row in rows {
        writer
            .write_record([
                row.date().format("%Y-%m-%d").to_string(),
                weekday_name(row.calendar.weekday).to_string(),
                row.raw.steps.to_string(),
                plain_number(row.raw.distance),
                plain_number(row.raw.run_distance),
            ])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| AnalyzerError::io(path, e))
}

/// Derived data the report is built from
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub sleep: &'a [DerivedSleep],
    pub activity: &'a [DerivedActivity],
    pub merged: &'a [SleepActivityRecord],
    /// Statistics files written by this run
    pub statistics: &'a [StatisticsArtifacts],
    pub plots: &'a [PlotReference],
}

/// Files written by the assembler
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub markdown: PathBuf,
    /// Absent when HTML rendering is off or failed
    pub html: Option<PathBuf>,
    pub totals: TotalRecords,
}

/// Builds `report/report.md` (and optionally HTML) from the run's artifacts
pub struct ReportAssembler<'a> {
    layout: &'a OutputLayout,
    converter: &'a dyn DocumentConverter,
    user_name: &'a str,
    daily_steps_goal: u64,
    top_step_days_number: usize,
    date_format: &'a str,
    render_html: bool,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        config: &'a AnalyzerConfig,
        layout: &'a OutputLayout,
        converter: &'a dyn DocumentConverter,
    ) -> Self {
        Self {
            layout,
            converter,
            user_name: &config.user_name,
            daily_steps_goal: config.daily_steps_goal,
            top_step_days_number: config.top_step_days_number,
            date_format: &config.date_format,
            render_html: config.render_html,
        }
    }

    /// Contents of a Markdown table produced in this run
    fn read_artifact(&self, dataset: &str, stem: &str, markdown: Option<&Path>) -> Result<String> {
        let missing = |path: PathBuf| AnalyzerError::MissingArtifact {
            dataset: dataset.to_string(),
            path,
        };
        let path = markdown.ok_or_else(|| missing(self.layout.statistics.join(format!("{stem}.md"))))?;
        fs::read_to_string(path).map_err(|_| missing(path.to_path_buf()))
    }

    fn read_statistics(&self, statistics: &[StatisticsArtifacts], dataset: Dataset) -> Result<String> {
        let markdown = statistics
            .iter()
            .find(|a| a.dataset == dataset)
            .and_then(|a| a.markdown.as_deref());
        self.read_artifact(dataset.as_str(), &dataset.statistics_file_stem(), markdown)
    }

    fn front_matter(&self, today: NaiveDate) -> Result<String> {
        Ok(format!(
            "---\ntitle: \"MiFit data analysis report\"\nauthor: \"{}\"\ndate: {}\n---",
            self.user_name,
            format_date_with(today, self.date_format)?
        ))
    }

    /// Write the top step days table and the report document
    pub fn assemble(&self, inputs: ReportInputs<'_>, today: NaiveDate) -> Result<ReportOutcome> {
        let totals = TotalRecords::compute(
            inputs.sleep,
            inputs.activity,
            self.daily_steps_goal,
            self.date_format,
        )?;
        info!("Headline totals computed over {} activity days", totals.available_days);

        let top = top_step_days(inputs.activity, self.top_step_days_number);
        let top_csv = self
            .layout
            .statistics
            .join(format!("{TOP_STEP_DAYS_STEM}.csv"));
        write_top_step_days(&top, &top_csv)?;
        let top_markdown = csv_to_markdown(self.converter, &top_csv);

        let sleep_statistics = self.read_statistics(inputs.statistics, Dataset::Sleep)?;
        let activity_statistics = self.read_statistics(inputs.statistics, Dataset::Activity)?;
        let activity_stage_statistics =
            self.read_statistics(inputs.statistics, Dataset::ActivityStage)?;
        let top_step_days_table = self.read_artifact(
            TOP_STEP_DAYS_STEM,
            TOP_STEP_DAYS_STEM,
            top_markdown.as_deref(),
        )?;

        let mut parts = vec![
            self.front_matter(today)?,
            totals.narrative(inputs.merged.len()),
            "MiFit data sleep statistics\n".to_string(),
            sleep_statistics,
            "MiFit data activity statistics\n".to_string(),
            activity_statistics,
            "MiFit data activity stage statistics\n".to_string(),
            activity_stage_statistics,
            format!("MiFit data top {} step days\n", self.top_step_days_number),
            top_step_days_table,
        ];
        parts.extend(plot_section(inputs.plots));

        let markdown = self.layout.report.join("report.md");
        fs::write(&markdown, parts.join("\n")).map_err(|e| AnalyzerError::io(&markdown, e))?;
        info!("Report written to {}", markdown.display());

        let html = if self.render_html {
            let html = self.layout.report.join("report.html");
            match self.converter.convert(&markdown, &html) {
                Ok(()) => Some(html),
                Err(e) => {
                    warn!("HTML report not rendered: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(ReportOutcome {
            markdown,
            html,
            totals,
        })
    }
}

fn plot_section_title(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::Sleep => "Here you can find your sleep plots\n",
        Dataset::Activity => "Here you can find your activity plots\n",
        Dataset::SleepActivity => "Here you can find your sleep and activity plots\n",
        Dataset::ActivityStage => "Here you can find your activity stage plots\n",
    }
}

/// Chart list grouped by dataset in a fixed order
fn plot_section(plots: &[PlotReference]) -> Vec<String> {
    let mut parts = vec!["Here you can find your plots\n".to_string()];
    for dataset in [
        Dataset::Sleep,
        Dataset::Activity,
        Dataset::SleepActivity,
        Dataset::ActivityStage,
    ] {
        let mut group = plots.iter().filter(|p| p.dataset == dataset).peekable();
        if group.peek().is_none() {
            continue;
        }
        parts.push(plot_section_title(dataset).to_string());
        parts.extend(group.map(PlotReference::markdown));
    }
    parts
}

/// Per-dataset row counts of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    pub sleep: usize,
    pub activity: usize,
    pub activity_stage: usize,
    pub sleep_activity: usize,
}

/// Machine-readable summary written next to the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub generated_on: NaiveDate,
    pub version: String,
    /// Activity window the totals cover
    pub window: Option<DateWindow>,
    pub rows: RowCounts,
    pub totals: TotalRecords,
    pub plots: Vec<PlotReference>,
}

impl RunManifest {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalyzerError::Config(format!("manifest serialization failed: {e}")))?;
        fs::write(path, json).map_err(|e| AnalyzerError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{MarkdownTableConverter, PandocConverter};
    use crate::datasets::{ActivityDeriver, FeatureDeriver, SleepDeriver};
    use crate::table::RawTable;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn activity(rows: &[(&str, u64, f64)]) -> Vec<DerivedActivity> {
        let table = RawTable::from_rows(
            ["date", "steps", "distance", "runDistance", "calories"],
            rows.iter().map(|(date, steps, distance)| {
                vec![
                    date.to_string(),
                    steps.to_string(),
                    distance.to_string(),
                    "100".to_string(),
                    "250".to_string(),
                ]
            }),
        );
        ActivityDeriver.derive(&table).unwrap()
    }

    fn sleep(dates: &[&str]) -> Vec<DerivedSleep> {
        let table = RawTable::from_rows(
            ["date", "start", "stop", "deepSleepTime", "shallowSleepTime"],
            dates.iter().map(|d| {
                vec![
                    d.to_string(),
                    "1672612200".to_string(),
                    "1672637400".to_string(),
                    "240".to_string(),
                    "480".to_string(),
                ]
            }),
        );
        SleepDeriver::new(0).derive(&table).unwrap()
    }

    #[test]
    fn test_stride_length() {
        assert_eq!(stride_length(10000.0, 8000), 1.25);
        assert!(stride_length(500.0, 0).is_nan());
    }

    #[test]
    fn test_totals() {
        let a = activity(&[
            ("2023-01-01", 9000, 6000.0),
            ("2023-01-02", 4000, 4000.0),
            ("2023-01-04", 8000, 5000.0),
        ]);
        let s = sleep(&["2023-01-01", "2023-01-02"]);

        let totals = TotalRecords::compute(&s, &a, 8000, "%Y.%m.%d").unwrap();

        assert_eq!(totals.start_date, "2023.01.01");
        assert_eq!(totals.end_date, "2023.01.04");
        assert_eq!(totals.span_days, 4);
        assert_eq!(totals.available_days_percent, 75.0);
        assert_eq!(totals.daily_steps_goal_achieved_days, 2);
        assert_eq!(totals.daily_steps_goal_achieved_days_percent, 66.67);
        // Two nights of 12 hours
        assert_eq!(totals.total_sleep_days_number, 1.0);
        assert_eq!(totals.total_sleep_days_percent, 25.0);
        assert_eq!(totals.total_distance_kilometers, 15.0);
        assert_eq!(totals.total_distance_kilosteps, 21.0);
        assert_eq!(totals.total_burned_kilocalories, 0.75);
        assert_eq!(totals.total_run_kilometers, 0.3);
        assert_eq!(totals.stride_length, 0.71);
    }

    #[test]
    fn test_narrative_lines() {
        let a = activity(&[("2023-01-01", 10000, 8000.0)]);
        let totals = TotalRecords::compute(&[], &a, 8000, "%Y-%m-%d").unwrap();
        let text = totals.narrative(0);

        assert!(text.starts_with("You have been wearing a fitness bracelet from 2023-01-01 to 2023-01-01.\n\n"));
        assert!(text.contains("Data are available for 1 (100.0%) days out of 1 total days.\n\n"));
        assert!(text.contains("Your stride length is 0.8 meter.\n\n"));
    }

    #[test]
    fn test_top_step_days_is_stable_and_descending() {
        let a = activity(&[
            ("2023-01-01", 500, 1.0),
            ("2023-01-02", 900, 2.0),
            ("2023-01-03", 900, 3.0),
            ("2023-01-04", 100, 4.0),
        ]);

        let top = top_step_days(&a, 3);
        let picked: Vec<(u64, f64)> = top.iter().map(|r| (r.raw.steps, r.raw.distance)).collect();
        assert_eq!(picked, vec![(900, 2.0), (900, 3.0), (500, 1.0)]);

        assert_eq!(top_step_days(&a, 10).len(), 4);
        assert!(top_step_days(&a, 0).is_empty());
    }

    fn write_statistics(layout: &OutputLayout, datasets: &[Dataset]) -> Vec<StatisticsArtifacts> {
        datasets
            .iter()
            .map(|&dataset| {
                let stem = dataset.statistics_file_stem();
                let markdown = layout.statistics.join(format!("{stem}.md"));
                fs::write(&markdown, format!("| {stem} |\n")).unwrap();
                StatisticsArtifacts {
                    dataset,
                    csv: layout.statistics.join(format!("{stem}.csv")),
                    markdown: Some(markdown),
                }
            })
            .collect()
    }

    #[test]
    fn test_report_sections_in_fixed_order() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.create_dirs().unwrap();
        let statistics = write_statistics(
            &layout,
            &[Dataset::Sleep, Dataset::Activity, Dataset::ActivityStage],
        );

        let config = AnalyzerConfig {
            user_name: "Alex".into(),
            top_step_days_number: 2,
            ..AnalyzerConfig::default()
        };
        let a = activity(&[("2023-01-01", 9000, 6000.0), ("2023-01-02", 12000, 9000.0)]);
        let s = sleep(&["2023-01-01"]);
        let plots = vec![
            PlotReference {
                dataset: Dataset::ActivityStage,
                name: "activity_stage_histplot_km_h".into(),
                path: layout.plots.join("activity_stage_histplot_km_h.png"),
            },
            PlotReference {
                dataset: Dataset::Sleep,
                name: "sleep_hours_scatterplot".into(),
                path: layout.plots.join("sleep_hours_scatterplot.png"),
            },
        ];

        let outcome = ReportAssembler::new(&config, &layout, &MarkdownTableConverter)
            .assemble(
                ReportInputs {
                    sleep: &s,
                    activity: &a,
                    merged: &[],
                    statistics: &statistics,
                    plots: &plots,
                },
                NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            )
            .unwrap();

        // The built-in converter does not produce HTML
        assert_eq!(outcome.html, None);

        let report = fs::read_to_string(&outcome.markdown).unwrap();
        assert!(report.starts_with("---\ntitle: \"MiFit data analysis report\"\nauthor: \"Alex\"\ndate: 2024.05.06\n---"));

        let order = [
            "You have been wearing",
            "MiFit data sleep statistics",
            "| sleep_statistics |",
            "MiFit data activity statistics",
            "MiFit data activity stage statistics",
            "MiFit data top 2 step days",
            "| Date | Day | Steps | Distance | Run distance |",
            "Here you can find your plots",
            "Here you can find your sleep plots",
            "sleep_hours_scatterplot.png",
            "Here you can find your activity stage plots",
        ];
        let positions: Vec<usize> = order.iter().map(|needle| report.find(needle).unwrap()).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);

        let top = fs::read_to_string(layout.statistics.join("top_step_days.csv")).unwrap();
        assert_eq!(
            top,
            "Date,Day,Steps,Distance,Run distance\n\
             2023-01-02,Monday,12000,9000,100\n\
             2023-01-01,Sunday,9000,6000,100\n"
        );
    }

    #[test]
    fn test_missing_statistics_names_dataset() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.create_dirs().unwrap();
        let statistics = write_statistics(&layout, &[Dataset::Sleep, Dataset::Activity]);

        let config = AnalyzerConfig::default();
        let a = activity(&[("2023-01-01", 9000, 6000.0)]);
        let err = ReportAssembler::new(&config, &layout, &MarkdownTableConverter)
            .assemble(
                ReportInputs {
                    sleep: &[],
                    activity: &a,
                    merged: &[],
                    statistics: &statistics,
                    plots: &[],
                },
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            AnalyzerError::MissingArtifact { ref dataset, .. } if dataset == "activity_stage"
        ));
    }

    #[test]
    fn test_markdown_on_disk_from_earlier_run_is_not_used() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.create_dirs().unwrap();
        let mut statistics =
            write_statistics(&layout, &[Dataset::Sleep, Dataset::Activity, Dataset::ActivityStage]);
        // This run's activity conversion failed; the file is still on disk
        statistics[1].markdown = None;

        let config = AnalyzerConfig::default();
        let a = activity(&[("2023-01-01", 9000, 6000.0)]);
        let err = ReportAssembler::new(&config, &layout, &MarkdownTableConverter)
            .assemble(
                ReportInputs {
                    sleep: &[],
                    activity: &a,
                    merged: &[],
                    statistics: &statistics,
                    plots: &[],
                },
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            AnalyzerError::MissingArtifact { ref dataset, .. } if dataset == "activity"
        ));
        assert!(!layout.report.join("report.md").exists());
    }

    #[test]
    fn test_failed_top_days_conversion_is_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.create_dirs().unwrap();
        let statistics =
            write_statistics(&layout, &[Dataset::Sleep, Dataset::Activity, Dataset::ActivityStage]);
        fs::write(layout.statistics.join("top_step_days.md"), "| stale |\n").unwrap();

        let config = AnalyzerConfig::default();
        let converter = PandocConverter::new("definitely-not-an-installed-converter");
        let a = activity(&[("2023-01-01", 9000, 6000.0)]);
        let err = ReportAssembler::new(&config, &layout, &converter)
            .assemble(
                ReportInputs {
                    sleep: &[],
                    activity: &a,
                    merged: &[],
                    statistics: &statistics,
                    plots: &[],
                },
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            AnalyzerError::MissingArtifact { ref dataset, .. } if dataset == "top_step_days"
        ));
    }

    #[test]
    fn test_manifest_round_trips_through_json() {
        let dir = TempDir::new().unwrap();
        let a = activity(&[("2023-01-01", 9000, 6000.0)]);
        let manifest = RunManifest {
            run_id: Uuid::new_v4(),
            generated_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            version: "0.1.0".into(),
            window: DateWindow::of(&a),
            rows: RowCounts {
                activity: 1,
                ..RowCounts::default()
            },
            totals: TotalRecords::compute(&[], &a, 8000, "%Y.%m.%d").unwrap(),
            plots: Vec::new(),
        };

        let path = dir.path().join("manifest.json");
        manifest.write(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"activity\": 1"));
        assert!(text.contains(&manifest.run_id.to_string()));
    }
}
