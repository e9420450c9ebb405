//! End-to-end runs over a small MiFit export

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use mifit_analyzer::{
    AnalyzerConfig, AnalyzerError, MarkdownTableConverter, MifitAnalyzer, PandocConverter,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// 2023-01-01 22:30 UTC to 2023-01-02 05:30 UTC, shifted by one day per row
const SLEEP: &str = "\
date,deepSleepTime,shallowSleepTime,wakeTime,start,stop
2023-01-02,90,330,5,1672612200,1672637400
2023-01-03,120,300,0,1672698600,1672723800
2023-01-04,60,360,10,1672785000,1672810200
2023-01-05,100,320,0,1672871400,1672896600
";

const ACTIVITY_A: &str = "\
date,steps,distance,runDistance,calories
2023-01-01,4000,3000,0,150
2023-01-02,12000,9000,1500,400
2023-01-03,8000,6000,500,300
";

// Same columns, different order
const ACTIVITY_B: &str = "\
steps,date,calories,distance,runDistance
9500,2023-01-04,350,7100,0
3000,2023-01-05,100,2200,0
";

const ACTIVITY_STAGE: &str = "\
date,start,stop,distance,calories,steps
2023-01-02,08:00,08:30,2400,90,3000
2023-01-03,18:10,18:40,3000,110,3600
2023-01-04,07:45,08:05,1500,60,2000
";

fn write(root: &Path, subdirectory: &str, name: &str, content: &str) {
    let dir = root.join(subdirectory);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

fn export() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "SLEEP", "SLEEP_1.csv", SLEEP);
    write(dir.path(), "ACTIVITY", "ACTIVITY_1.csv", ACTIVITY_A);
    write(dir.path(), "ACTIVITY", "ACTIVITY_2.csv", ACTIVITY_B);
    write(dir.path(), "ACTIVITY_STAGE", "ACTIVITY_STAGE_1.csv", ACTIVITY_STAGE);
    dir
}

fn config(input: &Path) -> AnalyzerConfig {
    let mut config = AnalyzerConfig {
        input_directory: input.to_path_buf(),
        output_directory: input.join("results"),
        user_name: "Alex".to_string(),
        render_html: false,
        ..AnalyzerConfig::default()
    };
    config.charts.enabled = false;
    config
}

fn analyzer(config: AnalyzerConfig) -> MifitAnalyzer {
    MifitAnalyzer::new(config)
        .with_converter(Box::new(MarkdownTableConverter))
        .with_today(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap())
}

#[test]
fn test_full_run_writes_every_artifact() {
    let dir = export();
    let summary = analyzer(config(dir.path())).run().unwrap();

    assert_eq!(summary.rows.sleep, 4);
    assert_eq!(summary.rows.activity, 5);
    assert_eq!(summary.rows.activity_stage, 3);
    assert_eq!(summary.rows.sleep_activity, 4);
    assert!(summary.plots.is_empty());
    assert!(summary.report.html.is_none());

    let statistics = dir.path().join("results/statistics");
    for stem in [
        "sleep_statistics",
        "activity_statistics",
        "activity_stage_statistics",
        "sleep_activity_statistics",
        "top_step_days",
    ] {
        assert!(statistics.join(format!("{stem}.csv")).is_file(), "{stem}.csv");
        assert!(statistics.join(format!("{stem}.md")).is_file(), "{stem}.md");
    }

    let top = fs::read_to_string(statistics.join("top_step_days.csv")).unwrap();
    let mut lines = top.lines();
    assert_eq!(lines.next(), Some("Date,Day,Steps,Distance,Run distance"));
    assert_eq!(lines.next(), Some("2023-01-02,Monday,12000,9000,1500"));
    assert_eq!(lines.next(), Some("2023-01-04,Wednesday,9500,7100,0"));
}

#[test]
fn test_report_layout() {
    let dir = export();
    let summary = analyzer(config(dir.path())).run().unwrap();

    let report = fs::read_to_string(&summary.report.markdown).unwrap();
    assert!(report.starts_with(
        "---\ntitle: \"MiFit data analysis report\"\nauthor: \"Alex\"\ndate: 2023.03.01\n---\n"
    ));
    assert!(report.contains("You have been wearing a fitness bracelet from 2023.01.01 to 2023.01.05.\n\n"));
    assert!(report.contains("Data are available for 5 (100.0%) days out of 5 total days.\n\n"));
    assert!(report.contains("You have successfully achieved your daily steps goal during 3 (60.0%) days in total."));
    assert!(report.contains("You walked 27.3 kilometers in total."));
    assert!(report.contains("You walked 36.5 thousand steps in total."));

    let position = |needle: &str| {
        report
            .find(needle)
            .unwrap_or_else(|| panic!("missing section {needle:?}"))
    };
    let sleep = position("MiFit data sleep statistics\n");
    let activity = position("MiFit data activity statistics\n");
    let stage = position("MiFit data activity stage statistics\n");
    let top = position("MiFit data top 10 step days\n");
    let plots = position("Here you can find your plots\n");
    assert!(sleep < activity && activity < stage && stage < top && top < plots);

    // Statistics tables are embedded as rendered
    let activity_table =
        fs::read_to_string(dir.path().join("results/statistics/activity_statistics.md")).unwrap();
    assert!(report.contains(activity_table.trim_end()));
}

#[test]
fn test_date_window_limits_every_dataset() {
    let dir = export();
    let mut config = config(dir.path());
    config.start_date = Some("2023.01.02".to_string());
    config.end_date = Some("2023.01.03".to_string());

    let summary = analyzer(config).run().unwrap();

    assert_eq!(summary.rows.sleep, 2);
    assert_eq!(summary.rows.activity, 2);
    assert_eq!(summary.rows.activity_stage, 2);
    assert_eq!(summary.rows.sleep_activity, 2);
    assert_eq!(summary.report.totals.span_days, 2);
    assert_eq!(summary.report.totals.start_date, "2023.01.02");
}

#[test]
fn test_manifest_records_the_run() {
    let dir = export();
    let summary = analyzer(config(dir.path())).run().unwrap();

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary.manifest).unwrap()).unwrap();

    assert_eq!(manifest["run_id"], summary.run_id.to_string());
    assert_eq!(manifest["generated_on"], "2023-03-01");
    assert_eq!(manifest["rows"]["activity"], 5);
    assert_eq!(manifest["rows"]["sleep_activity"], 4);
    assert_eq!(manifest["totals"]["daily_steps_goal"], 8000);
}

#[test]
fn test_rerun_overwrites_outputs() {
    let dir = export();
    let first = analyzer(config(dir.path())).run().unwrap();
    let report = fs::read_to_string(&first.report.markdown).unwrap();

    let second = analyzer(config(dir.path())).run().unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(fs::read_to_string(&second.report.markdown).unwrap(), report);
}

#[test]
fn test_disjoint_sleep_and_activity_fail() {
    let dir = export();
    let mut config = config(dir.path());
    // Sleep starts on 2023-01-02, activity window ends before it
    config.end_date = Some("2023.01.01".to_string());

    let err = analyzer(config).run().unwrap_err();
    assert!(matches!(err, AnalyzerError::EmptyJoin));
}

#[test]
fn test_schema_mismatch_across_files() {
    let dir = export();
    write(
        dir.path(),
        "ACTIVITY",
        "ACTIVITY_3.csv",
        "date,steps,distance\n2023-01-06,100,80\n",
    );

    let err = analyzer(config(dir.path())).run().unwrap_err();
    assert!(matches!(err, AnalyzerError::SchemaMismatch { .. }));
}

#[test]
fn test_failing_converter_is_missing_artifact() {
    let dir = export();
    let err = MifitAnalyzer::new(config(dir.path()))
        .with_converter(Box::new(PandocConverter::new("no-such-converter")))
        .run()
        .unwrap_err();

    assert!(matches!(
        err,
        AnalyzerError::MissingArtifact { ref dataset, .. } if dataset == "sleep"
    ));
    // Statistics CSVs are still written
    assert!(dir.path().join("results/statistics/sleep_statistics.csv").is_file());
    assert!(!dir.path().join("results/report/report.md").exists());
}

#[test]
fn test_rerun_with_failing_converter_does_not_reuse_old_tables() {
    let dir = export();
    let first = analyzer(config(dir.path())).run().unwrap();
    let old_report = fs::read_to_string(&first.report.markdown).unwrap();
    assert!(old_report.contains("| count | 5.00 | 5.00 | 5.00 | 5.00 |"));

    let mut narrowed = config(dir.path());
    narrowed.start_date = Some("2023.01.03".to_string());
    let err = MifitAnalyzer::new(narrowed)
        .with_converter(Box::new(PandocConverter::new("no-such-converter")))
        .run()
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::MissingArtifact { .. }));
    let statistics = dir.path().join("results/statistics");
    let activity_csv = fs::read_to_string(statistics.join("activity_statistics.csv")).unwrap();
    assert!(activity_csv.contains("count,3.00,3.00,3.00,3.00"));
    assert!(!statistics.join("activity_statistics.md").exists());
    assert!(!statistics.join("sleep_statistics.md").exists());
}

