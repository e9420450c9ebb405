//! MiFit CLI - Command-line interface for the MiFit analyzer
//!
//! Commands:
//! - analyze: Run the full analysis and write statistics, charts and report
//! - config: Print or write the default configuration
//! - doctor: Diagnose inputs, output directory, fonts and the document converter

use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::EnvFilter;

use mifit_analyzer::charts::chart_font;
use mifit_analyzer::{
    inspect_inputs, AnalyzerConfig, AnalyzerError, ConverterKind, MifitAnalyzer, PandocConverter,
    PRODUCER_NAME, VERSION,
};

/// MiFit - Batch analyzer for fitness-bracelet CSV exports
#[derive(Parser)]
#[command(name = "mifit")]
#[command(version = VERSION)]
#[command(about = "Turn MiFit CSV exports into statistics, charts and a report", long_about = None)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis
    Analyze {
        /// TOML configuration file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory holding SLEEP, ACTIVITY and ACTIVITY_STAGE
        #[arg(short, long)]
        input_directory: Option<PathBuf>,

        /// Directory receiving statistics, plots and report
        #[arg(short, long)]
        output_directory: Option<PathBuf>,

        /// First day of the analysis window, in --date-format
        #[arg(long)]
        start_date: Option<String>,

        /// Last day of the analysis window, in --date-format
        #[arg(long)]
        end_date: Option<String>,

        /// strftime-style format of dates given on the command line and in the report
        #[arg(long)]
        date_format: Option<String>,

        /// Hours added to UTC sleep timestamps
        #[arg(long, allow_hyphen_values = true)]
        hours_difference: Option<i32>,

        #[arg(long)]
        daily_steps_goal: Option<u64>,

        /// Name shown as report author
        #[arg(long)]
        user_name: Option<String>,

        /// Number of days in the top steps table
        #[arg(long)]
        top_step_days_number: Option<usize>,

        /// Document converter (builtin or pandoc)
        #[arg(long)]
        converter: Option<ConverterKind>,

        /// TrueType font for chart text
        #[arg(long)]
        font: Option<PathBuf>,

        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,

        /// Skip HTML conversion of the report
        #[arg(long)]
        no_html: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration as TOML
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Diagnose inputs and optional tooling
    Doctor {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory holding SLEEP, ACTIVITY and ACTIVITY_STAGE
        #[arg(short, long)]
        input_directory: Option<PathBuf>,

        /// Directory receiving statistics, plots and report
        #[arg(short, long)]
        output_directory: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level, cli.log_file.as_deref()) {
        eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str, log_file: Option<&Path>) -> Result<(), MifitCliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| MifitCliError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder
            .with_ansi(atty::is(atty::Stream::Stderr))
            .with_writer(io::stderr)
            .try_init(),
    };
    result.map_err(|e| MifitCliError::Logging(e.to_string()))
}

fn run(cli: Cli) -> Result<(), MifitCliError> {
    match cli.command {
        Commands::Analyze {
            config,
            input_directory,
            output_directory,
            start_date,
            end_date,
            date_format,
            hours_difference,
            daily_steps_goal,
            user_name,
            top_step_days_number,
            converter,
            font,
            no_charts,
            no_html,
            json,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(v) = input_directory {
                cfg.input_directory = v;
            }
            if let Some(v) = output_directory {
                cfg.output_directory = v;
            }
            if start_date.is_some() {
                cfg.start_date = start_date;
            }
            if end_date.is_some() {
                cfg.end_date = end_date;
            }
            if let Some(v) = date_format {
                cfg.date_format = v;
            }
            if let Some(v) = hours_difference {
                cfg.hours_difference = v;
            }
            if let Some(v) = daily_steps_goal {
                cfg.daily_steps_goal = v;
            }
            if let Some(v) = user_name {
                cfg.user_name = v;
            }
            if let Some(v) = top_step_days_number {
                cfg.top_step_days_number = v;
            }
            if let Some(v) = converter {
                cfg.converter = v;
            }
            if font.is_some() {
                cfg.charts.font_path = font;
            }
            if no_charts {
                cfg.charts.enabled = false;
            }
            if no_html {
                cfg.render_html = false;
            }
            cmd_analyze(cfg, json)
        }

        Commands::Config { output } => cmd_config(output.as_deref()),

        Commands::Doctor {
            config,
            input_directory,
            output_directory,
            json,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(v) = input_directory {
                cfg.input_directory = v;
            }
            if let Some(v) = output_directory {
                cfg.output_directory = v;
            }
            cmd_doctor(&cfg, json)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig, MifitCliError> {
    match path {
        Some(path) => Ok(AnalyzerConfig::from_toml_file(path)?),
        None => Ok(AnalyzerConfig::default()),
    }
}

fn cmd_analyze(config: AnalyzerConfig, json: bool) -> Result<(), MifitCliError> {
    let summary = MifitAnalyzer::new(config).run()?;

    if json {
        let output = AnalyzeOutput {
            run_id: summary.run_id.to_string(),
            sleep_rows: summary.rows.sleep,
            activity_rows: summary.rows.activity,
            activity_stage_rows: summary.rows.activity_stage,
            sleep_activity_rows: summary.rows.sleep_activity,
            plots: summary.plots.len(),
            report: summary.report.markdown.display().to_string(),
            html: summary.report.html.as_ref().map(|p| p.display().to_string()),
            manifest: summary.manifest.display().to_string(),
            elapsed_ms: summary.elapsed.as_millis(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Report:   {}", summary.report.markdown.display());
        if let Some(html) = &summary.report.html {
            println!("HTML:     {}", html.display());
        }
        println!("Manifest: {}", summary.manifest.display());
        println!(
            "Rows:     sleep {}, activity {}, activity stage {}, merged {}",
            summary.rows.sleep,
            summary.rows.activity,
            summary.rows.activity_stage,
            summary.rows.sleep_activity
        );
        println!("Charts:   {}", summary.plots.len());
    }
    Ok(())
}

fn cmd_config(output: Option<&Path>) -> Result<(), MifitCliError> {
    let config = AnalyzerConfig::default();
    match output {
        Some(path) => {
            config.save(path)?;
            info!("Default configuration written to {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}

fn cmd_doctor(config: &AnalyzerConfig, json: bool) -> Result<(), MifitCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("MiFit analyzer version {}", VERSION),
    });

    // Input directories
    for (dataset, files) in inspect_inputs(&config.input_directory) {
        let check = match files {
            Ok(files) => DoctorCheck {
                name: dataset.to_string(),
                status: CheckStatus::Ok,
                message: format!("{} CSV files", files.len()),
            },
            Err(e) => DoctorCheck {
                name: dataset.to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        };
        checks.push(check);
    }

    // Window bounds
    checks.push(match config.window_bounds() {
        Ok((start, end)) => DoctorCheck {
            name: "date_window".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} to {}",
                start.map_or("first day".to_string(), |d| d.to_string()),
                end.map_or("last day".to_string(), |d| d.to_string())
            ),
        },
        Err(e) => DoctorCheck {
            name: "date_window".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    // Chart font
    if config.charts.enabled {
        checks.push(match chart_font(&config.charts) {
            Ok(path) => DoctorCheck {
                name: "chart_font".to_string(),
                status: CheckStatus::Ok,
                message: format!("Using {}", path.display()),
            },
            Err(e) => DoctorCheck {
                name: "chart_font".to_string(),
                status: CheckStatus::Warning,
                message: format!("{}; charts will be skipped", e),
            },
        });
    }

    // Converter
    let converter_check = match config.converter {
        ConverterKind::Builtin => DoctorCheck {
            name: "converter".to_string(),
            status: CheckStatus::Ok,
            message: "Built-in Markdown tables (no HTML output)".to_string(),
        },
        ConverterKind::Pandoc => match PandocConverter::default().version() {
            Ok(version) => DoctorCheck {
                name: "converter".to_string(),
                status: CheckStatus::Ok,
                message: version,
            },
            Err(e) => DoctorCheck {
                name: "converter".to_string(),
                status: CheckStatus::Warning,
                message: format!("{}; Markdown and HTML conversions will be skipped", e),
            },
        },
    };
    checks.push(converter_check);

    // Output directory
    let layout = config.layout();
    checks.push(match layout.check_writable() {
        Ok(()) => DoctorCheck {
            name: "output_directory".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} is writable", layout.root.display()),
        },
        Err(e) => DoctorCheck {
            name: "output_directory".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("MiFit Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(MifitCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum MifitCliError {
    Io(io::Error),
    Analysis(AnalyzerError),
    Json(serde_json::Error),
    Logging(String),
    DoctorFailed,
}

impl From<io::Error> for MifitCliError {
    fn from(e: io::Error) -> Self {
        MifitCliError::Io(e)
    }
}

impl From<AnalyzerError> for MifitCliError {
    fn from(e: AnalyzerError) -> Self {
        MifitCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for MifitCliError {
    fn from(e: serde_json::Error) -> Self {
        MifitCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

fn analysis_hint(e: &AnalyzerError) -> Option<&'static str> {
    match e {
        AnalyzerError::NoInputFiles(_) | AnalyzerError::Io { .. } => {
            Some("Check --input-directory and that SLEEP, ACTIVITY and ACTIVITY_STAGE hold CSV files")
        }
        AnalyzerError::SchemaMismatch { .. } => {
            Some("Every CSV file of a dataset must have the same columns")
        }
        AnalyzerError::MissingColumn { .. } | AnalyzerError::InvalidRecord { .. } => {
            Some("Ensure the files are unmodified MiFit exports")
        }
        AnalyzerError::InvalidDate { .. } => Some("Dates must match --date-format"),
        AnalyzerError::EmptyJoin => Some("Widen the date window or check the exports cover the same days"),
        AnalyzerError::MissingArtifact { .. } => {
            Some("Statistics Markdown was not produced; try --converter builtin")
        }
        AnalyzerError::Config(_) => Some("Run 'mifit config' for a valid configuration"),
        AnalyzerError::Csv { .. } | AnalyzerError::ColumnNotFound(_) => None,
    }
}

impl From<MifitCliError> for CliError {
    fn from(e: MifitCliError) -> Self {
        match e {
            MifitCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MifitCliError::Analysis(e) => CliError {
                code: e.code().to_string(),
                hint: analysis_hint(&e).map(str::to_string),
                message: e.to_string(),
            },
            MifitCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            MifitCliError::Logging(msg) => CliError {
                code: "LOGGING_ERROR".to_string(),
                message: msg,
                hint: Some("Check --log-level and RUST_LOG syntax".to_string()),
            },
            MifitCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct AnalyzeOutput {
    run_id: String,
    sleep_rows: usize,
    activity_rows: usize,
    activity_stage_rows: usize,
    sleep_activity_rows: usize,
    plots: usize,
    report: String,
    html: Option<String>,
    manifest: String,
    elapsed_ms: u128,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
