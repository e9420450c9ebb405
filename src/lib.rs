//! MiFit Analyzer - batch analysis of fitness-bracelet CSV exports
//!
//! The analyzer turns the sleep, activity and activity-stage exports of a
//! MiFit bracelet into summary statistics, charts and a Markdown report through
//! a deterministic pipeline: CSV ingest → feature derivation → date window
//! → statistics and charts → sleep/activity merge → report.
//!
//! ## Modules
//!
//! - **Ingest**: combine every CSV file of a dataset directory
//! - **Datasets**: typed records with derived calendar, duration and speed features
//! - **Statistics / Charts**: per-dataset summaries and plots
//! - **Report**: narrative totals, top step days and the assembled document

pub mod charts;
pub mod config;
pub mod convert;
pub mod datasets;
pub mod error;
pub mod features;
pub mod ingest;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod statistics;
pub mod table;
pub mod types;
pub mod window;

pub use config::{AnalyzerConfig, ChartStyle, OutputLayout};
pub use convert::{ConverterKind, DocumentConverter, MarkdownTableConverter, PandocConverter};
pub use error::{AnalyzerError, ConversionError, PlotError, Result};
pub use merge::{merge, SleepActivityRecord};
pub use pipeline::{analyze, inspect_inputs, MifitAnalyzer, RunSummary};
pub use report::{ReportAssembler, TotalRecords};
pub use statistics::{StatisticsTable, StatisticsWriter, Summary};
pub use types::Dataset;
pub use window::{DateWindow, DerivedTable};

/// Analyzer version recorded in run manifests
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "mifit-analyzer";
