//! Error types for the MiFit analyzer

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an analysis run
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("No CSV files found in {0}")]
    NoInputFiles(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Schema mismatch in {file}: expected columns [{expected}], found [{found}]")]
    SchemaMismatch {
        file: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Missing column '{column}' in {dataset} data")]
    MissingColumn { dataset: String, column: String },

    #[error("Invalid {dataset} record at row {row}: {message}")]
    InvalidRecord {
        dataset: String,
        row: usize,
        message: String,
    },

    #[error("Invalid date '{value}' for format '{format}'")]
    InvalidDate { value: String, format: String },

    #[error("Sleep and activity data share no dates; nothing to merge")]
    EmptyJoin,

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Missing {dataset} artifact: {path}")]
    MissingArtifact { dataset: String, path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalyzerError {
    /// Wrap an I/O error together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalyzerError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable code, used by the CLI error output
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzerError::NoInputFiles(_) => "NO_INPUT_FILES",
            AnalyzerError::Io { .. } => "IO_ERROR",
            AnalyzerError::Csv { .. } => "CSV_ERROR",
            AnalyzerError::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            AnalyzerError::MissingColumn { .. } => "MISSING_COLUMN",
            AnalyzerError::InvalidRecord { .. } => "INVALID_RECORD",
            AnalyzerError::InvalidDate { .. } => "INVALID_DATE",
            AnalyzerError::EmptyJoin => "EMPTY_JOIN",
            AnalyzerError::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            AnalyzerError::MissingArtifact { .. } => "MISSING_ARTIFACT",
            AnalyzerError::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Failure of the external document converter. Never fatal to a run.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Failed to start converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Converter exited with status {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Conversion I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot convert {input} to {output}: unsupported by this converter")]
    Unsupported { input: PathBuf, output: PathBuf },

    #[error("Malformed CSV input: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure while rendering a chart. Never fatal to a run.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("No usable font: {0}")]
    Font(String),

    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Nothing to plot")]
    NoData,
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for PlotError
where
    E: std::error::Error + Send + Sync,
{
    fn from(e: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PlotError::Draw(e.to_string())
    }
}
