//! Document conversion
//!
//! CSV summaries become Markdown tables and the Markdown report becomes HTML.
//! Conversion is a best-effort collaborator: callers log a [`ConversionError`]
//! and carry on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConversionError;

/// Converts one document into another format, chosen by file extension
pub trait DocumentConverter {
    /// Short name for log lines
    fn name(&self) -> &'static str;

    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError>;
}

/// Converter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterKind {
    /// Native CSV to Markdown; no HTML
    #[default]
    Builtin,
    /// External `pandoc` process
    Pandoc,
}

impl ConverterKind {
    pub fn build(self) -> Box<dyn DocumentConverter> {
        match self {
            ConverterKind::Builtin => Box::new(MarkdownTableConverter),
            ConverterKind::Pandoc => Box::new(PandocConverter::default()),
        }
    }
}

impl std::str::FromStr for ConverterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "builtin" => Ok(ConverterKind::Builtin),
            "pandoc" => Ok(ConverterKind::Pandoc),
            other => Err(format!("unknown converter '{other}', expected 'builtin' or 'pandoc'")),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Convert `csv` to a sibling `.md` file, logging failures.
///
/// Returns the Markdown path on success. A Markdown file left by an earlier
/// run is removed first, so a failed conversion leaves no file behind.
pub fn csv_to_markdown(converter: &dyn DocumentConverter, csv: &Path) -> Option<PathBuf> {
    let markdown = csv.with_extension("md");
    if let Err(e) = fs::remove_file(&markdown) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Cannot remove stale {}: {}", markdown.display(), e);
            return None;
        }
    }
    match converter.convert(csv, &markdown) {
        Ok(()) => {
            debug!("{} converted {} to {}", converter.name(), csv.display(), markdown.display());
            Some(markdown)
        }
        Err(e) => {
            warn!("Markdown conversion of {} failed: {}", csv.display(), e);
            None
        }
    }
}

/// `pandoc` subprocess, one synchronous invocation per conversion
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: String,
}

impl PandocConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn arguments(input: &Path, output: &Path) -> Result<Vec<String>, ConversionError> {
        let input_arg = input.display().to_string();
        let output_arg = output.display().to_string();
        match (extension(input).as_deref(), extension(output).as_deref()) {
            (Some("csv"), Some("md")) => Ok(vec![
                "-f".into(),
                "csv".into(),
                "-t".into(),
                "markdown".into(),
                "-s".into(),
                input_arg,
                "-o".into(),
                output_arg,
            ]),
            (Some("md"), Some("html")) => Ok(vec![
                "--self-contained".into(),
                "-s".into(),
                input_arg,
                "-o".into(),
                output_arg,
            ]),
            _ => Err(ConversionError::Unsupported {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            }),
        }
    }

    /// First line of `pandoc --version`
    pub fn version(&self) -> Result<String, ConversionError> {
        let result = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !result.status.success() {
            return Err(ConversionError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&result.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new("pandoc")
    }
}

impl DocumentConverter for PandocConverter {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let args = Self::arguments(input, output)?;
        debug!("Running {} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(ConversionError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Native CSV to Markdown pipe table renderer
///
/// The first column is left aligned, the rest right aligned.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownTableConverter;

impl MarkdownTableConverter {
    /// Render CSV text as a Markdown pipe table
    pub fn render(csv_text: &str) -> Result<String, ConversionError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(escape_cell).collect();
        let mut out = String::new();
        push_row(&mut out, &headers);

        let separator: Vec<String> = (0..headers.len())
            .map(|i| if i == 0 { ":---".to_string() } else { "---:".to_string() })
            .collect();
        push_row(&mut out, &separator);

        for record in reader.records() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(escape_cell).collect();
            push_row(&mut out, &cells);
        }
        Ok(out)
    }
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(cell);
        out.push_str(" |");
    }
    out.push('\n');
}

impl DocumentConverter for MarkdownTableConverter {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        if extension(input).as_deref() != Some("csv") || extension(output).as_deref() != Some("md") {
            return Err(ConversionError::Unsupported {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            });
        }

        let text = fs::read_to_string(input).map_err(|source| ConversionError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let table = Self::render(&text)?;
        fs::write(output, table).map_err(|source| ConversionError::Io {
            path: output.to_path_buf(),
            source,
        })
    }
}
