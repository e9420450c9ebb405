//! CSV discovery and loading
//!
//! Reads every `*.csv` file directly inside a dataset directory and
//! concatenates their rows into one [`RawTable`]. Input files are only read.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{AnalyzerError, Result};
use crate::table::RawTable;

/// Find all `.csv` files directly inside `dir` (non-recursive), sorted by path.
pub fn find_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AnalyzerError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "input directory does not exist"),
        ));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            AnalyzerError::io(path, e.into())
        })?;
        let is_csv = entry
            .path()
            .extension()
            .map(|ext| ext == "csv")
            .unwrap_or(false);
        if entry.file_type().is_file() && is_csv {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Load and concatenate every CSV file in `dir`.
///
/// The first file (in path order) fixes the column order. Later files may list
/// the same columns in another order, in which case their cells are re-ordered;
/// a different column *set* is a [`AnalyzerError::SchemaMismatch`].
pub fn read_csv_dir(dir: &Path) -> Result<RawTable> {
    let files = find_csv_files(dir)?;
    if files.is_empty() {
        return Err(AnalyzerError::NoInputFiles(dir.to_path_buf()));
    }

    let mut table: Option<RawTable> = None;

    for path in &files {
        let (headers, rows) = read_csv_file(path)?;

        let table = table.get_or_insert_with(|| RawTable::new(headers.clone()));
        let order = column_order(table.headers(), &headers).ok_or_else(|| {
            AnalyzerError::SchemaMismatch {
                file: path.clone(),
                expected: table.headers().join(", "),
                found: headers.join(", "),
            }
        })?;

        debug!("Read {} rows from {}", rows.len(), path.display());

        for row in rows {
            table.push(order.iter().map(|&i| row[i].clone()).collect());
        }
    }

    let table = table.unwrap_or_default();
    info!(
        "Loaded {} rows from {} CSV files in {}",
        table.len(),
        files.len(),
        dir.display()
    );
    Ok(table)
}

fn read_csv_file(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let file = File::open(path).map_err(|e| AnalyzerError::io(path, e))?;
    let csv_err = |source| AnalyzerError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok((headers, rows))
}

/// For each expected column, its position in `found`; `None` when the column
/// sets differ.
fn column_order(expected: &[String], found: &[String]) -> Option<Vec<usize>> {
    let expected_set: BTreeSet<&String> = expected.iter().collect();
    let found_set: BTreeSet<&String> = found.iter().collect();
    if expected_set != found_set || expected.len() != found.len() {
        return None;
    }
    expected
        .iter()
        .map(|name| found.iter().position(|f| f == name))
        .collect()
}
