//! CSV output of classification results.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::ClassificationResult;

/// Column headers of the results file.
pub const CSV_HEADER: [&str; 2] = ["File Name", "Category"];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("The specified output directory '{0}' does not exist")]
    MissingDirectory(PathBuf),

    #[error("The output filename '{0}' must have a .csv extension")]
    NotCsv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate the output location before any work starts.
pub fn output_path(dir: &Path, filename: &str) -> Result<PathBuf, OutputError> {
    if !dir.is_dir() {
        return Err(OutputError::MissingDirectory(dir.to_path_buf()));
    }
    if !filename.ends_with(".csv") {
        return Err(OutputError::NotCsv(filename.to_string()));
    }
    Ok(dir.join(filename))
}

/// Quote a field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn write_row<W: Write>(out: &mut W, fields: &[&str]) -> std::io::Result<()> {
    let row: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f)).collect();
    write!(out, "{}\r\n", row.join(","))
}

/// Write results as CSV to any writer.
pub fn write_results<W: Write>(
    out: &mut W,
    results: &[ClassificationResult],
) -> std::io::Result<()> {
    write_row(out, &CSV_HEADER)?;
    for result in results {
        let path = result.path.to_string_lossy();
        write_row(out, &[&*path, result.category.as_str()])?;
    }
    Ok(())
}

/// Write results to a CSV file, replacing any existing file.
pub fn save_csv(path: &Path, results: &[ClassificationResult]) -> Result<(), OutputError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_results(&mut out, results)?;
    out.flush()?;
    Ok(())
}
