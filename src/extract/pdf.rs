//! PDF text extraction using pdftotext.

use std::path::Path;
use std::process::Command;

use super::{DocumentFormat, ExtractionError, Extractor};

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Extracts the text of every page of a PDF.
pub struct PdfExtractor {
    program: String,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self {
            program: "pdftotext".to_string(),
        }
    }
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different pdftotext binary (e.g. a non-PATH install).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Extractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        if !path.is_file() {
            return Err(ExtractionError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }

        let output = Command::new(&self.program)
            .args(["-enc", "UTF-8"])
            .arg(path)
            .arg("-") // Output to stdout
            .output();

        handle_cmd_output(
            output,
            &format!("{} (install poppler-utils)", self.program),
            "pdftotext failed",
        )
    }
}
