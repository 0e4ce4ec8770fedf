//! Text extraction from office documents.
//!
//! Produces a bounded plain-text [`Excerpt`] per document:
//! - pdftotext (Poppler) for PDF
//! - body paragraphs for DOCX (via `docx-rs`)
//! - slide shape text for PPTX
//!
//! The format is chosen from the file extension. Unsupported extensions are
//! reported as [`ExtractOutcome::Skipped`]; unreadable files yield an empty
//! excerpt and a logged warning.

mod excerpt;
mod office;
mod pdf;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

pub use excerpt::{Excerpt, MAX_EXCERPT_CHARS};
pub use office::{DocxExtractor, PptxExtractor};
pub use pdf::PdfExtractor;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Missing document part: {0}")]
    MissingPart(String),

    #[error("Malformed XML in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 3] = [
        DocumentFormat::Pdf,
        DocumentFormat::Docx,
        DocumentFormat::Pptx,
    ];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Pptx => "PPTX",
        }
    }

    /// Detect the format from a path's suffix.
    ///
    /// Matching is case-sensitive: only lowercase `.pdf`, `.docx` and `.pptx`
    /// are recognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.to_string_lossy();
        Self::ALL
            .into_iter()
            .find(|format| name.ends_with(&format!(".{}", format.extension())))
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Converts a document on disk into plain text.
pub trait Extractor {
    /// Format this extractor handles.
    fn format(&self) -> DocumentFormat;

    /// Extract the document's full text.
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Outcome of running extraction on one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The document was a supported format; the excerpt may be empty.
    Excerpt(Excerpt),
    /// The extension matched no registered extractor.
    Skipped,
}

/// Mapping from document format to extractor.
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentFormat, Box<dyn Extractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::empty()
            .with(PdfExtractor::new())
            .with(DocxExtractor::new())
            .with(PptxExtractor::new())
    }
}

impl ExtractorRegistry {
    /// Registry with the built-in PDF, DOCX and PPTX extractors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no extractors; every document is skipped.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor, replacing any existing one for its format.
    pub fn with<E: Extractor + 'static>(mut self, extractor: E) -> Self {
        self.extractors
            .insert(extractor.format(), Box::new(extractor));
        self
    }

    /// Look up the extractor for a path, if its format is supported.
    pub fn for_path(&self, path: &Path) -> Option<&dyn Extractor> {
        let format = DocumentFormat::from_path(path)?;
        self.extractors.get(&format).map(|e| e.as_ref())
    }

    /// Extract a bounded excerpt from `path`.
    ///
    /// Extraction failures are logged and produce an empty excerpt so the
    /// document still flows through the rest of the pipeline.
    pub fn extract_excerpt(&self, path: &Path) -> ExtractOutcome {
        let Some(extractor) = self.for_path(path) else {
            debug!("No extractor for {}, skipping", path.display());
            return ExtractOutcome::Skipped;
        };

        match extractor.extract_text(path) {
            Ok(text) => ExtractOutcome::Excerpt(Excerpt::new(&text)),
            Err(e) => {
                warn!(
                    "Error reading {} {}: {}",
                    extractor.format(),
                    path.display(),
                    e
                );
                ExtractOutcome::Excerpt(Excerpt::empty())
            }
        }
    }
}

/// Check if required tools are available.
pub fn check_tools() -> Vec<(String, bool)> {
    ["pdftotext"]
        .iter()
        .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
        .collect()
}
