//! Finding documents to classify under an input directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::extract::DocumentFormat;

/// Errors that can occur while discovering documents.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Input directory does not exist: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which document types to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTypeFilter {
    Pdf,
    Docx,
    Pptx,
    #[default]
    All,
}

impl FileTypeFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Formats selected by this filter, in collection order.
    pub fn formats(&self) -> Vec<DocumentFormat> {
        match self {
            Self::Pdf => vec![DocumentFormat::Pdf],
            Self::Docx => vec![DocumentFormat::Docx],
            Self::Pptx => vec![DocumentFormat::Pptx],
            Self::All => DocumentFormat::ALL.to_vec(),
        }
    }
}

/// Documents found under a directory.
#[derive(Debug, Clone, Default)]
pub struct Discovered {
    /// Paths grouped by format (in filter order), sorted within each group.
    pub paths: Vec<PathBuf>,
    /// Number of documents per selected format.
    pub counts: Vec<(DocumentFormat, usize)>,
}

impl Discovered {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn count(&self, format: DocumentFormat) -> usize {
        self.counts
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Recursively collect documents of the selected types under `root`.
///
/// Hidden entries and Office lock files (names starting with `$`) are ignored.
pub fn discover(root: &Path, filter: FileTypeFilter) -> Result<Discovered, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    walk(root, &mut files, true)?;

    let mut discovered = Discovered::default();
    for format in filter.formats() {
        let mut matching: Vec<PathBuf> = files
            .iter()
            .filter(|p| DocumentFormat::from_path(p) == Some(format))
            .cloned()
            .collect();
        matching.sort();

        debug!("Found {} {} files", matching.len(), format);
        discovered.counts.push((format, matching.len()));
        discovered.paths.extend(matching);
    }

    Ok(discovered)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>, is_root: bool) -> Result<(), DiscoveryError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) if is_root => {
            return Err(DiscoveryError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
        Err(e) => {
            warn!("Skipping unreadable directory {}: {}", dir.display(), e);
            return Ok(());
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.starts_with('$') {
            continue;
        }

        let path = entry.path();
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => walk(&path, files, false)?,
            _ if path.is_file() => files.push(path),
            _ => {}
        }
    }

    Ok(())
}
