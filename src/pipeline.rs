//! Extraction → summarization → classification over a list of documents.
//!
//! Documents are processed strictly one at a time in input order. Progress
//! is reported through a [`PipelineEvent`] callback so callers decide how to
//! render it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::extract::{Excerpt, ExtractOutcome, ExtractorRegistry};
use crate::llm::BackendError;
use crate::summarize::Summarizer;

/// Label recorded for a document whose backend call failed under
/// [`FailurePolicy::Isolate`].
pub const CLASSIFICATION_FAILED: &str = "ClassificationFailed";

/// Final (document, label) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub path: PathBuf,
    pub category: String,
}

/// What to do when a summarization or classification call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run; no results are returned.
    #[default]
    Abort,
    /// Record [`CLASSIFICATION_FAILED`] for the document and continue.
    Isolate,
}

impl FailurePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "abort" | "fail-fast" => Some(Self::Abort),
            "isolate" | "continue" => Some(Self::Isolate),
            _ => None,
        }
    }
}

/// Orchestrator settings fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub on_backend_error: FailurePolicy,
}

/// Which backend stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Summarize,
    Classify,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Summarize => f.write_str("summarization"),
            Stage::Classify => f.write_str("classification"),
        }
    }
}

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} failed for {}: {source}", .path.display())]
    Backend {
        path: PathBuf,
        stage: Stage,
        #[source]
        source: BackendError,
    },
}

/// Progress notifications emitted while a run proceeds.
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    /// Run started over `total` documents (supported or not).
    Started { total: usize },
    /// Document `index` (1-based) is about to be processed.
    Processing {
        index: usize,
        total: usize,
        path: &'a Path,
    },
    /// Document had no supported format and was not classified.
    Skipped { path: &'a Path },
    /// Document classified.
    Classified {
        index: usize,
        total: usize,
        remaining: usize,
        path: &'a Path,
        category: &'a str,
    },
    /// A backend call failed and the document was recorded as failed.
    BackendFailed {
        path: &'a Path,
        stage: Stage,
        error: &'a BackendError,
    },
}

/// The classification pipeline.
pub struct Pipeline {
    extractors: ExtractorRegistry,
    summarizer: Summarizer,
    classifier: Classifier,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        extractors: ExtractorRegistry,
        summarizer: Summarizer,
        classifier: Classifier,
        options: PipelineOptions,
    ) -> Self {
        Self {
            extractors,
            summarizer,
            classifier,
            options,
        }
    }

    /// Run over `paths` without progress reporting.
    pub fn classify_all(
        &self,
        paths: &[PathBuf],
    ) -> Result<Vec<ClassificationResult>, PipelineError> {
        self.run(paths, |_| {})
    }

    /// Run over `paths` in order, reporting progress to `on_event`.
    ///
    /// Unsupported documents produce no result. Documents whose text could
    /// not be extracted are still summarized and classified from an empty
    /// excerpt.
    pub fn run<F>(
        &self,
        paths: &[PathBuf],
        mut on_event: F,
    ) -> Result<Vec<ClassificationResult>, PipelineError>
    where
        F: FnMut(&PipelineEvent<'_>),
    {
        let total = paths.len();
        info!("Total documents to process: {}", total);
        on_event(&PipelineEvent::Started { total });

        let mut results = Vec::new();

        for (index, path) in paths.iter().enumerate() {
            let index = index + 1;
            on_event(&PipelineEvent::Processing { index, total, path });

            let excerpt = match self.extractors.extract_excerpt(path) {
                ExtractOutcome::Excerpt(excerpt) => excerpt,
                ExtractOutcome::Skipped => {
                    on_event(&PipelineEvent::Skipped { path });
                    continue;
                }
            };

            let category = match self.summarize_and_classify(&excerpt, path) {
                Ok(category) => category,
                Err((stage, error)) => match self.options.on_backend_error {
                    FailurePolicy::Abort => {
                        return Err(PipelineError::Backend {
                            path: path.clone(),
                            stage,
                            source: error,
                        })
                    }
                    FailurePolicy::Isolate => {
                        warn!("{} failed for {}: {}", stage, path.display(), error);
                        on_event(&PipelineEvent::BackendFailed {
                            path,
                            stage,
                            error: &error,
                        });
                        CLASSIFICATION_FAILED.to_string()
                    }
                },
            };

            info!("Document '{}' classified as: {}", path.display(), category);
            on_event(&PipelineEvent::Classified {
                index,
                total,
                remaining: total - index,
                path,
                category: &category,
            });

            results.push(ClassificationResult {
                path: path.clone(),
                category,
            });
        }

        Ok(results)
    }

    fn summarize_and_classify(
        &self,
        excerpt: &Excerpt,
        path: &Path,
    ) -> Result<String, (Stage, BackendError)> {
        let summary = self
            .summarizer
            .summarize(excerpt)
            .map_err(|e| (Stage::Summarize, e))?;
        debug!("Summary for {}: {}", path.display(), summary);

        self.classifier
            .classify(&summary)
            .map_err(|e| (Stage::Classify, e))
    }
}
