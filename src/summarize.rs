//! Excerpt summarization.

use tracing::debug;

use crate::extract::Excerpt;
use crate::llm::{BackendError, ChatBackend, ChatMessage};

/// System prompt sent ahead of every excerpt.
pub const SUMMARY_PROMPT: &str = "You are an assistant that summarizes documents. \
Provide a concise summary of the following document content:";

/// Reduces an excerpt to a short summary using a fixed backend.
pub struct Summarizer {
    backend: Box<dyn ChatBackend>,
}

impl Summarizer {
    pub fn new(backend: Box<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Build the messages for one excerpt.
    pub fn messages(excerpt: &Excerpt) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SUMMARY_PROMPT),
            ChatMessage::user(excerpt.as_str()),
        ]
    }

    /// Summarize an excerpt. Empty excerpts are sent as-is.
    pub fn summarize(&self, excerpt: &Excerpt) -> Result<String, BackendError> {
        debug!("Summarizing excerpt of {} chars", excerpt.char_count());
        let summary = self.backend.complete(&Self::messages(excerpt))?;
        Ok(summary.trim().to_string())
    }
}
