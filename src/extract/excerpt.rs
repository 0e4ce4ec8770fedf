/// Maximum number of characters kept from a document.
pub const MAX_EXCERPT_CHARS: usize = 1000;

/// Plain-text prefix of a document, at most [`MAX_EXCERPT_CHARS`] characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Excerpt(String);

impl Excerpt {
    /// Keep the first [`MAX_EXCERPT_CHARS`] characters of `text`.
    pub fn new(text: &str) -> Self {
        // Count chars, not bytes, so multi-byte text is never split
        let end = text
            .char_indices()
            .nth(MAX_EXCERPT_CHARS)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
        Self(text[..end].to_string())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}
