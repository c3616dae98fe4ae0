// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// Represents a single corpus document loaded from disk.
// Plain data struct with no behaviour beyond construction —
// a source name and the document's sentences.

use serde::{Deserialize, Serialize};

/// A raw document loaded from disk, one entry per sentence.
/// The sentence breaks are the supervision signal: during
/// training the last token of every sentence is tagged as a
/// boundary, and the model learns to recover those breaks from
/// unsegmented text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The filename or path — kept for traceability
    pub source: String,

    /// Sentences in document order, untokenised
    pub sentences: Vec<String>,
}

impl Document {
    pub fn new(source: impl Into<String>, sentences: Vec<String>) -> Self {
        Self {
            source: source.into(),
            sentences,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}
