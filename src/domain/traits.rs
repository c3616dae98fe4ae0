// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// implementations can be swapped without changing the code
// that uses them:
//   - TextLoader implements DocumentSource
//   - A future ConllLoader could also implement DocumentSource
//   - The application layer only sees DocumentSource
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::document::Document;
use anyhow::Result;

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can load a sentence-annotated corpus.
///
/// Implementations:
///   - TextLoader → loads a directory of .txt files,
///     one sentence per line
pub trait DocumentSource {
    /// Load all available documents from this source.
    fn load_all(&self) -> Result<Vec<Document>>;
}

// ─── SentenceSegmenter ────────────────────────────────────────────────────────
/// Any component that can split unsegmented text into sentences.
///
/// Implementations:
///   - DetectUseCase → uses the trained RCNN-attention model
pub trait SentenceSegmenter {
    /// Split `text` into sentences, in order.
    fn segment(&self, text: &str) -> Result<Vec<String>>;
}
