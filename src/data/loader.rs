// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads .txt files from a directory. Each file is one document;
// each non-empty line is one gold sentence. This is the plain
// sentence-per-line format most punctuation-restoration corpora
// ship in.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::document::Document;
use crate::domain::traits::DocumentSource;

/// Loads all .txt files from a given directory.
/// Implements the DocumentSource trait from Layer 3.
pub struct TextLoader {
    /// Path to the directory containing .txt files
    dir: String,
}

impl TextLoader {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSource for TextLoader {
    fn load_all(&self) -> Result<Vec<Document>> {
        let dir = Path::new(&self.dir);

        // A missing directory returns an empty corpus rather than
        // crashing, so the binary can still show help output etc.
        if !dir.exists() {
            tracing::warn!(
                "Corpus directory '{}' does not exist — returning empty corpus",
                self.dir
            );
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();

        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir))?
        {
            let entry = entry?;
            let path  = entry.path();

            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                match load_single_text(&path) {
                    Ok(doc) => {
                        tracing::debug!(
                            "Loaded: {} ({} sentences)",
                            doc.source,
                            doc.sentences.len()
                        );
                        docs.push(doc);
                    }
                    // Log a warning but continue — don't fail on one bad file
                    Err(e) => {
                        tracing::warn!("Skipping '{}': {}", path.display(), e);
                    }
                }
            }
        }

        tracing::info!("Successfully loaded {} documents", docs.len());
        Ok(docs)
    }
}

/// Parse a single .txt file: one sentence per non-empty line.
fn load_single_text(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let sentences: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(Document::new(source, sentences))
}
