// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the word and tag fields next to the checkpoints so
// inference maps tokens to exactly the ids the model was trained
// with. A checkpoint without its vocabulary is useless: the
// embedding rows are only meaningful under the original mapping.
//
// Output file: checkpoints/vocab.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::data::vocab::{TagsField, WordsField};

#[derive(Serialize, Deserialize)]
struct VocabRecord {
    words: WordsField,
    tags:  TagsField,
}

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn save(&self, words: &WordsField, tags: &TagsField) -> Result<()> {
        let path = self.dir.join("vocab.json");
        let record = VocabRecord {
            words: words.clone(),
            tags:  tags.clone(),
        };

        fs::write(&path, serde_json::to_string(&record)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;

        tracing::debug!("Saved vocabulary ({} words) to '{}'", words.len(), path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<(WordsField, TagsField)> {
        let path = self.dir.join("vocab.json");

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read vocabulary from '{}'. \
                 Make sure you have run 'train' before 'detect'.",
                path.display()
            )
        })?;

        let record: VocabRecord = serde_json::from_str(&json)?;
        Ok((record.words, record.tags))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocab_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());

        let docs: Vec<Vec<String>> = vec![vec!["alpha", "beta"]
            .into_iter()
            .map(String::from)
            .collect()];
        let words = WordsField::build(docs.iter().map(|d| d.as_slice()), 1);
        let tags  = TagsField::new();

        store.save(&words, &tags).unwrap();
        let (loaded_words, loaded_tags) = store.load().unwrap();

        assert_eq!(loaded_words.len(), words.len());
        assert_eq!(loaded_words.lookup("alpha"), words.lookup("alpha"));
        assert_eq!(loaded_tags.nb_classes(), 2);
    }

    #[test]
    fn test_missing_vocab_is_a_readable_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("train"));
    }
}
