// ============================================================
// Layer 4 — Vocabulary Fields
// ============================================================
// Maps between surface tokens and the integer ids the model
// consumes. Two fields exist:
//
//   WordsField — open vocabulary built from the training corpus,
//                with four reserved ids at the bottom:
//                  0 <pad>  padding (trailing positions only)
//                  1 <unk>  out-of-vocabulary words
//                  2 <bos>  begin-of-sequence sentinel
//                  3 <eos>  end-of-sequence sentinel
//                Optionally carries pretrained vectors loaded
//                from a plain-text file ("word v1 v2 ..." rows);
//                the embedding table is then initialised from
//                them and takes its width from the file.
//
//   TagsField  — closed label space for boundary detection:
//                  0 "O" inside a sentence
//                  1 "B" last token of a sentence
//
// Both are serialisable so inference runs on the exact
// vocabulary the checkpoint was trained with.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Reserved id for padding. Trailing positions only — sequences
/// are left-aligned.
pub const PAD_ID: usize = 0;
/// Reserved id for out-of-vocabulary words.
pub const UNK_ID: usize = 1;
/// Reserved id for the begin-of-sequence sentinel.
pub const BOS_ID: usize = 2;
/// Reserved id for the end-of-sequence sentinel.
pub const EOS_ID: usize = 3;

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";
pub const BOS_TOKEN: &str = "<bos>";
pub const EOS_TOKEN: &str = "<eos>";

// ─── WordVectors ──────────────────────────────────────────────────────────────
/// Pretrained embedding rows aligned with `WordsField::itos`.
/// Words without a pretrained vector get a zero row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordVectors {
    pub dim: usize,
    pub rows: Vec<Vec<f32>>,
}

// ─── WordsField ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordsField {
    itos: Vec<String>,
    stoi: HashMap<String, usize>,
    vectors: Option<WordVectors>,
}

impl WordsField {
    /// Build the vocabulary from tokenised documents, keeping
    /// words that occur at least `min_freq` times. Insertion
    /// order after the reserved ids follows first occurrence.
    pub fn build<'a>(documents: impl IntoIterator<Item = &'a [String]>, min_freq: usize) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for doc in documents {
            for token in doc {
                let entry = counts.entry(token.as_str()).or_insert(0);
                if *entry == 0 {
                    order.push(token.as_str());
                }
                *entry += 1;
            }
        }

        let mut itos: Vec<String> = vec![
            PAD_TOKEN.to_string(),
            UNK_TOKEN.to_string(),
            BOS_TOKEN.to_string(),
            EOS_TOKEN.to_string(),
        ];
        for token in order {
            if counts[token] >= min_freq {
                itos.push(token.to_string());
            }
        }

        let stoi = itos
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        Self { itos, stoi, vectors: None }
    }

    /// Number of entries, reserved ids included
    pub fn len(&self) -> usize {
        self.itos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itos.is_empty()
    }

    /// Token → id, falling back to `<unk>`
    pub fn lookup(&self, token: &str) -> usize {
        self.stoi.get(token).copied().unwrap_or(UNK_ID)
    }

    /// Id → token (callers index within bounds)
    pub fn token(&self, id: usize) -> &str {
        &self.itos[id]
    }

    pub fn vectors(&self) -> Option<&WordVectors> {
        self.vectors.as_ref()
    }

    /// Attach pretrained rows directly (rows must align with the
    /// vocabulary). `load_vectors` is the file-based front end.
    pub fn set_vectors(&mut self, vectors: WordVectors) {
        self.vectors = Some(vectors);
    }

    /// Load pretrained vectors from a whitespace-separated text
    /// file ("word v1 v2 ..."). The vector width is taken from the
    /// first row; vocabulary words missing from the file keep a
    /// zero row. Malformed rows are skipped with a warning.
    pub fn load_vectors(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vectors file '{}'", path.display()))?;

        let mut dim = 0usize;
        let mut by_word: HashMap<&str, Vec<f32>> = HashMap::new();

        for (lineno, line) in text.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let values: Vec<f32> = parts.filter_map(|v| v.parse().ok()).collect();
            if values.is_empty() {
                continue;
            }
            if dim == 0 {
                dim = values.len();
            }
            if values.len() != dim {
                tracing::warn!(
                    "Skipping malformed vector row {} in '{}' ({} values, expected {})",
                    lineno + 1,
                    path.display(),
                    values.len(),
                    dim,
                );
                continue;
            }
            by_word.insert(word, values);
        }

        if dim == 0 {
            anyhow::bail!("No usable vectors in '{}'", path.display());
        }

        let mut rows = Vec::with_capacity(self.itos.len());
        let mut covered = 0usize;
        for token in &self.itos {
            match by_word.get(token.as_str()) {
                Some(v) => {
                    covered += 1;
                    rows.push(v.clone());
                }
                None => rows.push(vec![0.0; dim]),
            }
        }

        tracing::info!(
            "Loaded {}-dim pretrained vectors covering {}/{} vocabulary entries",
            dim,
            covered,
            self.itos.len(),
        );

        self.set_vectors(WordVectors { dim, rows });
        Ok(())
    }
}

// ─── TagsField ────────────────────────────────────────────────────────────────
/// Id of the "inside a sentence" class.
pub const TAG_INSIDE: usize = 0;
/// Id of the "sentence boundary" class.
pub const TAG_BOUNDARY: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsField {
    itos: Vec<String>,
}

impl Default for TagsField {
    fn default() -> Self {
        Self { itos: vec!["O".to_string(), "B".to_string()] }
    }
}

impl TagsField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of output classes of the model
    pub fn nb_classes(&self) -> usize {
        self.itos.len()
    }

    pub fn tag(&self, id: usize) -> &str {
        &self.itos[id]
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docs() -> Vec<Vec<String>> {
        vec![
            vec!["the", "cat", "sat"].into_iter().map(String::from).collect(),
            vec!["the", "dog", "sat"].into_iter().map(String::from).collect(),
        ]
    }

    #[test]
    fn test_reserved_ids_come_first() {
        let docs = docs();
        let field = WordsField::build(docs.iter().map(|d| d.as_slice()), 1);
        assert_eq!(field.lookup(PAD_TOKEN), PAD_ID);
        assert_eq!(field.lookup(UNK_TOKEN), UNK_ID);
        assert_eq!(field.lookup(BOS_TOKEN), BOS_ID);
        assert_eq!(field.lookup(EOS_TOKEN), EOS_ID);
        assert_eq!(field.lookup("the"), 4);
        assert_eq!(field.len(), 8);
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let docs = docs();
        let field = WordsField::build(docs.iter().map(|d| d.as_slice()), 1);
        assert_eq!(field.lookup("zebra"), UNK_ID);
    }

    #[test]
    fn test_min_freq_filters_rare_words() {
        let docs = docs();
        let field = WordsField::build(docs.iter().map(|d| d.as_slice()), 2);
        // "the" and "sat" occur twice, "cat"/"dog" once
        assert_eq!(field.len(), 6);
        assert_eq!(field.lookup("cat"), UNK_ID);
    }

    #[test]
    fn test_load_vectors_from_text_file() {
        let docs = docs();
        let mut field = WordsField::build(docs.iter().map(|d| d.as_slice()), 1);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "the 0.1 0.2 0.3").unwrap();
        writeln!(file, "cat 1.0 2.0 3.0").unwrap();
        writeln!(file, "elsewhere 9.0 9.0 9.0").unwrap();
        file.flush().unwrap();

        field.load_vectors(file.path()).unwrap();
        let vectors = field.vectors().unwrap();
        assert_eq!(vectors.dim, 3);
        assert_eq!(vectors.rows.len(), field.len());
        assert_eq!(vectors.rows[field.lookup("the")], vec![0.1, 0.2, 0.3]);
        // word without a pretrained row stays zero
        assert_eq!(vectors.rows[field.lookup("sat")], vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_tags_field_is_binary() {
        let tags = TagsField::new();
        assert_eq!(tags.nb_classes(), 2);
        assert_eq!(tags.tag(TAG_INSIDE), "O");
        assert_eq!(tags.tag(TAG_BOUNDARY), "B");
    }
}
