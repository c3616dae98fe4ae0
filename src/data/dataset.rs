// ============================================================
// Layer 4 — Boundary Detection Dataset
// ============================================================
// One sample per document: the document's sentences are
// concatenated into a single token stream, the last token of
// every sentence carries the boundary tag, and the stream is
// bracketed by the <bos>/<eos> sentinels the model strips from
// its output. Tags therefore align with the inner tokens:
// tag_ids.len() == word_ids.len() - 2.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::vocab::{WordsField, BOS_ID, EOS_ID, TAG_BOUNDARY, TAG_INSIDE};
use crate::domain::document::Document;
use crate::data::preprocessor::Preprocessor;

/// One encoded document: sentinel-bracketed word ids and one tag
/// per inner token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbdSample {
    pub word_ids: Vec<usize>,
    pub tag_ids:  Vec<usize>,
}

impl SbdSample {
    /// Encode one tokenised document (token lists per sentence).
    /// Returns None when the document has no tokens at all.
    pub fn encode(sentences: &[Vec<String>], words: &WordsField) -> Option<Self> {
        let nb_tokens: usize = sentences.iter().map(Vec::len).sum();
        if nb_tokens == 0 {
            return None;
        }

        let mut word_ids = Vec::with_capacity(nb_tokens + 2);
        let mut tag_ids  = Vec::with_capacity(nb_tokens);
        word_ids.push(BOS_ID);

        for sentence in sentences {
            for (i, token) in sentence.iter().enumerate() {
                word_ids.push(words.lookup(token));
                tag_ids.push(if i + 1 == sentence.len() {
                    TAG_BOUNDARY
                } else {
                    TAG_INSIDE
                });
            }
        }

        word_ids.push(EOS_ID);
        Some(Self { word_ids, tag_ids })
    }

    /// Token count without the sentinels
    pub fn inner_len(&self) -> usize {
        self.tag_ids.len()
    }
}

pub struct SbdDataset {
    samples: Vec<SbdSample>,
}

impl SbdDataset {
    pub fn new(samples: Vec<SbdSample>) -> Self {
        Self { samples }
    }

    /// Tokenise and encode a corpus, dropping empty documents.
    pub fn from_documents(
        documents:    &[Document],
        words:        &WordsField,
        preprocessor: &Preprocessor,
    ) -> Self {
        let samples = documents
            .iter()
            .filter_map(|doc| {
                let tokenized = preprocessor.tokenize_document(&doc.sentences);
                SbdSample::encode(&tokenized, words)
            })
            .collect();
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Hand the samples back, e.g. for the train/validation split
    pub fn into_samples(self) -> Vec<SbdSample> {
        self.samples
    }
}

impl Dataset<SbdSample> for SbdDataset {
    fn get(&self, index: usize) -> Option<SbdSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
