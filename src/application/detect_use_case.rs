// ============================================================
// Layer 2 — DetectUseCase
// ============================================================
// The inference workflow: rebuild the trained model from its
// checkpoint and vocabulary, then segment unsegmented text into
// sentences.

use anyhow::Result;

use crate::domain::traits::SentenceSegmenter;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::inferencer::Inferencer;

pub struct DetectUseCase {
    inferencer: Inferencer,
}

impl DetectUseCase {
    /// Load everything needed for inference from the checkpoint
    /// directory written by a previous training run.
    pub fn new(checkpoint_dir: impl Into<String>) -> Result<Self> {
        let checkpoint_dir = checkpoint_dir.into();
        let ckpt_manager   = CheckpointManager::new(checkpoint_dir.clone());
        let vocab_store    = VocabStore::new(checkpoint_dir);

        let inferencer = Inferencer::from_checkpoint(&ckpt_manager, &vocab_store)?;
        Ok(Self { inferencer })
    }
}

impl SentenceSegmenter for DetectUseCase {
    fn segment(&self, text: &str) -> Result<Vec<String>> {
        self.inferencer.segment(text)
    }
}
