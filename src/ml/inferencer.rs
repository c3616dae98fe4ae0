// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads a trained checkpoint and segments raw text: the model
// marks the last token of each sentence, and the inferencer
// splits the token stream at those marks.
//
// The model is rebuilt from the saved training config and the
// saved vocabulary, so the architecture and the token ids are
// exactly those of the training run.

use anyhow::Result;
use burn::prelude::*;

use crate::data::preprocessor::Preprocessor;
use crate::data::vocab::{WordsField, BOS_ID, EOS_ID, TAG_BOUNDARY};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::vocab_store::VocabStore;
use crate::ml::model::RcnnAttention;

type InferBackend = burn::backend::NdArray;

pub struct Inferencer {
    model:        RcnnAttention<InferBackend>,
    words:        WordsField,
    preprocessor: Preprocessor,
    device:       burn::backend::ndarray::NdArrayDevice,
}

impl Inferencer {
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        vocab_store:  &VocabStore,
    ) -> Result<Self> {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let cfg = ckpt_manager.load_config()?;
        let (words, tags) = vocab_store.load()?;

        let mut options = cfg.model.clone();
        let model: RcnnAttention<InferBackend> =
            RcnnAttention::new(&words, &tags, &mut options, &device)?;
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self {
            model,
            words,
            preprocessor: Preprocessor::new(cfg.lowercase),
            device,
        })
    }

    /// Split `text` into sentences. Tokens keep their surface form;
    /// only the vocabulary lookup goes through normalisation.
    pub fn segment(&self, text: &str) -> Result<Vec<String>> {
        let cleaned = self.preprocessor.clean(text);
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        // <bos> tokens <eos>
        let mut ids: Vec<i32> = Vec::with_capacity(tokens.len() + 2);
        ids.push(BOS_ID as i32);
        for token in &tokens {
            ids.push(self.words.lookup(&self.preprocessor.normalize(token)) as i32);
        }
        ids.push(EOS_ID as i32);

        let n = ids.len();
        let words_t = Tensor::<InferBackend, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([1, n]);

        // [1, n-2, nb_classes] → per-token class ids
        let log_probs = self.model.forward(words_t);
        let pred: Vec<i64> = log_probs
            .argmax(2)
            .squeeze::<2>(2)
            .into_data()
            .to_vec()
            .unwrap_or_default();

        // cut the token stream after every boundary-tagged token
        let mut sentences = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for (token, class) in tokens.iter().zip(pred.iter()) {
            current.push(token);
            if *class == TAG_BOUNDARY as i64 {
                sentences.push(current.join(" "));
                current.clear();
            }
        }
        // tokens after the last predicted boundary still form a sentence
        if !current.is_empty() {
            sentences.push(current.join(" "));
        }

        tracing::debug!("Segmented {} tokens into {} sentences", tokens.len(), sentences.len());
        Ok(sentences)
    }
}
