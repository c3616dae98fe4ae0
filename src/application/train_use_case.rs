// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load .txt corpus            (Layer 4 - data)
//   Step 2: Clean + tokenise            (Layer 4 - data)
//   Step 3: Build vocabulary            (Layer 4 - data)
//   Step 4: Load pretrained vectors     (Layer 4 - data)
//   Step 5: Encode samples              (Layer 4 - data)
//   Step 6: Split train/validation      (Layer 4 - data)
//   Step 7: Build datasets              (Layer 4 - data)
//   Step 8: Save config + vocabulary    (Layer 6 - infra)
//   Step 9: Run training loop           (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::SbdDataset,
    loader::TextLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
    vocab::{TagsField, WordsField},
};
use crate::domain::traits::DocumentSource;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::options::ModelOptions;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Serialisable so it can be
// saved to disk and reloaded for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_dir:      String,
    pub checkpoint_dir:  String,
    /// Optional plain-text pretrained vectors ("word v1 v2 ...")
    pub embeddings_file: Option<String>,
    /// Words rarer than this in the corpus map to <unk>
    pub min_freq:        usize,
    pub lowercase:       bool,
    pub train_fraction:  f64,
    pub batch_size:      usize,
    pub epochs:          usize,
    pub lr:              f64,
    pub model:           ModelOptions,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_dir:      "data/corpus".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            embeddings_file: None,
            min_freq:        1,
            lowercase:       true,
            train_fraction:  0.8,
            batch_size:      8,
            epochs:          10,
            lr:              1e-3,
            model:           ModelOptions::default(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.corpus_dir);
        let loader = TextLoader::new(&cfg.corpus_dir);
        let docs   = loader.load_all()?;
        tracing::info!("Loaded {} documents", docs.len());

        // ── Step 2: Clean and tokenise ────────────────────────────────────────
        let preprocessor = Preprocessor::new(cfg.lowercase);
        let flat_docs: Vec<Vec<String>> = docs
            .iter()
            .map(|doc| {
                preprocessor
                    .tokenize_document(&doc.sentences)
                    .into_iter()
                    .flatten()
                    .collect()
            })
            .collect();

        // ── Step 3: Build the vocabulary ──────────────────────────────────────
        let mut words_field =
            WordsField::build(flat_docs.iter().map(|d| d.as_slice()), cfg.min_freq);
        let tags_field = TagsField::new();
        tracing::info!("Vocabulary: {} words", words_field.len());

        // ── Step 4: Optional pretrained vectors ───────────────────────────────
        // The model constructor takes the embedding width from
        // these, overriding the configured word_embeddings_size.
        if let Some(path) = &cfg.embeddings_file {
            words_field.load_vectors(path)?;
        }

        // ── Step 5: Encode training samples ───────────────────────────────────
        let dataset = SbdDataset::from_documents(&docs, &words_field, &preprocessor);
        tracing::info!("Encoded {} samples", dataset.sample_count());
        anyhow::ensure!(
            dataset.sample_count() > 0,
            "No usable documents in '{}'",
            cfg.corpus_dir
        );

        // ── Step 6: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) =
            split_train_val(dataset.into_samples(), cfg.train_fraction);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 7: Build Burn datasets ───────────────────────────────────────
        let train_dataset = SbdDataset::new(train_samples);
        let val_dataset   = SbdDataset::new(val_samples);

        // ── Step 8: Persist config and vocabulary ─────────────────────────────
        // Inference needs both to rebuild the model and to map
        // tokens to the ids the checkpoint was trained with.
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let vocab_store = VocabStore::new(&cfg.checkpoint_dir);
        vocab_store.save(&words_field, &tags_field)?;

        // ── Step 9: Run training loop (Layer 5) ───────────────────────────────
        run_training(
            cfg,
            &words_field,
            &tags_field,
            train_dataset,
            val_dataset,
            ckpt_manager,
        )?;

        Ok(())
    }
}
