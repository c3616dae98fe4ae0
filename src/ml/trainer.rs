// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Key Burn insight:
//   - Training uses MyBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns model on MyInnerBackend (NdArray)
//   - Validation batcher must also use MyInnerBackend
//   - Dropout is the identity on the inner backend, so the
//     validation pass is deterministic without a train/eval flag
//
// Validation reports precision, recall and F1 on the boundary
// class rather than plain accuracy: almost every token is inside
// a sentence, so accuracy would look excellent while the model
// predicts no boundary at all.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam
//            Treviso et al. (2017), evaluation protocol

use std::sync::Arc;

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::{SbdBatch, SbdBatcher};
use crate::data::dataset::SbdDataset;
use crate::data::vocab::{TagsField, WordsField, EOS_ID, PAD_ID, TAG_BOUNDARY};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::RcnnAttention;

type MyBackend      = burn::backend::Autodiff<burn::backend::NdArray>;
type MyInnerBackend = burn::backend::NdArray;

pub fn run_training(
    cfg:           &TrainConfig,
    words_field:   &WordsField,
    tags_field:    &TagsField,
    train_dataset: SbdDataset,
    val_dataset:   SbdDataset,
    ckpt_manager:  CheckpointManager,
) -> Result<()> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!("Using ndarray device: {:?}", device);

    // ── Build model ───────────────────────────────────────────────────────────
    // The constructor may overwrite word_embeddings_size when the
    // vocabulary carries pretrained vectors; inference rebuilds
    // from the same vocabulary, so both sides agree.
    let mut options = cfg.model.clone();
    let mut model: RcnnAttention<MyBackend> =
        RcnnAttention::new(words_field, tags_field, &mut options, &device)?;
    tracing::info!(
        "Model ready: {} rnn, hidden={}, scorer={}, attention={}",
        cfg.model.rnn_type, cfg.model.hidden_size,
        cfg.model.attn_scorer, cfg.model.attn_type,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader: Arc<dyn DataLoader<MyBackend, SbdBatch<MyBackend>>> =
        DataLoaderBuilder::new(SbdBatcher)
            .batch_size(cfg.batch_size)
            .shuffle(42)
            .num_workers(1)
            .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader: Arc<dyn DataLoader<MyInnerBackend, SbdBatch<MyInnerBackend>>> =
        DataLoaderBuilder::new(SbdBatcher)
            .batch_size(cfg.batch_size)
            .num_workers(1)
            .build(val_dataset);

    let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let loss = model.forward_loss(batch.words, batch.tags);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → RcnnAttention<MyInnerBackend>
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut tp = 0i64;
        let mut fp = 0i64;
        let mut fnn = 0i64;

        for batch in val_loader.iter() {
            let loss = model_valid.forward_loss(batch.words.clone(), batch.tags.clone());
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;

            let log_probs = model_valid.forward(batch.words.clone());
            let (b_tp, b_fp, b_fn) = boundary_counts(log_probs, batch.words, batch.tags);
            tp  += b_tp;
            fp  += b_fp;
            fnn += b_fn;
        }

        let avg_val_loss = if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let precision = ratio(tp, tp + fp);
        let recall    = ratio(tp, tp + fnn);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else { 0.0 };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | P={:.3} | R={:.3} | F1={:.3}",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, precision, recall, f1,
        );

        metrics.log(&EpochMetrics::new(
            epoch, avg_train_loss, avg_val_loss, precision, recall, f1,
        ))?;

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(())
}

fn ratio(num: i64, den: i64) -> f64 {
    if den > 0 { num as f64 / den as f64 } else { 0.0 }
}

/// Count true/false positives and false negatives of the boundary
/// class over the valid inner positions of a batch.
///
/// log_probs [bs, ts-2, nb_classes], words [bs, ts], tags [bs, ts-2].
/// Positions past a sequence's true inner length (pad, and the
/// in-slice <eos> of shorter sequences) are excluded.
fn boundary_counts<B: Backend>(
    log_probs: Tensor<B, 3>,
    words:     Tensor<B, 2, Int>,
    tags:      Tensor<B, 2, Int>,
) -> (i64, i64, i64) {
    let [bs, ts] = words.dims();

    let inner = words.slice([0..bs, 1..ts - 1]);
    let valid = inner.clone().not_equal_elem(PAD_ID as i32).int()
        * inner.not_equal_elem(EOS_ID as i32).int();

    let pred = log_probs.argmax(2).squeeze::<2>(2);
    let pred_b = pred.equal_elem(TAG_BOUNDARY as i32).int() * valid.clone();
    let gold_b = tags.equal_elem(TAG_BOUNDARY as i32).int() * valid;

    let tp: i64 = (pred_b.clone() * gold_b.clone()).sum().into_scalar().elem::<i64>();
    let pred_total: i64 = pred_b.sum().into_scalar().elem::<i64>();
    let gold_total: i64 = gold_b.sum().into_scalar().elem::<i64>();

    (tp, pred_total - tp, gold_total - tp)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocab::BOS_ID;

    type TB = burn::backend::NdArray;

    #[test]
    fn test_boundary_counts_on_a_known_batch() {
        let device = Default::default();
        let b = BOS_ID as i32;
        let e = EOS_ID as i32;
        let p = PAD_ID as i32;

        // one sequence, 3 inner tokens, one pad column
        let words = Tensor::<TB, 1, Int>::from_ints(
            [b, 4, 5, 6, e, p].as_slice(), &device,
        ).reshape([1, 6]);
        // gold: boundary on the last inner token only
        let tags = Tensor::<TB, 1, Int>::from_ints(
            [0, 0, 1, 0].as_slice(), &device,
        ).reshape([1, 4]);

        // predictions: boundary at positions 1 and 2, and at the
        // masked position 3 (must be ignored)
        let lo = -10.0f32;
        let hi = -0.1f32;
        let log_probs = Tensor::<TB, 3>::from_data(
            [[[hi, lo], [lo, hi], [lo, hi], [lo, hi]]],
            &device,
        );

        let (tp, fp, fnn) = boundary_counts(log_probs, words, tags);
        assert_eq!(tp, 1);  // position 2
        assert_eq!(fp, 1);  // position 1
        assert_eq!(fnn, 0);
    }

    #[test]
    fn test_ratio_handles_zero_denominator() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(3, 4), 0.75);
    }
}
