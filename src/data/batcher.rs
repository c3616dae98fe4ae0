// ============================================================
// Layer 4 — Boundary Detection Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<SbdSample>
// into tensors.
//
// Unlike fixed-length pipelines, documents here have wildly
// different lengths, so padding is dynamic: every batch is padded
// to ITS OWN maximum length, never a global one. Pad ids occupy
// trailing positions only (sequences are left-aligned), which is
// the contract the model's length computation relies on.
//
//   words: [batch, max_len]      padded with <pad> (id 0)
//   tags:  [batch, max_len - 2]  padded with the inside class;
//          padded tag positions are excluded from the loss by
//          the word mask, their value is never scored
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::SbdSample;
use crate::data::vocab::{PAD_ID, TAG_INSIDE};

// ─── SbdBatch ─────────────────────────────────────────────────────────────────
/// A batch of encoded documents ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct SbdBatch<B: Backend> {
    /// Sentinel-bracketed token ids — shape: [batch_size, max_len]
    pub words: Tensor<B, 2, Int>,

    /// Per-inner-token tags — shape: [batch_size, max_len - 2]
    pub tags: Tensor<B, 2, Int>,
}

// ─── SbdBatcher ───────────────────────────────────────────────────────────────
/// Stateless batcher; the DataLoader hands it the target device
/// with every call.
#[derive(Clone, Default, Debug)]
pub struct SbdBatcher;

impl<B: Backend> Batcher<B, SbdSample, SbdBatch<B>> for SbdBatcher {
    fn batch(&self, items: Vec<SbdSample>, device: &B::Device) -> SbdBatch<B> {
        let batch_size = items.len();
        let max_len = items
            .iter()
            .map(|s| s.word_ids.len())
            .max()
            .unwrap_or(2);

        let mut words_flat: Vec<i32> = Vec::with_capacity(batch_size * max_len);
        let mut tags_flat: Vec<i32> = Vec::with_capacity(batch_size * (max_len - 2));

        for sample in &items {
            words_flat.extend(sample.word_ids.iter().map(|&id| id as i32));
            words_flat.extend(
                std::iter::repeat(PAD_ID as i32).take(max_len - sample.word_ids.len()),
            );

            tags_flat.extend(sample.tag_ids.iter().map(|&t| t as i32));
            tags_flat.extend(
                std::iter::repeat(TAG_INSIDE as i32).take(max_len - 2 - sample.tag_ids.len()),
            );
        }

        let words = Tensor::<B, 1, Int>::from_ints(words_flat.as_slice(), device)
            .reshape([batch_size, max_len]);
        let tags = Tensor::<B, 1, Int>::from_ints(tags_flat.as_slice(), device)
            .reshape([batch_size, max_len - 2]);

        SbdBatch { words, tags }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocab::{BOS_ID, EOS_ID, TAG_BOUNDARY};

    type TB = burn::backend::NdArray;

    fn sample(inner: &[usize], tags: &[usize]) -> SbdSample {
        let mut word_ids = vec![BOS_ID];
        word_ids.extend_from_slice(inner);
        word_ids.push(EOS_ID);
        SbdSample { word_ids, tag_ids: tags.to_vec() }
    }

    #[test]
    fn test_pads_to_batch_maximum_with_trailing_pad() {
        let device = Default::default();
        let items = vec![
            sample(&[4, 5, 6], &[0, 0, 1]),
            sample(&[7], &[1]),
        ];
        let batch: SbdBatch<TB> = SbdBatcher.batch(items, &device);

        assert_eq!(batch.words.dims(), [2, 5]);
        assert_eq!(batch.tags.dims(), [2, 3]);

        // NdArray stores Int tensors as i64
        let words: Vec<i64> = batch.words.into_data().to_vec().unwrap();
        let b = BOS_ID as i64;
        let e = EOS_ID as i64;
        let p = PAD_ID as i64;
        assert_eq!(words, vec![b, 4, 5, 6, e, b, 7, e, p, p]);
    }

    #[test]
    fn test_tag_padding_uses_inside_class() {
        let device = Default::default();
        let items = vec![
            sample(&[4, 5], &[0, 1]),
            sample(&[6], &[TAG_BOUNDARY]),
        ];
        let batch: SbdBatch<TB> = SbdBatcher.batch(items, &device);
        let tags: Vec<i64> = batch.tags.into_data().to_vec().unwrap();
        assert_eq!(tags, vec![0, 1, 1, TAG_INSIDE as i64]);
    }
}
