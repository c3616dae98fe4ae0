// ============================================================
// Layer 5 — RCNN + Attention Model
// ============================================================
// Recurrent Convolutional Neural Network with self-attention for
// sentence boundary detection, after Treviso et al. (2017),
// https://arxiv.org/pdf/1610.00211.pdf
//
// Five stages, data flowing strictly forward per call:
//
//   token ids [bs, ts]
//       │ Embedding (optionally pretrained / frozen) + dropout
//       ▼ [bs, ts, emb]
//       │ Conv1d + ReLU, max-pool over the feature axis, dropout
//       ▼ [bs, ts, conv/pool + pool/2]
//       │ RecurrentEncoder (rnn/gru/lstm, uni/bidirectional),
//       │ sigmoid, dropout
//       ▼ [bs, ts, n*hidden]
//       │ Self-attention (pluggable scorer, padding mask)
//       ▼ [bs, ts, features]
//       │ Linear + log-softmax, strip <bos>/<eos> positions
//       ▼ [bs, ts-2, nb_classes]   (log-probabilities)
//
// Weights are initialised once, at construction: Kaiming-uniform
// for the convolution (ReLU-compatible fan-in scaling), Xavier-
// uniform for the recurrent cells and the output projection.
//
// Dropout stages are stochastic only under the autodiff backend;
// on the inner (inference) backend they are the identity, so the
// train/eval switch is the backend type, never global state.

use burn::{
    module::{Module, Param},
    nn::{
        conv::{Conv1d, Conv1dConfig},
        pool::{MaxPool1d, MaxPool1dConfig},
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig,
        PaddingConfig1d,
    },
    tensor::{
        activation::{log_softmax, relu, sigmoid},
        backend::Backend,
        Int, Tensor, TensorData,
    },
};

use crate::data::vocab::{TagsField, WordsField, EOS_ID, PAD_ID};
use crate::ml::attention::{Attention, AttentionLayer, MultiHeadedAttention};
use crate::ml::error::ModelError;
use crate::ml::options::ModelOptions;
use crate::ml::rnn::RecurrentEncoder;
use crate::ml::scorer::Scorer;

// ─── RcnnAttention ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct RcnnAttention<B: Backend> {
    word_emb: Embedding<B>,
    dropout_emb: Dropout,
    cnn_1d: Conv1d<B>,
    max_pool: MaxPool1d,
    dropout_cnn: Dropout,
    rnn: RecurrentEncoder<B>,
    dropout_rnn: Dropout,
    attn: AttentionLayer<B>,
    linear_out: Linear<B>,
}

impl<B: Backend> RcnnAttention<B> {
    /// Build the model from the vocabulary, the label space and
    /// the hyperparameters.
    ///
    /// `options` is taken mutably for one reason only: when the
    /// words field carries pretrained vectors, the embedding width
    /// must follow the vectors, so `options.word_embeddings_size`
    /// is overwritten with their dimensionality.
    ///
    /// Fails (and builds nothing) on an unrecognised
    /// `attn_scorer` or `attn_type` name.
    pub fn new(
        words_field: &WordsField,
        tags_field: &TagsField,
        options: &mut ModelOptions,
        device: &B::Device,
    ) -> Result<Self, ModelError> {
        //
        // Embeddings
        //
        let pretrained: Option<Tensor<B, 2>> = words_field.vectors().map(|vectors| {
            options.word_embeddings_size = vectors.dim;
            let flat: Vec<f32> = vectors.rows.iter().flatten().copied().collect();
            Tensor::from_data(
                TensorData::new(flat, [words_field.len(), vectors.dim]),
                device,
            )
        });

        let mut word_emb =
            EmbeddingConfig::new(words_field.len(), options.word_embeddings_size).init(device);
        if let Some(vectors) = pretrained {
            word_emb.weight = Param::from_tensor(vectors);
        }
        let word_emb = if options.freeze_embeddings {
            word_emb.no_grad()
        } else {
            word_emb
        };
        let dropout_emb = DropoutConfig::new(options.emb_dropout).init();

        //
        // CNN 1D
        //
        let cnn_1d = Conv1dConfig::new(
            options.word_embeddings_size,
            options.conv_size,
            options.kernel_size,
        )
        .with_padding(PaddingConfig1d::Explicit(options.kernel_size / 2))
        .with_initializer(Initializer::KaimingUniform {
            gain: f64::sqrt(2.0),
            fan_out_only: false,
        })
        .init(device);

        // pools over the feature axis (time is moved to the
        // channel dimension first — see forward)
        let max_pool = MaxPool1dConfig::new(options.pool_length)
            .with_stride(options.pool_length)
            .with_padding(PaddingConfig1d::Explicit(options.pool_length / 2))
            .init();
        let dropout_cnn = DropoutConfig::new(options.cnn_dropout).init();

        //
        // RNN
        //
        // The pooled feature width is a fixed construction-time
        // formula; if it disagrees with the actual pooled width
        // the first forward pass fails with a shape error rather
        // than being silently corrected here.
        let rnn = RecurrentEncoder::new(
            &options.rnn_type,
            options.pooled_features_size(),
            options.hidden_size,
            options.bidirectional,
            options.sum_bidir,
            device,
        );
        let dropout_rnn = DropoutConfig::new(options.rnn_dropout).init();

        //
        // Attention (queries = keys = values for self-attention)
        //
        let features_size = rnn.output_size();
        let scorer = Scorer::from_name(
            &options.attn_scorer,
            features_size,
            features_size,
            options.attn_hidden_size,
            device,
        )?;

        let (attn, features_size) = match options.attn_type.as_str() {
            "regular" => (
                AttentionLayer::Regular(Attention::new(scorer, options.attn_dropout)),
                features_size,
            ),
            "multihead" => (
                AttentionLayer::MultiHead(MultiHeadedAttention::new(
                    scorer,
                    options.attn_nb_heads,
                    features_size,
                    features_size,
                    features_size,
                    options.attn_multihead_hidden_size,
                    options.attn_dropout,
                    device,
                )),
                options.attn_multihead_hidden_size,
            ),
            other => return Err(ModelError::UnknownAttention(other.to_string())),
        };

        //
        // Linear
        //
        let linear_out = LinearConfig::new(features_size, tags_field.nb_classes())
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);

        Ok(Self {
            word_emb,
            dropout_emb,
            cnn_1d,
            max_pool,
            dropout_cnn,
            rnn,
            dropout_rnn,
            attn,
            linear_out,
        })
    }

    /// words [bs, ts] (pad id in trailing positions only, one
    /// leading <bos> and one trailing <eos> per sequence)
    /// → log-probabilities [bs, ts - 2, nb_classes]
    pub fn forward(&self, words: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [bs, ts] = words.dims();
        let mask = words.clone().not_equal_elem(PAD_ID as i32);
        let lengths = mask.clone().int().sum_dim(1); // [bs, 1]

        // (bs, ts) -> (bs, ts, emb)
        let h = self.word_emb.forward(words);
        let h = self.dropout_emb.forward(h);

        // pad positions must embed to exact zeros — the same value
        // the convolution's edge padding inserts. The kernel reads
        // past each sequence's true end, so a non-zero pad row
        // would make valid positions' outputs depend on how much
        // trailing padding the batch carries. Masking here also
        // keeps the pad row out of gradient flow.
        let emb = h.dims()[2];
        let h = h.mask_fill(
            mask.clone().bool_not().unsqueeze_dim::<3>(2).expand([bs, ts, emb]),
            0.0,
        );

        // (bs, ts, emb) -> (bs, emb, ts) for the convolution
        let h = h.swap_dims(1, 2);
        let h = relu(self.cnn_1d.forward(h));

        // (bs, conv, ts) -> (bs, ts, conv): pooling then runs over
        // the feature axis, not over time
        let h = h.swap_dims(1, 2);
        let h = self.max_pool.forward(h);
        let h = self.dropout_cnn.forward(h);

        // (bs, ts, pooled) -> (bs, ts, n*hidden)
        let h = self.rnn.forward(h, lengths);
        let h = sigmoid(h);
        let h = self.dropout_rnn.forward(h);

        // self-attention re-weighting, pads masked out of the keys
        let (h, _weights) = self.attn.forward(h.clone(), h.clone(), h, Some(mask));

        // (bs, ts, features) -> (bs, ts, nb_classes), log-simplex
        let h = self.linear_out.forward(h);
        let h = log_softmax(h, 2);

        // strip the <bos> and <eos> sentinel positions
        let nb_classes = h.dims()[2];
        h.slice([0..bs, 1..ts - 1, 0..nb_classes])
    }

    /// Masked negative log-likelihood against per-token tags.
    ///
    /// `tags` is [bs, ts - 2], aligned with the forward output;
    /// positions past a sequence's true inner length are excluded
    /// by the word mask (their padded tag value is never scored).
    pub fn forward_loss(
        &self,
        words: Tensor<B, 2, Int>,
        tags: Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let [bs, ts] = words.dims();
        let log_probs = self.forward(words.clone());

        // valid inner positions: not pad, and not the <eos> that a
        // shorter-than-batch sequence carries inside the slice
        let inner = words.slice([0..bs, 1..ts - 1]);
        let valid = inner.clone().not_equal_elem(PAD_ID as i32).float()
            * inner.not_equal_elem(EOS_ID as i32).float();

        let picked = log_probs
            .gather(2, tags.unsqueeze_dim::<3>(2))
            .squeeze::<2>(2);

        (picked * valid.clone()).sum().div(valid.sum()).neg()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocab::{WordVectors, BOS_ID};

    type TB = burn::backend::NdArray;
    type AB = burn::backend::Autodiff<burn::backend::NdArray>;

    fn small_vocab() -> (WordsField, TagsField) {
        let docs: Vec<Vec<String>> = vec![vec!["one", "two", "three"]
            .into_iter()
            .map(String::from)
            .collect()];
        let words = WordsField::build(docs.iter().map(|d| d.as_slice()), 1);
        (words, TagsField::new())
    }

    fn small_options() -> ModelOptions {
        ModelOptions {
            word_embeddings_size: 8,
            emb_dropout: 0.0,
            freeze_embeddings: false,
            conv_size: 6,
            kernel_size: 3,
            pool_length: 2, // pooled width: 6/2 + 2/2 = 4
            cnn_dropout: 0.0,
            rnn_type: "gru".to_string(),
            hidden_size: 5,
            bidirectional: false,
            sum_bidir: false,
            rnn_dropout: 0.0,
            attn_scorer: "dot_product".to_string(),
            attn_type: "regular".to_string(),
            attn_hidden_size: 4,
            attn_multihead_hidden_size: 8,
            attn_nb_heads: 2,
            attn_dropout: 0.0,
        }
    }

    /// [bs=2, ts=7]: first row full (length 7), second row true
    /// length 5 with two trailing pads. Sentinels included.
    fn words_batch(device: &<TB as Backend>::Device) -> Tensor<TB, 2, Int> {
        let b = BOS_ID as i32;
        let e = EOS_ID as i32;
        let p = PAD_ID as i32;
        Tensor::<TB, 1, Int>::from_ints(
            [b, 4, 5, 6, 4, 5, e, b, 4, 5, 6, e, p, p].as_slice(),
            device,
        )
        .reshape([2, 7])
    }

    #[test]
    fn test_unknown_scorer_fails_construction() {
        let device = Default::default();
        let (words, tags) = small_vocab();
        let mut options = small_options();
        options.attn_scorer = "banana".to_string();
        let err = RcnnAttention::<TB>::new(&words, &tags, &mut options, &device).unwrap_err();
        assert!(err.to_string().contains("banana"));
    }

    #[test]
    fn test_unknown_attention_type_fails_construction() {
        let device = Default::default();
        let (words, tags) = small_vocab();
        let mut options = small_options();
        options.attn_type = "hydra".to_string();
        let err = RcnnAttention::<TB>::new(&words, &tags, &mut options, &device).unwrap_err();
        assert!(err.to_string().contains("hydra"));
    }

    #[test]
    fn test_output_shape_strips_sentinels() {
        let device = Default::default();
        let (words, tags) = small_vocab();
        let mut options = small_options();
        let model = RcnnAttention::<TB>::new(&words, &tags, &mut options, &device).unwrap();
        let out = model.forward(words_batch(&device));
        assert_eq!(out.dims(), [2, 5, 2]);
    }

    #[test]
    fn test_rows_are_log_probabilities() {
        let device = Default::default();
        let (words, tags) = small_vocab();
        let mut options = small_options();
        let model = RcnnAttention::<TB>::new(&words, &tags, &mut options, &device).unwrap();
        let out = model.forward(words_batch(&device));
        let sums: Vec<f32> = out.exp().sum_dim(2).into_data().to_vec().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5, "row sums to {s}");
        }
    }

    #[test]
    fn test_multihead_variant_runs_end_to_end() {
        let device = Default::default();
        let (words, tags) = small_vocab();
        let mut options = small_options();
        options.attn_type = "multihead".to_string();
        options.attn_scorer = "general".to_string();
        let model = RcnnAttention::<TB>::new(&words, &tags, &mut options, &device).unwrap();
        assert_eq!(model.forward(words_batch(&device)).dims(), [2, 5, 2]);
    }

    #[test]
    fn test_short_batch_matches_two_by_three_by_two() {
        // lengths [5, 3] with sentinels, 2 classes → [2, 3, 2]
        let device = Default::default();
        let (words, tags) = small_vocab();
        let mut options = small_options();
        let model = RcnnAttention::<TB>::new(&words, &tags, &mut options, &device).unwrap();

        let b = BOS_ID as i32;
        let e = EOS_ID as i32;
        let p = PAD_ID as i32;
        let words_t = Tensor::<TB, 1, Int>::from_ints(
            [b, 4, 5, 6, e, b, 4, e, p, p].as_slice(),
            &device,
        )
        .reshape([2, 5]);

        assert_eq!(model.forward(words_t).dims(), [2, 3, 2]);
    }

    #[test]
    fn test_output_invariant_to_trailing_padding() {
        // the same sequence must produce the same rows whether the
        // batch pads it or not (all dropouts are 0 in small_options)
        let device = Default::default();
        let (words, tags) = small_vocab();
        let mut options = small_options();
        let model = RcnnAttention::<TB>::new(&words, &tags, &mut options, &device).unwrap();

        let b = BOS_ID as i32;
        let e = EOS_ID as i32;
        let p = PAD_ID as i32;
        let tight = Tensor::<TB, 1, Int>::from_ints([b, 4, 5, 6, e].as_slice(), &device)
            .reshape([1, 5]);
        let padded = Tensor::<TB, 1, Int>::from_ints(
            [b, 4, 5, 6, e, p, p, p].as_slice(),
            &device,
        )
        .reshape([1, 8]);

        let out_tight = model.forward(tight);
        let out_padded = model.forward(padded).slice([0..1, 0..3]);
        assert!(out_tight.all_close(out_padded, Some(1e-5), Some(1e-5)));
    }

    #[test]
    fn test_pretrained_vectors_override_embedding_size() {
        let device = Default::default();
        let (mut words, tags) = small_vocab();
        let dim = 4;
        let rows: Vec<Vec<f32>> = (0..words.len())
            .map(|i| (0..dim).map(|j| (i * dim + j) as f32).collect())
            .collect();
        words.set_vectors(WordVectors { dim, rows: rows.clone() });

        let mut options = small_options();
        options.word_embeddings_size = 100; // must be overwritten
        let model = RcnnAttention::<TB>::new(&words, &tags, &mut options, &device).unwrap();

        assert_eq!(options.word_embeddings_size, dim);
        let weight: Vec<f32> = model.word_emb.weight.val().into_data().to_vec().unwrap();
        let expected: Vec<f32> = rows.into_iter().flatten().collect();
        assert_eq!(weight, expected);
    }

    #[test]
    fn test_frozen_embeddings_survive_an_optimizer_step() {
        use burn::optim::{GradientsParams, Optimizer, SgdConfig};

        let device = Default::default();
        let (words, tags) = small_vocab();
        let mut options = small_options();
        options.freeze_embeddings = true;
        let model = RcnnAttention::<AB>::new(&words, &tags, &mut options, &device).unwrap();

        let emb_before: Vec<f32> = model.word_emb.weight.val().into_data().to_vec().unwrap();
        let head_before: Vec<f32> =
            model.linear_out.weight.val().into_data().to_vec().unwrap();

        let b = BOS_ID as i32;
        let e = EOS_ID as i32;
        let words_t =
            Tensor::<AB, 1, Int>::from_ints([b, 4, 5, 6, e].as_slice(), &device).reshape([1, 5]);
        let tags_t =
            Tensor::<AB, 1, Int>::from_ints([0, 0, 1].as_slice(), &device).reshape([1, 3]);

        let loss = model.forward_loss(words_t, tags_t);
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        let mut optim = SgdConfig::new().init();
        let model = optim.step(0.5, model, grads);

        let emb_after: Vec<f32> = model.word_emb.weight.val().into_data().to_vec().unwrap();
        let head_after: Vec<f32> =
            model.linear_out.weight.val().into_data().to_vec().unwrap();

        assert_eq!(emb_before, emb_after, "frozen embeddings moved");
        assert_ne!(head_before, head_after, "output projection never updated");
    }
}
