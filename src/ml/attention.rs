// ============================================================
// Layer 5 — Self-Attention
// ============================================================
// Re-weights the recurrent encoder's output by attending every
// position to every other position of the same sequence
// (query = key = value). The padding mask removes pad positions
// from the key axis so they never receive attention weight.
//
// Two variants:
//   regular   — one score matrix per sequence, masked softmax,
//               dropout on the weights
//   multihead — the same scorer run independently across nb_heads
//               parallel projections; each head keeps the full
//               feature width (so learned scorers fit every head),
//               heads are folded into the batch axis, recombined
//               and projected down to the configured hidden size
//
// Reference: Bahdanau et al. (2015), Vaswani et al. (2017)

use burn::{
    module::Module,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    tensor::{activation::softmax, backend::Backend, Bool, Tensor},
};

use crate::ml::scorer::Scorer;

// ─── Attention ────────────────────────────────────────────────────────────────
/// Single-head attention over a pluggable scorer.
#[derive(Module, Debug)]
pub struct Attention<B: Backend> {
    scorer: Scorer<B>,
    dropout: Dropout,
}

impl<B: Backend> Attention<B> {
    pub fn new(scorer: Scorer<B>, dropout: f64) -> Self {
        Self {
            scorer,
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    /// query [n, tq, d], key/value [n, tk, d], mask [n, tk]
    /// → (context [n, tq, d], weights [n, tq, tk])
    ///
    /// Masked key positions get a -inf score, i.e. exactly zero
    /// weight after the softmax. Query rows are not masked here;
    /// padded query positions produce garbage that downstream
    /// consumers ignore via the same mask.
    pub fn forward(
        &self,
        query: Tensor<B, 3>,
        key: Tensor<B, 3>,
        value: Tensor<B, 3>,
        mask: Option<Tensor<B, 2, Bool>>,
    ) -> (Tensor<B, 3>, Tensor<B, 3>) {
        let scores = self.scorer.forward(query, key);

        let scores = match mask {
            Some(mask) => {
                let [n, tq, tk] = scores.dims();
                let mask = mask.unsqueeze_dim::<3>(1).expand([n, tq, tk]);
                scores.mask_fill(mask.bool_not(), f32::NEG_INFINITY)
            }
            None => scores,
        };

        let weights = self.dropout.forward(softmax(scores, 2));
        let context = weights.clone().matmul(value);
        (context, weights)
    }
}

// ─── MultiHeadedAttention ─────────────────────────────────────────────────────
/// Runs the wrapped scorer over `nb_heads` parallel projections of
/// query/key/value and projects the concatenated head outputs to
/// `hidden_size`.
///
/// Every head keeps the original feature width: the projections go
/// to `nb_heads * size`, are folded into the batch axis
/// ([bs, t, heads * size] → [bs * heads, t, size]) and handed to
/// the inner [`Attention`], which therefore stays head-agnostic —
/// a scorer built for `query_size` works unchanged inside each
/// head.
#[derive(Module, Debug)]
pub struct MultiHeadedAttention<B: Backend> {
    attn: Attention<B>,
    query_proj: Linear<B>,
    key_proj: Linear<B>,
    value_proj: Linear<B>,
    out_proj: Linear<B>,
    nb_heads: usize,
    query_size: usize,
    key_size: usize,
    value_size: usize,
}

impl<B: Backend> MultiHeadedAttention<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scorer: Scorer<B>,
        nb_heads: usize,
        query_size: usize,
        key_size: usize,
        value_size: usize,
        hidden_size: usize,
        dropout: f64,
        device: &B::Device,
    ) -> Self {
        Self {
            attn: Attention::new(scorer, dropout),
            query_proj: LinearConfig::new(query_size, nb_heads * query_size).init(device),
            key_proj: LinearConfig::new(key_size, nb_heads * key_size).init(device),
            value_proj: LinearConfig::new(value_size, nb_heads * value_size).init(device),
            out_proj: LinearConfig::new(nb_heads * value_size, hidden_size).init(device),
            nb_heads,
            query_size,
            key_size,
            value_size,
        }
    }

    /// → (context [bs, tq, hidden_size], weights [bs, tq, tk]
    /// averaged over heads)
    pub fn forward(
        &self,
        query: Tensor<B, 3>,
        key: Tensor<B, 3>,
        value: Tensor<B, 3>,
        mask: Option<Tensor<B, 2, Bool>>,
    ) -> (Tensor<B, 3>, Tensor<B, 3>) {
        let [bs, tq, _] = query.dims();
        let tk = key.dims()[1];

        let query = fold_heads(self.query_proj.forward(query), self.nb_heads, self.query_size);
        let key = fold_heads(self.key_proj.forward(key), self.nb_heads, self.key_size);
        let value = fold_heads(self.value_proj.forward(value), self.nb_heads, self.value_size);

        // replicate the mask per head along the folded batch axis
        let mask = mask.map(|m| {
            m.unsqueeze_dim::<3>(1)
                .expand([bs, self.nb_heads, tk])
                .reshape([bs * self.nb_heads, tk])
        });

        let (context, weights) = self.attn.forward(query, key, value, mask);

        // [bs * heads, tq, size] → [bs, tq, heads * size] → hidden
        let context = context
            .reshape([bs, self.nb_heads, tq, self.value_size])
            .swap_dims(1, 2)
            .reshape([bs, tq, self.nb_heads * self.value_size]);
        let context = self.out_proj.forward(context);

        let weights = weights
            .reshape([bs, self.nb_heads, tq, tk])
            .mean_dim(1)
            .squeeze::<3>(1);

        (context, weights)
    }
}

/// [bs, t, heads * size] → [bs * heads, t, size]
fn fold_heads<B: Backend>(x: Tensor<B, 3>, nb_heads: usize, size: usize) -> Tensor<B, 3> {
    let [bs, t, _] = x.dims();
    x.reshape([bs, t, nb_heads, size])
        .swap_dims(1, 2)
        .reshape([bs * nb_heads, t, size])
}

// ─── AttentionLayer ───────────────────────────────────────────────────────────
/// The attention variant selected by `attn_type` at construction.
#[derive(Module, Debug)]
pub enum AttentionLayer<B: Backend> {
    Regular(Attention<B>),
    MultiHead(MultiHeadedAttention<B>),
}

impl<B: Backend> AttentionLayer<B> {
    pub fn forward(
        &self,
        query: Tensor<B, 3>,
        key: Tensor<B, 3>,
        value: Tensor<B, 3>,
        mask: Option<Tensor<B, 2, Bool>>,
    ) -> (Tensor<B, 3>, Tensor<B, 3>) {
        match self {
            Self::Regular(attn) => attn.forward(query, key, value, mask),
            Self::MultiHead(attn) => attn.forward(query, key, value, mask),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TB = burn::backend::NdArray;

    fn scorer(device: &<TB as Backend>::Device) -> Scorer<TB> {
        Scorer::from_name("dot_product", 8, 8, 4, device).unwrap()
    }

    #[test]
    fn test_masked_keys_get_zero_weight() {
        let device = Default::default();
        let attn = Attention::new(scorer(&device), 0.0);

        let x = Tensor::<TB, 3>::random(
            [2, 4, 8],
            burn::tensor::Distribution::Default,
            &device,
        );
        // second sequence has two trailing pad positions
        let mask = Tensor::<TB, 2, Bool>::from_data(
            [[true, true, true, true], [true, true, false, false]],
            &device,
        );

        let (context, weights) = attn.forward(x.clone(), x.clone(), x, Some(mask));
        assert_eq!(context.dims(), [2, 4, 8]);

        let w: Vec<f32> = weights.into_data().to_vec().unwrap();
        // weights layout: [batch, tq, tk]; batch 1, keys 2 and 3
        // must carry zero weight for every query row
        for tq in 0..4 {
            for tk in 2..4 {
                let idx = 16 + tq * 4 + tk;
                assert!(w[idx].abs() < 1e-6, "weight[{tq},{tk}] = {}", w[idx]);
            }
        }
    }

    #[test]
    fn test_attention_rows_sum_to_one() {
        let device = Default::default();
        let attn = Attention::new(scorer(&device), 0.0);
        let x = Tensor::<TB, 3>::random(
            [1, 5, 8],
            burn::tensor::Distribution::Default,
            &device,
        );
        let (_, weights) = attn.forward(x.clone(), x.clone(), x, None);
        let sums: Vec<f32> = weights.sum_dim(2).into_data().to_vec().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_multihead_output_width() {
        let device = Default::default();
        let mha = MultiHeadedAttention::new(scorer(&device), 4, 8, 8, 8, 16, 0.0, &device);
        let x = Tensor::<TB, 3>::random(
            [3, 6, 8],
            burn::tensor::Distribution::Default,
            &device,
        );
        let (context, weights) = mha.forward(x.clone(), x.clone(), x, None);
        assert_eq!(context.dims(), [3, 6, 16]);
        assert_eq!(weights.dims(), [3, 6, 6]);
    }

    #[test]
    fn test_multihead_respects_mask() {
        let device = Default::default();
        let mha = MultiHeadedAttention::new(scorer(&device), 2, 8, 8, 8, 8, 0.0, &device);
        let x = Tensor::<TB, 3>::random(
            [1, 3, 8],
            burn::tensor::Distribution::Default,
            &device,
        );
        let mask =
            Tensor::<TB, 2, Bool>::from_data([[true, true, false]], &device);
        let (_, weights) = mha.forward(x.clone(), x.clone(), x, Some(mask));
        let w: Vec<f32> = weights.into_data().to_vec().unwrap();
        for tq in 0..3 {
            assert!(w[tq * 3 + 2].abs() < 1e-6);
        }
    }
}
