// ============================================================
// Layer 5 — Attention Scorers
// ============================================================
// A scorer computes the compatibility between every query and
// every key vector, producing the raw attention score matrix.
// The attention layer (ml/attention.rs) turns those scores into
// weights with a masked softmax.
//
// All scorers share one calling convention:
//
//   query [n, tq, d], key [n, tk, d]  →  scores [n, tq, tk]
//
// where n is the batch axis (batch_size for regular attention,
// batch_size * nb_heads for multi-head — heads are folded into
// the batch axis so every scorer works unchanged under both).
//
// Available scorers:
//   dot_product — q · kᵀ, scaled by √d          (Luong 2015)
//   general     — q W kᵀ, learned bilinear form (Luong 2015)
//   add         — vᵀ tanh(Wq q + Wk k)          (Bahdanau 2015)
//   concat      — vᵀ tanh(W [q ; k])
//   mlp         — two-layer MLP over [q ; k]
//
// The closed enum replaces name-string dispatch: an unknown name
// is rejected once, at construction (see Scorer::from_name).

use std::marker::PhantomData;

use burn::{
    module::{Ignored, Module},
    nn::{Linear, LinearConfig},
    tensor::{activation::tanh, backend::Backend, Tensor},
};

use crate::ml::error::ModelError;

// ─── Scorer ───────────────────────────────────────────────────────────────────
/// Closed set of attention compatibility functions. Each variant
/// carries only the parameters it needs.
#[derive(Module, Debug)]
pub enum Scorer<B: Backend> {
    DotProduct(DotProductScorer<B>),
    General(GeneralScorer<B>),
    Operation(OperationScorer<B>),
    Mlp(MlpScorer<B>),
}

impl<B: Backend> Scorer<B> {
    /// Build a scorer from its configured name. Fails with a
    /// descriptive error on anything it does not recognise, so a
    /// typo never survives to the first forward pass.
    pub fn from_name(
        name: &str,
        query_size: usize,
        key_size: usize,
        attn_hidden_size: usize,
        device: &B::Device,
    ) -> Result<Self, ModelError> {
        match name {
            "dot_product" => Ok(Self::DotProduct(DotProductScorer::new(true))),
            "general" => Ok(Self::General(GeneralScorer::new(query_size, key_size, device))),
            "add" => Ok(Self::Operation(OperationScorer::new(
                query_size,
                key_size,
                attn_hidden_size,
                CombineOp::Add,
                device,
            ))),
            "concat" => Ok(Self::Operation(OperationScorer::new(
                query_size,
                key_size,
                attn_hidden_size,
                CombineOp::Concat,
                device,
            ))),
            "mlp" => Ok(Self::Mlp(MlpScorer::new(query_size, key_size, device))),
            other => Err(ModelError::UnknownScorer(other.to_string())),
        }
    }

    /// query [n, tq, d], key [n, tk, d] → scores [n, tq, tk]
    pub fn forward(&self, query: Tensor<B, 3>, key: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            Self::DotProduct(s) => s.forward(query, key),
            Self::General(s) => s.forward(query, key),
            Self::Operation(s) => s.forward(query, key),
            Self::Mlp(s) => s.forward(query, key),
        }
    }
}

// ─── DotProductScorer ─────────────────────────────────────────────────────────
/// score = q · kᵀ / √d — no learned parameters.
/// The √d scaling keeps score variance independent of the
/// feature width so the softmax does not saturate.
#[derive(Module, Debug)]
pub struct DotProductScorer<B: Backend> {
    scaled: bool,
    marker: PhantomData<B>,
}

impl<B: Backend> DotProductScorer<B> {
    pub fn new(scaled: bool) -> Self {
        Self { scaled, marker: PhantomData }
    }

    pub fn forward(&self, query: Tensor<B, 3>, key: Tensor<B, 3>) -> Tensor<B, 3> {
        let d = query.dims()[2];
        let scores = query.matmul(key.transpose());
        if self.scaled {
            scores.div_scalar((d as f64).sqrt())
        } else {
            scores
        }
    }
}

// ─── GeneralScorer ────────────────────────────────────────────────────────────
/// score = (q W) · kᵀ — a learned bilinear form, no bias.
#[derive(Module, Debug)]
pub struct GeneralScorer<B: Backend> {
    proj: Linear<B>,
}

impl<B: Backend> GeneralScorer<B> {
    pub fn new(query_size: usize, key_size: usize, device: &B::Device) -> Self {
        Self {
            proj: LinearConfig::new(query_size, key_size)
                .with_bias(false)
                .init(device),
        }
    }

    pub fn forward(&self, query: Tensor<B, 3>, key: Tensor<B, 3>) -> Tensor<B, 3> {
        self.proj.forward(query).matmul(key.transpose())
    }
}

// ─── OperationScorer ──────────────────────────────────────────────────────────
/// How the projected query and key are merged before the scoring
/// layer: elementwise sum ("add") or concatenation ("concat").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    Add,
    Concat,
}

/// score = vᵀ tanh(merge(Wq q, Wk k))
///
/// Builds an [n, tq, tk, hidden] intermediate by broadcasting the
/// projected queries against the projected keys, so memory grows
/// with tq * tk.
#[derive(Module, Debug)]
pub struct OperationScorer<B: Backend> {
    query_proj: Linear<B>,
    key_proj: Linear<B>,
    score_proj: Linear<B>,
    op: Ignored<CombineOp>,
}

impl<B: Backend> OperationScorer<B> {
    pub fn new(
        query_size: usize,
        key_size: usize,
        hidden_size: usize,
        op: CombineOp,
        device: &B::Device,
    ) -> Self {
        let merged_size = match op {
            CombineOp::Add => hidden_size,
            CombineOp::Concat => 2 * hidden_size,
        };
        Self {
            query_proj: LinearConfig::new(query_size, hidden_size).init(device),
            key_proj: LinearConfig::new(key_size, hidden_size).init(device),
            score_proj: LinearConfig::new(merged_size, 1)
                .with_bias(false)
                .init(device),
            op: Ignored(op),
        }
    }

    pub fn forward(&self, query: Tensor<B, 3>, key: Tensor<B, 3>) -> Tensor<B, 3> {
        let [n, tq, _] = query.dims();
        let [_, tk, _] = key.dims();

        // [n, tq, 1, h] and [n, 1, tk, h]
        let qp = self.query_proj.forward(query).unsqueeze_dim::<4>(2);
        let kp = self.key_proj.forward(key).unsqueeze_dim::<4>(1);
        let h = qp.dims()[3];

        let merged = match self.op.0 {
            // broadcast sum → [n, tq, tk, h]
            CombineOp::Add => qp + kp,
            // expand both then concatenate → [n, tq, tk, 2h]
            CombineOp::Concat => {
                let qp = qp.expand([n, tq, tk, h]);
                let kp = kp.expand([n, tq, tk, h]);
                Tensor::cat(vec![qp, kp], 3)
            }
        };

        self.score_proj.forward(tanh(merged)).squeeze::<3>(3)
    }
}

// ─── MlpScorer ────────────────────────────────────────────────────────────────
/// Two-layer MLP over the concatenated raw query and key:
/// score = W2 tanh(W1 [q ; k]).
#[derive(Module, Debug)]
pub struct MlpScorer<B: Backend> {
    hidden: Linear<B>,
    out: Linear<B>,
}

impl<B: Backend> MlpScorer<B> {
    pub fn new(query_size: usize, key_size: usize, device: &B::Device) -> Self {
        let in_size = query_size + key_size;
        Self {
            hidden: LinearConfig::new(in_size, in_size / 2).init(device),
            out: LinearConfig::new(in_size / 2, 1).with_bias(false).init(device),
        }
    }

    pub fn forward(&self, query: Tensor<B, 3>, key: Tensor<B, 3>) -> Tensor<B, 3> {
        let [n, tq, dq] = query.dims();
        let [_, tk, dk] = key.dims();

        let q4 = query.unsqueeze_dim::<4>(2).expand([n, tq, tk, dq]);
        let k4 = key.unsqueeze_dim::<4>(1).expand([n, tq, tk, dk]);
        let merged = Tensor::cat(vec![q4, k4], 3);

        self.out.forward(tanh(self.hidden.forward(merged))).squeeze::<3>(3)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TB = burn::backend::NdArray;

    fn q_and_k(n: usize, tq: usize, tk: usize, d: usize) -> (Tensor<TB, 3>, Tensor<TB, 3>) {
        let device = Default::default();
        let q = Tensor::ones([n, tq, d], &device);
        let k = Tensor::ones([n, tk, d], &device).mul_scalar(0.5);
        (q, k)
    }

    #[test]
    fn test_every_scorer_produces_score_matrix() {
        let device = Default::default();
        for name in ["dot_product", "general", "add", "concat", "mlp"] {
            let scorer = Scorer::<TB>::from_name(name, 8, 8, 4, &device).unwrap();
            let (q, k) = q_and_k(2, 5, 5, 8);
            let scores = scorer.forward(q, k);
            assert_eq!(scores.dims(), [2, 5, 5], "scorer `{name}`");
        }
    }

    #[test]
    fn test_unknown_scorer_is_rejected() {
        let device = Default::default();
        let err = Scorer::<TB>::from_name("cosine", 8, 8, 4, &device).unwrap_err();
        assert!(err.to_string().contains("cosine"));
    }

    #[test]
    fn test_scaled_dot_product_value() {
        // all-ones query against all-0.5 keys of width 16:
        // raw score = 16 * 0.5 = 8, scaled = 8 / 4 = 2
        let (q, k) = q_and_k(1, 2, 3, 16);
        let scorer = DotProductScorer::<TB>::new(true);
        let scores = scorer.forward(q, k);
        let values: Vec<f32> = scores.into_data().to_vec().unwrap();
        for v in values {
            assert!((v - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rectangular_query_key() {
        // tq != tk must work: multi-head folding relies on it
        let device = Default::default();
        let scorer = Scorer::<TB>::from_name("add", 6, 6, 4, &device).unwrap();
        let (q, k) = q_and_k(3, 4, 7, 6);
        assert_eq!(scorer.forward(q, k).dims(), [3, 4, 7]);
    }
}
