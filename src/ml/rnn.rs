// ============================================================
// Layer 5 — Recurrent Encoder
// ============================================================
// Contextualises the CNN features with a recurrent network.
// The cell is chosen once at construction from `rnn_type`:
//
//   "gru"  → burn's Gru
//   "lstm" → burn's Lstm
//   other  → vanilla Elman cell (hand-rolled below — burn ships
//            no plain RNN)
//
// Variable-length batches need no pre-sorting: the forward
// direction simply runs over the padded tensor (padding garbage
// is masked downstream), and the backward direction of a
// bidirectional encoder reverses each sequence WITHIN ITS TRUE
// LENGTH ONLY via `reverse_padded`, so one sequence's padding can
// never bleed into another's computation.
//
// Bidirectional output is the concatenation of both directions
// (2 * hidden) unless `sum_bidir`, which sums them elementwise
// back to `hidden`.

use burn::{
    module::Module,
    nn::{
        gru::{Gru, GruConfig},
        Initializer, Linear, LinearConfig, Lstm, LstmConfig,
    },
    tensor::{activation::tanh, backend::Backend, Int, Tensor},
};

fn xavier() -> Initializer {
    Initializer::XavierUniform { gain: 1.0 }
}

// ─── RnnCell ──────────────────────────────────────────────────────────────────
/// One recurrent direction. All variants map
/// [bs, ts, d_input] → [bs, ts, d_hidden] with a zero initial
/// state (state is never carried across forward calls).
#[derive(Module, Debug)]
pub enum RnnCell<B: Backend> {
    Vanilla(VanillaRnn<B>),
    Gru(Gru<B>),
    Lstm(Lstm<B>),
}

impl<B: Backend> RnnCell<B> {
    fn build(rnn_type: &str, d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        match rnn_type {
            "gru" => Self::Gru(
                GruConfig::new(d_input, d_hidden, true)
                    .with_initializer(xavier())
                    .init(device),
            ),
            "lstm" => Self::Lstm(
                LstmConfig::new(d_input, d_hidden, true)
                    .with_initializer(xavier())
                    .init(device),
            ),
            // anything else falls back to the vanilla cell
            _ => Self::Vanilla(VanillaRnn::new(d_input, d_hidden, device)),
        }
    }

    fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            Self::Vanilla(rnn) => rnn.forward(input),
            Self::Gru(gru) => gru.forward(input, None),
            Self::Lstm(lstm) => {
                let (output, _state) = lstm.forward(input, None);
                output
            }
        }
    }
}

// ─── VanillaRnn ───────────────────────────────────────────────────────────────
/// Elman cell: h_t = tanh(W_ih x_t + b + W_hh h_{t-1}).
/// Unrolled step by step over the time axis.
#[derive(Module, Debug)]
pub struct VanillaRnn<B: Backend> {
    input_proj: Linear<B>,
    hidden_proj: Linear<B>,
    d_hidden: usize,
}

impl<B: Backend> VanillaRnn<B> {
    pub fn new(d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        Self {
            input_proj: LinearConfig::new(d_input, d_hidden)
                .with_initializer(xavier())
                .init(device),
            hidden_proj: LinearConfig::new(d_hidden, d_hidden)
                .with_bias(false)
                .with_initializer(xavier())
                .init(device),
            d_hidden,
        }
    }

    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let [bs, ts, _] = input.dims();
        let device = input.device();

        let mut hidden = Tensor::<B, 2>::zeros([bs, self.d_hidden], &device);
        let mut outputs = Vec::with_capacity(ts);

        for t in 0..ts {
            let x_t = input.clone().slice([0..bs, t..t + 1]).squeeze::<2>(1);
            hidden = tanh(self.input_proj.forward(x_t) + self.hidden_proj.forward(hidden));
            outputs.push(hidden.clone().unsqueeze_dim::<3>(1));
        }

        Tensor::cat(outputs, 1)
    }
}

// ─── RecurrentEncoder ─────────────────────────────────────────────────────────
/// Uni- or bidirectional recurrent stage over padded sequences.
#[derive(Module, Debug)]
pub struct RecurrentEncoder<B: Backend> {
    forward_cell: RnnCell<B>,
    backward_cell: Option<RnnCell<B>>,
    sum_bidir: bool,
    hidden_size: usize,
}

impl<B: Backend> RecurrentEncoder<B> {
    pub fn new(
        rnn_type: &str,
        d_input: usize,
        hidden_size: usize,
        bidirectional: bool,
        sum_bidir: bool,
        device: &B::Device,
    ) -> Self {
        let forward_cell = RnnCell::build(rnn_type, d_input, hidden_size, device);
        let backward_cell =
            bidirectional.then(|| RnnCell::build(rnn_type, d_input, hidden_size, device));
        Self { forward_cell, backward_cell, sum_bidir, hidden_size }
    }

    /// Feature width handed to the attention stage.
    pub fn output_size(&self) -> usize {
        if self.backward_cell.is_some() && !self.sum_bidir {
            2 * self.hidden_size
        } else {
            self.hidden_size
        }
    }

    /// input [bs, ts, d_input], lengths [bs, 1] (true lengths,
    /// sentinels included) → [bs, ts, output_size]
    pub fn forward(&self, input: Tensor<B, 3>, lengths: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let fwd = self.forward_cell.forward(input.clone());

        match &self.backward_cell {
            None => fwd,
            Some(cell) => {
                let reversed = reverse_padded(input, lengths.clone());
                let bwd = reverse_padded(cell.forward(reversed), lengths);
                if self.sum_bidir {
                    fwd + bwd
                } else {
                    Tensor::cat(vec![fwd, bwd], 2)
                }
            }
        }
    }
}

// ─── reverse_padded ───────────────────────────────────────────────────────────
/// Reverse each sequence of a left-aligned padded batch within its
/// true length, leaving trailing pad positions where they are:
///
///   [a b c PAD], len 3  →  [c b a PAD]
///
/// Built as a gather with the per-sequence index
/// `t < len ? len-1-t : t`, so batches need not be sorted by
/// length and no sequence ever reads another's positions.
pub fn reverse_padded<B: Backend>(x: Tensor<B, 3>, lengths: Tensor<B, 2, Int>) -> Tensor<B, 3> {
    let [bs, ts, d] = x.dims();
    let device = x.device();

    let positions = Tensor::<B, 1, Int>::arange(0..ts as i64, &device)
        .unsqueeze::<2>()
        .expand([bs, ts]);
    let reversed = lengths.clone().sub_scalar(1).expand([bs, ts]) - positions.clone();
    let in_range = positions.clone().lower(lengths.expand([bs, ts]));

    let index = positions.mask_where(in_range, reversed);
    x.gather(1, index.unsqueeze_dim::<3>(2).expand([bs, ts, d]))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TB = burn::backend::NdArray;

    fn lengths(values: &[i32]) -> Tensor<TB, 2, Int> {
        let device = Default::default();
        let n = values.len();
        Tensor::<TB, 1, Int>::from_ints(values, &device).reshape([n, 1])
    }

    #[test]
    fn test_reverse_padded_respects_lengths() {
        let device = Default::default();
        // two sequences of scalar features, lengths 3 and 2, ts 4
        let x = Tensor::<TB, 3>::from_data(
            [
                [[1.0], [2.0], [3.0], [0.0]],
                [[7.0], [8.0], [0.0], [0.0]],
            ],
            &device,
        );
        let out: Vec<f32> = reverse_padded(x, lengths(&[3, 2]))
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(out, vec![3.0, 2.0, 1.0, 0.0, 8.0, 7.0, 0.0, 0.0]);
    }

    #[test]
    fn test_reverse_padded_is_involutive() {
        let device = Default::default();
        let x = Tensor::<TB, 3>::random(
            [3, 6, 4],
            burn::tensor::Distribution::Default,
            &device,
        );
        let lens = lengths(&[6, 4, 2]);
        let twice = reverse_padded(reverse_padded(x.clone(), lens.clone()), lens);
        assert!(x.all_close(twice, Some(1e-6), Some(1e-6)));
    }

    #[test]
    fn test_unidirectional_width_is_hidden_size() {
        let device = Default::default();
        for rnn_type in ["rnn", "gru", "lstm"] {
            let enc = RecurrentEncoder::<TB>::new(rnn_type, 5, 7, false, false, &device);
            assert_eq!(enc.output_size(), 7);
            let x = Tensor::random([2, 4, 5], burn::tensor::Distribution::Default, &device);
            let out = enc.forward(x, lengths(&[4, 3]));
            assert_eq!(out.dims(), [2, 4, 7], "cell `{rnn_type}`");
        }
    }

    #[test]
    fn test_bidirectional_concat_doubles_width() {
        let device = Default::default();
        let enc = RecurrentEncoder::<TB>::new("gru", 5, 7, true, false, &device);
        assert_eq!(enc.output_size(), 14);
        let x = Tensor::random([2, 4, 5], burn::tensor::Distribution::Default, &device);
        assert_eq!(enc.forward(x, lengths(&[4, 2])).dims(), [2, 4, 14]);
    }

    #[test]
    fn test_sum_bidir_keeps_hidden_width() {
        let device = Default::default();
        let enc = RecurrentEncoder::<TB>::new("lstm", 5, 7, true, true, &device);
        assert_eq!(enc.output_size(), 7);
        let x = Tensor::random([2, 4, 5], burn::tensor::Distribution::Default, &device);
        assert_eq!(enc.forward(x, lengths(&[4, 2])).dims(), [2, 4, 7]);
    }

    #[test]
    fn test_padding_of_one_sequence_never_leaks_into_another() {
        // same first sequence, different second sequence: row 0 of
        // the output must be identical in both batches
        let device = Default::default();
        let enc = RecurrentEncoder::<TB>::new("gru", 3, 4, true, false, &device);

        let first = Tensor::<TB, 3>::random(
            [1, 5, 3],
            burn::tensor::Distribution::Default,
            &device,
        );
        let second_a = Tensor::<TB, 3>::random(
            [1, 5, 3],
            burn::tensor::Distribution::Default,
            &device,
        );
        let second_b = Tensor::<TB, 3>::random(
            [1, 5, 3],
            burn::tensor::Distribution::Default,
            &device,
        );

        let batch_a = Tensor::cat(vec![first.clone(), second_a], 0);
        let batch_b = Tensor::cat(vec![first, second_b], 0);
        let lens = lengths(&[5, 3]);

        let out_a = enc.forward(batch_a, lens.clone()).slice([0..1]);
        let out_b = enc.forward(batch_b, lens).slice([0..1]);
        assert!(out_a.all_close(out_b, Some(1e-6), Some(1e-6)));
    }
}
