// ============================================================
// Layer 5 — Model Hyperparameters
// ============================================================
// Every architectural knob of the RCNN + attention model in one
// flat struct. The struct fully determines tensor shapes at
// construction time and is never mutated afterwards, with one
// exception: `word_embeddings_size` is overwritten when pretrained
// vectors are supplied, because the table dimensionality must
// follow the vectors (see ml/model.rs).
//
// Serialisable so a training run can persist the exact
// architecture next to the checkpoint and rebuild it for
// inference.
//
// Reference: Treviso et al. (2017) Sentence Segmentation in
//            Narrative Transcripts from Neuropsychological Tests

use serde::{Deserialize, Serialize};

/// Architecture hyperparameters for [`RcnnAttention`](crate::ml::model::RcnnAttention).
///
/// The `rnn_type`, `attn_scorer` and `attn_type` fields carry the
/// user-facing names; they are parsed and validated once when the
/// model is built. Unknown scorer / attention names are
/// construction errors, an unknown `rnn_type` falls back to the
/// vanilla recurrent cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Dimensionality of the word embedding vectors.
    /// Overwritten by the pretrained vectors' width when present.
    pub word_embeddings_size: usize,

    /// Dropout applied right after the embedding lookup
    pub emb_dropout: f64,

    /// Exclude the embedding table from gradient updates
    pub freeze_embeddings: bool,

    /// Number of output channels of the 1-D convolution
    pub conv_size: usize,

    /// Convolution kernel width. Odd widths preserve the sequence
    /// length through the symmetric `kernel_size / 2` padding.
    pub kernel_size: usize,

    /// Max-pooling window over the convolution's feature axis
    pub pool_length: usize,

    /// Dropout applied after convolution + pooling
    pub cnn_dropout: f64,

    /// Recurrent cell: "gru", "lstm", or anything else for the
    /// vanilla (Elman) cell
    pub rnn_type: String,

    /// Hidden units per recurrent direction
    pub hidden_size: usize,

    /// Run the recurrent encoder in both directions
    pub bidirectional: bool,

    /// Sum the two directions elementwise instead of concatenating,
    /// keeping the output width at `hidden_size`
    pub sum_bidir: bool,

    /// Dropout applied to the recurrent output
    pub rnn_dropout: f64,

    /// Attention compatibility function:
    /// "dot_product", "general", "add", "concat" or "mlp"
    pub attn_scorer: String,

    /// Attention variant: "regular" or "multihead"
    pub attn_type: String,

    /// Hidden width of the add/concat scorer projections
    pub attn_hidden_size: usize,

    /// Output width of the multi-head combination; becomes the
    /// classification head's input width when `attn_type` is
    /// "multihead"
    pub attn_multihead_hidden_size: usize,

    /// Number of parallel heads for "multihead" attention
    pub attn_nb_heads: usize,

    /// Dropout on the attention weights
    pub attn_dropout: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            word_embeddings_size: 100,
            emb_dropout: 0.4,
            freeze_embeddings: false,
            conv_size: 100,
            kernel_size: 7,
            pool_length: 3,
            cnn_dropout: 0.2,
            rnn_type: "gru".to_string(),
            hidden_size: 100,
            bidirectional: true,
            sum_bidir: false,
            rnn_dropout: 0.2,
            attn_scorer: "dot_product".to_string(),
            attn_type: "regular".to_string(),
            attn_hidden_size: 64,
            attn_multihead_hidden_size: 128,
            attn_nb_heads: 4,
            attn_dropout: 0.1,
        }
    }
}

impl ModelOptions {
    /// Feature width handed from the CNN stage to the recurrent
    /// stage. This is a fixed construction-time contract tied to
    /// the pooling's kernel/stride/padding arithmetic; it is NOT
    /// recomputed from tensors at runtime, so a configuration for
    /// which the formula and the actual pooled width disagree
    /// surfaces as a shape error on the first forward pass.
    pub fn pooled_features_size(&self) -> usize {
        self.conv_size / self.pool_length + self.pool_length / 2
    }
}
