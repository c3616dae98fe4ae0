// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `detect`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::options::ModelOptions;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the boundary detection model on a .txt corpus
    Train(TrainArgs),

    /// Segment text into sentences using a trained checkpoint
    Detect(DetectArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory of .txt corpus files, one sentence per line
    #[arg(long, default_value = "data/corpus")]
    pub corpus_dir: String,

    /// Directory to save checkpoints, config and vocabulary
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Plain-text pretrained word vectors ("word v1 v2 ...").
    /// When given, the embedding width follows the file
    #[arg(long)]
    pub embeddings_file: Option<String>,

    /// Words rarer than this map to <unk>
    #[arg(long, default_value_t = 1)]
    pub min_freq: usize,

    /// Lowercase tokens before vocabulary lookup
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub lowercase: bool,

    /// Fraction of documents used for training (rest validates)
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Number of documents per forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    // ── Architecture ──────────────────────────────────────────────────────────
    /// Word embedding width (ignored when --embeddings-file is set)
    #[arg(long, default_value_t = 100)]
    pub word_embeddings_size: usize,

    /// Dropout after the embedding lookup
    #[arg(long, default_value_t = 0.4)]
    pub emb_dropout: f64,

    /// Exclude the embedding table from gradient updates
    #[arg(long, default_value_t = false)]
    pub freeze_embeddings: bool,

    /// Output channels of the 1-D convolution
    #[arg(long, default_value_t = 100)]
    pub conv_size: usize,

    /// Convolution kernel width (odd widths keep sequence length)
    #[arg(long, default_value_t = 7)]
    pub kernel_size: usize,

    /// Max-pooling window over the convolution features
    #[arg(long, default_value_t = 3)]
    pub pool_length: usize,

    /// Dropout after convolution + pooling
    #[arg(long, default_value_t = 0.2)]
    pub cnn_dropout: f64,

    /// Recurrent cell: gru, lstm, or rnn for the vanilla cell
    #[arg(long, default_value = "gru")]
    pub rnn_type: String,

    /// Hidden units per recurrent direction
    #[arg(long, default_value_t = 100)]
    pub hidden_size: usize,

    /// Run the recurrent encoder in both directions
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub bidirectional: bool,

    /// Sum the directions elementwise instead of concatenating
    #[arg(long, default_value_t = false)]
    pub sum_bidir: bool,

    /// Dropout on the recurrent output
    #[arg(long, default_value_t = 0.2)]
    pub rnn_dropout: f64,

    /// Attention scorer: dot_product, general, add, concat or mlp
    #[arg(long, default_value = "dot_product")]
    pub attn_scorer: String,

    /// Attention variant: regular or multihead
    #[arg(long, default_value = "regular")]
    pub attn_type: String,

    /// Hidden width of the add/concat scorer projections
    #[arg(long, default_value_t = 64)]
    pub attn_hidden_size: usize,

    /// Output width of the multi-head combination
    #[arg(long, default_value_t = 128)]
    pub attn_multihead_hidden_size: usize,

    /// Number of parallel heads for multihead attention
    #[arg(long, default_value_t = 4)]
    pub attn_nb_heads: usize,

    /// Dropout on the attention weights
    #[arg(long, default_value_t = 0.1)]
    pub attn_dropout: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_dir:      a.corpus_dir,
            checkpoint_dir:  a.checkpoint_dir,
            embeddings_file: a.embeddings_file,
            min_freq:        a.min_freq,
            lowercase:       a.lowercase,
            train_fraction:  a.train_fraction,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            lr:              a.lr,
            model: ModelOptions {
                word_embeddings_size:       a.word_embeddings_size,
                emb_dropout:                a.emb_dropout,
                freeze_embeddings:          a.freeze_embeddings,
                conv_size:                  a.conv_size,
                kernel_size:                a.kernel_size,
                pool_length:                a.pool_length,
                cnn_dropout:                a.cnn_dropout,
                rnn_type:                   a.rnn_type,
                hidden_size:                a.hidden_size,
                bidirectional:              a.bidirectional,
                sum_bidir:                  a.sum_bidir,
                rnn_dropout:                a.rnn_dropout,
                attn_scorer:                a.attn_scorer,
                attn_type:                  a.attn_type,
                attn_hidden_size:           a.attn_hidden_size,
                attn_multihead_hidden_size: a.attn_multihead_hidden_size,
                attn_nb_heads:              a.attn_nb_heads,
                attn_dropout:               a.attn_dropout,
            },
        }
    }
}

/// All arguments for the `detect` command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Unsegmented text to split into sentences
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the unsegmented text from a file instead
    #[arg(long)]
    pub file: Option<String>,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
