// ============================================================
// Layer 5 — Model Construction Errors
// ============================================================
// Fatal, non-recoverable validation errors raised while the
// model is being built. Forward-pass shape mismatches are not
// translated — they surface as panics from the tensor engine.

use thiserror::Error;

/// Errors that prevent model construction from completing.
#[derive(Debug, Error)]
pub enum ModelError {
    /// `attn_scorer` did not name a known compatibility function
    #[error("attention scorer `{0}` not available (expected one of: dot_product, general, add, concat, mlp)")]
    UnknownScorer(String),

    /// `attn_type` did not name a known attention variant
    #[error("attention type `{0}` not available (expected one of: regular, multihead)")]
    UnknownAttention(String),
}
