// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one.
//
// Why isolate Burn code here?
//   - If Burn's API changes, we only update this layer
//   - Other layers are testable without the tensor engine
//   - The model architecture is clearly separated from
//     data loading and application logic
//
// What's in this layer:
//
//   options.rs    — Flat hyperparameter struct shared by the
//                   CLI, the saved training config and the
//                   model constructor
//
//   error.rs      — Construction-time validation errors
//
//   model.rs      — The RCNN + attention architecture:
//                   • Word embeddings (optionally pretrained)
//                   • 1-D convolution + max-pooling
//                   • Recurrent encoder (rnn / gru / lstm)
//                   • Self-attention with pluggable scorers
//                   • Linear + log-softmax boundary head
//
//   scorer.rs     — The attention compatibility functions
//   attention.rs  — Regular and multi-headed attention
//   rnn.rs        — Length-aware recurrent encoder
//
//   trainer.rs    — The training loop: forward pass, masked
//                   NLL loss, backward pass, Adam step,
//                   validation metrics, checkpoint per epoch
//
//   inferencer.rs — Loads a checkpoint and segments raw text
//                   into sentences
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Treviso et al. (2017) Sentence Segmentation in
//            Narrative Transcripts from Neuropsychological Tests

/// Model hyperparameters
pub mod options;

/// Construction-time model errors
pub mod error;

/// Attention compatibility functions (scorers)
pub mod scorer;

/// Regular and multi-headed self-attention
pub mod attention;

/// Length-aware recurrent encoder
pub mod rnn;

/// The RCNN + attention boundary detection model
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint and segments text
pub mod inferencer;
