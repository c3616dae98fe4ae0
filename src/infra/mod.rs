// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns that don't belong in any
// specific business layer:
//
//   checkpoint.rs  — Saving and loading model weights with
//                    Burn's CompactRecorder, plus the training
//                    config JSON so inference can rebuild the
//                    exact architecture.
//
//   vocab_store.rs — Vocabulary persistence. The word and tag
//                    fields are saved next to the checkpoints so
//                    inference uses the training-time token ids.
//
//   metrics.rs     — Training metrics logging. Writes epoch-level
//                    loss and boundary precision/recall/F1 to a
//                    CSV file for later analysis.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Word/tag vocabulary persistence
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
