// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw .txt corpus files to tensor batches.
//
// The pipeline flows in this order:
//
//   .txt files (one sentence per line)
//       │
//       ▼
//   TextLoader        → reads files into Documents
//       │
//       ▼
//   Preprocessor      → cleans and tokenises text
//       │
//       ▼
//   WordsField        → token → id vocabulary (+ pretrained
//   TagsField           vectors), tag label space
//       │
//       ▼
//   SbdDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   SbdBatcher        → dynamic padding into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads .txt corpus files from a directory
pub mod loader;

/// Cleans, normalises and tokenises raw text
pub mod preprocessor;

/// Word/tag vocabularies with reserved ids and pretrained vectors
pub mod vocab;

/// Implements Burn's Dataset trait for encoded documents
pub mod dataset;

/// Implements Burn's Batcher trait with dynamic padding
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
