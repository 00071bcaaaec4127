// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From parallel text files to padded tensor batches:
//
//   {split}.{lang} files
//       │
//       ▼
//   ParallelCorpusLoader → line-aligned SentencePairs
//       │
//       ▼
//   Preprocessor         → whitespace cleanup, lowercasing
//       │
//       ▼
//   TokenizerStore       → <sos> + word ids + <eos>   (infra)
//       │
//       ▼
//   split_train_val      → only if no val split on disk
//       │
//       ▼
//   TranslationDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   TranslationBatcher   → pads src / trg to the batch maximum
//       │
//       ▼
//   DataLoader           → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads `{split}.{lang}` parallel text files
pub mod loader;

/// Cleans and normalises sentences
pub mod preprocessor;

/// Implements Burn's Dataset trait for token-id pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create padded tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
