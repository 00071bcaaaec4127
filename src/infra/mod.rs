// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence and reporting shared by the other layers:
//
//   checkpoint.rs       — best model weights (NamedMpkFileRecorder, f32)
//                         plus model_config.json and
//                         train_config.json
//
//   tokenizer_store.rs  — one word-level tokenizer per language,
//                         built from the training split with a
//                         minimum word frequency
//
//   metrics.rs          — per-epoch loss / perplexity CSV
//
//   attention_export.rs — attention matrix of a translation as CSV

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// Attention matrix CSV export
pub mod attention_export;
