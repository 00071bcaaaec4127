// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case wires the data,
// infra and ml layers together for one command.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Corpus → vocabularies → training → test score
pub mod train_use_case;

// Single-sentence greedy translation
pub mod translate_use_case;

// Loss, perplexity and BLEU on a corpus split
pub mod evaluate_use_case;
