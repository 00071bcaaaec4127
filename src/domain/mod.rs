// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing the translation
// task. No Burn types, no file I/O.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A source sentence and its reference translation
pub mod sentence_pair;

// Reserved vocabulary entries shared by both languages
pub mod special_tokens;

// Core abstractions (traits) that other layers implement
pub mod traits;

// Corpus-level BLEU score
pub mod bleu;
