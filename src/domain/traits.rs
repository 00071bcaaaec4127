// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits rather than to
// concrete loaders or models.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::sentence_pair::SentencePair;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can provide the named splits of a parallel corpus.
///
/// Implementations:
///   - ParallelCorpusLoader → `{split}.{lang}` text files
pub trait CorpusSource {
    /// Load the pairs of one split ("train", "val", "test").
    /// `Ok(None)` means the split does not exist in this source.
    fn load_split(&self, split: &str) -> Result<Option<Vec<SentencePair>>>;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Anything that can translate a source sentence.
///
/// Implementations:
///   - TranslateUseCase → greedy decoding with the trained model
pub trait Translator {
    /// Returns the generated target tokens, without <sos>/<eos>.
    fn translate(&self, sentence: &str) -> Result<Vec<String>>;
}
