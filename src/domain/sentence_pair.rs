// ============================================================
// Layer 3 — SentencePair
// ============================================================

/// One line-aligned entry of a parallel corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentencePair {
    /// Sentence in the source language
    pub src: String,
    /// Reference translation in the target language
    pub trg: String,
}

impl SentencePair {
    pub fn new(src: impl Into<String>, trg: impl Into<String>) -> Self {
        Self { src: src.into(), trg: trg.into() }
    }

    /// Both sides must contain at least one non-space character.
    pub fn is_empty(&self) -> bool {
        self.src.trim().is_empty() || self.trg.trim().is_empty()
    }
}
