// ============================================================
// Layer 2 — Translate Use Case
// ============================================================
// Restores the best checkpoint and both vocabularies, then
// translates single sentences greedily:
//
//   clean → <sos> + ids + <eos> → greedy decode → tokens
//
// The attention matrix of the last translation can be written
// to CSV for inspection.

use anyhow::Result;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::data::preprocessor::Preprocessor;
use crate::domain::{
    special_tokens::{EOS_IDX, EOS_TOKEN, SOS_IDX},
    traits::Translator,
};
use crate::infra::{
    attention_export::export_attention_csv,
    checkpoint::CheckpointManager,
    tokenizer_store::{encode_sentence, id_tokens, TokenizerStore},
};
use crate::ml::inferencer::Inferencer;

/// Tokens of one translation together with its attention weights.
#[derive(Debug, Clone)]
pub struct TranslationResult {
    /// Source tokens as the model saw them, <sos>/<eos> included
    pub src_tokens: Vec<String>,
    /// Generated tokens, <eos> included when produced
    pub trg_tokens: Vec<String>,
    /// attention[i][j]: weight of src_tokens[j] for trg_tokens[i]
    pub attention:  Vec<Vec<f32>>,
}

impl TranslationResult {
    /// Generated words without the closing <eos>.
    pub fn words(&self) -> Vec<String> {
        let mut words = self.trg_tokens.clone();
        if words.last().map(String::as_str) == Some(EOS_TOKEN) {
            words.pop();
        }
        words
    }

    pub fn export_attention(&self, path: &Path) -> Result<()> {
        export_attention_csv(path, &self.src_tokens, &self.trg_tokens, &self.attention)
    }
}

pub struct TranslateUseCase {
    src_tok:      Tokenizer,
    trg_tok:      Tokenizer,
    preprocessor: Preprocessor,
    inferencer:   Inferencer,
}

impl TranslateUseCase {
    pub fn new(checkpoint_dir: &str, max_len: usize) -> Result<Self> {
        let tok_store  = TokenizerStore::new(checkpoint_dir);
        let src_tok    = tok_store.load("src")?;
        let trg_tok    = tok_store.load("trg")?;
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, SOS_IDX, EOS_IDX, max_len)?;

        if src_tok.get_vocab_size(false) != inferencer.config().input_dim
            || trg_tok.get_vocab_size(false) != inferencer.config().output_dim
        {
            anyhow::bail!(
                "Tokenizers in '{}' do not match the saved model's vocabulary sizes",
                checkpoint_dir
            );
        }

        Ok(Self { src_tok, trg_tok, preprocessor: Preprocessor::new(), inferencer })
    }

    pub fn translate_full(&self, sentence: &str) -> Result<TranslationResult> {
        let cleaned = self.preprocessor.clean(sentence);
        let src_ids = encode_sentence(&self.src_tok, &cleaned)?;

        if src_ids.len() > self.inferencer.max_source_len() {
            anyhow::bail!(
                "Sentence has {} tokens, the model accepts at most {}",
                src_ids.len(), self.inferencer.max_source_len()
            );
        }

        let out = self.inferencer.translate_ids(&src_ids)?;
        tracing::debug!("Translated {} source tokens into {}", src_ids.len(), out.ids.len());

        Ok(TranslationResult {
            src_tokens: id_tokens(&self.src_tok, &src_ids),
            trg_tokens: id_tokens(&self.trg_tok, &out.ids),
            attention:  out.attention,
        })
    }
}

impl Translator for TranslateUseCase {
    fn translate(&self, sentence: &str) -> Result<Vec<String>> {
        Ok(self.translate_full(sentence)?.words())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(trg: &[&str]) -> TranslationResult {
        TranslationResult {
            src_tokens: vec!["<sos>".into(), "hund".into(), "<eos>".into()],
            trg_tokens: trg.iter().map(|s| s.to_string()).collect(),
            attention:  vec![vec![0.2, 0.6, 0.2]; trg.len()],
        }
    }

    #[test]
    fn test_words_strip_trailing_eos() {
        assert_eq!(result(&["a", "dog", "<eos>"]).words(), vec!["a", "dog"]);
        assert_eq!(result(&["a", "dog"]).words(), vec!["a", "dog"]);
    }

    #[test]
    fn test_export_attention_writes_csv() {
        let path = std::env::temp_dir()
            .join(format!("conv_seq2seq_translate_{}", std::process::id()))
            .join("attention.csv");

        result(&["dog", "<eos>"]).export_attention(&path).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        assert_eq!(csv.lines().count(), 3);

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }
}
