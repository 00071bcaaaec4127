// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves and loads one word-level tokenizer per language.
//
// The vocabulary is built from the training split only:
//   - words are produced by the same Whitespace pre-tokenizer
//     the saved tokenizer uses at encode time
//   - words seen fewer than `min_freq` times map to <unk>
//   - order: frequency descending, ties alphabetical
//
// Special tokens always take the first four ids:
//   <unk>=0  <pad>=1  <sos>=2  <eos>=3
//
// The vocabulary JSON is written in HuggingFace format and read
// back through Tokenizer::from_file.

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::{
    pre_tokenizers::whitespace::Whitespace, OffsetReferential, OffsetType,
    PreTokenizedString, PreTokenizer, Tokenizer,
};

use crate::domain::special_tokens::{EOS_IDX, SOS_IDX, SPECIAL_TOKENS, UNK_IDX};

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}_tokenizer.json"))
    }

    pub fn load(&self, name: &str) -> Result<Tokenizer> {
        let path = self.path(name);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    /// Build a vocabulary from `texts` and overwrite any saved one.
    pub fn build_and_save(&self, name: &str, texts: &[String], min_freq: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir).ok();
        tracing::info!("Building '{}' tokenizer (min_freq={})", name, min_freq);

        // ── Step 1: Count words ──────────────────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in pre_tokenize(text)? {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // ── Step 2: Order and assign ids after the specials ──────────────────
        let mut words: Vec<(String, usize)> = freq
            .into_iter()
            .filter(|(w, n)| *n >= min_freq && !SPECIAL_TOKENS.contains(&w.as_str()))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (offset, (word, _)) in words.iter().enumerate() {
            vocab.insert(word.clone(), serde_json::json!(SPECIAL_TOKENS.len() + offset));
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ───────────────
        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id, "content": token, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": { "type": "Lowercase" },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": SPECIAL_TOKENS[UNK_IDX as usize]
            }
        });

        let tok_path = self.path(name);
        std::fs::write(
            &tok_path,
            serde_json::to_string_pretty(&tokenizer_json)?
        ).with_context(|| format!("Cannot write tokenizer JSON '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer '{}' built with {} tokens, saved to '{}'",
            name,
            SPECIAL_TOKENS.len() + words.len(),
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Split text into words exactly as the saved tokenizers do.
pub fn pre_tokenize(text: &str) -> Result<Vec<String>> {
    let mut pre = PreTokenizedString::from(text);
    Whitespace {}
        .pre_tokenize(&mut pre)
        .map_err(|e| anyhow::anyhow!("Pre-tokenisation error: {e}"))?;

    Ok(pre
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}

/// `<sos>` + word ids + `<eos>`
pub fn encode_sentence(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let enc = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

    let mut ids = Vec::with_capacity(enc.get_ids().len() + 2);
    ids.push(SOS_IDX);
    ids.extend_from_slice(enc.get_ids());
    ids.push(EOS_IDX);
    Ok(ids)
}

/// Map ids back to token strings; unknown ids render as <unk>.
pub fn id_tokens(tokenizer: &Tokenizer, ids: &[u32]) -> Vec<String> {
    ids.iter()
        .map(|&id| tokenizer.id_to_token(id).unwrap_or_else(|| SPECIAL_TOKENS[UNK_IDX as usize].to_string()))
        .collect()
}
