// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Scores the best checkpoint on one corpus split:
//
//   loss / perplexity  — teacher-forced, pad-masked, batched
//   BLEU-4             — greedy translations against the
//                        whitespace-tokenised references
//
// Data directory and languages default to the ones recorded
// in train_config.json.

use anyhow::{Context, Result};
use tokenizers::Tokenizer;

use crate::application::train_use_case::{clean_pairs, encode_pairs};
use crate::data::{
    dataset::TranslationDataset,
    loader::ParallelCorpusLoader,
    preprocessor::Preprocessor,
};
use crate::domain::{
    bleu::corpus_bleu,
    sentence_pair::SentencePair,
    special_tokens::{EOS_IDX, SOS_IDX},
    traits::CorpusSource,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::perplexity,
    tokenizer_store::{encode_sentence, id_tokens, pre_tokenize, TokenizerStore},
};
use crate::ml::inferencer::Inferencer;

#[derive(Debug, Clone)]
pub struct EvalReport {
    pub split:     String,
    pub loss:      f64,
    pub bleu:      f64,
    /// pairs scored for BLEU
    pub sentences: usize,
}

impl EvalReport {
    pub fn perplexity(&self) -> f64 {
        perplexity(self.loss)
    }
}

pub struct EvaluateUseCase {
    data_dir:   String,
    src_lang:   String,
    trg_lang:   String,
    batch_size: usize,
    max_length: usize,
    src_tok:    Tokenizer,
    trg_tok:    Tokenizer,
    inferencer: Inferencer,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: &str, data_dir: Option<String>, max_len: usize) -> Result<Self> {
        let ckpt      = CheckpointManager::new(checkpoint_dir);
        let train_cfg = ckpt.load_config()?;

        let tok_store  = TokenizerStore::new(checkpoint_dir);
        let src_tok    = tok_store.load("src")?;
        let trg_tok    = tok_store.load("trg")?;
        let inferencer = Inferencer::from_checkpoint(&ckpt, SOS_IDX, EOS_IDX, max_len)?;

        Ok(Self {
            data_dir:   data_dir.unwrap_or(train_cfg.data_dir),
            src_lang:   train_cfg.src_lang,
            trg_lang:   train_cfg.trg_lang,
            batch_size: train_cfg.batch_size,
            max_length: inferencer.config().max_length,
            src_tok,
            trg_tok,
            inferencer,
        })
    }

    pub fn execute(&self, split: &str) -> Result<EvalReport> {
        // ── Step 1: Load and clean the split ──────────────────────────────────
        let loader = ParallelCorpusLoader::new(&self.data_dir, &self.src_lang, &self.trg_lang);
        let pairs  = loader
            .load_split(split)?
            .with_context(|| format!("No '{}' split in '{}'", split, self.data_dir))?;
        let pairs  = clean_pairs(&Preprocessor::new(), pairs);

        // ── Step 2: Teacher-forced loss ───────────────────────────────────────
        let samples = encode_pairs(&pairs, &self.src_tok, &self.trg_tok, self.max_length, split)?;
        if samples.is_empty() {
            anyhow::bail!("Split '{}' has no pairs within max_length={}", split, self.max_length);
        }
        let summary = self.inferencer.evaluate(TranslationDataset::new(samples), self.batch_size)?;

        // ── Step 3: Greedy translations for BLEU ──────────────────────────────
        let (candidates, references) = self.translate_pairs(&pairs)?;
        let bleu = corpus_bleu(&candidates, &references);

        tracing::info!(
            "Evaluated '{}': loss={:.4}, bleu={:.4} over {} sentences",
            split, summary.loss, bleu, candidates.len()
        );

        Ok(EvalReport {
            split:     split.to_string(),
            loss:      summary.loss,
            bleu,
            sentences: candidates.len(),
        })
    }

    fn translate_pairs(&self, pairs: &[SentencePair]) -> Result<(Vec<Vec<String>>, Vec<Vec<String>>)> {
        let sources = encode_sources(pairs, &self.src_tok, self.inferencer.max_source_len())?;

        let mut candidates = Vec::with_capacity(sources.len());
        let mut references = Vec::with_capacity(sources.len());

        for (i, (src_ids, pair)) in sources.iter().enumerate() {
            let out = self.inferencer.translate_ids(src_ids)?;
            let ids: Vec<u32> = out.ids.into_iter().take_while(|&id| id != EOS_IDX).collect();

            candidates.push(id_tokens(&self.trg_tok, &ids));
            references.push(pre_tokenize(&pair.trg)?);

            if (i + 1) % 100 == 0 {
                tracing::debug!("Translated {}/{} sentences", i + 1, sources.len());
            }
        }

        Ok((candidates, references))
    }
}

/// Encoded sources the position table can hold, paired with their
/// sentence. Longer sources are left out of BLEU.
pub(crate) fn encode_sources<'a>(
    pairs:          &'a [SentencePair],
    src_tok:        &Tokenizer,
    max_source_len: usize,
) -> Result<Vec<(Vec<u32>, &'a SentencePair)>> {
    let mut sources = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let src_ids = encode_sentence(src_tok, &pair.src)?;
        if src_ids.len() <= max_source_len {
            sources.push((src_ids, pair));
        }
    }

    let skipped = pairs.len() - sources.len();
    if skipped > 0 {
        tracing::warn!(
            "Skipped {} of {} sentences for BLEU: source longer than {} tokens",
            skipped, pairs.len(), max_source_len
        );
    }
    Ok(sources)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn src_tokenizer(name: &str) -> (Tokenizer, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("conv_seq2seq_eval_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let texts = vec!["zwei männer".to_string(), "ein hund läuft".to_string()];
        let tok = TokenizerStore::new(dir.to_string_lossy())
            .build_and_save("src", &texts, 1)
            .unwrap();
        (tok, dir)
    }

    #[test]
    fn test_encode_sources_skips_overlong() {
        let (tok, dir) = src_tokenizer("skip");
        let pairs = vec![
            SentencePair::new("zwei männer", "two men"),
            SentencePair::new("ein hund läuft", "a dog runs"),
        ];

        // <sos> zwei männer <eos> = 4 ids, <sos> ein hund läuft <eos> = 5 ids
        let sources = encode_sources(&pairs, &tok, 4).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0.len(), 4);
        assert_eq!(sources[0].1, &pairs[0]);

        assert_eq!(encode_sources(&pairs, &tok, 5).unwrap().len(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_report_perplexity() {
        let report = EvalReport { split: "test".into(), loss: 0.0, bleu: 0.0, sentences: 0 };
        assert!((report.perplexity() - 1.0).abs() < 1e-12);
    }
}
