// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load train / val / test pairs   (Layer 4 - data)
//   Step 2: Clean every sentence            (Layer 4 - data)
//   Step 3: Split off validation if absent  (Layer 4 - data)
//   Step 4: Build both vocabularies         (Layer 6 - infra)
//   Step 5: Encode pairs, drop overlong     (Layer 4 - data)
//   Step 6: Save configs                    (Layer 6 - infra)
//   Step 7: Run training loop               (Layer 5 - ml)
//   Step 8: Evaluate best model on test     (Layer 5 - ml)
//
// One seeded generator drives every random choice of the run:
// the split, weight init, dropout and batch shuffling.

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::data::{
    dataset::{TranslationDataset, TranslationSample},
    loader::ParallelCorpusLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
};
use crate::domain::{
    sentence_pair::SentencePair,
    special_tokens::{EOS_IDX, PAD_IDX, SOS_IDX},
    traits::CorpusSource,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{encode_sentence, TokenizerStore},
};
use crate::ml::inferencer::Inferencer;
use crate::ml::seq2seq::Seq2SeqConfig;
use crate::ml::trainer::{run_training, TrainReport};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved next to the
// checkpoint as train_config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:         String,
    pub checkpoint_dir:   String,
    pub src_lang:         String,
    pub trg_lang:         String,
    pub batch_size:       usize,
    pub epochs:           usize,
    pub lr:               f64,
    /// max global gradient norm
    pub clip:             f64,
    pub emb_dim:          usize,
    pub hid_dim:          usize,
    pub enc_layers:       usize,
    pub dec_layers:       usize,
    pub enc_kernel_size:  usize,
    pub dec_kernel_size:  usize,
    pub dropout:          f64,
    pub max_length:       usize,
    pub min_freq:         usize,
    /// share of train pairs moved to validation when no val split exists
    pub valid_fraction:   f64,
    pub seed:             u64,
    pub zero_causal_fill: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:         "data/multi30k".to_string(),
            checkpoint_dir:   "checkpoints".to_string(),
            src_lang:         "de".to_string(),
            trg_lang:         "en".to_string(),
            batch_size:       128,
            epochs:           10,
            lr:               5e-4,
            clip:             0.1,
            emb_dim:          256,
            hid_dim:          512,
            enc_layers:       10,
            dec_layers:       10,
            enc_kernel_size:  3,
            dec_kernel_size:  3,
            dropout:          0.25,
            max_length:       100,
            min_freq:         2,
            valid_fraction:   0.1,
            seed:             1234,
            zero_causal_fill: false,
        }
    }
}

impl TrainConfig {
    /// Architecture for the given vocabulary sizes.
    pub fn model_config(&self, input_dim: usize, output_dim: usize) -> Seq2SeqConfig {
        Seq2SeqConfig::new(input_dim, output_dim, PAD_IDX as usize)
            .with_emb_dim(self.emb_dim)
            .with_hid_dim(self.hid_dim)
            .with_enc_layers(self.enc_layers)
            .with_dec_layers(self.dec_layers)
            .with_enc_kernel_size(self.enc_kernel_size)
            .with_dec_kernel_size(self.dec_kernel_size)
            .with_dropout(self.dropout)
            .with_max_length(self.max_length)
            .with_zero_causal_fill(self.zero_causal_fill)
    }
}

/// Encoded splits and the architecture sized to their vocabularies.
#[derive(Debug)]
pub struct PreparedData {
    pub train:     TranslationDataset,
    pub val:       TranslationDataset,
    pub test:      Option<TranslationDataset>,
    pub model_cfg: Seq2SeqConfig,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg     = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let data = self.prepare(&mut rng)?;

        // ── Step 6: Save configs for inference ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_model_config(&data.model_cfg)?;

        // ── Step 7: Run training loop (Layer 5) ───────────────────────────────
        let report = run_training(
            cfg, &data.model_cfg, data.train, data.val, &ckpt_manager, &mut rng,
        )?;

        // ── Step 8: Test pass with the best checkpoint ────────────────────────
        match data.test {
            Some(test) if test.sample_count() > 0 => {
                let inferencer = Inferencer::from_checkpoint(
                    &ckpt_manager, SOS_IDX, EOS_IDX, cfg.max_length,
                )?;
                let summary = inferencer.evaluate(test, cfg.batch_size)?;
                println!(
                    "| Test Loss: {:.3} | Test PPL: {:7.3} |",
                    summary.loss, summary.perplexity(),
                );
            }
            _ => tracing::warn!("No test split found, skipping test evaluation"),
        }

        Ok(report)
    }

    /// Steps 1–5: everything up to the first tensor.
    pub fn prepare(&self, rng: &mut StdRng) -> Result<PreparedData> {
        let cfg = &self.config;

        // ── Step 1: Load corpus splits ────────────────────────────────────────
        tracing::info!(
            "Loading {}→{} corpus from '{}'", cfg.src_lang, cfg.trg_lang, cfg.data_dir
        );
        let loader = ParallelCorpusLoader::new(&cfg.data_dir, &cfg.src_lang, &cfg.trg_lang);
        let train  = loader
            .load_split("train")?
            .with_context(|| format!("No training split in '{}'", cfg.data_dir))?;
        let val    = loader.load_split("val")?;
        let test   = loader.load_split("test")?;

        // ── Step 2: Clean / normalise text ────────────────────────────────────
        let preprocessor = Preprocessor::new();
        let train = clean_pairs(&preprocessor, train);
        let val   = val.map(|v| clean_pairs(&preprocessor, v));
        let test  = test.map(|t| clean_pairs(&preprocessor, t));

        // ── Step 3: Validation split ──────────────────────────────────────────
        let (train, val) = match val {
            Some(val) => (train, val),
            None => {
                tracing::info!(
                    "No validation split, holding out {:.0}% of training pairs",
                    cfg.valid_fraction * 100.0
                );
                split_train_val(train, cfg.valid_fraction, rng)
            }
        };
        if train.is_empty() || val.is_empty() {
            anyhow::bail!(
                "Need at least one training and one validation pair (got {} / {})",
                train.len(), val.len()
            );
        }

        // ── Step 4: Build vocabularies from the training side only ────────────
        let tok_store = TokenizerStore::new(&cfg.checkpoint_dir);
        let src_texts: Vec<String> = train.iter().map(|p| p.src.clone()).collect();
        let trg_texts: Vec<String> = train.iter().map(|p| p.trg.clone()).collect();
        let src_tok = tok_store.build_and_save("src", &src_texts, cfg.min_freq)?;
        let trg_tok = tok_store.build_and_save("trg", &trg_texts, cfg.min_freq)?;

        let input_dim  = src_tok.get_vocab_size(false);
        let output_dim = trg_tok.get_vocab_size(false);
        tracing::info!(
            "Vocabulary sizes: {} ({}) / {} ({})",
            input_dim, cfg.src_lang, output_dim, cfg.trg_lang
        );

        // ── Step 5: Encode ────────────────────────────────────────────────────
        let train = encode_pairs(&train, &src_tok, &trg_tok, cfg.max_length, "train")?;
        let val   = encode_pairs(&val,   &src_tok, &trg_tok, cfg.max_length, "val")?;
        let test  = test
            .map(|t| encode_pairs(&t, &src_tok, &trg_tok, cfg.max_length, "test"))
            .transpose()?;

        // Overlong pairs are dropped during encoding, so check again here.
        if train.is_empty() || val.is_empty() {
            anyhow::bail!(
                "No training or validation pair fits max_length={} (got {} / {})",
                cfg.max_length, train.len(), val.len()
            );
        }

        let model_cfg = cfg.model_config(input_dim, output_dim);
        model_cfg.validate()?;

        Ok(PreparedData {
            train:     TranslationDataset::new(train),
            val:       TranslationDataset::new(val),
            test:      test.map(TranslationDataset::new),
            model_cfg,
        })
    }
}

pub(crate) fn clean_pairs(preprocessor: &Preprocessor, pairs: Vec<SentencePair>) -> Vec<SentencePair> {
    pairs
        .into_iter()
        .map(|p| SentencePair::new(preprocessor.clean(&p.src), preprocessor.clean(&p.trg)))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Encode both sides as `<sos> … <eos>` and drop pairs the position
/// table cannot hold.
pub(crate) fn encode_pairs(
    pairs:      &[SentencePair],
    src_tok:    &Tokenizer,
    trg_tok:    &Tokenizer,
    max_length: usize,
    split:      &str,
) -> Result<Vec<TranslationSample>> {
    let mut samples = Vec::with_capacity(pairs.len());
    let mut dropped = 0usize;

    for pair in pairs {
        let sample = TranslationSample::new(
            encode_sentence(src_tok, &pair.src)?,
            encode_sentence(trg_tok, &pair.trg)?,
        );
        if sample.fits(max_length) {
            samples.push(sample);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        tracing::warn!(
            "Dropped {} '{}' pairs longer than max_length={}", dropped, split, max_length
        );
    }
    tracing::info!("Encoded {} '{}' pairs", samples.len(), split);
    Ok(samples)
}
