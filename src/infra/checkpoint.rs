// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's NamedMpkFileRecorder
// (named parameter tensors → MessagePack) at full precision, so the
// restored model is the one that was validated.
//
// Only the best model is kept: it is overwritten each time the
// validation loss improves, and read back once after training
// for the test pass (and later by `translate` / `evaluate`).
//
//   checkpoints/
//     best_model.mpk       ← weights of the best epoch
//     model_config.json    ← Seq2SeqConfig (architecture + vocab sizes)
//     train_config.json    ← full TrainConfig of the run
//
// Loading fails if the stored record does not match the
// architecture rebuilt from model_config.json.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{FileRecorder, FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::seq2seq::{Seq2Seq, Seq2SeqConfig};

const BEST_MODEL: &str = "best_model";

type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Overwrite the best checkpoint with the current weights.
    pub fn save_best<B: Backend>(&self, model: &Seq2Seq<B>) -> Result<()> {
        let path = self.dir.join(BEST_MODEL);

        ModelRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        tracing::debug!("Saved best checkpoint to '{}'", path.display());
        Ok(())
    }

    /// Restore the best checkpoint into a freshly initialised model of
    /// the same architecture.
    pub fn load_best<B: Backend>(
        &self,
        model:  Seq2Seq<B>,
        device: &B::Device,
    ) -> Result<Seq2Seq<B>> {
        let path = self.dir.join(BEST_MODEL);

        let record = ModelRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        tracing::info!("Loaded best checkpoint from '{}'", path.display());
        Ok(model.load_record(record))
    }

    /// The recorder appends its own extension to the path it is given.
    pub fn best_model_file<B: Backend>(&self) -> PathBuf {
        self.dir
            .join(BEST_MODEL)
            .with_extension(<ModelRecorder as FileRecorder<B>>::file_extension())
    }

    pub fn has_best<B: Backend>(&self) -> bool {
        self.best_model_file::<B>().exists()
    }

    pub fn save_model_config(&self, cfg: &Seq2SeqConfig) -> Result<()> {
        let path = self.dir.join("model_config.json");
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_model_config(&self) -> Result<Seq2SeqConfig> {
        let path = self.dir.join("model_config.json");
        Seq2SeqConfig::load(&path).map_err(|e| {
            anyhow::anyhow!(
                "Cannot read model config from '{}': {e}. \
                 Make sure you have run 'train' first.",
                path.display()
            )
        })
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Rebuild the architecture from model_config.json and load the best
    /// weights into it. Dropout is irrelevant outside training.
    pub fn restore<B: Backend>(&self, device: &B::Device) -> Result<(Seq2Seq<B>, Seq2SeqConfig)> {
        let model_cfg = self.load_model_config()?;
        let model     = model_cfg.init::<B>(device)?;
        let model     = self.load_best(model, device)?;
        Ok((model, model_cfg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("conv_seq2seq_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn small_config() -> Seq2SeqConfig {
        Seq2SeqConfig::new(10, 12, 1)
            .with_emb_dim(8)
            .with_hid_dim(16)
            .with_enc_layers(2)
            .with_dec_layers(2)
    }

    #[test]
    fn test_roundtrip_reproduces_logits() {
        let dir    = temp_dir("ckpt_roundtrip");
        let ckpt   = CheckpointManager::new(dir.to_string_lossy());
        let device = Default::default();

        let model = small_config().init::<TestBackend>(&device).unwrap();
        let src = Tensor::<TestBackend, 1, Int>::from_ints([2, 4, 5, 6, 3], &device).reshape([1, 5]);
        let trg = Tensor::<TestBackend, 1, Int>::from_ints([2, 7, 8], &device).reshape([1, 3]);
        let before = model.forward(src.clone(), trg.clone()).unwrap();

        ckpt.save_best(&model).unwrap();
        ckpt.save_model_config(&small_config()).unwrap();
        assert!(ckpt.has_best::<TestBackend>());
        assert!(dir.join("best_model.mpk").exists());

        let (restored, cfg) = ckpt.restore::<TestBackend>(&device).unwrap();
        assert_eq!(cfg.output_dim, 12);
        let after = restored.forward(src, trg).unwrap();

        let diff: f32 = (before.logits - after.logits).abs().max().into_scalar().elem();
        assert!(diff < 1e-6, "max logit difference {diff}");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_without_checkpoint_fails() {
        let dir    = temp_dir("ckpt_missing");
        let ckpt   = CheckpointManager::new(dir.to_string_lossy());
        let device = Default::default();

        let model = small_config().init::<TestBackend>(&device).unwrap();
        assert!(!ckpt.has_best::<TestBackend>());
        assert!(ckpt.load_best(model, &device).is_err());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_train_config_roundtrip() {
        let dir  = temp_dir("ckpt_config");
        let ckpt = CheckpointManager::new(dir.to_string_lossy());

        let cfg = TrainConfig { epochs: 3, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap().epochs, 3);

        fs::remove_dir_all(&dir).ok();
    }
}
