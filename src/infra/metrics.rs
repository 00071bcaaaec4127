// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Output file: checkpoints/metrics.csv
//
//   epoch,train_loss,train_ppl,val_loss,val_ppl,epoch_secs
//   1,4.213300,67.580000,3.401200,30.000000,41.20
//   2,3.120100,22.650000,2.804300,16.520000,40.87
//
// Perplexity is exp(loss) of the pad-masked cross-entropy.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// exp(mean cross-entropy)
pub fn perplexity(loss: f64) -> f64 {
    loss.exp()
}

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// starts at 1
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
    /// wall-clock duration of training + validation
    pub epoch_secs: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, epoch_secs: f64) -> Self {
        Self { epoch, train_loss, val_loss, epoch_secs }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// successive runs append to the same log.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,train_ppl,val_loss,val_ppl,epoch_secs")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.2}",
            m.epoch,
            m.train_loss,
            perplexity(m.train_loss),
            m.val_loss,
            perplexity(m.val_loss),
            m.epoch_secs,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
