// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: average masked NLL on the training set
//   - val_loss:   average masked NLL on the validation set
//   - precision:  boundary-class precision on validation
//   - recall:     boundary-class recall on validation
//   - f1:         harmonic mean of precision and recall
//
// Precision/recall/F1 on the boundary class, not accuracy: the
// label distribution is heavily skewed towards the inside class,
// so accuracy saturates while F1 still separates models.
//
// Output file: checkpoints/metrics.csv

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// Average masked NLL over all training batches
    pub train_loss: f64,

    /// Average masked NLL on the validation set.
    /// Divergence from train_loss indicates overfitting
    pub val_loss: f64,

    /// Of the positions predicted as boundaries, the fraction
    /// that really are boundaries
    pub precision: f64,

    /// Of the true boundaries, the fraction the model found
    pub recall: f64,

    /// 2 * P * R / (P + R), 0 when both are 0
    pub f1: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        val_loss:   f64,
        precision:  f64,
        recall:     f64,
        f1:         f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss, precision, recall, f1 }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Header only on a fresh file, so reruns append
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,precision,recall,f1")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.val_loss, m.precision, m.recall, m.f1,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}, f1={:.4}",
            m.epoch, m.train_loss, m.val_loss, m.f1,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
