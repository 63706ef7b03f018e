// ============================================================
// Layer 6 — Metrics Logging
// ============================================================
// Two per-epoch outputs, both appended so a crashed run keeps
// every finished epoch:
//
//   logs/training_log.txt   human-readable, one line per epoch
//   logs/metrics.jsonl      one JSON object per epoch, the
//                           experiment-tracking record
//
// Example training_log.txt line:
//   Size 60, Epoch 3, Loss: 0.0123, err_rate_1:0.41, err_rate_3:0.12,
//   err_rate_5:0.05  err: 0.01 num_values: 12 tot_values: 1200
//   num_values_1: 492 num_values_3: 144 num_values_5: 60
//
// Example metrics.jsonl line:
//   {"epoch":3,"train_loss":0.02,"val_loss":0.0123,"err_rate":0.01,...}
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::{
    metrics::{EpochMetrics, ErrorCounts},
    traits::MetricsSink,
};

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open '{}' for appending", path.display()))?;
    writeln!(f, "{line}").with_context(|| format!("Cannot write to '{}'", path.display()))?;
    Ok(())
}

// ─── JsonlMetricsSink ─────────────────────────────────────────────────────────
/// Appends each epoch's record to a JSON-lines file.
pub struct JsonlMetricsSink {
    path: PathBuf,
}

impl JsonlMetricsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for JsonlMetricsSink {
    fn log(&mut self, m: &EpochMetrics) -> Result<()> {
        append_line(&self.path, &serde_json::to_string(m)?)?;
        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }
}

// ─── TrainingLog ──────────────────────────────────────────────────────────────
/// Plain-text validation summary, one line per epoch.
pub struct TrainingLog {
    path:   PathBuf,
    /// Frame height, written as the size tag
    height: usize,
}

impl TrainingLog {
    pub fn new(path: impl Into<PathBuf>, height: usize) -> Self {
        Self { path: path.into(), height }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, epoch: usize, val_loss: f64, counts: &ErrorCounts) -> Result<()> {
        append_line(&self.path, &format_line(self.height, epoch, val_loss, counts))
    }
}

fn format_line(height: usize, epoch: usize, val_loss: f64, counts: &ErrorCounts) -> String {
    let rates = counts.rates();
    format!(
        "Size {height}, Epoch {epoch}, Loss: {val_loss}, err_rate_1:{}, err_rate_3:{}, \
         err_rate_5:{}  err: {} num_values: {} tot_values: {} \
         num_values_1: {} num_values_3: {} num_values_5: {}",
        rates.err_rate_1,
        rates.err_rate_3,
        rates.err_rate_5,
        rates.err_rate,
        counts.over_10,
        counts.total,
        counts.over_1,
        counts.over_3,
        counts.over_5,
    )
}
