// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a finished run's best checkpoint:
//
//   Step 1: Load train_config.json from the run's models/
//   Step 2: Build the validation dataset it describes
//           (optionally from another list)
//   Step 3: Rebuild the model, load the best weights, and
//           run one validation pass (Layer 5 - ml)

use anyhow::Result;
use std::path::PathBuf;

use crate::application::train_use_case::build_dataset;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::{evaluate_checkpoint, ValidationReport};

pub struct EvaluateUseCase {
    models_dir: PathBuf,
    /// Overrides the validation list saved with the run
    val_list:   Option<String>,
}

impl EvaluateUseCase {
    pub fn new(models_dir: impl Into<PathBuf>, val_list: Option<String>) -> Self {
        Self { models_dir: models_dir.into(), val_list }
    }

    pub fn execute(&self) -> Result<ValidationReport> {
        // ── Step 1: Saved configuration ───────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&self.models_dir)?;
        let cfg          = ckpt_manager.load_config()?;
        let meta         = ckpt_manager.load_meta()?;
        tracing::info!(
            "Evaluating checkpoint from epoch {} (training loss {:?})",
            meta.epoch,
            meta.loss,
        );

        // ── Step 2: Validation dataset ────────────────────────────────────────
        let val_list = self.val_list.as_deref().unwrap_or(&cfg.val_list);
        let dataset  = build_dataset(&cfg, val_list, &cfg.val_archive_dir, cfg.val_plan()?)?;

        // ── Step 3: Validation pass ───────────────────────────────────────────
        evaluate_checkpoint(&cfg, dataset, &ckpt_manager)
    }
}
