// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Create the run directory     (Layer 6 - infra)
//   Step 2: Read the recording lists     (Layer 4 - data)
//   Step 3: Build window plans           (Layer 3 - domain)
//   Step 4: Build datasets               (Layer 4 - data)
//   Step 5: Save config                  (Layer 6 - infra)
//   Step 6: Run training loop            (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::GazeDataset,
    loader::{load_filenames, recording_paths},
    preprocessor::FramePreprocessor,
};
use crate::domain::window::WindowPlan;
use crate::infra::{checkpoint::CheckpointManager, run::RunContext};
use crate::ml::trainer::{run_training, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs, fixed at start.
// Saved to models/train_config.json so `evaluate` can rebuild
// the same model and datasets later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_list:        String,
    pub val_list:          String,
    pub train_archive_dir: String,
    pub val_archive_dir:   String,
    pub label_dir:         String,
    /// Appended to every recording id to find its frame archive
    pub archive_ext:       String,
    pub output_root:       String,

    /// Frame size after resizing
    pub height:            usize,
    pub width:             usize,

    pub batch_size:        usize,
    /// Window length in frames
    pub seq:               usize,
    pub stride:            usize,
    pub val_stride:        usize,
    pub chunk_size:        usize,

    pub epochs:            usize,
    pub lr:                f64,
    pub seed:              u64,
    /// Validation samples drawn in each epoch's plots
    pub plot_batch_size:   usize,
    pub num_workers:       usize,

    /// GazeNet width and temporal state size
    pub channels:          usize,
    pub d_state:           usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_list:        "train_files.txt".to_string(),
            val_list:          "val_files.txt".to_string(),
            train_archive_dir: "data/train".to_string(),
            val_archive_dir:   "data/val".to_string(),
            label_dir:         "data/labels".to_string(),
            archive_ext:       ".npy".to_string(),
            output_root:       "eye_tracking_lpw".to_string(),
            height:            60,
            width:             80,
            batch_size:        16,
            seq:               40,
            stride:            1,
            val_stride:        40,
            chunk_size:        500,
            epochs:            100,
            lr:                1e-3,
            seed:              1,
            plot_batch_size:   100,
            num_workers:       1,
            channels:          16,
            d_state:           16,
        }
    }
}

impl TrainConfig {
    pub fn train_plan(&self) -> Result<WindowPlan> {
        WindowPlan::new(self.chunk_size, self.seq, self.stride)
    }

    pub fn val_plan(&self) -> Result<WindowPlan> {
        WindowPlan::new(self.chunk_size, self.seq, self.val_stride)
    }

    pub fn preprocessor(&self) -> FramePreprocessor {
        FramePreprocessor::new(self.height, self.width)
    }
}

/// Dataset over every recording listed in `list_file`.
pub fn build_dataset(
    cfg:         &TrainConfig,
    list_file:   &str,
    archive_dir: &str,
    plan:        WindowPlan,
) -> Result<GazeDataset> {
    let ids = load_filenames(list_file)?;
    tracing::info!("Read {} recording ids from '{}'", ids.len(), list_file);

    let archives = recording_paths(&ids, Path::new(archive_dir), &cfg.archive_ext);
    let labels   = recording_paths(&ids, Path::new(&cfg.label_dir), ".txt");

    let dataset = GazeDataset::new(archives, labels, plan, cfg.preprocessor())
        .with_context(|| format!("Cannot build dataset from '{list_file}'"))?;
    tracing::info!(
        "{} recordings x {} windows = {} samples",
        dataset.recording_count(),
        dataset.interval(),
        dataset.sample_count(),
    );
    Ok(dataset)
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Run directory ─────────────────────────────────────────────
        let run = RunContext::create(&cfg.output_root)?;
        tracing::info!("Run {} writing to '{}'", run.id(), run.root().display());

        // ── Steps 2-4: Datasets ───────────────────────────────────────────────
        // Training windows overlap (stride 1 by default); validation
        // windows are spaced a full window apart.
        let train_dataset = build_dataset(cfg, &cfg.train_list, &cfg.train_archive_dir, cfg.train_plan()?)?;
        let val_dataset   = build_dataset(cfg, &cfg.val_list, &cfg.val_archive_dir, cfg.val_plan()?)?;

        // ── Step 5: Save config for evaluation ────────────────────────────────
        CheckpointManager::new(run.models_dir())?.save_config(cfg)?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, val_dataset, &run)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::write_recording;
    use std::fs;

    #[test]
    fn test_default_plans() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.train_plan().unwrap().windows_per_chunk(), 461);
        assert_eq!(cfg.val_plan().unwrap().windows_per_chunk(), 12);
    }

    #[test]
    fn test_invalid_stride_rejected() {
        let cfg = TrainConfig { val_stride: 0, ..TrainConfig::default() };
        assert!(cfg.val_plan().is_err());
    }

    #[test]
    fn test_build_dataset_from_list() {
        let tmp = tempfile::tempdir().unwrap();
        write_recording(tmp.path(), "r1", 8, 8, 4, 4);
        write_recording(tmp.path(), "r2", 8, 8, 4, 4);
        let list = tmp.path().join("list.txt");
        fs::write(&list, "r1\n\nr2\n").unwrap();

        let dir = tmp.path().to_str().unwrap().to_string();
        let cfg = TrainConfig {
            label_dir: dir.clone(),
            height:    4,
            width:     4,
            ..TrainConfig::default()
        };

        let ds = build_dataset(&cfg, list.to_str().unwrap(), &dir, WindowPlan::new(8, 4, 4).unwrap()).unwrap();
        assert_eq!(ds.recording_count(), 2);
        assert_eq!(ds.sample_count(), 4);
    }

    #[test]
    fn test_config_json_keeps_every_field() {
        let cfg  = TrainConfig { seed: 9, lr: 5e-4, ..TrainConfig::default() };
        let back: TrainConfig = serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(back.seed, 9);
        assert_eq!(back.lr, 5e-4);
        assert_eq!(back.archive_ext, ".npy");
    }
}
