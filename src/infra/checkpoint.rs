// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Keeps the single best checkpoint of a run using Burn's
// CompactRecorder (MessagePack + gzip).
//
// Files in the run's models/ directory:
//   best_model.mpk.gz        ← model parameters
//   best_model_optim.mpk.gz  ← optimizer state
//   best_model.json          ← { "epoch": .., "loss": .. }
//                               loss is null when no training
//                               batch ran that epoch
//   train_config.json        ← TrainConfig, to rebuild the model
//
// save() overwrites all three best_model files; the training
// loop only calls it when validation loss improves.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;

const MODEL_FILE:  &str = "best_model";
const OPTIM_FILE:  &str = "best_model_optim";
const META_FILE:   &str = "best_model.json";
const CONFIG_FILE: &str = "train_config.json";

/// Epoch and last raw training-batch loss of the saved checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch: usize,
    pub loss:  Option<f64>,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Manage checkpoints in `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Overwrite the best checkpoint with `model` and `optim`.
    pub fn save<B, M, O>(&self, epoch: usize, model: &M, optim: &O, loss: Option<f64>) -> Result<()>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let recorder   = CompactRecorder::new();
        let model_path = self.dir.join(MODEL_FILE);
        let optim_path = self.dir.join(OPTIM_FILE);

        model
            .clone()
            .save_file(model_path.clone(), &recorder)
            .with_context(|| format!("Failed to save model to '{}'", model_path.display()))?;

        <CompactRecorder as Recorder<B>>::record(&recorder, optim.to_record(), optim_path.clone())
            .with_context(|| format!("Failed to save optimizer to '{}'", optim_path.display()))?;

        let meta_path = self.dir.join(META_FILE);
        fs::write(&meta_path, serde_json::to_string_pretty(&CheckpointMeta { epoch, loss })?)
            .with_context(|| format!("Cannot write '{}'", meta_path.display()))?;

        tracing::debug!("Saved best checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the best model parameters into `model`.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.dir.join(MODEL_FILE);
        let meta = self.load_meta()?;
        tracing::info!("Loading best checkpoint from epoch {}", meta.epoch);

        model
            .load_file(path.clone(), &CompactRecorder::new(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Has this run saved one?", path.display())
            })
    }

    pub fn load_meta(&self) -> Result<CheckpointMeta> {
        let path = self.dir.join(META_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'. Has this run saved a checkpoint?", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save the training configuration so the model can be rebuilt.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}
