// ============================================================
// Layer 6 — Run Context
// ============================================================
// Every training run writes under its own randomly numbered
// directory:
//
//   <output_root>/
//     LOGS_<id>/
//       logs/     training_log.txt, metrics.jsonl
//       plots/    event_plot_<epoch>.png, eye_plot_<epoch>.png
//       models/   best_model.*, train_config.json
//
// The context is created once at start and passed to whatever
// writes output; nothing reads the paths from globals.
//
// Reference: rand crate (Rng::gen_range)

use anyhow::{Context, Result};
use rand::Rng;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Run ids are drawn from [1, RUN_ID_MAX)
const RUN_ID_MAX: u32 = 1_000_000;

#[derive(Debug, Clone)]
pub struct RunContext {
    id:   u32,
    root: PathBuf,
}

impl RunContext {
    /// New run with a random id; creates its directories.
    pub fn create(output_root: impl AsRef<Path>) -> Result<Self> {
        let id = rand::thread_rng().gen_range(1..RUN_ID_MAX);
        Self::with_id(output_root, id)
    }

    /// Run with a fixed id; creates its directories if missing.
    pub fn with_id(output_root: impl AsRef<Path>, id: u32) -> Result<Self> {
        let run = Self {
            id,
            root: output_root.as_ref().join(format!("LOGS_{id}")),
        };
        for dir in [run.logs_dir(), run.plots_dir(), run.models_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        }
        Ok(run)
    }

    pub fn id(&self) -> u32 { self.id }

    pub fn root(&self) -> &Path { &self.root }

    pub fn logs_dir(&self) -> PathBuf { self.root.join("logs") }

    pub fn plots_dir(&self) -> PathBuf { self.root.join("plots") }

    pub fn models_dir(&self) -> PathBuf { self.root.join("models") }

    pub fn training_log_path(&self) -> PathBuf { self.logs_dir().join("training_log.txt") }

    pub fn metrics_path(&self) -> PathBuf { self.logs_dir().join("metrics.jsonl") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_three_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let run = RunContext::with_id(tmp.path(), 42).unwrap();

        assert_eq!(run.root(), tmp.path().join("LOGS_42"));
        assert!(run.logs_dir().is_dir());
        assert!(run.plots_dir().is_dir());
        assert!(run.models_dir().is_dir());
    }

    #[test]
    fn test_random_id_in_range() {
        let tmp = tempfile::tempdir().unwrap();
        let run = RunContext::create(tmp.path()).unwrap();
        assert!((1..RUN_ID_MAX).contains(&run.id()));
        assert!(run.root().ends_with(format!("LOGS_{}", run.id())));
    }
}
