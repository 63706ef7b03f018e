// ============================================================
// Layer 5 — Validation Pass
// ============================================================
// Runs a model over every validation batch without autodiff and
// aggregates:
//
//   - mean Smooth-L1 loss over batches
//   - pixel-error threshold counts over every sample-timestep
//
// Used by the training loop once per epoch, and by the
// `evaluate` command on a saved checkpoint.

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{BatchResult, GazeBatcher},
    dataset::GazeDataset,
};
use crate::domain::metrics::{pixel_distances, ErrorCounts};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{smooth_l1_loss, GazeNet, GazeNetConfig, GazeRegressor};

type EvalBackend = burn::backend::Wgpu;

/// Loss and error counts from one pass over a validation set.
#[derive(Debug, Clone, Copy)]
pub struct ValidationReport {
    /// Mean batch loss; NaN when there were no batches
    pub loss:    f64,
    pub batches: usize,
    pub counts:  ErrorCounts,
}

/// Pull a tensor back to the host as a flat f32 buffer.
pub fn to_host<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}

/// One full pass over `loader`. `height` / `width` rescale the
/// normalized coordinate errors to pixels.
pub fn validate<B, M>(
    model:  &M,
    loader: &dyn DataLoader<BatchResult<B>>,
    height: usize,
    width:  usize,
) -> Result<ValidationReport>
where
    B: Backend,
    M: GazeRegressor<B>,
{
    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut counts   = ErrorCounts::new();

    for batch in loader.iter() {
        let batch  = batch?;
        let output = model.forward(batch.frames);

        let loss: f64 = smooth_l1_loss(output.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        loss_sum += loss;
        batches  += 1;

        let targets     = to_host(batch.targets)?;
        let predictions = to_host(output)?;
        counts.record_all(pixel_distances(&targets, &predictions, height, width));
    }

    let loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
    Ok(ValidationReport { loss, batches, counts })
}

/// Rebuild the model described by `cfg`, load the best checkpoint from
/// `ckpt_manager`, and validate it on `dataset`.
pub fn evaluate_checkpoint(
    cfg:          &TrainConfig,
    dataset:      GazeDataset,
    ckpt_manager: &CheckpointManager,
) -> Result<ValidationReport> {
    let device = burn::backend::wgpu::WgpuDevice::default();

    let model: GazeNet<EvalBackend> = GazeNetConfig::new()
        .with_channels(cfg.channels)
        .with_d_state(cfg.d_state)
        .init(&device);
    let model = ckpt_manager.load_model(model, &device)?;

    let loader = DataLoaderBuilder::new(GazeBatcher::<EvalBackend>::new(device))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(dataset);

    validate(&model, loader.as_ref(), cfg.height, cfg.width)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::{paths, write_recording};
    use crate::data::preprocessor::FramePreprocessor;
    use crate::domain::window::WindowPlan;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    /// Always predicts (0, 0)
    struct Origin;

    impl<B: Backend> GazeRegressor<B> for Origin {
        fn forward(&self, frames: Tensor<B, 5>) -> Tensor<B, 3> {
            let [batch, steps, ..] = frames.dims();
            Tensor::zeros([batch, steps, 2], &frames.device())
        }
    }

    #[test]
    fn test_validate_counts_every_timestep() {
        let dir = tempfile::tempdir().unwrap();
        write_recording(dir.path(), "a", 8, 8, 4, 4);
        write_recording(dir.path(), "b", 8, 8, 4, 4);
        let (archives, labels) = paths(dir.path(), &["a", "b"]);

        // 4x4 frames; labels x = i, y = 2i → normalized i/32, i/16
        let dataset = GazeDataset::new(
            archives,
            labels,
            WindowPlan::new(8, 4, 4).unwrap(),
            FramePreprocessor::new(4, 4),
        )
        .unwrap();

        let loader = DataLoaderBuilder::new(GazeBatcher::<TestBackend>::new(Default::default()))
            .batch_size(3)
            .build(dataset);

        let report = validate(&Origin, loader.as_ref(), 4, 4).unwrap();

        // 2 recordings x 2 windows x 4 steps
        assert_eq!(report.counts.total, 16);
        assert_eq!(report.batches, 2);
        // Label i is off by (i/32 * 4, i/16 * 4) px; label 7 → ≈1.96 px
        assert_eq!(report.counts.over_5, 0);
        assert!(report.counts.over_1 > 0);
        assert!(report.loss.is_finite());
    }
}
