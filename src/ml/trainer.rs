// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validate + checkpoint + plot, once per epoch:
//
//   Training      shuffled batches, Smooth-L1, backward, Adam
//   Validating    model.valid() on the inner backend, loss and
//                 pixel-error counts (see evaluator.rs)
//   Checkpoint    only when validation loss is strictly the
//                 lowest so far; overwrites the previous best
//   Logging       training_log.txt line + metrics sink record
//   Plotting      first `plot_batch_size` validation samples
//
// Key Burn insight:
//   - Training uses Autodiff<Wgpu> for gradients
//   - model.valid() returns the model on the inner backend
//   - Validation batcher must use B::InnerBackend to match
//
// train_loop is generic over backend and model so tests drive
// it on NdArray with a tiny network.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{batcher::Batcher, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::GazeBatcher, dataset::GazeDataset};
use crate::domain::{
    metrics::{BestLoss, EpochMetrics},
    traits::MetricsSink,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{JsonlMetricsSink, TrainingLog},
    plots::{DiagnosticsPlotter, PlotBatch},
    run::RunContext,
};
use crate::ml::{
    evaluator::{to_host, validate},
    model::{smooth_l1_loss, GazeNet, GazeNetConfig, GazeRegressor},
};

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Where one run's per-epoch output goes
pub struct RunOutputs<'a> {
    pub checkpoints:  &'a CheckpointManager,
    pub training_log: &'a TrainingLog,
    pub metrics:      &'a mut dyn MetricsSink,
    /// None skips plotting
    pub plotter:      Option<&'a DiagnosticsPlotter>,
}

/// What a finished run achieved
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub epochs_run:    usize,
    /// None when no epoch produced a finite validation loss
    pub best_epoch:    Option<usize>,
    pub best_val_loss: f64,
}

/// Train a GazeNet on the WGPU device, writing everything into `run`.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: GazeDataset,
    val_dataset:   GazeDataset,
    run:           &RunContext,
) -> Result<TrainingSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    TrainBackend::seed(cfg.seed);

    let model: GazeNet<TrainBackend> = GazeNetConfig::new()
        .with_channels(cfg.channels)
        .with_d_state(cfg.d_state)
        .init(&device);
    tracing::info!("Total number of parameters: {}", model.num_params());

    let checkpoints  = CheckpointManager::new(run.models_dir())?;
    let training_log = TrainingLog::new(run.training_log_path(), cfg.height);
    let mut metrics  = JsonlMetricsSink::new(run.metrics_path());
    let plotter      = DiagnosticsPlotter::new(run.plots_dir(), cfg.height, cfg.width);

    let outputs = RunOutputs {
        checkpoints:  &checkpoints,
        training_log: &training_log,
        metrics:      &mut metrics,
        plotter:      Some(&plotter),
    };

    train_loop::<TrainBackend, _>(cfg, model, train_dataset, val_dataset, &device, outputs)
}

pub fn train_loop<B, M>(
    cfg:           &TrainConfig,
    mut model:     M,
    train_dataset: GazeDataset,
    val_dataset:   GazeDataset,
    device:        &B::Device,
    out:           RunOutputs<'_>,
) -> Result<TrainingSummary>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + GazeRegressor<B>,
    M::InnerModule: GazeRegressor<B::InnerBackend>,
{
    tracing::info!(
        "Training on {} windows, validating on {} windows",
        train_dataset.sample_count(),
        val_dataset.sample_count(),
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().init::<B, M>();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(GazeBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    // The plot step reads the same dataset, so it is shared
    let val_dataset = Arc::new(val_dataset);
    let val_loader  = DataLoaderBuilder::new(GazeBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(Arc::clone(&val_dataset));

    let mut best       = BestLoss::new();
    let mut best_epoch = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;
        let mut last_loss      = None;

        for batch in train_loader.iter() {
            let batch  = batch?;
            let output = model.forward(batch.frames);
            let loss   = smooth_l1_loss(output, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            last_loss       = Some(loss_val);
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let report      = validate(&model_valid, val_loader.as_ref(), cfg.height, cfg.width)?;
        let rates       = report.counts.rates();

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | err_rate={:.4} | err_rate_1={:.4}",
            epoch + 1, cfg.epochs, avg_train_loss, report.loss,
            rates.err_rate, rates.err_rate_1,
        );

        out.training_log.append(epoch, report.loss, &report.counts)?;
        out.metrics.log(&EpochMetrics::new(epoch, avg_train_loss, report.loss, rates))?;

        // ── Checkpoint decision ───────────────────────────────────────────────
        if best.improves(report.loss) {
            out.checkpoints.save::<B, _, _>(epoch, &model, &optim, last_loss)?;
            best_epoch = Some(epoch);
            tracing::info!("Saved best model: epoch {}, val_loss={:.4}", epoch, report.loss);
        }

        // ── Plotting ──────────────────────────────────────────────────────────
        if let Some(plotter) = out.plotter {
            match plot_batch(&model_valid, &val_dataset, cfg.plot_batch_size, device)? {
                Some(batch) => plotter.plot_epoch(epoch, &batch)?,
                None => tracing::warn!("Validation set is empty; no plots for epoch {}", epoch),
            }
        }
    }

    let summary = TrainingSummary {
        epochs_run:    cfg.epochs,
        best_epoch,
        best_val_loss: best.value(),
    };
    tracing::info!("Training complete! {:?}", summary);
    Ok(summary)
}

/// Predictions for the first `size` validation samples, on the host.
fn plot_batch<B, M>(
    model:   &M,
    dataset: &GazeDataset,
    size:    usize,
    device:  &B::Device,
) -> Result<Option<PlotBatch>>
where
    B: Backend,
    M: GazeRegressor<B>,
{
    let count = dataset.sample_count().min(size);
    if count == 0 {
        return Ok(None);
    }

    let samples: Vec<_> = (0..count).map(|i| dataset.sample(i)).collect();
    let batch           = GazeBatcher::<B>::new(device.clone()).batch(samples)?;
    let predictions     = model.forward(batch.frames.clone());

    Ok(Some(PlotBatch {
        frames:      to_host(batch.frames)?,
        targets:     to_host(batch.targets)?,
        predictions: to_host(predictions)?,
    }))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::{paths, write_recording};
    use crate::data::preprocessor::FramePreprocessor;
    use crate::infra::checkpoint::CheckpointMeta;
    use crate::domain::window::WindowPlan;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    type TestBackend = Autodiff<NdArray<f32>>;

    #[derive(Default)]
    struct MemorySink(Vec<EpochMetrics>);

    impl MetricsSink for MemorySink {
        fn log(&mut self, metrics: &EpochMetrics) -> Result<()> {
            self.0.push(metrics.clone());
            Ok(())
        }
    }

    fn dataset(dir: &std::path::Path, ids: &[&str]) -> GazeDataset {
        fs::create_dir_all(dir).unwrap();
        for id in ids {
            write_recording(dir, id, 8, 8, 4, 4);
        }
        let (archives, labels) = paths(dir, ids);
        GazeDataset::new(
            archives,
            labels,
            WindowPlan::new(8, 4, 2).unwrap(),
            FramePreprocessor::new(4, 4),
        )
        .unwrap()
    }

    #[test]
    fn test_train_loop_writes_run_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let run = RunContext::with_id(tmp.path(), 7).unwrap();
        let cfg = TrainConfig {
            height:          4,
            width:           4,
            batch_size:      2,
            epochs:          2,
            plot_batch_size: 3,
            channels:        2,
            d_state:         2,
            ..TrainConfig::default()
        };

        let train = dataset(&tmp.path().join("train"), &["a", "b"]);
        let val   = dataset(&tmp.path().join("val"), &["c"]);

        let device = Default::default();
        let model: GazeNet<TestBackend> = GazeNetConfig::new()
            .with_channels(cfg.channels)
            .with_d_state(cfg.d_state)
            .init(&device);

        let checkpoints  = CheckpointManager::new(run.models_dir()).unwrap();
        let training_log = TrainingLog::new(run.training_log_path(), cfg.height);
        let plotter      = DiagnosticsPlotter::new(run.plots_dir(), cfg.height, cfg.width);
        let mut sink     = MemorySink::default();

        let summary = train_loop::<TestBackend, _>(
            &cfg,
            model,
            train,
            val,
            &device,
            RunOutputs {
                checkpoints:  &checkpoints,
                training_log: &training_log,
                metrics:      &mut sink,
                plotter:      Some(&plotter),
            },
        )
        .unwrap();

        assert_eq!(summary.epochs_run, 2);
        assert!(summary.best_epoch.is_some());
        assert!(summary.best_val_loss.is_finite());

        let epochs: Vec<usize> = sink.0.iter().map(|m| m.epoch).collect();
        assert_eq!(epochs, vec![0, 1]);

        let log = fs::read_to_string(run.training_log_path()).unwrap();
        assert_eq!(log.lines().count(), 2);
        assert!(log.starts_with("Size 4, Epoch 0, Loss: "));

        let meta = checkpoints.load_meta().unwrap();
        assert_eq!(Some(meta.epoch), summary.best_epoch);
        assert!(meta.loss.is_some_and(f64::is_finite));

        for epoch in 0..2 {
            assert!(plotter.event_plot_path(epoch).exists());
            assert!(plotter.eye_plot_path(epoch).exists());
        }
    }

    #[test]
    fn test_empty_training_set_still_saves_a_readable_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let run = RunContext::with_id(tmp.path(), 8).unwrap();
        let cfg = TrainConfig {
            height:     4,
            width:      4,
            batch_size: 2,
            epochs:     1,
            channels:   2,
            d_state:    2,
            ..TrainConfig::default()
        };

        let train = GazeDataset::new(
            vec![],
            vec![],
            WindowPlan::new(8, 4, 2).unwrap(),
            FramePreprocessor::new(4, 4),
        )
        .unwrap();
        let val = dataset(&tmp.path().join("val"), &["c"]);

        let device = Default::default();
        let model: GazeNet<TestBackend> = GazeNetConfig::new()
            .with_channels(cfg.channels)
            .with_d_state(cfg.d_state)
            .init(&device);

        let checkpoints  = CheckpointManager::new(run.models_dir()).unwrap();
        let training_log = TrainingLog::new(run.training_log_path(), cfg.height);
        let mut sink     = MemorySink::default();

        let summary = train_loop::<TestBackend, _>(
            &cfg,
            model,
            train,
            val,
            &device,
            RunOutputs {
                checkpoints:  &checkpoints,
                training_log: &training_log,
                metrics:      &mut sink,
                plotter:      None,
            },
        )
        .unwrap();

        assert_eq!(summary.best_epoch, Some(0));
        assert!(sink.0[0].train_loss.is_nan());

        let meta = checkpoints.load_meta().unwrap();
        assert_eq!(meta, CheckpointMeta { epoch: 0, loss: None });
    }

    #[test]
    fn test_plot_batch_caps_sample_count() {
        let tmp    = tempfile::tempdir().unwrap();
        let val    = dataset(tmp.path(), &["c"]);
        let device = Default::default();
        let model: GazeNet<NdArray<f32>> = GazeNetConfig::new()
            .with_channels(2)
            .with_d_state(2)
            .init(&device);

        // one recording, windows of 4 at stride 2 → 3 samples
        let batch = plot_batch::<NdArray<f32>, _>(&model, &val, 100, &device).unwrap().unwrap();
        assert_eq!(batch.targets.len(), 3 * 4 * 2);
        assert_eq!(batch.frames.len(), 3 * 4 * 4 * 4);

        let batch = plot_batch::<NdArray<f32>, _>(&model, &val, 2, &device).unwrap().unwrap();
        assert_eq!(batch.predictions.len(), 2 * 4 * 2);
    }
}
