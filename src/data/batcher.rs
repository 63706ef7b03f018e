// ============================================================
// Layer 4 — Gaze Batcher
// ============================================================
// Implements Burn's Batcher trait to stack GazeSamples into
// device tensors.
//
//   Input:  Vec of N samples, frames [T, 1, H, W], labels [T, 2]
//   Output: frames  [N, T, 1, H, W]
//           targets [N, T, 2]
//
// Items arrive as Result<GazeSample, DatasetError>. The first
// failed sample turns the whole batch into that error, which the
// training loop then propagates.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::{
    dataset::{GazeSample, SampleResult},
    error::DatasetError,
};

/// What the data loader yields per step
pub type BatchResult<B> = Result<GazeBatch<B>, DatasetError>;

/// A batch of frame windows and their target coordinates.
#[derive(Debug, Clone)]
pub struct GazeBatch<B: Backend> {
    /// `[batch, seq, 1, height, width]`
    pub frames:  Tensor<B, 5>,
    /// `[batch, seq, 2]`
    pub targets: Tensor<B, 3>,
}

#[derive(Clone, Debug)]
pub struct GazeBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> GazeBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn stack(&self, samples: Vec<GazeSample>) -> BatchResult<B> {
        let batch_size = samples.len();
        let first = samples.first().ok_or(DatasetError::EmptyBatch)?;
        let (seq, channels, height, width) = first.frames.dim();

        let frames_flat: Vec<f32> = samples
            .iter()
            .flat_map(|s| s.frames.iter().copied())
            .collect();
        let labels_flat: Vec<f32> = samples
            .iter()
            .flat_map(|s| s.labels.iter().copied())
            .collect();

        let frames = Tensor::<B, 5>::from_data(
            TensorData::new(frames_flat, [batch_size, seq, channels, height, width]),
            &self.device,
        );
        let targets = Tensor::<B, 3>::from_data(
            TensorData::new(labels_flat, [batch_size, seq, 2]),
            &self.device,
        );

        Ok(GazeBatch { frames, targets })
    }
}

impl<B: Backend> Batcher<SampleResult, BatchResult<B>> for GazeBatcher<B> {
    fn batch(&self, items: Vec<SampleResult>) -> BatchResult<B> {
        let samples = items.into_iter().collect::<Result<Vec<_>, _>>()?;
        self.stack(samples)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use ndarray::{Array2, Array4};

    type TestBackend = NdArray<f32>;

    fn sample(value: f32) -> SampleResult {
        Ok(GazeSample {
            frames: Array4::from_elem((3, 1, 2, 2), value),
            labels: Array2::from_elem((3, 2), value / 10.0),
        })
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = GazeBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(1.0), sample(2.0)]).unwrap();

        assert_eq!(batch.frames.dims(), [2, 3, 1, 2, 2]);
        assert_eq!(batch.targets.dims(), [2, 3, 2]);

        let targets = batch.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(targets[0], 0.1);
        assert_eq!(targets[6], 0.2);
    }

    #[test]
    fn test_failed_sample_fails_the_batch() {
        let batcher = GazeBatcher::<TestBackend>::new(Default::default());
        let failed  = Err(DatasetError::IndexOutOfRange { index: 9, len: 3 });
        let result  = batcher.batch(vec![sample(1.0), failed]);
        assert!(matches!(result, Err(DatasetError::IndexOutOfRange { index: 9, .. })));
    }

    #[test]
    fn test_empty_batch() {
        let batcher = GazeBatcher::<TestBackend>::new(Default::default());
        assert!(matches!(batcher.batch(Vec::new()), Err(DatasetError::EmptyBatch)));
    }
}
