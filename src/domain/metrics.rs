// ============================================================
// Layer 3 — Evaluation Metrics
// ============================================================
// Plain value types for what one epoch produced:
//
//   ErrorCounts  — how many predicted points fall further than
//                  1 / 3 / 5 / 10 pixels from the ground truth
//   EpochMetrics — the record written to the metrics sink
//   BestLoss     — best-so-far validation loss, decides when a
//                  checkpoint is written
//
// Reference: Rust Book §5 (Structs), §8 (Vectors)

use serde::{Deserialize, Serialize};

/// Pixel thresholds used for the error rates, in ascending order.
pub const ERROR_THRESHOLDS_PX: [f32; 4] = [1.0, 3.0, 5.0, 10.0];

/// Euclidean pixel-space distance for every (x, y) pair.
///
/// `targets` and `predictions` are flat `[.., 2]` buffers in normalized
/// coordinates. The first axis of the difference is scaled by `height`
/// and the second by `width` before the norm is taken.
pub fn pixel_distances(
    targets:     &[f32],
    predictions: &[f32],
    height:      usize,
    width:       usize,
) -> Vec<f32> {
    targets
        .chunks_exact(2)
        .zip(predictions.chunks_exact(2))
        .map(|(t, p)| {
            let d0 = (t[0] - p[0]) * height as f32;
            let d1 = (t[1] - p[1]) * width as f32;
            (d0 * d0 + d1 * d1).sqrt()
        })
        .collect()
}

// ─── ErrorCounts ──────────────────────────────────────────────────────────────
/// Counts of points whose pixel error exceeds each threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    pub over_1:  usize,
    pub over_3:  usize,
    pub over_5:  usize,
    pub over_10: usize,
    /// Every sample-timestep seen, whether or not it exceeded a threshold
    pub total:   usize,
}

impl ErrorCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one pixel distance
    pub fn record(&mut self, distance: f32) {
        let [t1, t3, t5, t10] = ERROR_THRESHOLDS_PX;
        self.over_1  += usize::from(distance > t1);
        self.over_3  += usize::from(distance > t3);
        self.over_5  += usize::from(distance > t5);
        self.over_10 += usize::from(distance > t10);
        self.total   += 1;
    }

    pub fn record_all(&mut self, distances: impl IntoIterator<Item = f32>) {
        for d in distances {
            self.record(d);
        }
    }

    /// Error rates as fractions of `total`. All zero when nothing was seen.
    pub fn rates(&self) -> ErrorRates {
        let rate = |n: usize| {
            if self.total == 0 { 0.0 } else { n as f64 / self.total as f64 }
        };
        ErrorRates {
            err_rate_1: rate(self.over_1),
            err_rate_3: rate(self.over_3),
            err_rate_5: rate(self.over_5),
            err_rate:   rate(self.over_10),
        }
    }
}

/// Fractions of points exceeding 1, 3, 5 and 10 pixels.
/// `err_rate` is the 10-pixel rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorRates {
    pub err_rate:   f64,
    pub err_rate_1: f64,
    pub err_rate_3: f64,
    pub err_rate_5: f64,
}

// ─── EpochMetrics ─────────────────────────────────────────────────────────────
/// One structured record per epoch for the experiment-tracking sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
    #[serde(flatten)]
    pub rates:      ErrorRates,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, rates: ErrorRates) -> Self {
        Self { epoch, train_loss, val_loss, rates }
    }
}

// ─── BestLoss ─────────────────────────────────────────────────────────────────
/// Tracks the lowest validation loss seen so far in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestLoss {
    value: f64,
}

impl BestLoss {
    pub fn new() -> Self {
        Self { value: f64::INFINITY }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns true and records `loss` if it is strictly lower than every
    /// loss seen before. NaN never improves.
    pub fn improves(&mut self, loss: f64) -> bool {
        if loss < self.value {
            self.value = loss;
            true
        } else {
            false
        }
    }
}

impl Default for BestLoss {
    fn default() -> Self {
        Self::new()
    }
}
