// ============================================================
// Layer 3 — Window Plan
// ============================================================
// Describes how a long recording is cut into fixed-length
// training windows.
//
// A recording of N frames is first split into chunks of
// `chunk_size` frames (the remainder is dropped). Windows of
// `sequence` frames are then taken inside each chunk, one every
// `stride` frames, and never cross a chunk boundary.
//
// Example with chunk_size=6, sequence=3, stride=2, N=13:
//   chunks:  [0..6) [6..12)        (frame 12 dropped)
//   windows: 0..3  2..5            (chunk 0)
//            6..9  8..11           (chunk 1)
//
// Windows are enumerated chunk-major, offset-minor. Frames and
// labels are both addressed through `start()`, so a window index
// always means the same frame span for both.
//
// Reference: Rust Book §5 (Structs and Methods)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Chunk size, window length and stride for one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPlan {
    chunk_size: usize,
    sequence:   usize,
    stride:     usize,
}

impl WindowPlan {
    /// Build a plan. Fails if the window cannot fit in a chunk or the
    /// stride is zero.
    pub fn new(chunk_size: usize, sequence: usize, stride: usize) -> Result<Self> {
        ensure!(stride > 0, "window stride must be positive");
        ensure!(sequence > 0, "window length must be positive");
        ensure!(
            sequence <= chunk_size,
            "window length ({}) must not exceed chunk size ({})",
            sequence,
            chunk_size
        );
        Ok(Self { chunk_size, sequence, stride })
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }

    pub fn sequence(&self) -> usize { self.sequence }

    /// Windows inside one chunk: floor((chunk_size - sequence) / stride) + 1
    pub fn windows_per_chunk(&self) -> usize {
        (self.chunk_size - self.sequence) / self.stride + 1
    }

    /// Number of complete chunks in a recording of `num_frames` frames
    pub fn chunk_count(&self, num_frames: usize) -> usize {
        num_frames / self.chunk_size
    }

    /// Total number of windows a recording of `num_frames` frames yields
    pub fn window_count(&self, num_frames: usize) -> usize {
        self.chunk_count(num_frames) * self.windows_per_chunk()
    }

    /// First frame of the `window`-th window (chunk-major enumeration)
    pub fn start(&self, window: usize) -> usize {
        let per_chunk = self.windows_per_chunk();
        let chunk     = window / per_chunk;
        let offset    = (window % per_chunk) * self.stride;
        chunk * self.chunk_size + offset
    }

    /// All window start positions for a recording of `num_frames` frames
    pub fn starts(&self, num_frames: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.window_count(num_frames)).map(move |w| self.start(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_for_default_training_plan() {
        let plan = WindowPlan::new(500, 40, 1).unwrap();
        assert_eq!(plan.windows_per_chunk(), 461);
    }

    #[test]
    fn test_validation_stride_gives_non_overlapping_windows() {
        // (500 - 40) / 40 + 1 = 12
        let plan = WindowPlan::new(500, 40, 40).unwrap();
        assert_eq!(plan.windows_per_chunk(), 12);
        assert_eq!(plan.start(11), 440);
        assert_eq!(plan.start(12), 500);
    }

    #[test]
    fn test_remainder_frames_are_dropped() {
        let plan = WindowPlan::new(6, 3, 2).unwrap();
        assert_eq!(plan.chunk_count(13), 2);
        let starts: Vec<usize> = plan.starts(13).collect();
        assert_eq!(starts, vec![0, 2, 6, 8]);
    }

    #[test]
    fn test_no_window_crosses_a_chunk() {
        for (chunk, seq, stride) in [(10, 3, 1), (10, 3, 4), (7, 7, 2), (9, 2, 3)] {
            let plan = WindowPlan::new(chunk, seq, stride).unwrap();
            for start in plan.starts(5 * chunk + 3) {
                assert_eq!(start / chunk, (start + seq - 1) / chunk);
            }
        }
    }

    #[test]
    fn test_short_recording_has_no_windows() {
        let plan = WindowPlan::new(500, 40, 1).unwrap();
        assert_eq!(plan.window_count(499), 0);
    }

    #[test]
    fn test_rejects_bad_plans() {
        assert!(WindowPlan::new(10, 11, 1).is_err());
        assert!(WindowPlan::new(10, 5, 0).is_err());
        assert!(WindowPlan::new(10, 0, 1).is_err());
    }
}
