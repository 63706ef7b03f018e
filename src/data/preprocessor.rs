// ============================================================
// Layer 4 — Frame Preprocessor
// ============================================================
// Prepares one raw event frame for the model:
//
//   1. Resize to the configured (height, width) with a bilinear
//      (triangle) filter, deterministic for a given input
//   2. Standardise to zero mean / unit variance over the frame
//
// normalize() is exposed on its own because it is a pure
// function with its own contract:
//
//   (x - mean) / (std + 1e-10)   unless std == 0,
//   in which case the input is returned unchanged.
//
// The std is the population std (ddof = 0).
//
// Reference: image crate (imageops::resize)
//            ndarray crate (mean / std)

use image::{imageops::FilterType, ImageBuffer, Luma};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};
use std::path::Path;

use crate::data::error::DatasetError;

/// Added to the std so near-constant frames do not blow up
pub const NORMALIZE_EPSILON: f32 = 1e-10;

/// Standardise `data` over all of its elements.
pub fn normalize<S, D>(data: &ArrayBase<S, D>) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let Some(mean) = data.mean() else {
        return data.to_owned();
    };
    let std = data.std(0.0);

    // Constant frame: nothing to standardise
    if std == 0.0 {
        return data.to_owned();
    }

    data.mapv(|x| (x - mean) / (std + NORMALIZE_EPSILON))
}

/// Resizes and normalises frames to a fixed model input size.
#[derive(Debug, Clone, Copy)]
pub struct FramePreprocessor {
    height: usize,
    width:  usize,
}

impl FramePreprocessor {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn height(&self) -> usize { self.height }

    pub fn width(&self) -> usize { self.width }

    /// Resize then normalise a single frame. `source` names the archive
    /// in error messages.
    pub fn prepare(&self, frame: ArrayView2<f32>, source: &Path) -> Result<Array2<f32>, DatasetError> {
        let resized = self.resize(frame, source)?;
        Ok(normalize(&resized))
    }

    /// Bilinear resize to (height, width), keeping the frame's value range.
    ///
    /// image's f32 filters clamp to [0, 1], so the frame is min-max mapped
    /// into that range, resized, and mapped back.
    pub fn resize(&self, frame: ArrayView2<f32>, source: &Path) -> Result<Array2<f32>, DatasetError> {
        let (src_h, src_w) = frame.dim();
        if (src_h, src_w) == (self.height, self.width) {
            return Ok(frame.to_owned());
        }

        let (lo, hi) = frame
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = hi - lo;

        // Constant (or empty) frame resizes to itself
        if !(range > 0.0) {
            let fill = if lo.is_finite() { lo } else { 0.0 };
            return Ok(Array2::from_elem((self.height, self.width), fill));
        }

        let pixels: Vec<f32> = frame.iter().map(|&v| (v - lo) / range).collect();
        let image = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(src_w as u32, src_h as u32, pixels)
            .ok_or_else(|| {
                DatasetError::format(source, format!("frame of {src_h}x{src_w} has an inconsistent buffer"))
            })?;

        let resized = image::imageops::resize(
            &image,
            self.width as u32,
            self.height as u32,
            FilterType::Triangle,
        );

        let unit = Array2::from_shape_vec((self.height, self.width), resized.into_raw())
            .map_err(|e| DatasetError::format(source, format!("resized frame: {e}")))?;
        Ok(unit.mapv(|v| v * range + lo))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    #[test]
    fn test_normalized_has_zero_mean_unit_std() {
        let data  = Array1::from_iter((0..200).map(|i| ((i * 37) % 101) as f32));
        let out   = normalize(&data);
        assert_abs_diff_eq!(out.mean().unwrap(), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out.std(0.0), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_constant_input_is_returned_unchanged() {
        let data = Array2::from_elem((4, 5), 7.5f32);
        assert_eq!(normalize(&data), data);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let data = array![[0.0f32, 1.0], [4.0, 9.0]];
        assert_eq!(normalize(&data), normalize(&data));
    }

    #[test]
    fn test_empty_input() {
        let data = Array1::<f32>::zeros(0);
        assert_eq!(normalize(&data).len(), 0);
    }

    #[test]
    fn test_resize_changes_shape() {
        let prep  = FramePreprocessor::new(3, 4);
        let frame = Array2::from_shape_fn((6, 8), |(r, c)| (r * 8 + c) as f32);
        let out   = prep.resize(frame.view(), Path::new("test.npy")).unwrap();
        assert_eq!(out.dim(), (3, 4));
    }

    #[test]
    fn test_resize_of_constant_frame_stays_constant() {
        let prep  = FramePreprocessor::new(5, 5);
        let frame = Array2::from_elem((10, 20), 2.0f32);
        let out   = prep.resize(frame.view(), Path::new("test.npy")).unwrap();
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_resize_keeps_pixel_scale() {
        // Left half 0, right half 200, as in an 8-bit event frame
        let prep  = FramePreprocessor::new(60, 80);
        let frame = Array2::from_shape_fn((120, 160), |(_, c)| if c < 80 { 0.0 } else { 200.0 });
        let out   = prep.resize(frame.view(), Path::new("test.npy")).unwrap();

        assert_abs_diff_eq!(out[[30, 0]], 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out[[30, 79]], 200.0, epsilon = 1e-2);
        let max = out.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert_abs_diff_eq!(max, 200.0, epsilon = 1e-2);
    }

    #[test]
    fn test_resize_keeps_negative_values() {
        let prep  = FramePreprocessor::new(2, 2);
        let frame = Array2::from_shape_fn((4, 4), |(r, _)| if r < 2 { -50.0 } else { 30.0 });
        let out   = prep.resize(frame.view(), Path::new("test.npy")).unwrap();
        // Rows blend across the edge, but keep their sign and scale
        assert!(out[[0, 0]] < -30.0, "{}", out[[0, 0]]);
        assert!(out[[1, 1]] > 10.0, "{}", out[[1, 1]]);
    }

    #[test]
    fn test_prepare_normalizes_resized_frame() {
        let prep  = FramePreprocessor::new(4, 4);
        let frame = Array2::from_shape_fn((8, 8), |(r, c)| (r * c) as f32);
        let out   = prep.prepare(frame.view(), Path::new("test.npy")).unwrap();
        assert_abs_diff_eq!(out.mean().unwrap(), 0.0, epsilon = 1e-5);
    }
}
