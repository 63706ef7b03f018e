// ============================================================
// Layer 4 — Frame Archive
// ============================================================
// One archive per recording: a NumPy .npy array holding every
// rendered event frame in order.
//
//   shape  [N, 1, H0, W0]   (channel axis kept)
//      or  [N, H0, W0]
//   dtype  float32 or uint8, little-endian
//
// The file is memory-mapped and viewed in place, so reading a
// window of `seq` frames only touches those frames' pages.
// Archives are opened per access and dropped right after; no
// handle is shared between data-loader workers.
//
// Reference: ndarray-npy crate (ViewNpyExt)
//            memmap2 crate

use memmap2::Mmap;
use ndarray::{s, Array3, ArrayView3, ArrayViewD, Axis, Ix3};
use ndarray_npy::{ViewElement, ViewNpyExt};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::data::error::DatasetError;

/// A read-only, memory-mapped frame archive.
pub struct FrameArchive {
    path: PathBuf,
    mmap: Mmap,
}

impl FrameArchive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| DatasetError::io(&path, e))?;

        // SAFETY: archives are immutable inputs; nothing writes to them
        // while a run is reading.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| DatasetError::io(&path, e))?;

        Ok(Self { path, mmap })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// View the archive as a `[N, H0, W0]` frame stack.
    pub fn frames(&self) -> Result<FrameStack<'_>, DatasetError> {
        if let Ok(view) = ArrayViewD::<f32>::view_npy(&self.mmap) {
            return Ok(FrameStack::F32(self.as_stack(view)?));
        }
        match ArrayViewD::<u8>::view_npy(&self.mmap) {
            Ok(view) => Ok(FrameStack::U8(self.as_stack(view)?)),
            Err(e)   => Err(DatasetError::format(
                &self.path,
                format!("not a float32/uint8 .npy frame array: {e}"),
            )),
        }
    }

    /// Drop a singleton channel axis and check the result is 3-D.
    fn as_stack<'a, A: ViewElement>(&self, view: ArrayViewD<'a, A>) -> Result<ArrayView3<'a, A>, DatasetError> {
        let shape = view.shape().to_vec();
        let view = match shape.as_slice() {
            [_, 1, _, _] => view.index_axis_move(Axis(1), 0),
            [_, _, _]    => view,
            _ => {
                return Err(DatasetError::format(
                    &self.path,
                    format!("expected [N, 1, H, W] or [N, H, W] frames, got {shape:?}"),
                ))
            }
        };
        view.into_dimensionality::<Ix3>()
            .map_err(|e| DatasetError::format(&self.path, e.to_string()))
    }
}

/// Borrowed frames of one archive, in their stored element type.
pub enum FrameStack<'a> {
    F32(ArrayView3<'a, f32>),
    U8(ArrayView3<'a, u8>),
}

impl FrameStack<'_> {
    /// Number of frames in the archive
    pub fn len(&self) -> usize {
        match self {
            FrameStack::F32(v) => v.len_of(Axis(0)),
            FrameStack::U8(v)  => v.len_of(Axis(0)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy frames `[start, start + len)` out as float32.
    /// The caller guarantees the range is inside the archive.
    pub fn window(&self, start: usize, len: usize) -> Array3<f32> {
        match self {
            FrameStack::F32(v) => v.slice(s![start..start + len, .., ..]).to_owned(),
            FrameStack::U8(v)  => v.slice(s![start..start + len, .., ..]).mapv(f32::from),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array4};
    use ndarray_npy::WriteNpyExt;

    fn write_npy<T: WriteNpyExt>(array: &T) -> tempfile::NamedTempFile {
        let f = tempfile::NamedTempFile::new().unwrap();
        array.write_npy(f.reopen().unwrap()).unwrap();
        f
    }

    #[test]
    fn test_reads_channel_first_float_frames() {
        let frames  = Array4::from_shape_fn((6, 1, 2, 3), |(n, _, r, c)| (n * 100 + r * 10 + c) as f32);
        let f       = write_npy(&frames);
        let archive = FrameArchive::open(f.path()).unwrap();
        let stack   = archive.frames().unwrap();

        assert_eq!(stack.len(), 6);
        let w = stack.window(2, 3);
        assert_eq!(w.dim(), (3, 2, 3));
        assert_eq!(w[[0, 1, 2]], 212.0);
        assert_eq!(w[[2, 0, 0]], 400.0);
    }

    #[test]
    fn test_reads_u8_frames_without_channel_axis() {
        let frames  = Array3::from_shape_fn((4, 2, 2), |(n, _, _)| n as u8 * 50);
        let f       = write_npy(&frames);
        let archive = FrameArchive::open(f.path()).unwrap();
        let w       = archive.frames().unwrap().window(3, 1);
        assert_eq!(w[[0, 1, 1]], 150.0);
    }

    #[test]
    fn test_rejects_wrong_rank() {
        let frames  = ndarray::Array2::<f32>::zeros((4, 4));
        let f       = write_npy(&frames);
        let archive = FrameArchive::open(f.path()).unwrap();
        assert!(matches!(archive.frames(), Err(DatasetError::Format { .. })));
    }

    #[test]
    fn test_missing_archive_is_io_error() {
        let err = FrameArchive::open("/no/such/archive.npy").err().unwrap();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
