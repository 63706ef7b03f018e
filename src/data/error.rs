// ============================================================
// Layer 4 — Dataset Errors
// ============================================================
// Every way reading a recording can fail. None of these are
// retried: they travel through the data loader inside the item
// type and abort the run at the training loop.
//
// The enum is Clone because burn's DataLoader clones items;
// io::Error is not, so it is kept behind an Arc.

use std::{path::PathBuf, sync::Arc};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DatasetError {
    /// Missing or unreadable archive / label file
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A label line that is not exactly two floats
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path:    PathBuf,
        line:    usize,
        message: String,
    },

    /// Structurally wrong data (bad array shape, too few frames, ...)
    #[error("malformed data in '{}': {message}", .path.display())]
    Format {
        path:    PathBuf,
        message: String,
    },

    /// Frame archive and label file disagree on how many chunks exist
    #[error(
        "'{}' has {frame_chunks} frame chunk(s) but its labels have {label_chunks}",
        .path.display()
    )]
    FrameLabelMismatch {
        path:         PathBuf,
        frame_chunks: usize,
        label_chunks: usize,
    },

    #[error("index {index} is out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot build a batch from zero samples")]
    EmptyBatch,
}

impl DatasetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io { path: path.into(), source: Arc::new(source) }
    }

    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DatasetError::Format { path: path.into(), message: message.into() }
    }
}
