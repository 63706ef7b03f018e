// ============================================================
// Layer 4 — Gaze Sequence Dataset
// ============================================================
// Maps a flat sample index onto (recording, window) and builds
// one training sample on every access:
//
//   file_index   = index / interval
//   sample_index = index % interval
//
//   frames → [seq, 1, H, W]  resized + normalised per frame
//   labels → [seq, 2]        x / W / 8, y / H / 8
//
// `interval` is the number of windows in one chunk, computed once
// from the plan; every recording contributes exactly `interval`
// samples, so len = recordings * interval.
//
// Labels are loaded eagerly at construction (they are small) and
// windowed per recording with the same WindowPlan the frames use.
// Frames are read from the archive on every access; nothing is
// cached between calls.
//
// Reference: Burn Book §4 (Datasets)
//            ndarray crate

use burn::data::dataset::Dataset;
use ndarray::{Array2, Array3, Array4, Axis};
use std::path::PathBuf;

use crate::data::{
    archive::FrameArchive,
    error::DatasetError,
    loader::read_label_file,
    preprocessor::FramePreprocessor,
    windowing::create_windows,
};
use crate::domain::window::WindowPlan;

/// Fixed divisor applied to labels after dividing by the frame size
pub const LABEL_SCALE: f32 = 8.0;

/// What the dataset hands to the data loader: a sample, or the reason
/// it could not be built.
pub type SampleResult = Result<GazeSample, DatasetError>;

/// One window of frames with its per-frame gaze labels.
#[derive(Debug, Clone)]
pub struct GazeSample {
    /// `[seq, 1, H, W]`
    pub frames: Array4<f32>,
    /// `[seq, 2]`, normalised (x, y)
    pub labels: Array2<f32>,
}

/// A recording's archive path plus its windowed labels.
struct Recording {
    archive:       PathBuf,
    label_path:    PathBuf,
    label_count:   usize,
    /// `[windows, seq, 2]` in raw pixel units
    label_windows: Array3<f32>,
}

pub struct GazeDataset {
    recordings:   Vec<Recording>,
    plan:         WindowPlan,
    preprocessor: FramePreprocessor,
    interval:     usize,
}

impl GazeDataset {
    /// Build a dataset over parallel archive / label lists.
    ///
    /// Both lists are sorted by path before pairing. Every label file is
    /// read and windowed here; a recording with less than one full chunk
    /// of labels is rejected.
    pub fn new(
        mut archives:    Vec<PathBuf>,
        mut label_files: Vec<PathBuf>,
        plan:            WindowPlan,
        preprocessor:    FramePreprocessor,
    ) -> Result<Self, DatasetError> {
        archives.sort();
        label_files.sort();

        if archives.len() != label_files.len() {
            return Err(DatasetError::format(
                label_files.first().cloned().unwrap_or_default(),
                format!("{} archives but {} label files", archives.len(), label_files.len()),
            ));
        }

        let interval = plan.windows_per_chunk();
        let mut recordings = Vec::with_capacity(archives.len());

        for (archive, label_path) in archives.into_iter().zip(label_files) {
            let labels        = read_label_file(&label_path)?;
            let label_count   = labels.nrows();
            let label_windows = create_windows(labels.view(), &plan);

            if label_windows.len_of(Axis(0)) < interval {
                return Err(DatasetError::format(
                    &label_path,
                    format!(
                        "{label_count} labelled frames is less than one chunk of {}",
                        plan.chunk_size()
                    ),
                ));
            }

            tracing::debug!(
                "'{}': {} labels, {} label windows",
                label_path.display(),
                label_count,
                label_windows.len_of(Axis(0))
            );

            recordings.push(Recording { archive, label_path, label_count, label_windows });
        }

        Ok(Self { recordings, plan, preprocessor, interval })
    }

    /// Windows contributed by each recording
    pub fn interval(&self) -> usize { self.interval }

    pub fn recording_count(&self) -> usize { self.recordings.len() }

    /// recordings * interval
    pub fn sample_count(&self) -> usize {
        self.recordings.len() * self.interval
    }

    /// (file_index, sample_index) for a flat index
    pub fn locate(&self, index: usize) -> Result<(usize, usize), DatasetError> {
        let len = self.sample_count();
        if index >= len {
            return Err(DatasetError::IndexOutOfRange { index, len });
        }
        Ok((index / self.interval, index % self.interval))
    }

    /// Build the sample at `index`, reading its frames from disk.
    pub fn sample(&self, index: usize) -> SampleResult {
        let (file_index, sample_index) = self.locate(index)?;
        let recording = &self.recordings[file_index];
        let seq       = self.plan.sequence();

        // ── Frames ────────────────────────────────────────────────────────────
        let archive = FrameArchive::open(&recording.archive)?;
        let stack   = archive.frames()?;

        let frame_chunks = self.plan.chunk_count(stack.len());
        let label_chunks = self.plan.chunk_count(recording.label_count);
        if frame_chunks != label_chunks {
            return Err(DatasetError::FrameLabelMismatch {
                path: recording.archive.clone(),
                frame_chunks,
                label_chunks,
            });
        }

        let start = self.plan.start(sample_index);
        let raw   = stack.window(start, seq);

        let (height, width) = (self.preprocessor.height(), self.preprocessor.width());
        let mut frames = Array4::<f32>::zeros((seq, 1, height, width));
        for (raw_frame, mut out) in raw.outer_iter().zip(frames.outer_iter_mut()) {
            let prepared = self.preprocessor.prepare(raw_frame, archive.path())?;
            out.index_axis_mut(Axis(0), 0).assign(&prepared);
        }

        // ── Labels ────────────────────────────────────────────────────────────
        let mut labels = recording
            .label_windows
            .index_axis(Axis(0), sample_index)
            .to_owned();
        labels.column_mut(0).mapv_inplace(|x| x / width as f32 / LABEL_SCALE);
        labels.column_mut(1).mapv_inplace(|y| y / height as f32 / LABEL_SCALE);

        tracing::trace!(
            "sample {} → '{}' window {} (frames {}..{}, labels '{}')",
            index,
            recording.archive.display(),
            sample_index,
            start,
            start + seq,
            recording.label_path.display()
        );

        Ok(GazeSample { frames, labels })
    }
}

/// Burn's DataLoader calls get(index) for index in 0..len().
impl Dataset<SampleResult> for GazeDataset {
    fn get(&self, index: usize) -> Option<SampleResult> {
        (index < self.sample_count()).then(|| self.sample(index))
    }

    fn len(&self) -> usize {
        self.sample_count()
    }
}
