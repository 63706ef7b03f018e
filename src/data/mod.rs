// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from recording ids on disk to device-ready batches.
//
//   train_files.txt / val_files.txt
//       │
//       ▼
//   loader            → recording ids, label files (every 4th line)
//       │
//       ▼
//   windowing         → label windows, chunk-major
//       │
//       ▼
//   GazeDataset       → Burn Dataset; reads frames from the
//       │               archive per access, resize + normalise
//       ▼
//   GazeBatcher       → stacks samples into [N, T, 1, H, W]
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Typed errors for reading recordings
pub mod error;

/// File lists and label files
pub mod loader;

/// Memory-mapped .npy frame archives
pub mod archive;

/// Per-frame resize and normalisation
pub mod preprocessor;

/// Chunked sliding windows over per-frame tables
pub mod windowing;

/// Implements Burn's Dataset trait for gaze samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
