// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything a run writes to disk:
//
//   run.rs        — LOGS_<id>/{logs,plots,models} layout
//
//   checkpoint.rs — best model + optimizer records via Burn's
//                   CompactRecorder, a JSON sidecar with the
//                   epoch and loss, and the TrainConfig so the
//                   evaluate command can rebuild the model
//
//   metrics.rs    — training_log.txt lines and the JSON-lines
//                   metrics sink
//
//   plots.rs      — per-epoch diagnostic PNGs
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Run identifier and output directories
pub mod run;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Per-epoch text log and metrics sink
pub mod metrics;

/// Time-series and frame-grid PNGs
pub mod plots;
