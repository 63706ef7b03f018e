// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training loop reports to these seams instead of to
// concrete files, so tests can swap in an in-memory sink.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::metrics::EpochMetrics;

// ─── MetricsSink ──────────────────────────────────────────────────────────────
/// Experiment-tracking destination for per-epoch metric records.
///
/// Implementations:
///   - JsonlMetricsSink → appends one JSON object per line
///   - MemorySink (tests) → keeps records in a Vec
pub trait MetricsSink {
    /// Emit one structured record for a finished epoch.
    fn log(&mut self, metrics: &EpochMetrics) -> Result<()>;
}
