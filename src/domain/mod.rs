// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing what the system works
// with: window plans, evaluation metrics, and the metrics sink.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Chunk / window arithmetic shared by frames and labels
pub mod window;

// Error counts, epoch records, best-loss tracking
pub mod metrics;

// Core abstractions (traits) that other layers implement
pub mod traits;
