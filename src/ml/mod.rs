// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that runs tensors through a model:
//
//   model.rs     — GazeRegressor seam, GazeNet (conv backbone
//                  + state-space scan), Smooth-L1 loss
//
//   trainer.rs   — epoch loop: train, validate, checkpoint the
//                  best model, log, plot
//
//   evaluator.rs — one validation pass: mean loss and pixel
//                  error counts; also scores a saved checkpoint
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Gaze model architecture and loss
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Validation pass and checkpoint scoring
pub mod evaluator;
