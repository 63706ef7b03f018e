// ============================================================
// Layer 4 — Windowing Engine
// ============================================================
// Cuts a per-frame table (labels, or anything else indexed by
// frame) into fixed-length windows according to a WindowPlan.
//
// Input:  [num_samples, cols]
// Output: [num_windows, sequence, cols]
//
// Windows come out chunk-major, offset-minor, in the order
// WindowPlan::start() enumerates, so window i of a label table
// covers exactly the frames the dataset reads for window i.
//
// Example with chunk_size=4, sequence=2, stride=2, 9 rows:
//   chunk 0 → rows 0-1, 2-3
//   chunk 1 → rows 4-5, 6-7
//   row 8 is dropped (incomplete chunk)
//
// Reference: ndarray crate (slicing, stack)

use ndarray::{Array3, ArrayView2};

use crate::domain::window::WindowPlan;

/// Stack every window of `data` described by `plan`.
pub fn create_windows<A: Clone>(data: ArrayView2<A>, plan: &WindowPlan) -> Array3<A> {
    let starts: Vec<usize> = plan.starts(data.nrows()).collect();

    Array3::from_shape_fn(
        (starts.len(), plan.sequence(), data.ncols()),
        |(window, step, col)| data[[starts[window] + step, col]].clone(),
    )
}
