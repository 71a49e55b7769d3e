//! Lock-free per-node arrays.

/// Degree and offset arrays with single-writer slots.
pub mod node_array;

pub use node_array::{AtomicDegrees, AtomicOffsets, UNSET_DEGREE, UNSET_OFFSET};
