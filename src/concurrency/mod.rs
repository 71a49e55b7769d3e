//! Concurrency support for the import phase.
//!
//! Nothing in the compression core blocks. Workers own disjoint node ranges
//! ([`partition`]) and write per-node slots of the shared arrays ([`atomic`])
//! with plain relaxed atomics.

pub mod atomic;
pub mod partition;

pub use partition::{compress_partition, range_partitions, NodePartition, RawAdjacency};
#[cfg(feature = "parallel")]
pub use partition::compress_parallel;
