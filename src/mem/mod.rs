//! Memory accounting and up-front memory estimation.

pub mod estimation;
pub mod memory_info;

pub use estimation::{estimate, MemoryEstimate, MemoryRange};
pub use memory_info::{BlockStatistics, MemoryInfo};
