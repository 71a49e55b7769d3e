//! Storage collections backing the compressed structures.

pub mod paged;

pub use paged::{PageAllocator, PageArena, PagedBuilder};
