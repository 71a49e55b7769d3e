//! Raw 64-bit property values stored next to the adjacency arenas.
//!
//! Values are kept uncompressed, one word per surviving target and in target
//! order, so a [`PropertyCursor`] can be consumed in lockstep with the
//! adjacency cursor of the same node. Every channel has its own arena and
//! offset array.

use std::sync::Arc;

use crate::collections::paged::{PageAllocator, PageArena, PagedBuilder};
use crate::concurrency::atomic::AtomicOffsets;
use crate::error::Result;

use super::cursor::PropertyCursor;

pub(crate) struct PropertyWriter<'f> {
    pages: Vec<PageAllocator<'f, u64>>,
    offsets: &'f [AtomicOffsets],
}

impl<'f> PropertyWriter<'f> {
    pub(crate) fn new(builders: &'f [PagedBuilder<u64>], offsets: &'f [AtomicOffsets]) -> Self {
        debug_assert_eq!(builders.len(), offsets.len());
        Self {
            pages: builders.iter().map(PagedBuilder::allocator).collect(),
            offsets,
        }
    }

    /// Copies one aggregated value list per channel and claims the offsets of `node`.
    pub(crate) fn write(&mut self, node: usize, properties: &[Vec<u64>]) -> Result<()> {
        for ((pages, offsets), values) in self.pages.iter_mut().zip(self.offsets).zip(properties) {
            let (address, slot) = pages.allocate(values.len())?;
            slot.copy_from_slice(values);
            offsets.claim(node, address);
        }
        Ok(())
    }
}

/// One property channel written by one codec.
#[derive(Debug)]
pub struct PropertyStore {
    arena: PageArena<u64>,
    offsets: Arc<[u64]>,
    degrees: Arc<[u32]>,
}

impl PropertyStore {
    pub(crate) fn new(arena: PageArena<u64>, offsets: Arc<[u64]>, degrees: Arc<[u32]>) -> Self {
        Self {
            arena,
            offsets,
            degrees,
        }
    }

    /// Values of `node`, one per target.
    pub fn values(&self, node: u64) -> &[u64] {
        let degree = self.degrees[node as usize] as usize;
        if degree == 0 {
            return &[];
        }
        &self.arena.slice_from(self.offsets[node as usize])[..degree]
    }

    /// Cursor over the values of `node`.
    pub fn property_cursor(&self, node: u64, fallback_value: f64) -> PropertyCursor<'_> {
        PropertyCursor::new(self.values(node), fallback_value)
    }

    /// Bytes held by value pages.
    pub fn size_in_bytes(&self) -> u64 {
        self.arena.size_in_bytes()
    }

    /// Pages of the value arena.
    pub fn page_count(&self) -> usize {
        self.arena.page_count()
    }
}
