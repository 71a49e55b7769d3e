//! Per-node atomic arrays shared by all compressors of one factory.
//!
//! Every slot has exactly one writer: the thread whose partition contains the
//! node. Slots start at a sentinel ([`UNSET_DEGREE`], [`UNSET_OFFSET`]) and are
//! taken with a relaxed compare-exchange, so a node reaching two compressors is
//! caught at the second write instead of silently overwriting the first. The
//! degree slot is claimed for every node, empty lists included.
//!
//! After the build barrier the arrays are frozen into plain boxed slices.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Sentinel for an offset slot nobody has written.
pub const UNSET_OFFSET: u64 = u64::MAX;

/// Sentinel for a degree slot nobody has written. Frozen as zero.
pub const UNSET_DEGREE: u32 = u32::MAX;

#[cold]
#[inline(never)]
fn compressed_twice(node: usize, existing: u64, new: u64, slot: &str) -> ! {
    panic!("node {node} was compressed twice (existing {slot} {existing}, new {slot} {new})");
}

/// Post-aggregation degree per node.
pub struct AtomicDegrees {
    inner: Box<[AtomicU32]>,
}

impl AtomicDegrees {
    /// All degrees start unset.
    pub fn new(node_count: usize) -> Self {
        Self {
            inner: (0..node_count).map(|_| AtomicU32::new(UNSET_DEGREE)).collect(),
        }
    }

    /// Number of slots.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether there are no slots.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Records the degree of `node`, zero included.
    ///
    /// # Panics
    /// Panics if the slot was already written: the node was compressed twice.
    #[inline]
    pub fn claim(&self, node: usize, degree: u32) {
        assert_ne!(degree, UNSET_DEGREE, "degree of node {node} collides with the unset sentinel");
        if let Err(previous) =
            self.inner[node].compare_exchange(UNSET_DEGREE, degree, Ordering::Relaxed, Ordering::Relaxed)
        {
            compressed_twice(node, u64::from(previous), u64::from(degree), "degree");
        }
    }

    /// Drops atomicity once no writer can exist anymore. Unset slots become zero.
    pub fn freeze(self) -> Box<[u32]> {
        self.inner
            .into_vec()
            .into_iter()
            .map(|slot| match slot.into_inner() {
                UNSET_DEGREE => 0,
                degree => degree,
            })
            .collect()
    }
}

/// Address of a node's encoded region in some arena.
pub struct AtomicOffsets {
    inner: Box<[AtomicU64]>,
}

impl AtomicOffsets {
    /// All offsets start unset.
    pub fn new(node_count: usize) -> Self {
        Self {
            inner: (0..node_count).map(|_| AtomicU64::new(UNSET_OFFSET)).collect(),
        }
    }

    /// Number of slots.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether there are no slots.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Records `offset` for `node`.
    ///
    /// # Panics
    /// Panics if the slot was already written: two writers compressed the same node.
    #[inline]
    pub fn claim(&self, node: usize, offset: u64) {
        debug_assert_ne!(offset, UNSET_OFFSET);
        if let Err(previous) =
            self.inner[node].compare_exchange(UNSET_OFFSET, offset, Ordering::Relaxed, Ordering::Relaxed)
        {
            compressed_twice(node, previous, offset, "offset");
        }
    }

    /// Drops atomicity once no writer can exist anymore.
    pub fn freeze(self) -> Box<[u64]> {
        self.inner.into_vec().into_iter().map(AtomicU64::into_inner).collect()
    }
}
