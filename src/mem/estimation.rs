//! Up-front memory estimation for a compressed relationship type.
//!
//! Bounds are derived from counts only, before any data is seen. Compressed
//! target sizes depend on the gap distribution, so they are reported as a
//! range: at least one byte per relationship for delta-varint and nothing for
//! packed blocks, at most the encoding of the widest possible gap for every
//! relationship.

use serde::{Deserialize, Serialize};

use crate::config::{CompressionConfig, CompressionStrategy, BLOCK_SIZE};
use crate::graph::compressed::varint;

/// Inclusive byte range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRange {
    /// Lower bound in bytes.
    pub min: u64,
    /// Upper bound in bytes.
    pub max: u64,
}

impl MemoryRange {
    /// A range with equal bounds.
    #[inline]
    pub const fn of(bytes: u64) -> Self {
        Self { min: bytes, max: bytes }
    }

    /// A range with the given bounds.
    #[inline]
    pub const fn between(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self {
            min: self.min.saturating_add(other.min),
            max: self.max.saturating_add(other.max),
        }
    }

    /// Smallest range containing both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Per-component estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEstimate {
    /// One `u32` per node.
    pub degrees: MemoryRange,
    /// One `u64` per node.
    pub adjacency_offsets: MemoryRange,
    /// Encoded targets.
    pub targets: MemoryRange,
    /// One `u64` per node and property.
    pub property_offsets: MemoryRange,
    /// One `u64` per relationship and property.
    pub property_values: MemoryRange,
    /// Block width headers of packed lists.
    pub packed_headers: MemoryRange,
}

impl MemoryEstimate {
    /// Sum of all components.
    pub fn total(&self) -> MemoryRange {
        [
            self.adjacency_offsets,
            self.targets,
            self.property_offsets,
            self.property_values,
            self.packed_headers,
        ]
        .into_iter()
        .fold(self.degrees, MemoryRange::add)
    }
}

fn varlong_targets(node_count: u64, relationships: u64) -> MemoryRange {
    let widest_gap = node_count.saturating_sub(1).max(1);
    MemoryRange::between(
        relationships,
        relationships.saturating_mul(varint::encoded_len(widest_gap) as u64),
    )
}

fn packed_targets(node_count: u64, relationships: u64) -> MemoryRange {
    let widest_gap = node_count.saturating_sub(1).max(1);
    let bits = u64::from(u64::BITS - widest_gap.leading_zeros());
    // every list may pad its last block to a full one
    let padded = relationships.saturating_add(node_count.min(relationships).saturating_mul(BLOCK_SIZE as u64 - 1));
    // duplicates kept without aggregation are zero gaps, which pack into zero words
    MemoryRange::between(0, padded.saturating_mul(bits).div_ceil(8))
}

fn packed_headers(packed_lists: u64, relationships: u64) -> MemoryRange {
    let blocks = relationships.div_ceil(BLOCK_SIZE as u64);
    // header words round up to eight bytes per list
    MemoryRange::between(0, blocks.saturating_add(packed_lists.saturating_mul(8)))
}

/// Estimates the memory of compressing `relationship_count` relationships over
/// `node_count` nodes with `config`.
///
/// Every bound is non-decreasing in both counts.
pub fn estimate(node_count: u64, relationship_count: u64, config: &CompressionConfig) -> MemoryEstimate {
    let properties = config.property_count() as u64;
    let n = node_count;
    let m = relationship_count;

    let (targets, packed_headers) = match config.strategy {
        CompressionStrategy::DeltaVarint => (varlong_targets(n, m), MemoryRange::default()),
        CompressionStrategy::Packed => (packed_targets(n, m), packed_headers(n.min(m), m)),
        CompressionStrategy::Mixed => {
            let packed_lists = n.min(m / (config.packing_threshold as u64 + 1));
            (
                varlong_targets(n, m).union(packed_targets(n, m)),
                packed_headers(packed_lists, m),
            )
        }
    };

    MemoryEstimate {
        degrees: MemoryRange::of(n.saturating_mul(4)),
        adjacency_offsets: MemoryRange::of(n.saturating_mul(8)),
        targets,
        property_offsets: MemoryRange::of(n.saturating_mul(8).saturating_mul(properties)),
        property_values: MemoryRange::of(m.saturating_mul(8).saturating_mul(properties)),
        packed_headers,
    }
}
