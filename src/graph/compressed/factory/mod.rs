//! Factory that owns the shared build state and hands out per-thread compressors.
//!
//! Lifecycle:
//!
//! ```text
//! new ──> Uninitialized ──init()──> Initialized ──create_compressor()──> Compressing
//!                                        │                                   │
//!                                        └──────────── build(self) <─────────┘
//! ```
//!
//! `build` takes the factory by value. Every compressor borrows the factory, so
//! the borrow checker guarantees that all compressors are gone (and have handed
//! their pages and statistics back) before the structure is finalized. Nothing
//! can be compressed after `build`.
//!
//! Shared state is written without locks:
//! - degree and offset slots have one writer per node, enforced by a
//!   compare-exchange on each slot;
//! - the relationship counter is a cache-padded atomic accumulator;
//! - arena pages are owned by one allocator each and only reach the shared
//!   page list, behind a mutex, when a compressor is dropped.

use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

use crate::collections::paged::{PageArena, PagedBuilder};
use crate::concurrency::atomic::{AtomicDegrees, AtomicOffsets};
use crate::config::{CompressionConfig, CompressionStrategy};
use crate::error::{CompressionError, Result};
use crate::mem::BlockStatistics;

use super::mixed::{MixedAdjacencyList, MixedAdjacencyProperties, MixedCompressor};
use super::packed::{PackedAdjacencyList, PackedCompressor};
use super::properties::PropertyStore;
use super::varlong::{DeltaVarintAdjacencyList, DeltaVarintCompressor};

mod relationships;

pub use relationships::{AdjacencyList, AdjacencyProperties, CompressedRelationships};

/// Allocation statistics gathered by one codec's writers.
#[derive(Debug, Clone, Default)]
pub(crate) struct CodecStats {
    pub(crate) allocations: BlockStatistics,
    pub(crate) header_bits: BlockStatistics,
    pub(crate) header_allocations: BlockStatistics,
}

impl CodecStats {
    pub(crate) fn merge(&mut self, other: &Self) {
        self.allocations.merge(&other.allocations);
        self.header_bits.merge(&other.header_bits);
        self.header_allocations.merge(&other.header_allocations);
    }
}

/// Per-node arrays and counters every compressor writes into.
pub(crate) struct SharedArrays {
    pub(crate) degrees: AtomicDegrees,
    pub(crate) offsets: AtomicOffsets,
    pub(crate) property_offsets: Vec<AtomicOffsets>,
    relationship_count: CachePadded<AtomicU64>,
}

impl SharedArrays {
    fn new(node_count: usize, property_count: usize) -> Self {
        Self {
            degrees: AtomicDegrees::new(node_count),
            offsets: AtomicOffsets::new(node_count),
            property_offsets: (0..property_count).map(|_| AtomicOffsets::new(node_count)).collect(),
            relationship_count: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Slot index of `node`.
    ///
    /// # Panics
    /// Panics if `node` is not below the node count.
    #[inline]
    pub(crate) fn index(&self, node: u64) -> usize {
        let index = usize::try_from(node).unwrap_or(usize::MAX);
        assert!(
            index < self.degrees.len(),
            "node {node} is out of range for {} nodes",
            self.degrees.len()
        );
        index
    }

    /// Publishes the degree of a node whose pages were all written.
    ///
    /// Called last, so a node whose write failed still reads as empty.
    ///
    /// # Panics
    /// Panics if the node was already compressed, even with degree zero.
    #[inline]
    pub(crate) fn record(&self, index: usize, degree: usize) {
        self.degrees.claim(index, degree as u32);
        self.relationship_count.fetch_add(degree as u64, Ordering::Relaxed);
    }
}

/// Arenas of one codec: adjacency pages, one value arena per property, statistics.
pub(crate) struct CodecBuilders<T> {
    pub(crate) adjacency: PagedBuilder<T>,
    pub(crate) properties: Vec<PagedBuilder<u64>>,
    pub(crate) stats: Mutex<CodecStats>,
}

impl<T: Copy + Default> CodecBuilders<T> {
    fn new(adjacency_shift: u32, property_shift: u32, property_count: usize) -> Self {
        Self {
            adjacency: PagedBuilder::new(adjacency_shift),
            properties: (0..property_count).map(|_| PagedBuilder::new(property_shift)).collect(),
            stats: Mutex::new(CodecStats::default()),
        }
    }

    /// Collects pages, optionally reordering those of the nodes `include` selects.
    fn finish(
        self,
        offsets: &mut [u64],
        property_offsets: &mut [Box<[u64]>],
        reorder: bool,
        include: impl Fn(usize) -> bool,
    ) -> (PageArena<T>, Vec<PageArena<u64>>, CodecStats) {
        let mut adjacency = self.adjacency.build();
        let mut properties: Vec<_> = self.properties.into_iter().map(PagedBuilder::build).collect();
        if reorder {
            adjacency.reorder(offsets, &include);
            for (arena, offsets) in properties.iter_mut().zip(property_offsets.iter_mut()) {
                arena.reorder(offsets, &include);
            }
        }
        (adjacency, properties, self.stats.into_inner())
    }
}

/// Where a factory is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryState {
    /// Constructed, shared arrays not allocated.
    Uninitialized,
    /// Shared arrays allocated, no compressor created yet.
    Initialized,
    /// At least one compressor was created.
    Compressing,
}

/// A per-thread compressor of the configured strategy.
pub enum AdjacencyCompressor<'f> {
    /// Every node through delta-varint.
    DeltaVarint(DeltaVarintCompressor<'f>),
    /// Every node through packed blocks.
    Packed(PackedCompressor<'f>),
    /// Degree-adaptive.
    Mixed(MixedCompressor<'f>),
}

impl AdjacencyCompressor<'_> {
    /// Compresses the first `degree` entries of one node's sorted targets and
    /// parallel property values. Returns the degree after aggregation.
    ///
    /// # Errors
    /// [`CompressionError::AggregationConflict`] or [`CompressionError::Allocation`].
    ///
    /// # Panics
    /// Panics on unsorted targets, a degree larger than `targets`, a node out of
    /// range, or a node that was already compressed.
    #[inline]
    pub fn compress(&mut self, node: u64, targets: &[u64], properties: &[&[u64]], degree: u32) -> Result<u32> {
        match self {
            Self::DeltaVarint(c) => c.compress(node, targets, properties, degree),
            Self::Packed(c) => c.compress(node, targets, properties, degree),
            Self::Mixed(c) => c.compress(node, targets, properties, degree),
        }
    }

    /// Hands pages and statistics back to the factory.
    pub fn close(self) {
        tracing::trace!("closing compressor");
        drop(self);
    }
}

/// Builds compressed adjacency lists for a fixed number of nodes.
pub struct AdjacencyCompressorFactory {
    node_count: usize,
    config: CompressionConfig,
    shared: Option<SharedArrays>,
    varlong: Option<CodecBuilders<u8>>,
    packed: Option<CodecBuilders<u64>>,
    compressors: AtomicUsize,
}

impl AdjacencyCompressorFactory {
    /// Creates an uninitialized factory.
    ///
    /// # Errors
    /// [`CompressionError::InvalidConfiguration`] if `config` fails validation.
    pub fn new(node_count: usize, config: CompressionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            node_count,
            config,
            shared: None,
            varlong: None,
            packed: None,
            compressors: AtomicUsize::new(0),
        })
    }

    /// Number of nodes the factory was sized for.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Configuration in effect.
    #[inline]
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FactoryState {
        if self.shared.is_none() {
            FactoryState::Uninitialized
        } else if self.compressors.load(Ordering::Relaxed) == 0 {
            FactoryState::Initialized
        } else {
            FactoryState::Compressing
        }
    }

    /// Allocates the shared degree, offset and property offset arrays and the codec arenas.
    ///
    /// # Errors
    /// [`CompressionError::IllegalState`] if called twice.
    pub fn init(&mut self) -> Result<()> {
        if self.shared.is_some() {
            return Err(CompressionError::IllegalState("factory was already initialized"));
        }
        let properties = self.config.property_count();
        let byte_shift = self.config.page_shift;
        let word_shift = byte_shift - 3;
        let strategy = self.config.strategy;

        self.shared = Some(SharedArrays::new(self.node_count, properties));
        if strategy != CompressionStrategy::Packed {
            self.varlong = Some(CodecBuilders::new(byte_shift, word_shift, properties));
        }
        if strategy != CompressionStrategy::DeltaVarint {
            self.packed = Some(CodecBuilders::new(word_shift, word_shift, properties));
        }
        tracing::debug!(
            node_count = self.node_count,
            ?strategy,
            properties,
            packing_threshold = self.config.packing_threshold,
            "initialized adjacency compressor factory"
        );
        Ok(())
    }

    /// Creates a compressor for one worker thread.
    ///
    /// # Errors
    /// [`CompressionError::IllegalState`] before [`Self::init`].
    pub fn create_compressor(&self) -> Result<AdjacencyCompressor<'_>> {
        const NOT_INITIALIZED: CompressionError =
            CompressionError::IllegalState("create_compressor called before init");
        let shared = self.shared.as_ref().ok_or(NOT_INITIALIZED)?;
        let compressor = match self.config.strategy {
            CompressionStrategy::DeltaVarint => {
                let varlong = self.varlong.as_ref().ok_or(NOT_INITIALIZED)?;
                AdjacencyCompressor::DeltaVarint(DeltaVarintCompressor::new(&self.config, shared, varlong))
            }
            CompressionStrategy::Packed => {
                let packed = self.packed.as_ref().ok_or(NOT_INITIALIZED)?;
                AdjacencyCompressor::Packed(PackedCompressor::new(&self.config, shared, packed))
            }
            CompressionStrategy::Mixed => {
                let varlong = self.varlong.as_ref().ok_or(NOT_INITIALIZED)?;
                let packed = self.packed.as_ref().ok_or(NOT_INITIALIZED)?;
                AdjacencyCompressor::Mixed(MixedCompressor::new(&self.config, shared, varlong, packed))
            }
        };
        let created = self.compressors.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(created, strategy = ?self.config.strategy, "created compressor");
        Ok(compressor)
    }

    /// Finalizes all arenas into read-only lists and property stores.
    ///
    /// With `allow_reordering`, pages are permuted into the order in which node
    /// ids first reference them.
    ///
    /// # Errors
    /// [`CompressionError::IllegalState`] before [`Self::init`].
    pub fn build(self, allow_reordering: bool) -> Result<CompressedRelationships> {
        let shared = self
            .shared
            .ok_or(CompressionError::IllegalState("build called before init"))?;
        let config = self.config;
        let SharedArrays {
            degrees,
            offsets,
            property_offsets,
            relationship_count,
        } = shared;
        let relationship_count = relationship_count.into_inner().into_inner();
        let degrees: Arc<[u32]> = degrees.freeze().into();
        let mut offsets = offsets.freeze();
        let mut property_offsets: Vec<Box<[u64]>> =
            property_offsets.into_iter().map(AtomicOffsets::freeze).collect();

        let strategy = config.strategy;
        let threshold = config.packing_threshold;
        let packed_node = |node: usize| {
            let degree = degrees[node] as usize;
            degree > 0
                && match strategy {
                    CompressionStrategy::DeltaVarint => false,
                    CompressionStrategy::Packed => true,
                    CompressionStrategy::Mixed => degree > threshold,
                }
        };
        let varlong_node = |node: usize| degrees[node] > 0 && !packed_node(node);

        let varlong = self
            .varlong
            .map(|b| b.finish(&mut offsets, &mut property_offsets, allow_reordering, varlong_node));
        let packed = self
            .packed
            .map(|b| b.finish(&mut offsets, &mut property_offsets, allow_reordering, packed_node));
        if allow_reordering {
            tracing::debug!("reordered arena pages by first node reference");
        }

        let offsets: Arc<[u64]> = offsets.into();
        let property_offsets: Vec<Arc<[u64]>> = property_offsets.into_iter().map(Arc::from).collect();
        let stores = |arenas: Vec<PageArena<u64>>| -> Vec<PropertyStore> {
            arenas
                .into_iter()
                .zip(&property_offsets)
                .map(|(arena, offsets)| PropertyStore::new(arena, Arc::clone(offsets), Arc::clone(&degrees)))
                .collect()
        };

        let (adjacency, properties) = match (varlong, packed) {
            (Some((arena, values, stats)), None) => (
                AdjacencyList::DeltaVarint(DeltaVarintAdjacencyList::new(
                    arena,
                    Arc::clone(&degrees),
                    Arc::clone(&offsets),
                    stats,
                )),
                stores(values).into_iter().map(AdjacencyProperties::DeltaVarint).collect(),
            ),
            (None, Some((arena, values, stats))) => (
                AdjacencyList::Packed(PackedAdjacencyList::new(
                    arena,
                    Arc::clone(&degrees),
                    Arc::clone(&offsets),
                    config.packed_tail,
                    stats,
                )),
                stores(values).into_iter().map(AdjacencyProperties::Packed).collect(),
            ),
            (Some((v_arena, v_values, v_stats)), Some((p_arena, p_values, p_stats))) => {
                let varlong_list =
                    DeltaVarintAdjacencyList::new(v_arena, Arc::clone(&degrees), Arc::clone(&offsets), v_stats);
                let packed_list = PackedAdjacencyList::new(
                    p_arena,
                    Arc::clone(&degrees),
                    Arc::clone(&offsets),
                    config.packed_tail,
                    p_stats,
                );
                let properties = stores(v_values)
                    .into_iter()
                    .zip(stores(p_values))
                    .map(|(v, p)| {
                        AdjacencyProperties::Mixed(MixedAdjacencyProperties::new(
                            v,
                            p,
                            Arc::clone(&degrees),
                            threshold,
                        ))
                    })
                    .collect();
                (
                    AdjacencyList::Mixed(MixedAdjacencyList::new(varlong_list, packed_list, threshold)),
                    properties,
                )
            }
            (None, None) => return Err(CompressionError::IllegalState("no codec arenas were initialized")),
        };

        let memory = adjacency.memory_info();
        tracing::info!(
            relationship_count,
            pages = memory.pages,
            bytes = memory.bytes_total().unwrap_or(0),
            "built compressed adjacency"
        );
        Ok(CompressedRelationships::new(relationship_count, adjacency, properties, config))
    }
}

#[cfg(test)]
mod tests;
