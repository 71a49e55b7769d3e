//! Read-only graph facade over compressed relationships.
//!
//! [`CompressedGraph`] answers the usual topology questions (degree,
//! neighbors, edge existence, per-edge properties) by walking cursors of the
//! underlying [`CompressedRelationships`]. Nothing is decompressed up front.
//!
//! The graph is immutable and cheap to clone: [`CompressedGraph::concurrent_copy`]
//! shares the compressed data and every copy opens its own cursors, so copies
//! can be handed to different threads.
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `degree` | \(O(1)\) | Shared degree array |
//! | `neighbors` | \(O(d)\) total | One block decode per 64 targets |
//! | `exists` | \(O(d)\) | Blocks below the target are skipped |
//! | `nth_target` | \(O(i)\) | |
//! | `concurrent_copy` | \(O(1)\) | `Arc` clone |

use std::sync::Arc;

use crate::config::CompressionConfig;
use crate::error::Result;
use crate::graph::compressed::cursor::{AdjacencyCursor, NOT_FOUND};
use crate::graph::compressed::factory::{AdjacencyCompressorFactory, CompressedRelationships};
use crate::mem::MemoryInfo;

pub use iter::RelationshipIter;
pub use traversal::CompressionStats;

/// Immutable graph over one compressed relationship type.
#[derive(Debug, Clone)]
pub struct CompressedGraph {
    relationships: Arc<CompressedRelationships>,
}

impl CompressedGraph {
    /// Wraps built relationships.
    pub fn new(relationships: CompressedRelationships) -> Self {
        Self {
            relationships: Arc::new(relationships),
        }
    }

    /// Compresses an adjacency list of `adjacency.len()` nodes on the calling thread.
    ///
    /// Neighbor lists are sorted first, so they may arrive in any order.
    ///
    /// # Errors
    /// Configuration errors and aggregation conflicts.
    pub fn from_adjacency(adjacency: &[Vec<u64>], config: CompressionConfig) -> Result<Self> {
        let mut factory = AdjacencyCompressorFactory::new(adjacency.len(), config)?;
        factory.init()?;
        {
            let mut compressor = factory.create_compressor()?;
            let mut targets = Vec::new();
            for (node, neighbors) in adjacency.iter().enumerate() {
                targets.clear();
                targets.extend_from_slice(neighbors);
                targets.sort_unstable();
                compressor.compress(node as u64, &targets, &[], targets.len() as u32)?;
            }
        }
        Ok(Self::new(factory.build(true)?))
    }

    /// Like [`Self::from_adjacency`] with one `f64` property per relationship.
    ///
    /// `config` must declare exactly one property.
    ///
    /// # Errors
    /// Configuration errors and aggregation conflicts.
    pub fn from_weighted_adjacency(adjacency: &[Vec<(u64, f64)>], config: CompressionConfig) -> Result<Self> {
        let mut factory = AdjacencyCompressorFactory::new(adjacency.len(), config)?;
        factory.init()?;
        {
            let mut compressor = factory.create_compressor()?;
            let mut pairs = Vec::new();
            let (mut targets, mut weights) = (Vec::new(), Vec::new());
            for (node, neighbors) in adjacency.iter().enumerate() {
                pairs.clear();
                pairs.extend_from_slice(neighbors);
                pairs.sort_by_key(|&(target, _)| target);
                targets.clear();
                weights.clear();
                for &(target, weight) in &pairs {
                    targets.push(target);
                    weights.push(f64::to_bits(weight));
                }
                compressor.compress(node as u64, &targets, &[&weights], targets.len() as u32)?;
            }
        }
        Ok(Self::new(factory.build(true)?))
    }

    /// The underlying relationships.
    #[inline]
    pub fn relationships(&self) -> &CompressedRelationships {
        &self.relationships
    }

    /// Number of nodes.
    #[inline(always)]
    pub fn node_count(&self) -> usize {
        self.relationships.adjacency().node_count()
    }

    /// Number of relationships after aggregation.
    #[inline(always)]
    pub fn relationship_count(&self) -> u64 {
        self.relationships.relationship_count()
    }

    /// Degree of `node`.
    ///
    /// # Panics
    /// Panics if `node` is out of range.
    #[inline]
    pub fn degree(&self, node: u64) -> usize {
        self.check(node);
        self.relationships.degree(node) as usize
    }

    #[inline]
    fn check(&self, node: u64) {
        assert!(
            (node as usize) < self.node_count(),
            "node {node} out of bounds for {} nodes",
            self.node_count()
        );
    }

    /// Ascending targets of `node`.
    #[inline]
    pub fn neighbors(&self, node: u64) -> AdjacencyCursor<'_> {
        self.check(node);
        self.relationships.adjacency_cursor(node, f64::NAN)
    }

    /// `(target, value)` pairs of `node` for the first property channel.
    pub fn relationships_of(&self, node: u64, fallback_value: f64) -> RelationshipIter<'_> {
        self.check(node);
        let targets = self.relationships.adjacency_cursor(node, fallback_value);
        let values = self.relationships.property_cursor(node, 0, fallback_value).ok();
        RelationshipIter::new(targets, values)
    }

    /// Whether `source -> target` exists.
    pub fn exists(&self, source: u64, target: u64) -> bool {
        target != NOT_FOUND && self.neighbors(source).advance(target) == target
    }

    /// The `index`-th target of `node` in ascending order.
    pub fn nth_target(&self, node: u64, index: usize) -> Option<u64> {
        match self.neighbors(node).advance_by(index) {
            NOT_FOUND => None,
            target => Some(target),
        }
    }

    /// Value of the first property channel on `source -> target`, or `fallback_value`.
    ///
    /// With parallel relationships the first one wins.
    pub fn relationship_property(&self, source: u64, target: u64, fallback_value: f64) -> f64 {
        self.relationships_of(source, fallback_value)
            .take_while(|&(t, _)| t <= target)
            .find(|&(t, _)| t == target)
            .map_or(fallback_value, |(_, value)| value)
    }

    /// Calls `f(source, target)` for every relationship of `node`.
    pub fn for_each_relationship(&self, node: u64, mut f: impl FnMut(u64, u64)) {
        for target in self.neighbors(node) {
            f(node, target);
        }
    }

    /// Calls `f(source, target, value)` for every relationship of `node`.
    pub fn for_each_relationship_with_property(
        &self,
        node: u64,
        fallback_value: f64,
        mut f: impl FnMut(u64, u64, f64),
    ) {
        for (target, value) in self.relationships_of(node, fallback_value) {
            f(node, target, value);
        }
    }

    /// Number of distinct targets of `node`.
    pub fn degree_without_parallel_relationships(&self, node: u64) -> usize {
        let mut previous = NOT_FOUND;
        self.neighbors(node)
            .filter(|&target| {
                let distinct = target != previous;
                previous = target;
                distinct
            })
            .count()
    }

    /// Whether the graph may hold parallel relationships.
    pub fn is_multi_graph(&self) -> bool {
        let config = self.relationships.config();
        !config.merges_duplicates() && !config.no_aggregation
    }

    /// A handle sharing the compressed data, for use on another thread.
    pub fn concurrent_copy(&self) -> Self {
        self.clone()
    }

    /// Page and byte accounting, property channels included.
    pub fn memory_info(&self) -> MemoryInfo {
        self.relationships.memory_info()
    }

    /// Compressed versus raw size.
    pub fn compression_stats(&self) -> CompressionStats {
        traversal::compression_stats(self)
    }

    /// Breadth-first order of the nodes reachable from `start`.
    pub fn bfs(&self, start: u64) -> Vec<u64> {
        traversal::bfs(self, start)
    }
}

mod iter;
mod traversal;
