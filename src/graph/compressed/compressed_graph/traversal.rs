//! Traversal and size analysis over a compressed graph.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::CompressedGraph;
use crate::graph::visited::VisitedSet;

/// Breadth-first traversal.
///
/// One cursor is reused for every node, so the walk does not allocate per node.
pub fn bfs(graph: &CompressedGraph, start: u64) -> Vec<u64> {
    let mut visited = VisitedSet::new(graph.node_count());
    assert!((start as usize) < visited.len(), "start out of bounds");

    let adjacency = graph.relationships().adjacency();
    let mut out = Vec::with_capacity(visited.len());
    let mut queue = VecDeque::with_capacity(64);
    let mut cursor = adjacency.raw_adjacency_cursor();
    visited.try_visit(start as usize);
    queue.push_back(start);

    while let Some(u) = queue.pop_front() {
        out.push(u);
        adjacency.init_cursor(&mut cursor, u, f64::NAN);
        for v in cursor.by_ref() {
            if visited.try_visit(v as usize) {
                queue.push_back(v);
            }
        }
    }
    out
}

/// Compares the compressed footprint with raw `(source, target)` pairs plus
/// one `u64` per relationship and property.
pub fn compression_stats(graph: &CompressedGraph) -> CompressionStats {
    let relationships = graph.relationship_count();
    let properties = graph.relationships().property_count() as u64;
    CompressionStats {
        original_size: relationships * (16 + 8 * properties),
        compressed_size: graph.memory_info().bytes_total().unwrap_or(0),
        node_count: graph.node_count(),
        relationship_count: relationships,
    }
}

/// Compression statistics for analysis and tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionStats {
    /// Raw size in bytes.
    pub original_size: u64,
    /// Compressed size in bytes, bookkeeping arrays included.
    pub compressed_size: u64,
    /// Number of nodes.
    pub node_count: usize,
    /// Number of relationships.
    pub relationship_count: u64,
}

impl CompressionStats {
    /// Raw size over compressed size (higher is better).
    #[inline]
    pub fn compression_ratio(&self) -> f64 {
        if self.compressed_size == 0 {
            0.0
        } else {
            self.original_size as f64 / self.compressed_size as f64
        }
    }

    /// Saved memory as a percentage of the raw size; negative if compression grew the data.
    #[inline]
    pub fn memory_savings_percent(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            let diff = self.original_size as f64 - self.compressed_size as f64;
            diff / self.original_size as f64 * 100.0
        }
    }
}
