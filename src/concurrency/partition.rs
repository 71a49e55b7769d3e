//! Disjoint node ranges for parallel import.
//!
//! Every node belongs to exactly one [`NodePartition`], and each partition is
//! compressed by exactly one compressor. That is what makes the lock-free
//! per-node writes of the factory sound; a node that still reaches two
//! compressors trips the slot claims and panics.

use core::ops::Range;

use crate::error::Result;
use crate::graph::compressed::AdjacencyCompressor;

/// A contiguous range of node ids owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePartition {
    /// First node id.
    pub start: u64,
    /// Number of nodes.
    pub len: u64,
}

impl NodePartition {
    /// Node ids as a range.
    #[inline]
    pub fn nodes(&self) -> Range<u64> {
        self.start..self.start + self.len
    }
}

/// Splits `0..node_count` into at most `concurrency` near-equal, non-empty ranges.
pub fn range_partitions(node_count: u64, concurrency: usize) -> Vec<NodePartition> {
    if node_count == 0 {
        return Vec::new();
    }
    let batch = node_count.div_ceil(concurrency.max(1) as u64);
    (0..node_count)
        .step_by(batch as usize)
        .map(|start| NodePartition {
            start,
            len: batch.min(node_count - start),
        })
        .collect()
}

/// Scratch buffers a loader fills with one node's raw adjacency.
#[derive(Debug, Clone, Default)]
pub struct RawAdjacency {
    /// Sorted targets, duplicates allowed.
    pub targets: Vec<u64>,
    /// One value list per property channel, parallel to `targets`.
    pub properties: Vec<Vec<u64>>,
}

impl RawAdjacency {
    /// Empties every buffer, keeping `property_count` channels.
    pub fn clear(&mut self, property_count: usize) {
        self.targets.clear();
        self.properties.resize_with(property_count, Vec::new);
        for values in &mut self.properties {
            values.clear();
        }
    }
}

/// Degrees are 32-bit; a longer list is an invariant violation, not a truncation.
fn list_degree(node: u64, len: usize) -> u32 {
    let Ok(degree) = u32::try_from(len) else {
        panic!("node {node} has {len} targets, more than a degree can hold");
    };
    degree
}

/// Compresses every node of `partition`, asking `loader` for each node's input.
///
/// Returns the sum of post-aggregation degrees.
///
/// # Errors
/// The first compression error; the remaining nodes are not touched.
pub fn compress_partition<F>(
    compressor: &mut AdjacencyCompressor<'_>,
    partition: NodePartition,
    property_count: usize,
    loader: F,
) -> Result<u64>
where
    F: Fn(u64, &mut RawAdjacency),
{
    let mut raw = RawAdjacency::default();
    let mut total = 0;
    for node in partition.nodes() {
        raw.clear(property_count);
        loader(node, &mut raw);
        let properties: Vec<&[u64]> = raw.properties.iter().map(Vec::as_slice).collect();
        let degree = list_degree(node, raw.targets.len());
        total += u64::from(compressor.compress(node, &raw.targets, &properties, degree)?);
    }
    Ok(total)
}

/// Compresses all `partitions` on the rayon pool, one compressor per partition.
///
/// # Errors
/// The first compression error of any partition.
#[cfg(feature = "parallel")]
pub fn compress_parallel<F>(
    factory: &crate::graph::compressed::AdjacencyCompressorFactory,
    partitions: &[NodePartition],
    loader: F,
) -> Result<u64>
where
    F: Fn(u64, &mut RawAdjacency) + Sync,
{
    use rayon::prelude::*;

    let property_count = factory.config().property_count();
    partitions
        .par_iter()
        .map(|&partition| {
            let mut compressor = factory.create_compressor()?;
            let degrees = compress_partition(&mut compressor, partition, property_count, &loader)?;
            compressor.close();
            Ok(degrees)
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_cover_every_node_once() {
        let parts = range_partitions(10, 3);
        assert_eq!(
            parts,
            vec![
                NodePartition { start: 0, len: 4 },
                NodePartition { start: 4, len: 4 },
                NodePartition { start: 8, len: 2 },
            ]
        );
        let covered: Vec<u64> = parts.iter().flat_map(NodePartition::nodes).collect();
        assert_eq!(covered, (0..10).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "node 7 has 4294967296 targets")]
    fn oversized_lists_are_rejected() {
        assert_eq!(list_degree(7, u32::MAX as usize), u32::MAX);
        list_degree(7, u32::MAX as usize + 1);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(range_partitions(0, 4).is_empty());
        assert_eq!(range_partitions(3, 0), vec![NodePartition { start: 0, len: 3 }]);
        assert_eq!(range_partitions(2, 8).len(), 2);
    }
}
