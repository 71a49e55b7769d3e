//! Degree-adaptive dispatch between the delta-varint and packed codecs.
//!
//! The route is a pure function of the post-aggregation degree:
//! `degree > packing_threshold` goes to the packed codec, everything else to
//! delta-varint. Writers and readers evaluate the same rule, so the read side
//! needs no per-node tag. A single list is never split across codecs.

use std::sync::Arc;

use crate::config::CompressionConfig;
use crate::error::Result;
use crate::mem::MemoryInfo;

use super::aggregation::AdjacencyBuffer;
use super::cursor::{AdjacencyCursor, PropertyCursor};
use super::factory::{CodecBuilders, SharedArrays};
use super::packed::{PackedAdjacencyList, PackedWriter};
use super::properties::{PropertyStore, PropertyWriter};
use super::varlong::{DeltaVarintAdjacencyList, VarLongWriter};

/// Compressor holding one writer per codec and choosing per node.
pub struct MixedCompressor<'f> {
    buffer: AdjacencyBuffer,
    varlong: VarLongWriter<'f>,
    varlong_properties: PropertyWriter<'f>,
    packed: PackedWriter<'f>,
    packed_properties: PropertyWriter<'f>,
    shared: &'f SharedArrays,
    packing_threshold: usize,
}

impl<'f> MixedCompressor<'f> {
    pub(crate) fn new(
        config: &CompressionConfig,
        shared: &'f SharedArrays,
        varlong: &'f CodecBuilders<u8>,
        packed: &'f CodecBuilders<u64>,
    ) -> Self {
        Self {
            buffer: AdjacencyBuffer::new(config),
            varlong: VarLongWriter::new(varlong, &shared.offsets),
            varlong_properties: PropertyWriter::new(&varlong.properties, &shared.property_offsets),
            packed: PackedWriter::new(packed, &shared.offsets, config.packed_tail),
            packed_properties: PropertyWriter::new(&packed.properties, &shared.property_offsets),
            shared,
            packing_threshold: config.packing_threshold,
        }
    }

    /// Whether a list of `degree` targets is written by the packed codec.
    #[inline]
    pub fn use_packing(&self, degree: usize) -> bool {
        degree > self.packing_threshold
    }

    /// Compresses one node's sorted targets with the codec its degree selects.
    ///
    /// # Errors
    /// Aggregation conflicts and page allocation failures.
    pub fn compress(&mut self, node: u64, targets: &[u64], properties: &[&[u64]], degree: u32) -> Result<u32> {
        let index = self.shared.index(node);
        let degree = self.buffer.prepare(node, targets, properties, degree)?;
        if degree == 0 {
            self.shared.record(index, 0);
            return Ok(0);
        }
        if self.use_packing(degree) {
            self.packed_properties.write(index, self.buffer.properties())?;
            self.buffer.delta_encode();
            self.packed.write(index, self.buffer.targets())?;
        } else {
            self.varlong_properties.write(index, self.buffer.properties())?;
            self.buffer.delta_encode();
            self.varlong.write(index, self.buffer.targets())?;
        }
        self.shared.record(index, degree);
        Ok(degree as u32)
    }
}

/// Read side of the mixed strategy: one list per codec over shared degrees and offsets.
#[derive(Debug)]
pub struct MixedAdjacencyList {
    varlong: DeltaVarintAdjacencyList,
    packed: PackedAdjacencyList,
    packing_threshold: usize,
}

impl MixedAdjacencyList {
    pub(crate) fn new(varlong: DeltaVarintAdjacencyList, packed: PackedAdjacencyList, packing_threshold: usize) -> Self {
        Self {
            varlong,
            packed,
            packing_threshold,
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.varlong.node_count()
    }

    /// Degree from the shared degree array.
    #[inline]
    pub fn degree(&self, node: u64) -> u32 {
        self.varlong.degree(node)
    }

    /// Whether `node` was written by the packed codec.
    #[inline]
    pub fn is_packed(&self, node: u64) -> bool {
        self.degree(node) as usize > self.packing_threshold
    }

    /// Cursor over the targets of `node`, decoded by whichever codec wrote them.
    pub fn adjacency_cursor(&self, node: u64, fallback_value: f64) -> AdjacencyCursor<'_> {
        if self.is_packed(node) {
            self.packed.adjacency_cursor(node, fallback_value)
        } else {
            self.varlong.adjacency_cursor(node, fallback_value)
        }
    }

    /// An unpositioned cursor for [`Self::init_cursor`].
    pub fn raw_adjacency_cursor(&self) -> AdjacencyCursor<'_> {
        AdjacencyCursor::empty()
    }

    /// Repositions `cursor` at the start of `node`'s targets.
    pub fn init_cursor<'a>(&'a self, cursor: &mut AdjacencyCursor<'a>, node: u64, fallback_value: f64) {
        if self.is_packed(node) {
            self.packed.init_cursor(cursor, node, fallback_value);
        } else {
            self.varlong.init_cursor(cursor, node, fallback_value);
        }
    }

    /// Bookkeeping from the delta-varint side, block storage from the packed side.
    pub fn memory_info(&self) -> MemoryInfo {
        MemoryInfo::merge_mixed(&self.varlong.memory_info(), &self.packed.memory_info())
    }

    /// The delta-varint half.
    pub fn varlong(&self) -> &DeltaVarintAdjacencyList {
        &self.varlong
    }

    /// The packed half.
    pub fn packed(&self) -> &PackedAdjacencyList {
        &self.packed
    }
}

/// One property channel split the same way as the adjacency.
#[derive(Debug)]
pub struct MixedAdjacencyProperties {
    varlong: PropertyStore,
    packed: PropertyStore,
    degrees: Arc<[u32]>,
    packing_threshold: usize,
}

impl MixedAdjacencyProperties {
    pub(crate) fn new(
        varlong: PropertyStore,
        packed: PropertyStore,
        degrees: Arc<[u32]>,
        packing_threshold: usize,
    ) -> Self {
        Self {
            varlong,
            packed,
            degrees,
            packing_threshold,
        }
    }

    fn store(&self, node: u64) -> &PropertyStore {
        if self.degrees[node as usize] as usize > self.packing_threshold {
            &self.packed
        } else {
            &self.varlong
        }
    }

    /// Values of `node`, one per target.
    pub fn values(&self, node: u64) -> &[u64] {
        self.store(node).values(node)
    }

    /// Cursor over the values of `node`.
    pub fn property_cursor(&self, node: u64, fallback_value: f64) -> PropertyCursor<'_> {
        self.store(node).property_cursor(node, fallback_value)
    }

    /// Bytes held by both value arenas.
    pub fn size_in_bytes(&self) -> u64 {
        self.varlong.size_in_bytes() + self.packed.size_in_bytes()
    }

    /// Values of delta-varint nodes.
    pub fn varlong(&self) -> &PropertyStore {
        &self.varlong
    }

    /// Values of packed nodes.
    pub fn packed(&self) -> &PropertyStore {
        &self.packed
    }
}

#[cfg(test)]
mod tests;
