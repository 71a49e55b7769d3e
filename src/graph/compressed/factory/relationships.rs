//! The immutable result of [`AdjacencyCompressorFactory::build`](super::AdjacencyCompressorFactory::build).

use crate::config::{CompressionConfig, PropertyConfig};
use crate::error::{CompressionError, Result};
use crate::graph::compressed::cursor::{AdjacencyCursor, PropertyCursor};
use crate::graph::compressed::mixed::{MixedAdjacencyList, MixedAdjacencyProperties};
use crate::graph::compressed::packed::PackedAdjacencyList;
use crate::graph::compressed::properties::PropertyStore;
use crate::graph::compressed::varlong::DeltaVarintAdjacencyList;
use crate::mem::MemoryInfo;

/// Compressed targets of every node, in the layout of the configured strategy.
#[derive(Debug)]
pub enum AdjacencyList {
    /// Delta-varint only.
    DeltaVarint(DeltaVarintAdjacencyList),
    /// Packed blocks only.
    Packed(PackedAdjacencyList),
    /// Both, routed by degree.
    Mixed(MixedAdjacencyList),
}

impl AdjacencyList {
    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        match self {
            Self::DeltaVarint(list) => list.node_count(),
            Self::Packed(list) => list.node_count(),
            Self::Mixed(list) => list.node_count(),
        }
    }

    /// Post-aggregation degree of `node`, `0` if it was never compressed.
    #[inline]
    pub fn degree(&self, node: u64) -> u32 {
        match self {
            Self::DeltaVarint(list) => list.degree(node),
            Self::Packed(list) => list.degree(node),
            Self::Mixed(list) => list.degree(node),
        }
    }

    /// Cursor over the ascending targets of `node`.
    #[inline]
    pub fn adjacency_cursor(&self, node: u64, fallback_value: f64) -> AdjacencyCursor<'_> {
        match self {
            Self::DeltaVarint(list) => list.adjacency_cursor(node, fallback_value),
            Self::Packed(list) => list.adjacency_cursor(node, fallback_value),
            Self::Mixed(list) => list.adjacency_cursor(node, fallback_value),
        }
    }

    /// An unpositioned cursor to be reused through [`Self::init_cursor`].
    pub fn raw_adjacency_cursor(&self) -> AdjacencyCursor<'_> {
        AdjacencyCursor::empty()
    }

    /// Repositions `cursor` on `node` without allocating.
    #[inline]
    pub fn init_cursor<'a>(&'a self, cursor: &mut AdjacencyCursor<'a>, node: u64, fallback_value: f64) {
        match self {
            Self::DeltaVarint(list) => list.init_cursor(cursor, node, fallback_value),
            Self::Packed(list) => list.init_cursor(cursor, node, fallback_value),
            Self::Mixed(list) => list.init_cursor(cursor, node, fallback_value),
        }
    }

    /// Page and byte accounting.
    pub fn memory_info(&self) -> MemoryInfo {
        match self {
            Self::DeltaVarint(list) => list.memory_info(),
            Self::Packed(list) => list.memory_info(),
            Self::Mixed(list) => list.memory_info(),
        }
    }
}

/// One compressed property channel.
#[derive(Debug)]
pub enum AdjacencyProperties {
    /// Written next to delta-varint lists.
    DeltaVarint(PropertyStore),
    /// Written next to packed lists.
    Packed(PropertyStore),
    /// Routed by degree like the adjacency.
    Mixed(MixedAdjacencyProperties),
}

impl AdjacencyProperties {
    /// Raw values of `node`, parallel to its targets.
    pub fn values(&self, node: u64) -> &[u64] {
        match self {
            Self::DeltaVarint(store) | Self::Packed(store) => store.values(node),
            Self::Mixed(store) => store.values(node),
        }
    }

    /// Cursor over the values of `node`.
    pub fn property_cursor(&self, node: u64, fallback_value: f64) -> PropertyCursor<'_> {
        match self {
            Self::DeltaVarint(store) | Self::Packed(store) => store.property_cursor(node, fallback_value),
            Self::Mixed(store) => store.property_cursor(node, fallback_value),
        }
    }

    /// Bytes held by value pages.
    pub fn size_in_bytes(&self) -> u64 {
        match self {
            Self::DeltaVarint(store) | Self::Packed(store) => store.size_in_bytes(),
            Self::Mixed(store) => store.size_in_bytes(),
        }
    }
}

/// Relationship count, adjacency and property channels of one relationship type.
#[derive(Debug)]
pub struct CompressedRelationships {
    relationship_count: u64,
    adjacency: AdjacencyList,
    properties: Vec<AdjacencyProperties>,
    config: CompressionConfig,
}

impl CompressedRelationships {
    pub(crate) fn new(
        relationship_count: u64,
        adjacency: AdjacencyList,
        properties: Vec<AdjacencyProperties>,
        config: CompressionConfig,
    ) -> Self {
        Self {
            relationship_count,
            adjacency,
            properties,
            config,
        }
    }

    /// Total post-aggregation degree over all nodes.
    #[inline]
    pub fn relationship_count(&self) -> u64 {
        self.relationship_count
    }

    /// The compressed targets.
    #[inline]
    pub fn adjacency(&self) -> &AdjacencyList {
        &self.adjacency
    }

    /// Number of property channels.
    #[inline]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Configuration the relationships were built with.
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Declaration of property channel `index`, if any.
    pub fn property_config(&self, index: usize) -> Option<&PropertyConfig> {
        self.config.properties.get(index)
    }

    /// Property channel `index`.
    ///
    /// # Errors
    /// [`CompressionError::MissingProperty`] if no such channel was compressed.
    pub fn properties(&self, index: usize) -> Result<&AdjacencyProperties> {
        self.properties.get(index).ok_or(CompressionError::MissingProperty {
            index,
            available: self.properties.len(),
        })
    }

    /// Degree of `node`.
    #[inline]
    pub fn degree(&self, node: u64) -> u32 {
        self.adjacency.degree(node)
    }

    /// Cursor over the targets of `node`.
    pub fn adjacency_cursor(&self, node: u64, fallback_value: f64) -> AdjacencyCursor<'_> {
        self.adjacency.adjacency_cursor(node, fallback_value)
    }

    /// An unpositioned, reusable cursor.
    pub fn raw_adjacency_cursor(&self) -> AdjacencyCursor<'_> {
        self.adjacency.raw_adjacency_cursor()
    }

    /// Cursor over the values of property channel `index` for `node`.
    ///
    /// # Errors
    /// [`CompressionError::MissingProperty`] if no such channel was compressed.
    pub fn property_cursor(&self, node: u64, index: usize, fallback_value: f64) -> Result<PropertyCursor<'_>> {
        Ok(self.properties(index)?.property_cursor(node, fallback_value))
    }

    /// Adjacency accounting plus the property arenas, which count where their
    /// codec stores its blocks.
    pub fn memory_info(&self) -> MemoryInfo {
        let mut info = self.adjacency.memory_info();
        for channel in &self.properties {
            match channel {
                AdjacencyProperties::DeltaVarint(store) => {
                    info.pages += store.page_count();
                    info.bytes_on_heap += store.size_in_bytes();
                }
                AdjacencyProperties::Packed(store) => {
                    info.pages += store.page_count();
                    info.bytes_off_heap += store.size_in_bytes();
                }
                AdjacencyProperties::Mixed(store) => {
                    info.pages += store.varlong().page_count() + store.packed().page_count();
                    info.bytes_on_heap += store.varlong().size_in_bytes();
                    info.bytes_off_heap += store.packed().size_in_bytes();
                }
            }
        }
        info
    }
}
