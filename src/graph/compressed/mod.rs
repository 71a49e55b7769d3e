//! Compressed adjacency storage.
//!
//! Two interchangeable codecs encode one node's sorted targets:
//!
//! - [`varlong`]: delta-varint bytes, small for short lists;
//! - [`packed`]: bit-packed blocks of 64 gaps with a width header, fast to decode
//!   and compact for long lists.
//!
//! [`mixed`] picks one of them per node by degree. [`factory`] owns the shared
//! per-node arrays during a parallel import and finalizes everything into an
//! immutable [`AdjacencyList`] plus property channels, read through
//! [`AdjacencyCursor`] and [`PropertyCursor`]. [`CompressedGraph`] is a thin
//! graph-shaped facade on top.

pub(crate) mod aggregation;
pub mod bit_packer;
pub mod compressed_graph;
pub mod cursor;
pub mod factory;
pub mod mixed;
pub mod packed;
pub mod properties;
pub mod varint;
pub mod varlong;

pub use compressed_graph::{CompressedGraph, CompressionStats};
pub use cursor::{AdjacencyCursor, PropertyCursor, NOT_FOUND};
pub use factory::{
    AdjacencyCompressor, AdjacencyCompressorFactory, AdjacencyList, AdjacencyProperties, CompressedRelationships,
    FactoryState,
};
pub use mixed::{MixedAdjacencyList, MixedAdjacencyProperties, MixedCompressor};
pub use packed::{PackedAdjacencyList, PackedCompressor};
pub use properties::PropertyStore;
pub use varlong::{DeltaVarintAdjacencyList, DeltaVarintCompressor};
