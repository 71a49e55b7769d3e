//! # `graphpack` - Compressed Adjacency Lists
//!
//! Immutable, memory-compact adjacency storage for large graphs, built once by
//! many threads and then read concurrently.
//!
//! ## Encodings
//!
//! Each node stores its sorted target ids as gaps (the first one absolute):
//!
//! - **delta-varint**: gaps as little-endian base-128 varints, one byte per
//!   gap below 128;
//! - **packed**: gaps in blocks of [`BLOCK_SIZE`], each block bit-packed at the
//!   width its largest gap needs, with one header byte per block.
//!
//! The default [`CompressionStrategy::Mixed`] routes every node with a degree
//! above [`PACKING_DEGREE_THRESHOLD`] to the packed codec and all others to
//! delta-varint. Relationship properties travel next to their targets in plain
//! 64-bit words, aggregated the same way duplicates are.
//!
//! ## Lifecycle
//!
//! ```text
//! AdjacencyCompressorFactory::new ─> init ─> create_compressor (per thread)
//!                                              └─> compress(node, ..) ...
//!                                 ─> build ─> CompressedRelationships (read-only)
//! ```
//!
//! ### Concurrency
//! - Compressors are single-threaded and own their pages until dropped.
//! - Per-node slots are written once; a second write panics.
//! - The finished structure is immutable and `Sync`. Cursors are cheap to create
//!   per thread.
//!
//! ## Example
//!
//! ```rust
//! use graphpack::{CompressedGraph, CompressionConfig};
//!
//! let adjacency = vec![vec![1, 2, 3], vec![0], vec![0, 3], vec![]];
//! let graph = CompressedGraph::from_adjacency(&adjacency, CompressionConfig::default()).unwrap();
//!
//! assert_eq!(graph.degree(0), 3);
//! assert!(graph.exists(2, 3));
//! assert_eq!(graph.neighbors(2).collect::<Vec<_>>(), vec![0, 3]);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

pub mod collections;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod mem;

pub use config::{
    Aggregation, CompressionConfig, CompressionStrategy, PackedTail, PropertyConfig, ValueType, BLOCK_SIZE,
    PACKING_DEGREE_THRESHOLD,
};
pub use error::{CompressionError, Result};
pub use graph::compressed::{
    AdjacencyCompressor, AdjacencyCompressorFactory, AdjacencyCursor, AdjacencyList, AdjacencyProperties,
    CompressedGraph, CompressedRelationships, CompressionStats, FactoryState, PropertyCursor, NOT_FOUND,
};
pub use mem::{estimate, BlockStatistics, MemoryEstimate, MemoryInfo, MemoryRange};

// Compile-time assertions for the encoding layout
const _: () = {
    // One header byte per block, eight headers per word.
    assert!(BLOCK_SIZE.is_power_of_two());
    assert!(BLOCK_SIZE == u64::BITS as usize);
    assert!(PACKING_DEGREE_THRESHOLD == BLOCK_SIZE * 8);

    // The page shift bounds leave room for the word arenas (shift - 3).
    assert!(config::MIN_PAGE_SHIFT >= 3);
    assert!(config::DEFAULT_PAGE_SHIFT >= config::MIN_PAGE_SHIFT);
    assert!(config::DEFAULT_PAGE_SHIFT <= config::MAX_PAGE_SHIFT);

    // Cursors are handed out by value per node.
    assert!(core::mem::size_of::<AdjacencyCursor<'static>>() <= 1024);
    assert!(NOT_FOUND == u64::MAX);
};
