//! Bit-packed block codec.
//!
//! A node's gaps are cut into blocks of [`BLOCK_SIZE`] values. Every block is
//! packed at the smallest width that holds its largest gap, and the widths are
//! collected in a header of one byte per block. Memory layout of one node:
//!
//! ```text
//! [ header words: widths, 8 per word ][ block 0 ][ block 1 ] ... [ tail ]
//! ```
//!
//! A full block at width `b` is exactly `b` words, so block boundaries are
//! always word aligned. The last, partial block depends on [`PackedTail`]:
//!
//! | Tail | Header entry | Words |
//! |------|--------------|-------|
//! | `Padded` | yes | `b`, zero-padded to a full block |
//! | `Packed` | yes | `ceil(len * b / 64)` |
//! | `VarLong` | no | varint bytes, rounded up to a word |
//!
//! Long lists amortize the header, so the mixed strategy only routes degrees
//! above the packing threshold here.

use std::sync::Arc;

use parking_lot::Mutex;
use zerocopy::AsBytes;

use crate::collections::paged::{PageAllocator, PageArena};
use crate::concurrency::atomic::AtomicOffsets;
use crate::config::{CompressionConfig, PackedTail, BLOCK_SIZE};
use crate::error::Result;
use crate::mem::MemoryInfo;

use super::aggregation::AdjacencyBuffer;
use super::bit_packer;
use super::cursor::{AdjacencyCursor, BlockSource};
use super::factory::{CodecBuilders, CodecStats, SharedArrays};
use super::properties::PropertyWriter;
use super::varint;

pub(crate) mod reader;

use reader::PackedReader;

/// Number of header entries for a list of `degree` gaps.
#[inline]
pub(crate) fn header_len(degree: usize, tail: PackedTail) -> usize {
    match tail {
        PackedTail::Padded | PackedTail::Packed => degree.div_ceil(BLOCK_SIZE),
        PackedTail::VarLong => degree / BLOCK_SIZE,
    }
}

/// Words a node of these gaps occupies, header included.
pub(crate) fn encoded_words(deltas: &[u64], tail: PackedTail) -> usize {
    let headers = header_len(deltas.len(), tail);
    let blocks: usize = deltas
        .chunks(BLOCK_SIZE)
        .take(headers)
        .map(|chunk| block_words(chunk.len(), bit_packer::bits_needed(chunk), tail))
        .sum();
    let tail_bytes = varint::encoded_len_all(&deltas[(headers * BLOCK_SIZE).min(deltas.len())..]);
    headers.div_ceil(8) + blocks + tail_bytes.div_ceil(8)
}

#[inline]
fn block_words(len: usize, bits: u32, tail: PackedTail) -> usize {
    match tail {
        PackedTail::Padded => bits as usize,
        PackedTail::Packed | PackedTail::VarLong => bit_packer::words_needed(len, bits),
    }
}

/// Writes packed lists into a word arena on behalf of one thread.
pub(crate) struct PackedWriter<'f> {
    pages: PageAllocator<'f, u64>,
    offsets: &'f AtomicOffsets,
    tail: PackedTail,
    widths: Vec<u8>,
    stats: CodecStats,
    sink: &'f Mutex<CodecStats>,
}

impl<'f> PackedWriter<'f> {
    pub(crate) fn new(builders: &'f CodecBuilders<u64>, offsets: &'f AtomicOffsets, tail: PackedTail) -> Self {
        Self {
            pages: builders.adjacency.allocator(),
            offsets,
            tail,
            widths: Vec::new(),
            stats: CodecStats::default(),
            sink: &builders.stats,
        }
    }

    /// Packs `deltas` for `node` and claims its offset. Returns the words written.
    pub(crate) fn write(&mut self, node: usize, deltas: &[u64]) -> Result<usize> {
        let headers = header_len(deltas.len(), self.tail);
        let (blocked, rest) = deltas.split_at((headers * BLOCK_SIZE).min(deltas.len()));

        self.widths.clear();
        self.widths
            .extend(blocked.chunks(BLOCK_SIZE).map(|chunk| bit_packer::bits_needed(chunk) as u8));
        let header_words = headers.div_ceil(8);
        let block_total: usize = blocked
            .chunks(BLOCK_SIZE)
            .zip(&self.widths)
            .map(|(chunk, &bits)| block_words(chunk.len(), u32::from(bits), self.tail))
            .sum();
        let tail_bytes = varint::encoded_len_all(rest);
        let total = header_words + block_total + tail_bytes.div_ceil(8);
        debug_assert_eq!(total, encoded_words(deltas, self.tail));

        let (address, words) = self.pages.allocate(total)?;
        words.fill(0);
        words[..header_words].as_bytes_mut()[..headers].copy_from_slice(&self.widths);

        let mut position = header_words;
        for (chunk, &bits) in blocked.chunks(BLOCK_SIZE).zip(&self.widths) {
            let bits = u32::from(bits);
            bit_packer::pack(chunk, bits, &mut words[position..]);
            position += block_words(chunk.len(), bits, self.tail);
        }
        if !rest.is_empty() {
            varint::encode_all(rest, words[position..].as_bytes_mut());
        }

        self.offsets.claim(node, address);
        self.stats.allocations.record((total * 8) as u64);
        self.stats.header_allocations.record(headers as u64);
        for &bits in &self.widths {
            self.stats.header_bits.record(u64::from(bits));
        }
        Ok(total)
    }
}

impl Drop for PackedWriter<'_> {
    fn drop(&mut self) {
        self.sink.lock().merge(&self.stats);
    }
}

/// Compressor that routes every node through the packed codec.
pub struct PackedCompressor<'f> {
    buffer: AdjacencyBuffer,
    writer: PackedWriter<'f>,
    properties: PropertyWriter<'f>,
    shared: &'f SharedArrays,
}

impl<'f> PackedCompressor<'f> {
    pub(crate) fn new(config: &CompressionConfig, shared: &'f SharedArrays, builders: &'f CodecBuilders<u64>) -> Self {
        Self {
            buffer: AdjacencyBuffer::new(config),
            writer: PackedWriter::new(builders, &shared.offsets, config.packed_tail),
            properties: PropertyWriter::new(&builders.properties, &shared.property_offsets),
            shared,
        }
    }

    /// Compresses one node's sorted targets and returns its post-aggregation degree.
    ///
    /// # Errors
    /// Aggregation conflicts and page allocation failures.
    pub fn compress(&mut self, node: u64, targets: &[u64], properties: &[&[u64]], degree: u32) -> Result<u32> {
        let index = self.shared.index(node);
        let degree = self.buffer.prepare(node, targets, properties, degree)?;
        if degree > 0 {
            self.properties.write(index, self.buffer.properties())?;
            self.buffer.delta_encode();
            self.writer.write(index, self.buffer.targets())?;
        }
        self.shared.record(index, degree);
        Ok(degree as u32)
    }
}

/// Read side of the packed codec.
#[derive(Debug)]
pub struct PackedAdjacencyList {
    arena: PageArena<u64>,
    degrees: Arc<[u32]>,
    offsets: Arc<[u64]>,
    tail: PackedTail,
    stats: CodecStats,
}

impl PackedAdjacencyList {
    pub(crate) fn new(
        arena: PageArena<u64>,
        degrees: Arc<[u32]>,
        offsets: Arc<[u64]>,
        tail: PackedTail,
        stats: CodecStats,
    ) -> Self {
        Self {
            arena,
            degrees,
            offsets,
            tail,
            stats,
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.degrees.len()
    }

    /// Post-aggregation degree of `node`.
    #[inline]
    pub fn degree(&self, node: u64) -> u32 {
        self.degrees[node as usize]
    }

    pub(crate) fn source(&self, node: u64) -> (BlockSource<'_>, usize) {
        let degree = self.degree(node) as usize;
        if degree == 0 {
            return (BlockSource::Empty, 0);
        }
        let words = self.arena.slice_from(self.offsets[node as usize]);
        (BlockSource::Packed(PackedReader::new(words, degree, self.tail)), degree)
    }

    /// Cursor over the targets of `node`.
    pub fn adjacency_cursor(&self, node: u64, fallback_value: f64) -> AdjacencyCursor<'_> {
        let (source, degree) = self.source(node);
        AdjacencyCursor::new(source, degree, fallback_value)
    }

    /// An unpositioned cursor for [`Self::init_cursor`].
    pub fn raw_adjacency_cursor(&self) -> AdjacencyCursor<'_> {
        AdjacencyCursor::empty()
    }

    /// Repositions `cursor` at the start of `node`'s targets.
    pub fn init_cursor<'a>(&'a self, cursor: &mut AdjacencyCursor<'a>, node: u64, fallback_value: f64) {
        let (source, degree) = self.source(node);
        cursor.reset(source, degree, fallback_value);
    }

    /// Block pages off heap, shared arrays on heap, plus header statistics.
    pub fn memory_info(&self) -> MemoryInfo {
        let bookkeeping = (self.degrees.len() * 4 + self.offsets.len() * 8) as u64;
        MemoryInfo {
            pages: self.arena.page_count(),
            bytes_on_heap: bookkeeping,
            bytes_off_heap: self.arena.size_in_bytes(),
            native_allocations: self.stats.allocations.clone(),
            header_bits: Some(self.stats.header_bits.clone()),
            header_allocations: Some(self.stats.header_allocations.clone()),
            ..MemoryInfo::default()
        }
    }

    /// Pages of the word arena.
    pub fn page_count(&self) -> usize {
        self.arena.page_count()
    }

    /// Tail layout the lists were written with.
    pub fn tail(&self) -> PackedTail {
        self.tail
    }
}
