//! Forward-only cursors over decoded adjacency lists and property values.
//!
//! An [`AdjacencyCursor`] decodes one block of up to [`BLOCK_SIZE`] targets at a
//! time into an inline buffer and hands them out in ascending order. Which codec
//! fills the buffer is a variant of [`BlockSource`], so both codecs share every
//! navigation method and no call is dynamically dispatched.
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `next_target` / `peek_target` | \(O(1)\) amortized | One block decode per 64 values |
//! | `advance` / `skip_until` | \(O(k)\) | Whole blocks below the target are skipped |
//! | `advance_by(n)` | \(O(n)\) | Skipped blocks are still decoded |
//! | `clone` | \(O(1)\) | Copies the 512-byte block buffer |

use crate::config::BLOCK_SIZE;

use super::packed::reader::PackedReader;
use super::varlong::reader::VarLongReader;

/// Returned by navigation methods once the cursor is exhausted.
pub const NOT_FOUND: u64 = u64::MAX;

/// Decoder feeding an [`AdjacencyCursor`] one block at a time.
#[derive(Debug, Clone)]
pub(crate) enum BlockSource<'a> {
    Empty,
    DeltaVarint(VarLongReader<'a>),
    Packed(PackedReader<'a>),
}

impl BlockSource<'_> {
    /// Decodes the next block of absolute targets into `out`, returning its length.
    #[inline]
    fn fill(&mut self, out: &mut [u64; BLOCK_SIZE]) -> usize {
        match self {
            Self::Empty => 0,
            Self::DeltaVarint(reader) => reader.fill(out),
            Self::Packed(reader) => reader.fill(out),
        }
    }
}

/// Single-pass cursor over one node's targets in ascending order.
///
/// Cursors are cheap to clone; a clone continues independently from the same
/// position.
#[derive(Debug, Clone)]
pub struct AdjacencyCursor<'a> {
    source: BlockSource<'a>,
    block: [u64; BLOCK_SIZE],
    block_len: usize,
    position: usize,
    remaining: usize,
    size: usize,
    fallback: f64,
}

impl<'a> AdjacencyCursor<'a> {
    /// An unpositioned cursor with nothing to yield.
    pub fn empty() -> Self {
        Self {
            source: BlockSource::Empty,
            block: [0; BLOCK_SIZE],
            block_len: 0,
            position: 0,
            remaining: 0,
            size: 0,
            fallback: f64::NAN,
        }
    }

    pub(crate) fn new(source: BlockSource<'a>, degree: usize, fallback: f64) -> Self {
        let mut cursor = Self::empty();
        cursor.reset(source, degree, fallback);
        cursor
    }

    /// Repositions the cursor on another decoder without reallocating.
    pub(crate) fn reset(&mut self, source: BlockSource<'a>, degree: usize, fallback: f64) {
        self.source = source;
        self.block_len = 0;
        self.position = 0;
        self.remaining = degree;
        self.size = degree;
        self.fallback = fallback;
    }

    #[inline]
    fn refill(&mut self) {
        self.block_len = self.source.fill(&mut self.block);
        self.position = 0;
        debug_assert!(self.block_len > 0, "source ran dry with {} targets left", self.remaining);
    }

    #[inline]
    fn ensure_block(&mut self) {
        if self.position == self.block_len {
            self.refill();
        }
    }

    /// Whether another target is available.
    #[inline(always)]
    pub fn has_next(&self) -> bool {
        self.remaining > 0
    }

    /// Number of targets not yet consumed.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Total number of targets of the node.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Property value the cursor was opened with.
    #[inline(always)]
    pub fn fallback_value(&self) -> f64 {
        self.fallback
    }

    /// Consumes and returns the next target, or [`NOT_FOUND`].
    #[inline]
    pub fn next_target(&mut self) -> u64 {
        if self.remaining == 0 {
            return NOT_FOUND;
        }
        self.ensure_block();
        let value = self.block[self.position];
        self.position += 1;
        self.remaining -= 1;
        value
    }

    /// Returns the next target without consuming it, or [`NOT_FOUND`].
    #[inline]
    pub fn peek_target(&mut self) -> u64 {
        if self.remaining == 0 {
            return NOT_FOUND;
        }
        self.ensure_block();
        self.block[self.position]
    }

    /// Consumes targets up to and including the first one `>= target`, returning it.
    ///
    /// Returns [`NOT_FOUND`] and leaves the cursor exhausted if no such target exists.
    pub fn advance(&mut self, target: u64) -> u64 {
        while self.remaining > 0 {
            self.ensure_block();
            let in_block = self.block_len - self.position;
            if self.block[self.block_len - 1] < target {
                self.remaining -= in_block;
                self.position = self.block_len;
                continue;
            }
            let skip = self.block[self.position..self.block_len]
                .iter()
                .take_while(|&&v| v < target)
                .count();
            self.position += skip;
            self.remaining -= skip;
            return self.next_target();
        }
        NOT_FOUND
    }

    /// Consumes targets up to and including the first one `> target`, returning it.
    pub fn skip_until(&mut self, target: u64) -> u64 {
        match target.checked_add(1) {
            Some(next) => self.advance(next),
            None => {
                self.advance_by(self.remaining);
                NOT_FOUND
            }
        }
    }

    /// Skips `n` targets and consumes the one after them.
    ///
    /// Returns [`NOT_FOUND`] if fewer than `n + 1` targets remain; the cursor is then exhausted.
    pub fn advance_by(&mut self, mut n: usize) -> u64 {
        if n >= self.remaining {
            while self.remaining > 0 {
                self.ensure_block();
                self.remaining -= self.block_len - self.position;
                self.position = self.block_len;
            }
            return NOT_FOUND;
        }
        while n > 0 {
            self.ensure_block();
            let step = n.min(self.block_len - self.position);
            self.position += step;
            self.remaining -= step;
            n -= step;
        }
        self.next_target()
    }
}

impl Default for AdjacencyCursor<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl Iterator for AdjacencyCursor<'_> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        self.has_next().then(|| self.next_target())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for AdjacencyCursor<'_> {}

/// Cursor over one node's values of one property channel, parallel to its targets.
#[derive(Debug, Clone)]
pub struct PropertyCursor<'a> {
    values: &'a [u64],
    position: usize,
    fallback: f64,
}

impl<'a> PropertyCursor<'a> {
    pub(crate) fn new(values: &'a [u64], fallback: f64) -> Self {
        Self {
            values,
            position: 0,
            fallback,
        }
    }

    /// A cursor with nothing to yield.
    pub fn empty(fallback: f64) -> Self {
        Self::new(&[], fallback)
    }

    /// Whether another value is available.
    #[inline(always)]
    pub fn has_next(&self) -> bool {
        self.position < self.values.len()
    }

    /// Number of values not yet consumed.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.values.len() - self.position
    }

    /// Total number of values.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Consumes the next raw 64-bit value; the fallback's bits once exhausted.
    #[inline]
    pub fn next_long(&mut self) -> u64 {
        match self.values.get(self.position) {
            Some(&raw) => {
                self.position += 1;
                raw
            }
            None => self.fallback.to_bits(),
        }
    }

    /// Consumes the next value as `f64`, substituting the fallback for `NaN`.
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        let value = f64::from_bits(self.next_long());
        if value.is_nan() {
            self.fallback
        } else {
            value
        }
    }
}
