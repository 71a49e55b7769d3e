//! Memory accounting for built adjacency structures.

use serde::{Deserialize, Serialize};

const BUCKETS: usize = 65;

/// Histogram of recorded values with power-of-two buckets.
///
/// Bucket `i` counts values whose bit length is `i`, so bucket 0 holds zeros and
/// bucket 64 holds values with the top bit set. Recording bit widths (0..=64)
/// therefore keeps one exact bucket per width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStatistics {
    count: u64,
    sum: u64,
    min: u64,
    max: u64,
    buckets: Vec<u64>,
}

impl Default for BlockStatistics {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: u64::MAX,
            max: 0,
            buckets: vec![0; BUCKETS],
        }
    }
}

impl BlockStatistics {
    /// An empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one value.
    #[inline]
    pub fn record(&mut self, value: u64) {
        self.count += 1;
        self.sum = self.sum.saturating_add(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.buckets[(u64::BITS - value.leading_zeros()) as usize] += 1;
    }

    /// Adds every observation of `other`.
    pub fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.sum = self.sum.saturating_add(other.sum);
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        for (mine, theirs) in self.buckets.iter_mut().zip(&other.buckets) {
            *mine += theirs;
        }
    }

    /// Number of recorded values.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of recorded values.
    #[inline]
    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// Smallest recorded value, if any.
    pub fn min(&self) -> Option<u64> {
        (self.count > 0).then_some(self.min)
    }

    /// Largest recorded value, if any.
    pub fn max(&self) -> Option<u64> {
        (self.count > 0).then_some(self.max)
    }

    /// Arithmetic mean, `0.0` when empty.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    /// Count in the bucket of values with the given bit length.
    pub fn bucket(&self, bit_length: u32) -> u64 {
        self.buckets.get(bit_length as usize).copied().unwrap_or(0)
    }

    /// Upper bound of the bucket containing the `percentile`-th value (0..=100).
    ///
    /// Precision is one power of two; the result never exceeds [`Self::max`].
    pub fn value_at_percentile(&self, percentile: f64) -> Option<u64> {
        if self.count == 0 {
            return None;
        }
        let rank = ((percentile.clamp(0.0, 100.0) / 100.0) * self.count as f64).ceil() as u64;
        let rank = rank.max(1);
        let mut seen = 0;
        for (bits, &n) in self.buckets.iter().enumerate() {
            seen += n;
            if seen >= rank {
                let upper = match bits {
                    0 => 0,
                    64 => u64::MAX,
                    b => (1u64 << b) - 1,
                };
                return Some(upper.min(self.max));
            }
        }
        Some(self.max)
    }
}

/// Page counts, byte counts and allocation histograms of a built structure.
///
/// *On-heap* bytes are the delta-varint byte pages plus the shared degree and
/// offset arrays. *Off-heap* bytes are the word-aligned block storage of the
/// packed codec, the only codec that keeps native 64-bit block memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Number of arena pages, oversize pages included.
    pub pages: usize,
    /// Bytes in byte pages and bookkeeping arrays.
    pub bytes_on_heap: u64,
    /// Bytes in packed block pages.
    pub bytes_off_heap: u64,
    /// Bytes allocated per node in byte pages.
    pub heap_allocations: BlockStatistics,
    /// Bytes allocated per node in packed pages.
    pub native_allocations: BlockStatistics,
    /// Bit width of every packed block header entry.
    pub header_bits: Option<BlockStatistics>,
    /// Header bytes per packed node.
    pub header_allocations: Option<BlockStatistics>,
}

impl MemoryInfo {
    /// Total bytes if anything was accounted.
    pub fn bytes_total(&self) -> Option<u64> {
        let total = self.bytes_on_heap + self.bytes_off_heap;
        (total > 0).then_some(total)
    }

    /// Combines the delta-varint side (shared bookkeeping, byte pages) with the
    /// packed side (block pages and header statistics).
    ///
    /// Degrees and offsets are shared between both codecs, so they are taken from
    /// `varlong` only.
    pub fn merge_mixed(varlong: &Self, packed: &Self) -> Self {
        Self {
            pages: varlong.pages + packed.pages,
            bytes_on_heap: varlong.bytes_on_heap,
            bytes_off_heap: packed.bytes_off_heap,
            heap_allocations: varlong.heap_allocations.clone(),
            native_allocations: packed.native_allocations.clone(),
            header_bits: packed.header_bits.clone(),
            header_allocations: packed.header_allocations.clone(),
        }
    }
}
