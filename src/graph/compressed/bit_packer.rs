//! Fixed-width bit packing of one block of deltas.
//!
//! A block is stored as `ceil(len * bits / 64)` little-endian words with value
//! `i` occupying bits `i * bits .. (i + 1) * bits` of the concatenated words.
//! The width is chosen per block from the bitwise OR of all values, so a full
//! block of [`BLOCK_SIZE`](crate::config::BLOCK_SIZE) values at width `b` takes
//! exactly `b` words and an all-zero block takes none.
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `bits_needed` | \(O(n)\) | One OR-reduction, one `leading_zeros` |
//! | `pack` | \(O(n)\) | Branch only on word straddles |
//! | `unpack` | \(O(n)\) | Same shape as `pack` |

/// Minimum width that holds every value of `values`, `0` for all zeros.
#[inline]
pub fn bits_needed(values: &[u64]) -> u32 {
    let union = values.iter().fold(0u64, |acc, &v| acc | v);
    u64::BITS - union.leading_zeros()
}

/// Words occupied by `len` values of `bits` width.
#[inline(always)]
pub const fn words_needed(len: usize, bits: u32) -> usize {
    (len * bits as usize).div_ceil(64)
}

#[inline(always)]
const fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Packs `values` at `bits` width into the front of `out`, returning the words used.
///
/// # Panics
/// Panics if a value does not fit into `bits` or `out` is too short. Either one
/// means the width was computed from different values.
pub fn pack(values: &[u64], bits: u32, out: &mut [u64]) -> usize {
    let words = words_needed(values.len(), bits);
    let out = &mut out[..words];
    out.fill(0);
    if bits == 0 {
        assert!(
            values.iter().all(|&v| v == 0),
            "non-zero value in a block packed at width 0"
        );
        return 0;
    }

    let width = bits as usize;
    for (i, &value) in values.iter().enumerate() {
        assert!(
            value & !mask(bits) == 0,
            "value {value} at index {i} overflows {bits}-bit block width"
        );
        let bit = i * width;
        let (word, shift) = (bit / 64, (bit % 64) as u32);
        out[word] |= value << shift;
        if shift as usize + width > 64 {
            out[word + 1] |= value >> (64 - shift);
        }
    }
    words
}

/// Unpacks `out.len()` values of `bits` width from the front of `input`.
///
/// Returns the number of words consumed.
pub fn unpack(input: &[u64], bits: u32, out: &mut [u64]) -> usize {
    if bits == 0 {
        out.fill(0);
        return 0;
    }
    let width = bits as usize;
    let m = mask(bits);
    for (i, slot) in out.iter_mut().enumerate() {
        let bit = i * width;
        let (word, shift) = (bit / 64, (bit % 64) as u32);
        let mut value = input[word] >> shift;
        if shift as usize + width > 64 {
            value |= input[word + 1] << (64 - shift);
        }
        *slot = value & m;
    }
    words_needed(out.len(), bits)
}
