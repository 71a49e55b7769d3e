//! Unsigned LEB128 varints: seven payload bits per byte, high bit set on every
//! byte except the last.

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Bytes needed to encode `value`.
#[inline]
pub fn encoded_len(value: u64) -> usize {
    let bits = (u64::BITS - value.leading_zeros()).max(1) as usize;
    bits.div_ceil(7)
}

/// Bytes needed to encode every value of `values`.
pub fn encoded_len_all(values: &[u64]) -> usize {
    values.iter().map(|&v| encoded_len(v)).sum()
}

/// Writes `value` at the start of `dst` and returns the number of bytes written.
///
/// # Panics
/// Panics if `dst` is shorter than [`encoded_len`]`(value)`.
#[inline]
pub fn encode(mut value: u64, dst: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            dst[i] = byte;
            return i + 1;
        }
        dst[i] = byte | 0x80;
        i += 1;
    }
}

/// Writes all `values` back to back and returns the number of bytes written.
pub fn encode_all(values: &[u64], dst: &mut [u8]) -> usize {
    values
        .iter()
        .fold(0, |pos, &value| pos + encode(value, &mut dst[pos..]))
}

/// Decodes one varint at `*pos`, advancing `pos` past it.
///
/// # Panics
/// Panics on truncated input or encodings longer than 64 bits; both mean the
/// reader lost track of the node's region.
#[inline]
pub fn decode(src: &[u8], pos: &mut usize) -> u64 {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *src
            .get(*pos)
            .unwrap_or_else(|| panic!("varint truncated at byte {pos}", pos = *pos));
        *pos += 1;
        result |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return result;
        }
        shift += 7;
        assert!(shift < 64, "varint longer than {MAX_VARINT_LEN} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_follow_seven_bit_groups() {
        assert_eq!(encoded_len(0), 1);
        assert_eq!(encoded_len(127), 1);
        assert_eq!(encoded_len(128), 2);
        assert_eq!(encoded_len(16_383), 2);
        assert_eq!(encoded_len(16_384), 3);
        assert_eq!(encoded_len(u64::MAX), MAX_VARINT_LEN);
    }

    #[test]
    fn decodes_what_was_encoded() {
        let values = [0, 1, 127, 128, 300, 1 << 35, u64::MAX];
        let mut buf = vec![0u8; encoded_len_all(&values)];
        assert_eq!(encode_all(&values, &mut buf), buf.len());

        let mut pos = 0;
        for &v in &values {
            assert_eq!(decode(&buf, &mut pos), v);
        }
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn known_encoding_of_300() {
        let mut buf = [0u8; 2];
        encode(300, &mut buf);
        assert_eq!(buf, [0xac, 0x02]);
    }

    #[test]
    #[should_panic(expected = "truncated")]
    fn truncated_input_panics() {
        let mut pos = 0;
        decode(&[0x80], &mut pos);
    }
}
