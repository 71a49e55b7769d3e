//! Block decoder for bit-packed adjacency lists.

use zerocopy::AsBytes;

use crate::config::{PackedTail, BLOCK_SIZE};
use crate::graph::compressed::{bit_packer, varint};

use super::header_len;

/// Walks a node's header widths and block words, restoring absolute targets.
#[derive(Debug, Clone)]
pub(crate) struct PackedReader<'a> {
    words: &'a [u64],
    widths: &'a [u8],
    block: usize,
    word_position: usize,
    tail_position: usize,
    remaining: usize,
    last: u64,
    tail: PackedTail,
}

impl<'a> PackedReader<'a> {
    /// `words` starts at the node's first header word.
    pub(crate) fn new(words: &'a [u64], degree: usize, tail: PackedTail) -> Self {
        let headers = header_len(degree, tail);
        let header_words = headers.div_ceil(8);
        Self {
            words,
            widths: &words[..header_words].as_bytes()[..headers],
            block: 0,
            word_position: header_words,
            tail_position: 0,
            remaining: degree,
            last: 0,
            tail,
        }
    }

    pub(crate) fn fill(&mut self, out: &mut [u64; BLOCK_SIZE]) -> usize {
        let len = self.remaining.min(BLOCK_SIZE);
        let out = &mut out[..len];
        if let Some(&bits) = self.widths.get(self.block) {
            self.block += 1;
            let bits = u32::from(bits);
            let used = bit_packer::unpack(&self.words[self.word_position..], bits, out);
            self.word_position += match self.tail {
                PackedTail::Padded => bits as usize,
                PackedTail::Packed | PackedTail::VarLong => used,
            };
        } else {
            let bytes = self.words[self.word_position..].as_bytes();
            for slot in out.iter_mut() {
                *slot = varint::decode(bytes, &mut self.tail_position);
            }
        }
        for slot in out.iter_mut() {
            self.last += *slot;
            *slot = self.last;
        }
        self.remaining -= len;
        len
    }
}
