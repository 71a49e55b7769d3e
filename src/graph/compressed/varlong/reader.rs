//! Block decoder for delta-varint adjacency lists.

use crate::config::BLOCK_SIZE;
use crate::graph::compressed::varint;

/// Decodes gaps from a byte region and restores absolute targets.
#[derive(Debug, Clone)]
pub(crate) struct VarLongReader<'a> {
    bytes: &'a [u8],
    position: usize,
    remaining: usize,
    last: u64,
}

impl<'a> VarLongReader<'a> {
    /// `bytes` starts at the node's first varint; `degree` varints follow.
    pub(crate) fn new(bytes: &'a [u8], degree: usize) -> Self {
        Self {
            bytes,
            position: 0,
            remaining: degree,
            last: 0,
        }
    }

    pub(crate) fn fill(&mut self, out: &mut [u64; BLOCK_SIZE]) -> usize {
        let len = self.remaining.min(BLOCK_SIZE);
        for slot in &mut out[..len] {
            self.last += varint::decode(self.bytes, &mut self.position);
            *slot = self.last;
        }
        self.remaining -= len;
        len
    }
}
