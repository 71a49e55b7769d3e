//! Visited sets for graph traversals.
//!
//! Traversals express their visited logic through this type, so the storage
//! choice lives in one place. `VisitedSet` is word-packed: one bit per node.

/// A dense, word-packed visited set for a fixed number of nodes.
pub(crate) struct VisitedSet {
    words: Vec<u64>,
    len: usize,
}

impl VisitedSet {
    #[inline]
    pub(crate) fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` iff `node` was not visited yet, and marks it visited.
    ///
    /// # Panics
    /// Panics if `node >= self.len()`.
    #[inline(always)]
    pub(crate) fn try_visit(&mut self, node: usize) -> bool {
        assert!(node < self.len, "node {node} is out of range for {} nodes", self.len);
        let (word, mask) = (node / 64, 1u64 << (node % 64));
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }
}
