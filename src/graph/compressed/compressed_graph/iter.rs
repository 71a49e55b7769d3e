//! Lockstep iteration over targets and property values.

use crate::graph::compressed::cursor::{AdjacencyCursor, PropertyCursor};

/// Yields `(target, value)` pairs of one node.
///
/// Without a property channel every value is the fallback.
pub struct RelationshipIter<'a> {
    targets: AdjacencyCursor<'a>,
    values: Option<PropertyCursor<'a>>,
}

impl<'a> RelationshipIter<'a> {
    #[inline]
    pub(crate) fn new(targets: AdjacencyCursor<'a>, values: Option<PropertyCursor<'a>>) -> Self {
        Self { targets, values }
    }
}

impl Iterator for RelationshipIter<'_> {
    type Item = (u64, f64);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let target = self.targets.next()?;
        let value = match &mut self.values {
            Some(values) => values.next_value(),
            None => self.targets.fallback_value(),
        };
        Some((target, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.targets.size_hint()
    }
}

impl ExactSizeIterator for RelationshipIter<'_> {}
