//! Per-compressor scratch space: copies one node's input, merges duplicate
//! targets and turns the survivors into deltas.

use crate::config::{Aggregation, CompressionConfig, ValueType};
use crate::error::{CompressionError, Result};

#[derive(Debug, Clone, Copy)]
struct Channel {
    aggregation: Aggregation,
    value_type: ValueType,
}

impl Channel {
    #[inline]
    fn combine(self, acc: u64, next: u64) -> u64 {
        match (self.aggregation, self.value_type) {
            (Aggregation::Sum, ValueType::Double) => (f64::from_bits(acc) + f64::from_bits(next)).to_bits(),
            (Aggregation::Sum, ValueType::Long) => (acc as i64).wrapping_add(next as i64) as u64,
            (Aggregation::Min, ValueType::Double) => f64::from_bits(acc).min(f64::from_bits(next)).to_bits(),
            (Aggregation::Min, ValueType::Long) => (acc as i64).min(next as i64) as u64,
            (Aggregation::Max, ValueType::Double) => f64::from_bits(acc).max(f64::from_bits(next)).to_bits(),
            (Aggregation::Max, ValueType::Long) => (acc as i64).max(next as i64) as u64,
            _ => acc,
        }
    }

    #[inline]
    fn count(self, run: usize) -> u64 {
        match self.value_type {
            ValueType::Double => (run as f64).to_bits(),
            ValueType::Long => run as u64,
        }
    }
}

/// Reusable buffers for one node at a time.
pub(crate) struct AdjacencyBuffer {
    targets: Vec<u64>,
    properties: Vec<Vec<u64>>,
    channels: Vec<Channel>,
    first_property: Option<String>,
    merge: bool,
    no_aggregation: bool,
}

impl AdjacencyBuffer {
    pub(crate) fn new(config: &CompressionConfig) -> Self {
        Self {
            targets: Vec::new(),
            properties: vec![Vec::new(); config.property_count()],
            channels: config
                .properties
                .iter()
                .map(|p| Channel {
                    aggregation: p.aggregation.resolve(),
                    value_type: p.value_type,
                })
                .collect(),
            first_property: config.properties.first().map(|p| p.name.clone()),
            merge: config.merges_duplicates(),
            no_aggregation: config.no_aggregation,
        }
    }

    /// Loads the first `degree` entries of the input and aggregates duplicates.
    ///
    /// Returns the post-aggregation degree.
    ///
    /// # Errors
    /// [`CompressionError::AggregationConflict`] for a duplicate while `no_aggregation` is set.
    ///
    /// # Panics
    /// Panics if `degree` exceeds the input, the property count does not match
    /// the configuration, or the targets are not sorted.
    pub(crate) fn prepare(
        &mut self,
        node: u64,
        targets: &[u64],
        properties: &[&[u64]],
        degree: u32,
    ) -> Result<usize> {
        let degree = degree as usize;
        assert!(
            degree <= targets.len(),
            "degree {degree} of node {node} exceeds {} input targets",
            targets.len()
        );
        assert_eq!(
            properties.len(),
            self.properties.len(),
            "node {node} carries {} property channels, {} were declared",
            properties.len(),
            self.properties.len()
        );
        let targets = &targets[..degree];
        let mut duplicate = None;
        for (i, pair) in targets.windows(2).enumerate() {
            assert!(
                pair[0] <= pair[1],
                "targets of node {node} are not sorted at index {}: {} > {}",
                i + 1,
                pair[0],
                pair[1]
            );
            if duplicate.is_none() && pair[0] == pair[1] {
                duplicate = Some(pair[0]);
            }
        }

        self.targets.clear();
        for (buffer, values) in self.properties.iter_mut().zip(properties) {
            assert!(
                values.len() >= degree,
                "property channel of node {node} holds {} values for degree {degree}",
                values.len()
            );
            buffer.clear();
        }

        match duplicate {
            Some(target) if self.no_aggregation => {
                tracing::debug!(node, target, property = ?self.first_property, "aggregation conflict");
                Err(CompressionError::AggregationConflict {
                    node,
                    target,
                    property: self.first_property.clone(),
                })
            }
            Some(_) if self.merge => {
                self.merge_runs(targets, properties);
                Ok(self.targets.len())
            }
            _ => {
                self.targets.extend_from_slice(targets);
                for (buffer, values) in self.properties.iter_mut().zip(properties) {
                    buffer.extend_from_slice(&values[..degree]);
                }
                Ok(degree)
            }
        }
    }

    fn merge_runs(&mut self, targets: &[u64], properties: &[&[u64]]) {
        let mut start = 0;
        while start < targets.len() {
            let target = targets[start];
            let end = start + targets[start..].iter().take_while(|&&t| t == target).count();
            self.targets.push(target);
            for ((buffer, values), channel) in self.properties.iter_mut().zip(properties).zip(&self.channels) {
                let value = if channel.aggregation == Aggregation::Count {
                    channel.count(end - start)
                } else {
                    values[start + 1..end]
                        .iter()
                        .fold(values[start], |acc, &v| channel.combine(acc, v))
                };
                buffer.push(value);
            }
            start = end;
        }
    }

    /// Rewrites the loaded targets as gaps; the first target stays absolute.
    pub(crate) fn delta_encode(&mut self) {
        for i in (1..self.targets.len()).rev() {
            self.targets[i] -= self.targets[i - 1];
        }
    }

    #[inline]
    pub(crate) fn targets(&self) -> &[u64] {
        &self.targets
    }

    #[inline]
    pub(crate) fn properties(&self) -> &[Vec<u64>] {
        &self.properties
    }
}
