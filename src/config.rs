//! Construction-time configuration for the compression core.
//!
//! Everything here is fixed before the first node is compressed. The packing
//! threshold is a single named constant so the codec boundary can be tested on
//! its own; it was picked empirically and carries no semantic meaning beyond
//! "long enough for per-block headers to amortize".

use serde::{Deserialize, Serialize};

use crate::error::{CompressionError, Result};

/// Number of deltas packed together under one bit-width header byte.
pub const BLOCK_SIZE: usize = 64;

/// Degrees strictly above this value are routed to the packed codec.
pub const PACKING_DEGREE_THRESHOLD: usize = BLOCK_SIZE * 8;

/// Default log2 of the arena page size in bytes (256 KiB pages).
pub const DEFAULT_PAGE_SHIFT: u32 = 18;

/// Smallest accepted page shift (one 64-byte cache line).
pub const MIN_PAGE_SHIFT: u32 = 6;

/// Largest accepted page shift (1 GiB pages).
pub const MAX_PAGE_SHIFT: u32 = 30;

/// How duplicate `(source, target)` pairs are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Aggregation {
    /// Resolves to [`Aggregation::None`].
    #[default]
    Default,
    /// Keep every duplicate verbatim.
    None,
    /// Keep one edge and the first property value.
    Single,
    /// Keep one edge, summing property values.
    Sum,
    /// Keep one edge with the smallest property value.
    Min,
    /// Keep one edge with the largest property value.
    Max,
    /// Keep one edge whose property is the number of duplicates.
    Count,
}

impl Aggregation {
    /// Replaces [`Aggregation::Default`] with the concrete policy it stands for.
    #[inline]
    pub fn resolve(self) -> Self {
        match self {
            Self::Default => Self::None,
            other => other,
        }
    }

    /// Whether runs of equal targets collapse into a single edge.
    #[inline]
    pub fn merges_duplicates(self) -> bool {
        self.resolve() != Self::None
    }
}

/// Interpretation of the raw 64-bit property words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueType {
    /// `f64` stored via `to_bits`.
    #[default]
    Double,
    /// `i64` stored via `as u64`.
    Long,
}

/// One declared relationship property channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyConfig {
    /// Property key, used in diagnostics.
    pub name: String,
    /// How the raw words are interpreted when aggregating.
    pub value_type: ValueType,
    /// Duplicate handling for this channel.
    pub aggregation: Aggregation,
    /// Value reported by graph lookups that miss.
    pub default_value: f64,
}

impl PropertyConfig {
    /// A `Double` property with the given aggregation and a `NaN` default.
    pub fn new(name: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::Double,
            aggregation,
            default_value: f64::NAN,
        }
    }

    /// Sets the value type.
    #[must_use]
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default_value(mut self, default_value: f64) -> Self {
        self.default_value = default_value;
        self
    }
}

/// Which codec(s) the factory hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompressionStrategy {
    /// Every node uses delta-varint encoding.
    DeltaVarint,
    /// Every node uses bit-packed blocks.
    Packed,
    /// Degree-adaptive choice between the two.
    #[default]
    Mixed,
}

/// Layout of the final, partial block of a packed adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PackedTail {
    /// Pad with zero deltas to a full block.
    #[default]
    Padded,
    /// Pack exactly the remaining values at the block's width.
    Packed,
    /// Varint-encode the remaining values after the packed blocks.
    VarLong,
}

/// Configuration consumed by [`crate::AdjacencyCompressorFactory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Codec selection.
    pub strategy: CompressionStrategy,
    /// Duplicate handling for relationship types without properties.
    pub aggregation: Aggregation,
    /// Declared property channels, in input order.
    pub properties: Vec<PropertyConfig>,
    /// When set, any duplicate pair is an [`CompressionError::AggregationConflict`].
    pub no_aggregation: bool,
    /// Degrees strictly above this use the packed codec under [`CompressionStrategy::Mixed`].
    pub packing_threshold: usize,
    /// Tail block layout for the packed codec.
    pub packed_tail: PackedTail,
    /// log2 of the page size in bytes.
    pub page_shift: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            strategy: CompressionStrategy::Mixed,
            aggregation: Aggregation::Default,
            properties: Vec::new(),
            no_aggregation: false,
            packing_threshold: PACKING_DEGREE_THRESHOLD,
            packed_tail: PackedTail::Padded,
            page_shift: DEFAULT_PAGE_SHIFT,
        }
    }
}

impl CompressionConfig {
    /// Sets the strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: CompressionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the adjacency aggregation.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Appends a property channel.
    #[must_use]
    pub fn with_property(mut self, property: PropertyConfig) -> Self {
        self.properties.push(property);
        self
    }

    /// Sets the `no_aggregation` assertion.
    #[must_use]
    pub fn with_no_aggregation(mut self, no_aggregation: bool) -> Self {
        self.no_aggregation = no_aggregation;
        self
    }

    /// Sets the packing threshold.
    #[must_use]
    pub fn with_packing_threshold(mut self, threshold: usize) -> Self {
        self.packing_threshold = threshold;
        self
    }

    /// Sets the packed tail layout.
    #[must_use]
    pub fn with_packed_tail(mut self, tail: PackedTail) -> Self {
        self.packed_tail = tail;
        self
    }

    /// Sets the page shift.
    #[must_use]
    pub fn with_page_shift(mut self, page_shift: u32) -> Self {
        self.page_shift = page_shift;
        self
    }

    /// Number of declared property channels.
    #[inline]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Whether runs of equal targets collapse into one edge.
    pub fn merges_duplicates(&self) -> bool {
        if self.properties.is_empty() {
            self.aggregation.merges_duplicates()
        } else {
            self.properties.iter().any(|p| p.aggregation.merges_duplicates())
        }
    }

    /// Codec routing rule for [`CompressionStrategy::Mixed`].
    #[inline]
    pub fn use_packing(&self, degree: usize) -> bool {
        degree > self.packing_threshold
    }

    /// Rejects configurations the arenas cannot honor.
    ///
    /// # Errors
    /// [`CompressionError::InvalidConfiguration`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PAGE_SHIFT..=MAX_PAGE_SHIFT).contains(&self.page_shift) {
            return Err(CompressionError::InvalidConfiguration(format!(
                "page_shift must be within {MIN_PAGE_SHIFT}..={MAX_PAGE_SHIFT}, got {}",
                self.page_shift
            )));
        }
        if self.packing_threshold == 0 && self.strategy == CompressionStrategy::Mixed {
            return Err(CompressionError::InvalidConfiguration(
                "packing_threshold must be positive for the mixed strategy".to_owned(),
            ));
        }
        if let Some(p) = self.properties.iter().find(|p| p.name.is_empty()) {
            return Err(CompressionError::InvalidConfiguration(format!(
                "property names must not be empty ({p:?})"
            )));
        }
        Ok(())
    }
}
