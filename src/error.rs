//! Error taxonomy for compression and read-side access.
//!
//! Encoding invariant violations (a value overflowing its bit width, unsorted
//! targets, a node compressed twice) are programming errors and panic. Everything
//! here is a configuration or resource condition the caller has to see.

use thiserror::Error;

/// Errors surfaced by the compression core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompressionError {
    /// A duplicate `(source, target)` pair was found while aggregation is disabled.
    #[error(
        "duplicate relationship {node} -> {target}{} while aggregation is disabled",
        property_suffix(.property)
    )]
    AggregationConflict {
        /// Source node of the duplicate pair.
        node: u64,
        /// Target node of the duplicate pair.
        target: u64,
        /// First declared property, if the relationship type carries any.
        property: Option<String>,
    },

    /// A property channel was requested that was never compressed.
    #[error("relationship property #{index} is not present ({available} properties were compressed)")]
    MissingProperty {
        /// Requested property index.
        index: usize,
        /// Number of property channels that exist.
        available: usize,
    },

    /// An operation was called in the wrong lifecycle state.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// A page could not be allocated.
    #[error("failed to allocate a page of {bytes} bytes")]
    Allocation {
        /// Requested page size in bytes.
        bytes: usize,
    },

    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn property_suffix(property: &Option<String>) -> String {
    match property {
        Some(name) => format!(" (property `{name}`)"),
        None => String::new(),
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = CompressionError> = core::result::Result<T, E>;
