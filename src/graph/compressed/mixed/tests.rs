//! Tests for degree-based codec routing.

use crate::config::{Aggregation, CompressionConfig, PropertyConfig, PACKING_DEGREE_THRESHOLD};
use crate::graph::compressed::factory::{
    AdjacencyCompressorFactory, AdjacencyList, AdjacencyProperties, CompressedRelationships,
};

use super::*;

fn build(config: CompressionConfig, lists: &[Vec<u64>], weights: Option<&[Vec<f64>]>) -> CompressedRelationships {
    let mut factory = AdjacencyCompressorFactory::new(lists.len(), config).unwrap();
    factory.init().unwrap();
    {
        let mut compressor = factory.create_compressor().unwrap();
        for (node, targets) in lists.iter().enumerate() {
            let bits: Vec<u64>;
            let properties: Vec<&[u64]> = match weights {
                Some(weights) => {
                    bits = weights[node].iter().map(|w| w.to_bits()).collect();
                    vec![bits.as_slice()]
                }
                None => Vec::new(),
            };
            compressor.compress(node as u64, targets, &properties, targets.len() as u32).unwrap();
        }
    }
    factory.build(false).unwrap()
}

fn mixed(relationships: &CompressedRelationships) -> &MixedAdjacencyList {
    match relationships.adjacency() {
        AdjacencyList::Mixed(list) => list,
        other => panic!("expected a mixed list, got {other:?}"),
    }
}

fn distinct(len: u64) -> Vec<u64> {
    (0..len).map(|i| i * 3 + 1).collect()
}

#[test]
fn threshold_is_eight_blocks() {
    assert_eq!(PACKING_DEGREE_THRESHOLD, 512);
    assert!(!CompressionConfig::default().use_packing(512));
    assert!(CompressionConfig::default().use_packing(513));
}

#[test]
fn degree_at_threshold_stays_varint() {
    let built = build(CompressionConfig::default(), &[distinct(512)], None);
    let list = mixed(&built);
    assert!(!list.is_packed(0));
    assert_eq!(list.varlong().page_count(), 1);
    assert_eq!(list.packed().page_count(), 0);
    assert_eq!(list.adjacency_cursor(0, 0.0).collect::<Vec<_>>(), distinct(512));
}

#[test]
fn degree_above_threshold_is_packed() {
    let built = build(CompressionConfig::default(), &[distinct(513)], None);
    let list = mixed(&built);
    assert!(list.is_packed(0));
    assert_eq!(list.varlong().page_count(), 0);
    assert_eq!(list.packed().page_count(), 1);
    assert_eq!(list.adjacency_cursor(0, 0.0).collect::<Vec<_>>(), distinct(513));
}

#[test]
fn routing_uses_degree_after_aggregation() {
    // 600 raw targets collapse to 300 under SUM
    let targets: Vec<u64> = (0..300).flat_map(|t| [t, t]).collect();
    let weights = vec![vec![0.5; 600]];
    let config = CompressionConfig::default().with_property(PropertyConfig::new("w", Aggregation::Sum));
    let built = build(config, &[targets], Some(weights.as_slice()));
    let list = mixed(&built);

    assert_eq!(list.degree(0), 300);
    assert!(!list.is_packed(0));
    assert_eq!(list.packed().page_count(), 0);
    let mut values = built.property_cursor(0, 0, f64::NAN).unwrap();
    assert_eq!(values.size(), 300);
    assert!((0..300).all(|_| values.next_value() == 1.0));
}

#[test]
fn properties_follow_their_codec() {
    let lists = vec![distinct(600), distinct(10)];
    let weights: Vec<Vec<f64>> = lists.iter().map(|l| l.iter().map(|&t| t as f64 / 2.0).collect()).collect();
    let config = CompressionConfig::default().with_property(PropertyConfig::new("w", Aggregation::None));
    let built = build(config, &lists, Some(weights.as_slice()));

    let AdjacencyProperties::Mixed(channel) = built.properties(0).unwrap() else {
        panic!("expected mixed properties");
    };
    assert_eq!(channel.packed().values(0).len(), 600);
    assert_eq!(channel.varlong().values(1).len(), 10);
    for node in 0..2u64 {
        let mut cursor = channel.property_cursor(node, 0.0);
        for target in built.adjacency_cursor(node, 0.0) {
            assert_eq!(cursor.next_value(), target as f64 / 2.0);
        }
        assert!(!cursor.has_next());
    }
}

#[test]
fn memory_info_merges_both_sides() {
    let built = build(CompressionConfig::default(), &[distinct(600), distinct(10)], None);
    let list = mixed(&built);
    let info = list.memory_info();
    let varlong = list.varlong().memory_info();
    let packed = list.packed().memory_info();

    assert_eq!(info.pages, 2);
    assert_eq!(info.bytes_on_heap, varlong.bytes_on_heap);
    assert_eq!(info.bytes_off_heap, packed.bytes_off_heap);
    assert_eq!(info.heap_allocations.count(), 1);
    assert_eq!(info.native_allocations.count(), 1);
    assert_eq!(info.header_allocations.unwrap().sum(), 10);
}
