//! Tests for the factory lifecycle and the build barrier.

use super::*;
use crate::config::{Aggregation, PropertyConfig};

fn weighted() -> CompressionConfig {
    CompressionConfig::default().with_property(PropertyConfig::new("weight", Aggregation::Sum))
}

#[test]
fn lifecycle_states() {
    let mut factory = AdjacencyCompressorFactory::new(4, CompressionConfig::default()).unwrap();
    assert_eq!(factory.state(), FactoryState::Uninitialized);
    assert_eq!(
        factory.create_compressor().err(),
        Some(CompressionError::IllegalState("create_compressor called before init"))
    );

    factory.init().unwrap();
    assert_eq!(factory.state(), FactoryState::Initialized);
    assert!(matches!(factory.init(), Err(CompressionError::IllegalState(_))));

    let compressor = factory.create_compressor().unwrap();
    assert_eq!(factory.state(), FactoryState::Compressing);
    compressor.close();

    let built = factory.build(false).unwrap();
    assert_eq!(built.relationship_count(), 0);
    assert_eq!(built.degree(3), 0);
    assert_eq!(built.adjacency_cursor(3, 0.0).next(), None);
}

#[test]
fn build_before_init_is_rejected() {
    let factory = AdjacencyCompressorFactory::new(1, CompressionConfig::default()).unwrap();
    assert!(matches!(factory.build(true), Err(CompressionError::IllegalState(_))));
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = CompressionConfig::default().with_page_shift(2);
    assert!(matches!(
        AdjacencyCompressorFactory::new(1, config),
        Err(CompressionError::InvalidConfiguration(_))
    ));
}

#[test]
fn sum_aggregation_scenario() {
    let mut factory = AdjacencyCompressorFactory::new(1, weighted()).unwrap();
    factory.init().unwrap();
    let weights: Vec<u64> = [1.0f64, 2.0, 3.0, 4.0].iter().map(|w| w.to_bits()).collect();
    {
        let mut compressor = factory.create_compressor().unwrap();
        assert_eq!(compressor.compress(0, &[5, 5, 9, 20], &[&weights], 4).unwrap(), 3);
    }
    let built = factory.build(false).unwrap();
    assert_eq!(built.relationship_count(), 3);

    let mut values = built.property_cursor(0, 0, f64::NAN).unwrap();
    let pairs: Vec<(u64, f64)> = built
        .adjacency_cursor(0, f64::NAN)
        .map(|target| (target, values.next_value()))
        .collect();
    assert_eq!(pairs, vec![(5, 3.0), (9, 3.0), (20, 4.0)]);
}

#[test]
fn no_aggregation_surfaces_conflict() {
    let config = CompressionConfig::default()
        .with_no_aggregation(true)
        .with_property(PropertyConfig::new("weight", Aggregation::None));
    let mut factory = AdjacencyCompressorFactory::new(3, config).unwrap();
    factory.init().unwrap();
    let weights: Vec<u64> = [1.0f64, 2.0, 3.0, 4.0].iter().map(|w| w.to_bits()).collect();

    let mut compressor = factory.create_compressor().unwrap();
    let err = compressor.compress(2, &[5, 5, 9, 20], &[&weights], 4).unwrap_err();
    assert_eq!(
        err.to_string(),
        "duplicate relationship 2 -> 5 (property `weight`) while aggregation is disabled"
    );
}

#[test]
fn missing_property_channel() {
    let mut factory = AdjacencyCompressorFactory::new(1, CompressionConfig::default()).unwrap();
    factory.init().unwrap();
    let built = factory.build(false).unwrap();
    assert_eq!(
        built.property_cursor(0, 0, 0.0).err(),
        Some(CompressionError::MissingProperty { index: 0, available: 0 })
    );
}

#[test]
#[should_panic(expected = "compressed twice")]
fn compressing_a_node_twice_panics() {
    let mut factory = AdjacencyCompressorFactory::new(2, CompressionConfig::default()).unwrap();
    factory.init().unwrap();
    let mut first = factory.create_compressor().unwrap();
    let mut second = factory.create_compressor().unwrap();
    first.compress(1, &[0], &[], 1).unwrap();
    second.compress(1, &[0], &[], 1).unwrap();
}

#[test]
#[should_panic(expected = "compressed twice")]
fn compressing_a_node_again_as_empty_panics() {
    let mut factory = AdjacencyCompressorFactory::new(2, CompressionConfig::default()).unwrap();
    factory.init().unwrap();
    let mut first = factory.create_compressor().unwrap();
    let mut second = factory.create_compressor().unwrap();
    first.compress(1, &[0, 1, 2], &[], 3).unwrap();
    let _ = second.compress(1, &[], &[], 0);
}

#[test]
#[should_panic(expected = "compressed twice")]
fn compressing_an_empty_node_again_panics() {
    let mut factory = AdjacencyCompressorFactory::new(1, CompressionConfig::default()).unwrap();
    factory.init().unwrap();
    let mut compressor = factory.create_compressor().unwrap();
    compressor.compress(0, &[], &[], 0).unwrap();
    let _ = compressor.compress(0, &[4], &[], 1);
}

#[test]
fn failed_allocation_leaves_node_empty() {
    let small: Vec<u64> = (0..10).collect();
    let large: Vec<u64> = (0..300).map(|i| i * 1000).collect();
    let tiny: Vec<u64> = (20..25).collect();
    let weights = |targets: &[u64]| -> Vec<u64> { targets.iter().map(|&t| (t as f64).to_bits()).collect() };

    for reorder in [false, true] {
        let mut factory = AdjacencyCompressorFactory::new(3, weighted().with_page_shift(9)).unwrap();
        factory.init().unwrap();
        // one 512 byte page for all delta-varint targets
        factory.varlong.as_mut().unwrap().adjacency.limit_pages(1);
        {
            let mut compressor = factory.create_compressor().unwrap();
            assert_eq!(compressor.compress(0, &small, &[&weights(&small)], 10).unwrap(), 10);
            let err = compressor
                .compress(1, &large, &[&weights(&large)], 300)
                .unwrap_err();
            assert!(matches!(err, CompressionError::Allocation { bytes } if bytes >= 512), "{err}");
            assert_eq!(compressor.compress(2, &tiny, &[&weights(&tiny)], 5).unwrap(), 5);
        }
        let built = factory.build(reorder).unwrap();

        assert_eq!(built.relationship_count(), 15);
        assert_eq!(built.degree(1), 0);
        assert_eq!(built.adjacency_cursor(1, 0.0).next(), None);
        for (node, targets) in [(0, &small), (2, &tiny)] {
            let mut values = built.property_cursor(node, 0, f64::NAN).unwrap();
            let decoded: Vec<u64> = built.adjacency_cursor(node, 0.0).collect();
            assert_eq!(&decoded, targets);
            for &target in targets {
                assert_eq!(values.next_value(), target as f64);
            }
        }
    }
}

#[test]
#[should_panic(expected = "out of range")]
fn node_out_of_range_panics() {
    let mut factory = AdjacencyCompressorFactory::new(2, CompressionConfig::default()).unwrap();
    factory.init().unwrap();
    let mut compressor = factory.create_compressor().unwrap();
    let _ = compressor.compress(2, &[0], &[], 1);
}

#[test]
fn compressors_on_many_threads() {
    const NODES: u64 = 2_000;
    let targets_of = |node: u64| -> Vec<u64> { (0..node % 700).map(|i| i * 2 + node % 3).collect() };

    for reorder in [false, true] {
        let config = weighted().with_page_shift(12);
        let mut factory = AdjacencyCompressorFactory::new(NODES as usize, config).unwrap();
        factory.init().unwrap();
        std::thread::scope(|scope| {
            for worker in 0..4u64 {
                let factory = &factory;
                scope.spawn(move || {
                    let mut compressor = factory.create_compressor().unwrap();
                    for node in (worker..NODES).step_by(4) {
                        let targets = targets_of(node);
                        let weights: Vec<u64> = targets.iter().map(|&t| (t as f64).to_bits()).collect();
                        compressor
                            .compress(node, &targets, &[&weights], targets.len() as u32)
                            .unwrap();
                    }
                });
            }
        });
        let built = factory.build(reorder).unwrap();

        let expected: u64 = (0..NODES).map(|n| targets_of(n).len() as u64).sum();
        assert_eq!(built.relationship_count(), expected);
        for node in 0..NODES {
            let targets = targets_of(node);
            assert_eq!(built.degree(node) as usize, targets.len());
            let mut values = built.property_cursor(node, 0, f64::NAN).unwrap();
            for (target, expected) in built.adjacency_cursor(node, 0.0).zip(&targets) {
                assert_eq!(target, *expected);
                assert_eq!(values.next_value(), target as f64);
            }
        }
    }
}

#[test]
fn relationships_memory_info_counts_properties() {
    let mut factory = AdjacencyCompressorFactory::new(1, weighted()).unwrap();
    factory.init().unwrap();
    let weights = vec![0u64; 3];
    factory
        .create_compressor()
        .unwrap()
        .compress(0, &[1, 2, 3], &[&weights], 3)
        .unwrap();
    let built = factory.build(false).unwrap();

    let adjacency = built.adjacency().memory_info();
    let total = built.memory_info();
    assert_eq!(total.bytes_on_heap, adjacency.bytes_on_heap + 3 * 8);
    assert_eq!(total.pages, adjacency.pages + 1);
}
