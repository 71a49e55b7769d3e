use graphpack::{
    AdjacencyCompressorFactory, AdjacencyList, Aggregation, CompressedRelationships, CompressionConfig,
    CompressionError, CompressionStrategy, PackedTail, PropertyConfig, ValueType,
};

fn compress(config: CompressionConfig, lists: &[Vec<u64>], properties: &[Vec<Vec<u64>>]) -> CompressedRelationships {
    let mut factory = AdjacencyCompressorFactory::new(lists.len(), config).unwrap();
    factory.init().unwrap();
    {
        let mut compressor = factory.create_compressor().unwrap();
        for (node, targets) in lists.iter().enumerate() {
            let channels: Vec<&[u64]> = properties.iter().map(|channel| channel[node].as_slice()).collect();
            compressor
                .compress(node as u64, targets, &channels, targets.len() as u32)
                .unwrap();
        }
    }
    factory.build(true).unwrap()
}

fn doubles(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

#[test]
fn test_sum_aggregation_merges_duplicate_targets() {
    let config = CompressionConfig::default().with_property(PropertyConfig::new("weight", Aggregation::Sum));
    let built = compress(
        config,
        &[vec![5, 5, 9, 20]],
        &[vec![doubles(&[1.0, 2.0, 3.0, 4.0])]],
    );

    assert_eq!(built.degree(0), 3);
    let targets: Vec<u64> = built.adjacency_cursor(0, f64::NAN).collect();
    let mut values = built.property_cursor(0, 0, f64::NAN).unwrap();
    let weights: Vec<f64> = (0..3).map(|_| values.next_value()).collect();
    assert_eq!(targets, vec![5, 9, 20]);
    assert_eq!(weights, vec![3.0, 3.0, 4.0]);
}

#[test]
fn test_long_properties_aggregate_as_integers() {
    let config = CompressionConfig::default().with_property(
        PropertyConfig::new("hops", Aggregation::Min).with_value_type(ValueType::Long),
    );
    let values: Vec<u64> = [7i64, -3, 4].iter().map(|&v| v as u64).collect();
    let built = compress(config, &[vec![1, 1, 1]], &[vec![values]]);

    assert_eq!(built.degree(0), 1);
    let mut cursor = built.property_cursor(0, 0, 0.0).unwrap();
    assert_eq!(cursor.next_long() as i64, -3);
}

#[test]
fn test_count_aggregation_counts_runs() {
    let config = CompressionConfig::default().with_property(PropertyConfig::new("n", Aggregation::Count));
    let built = compress(
        config,
        &[vec![2, 2, 2, 8, 9, 9]],
        &[vec![doubles(&[0.0; 6])]],
    );
    let mut cursor = built.property_cursor(0, 0, f64::NAN).unwrap();
    let counts: Vec<f64> = (0..3).map(|_| cursor.next_value()).collect();
    assert_eq!(counts, vec![3.0, 1.0, 2.0]);
}

#[test]
fn test_duplicates_kept_without_aggregation() {
    let built = compress(CompressionConfig::default(), &[vec![1, 1, 4, 4, 4]], &[]);
    assert_eq!(built.degree(0), 5);
    assert_eq!(built.relationship_count(), 5);
    assert_eq!(built.adjacency_cursor(0, 0.0).collect::<Vec<_>>(), vec![1, 1, 4, 4, 4]);
}

#[test]
fn test_single_aggregation_without_properties() {
    let config = CompressionConfig::default().with_aggregation(Aggregation::Single);
    let built = compress(config, &[vec![1, 1, 4, 4, 4]], &[]);
    assert_eq!(built.degree(0), 2);
    assert_eq!(built.adjacency_cursor(0, 0.0).collect::<Vec<_>>(), vec![1, 4]);
}

#[test]
fn test_mixed_routing_by_degree() {
    let lists = vec![(0..600).map(|i| i * 11).collect::<Vec<u64>>(), (0..10).collect()];
    let built = compress(CompressionConfig::default(), &lists, &[]);

    let AdjacencyList::Mixed(mixed) = built.adjacency() else {
        panic!("default strategy is mixed");
    };
    assert!(mixed.is_packed(0));
    assert!(!mixed.is_packed(1));
    for (node, targets) in lists.iter().enumerate() {
        assert_eq!(&built.adjacency_cursor(node as u64, 0.0).collect::<Vec<_>>(), targets);
    }
}

#[test]
fn test_every_strategy_and_tail_agrees() {
    let lists: Vec<Vec<u64>> = (0..40u64)
        .map(|node| (0..node * 37).map(|i| i * (node + 1) + node).collect())
        .collect();
    let weights: Vec<Vec<u64>> = lists.iter().map(|l| l.iter().map(|&t| t ^ 0xff).collect()).collect();

    for strategy in [CompressionStrategy::DeltaVarint, CompressionStrategy::Packed, CompressionStrategy::Mixed] {
        for tail in [PackedTail::Padded, PackedTail::Packed, PackedTail::VarLong] {
            let config = CompressionConfig::default()
                .with_strategy(strategy)
                .with_packed_tail(tail)
                .with_page_shift(10)
                .with_property(PropertyConfig::new("raw", Aggregation::None).with_value_type(ValueType::Long));
            let built = compress(config, &lists, &[weights.clone()]);

            for (node, targets) in lists.iter().enumerate() {
                let node = node as u64;
                let decoded: Vec<u64> = built.adjacency_cursor(node, 0.0).collect();
                assert_eq!(&decoded, targets, "{strategy:?} / {tail:?} node {node}");
                let properties = built.properties(0).unwrap();
                assert_eq!(properties.values(node), weights[node as usize].as_slice());
            }
        }
    }
}

#[test]
fn test_conflict_reports_node_target_and_property() {
    let config = CompressionConfig::default()
        .with_no_aggregation(true)
        .with_property(PropertyConfig::new("cost", Aggregation::Sum));
    let mut factory = AdjacencyCompressorFactory::new(8, config).unwrap();
    factory.init().unwrap();
    let mut compressor = factory.create_compressor().unwrap();
    let values = doubles(&[1.0, 1.0, 1.0]);

    assert_eq!(compressor.compress(6, &[0, 3, 4], &[&values], 3).unwrap(), 3);
    let err = compressor.compress(7, &[2, 9, 9], &[&values], 3).unwrap_err();
    assert_eq!(
        err,
        CompressionError::AggregationConflict {
            node: 7,
            target: 9,
            property: Some("cost".to_owned()),
        }
    );
}

#[test]
fn test_degree_prefix_is_compressed() {
    let built = compress(CompressionConfig::default(), &[vec![]], &[]);
    assert_eq!(built.degree(0), 0);

    let mut factory = AdjacencyCompressorFactory::new(1, CompressionConfig::default()).unwrap();
    factory.init().unwrap();
    {
        let mut compressor = factory.create_compressor().unwrap();
        assert_eq!(compressor.compress(0, &[3, 4, 5, 6], &[], 2).unwrap(), 2);
    }
    let built = factory.build(false).unwrap();
    assert_eq!(built.adjacency_cursor(0, 0.0).collect::<Vec<_>>(), vec![3, 4]);
}
