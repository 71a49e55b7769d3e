use graphpack::concurrency::{compress_partition, range_partitions, RawAdjacency};
use graphpack::{AdjacencyCompressorFactory, Aggregation, CompressionConfig, PropertyConfig};

const NODES: u64 = 5_000;

fn load(node: u64, raw: &mut RawAdjacency) {
    // every third node is a hub above the packing threshold
    let degree = if node % 3 == 0 { 520 + node % 90 } else { node % 40 };
    for i in 0..degree {
        let target = (node + i * 13) % NODES;
        raw.targets.push(target);
        raw.properties[0].push(1.0f64.to_bits());
    }
    let mut pairs: Vec<(u64, u64)> = raw.targets.drain(..).zip(raw.properties[0].drain(..)).collect();
    pairs.sort_unstable_by_key(|&(t, _)| t);
    for (t, w) in pairs {
        raw.targets.push(t);
        raw.properties[0].push(w);
    }
}

fn config() -> CompressionConfig {
    CompressionConfig::default()
        .with_page_shift(14)
        .with_property(PropertyConfig::new("weight", Aggregation::Sum))
}

fn check(built: &graphpack::CompressedRelationships) {
    let mut raw = RawAdjacency::default();
    let mut total = 0;
    for node in 0..NODES {
        raw.clear(1);
        load(node, &mut raw);
        let mut expected: Vec<(u64, f64)> = Vec::new();
        for &target in &raw.targets {
            match expected.last_mut() {
                Some((last, weight)) if *last == target => *weight += 1.0,
                _ => expected.push((target, 1.0)),
            }
        }
        total += expected.len() as u64;

        let mut weights = built.property_cursor(node, 0, f64::NAN).unwrap();
        let decoded: Vec<(u64, f64)> = built
            .adjacency_cursor(node, f64::NAN)
            .map(|t| (t, weights.next_value()))
            .collect();
        assert_eq!(decoded, expected, "node {node}");
    }
    assert_eq!(built.relationship_count(), total);
}

#[test]
fn test_scoped_threads_import() {
    let mut factory = AdjacencyCompressorFactory::new(NODES as usize, config()).unwrap();
    factory.init().unwrap();
    let partitions = range_partitions(NODES, 8);

    let total: u64 = std::thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .iter()
            .map(|&partition| {
                let factory = &factory;
                scope.spawn(move || {
                    let mut compressor = factory.create_compressor().unwrap();
                    compress_partition(&mut compressor, partition, 1, load).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let built = factory.build(true).unwrap();
    assert_eq!(total, built.relationship_count());
    check(&built);
}

#[cfg(feature = "parallel")]
#[test]
fn test_rayon_import() {
    use graphpack::concurrency::compress_parallel;

    let mut factory = AdjacencyCompressorFactory::new(NODES as usize, config()).unwrap();
    factory.init().unwrap();
    let partitions = range_partitions(NODES, 16);
    let total = compress_parallel(&factory, &partitions, load).unwrap();

    let built = factory.build(false).unwrap();
    assert_eq!(total, built.relationship_count());
    check(&built);
}

#[test]
fn test_memory_info_after_import() {
    let mut factory = AdjacencyCompressorFactory::new(NODES as usize, config()).unwrap();
    factory.init().unwrap();
    for partition in range_partitions(NODES, 4) {
        let mut compressor = factory.create_compressor().unwrap();
        compress_partition(&mut compressor, partition, 1, load).unwrap();
    }
    let built = factory.build(true).unwrap();
    let info = built.adjacency().memory_info();

    assert!(info.bytes_on_heap > 0);
    assert!(info.bytes_off_heap > 0);
    let hubs = (0..NODES).filter(|n| n % 3 == 0).count() as u64;
    assert_eq!(info.native_allocations.count(), hubs);
    assert_eq!(info.header_allocations.as_ref().map(|h| h.count()), Some(hubs));
}
