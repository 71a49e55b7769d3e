use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graphpack::{CompressedGraph, CompressionConfig, CompressionStrategy};

fn adjacency(size: usize, edges_per_node: usize) -> Vec<Vec<u64>> {
    (0..size)
        .map(|i| {
            // Pseudo-random edges
            (0..edges_per_node).map(|j| ((i + j * 17) % size) as u64).collect()
        })
        .collect()
}

fn bench_from_adjacency(c: &mut Criterion) {
    let mut group = c.benchmark_group("compressed_graph_from_adjacency");
    for (size, edges_per_node) in [(10_000, 50), (1_000, 1_000)] {
        let adjacency = adjacency(size, edges_per_node);
        for strategy in [CompressionStrategy::DeltaVarint, CompressionStrategy::Packed, CompressionStrategy::Mixed] {
            let config = CompressionConfig::default().with_strategy(strategy);
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}"), format!("{size}x{edges_per_node}")),
                &adjacency,
                |b, adjacency| {
                    b.iter(|| black_box(CompressedGraph::from_adjacency(adjacency, config.clone()).unwrap()));
                },
            );
        }
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let adjacency = adjacency(10_000, 600);
    let graph = CompressedGraph::from_adjacency(&adjacency, CompressionConfig::default()).unwrap();

    c.bench_function("compressed_graph_exists", |b| {
        b.iter(|| {
            for i in 0..100u64 {
                black_box(graph.exists(i * 37, i * 101 % 10_000));
            }
        });
    });

    c.bench_function("compressed_graph_bfs", |b| {
        b.iter(|| black_box(graph.bfs(0)));
    });
}

criterion_group!(benches, bench_from_adjacency, bench_queries);
criterion_main!(benches);
