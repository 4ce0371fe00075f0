use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use colgraph::graph::{Aggregation, Edge, GraphLoader, Orientation, RelationshipProjection};
use colgraph::PropertyMapping;

fn pseudo_random_edges(nodes: u64, per_node: u64) -> Vec<Edge> {
    (0..nodes)
        .flat_map(|i| (0..per_node).map(move |j| Edge::weighted(i, (i * 31 + j * 17 + 7) % nodes, 1.0)))
        .collect()
}

fn bench_load(c: &mut Criterion) {
    let nodes = 50_000;
    let edges = pseudo_random_edges(nodes, 20);

    let mut group = c.benchmark_group("graph_load");
    for concurrency in [1, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            &concurrency,
            |b, &concurrency| {
                let loader = GraphLoader::new(
                    RelationshipProjection::new(Orientation::Undirected, Aggregation::Sum)
                        .with_weight(PropertyMapping::of("w", "weight", 1.0)),
                )
                .concurrency(concurrency);
                b.iter(|| black_box(loader.load(0..nodes, &edges).unwrap()));
            },
        );
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let nodes = 50_000;
    let graph = GraphLoader::new(RelationshipProjection::new(
        Orientation::Undirected,
        Aggregation::Single,
    ))
    .load(0..nodes, &pseudo_random_edges(nodes, 20))
    .unwrap();

    c.bench_function("graph_decode_all", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for node in graph.nodes() {
                graph.for_each_relationship(node, 1.0, |_, target, _| {
                    sum = sum.wrapping_add(target);
                    true
                });
            }
            black_box(sum)
        });
    });
}

criterion_group!(benches, bench_load, bench_decode);
criterion_main!(benches);
