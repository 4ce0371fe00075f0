use criterion::{black_box, criterion_group, criterion_main, Criterion};
use colgraph::graph::{Aggregation, Edge, GraphLoader, Orientation, RelationshipProjection};
use colgraph::{Louvain, LouvainConfig, ModularityOptimization};

/// Ring of dense cliques joined by single edges.
fn caveman(cliques: u64, size: u64) -> Vec<Edge> {
    let mut edges = Vec::new();
    for c in 0..cliques {
        let base = c * size;
        for i in 0..size {
            for j in (i + 1)..size {
                edges.push(Edge::new(base + i, base + j));
            }
        }
        edges.push(Edge::new(base + size - 1, ((c + 1) % cliques) * size));
    }
    edges
}

fn bench_louvain(c: &mut Criterion) {
    let (cliques, size) = (2_000, 8);
    let graph = GraphLoader::new(RelationshipProjection::new(
        Orientation::Undirected,
        Aggregation::Single,
    ))
    .load(0..cliques * size, &caveman(cliques, size))
    .unwrap();

    c.bench_function("modularity_optimization", |b| {
        b.iter(|| {
            let mut optimizer = ModularityOptimization::new(&graph).concurrency(4);
            optimizer.compute().unwrap();
            black_box(optimizer.did_converge())
        });
    });

    let louvain = Louvain::new(LouvainConfig::default().with_max_level(3).with_concurrency(4));
    c.bench_function("louvain_three_levels", |b| {
        b.iter(|| black_box(louvain.compute(&graph).unwrap().levels()));
    });
}

criterion_group!(benches, bench_louvain);
criterion_main!(benches);
