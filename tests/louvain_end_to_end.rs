use colgraph::algo::{coarsen, modularity};
use colgraph::concurrency::worker_pool;
use colgraph::graph::{Aggregation, Edge, GraphLoader, Orientation, RelationshipProjection};
use colgraph::{AllocationTracker, Graph, Louvain, LouvainConfig, PagedArray, TerminationFlag};
use std::sync::Arc;

const A: u64 = 11;
const B: u64 = 22;
const C: u64 = 33;
const D: u64 = 44;
const E: u64 = 55;

fn path(concurrency: usize) -> Graph {
    let edges = [Edge::new(A, B), Edge::new(B, C), Edge::new(C, D), Edge::new(D, E)];
    GraphLoader::new(RelationshipProjection::new(
        Orientation::Undirected,
        Aggregation::Single,
    ))
    .concurrency(concurrency)
    .load([A, B, C, D, E], &edges)
    .unwrap()
}

fn mapped(graph: &Graph, original: u64) -> u64 {
    graph.to_mapped_node_id(original).unwrap()
}

#[test]
fn path_neighbors_of_b() {
    for concurrency in [1, 4] {
        let graph = path(concurrency);
        let mut neighbors = Vec::new();
        graph.for_each_relationship(mapped(&graph, B), 1.0, |_, target, _| {
            neighbors.push(graph.to_original_node_id(target));
            true
        });
        assert_eq!(neighbors, vec![A, C]);
    }
}

#[test]
fn one_level_merges_the_path_ends() {
    let graph = path(1);
    let result = Louvain::new(LouvainConfig::default().with_max_level(1).with_concurrency(1))
        .compute(&graph)
        .unwrap();
    assert_eq!(result.levels(), 1);

    let community = |original| result.community(0, mapped(&graph, original));
    assert_eq!(community(A), community(B));
    assert_eq!(community(D), community(E));
    assert_ne!(community(A), community(E));

    // c may sit with either side or alone; the score decides, not the ids.
    let found = modularity(&graph, |n| result.community(0, n), 1.0);
    assert!((found - result.modularities()[0]).abs() < 1e-12);
    let c_alone = modularity(
        &graph,
        |n| match graph.to_original_node_id(n) {
            A | B => 0,
            C => 1,
            _ => 2,
        },
        1.0,
    );
    assert!(found >= c_alone - 1e-12);
    assert!(found > modularity(&graph, |n| n, 1.0));
}

#[test]
fn one_level_in_parallel_improves_modularity() {
    let graph = path(4);
    let result = Louvain::new(LouvainConfig::default().with_max_level(1).with_concurrency(4))
        .compute(&graph)
        .unwrap();
    let found = modularity(&graph, |n| result.community(0, n), 1.0);
    assert!(found > modularity(&graph, |n| n, 1.0));
}

#[test]
fn zero_levels_mean_an_empty_dendrogram() {
    let result = Louvain::new(LouvainConfig::default().with_max_level(0))
        .compute(&path(2))
        .unwrap();
    assert!(result.dendrogram().is_empty());
}

#[test]
fn cancellation_never_corrupts_levels() {
    let termination = TerminationFlag::new();
    termination.terminate();
    let result = Louvain::new(LouvainConfig::default().with_max_level(3))
        .with_termination(termination)
        .compute(&path(2))
        .unwrap();
    assert!(result.cancelled());
    for level in result.dendrogram() {
        assert_eq!(level.to_vec(), (0..5).collect::<Vec<_>>());
    }
}

fn caveman(cliques: u64, size: u64) -> Vec<Edge> {
    let mut edges = Vec::new();
    for c in 0..cliques {
        let base = c * size;
        for i in 0..size {
            for j in (i + 1)..size {
                edges.push(Edge::new(base + i, base + j));
            }
        }
        // Ring of cliques.
        edges.push(Edge::new(base + size - 1, ((c + 1) % cliques) * size));
    }
    edges
}

#[test]
fn dendrogram_levels_coarsen_monotonically() {
    let (cliques, size) = (12, 5);
    let graph = GraphLoader::new(RelationshipProjection::new(
        Orientation::Undirected,
        Aggregation::Single,
    ))
    .concurrency(4)
    .load(0..cliques * size, &caveman(cliques, size))
    .unwrap();

    let result = Louvain::new(LouvainConfig::default().with_max_level(4).with_concurrency(4))
        .compute(&graph)
        .unwrap();
    assert_eq!(result.levels(), 4);

    let distinct = |level: &PagedArray<u64>| {
        let mut ids = level.to_vec();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    };
    let counts: Vec<usize> = result.dendrogram().iter().map(distinct).collect();
    assert!(counts.windows(2).all(|w| w[1] <= w[0]), "{counts:?}");
    assert!(counts[0] <= cliques as usize);

    // Nodes merged on one level stay merged on every later one.
    for pair in result.dendrogram().windows(2) {
        for u in graph.nodes() {
            for v in graph.nodes() {
                if pair[0].get(u) == pair[0].get(v) {
                    assert_eq!(pair[1].get(u), pair[1].get(v));
                }
            }
        }
    }
    for level in 0..result.levels() {
        let on_input = modularity(&graph, |n| result.community(level, n), 1.0);
        assert!((on_input - result.modularities()[level]).abs() < 1e-9);
    }
    assert!(result.modularities()[0] > 0.5);
}

#[test]
fn coarsening_conserves_weight_and_keeps_self_loops() {
    let graph = GraphLoader::new(RelationshipProjection::new(
        Orientation::Undirected,
        Aggregation::Single,
    ))
    .concurrency(2)
    .load(0..20, &caveman(4, 5))
    .unwrap();
    let communities: PagedArray<u64> = graph.nodes().map(|n| (n / 5) * 5).collect();
    let pool = worker_pool(3).unwrap();
    let summary = coarsen(&graph, &communities, &pool, &Arc::new(AllocationTracker::new())).unwrap();

    assert_eq!(summary.node_count(), 4);
    assert_eq!(
        summary.total_relationship_weight(1.0),
        graph.total_relationship_weight(1.0)
    );
    for node in summary.nodes() {
        let self_loop: f64 = summary
            .relationships(node, 1.0)
            .filter(|&(t, _)| t == node)
            .map(|(_, w)| w)
            .sum();
        // Ten intra-clique edges, stored in both directions.
        assert_eq!(self_loop, 20.0);
    }
    // Dense ids, no gaps.
    let mut originals: Vec<u64> = summary.nodes().map(|n| summary.to_original_node_id(n)).collect();
    originals.sort_unstable();
    assert_eq!(originals, vec![0, 5, 10, 15]);
}
