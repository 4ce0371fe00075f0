//! Tests for local-move modularity optimization.

use std::sync::Arc;

use super::*;
use crate::graph::{Aggregation, Edge, GraphLoader, Orientation, RelationshipProjection};

fn undirected(node_count: u64, edges: &[(u64, u64)]) -> Graph {
    let edges: Vec<Edge> = edges.iter().map(|&(s, t)| Edge::new(s, t)).collect();
    GraphLoader::new(RelationshipProjection::new(
        Orientation::Undirected,
        Aggregation::Single,
    ))
    .concurrency(1)
    .load(0..node_count, &edges)
    .unwrap()
}

fn two_triangles() -> Graph {
    undirected(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
}

#[test]
fn score_of_known_assignments() {
    let graph = undirected(4, &[(0, 1), (2, 3)]);
    let paired = modularity(&graph, |n| n / 2, 1.0);
    assert!((paired - 0.5).abs() < 1e-12);
    let singletons = modularity(&graph, |n| n, 1.0);
    assert!((singletons + 0.25).abs() < 1e-12);
    let halved = modularity(&graph, |n| n / 2, 0.5);
    assert!((halved - 0.75).abs() < 1e-12);
}

#[test]
fn score_of_empty_graph_is_zero() {
    let graph = undirected(3, &[]);
    assert_eq!(modularity(&graph, |n| n, 1.0), 0.0);
}

#[test]
fn separates_two_triangles() {
    let graph = two_triangles();
    let mut optimizer = ModularityOptimization::new(&graph).concurrency(1);
    optimizer.compute().unwrap();

    let c = |n| optimizer.community_id(n);
    assert_eq!(c(0), c(1));
    assert_eq!(c(1), c(2));
    assert_eq!(c(3), c(4));
    assert_eq!(c(4), c(5));
    assert_ne!(c(2), c(3));
    assert!(optimizer.did_converge());
    assert!(!optimizer.was_cancelled());
    assert!(optimizer.iterations() >= 2);

    let expected = modularity(&graph, |n| n / 3, 1.0);
    assert!((optimizer.modularity() - expected).abs() < 1e-12);
}

#[test]
fn parallel_run_improves_modularity() {
    let graph = two_triangles();
    let mut optimizer = ModularityOptimization::new(&graph).concurrency(4);
    optimizer.compute().unwrap();
    assert!(optimizer.modularity() > modularity(&graph, |n| n, 1.0));
    for node in graph.nodes() {
        assert!(optimizer.community_id(node) < graph.node_count());
    }
}

#[test]
fn isolated_nodes_stay_alone() {
    let graph = undirected(3, &[(0, 1)]);
    let mut optimizer = ModularityOptimization::new(&graph).concurrency(1);
    optimizer.compute().unwrap();
    assert_eq!(optimizer.community_id(2), 2);
}

#[test]
fn zero_iterations_keep_the_seed() {
    let graph = two_triangles();
    let mut optimizer = ModularityOptimization::new(&graph)
        .concurrency(1)
        .max_iterations(0);
    optimizer.compute().unwrap();
    assert_eq!(optimizer.communities().to_vec(), (0..6).collect::<Vec<_>>());
    assert_eq!(optimizer.iterations(), 0);
    assert!(!optimizer.did_converge());
}

#[test]
fn cancelled_before_start_is_trivial() {
    let graph = two_triangles();
    let termination = TerminationFlag::new();
    termination.terminate();
    let mut optimizer = ModularityOptimization::new(&graph)
        .concurrency(2)
        .termination(termination);
    optimizer.compute().unwrap();
    assert!(optimizer.was_cancelled());
    assert_eq!(optimizer.iterations(), 0);
    assert_eq!(optimizer.communities().to_vec(), (0..6).collect::<Vec<_>>());
}

#[test]
fn seed_sets_the_starting_assignment() {
    let graph = two_triangles();
    let seed: Arc<dyn NodeProperties> = Arc::new(vec![9.0, 9.0, 9.0, 4.0, 4.0, 4.0]);
    let mut optimizer = ModularityOptimization::new(&graph)
        .concurrency(1)
        .seed(seed)
        .max_iterations(0);
    optimizer.compute().unwrap();
    assert_eq!(optimizer.communities().to_vec(), vec![0, 0, 0, 3, 3, 3]);
}

#[test]
fn optimal_seed_is_already_converged() {
    let graph = two_triangles();
    let seed: Arc<dyn NodeProperties> = Arc::new(vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    let mut optimizer = ModularityOptimization::new(&graph).concurrency(1).seed(seed);
    optimizer.compute().unwrap();
    assert!(optimizer.did_converge());
    assert_eq!(optimizer.iterations(), 1);
    assert_eq!(optimizer.communities().to_vec(), vec![0, 0, 0, 3, 3, 3]);
}

#[test]
fn release_returns_scratch_to_the_tracker() {
    let graph = two_triangles();
    let tracker = Arc::new(AllocationTracker::new());
    let mut optimizer = ModularityOptimization::new(&graph)
        .concurrency(1)
        .tracker(Arc::clone(&tracker));
    optimizer.compute().unwrap();
    let with_scratch = tracker.in_use();
    assert!(with_scratch >= 6 * OPTIMIZER_BYTES_PER_NODE);

    optimizer.release();
    assert!(tracker.in_use() < with_scratch);
    assert_eq!(optimizer.community_id(0), optimizer.community_id(1));

    drop(optimizer);
    assert_eq!(tracker.in_use(), 0);
}

#[test]
fn scratch_respects_the_memory_ceiling() {
    let graph = two_triangles();
    let mut optimizer = ModularityOptimization::new(&graph)
        .concurrency(1)
        .tracker(Arc::new(AllocationTracker::with_limit(16)));
    assert!(matches!(
        optimizer.compute(),
        Err(Error::MemoryLimitExceeded { .. })
    ));
}

#[test]
fn rejects_invalid_settings() {
    let graph = two_triangles();
    let mut optimizer = ModularityOptimization::new(&graph).resolution(0.0);
    assert!(matches!(
        optimizer.compute(),
        Err(Error::InvalidConfig {
            name: "resolution",
            ..
        })
    ));
    let mut optimizer = ModularityOptimization::new(&graph).concurrency(0);
    assert!(matches!(
        optimizer.compute(),
        Err(Error::InvalidConfig {
            name: "concurrency",
            ..
        })
    ));
}

#[test]
fn weights_steer_the_assignment() {
    let edges = [
        Edge::weighted(0, 1, 10.0),
        Edge::weighted(1, 2, 0.1),
        Edge::weighted(2, 3, 10.0),
    ];
    let projection = RelationshipProjection::new(Orientation::Undirected, Aggregation::Sum)
        .with_weight(crate::property::PropertyMapping::of("w", "weight", 1.0));
    let graph = GraphLoader::new(projection)
        .concurrency(1)
        .load(0..4, &edges)
        .unwrap();
    let mut optimizer = ModularityOptimization::new(&graph).concurrency(1);
    optimizer.compute().unwrap();
    assert_eq!(optimizer.community_id(0), optimizer.community_id(1));
    assert_eq!(optimizer.community_id(2), optimizer.community_id(3));
    assert_ne!(optimizer.community_id(1), optimizer.community_id(2));
}
