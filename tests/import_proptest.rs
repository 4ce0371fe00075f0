use colgraph::graph::{Aggregation, Edge, GraphLoader, Orientation, RelationshipProjection};
use colgraph::PropertyMapping;
use proptest::prelude::*;
use std::collections::BTreeMap;

const NODES: u64 = 40;

fn edges() -> impl Strategy<Value = Vec<Edge>> {
    proptest::collection::vec(
        (0..NODES, 0..NODES, 0u8..8).prop_map(|(s, t, w)| Edge::weighted(s, t, f64::from(w))),
        0..300,
    )
}

/// Few nodes and non-integer weights, so parallel edges are common and
/// their sums round.
fn fractional_edges() -> impl Strategy<Value = Vec<Edge>> {
    proptest::collection::vec(
        (0..NODES / 4, 0..NODES / 4, 0.0f64..10.0).prop_map(|(s, t, w)| Edge::weighted(s, t, w)),
        0..200,
    )
}

fn projection(orientation: Orientation) -> RelationshipProjection {
    RelationshipProjection::new(orientation, Aggregation::Sum)
        .with_weight(PropertyMapping::of("w", "weight", 1.0))
}

proptest! {
    #[test]
    fn decoded_records_match_summed_input(edges in edges(), batch in 1usize..64) {
        let graph = GraphLoader::new(projection(Orientation::Natural))
            .concurrency(3)
            .batch_size(batch)
            .load(0..NODES, &edges)
            .unwrap();

        let mut expected: BTreeMap<(u64, u64), f64> = BTreeMap::new();
        for e in &edges {
            *expected.entry((e.source, e.target)).or_insert(0.0) += e.weight.unwrap_or(1.0);
        }

        let mut decoded = BTreeMap::new();
        for node in graph.nodes() {
            let mut previous = None;
            for (target, weight) in graph.relationships(node, 1.0) {
                prop_assert!(previous.map_or(true, |p| p < target), "targets must ascend");
                previous = Some(target);
                decoded.insert((node, target), weight);
            }
        }
        prop_assert_eq!(decoded, expected);
        prop_assert_eq!(graph.relationship_count(), graph.nodes().map(|n| graph.degree(n)).sum::<u64>());
    }

    #[test]
    fn build_is_identical_across_concurrency(edges in edges(), batch in 1usize..64) {
        let load = |concurrency: usize, batch_size: usize| {
            GraphLoader::new(projection(Orientation::Undirected))
                .concurrency(concurrency)
                .batch_size(batch_size)
                .load(0..NODES, &edges)
                .unwrap()
        };
        let one = load(1, 10_000);
        let many = load(4, batch);
        prop_assert_eq!(one.adjacency().bytes(), many.adjacency().bytes());
        for node in one.nodes() {
            prop_assert_eq!(
                one.relationships(node, 1.0).collect::<Vec<_>>(),
                many.relationships(node, 1.0).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn fractional_sums_are_identical_across_concurrency(
        edges in fractional_edges(),
        batch in 1usize..16,
        concurrency in 2usize..6,
    ) {
        let load = |concurrency: usize, batch_size: usize| {
            GraphLoader::new(projection(Orientation::Undirected))
                .concurrency(concurrency)
                .batch_size(batch_size)
                .load(0..NODES / 4, &edges)
                .unwrap()
        };
        let one = load(1, 10_000);
        let many = load(concurrency, batch);
        prop_assert_eq!(one.adjacency().bytes(), many.adjacency().bytes());
        for node in one.nodes() {
            let bits = |graph: &colgraph::Graph| {
                graph
                    .relationships(node, 1.0)
                    .map(|(target, weight)| (target, weight.to_bits()))
                    .collect::<Vec<_>>()
            };
            prop_assert_eq!(bits(&one), bits(&many));
        }
    }

    #[test]
    fn id_mapping_is_dense(ids in proptest::collection::vec(any::<u64>(), 0..200)) {
        let graph = GraphLoader::new(RelationshipProjection::default())
            .concurrency(2)
            .load(ids.iter().copied(), &[])
            .unwrap();
        let mut distinct = ids.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(graph.node_count(), distinct.len() as u64);
        for node in graph.nodes() {
            let original = graph.to_original_node_id(node);
            prop_assert_eq!(graph.to_mapped_node_id(original), Some(node));
        }
    }
}
