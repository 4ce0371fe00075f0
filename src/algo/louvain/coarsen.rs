//! Graph coarsening: one node per community.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::collections::PagedArray;
use crate::concurrency::partition;
use crate::error::Result;
use crate::graph::loading::{DEFAULT_BATCH_SIZE, DEFAULT_WEIGHT};
use crate::graph::{
    Aggregation, Graph, IdMapBuilder, OriginalIdProperties, Orientation, RelationshipImporter,
    RelationshipProjection,
};
use crate::memory::AllocationTracker;
use crate::property::PropertyMapping;

/// Node property key under which a coarsened graph exposes, for every node,
/// the community id it stands for in the finer graph.
pub const ORIGINAL_ID_PROPERTY: &str = "originalId";

/// Builds the summary graph of `communities` over `graph`.
///
/// Summary nodes are the distinct community ids, numbered in order of first
/// appearance while scanning `graph`'s nodes; each summary node's original id
/// is its community id. Every stored relationship `s -> t` is re-emitted as
/// `c(s) -> c(t)` with its weight and parallel results are summed, so the
/// total weight is unchanged and intra-community relationships become
/// weighted self-loops.
pub fn coarsen(
    graph: &Graph,
    communities: &PagedArray<u64>,
    pool: &ThreadPool,
    tracker: &Arc<AllocationTracker>,
) -> Result<Graph> {
    coarsen_with_batch_size(graph, communities, pool, tracker, DEFAULT_BATCH_SIZE)
}

pub(crate) fn coarsen_with_batch_size(
    graph: &Graph,
    communities: &PagedArray<u64>,
    pool: &ThreadPool,
    tracker: &Arc<AllocationTracker>,
    batch_size: usize,
) -> Result<Graph> {
    let mut builder = IdMapBuilder::new();
    let mut summary_node = PagedArray::<u64>::new(graph.node_count(), tracker)?;
    summary_node.set_all(|node| builder.add_node(communities.get(node)));
    let id_map = Arc::new(builder.build());

    let projection = RelationshipProjection::new(Orientation::Natural, Aggregation::Sum)
        .with_weight(PropertyMapping::with(
            "weight",
            "weight",
            DEFAULT_WEIGHT,
            Aggregation::Sum,
        ));
    let importer = RelationshipImporter::new(Arc::clone(&id_map), projection)
        .with_batch_size(batch_size)
        .with_tracker(Arc::clone(tracker));

    let parts = partition(graph.node_count(), pool.current_num_threads());
    let segments = pool.install(|| {
        parts
            .par_iter()
            .map(|part| {
                let mut worker = importer.worker();
                for node in part.nodes() {
                    let source = summary_node.get(node);
                    for (target, weight) in graph.relationships(node, DEFAULT_WEIGHT) {
                        worker.add_mapped_edge(source, summary_node.get(target), weight)?;
                    }
                }
                worker.finish()
            })
            .collect::<Result<Vec<_>>>()
    })?;
    drop(summary_node);

    let adjacency = importer.build(segments, pool)?;
    let provenance = Arc::new(OriginalIdProperties::new(Arc::clone(&id_map)));
    // Every stored half-edge was imported as its own directed relationship.
    Ok(Graph::new(id_map, Arc::new(adjacency), Orientation::Natural)
        .with_node_properties(ORIGINAL_ID_PROPERTY, provenance))
}
