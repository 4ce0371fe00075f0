//! In-memory graph loading over a worker pool.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use super::{Orientation, RelationshipImporter, RelationshipProjection, DEFAULT_BATCH_SIZE};
use crate::concurrency::worker_pool;
use crate::error::Result;
use crate::graph::id_map::IdMap;
use crate::graph::view::Graph;
use crate::memory::{estimate_graph, AllocationTracker};

/// One input edge between original ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Original id of the source node.
    pub source: u64,
    /// Original id of the target node.
    pub target: u64,
    /// Weight, or `None` to use the projection's default weight.
    pub weight: Option<f64>,
}

impl Edge {
    /// An edge without a weight.
    pub const fn new(source: u64, target: u64) -> Self {
        Self {
            source,
            target,
            weight: None,
        }
    }

    /// An edge with a weight.
    pub const fn weighted(source: u64, target: u64, weight: f64) -> Self {
        Self {
            source,
            target,
            weight: Some(weight),
        }
    }
}

/// Loads a [`Graph`] from node ids and an edge slice.
///
/// The edge slice is split into one contiguous part per worker; each part is
/// fed through its own [`ImportWorker`](super::ImportWorker).
#[derive(Debug, Clone)]
pub struct GraphLoader {
    projection: RelationshipProjection,
    concurrency: usize,
    batch_size: usize,
    tracker: Arc<AllocationTracker>,
}

impl GraphLoader {
    /// A loader using all available cores.
    pub fn new(projection: RelationshipProjection) -> Self {
        Self {
            projection,
            concurrency: std::thread::available_parallelism().map_or(1, usize::from),
            batch_size: DEFAULT_BATCH_SIZE,
            tracker: Arc::new(AllocationTracker::empty()),
        }
    }

    /// Sets the worker count.
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the per-worker buffer length.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Attributes the loaded graph to `tracker`.
    #[must_use]
    pub fn tracker(mut self, tracker: Arc<AllocationTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Loads `edges` over the nodes `nodes`, mapped in iteration order.
    pub fn load(&self, nodes: impl IntoIterator<Item = u64>, edges: &[Edge]) -> Result<Graph> {
        let pool = worker_pool(self.concurrency)?;
        self.load_in(&pool, IdMap::from_original_ids(nodes), edges)
    }

    /// Loads `edges` over an existing mapping on an existing pool.
    pub fn load_in(&self, pool: &ThreadPool, id_map: IdMap, edges: &[Edge]) -> Result<Graph> {
        let half_edges = match self.projection.orientation() {
            Orientation::Undirected => edges.len() as u64 * 2,
            Orientation::Natural | Orientation::Reverse => edges.len() as u64,
        };
        let estimate = estimate_graph(
            id_map.node_count(),
            half_edges,
            self.concurrency,
            self.projection.is_weighted(),
        );
        self.tracker.check(estimate.min)?;

        let id_map = Arc::new(id_map);
        let importer = RelationshipImporter::new(Arc::clone(&id_map), self.projection.clone())
            .with_batch_size(self.batch_size)
            .with_tracker(Arc::clone(&self.tracker));
        let default_weight = self.projection.default_weight();

        let workers = pool.current_num_threads().max(1);
        let chunk_len = edges.len().div_ceil(workers).max(1);
        let segments = pool.install(|| {
            edges
                .par_chunks(chunk_len)
                .map(|chunk| {
                    let mut worker = importer.worker();
                    for edge in chunk {
                        worker.add_edge(
                            edge.source,
                            edge.target,
                            edge.weight.unwrap_or(default_weight),
                        )?;
                    }
                    worker.finish()
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let adjacency = importer.build(segments, pool)?;
        Ok(Graph::new(
            id_map,
            Arc::new(adjacency),
            self.projection.orientation(),
        ))
    }
}
