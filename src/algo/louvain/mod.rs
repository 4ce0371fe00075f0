//! Multilevel Louvain community detection.
//!
//! Each level runs one [`ModularityOptimization`] pass on the current graph,
//! records where every node of the input graph ended up, and coarsens the
//! graph so that each community becomes a single node of the next level.
//!
//! Community ids at level `L` are node ids of the level-`L` graph. Level
//! `L + 1` finds each input node's node by looking its level-`L` community id
//! up in the coarsened graph's id mapping, whose original ids are exactly
//! those community ids.

mod coarsen;


use std::sync::Arc;

pub use coarsen::{coarsen, ORIGINAL_ID_PROPERTY};

use super::modularity::ModularityOptimization;
use crate::collections::PagedArray;
use crate::concurrency::{worker_pool, TerminationFlag};
use crate::config::LouvainConfig;
use crate::error::Result;
use crate::graph::{Graph, NodeProperties};
use crate::memory::{estimate_louvain, AllocationTracker};

/// The Louvain driver.
///
/// ```
/// use colgraph::algo::Louvain;
/// use colgraph::graph::{Aggregation, Edge, GraphLoader, Orientation, RelationshipProjection};
/// use colgraph::LouvainConfig;
///
/// let projection = RelationshipProjection::new(Orientation::Undirected, Aggregation::Single);
/// let edges = [Edge::new(1, 2), Edge::new(2, 3), Edge::new(1, 3), Edge::new(4, 5)];
/// let graph = GraphLoader::new(projection).load(1..=5, &edges).unwrap();
///
/// let config = LouvainConfig::default().with_max_level(2).with_concurrency(1);
/// let result = Louvain::new(config)
///     .compute(&graph)
///     .unwrap();
/// assert_eq!(result.levels(), 2);
/// assert_eq!(result.community(1, 0), result.community(1, 2));
/// ```
#[derive(Clone)]
pub struct Louvain {
    config: LouvainConfig,
    seed: Option<Arc<dyn NodeProperties>>,
    termination: TerminationFlag,
    tracker: Option<Arc<AllocationTracker>>,
}

impl Louvain {
    /// A driver for `config`.
    pub fn new(config: LouvainConfig) -> Self {
        Self {
            config,
            seed: None,
            termination: TerminationFlag::new(),
            tracker: None,
        }
    }

    /// Seeds the first level's communities; later levels start from singletons.
    #[must_use]
    pub fn with_seed(mut self, seed: Arc<dyn NodeProperties>) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Polled at every level and iteration boundary.
    #[must_use]
    pub fn with_termination(mut self, termination: TerminationFlag) -> Self {
        self.termination = termination;
        self
    }

    /// Attributes allocations to `tracker` instead of a tracker built from
    /// the configured memory limit.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<AllocationTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &LouvainConfig {
        &self.config
    }

    /// Runs up to `max_level` levels on `graph`.
    ///
    /// Cancellation is not an error: the result holds every level completed
    /// so far and is flagged [`cancelled`](LouvainResult::cancelled).
    pub fn compute(&self, graph: &Graph) -> Result<LouvainResult> {
        let config = &self.config;
        config.validate()?;

        let tracker = match &self.tracker {
            Some(tracker) => Arc::clone(tracker),
            None => Arc::new(match config.memory_limit {
                Some(limit) => AllocationTracker::with_limit(limit),
                None => AllocationTracker::new(),
            }),
        };
        let estimate = estimate_louvain(
            graph.node_count(),
            graph.relationship_count(),
            config.concurrency,
            config.max_level,
        );
        tracker.check(estimate.min)?;
        let pool = worker_pool(config.concurrency)?;

        let span = tracing::info_span!(
            "louvain",
            nodes = graph.node_count(),
            relationships = graph.relationship_count(),
            max_level = config.max_level
        );
        let _enter = span.enter();

        let node_count = graph.node_count();
        let mut current = graph.clone();
        let mut dendrogram: Vec<PagedArray<u64>> = Vec::new();
        let mut modularities = Vec::new();
        let mut cancelled = false;

        for level in 0..config.max_level {
            if self.termination.is_terminated() {
                cancelled = true;
                break;
            }

            let mut optimizer = ModularityOptimization::new(&current)
                .resolution(config.resolution)
                .max_iterations(config.max_iterations)
                .termination(self.termination.clone())
                .tracker(Arc::clone(&tracker));
            if level == 0 {
                if let Some(seed) = &self.seed {
                    optimizer = optimizer.seed(Arc::clone(seed));
                }
            }
            optimizer.compute_in(&pool)?;
            optimizer.release();
            let modularity = optimizer.modularity();
            let iterations = optimizer.iterations();
            let level_cancelled = optimizer.was_cancelled();
            let communities = optimizer.into_communities();

            let mut assignment = PagedArray::<u64>::new(node_count, &tracker)?;
            match dendrogram.last() {
                None => assignment.set_all(|node| communities.get(node)),
                Some(previous) => {
                    let id_map = current.id_map();
                    for node in 0..node_count {
                        let mapped = id_map.try_to_mapped(previous.get(node))?;
                        assignment.set(node, communities.get(mapped));
                    }
                }
            }
            dendrogram.push(assignment);
            modularities.push(modularity);

            let community_count = count_communities(&communities);
            tracing::info!(
                level,
                nodes = current.node_count(),
                communities = community_count,
                iterations,
                modularity,
                "louvain level done"
            );

            if level_cancelled {
                cancelled = true;
                break;
            }
            if config.early_stop && community_count == current.node_count() {
                tracing::debug!(level, "no nodes merged, stopping early");
                break;
            }
            current =
                coarsen::coarsen_with_batch_size(&current, &communities, &pool, &tracker, config.batch_size)?;
        }

        if cancelled {
            tracing::warn!(levels = dendrogram.len(), "louvain cancelled");
        }
        Ok(LouvainResult {
            dendrogram,
            graph: current,
            modularities,
            cancelled,
        })
    }
}

impl core::fmt::Debug for Louvain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Louvain")
            .field("config", &self.config)
            .field("seeded", &self.seed.is_some())
            .finish_non_exhaustive()
    }
}

fn count_communities(communities: &PagedArray<u64>) -> u64 {
    let mut seen = vec![false; communities.size() as usize];
    let mut count = 0;
    for community in communities.iter() {
        if let Some(slot) = seen.get_mut(community as usize) {
            if !*slot {
                *slot = true;
                count += 1;
            }
        }
    }
    count
}

/// Output of [`Louvain::compute`].
#[derive(Debug)]
pub struct LouvainResult {
    dendrogram: Vec<PagedArray<u64>>,
    graph: Graph,
    modularities: Vec<f64>,
    cancelled: bool,
}

impl LouvainResult {
    /// One community array per completed level, indexed by node id of the
    /// input graph.
    pub fn dendrogram(&self) -> &[PagedArray<u64>] {
        &self.dendrogram
    }

    /// Community of input node `node` at `level`.
    ///
    /// # Panics
    /// Panics if `level >= levels()` or `node` is out of range.
    pub fn community(&self, level: usize, node: u64) -> u64 {
        self.dendrogram[level].get(node)
    }

    /// Communities of the last completed level, if any.
    pub fn final_communities(&self) -> Option<&PagedArray<u64>> {
        self.dendrogram.last()
    }

    /// Number of completed levels.
    pub fn levels(&self) -> usize {
        self.dendrogram.len()
    }

    /// Modularity reached at each level.
    pub fn modularities(&self) -> &[f64] {
        &self.modularities
    }

    /// The last coarsened graph, or the input graph if nothing was coarsened.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns `true` if termination cut the run short.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Splits the result into dendrogram, graph and modularities.
    pub fn into_parts(self) -> (Vec<PagedArray<u64>>, Graph, Vec<f64>) {
        (self.dendrogram, self.graph, self.modularities)
    }
}
