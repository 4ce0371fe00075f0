//! Local-move modularity optimization.
//!
//! Every node repeatedly evaluates moving into the community of each of its
//! neighbors and relocates to the best one when that strictly beats staying.
//! Moves are applied asynchronously: a relocation is visible to nodes
//! processed later in the same iteration. Community volumes are atomic
//! accumulators, so concurrent relocations never observe a torn value.
//!
//! With `m2` the total stored relationship weight, `k_i` the weighted degree
//! of node `i`, `k_i,D` its weight into community `D` and `tot_D` the volume
//! of `D`, the gain of joining `D` is
//!
//! ```text
//! k_i,D - resolution * k_i * tot_D / m2
//! ```
//!
//! evaluated with `i` removed from its current community.

mod score;

#[cfg(test)]
mod tests;

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

pub use score::modularity;

use crate::collections::PagedArray;
use crate::concurrency::{partition, worker_pool, AtomicDouble, Partition, TerminationFlag};
use crate::error::{Error, Result};
use crate::graph::loading::DEFAULT_WEIGHT;
use crate::graph::{Graph, NodeProperties, SeedProperties};
use crate::memory::estimate::OPTIMIZER_BYTES_PER_NODE;
use crate::memory::AllocationTracker;

/// Default cap on local-move iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// One local-move optimization pass over a graph.
///
/// ```
/// use colgraph::algo::ModularityOptimization;
/// use colgraph::graph::{Aggregation, Edge, GraphLoader, Orientation, RelationshipProjection};
///
/// let projection = RelationshipProjection::new(Orientation::Undirected, Aggregation::Single);
/// let edges = [Edge::new(0, 1), Edge::new(2, 3)];
/// let graph = GraphLoader::new(projection).concurrency(1).load(0..4, &edges).unwrap();
///
/// let mut optimizer = ModularityOptimization::new(&graph).concurrency(1);
/// optimizer.compute().unwrap();
/// assert_eq!(optimizer.community_id(0), optimizer.community_id(1));
/// assert_ne!(optimizer.community_id(1), optimizer.community_id(2));
/// ```
pub struct ModularityOptimization {
    graph: Graph,
    resolution: f64,
    max_iterations: usize,
    concurrency: usize,
    default_weight: f64,
    seed: Option<Arc<dyn NodeProperties>>,
    termination: TerminationFlag,
    tracker: Arc<AllocationTracker>,
    communities: PagedArray<u64>,
    scratch: Option<Scratch>,
    iterations: usize,
    converged: bool,
    cancelled: bool,
}

/// Per-iteration state, released by [`ModularityOptimization::release`].
struct Scratch {
    communities: Vec<AtomicU64>,
    volumes: Vec<AtomicDouble>,
    sizes: Vec<AtomicU64>,
    degrees: Vec<f64>,
    total_weight: f64,
    tracked: usize,
}

impl ModularityOptimization {
    /// An optimizer over `graph` with every node in its own community.
    pub fn new(graph: &Graph) -> Self {
        Self {
            graph: graph.clone(),
            resolution: 1.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            concurrency: std::thread::available_parallelism().map_or(1, usize::from),
            default_weight: DEFAULT_WEIGHT,
            seed: None,
            termination: TerminationFlag::new(),
            tracker: Arc::new(AllocationTracker::empty()),
            communities: PagedArray::zeroed(0),
            scratch: None,
            iterations: 0,
            converged: false,
            cancelled: false,
        }
    }

    /// Scales the null-model term; higher values favor smaller communities.
    #[must_use]
    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Caps the number of iterations.
    #[must_use]
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Worker count used by [`compute`](Self::compute).
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Weight assumed for relationships when the graph stores none.
    #[must_use]
    pub fn default_weight(mut self, default_weight: f64) -> Self {
        self.default_weight = default_weight;
        self
    }

    /// Starts from the communities described by `seed`.
    ///
    /// Nodes with equal seed values start together; `NaN` starts alone.
    #[must_use]
    pub fn seed(mut self, seed: Arc<dyn NodeProperties>) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Polled before every iteration.
    #[must_use]
    pub fn termination(mut self, termination: TerminationFlag) -> Self {
        self.termination = termination;
        self
    }

    /// Attributes scratch and result arrays to `tracker`.
    #[must_use]
    pub fn tracker(mut self, tracker: Arc<AllocationTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Runs the optimization on a dedicated pool of
    /// [`concurrency`](Self::concurrency) workers.
    pub fn compute(&mut self) -> Result<()> {
        let pool = worker_pool(self.concurrency)?;
        self.compute_in(&pool)
    }

    /// Runs the optimization on `pool`.
    ///
    /// Stops when an iteration moves no node, after `max_iterations`, or at
    /// the first iteration boundary after termination was requested. The
    /// last case is not an error: [`was_cancelled`](Self::was_cancelled)
    /// reports it and the assignment reached so far is kept.
    pub fn compute_in(&mut self, pool: &ThreadPool) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::invalid_config(
                "resolution",
                format!("must be a positive number, got {}", self.resolution),
            ));
        }
        self.release();
        self.iterations = 0;
        self.converged = false;
        self.cancelled = false;

        let node_count = self.graph.node_count();
        let parts = partition(node_count, pool.current_num_threads().saturating_mul(4));
        let scratch = self.init_scratch(pool, &parts)?;
        let scratch: &Scratch = self.scratch.insert(scratch);

        while self.iterations < self.max_iterations {
            if self.termination.is_terminated() {
                self.cancelled = true;
                break;
            }
            let moves: u64 = pool.install(|| {
                parts
                    .par_iter()
                    .map(|part| {
                        let mut neighbors = Vec::new();
                        part.nodes()
                            .filter(|&node| {
                                move_node(
                                    &self.graph,
                                    scratch,
                                    node,
                                    self.default_weight,
                                    self.resolution,
                                    &mut neighbors,
                                )
                            })
                            .count() as u64
                    })
                    .sum()
            });
            self.iterations += 1;
            tracing::trace!(iteration = self.iterations, moves, "local move iteration");
            if moves == 0 {
                self.converged = true;
                break;
            }
        }

        let mut communities = PagedArray::new(node_count, &self.tracker)?;
        communities.set_all(|node| scratch.communities[node as usize].load(Ordering::Relaxed));
        self.communities = communities;
        Ok(())
    }

    fn init_scratch(&self, pool: &ThreadPool, parts: &[Partition]) -> Result<Scratch> {
        let node_count = self.graph.node_count();
        let len = node_count as usize;
        let tracked = len.saturating_mul(OPTIMIZER_BYTES_PER_NODE);
        self.tracker.try_add(tracked)?;

        let degrees: Vec<f64> = pool.install(|| {
            parts
                .par_iter()
                .map(|part| {
                    part.nodes()
                        .map(|node| {
                            self.graph
                                .relationships(node, self.default_weight)
                                .map(|(_, w)| w)
                                .sum::<f64>()
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
                .concat()
        });
        let total_weight = degrees.iter().sum();

        let initial = match &self.seed {
            Some(seed) => SeedProperties::new(seed.as_ref(), node_count).into_communities(),
            None => (0..node_count).collect(),
        };
        let communities: Vec<AtomicU64> = initial.iter().map(AtomicU64::new).collect();
        let volumes: Vec<AtomicDouble> = (0..len).map(|_| AtomicDouble::new(0.0)).collect();
        let sizes: Vec<AtomicU64> = (0..len).map(|_| AtomicU64::new(0)).collect();
        for (node, community) in initial.iter().enumerate() {
            let c = community as usize;
            volumes[c].fetch_add(degrees[node], Ordering::Relaxed);
            sizes[c].fetch_add(1, Ordering::Relaxed);
        }

        Ok(Scratch {
            communities,
            volumes,
            sizes,
            degrees,
            total_weight,
            tracked,
        })
    }

    /// Community of `node` after [`compute`](Self::compute).
    ///
    /// Community ids are node ids of the optimized graph, not densified.
    ///
    /// # Panics
    /// Panics if called before `compute` or with `node >= node_count`.
    #[inline]
    pub fn community_id(&self, node: u64) -> u64 {
        self.communities.get(node)
    }

    /// All communities, indexed by node id.
    pub fn communities(&self) -> &PagedArray<u64> {
        &self.communities
    }

    /// Takes the communities out of the optimizer.
    pub fn into_communities(mut self) -> PagedArray<u64> {
        self.release();
        core::mem::replace(&mut self.communities, PagedArray::zeroed(0))
    }

    /// Iterations run by the last `compute`.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns `true` if the last iteration moved no node.
    pub fn did_converge(&self) -> bool {
        self.converged
    }

    /// Returns `true` if termination cut the last `compute` short.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Modularity of the current assignment.
    pub fn modularity(&self) -> f64 {
        modularity(&self.graph, |node| self.communities.get(node), self.resolution)
    }

    /// Frees iteration scratch; the communities stay available.
    pub fn release(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            self.tracker.remove(scratch.tracked);
        }
    }
}

impl Drop for ModularityOptimization {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for ModularityOptimization {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModularityOptimization")
            .field("node_count", &self.graph.node_count())
            .field("resolution", &self.resolution)
            .field("max_iterations", &self.max_iterations)
            .field("iterations", &self.iterations)
            .field("converged", &self.converged)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

/// Evaluates and applies the best move for `node`. Returns `true` if it moved.
fn move_node(
    graph: &Graph,
    scratch: &Scratch,
    node: u64,
    default_weight: f64,
    resolution: f64,
    neighbors: &mut Vec<(u64, f64)>,
) -> bool {
    let index = node as usize;
    let degree = scratch.degrees[index];
    if degree == 0.0 || scratch.total_weight == 0.0 {
        return false;
    }
    let current = scratch.communities[index].load(Ordering::Relaxed);

    neighbors.clear();
    for (target, weight) in graph.relationships(node, default_weight) {
        if target != node {
            let community = scratch.communities[target as usize].load(Ordering::Relaxed);
            neighbors.push((community, weight));
        }
    }
    neighbors.sort_unstable_by_key(|&(community, _)| community);

    let scale = resolution * degree / scratch.total_weight;
    let volume = |community: u64| scratch.volumes[community as usize].load(Ordering::Relaxed);

    let mut weight_to_current = 0.0;
    let mut best: Option<(u64, f64)> = None;
    let mut i = 0;
    while i < neighbors.len() {
        let community = neighbors[i].0;
        let mut weight = 0.0;
        while i < neighbors.len() && neighbors[i].0 == community {
            weight += neighbors[i].1;
            i += 1;
        }
        if community == current {
            weight_to_current = weight;
            continue;
        }
        let gain = weight - scale * volume(community);
        // Candidates arrive in ascending id order, so ties keep the smaller id.
        if best.map_or(true, |(_, best_gain)| gain > best_gain) {
            best = Some((community, gain));
        }
    }

    let stay = weight_to_current - scale * (volume(current) - degree);
    let Some((target, gain)) = best else {
        return false;
    };
    if gain <= stay {
        return false;
    }
    // Two singletons would otherwise swap into each other forever.
    if target > current
        && scratch.sizes[current as usize].load(Ordering::Relaxed) == 1
        && scratch.sizes[target as usize].load(Ordering::Relaxed) == 1
    {
        return false;
    }

    scratch.volumes[current as usize].fetch_sub(degree, Ordering::AcqRel);
    scratch.volumes[target as usize].fetch_add(degree, Ordering::AcqRel);
    scratch.sizes[current as usize].fetch_sub(1, Ordering::AcqRel);
    scratch.sizes[target as usize].fetch_add(1, Ordering::AcqRel);
    scratch.communities[index].store(target, Ordering::Release);
    true
}
