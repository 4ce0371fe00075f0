//! # `colgraph` - Compressed Graph Store and Louvain Clustering
//!
//! An in-memory graph engine built for large, sparse graphs: relationships are
//! imported concurrently into a delta-encoded, variable-byte adjacency store,
//! and multilevel Louvain community detection runs directly on top of it.
//!
//! ## Architecture
//!
//! ### Storage
//!
//! 1. **Id mapping** (`graph::IdMap`):
//!    - Sparse original ids become dense node ids `0..node_count`
//!    - Assigned in first-seen order, deterministic for a fixed input order
//!
//! 2. **Compressed adjacency** (`graph::AdjacencyList`):
//!    - One `[degree][t0][t1 - t0]...` varint record per node
//!    - Paged offset table and an optional parallel weight column
//!
//! 3. **Relationship import** (`graph::RelationshipImporter`):
//!    - Thread-local buffers, sorted and aggregated on flush
//!    - Byte-identical output for any partitioning of the same edges
//!
//! ### Algorithms
//!
//! 1. **Modularity optimization** (`algo::ModularityOptimization`):
//!    - Asynchronous local moves over atomic community volumes
//!    - Cooperative cancellation at iteration boundaries
//!
//! 2. **Louvain** (`algo::Louvain`):
//!    - Optimize, record the dendrogram level, coarsen, repeat
//!    - Coarsening re-imports community edges with summed weights
//!
//! ## Example
//!
//! ```
//! use colgraph::algo::Louvain;
//! use colgraph::graph::{Aggregation, Edge, GraphLoader, Orientation, RelationshipProjection};
//! use colgraph::LouvainConfig;
//!
//! let projection = RelationshipProjection::new(Orientation::Undirected, Aggregation::Single);
//! let edges = [Edge::new(10, 20), Edge::new(20, 30), Edge::new(30, 40), Edge::new(40, 50)];
//! let graph = GraphLoader::new(projection)
//!     .concurrency(2)
//!     .load([10, 20, 30, 40, 50], &edges)?;
//!
//! let b = graph.to_mapped_node_id(20).unwrap();
//! let neighbors: Vec<u64> = graph
//!     .relationships(b, 1.0)
//!     .map(|(target, _)| graph.to_original_node_id(target))
//!     .collect();
//! assert_eq!(neighbors, vec![10, 30]);
//!
//! let result = Louvain::new(LouvainConfig::default().with_max_level(1).with_concurrency(1))
//!     .compute(&graph)?;
//! assert_eq!(result.levels(), 1);
//! assert!(result.modularities()[0] > 0.0);
//! # Ok::<(), colgraph::Error>(())
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

pub mod algo;
pub mod collections;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
pub mod property;

pub use algo::{Louvain, LouvainResult, ModularityOptimization};
pub use collections::PagedArray;
pub use concurrency::TerminationFlag;
pub use config::LouvainConfig;
pub use error::{Error, Result};
pub use graph::{Graph, GraphLoader};
pub use memory::{AllocationTracker, MemoryRange};
pub use property::{PropertyKey, PropertyMapping};

const _: () = {
    use crate::graph::compressed::varint;

    // A u64 needs at most ten 7-bit groups.
    assert!(varint::encoded_len(u64::MAX) == varint::MAX_ENCODED_LEN);
    assert!(varint::encoded_len(127) == 1);
    assert!(varint::encoded_len(128) == 2);
};
