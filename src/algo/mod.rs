//! Community detection on a [`Graph`](crate::graph::Graph).
//!
//! - `modularity`: one local-move pass plus the modularity score
//! - `louvain`: the multilevel driver that alternates local moves and
//!   coarsening

pub mod louvain;
pub mod modularity;

pub use louvain::{coarsen, Louvain, LouvainResult};
pub use modularity::{modularity, ModularityOptimization};
