//! Allocation accounting and pre-flight memory estimation.
//!
//! - `tracker`: a shared byte counter every large allocation is attributed to
//! - `estimate`: closed-form byte ranges computed before anything is built

pub mod estimate;
pub mod tracker;

pub use estimate::{estimate_adjacency, estimate_graph, estimate_louvain, MemoryRange};
pub use tracker::AllocationTracker;
