//! Concurrency helpers for loading and clustering.
//!
//! The graph store is built once and then shared read-only, so the only
//! shared mutable state lives here:
//! - `atomic`: lock-free numeric accumulators
//! - `termination`: the cancellation flag polled at stage boundaries
//! - `pool`: the fixed-size worker pool and work partitioning

pub mod atomic;
pub mod pool;
pub mod termination;

pub use atomic::AtomicDouble;
pub use pool::{partition, worker_pool, Partition};
pub use termination::TerminationFlag;
