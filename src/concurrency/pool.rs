//! Fixed-size worker pool and range partitioning.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Error, Result};

/// Builds a pool of exactly `concurrency` worker threads.
pub fn worker_pool(concurrency: usize) -> Result<ThreadPool> {
    if concurrency == 0 {
        return Err(Error::invalid_config("concurrency", "must be > 0"));
    }
    ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("colgraph-worker-{i}"))
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))
}

/// A contiguous `[start, start + len)` slice of the node id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// First node id.
    pub start: u64,
    /// Number of node ids.
    pub len: u64,
}

impl Partition {
    /// One past the last node id.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    /// The node ids of this partition.
    #[inline]
    pub fn nodes(&self) -> core::ops::Range<u64> {
        self.start..self.end()
    }
}

/// Splits `0..node_count` into at most `parts` contiguous, non-empty ranges of
/// near-equal size. Deterministic for fixed inputs.
pub fn partition(node_count: u64, parts: usize) -> Vec<Partition> {
    let parts = (parts.max(1) as u64).min(node_count.max(1));
    if node_count == 0 {
        return Vec::new();
    }
    let base = node_count / parts;
    let extra = node_count % parts;
    let mut out = Vec::with_capacity(parts as usize);
    let mut start = 0u64;
    for i in 0..parts {
        let len = base + u64::from(i < extra);
        out.push(Partition { start, len });
        start += len;
    }
    out
}
