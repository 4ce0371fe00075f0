//! Closed-form memory estimates.
//!
//! Nothing here allocates. The numbers mirror the layouts in
//! `graph::compressed`, `graph::id_map` and `algo`, so callers can pre-flight a
//! large load against an [`AllocationTracker`](super::AllocationTracker)
//! ceiling before committing to it.

use core::mem::size_of;

use crate::graph::compressed::varint;
use crate::graph::loading::DEFAULT_BATCH_SIZE;

/// An inclusive byte range: best case to worst case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryRange {
    /// Best-case bytes.
    pub min: usize,
    /// Worst-case bytes.
    pub max: usize,
}

impl MemoryRange {
    /// A range with identical bounds.
    pub const fn of(bytes: usize) -> Self {
        Self {
            min: bytes,
            max: bytes,
        }
    }

    /// A range from explicit bounds.
    pub fn new(min: usize, max: usize) -> Self {
        debug_assert!(min <= max);
        Self { min, max }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self {
            min: self.min.saturating_add(other.min),
            max: self.max.saturating_add(other.max),
        }
    }

    /// Scales both bounds.
    #[must_use]
    pub fn times(self, factor: usize) -> Self {
        Self {
            min: self.min.saturating_mul(factor),
            max: self.max.saturating_mul(factor),
        }
    }
}

/// Bytes for one buffered `(source, target, weight)` triple.
const BUFFERED_EDGE_BYTES: usize = size_of::<u64>() * 2 + size_of::<f64>();

/// Estimates the compressed adjacency store plus its import buffers.
///
/// `average_degree` is the expected number of stored half-edges per node.
pub fn estimate_adjacency(node_count: u64, average_degree: f64, concurrency: usize) -> MemoryRange {
    let degree = if average_degree.is_finite() && average_degree > 0.0 {
        average_degree.ceil() as u64
    } else {
        0
    };
    let relationships = node_count.saturating_mul(degree);
    adjacency_range(node_count, relationships, concurrency)
}

fn adjacency_range(node_count: u64, relationships: u64, concurrency: usize) -> MemoryRange {
    let n = to_usize(node_count);
    let m = to_usize(relationships);

    let offsets = MemoryRange::of(n.saturating_mul(size_of::<u64>()));

    // One degree header per node plus one varint per target.
    let max_target_bytes = varint::encoded_len(node_count.saturating_sub(1));
    let max_degree_bytes = varint::encoded_len(relationships);
    let records = MemoryRange::new(
        n.saturating_add(m),
        n.saturating_mul(max_degree_bytes)
            .saturating_add(m.saturating_mul(max_target_bytes)),
    );

    // Worst case every worker holds a full batch while flushed segments and
    // the concatenated buffer coexist during build.
    let buffers = MemoryRange::new(
        0,
        concurrency
            .max(1)
            .saturating_mul(DEFAULT_BATCH_SIZE)
            .saturating_mul(BUFFERED_EDGE_BYTES),
    );
    let segments = MemoryRange::new(0, records.max);

    offsets.add(records).add(buffers).add(segments)
}

/// Estimates a complete graph view: id mapping, adjacency and optional weights.
pub fn estimate_graph(
    node_count: u64,
    relationship_count: u64,
    concurrency: usize,
    weighted: bool,
) -> MemoryRange {
    let n = to_usize(node_count);
    let m = to_usize(relationship_count);

    // Dense original-id array plus a hash index with 8/7 load headroom.
    let id_entry = size_of::<u64>() * 2 + 1;
    let id_map = MemoryRange::of(
        n.saturating_mul(size_of::<u64>())
            .saturating_add(n.saturating_mul(id_entry).saturating_mul(8) / 7),
    );

    let weights = if weighted {
        MemoryRange::of(
            m.saturating_mul(size_of::<f64>())
                .saturating_add(n.saturating_mul(size_of::<u64>())),
        )
    } else {
        MemoryRange::of(0)
    };

    id_map
        .add(adjacency_range(node_count, relationship_count, concurrency))
        .add(weights)
}

/// Bytes of per-node optimizer scratch: community, degree, volume and size.
pub(crate) const OPTIMIZER_BYTES_PER_NODE: usize =
    size_of::<u64>() + size_of::<f64>() + size_of::<f64>() + size_of::<u64>();

/// Estimates a full Louvain run over a weighted, undirected graph.
///
/// The best case assumes the first coarsening collapses everything; the worst
/// case assumes no level merges anything, so every summary graph is as large
/// as its input.
pub fn estimate_louvain(
    node_count: u64,
    relationship_count: u64,
    concurrency: usize,
    max_level: usize,
) -> MemoryRange {
    let n = to_usize(node_count);
    let root = estimate_graph(node_count, relationship_count, concurrency, true);
    let dendrogram = MemoryRange::of(
        n.saturating_mul(size_of::<u64>())
            .saturating_mul(max_level),
    );
    let scratch = MemoryRange::of(n.saturating_mul(OPTIMIZER_BYTES_PER_NODE));
    let final_communities = MemoryRange::of(n.saturating_mul(size_of::<u64>()));
    let summary = if max_level == 0 {
        MemoryRange::of(0)
    } else {
        MemoryRange::new(0, root.max)
    };

    root.add(dendrogram)
        .add(scratch)
        .add(final_communities)
        .add(summary)
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
