//! Concurrent relationship import.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use super::{Aggregation, Orientation, RelationshipProjection, DEFAULT_BATCH_SIZE};
use crate::concurrency::{partition, Partition};
use crate::error::{Error, Result};
use crate::graph::compressed::{varint, AdjacencyCursor, AdjacencyList, AdjacencyOffsets};
use crate::graph::id_map::IdMap;
use crate::memory::AllocationTracker;

/// Shared state for one import: the id mapping, the projection and the
/// tracker. Hands out one [`ImportWorker`] per thread and builds the final
/// [`AdjacencyList`] from their segments.
pub struct RelationshipImporter {
    id_map: Arc<IdMap>,
    projection: RelationshipProjection,
    aggregation: Aggregation,
    batch_size: usize,
    tracker: Arc<AllocationTracker>,
}

impl RelationshipImporter {
    /// Creates an importer for nodes of `id_map`.
    pub fn new(id_map: Arc<IdMap>, projection: RelationshipProjection) -> Self {
        let aggregation = projection.aggregation();
        Self {
            id_map,
            projection,
            aggregation,
            batch_size: DEFAULT_BATCH_SIZE,
            tracker: Arc::new(AllocationTracker::empty()),
        }
    }

    /// Sets how many half-edges a worker buffers before flushing.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Attributes the built store to `tracker`.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<AllocationTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// The id mapping edges are resolved against.
    pub fn id_map(&self) -> &Arc<IdMap> {
        &self.id_map
    }

    /// The projection being imported.
    pub fn projection(&self) -> &RelationshipProjection {
        &self.projection
    }

    /// Weighted sums are folded once, in [`build`](Self::build), so that
    /// floating-point rounding does not depend on how edges were split.
    fn defers_folding(&self) -> bool {
        self.aggregation == Aggregation::Sum && self.projection.is_weighted()
    }

    /// A fresh worker with an empty buffer and segment.
    pub fn worker(&self) -> ImportWorker<'_> {
        ImportWorker {
            importer: self,
            buffer: Vec::with_capacity(self.batch_size.min(DEFAULT_BATCH_SIZE)),
            segment: Segment::default(),
        }
    }

    /// Merges all worker segments into the final store.
    ///
    /// Segments are merged in the order given; with [`Aggregation::Single`]
    /// an earlier segment wins over a later one.
    pub fn build(&self, segments: Vec<Segment>, pool: &ThreadPool) -> Result<AdjacencyList> {
        let node_count = self.id_map.node_count();
        let weighted = self.projection.is_weighted();

        let stored: u64 = segments.iter().map(Segment::relationship_count).sum();
        let upper_bound = segments.iter().map(|s| s.bytes.len()).sum::<usize>()
            + node_count as usize * (1 + 2 * core::mem::size_of::<u64>())
            + if weighted {
                stored as usize * core::mem::size_of::<f64>()
            } else {
                0
            };
        self.tracker.check(upper_bound)?;

        let mut runs: Vec<RunRef> = segments
            .iter()
            .enumerate()
            .flat_map(|(s, segment)| {
                segment.runs.iter().enumerate().map(move |(r, run)| RunRef {
                    source: run.source,
                    segment: s,
                    run: r,
                })
            })
            .collect();
        runs.sort_unstable();

        let partitions = partition(node_count, pool.current_num_threads().saturating_mul(4));
        let chunks = pool.install(|| {
            partitions
                .par_iter()
                .map(|p| {
                    let lo = runs.partition_point(|r| r.source < p.start);
                    let hi = runs.partition_point(|r| r.source < p.end());
                    self.encode_chunk(*p, &runs[lo..hi], &segments, weighted)
                })
                .collect::<Result<Vec<_>>>()
        })?;
        drop(segments);

        let (offsets, total_bytes, relationship_count) = AdjacencyOffsets::from_lengths(
            chunks.iter().flat_map(|c| c.lengths.iter().copied()),
            node_count,
        );

        let mut bytes = Vec::with_capacity(total_bytes as usize);
        let mut weights = weighted.then(|| Vec::with_capacity(relationship_count as usize));
        for chunk in chunks {
            bytes.extend_from_slice(&chunk.bytes);
            if let Some(weights) = weights.as_mut() {
                weights.extend_from_slice(&chunk.weights);
            }
        }

        let mut adjacency = AdjacencyList::from_parts(bytes, offsets, weights, relationship_count);
        adjacency.track(&self.tracker)?;

        tracing::debug!(
            nodes = node_count,
            relationships = relationship_count,
            bytes = adjacency.bytes().len(),
            weighted,
            "built compressed adjacency"
        );
        Ok(adjacency)
    }

    /// Encodes the records of one node range.
    fn encode_chunk(
        &self,
        nodes: Partition,
        runs: &[RunRef],
        segments: &[Segment],
        weighted: bool,
    ) -> Result<Chunk> {
        let mut chunk = Chunk {
            lengths: Vec::with_capacity(nodes.len as usize),
            ..Chunk::default()
        };
        let mut merged: Vec<(u64, f64)> = Vec::new();
        let mut targets: Vec<u64> = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        let mut cursor = 0;
        for node in nodes.nodes() {
            let start = cursor;
            while cursor < runs.len() && runs[cursor].source == node {
                cursor += 1;
            }
            match &runs[start..cursor] {
                [] => {
                    let len = varint::encode_record(node, &[], &mut chunk.bytes)?;
                    chunk.lengths.push((len as u64, 0));
                }
                [single] if segments[single.segment].runs[single.run].folded => {
                    let segment = &segments[single.segment];
                    let run = &segment.runs[single.run];
                    chunk.bytes.extend_from_slice(segment.run_bytes(run));
                    if weighted {
                        chunk.weights.extend_from_slice(segment.run_weights(run));
                    }
                    chunk.lengths.push((run.len as u64, run.degree));
                }
                many => {
                    merged.clear();
                    for r in many {
                        let segment = &segments[r.segment];
                        let run = &segment.runs[r.run];
                        let run_weights = segment.run_weights(run);
                        for (i, target) in segment.run_targets(run).enumerate() {
                            merged.push((target, run_weights.get(i).copied().unwrap_or_default()));
                        }
                    }
                    if self.aggregation == Aggregation::Sum {
                        // Summing in value order gives the same bits for any split.
                        merged.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
                    } else {
                        // Stable: equal targets keep segment order.
                        merged.sort_by_key(|&(target, _)| target);
                    }
                    aggregate(node, &merged, self.aggregation, &mut targets, &mut values)?;

                    let len = varint::encode_record(node, &targets, &mut chunk.bytes)?;
                    if weighted {
                        chunk.weights.extend_from_slice(&values);
                    }
                    chunk.lengths.push((len as u64, targets.len() as u64));
                }
            }
        }
        Ok(chunk)
    }
}

/// Collapses sorted `(target, weight)` pairs into unique targets.
fn aggregate(
    source: u64,
    sorted: &[(u64, f64)],
    aggregation: Aggregation,
    targets: &mut Vec<u64>,
    weights: &mut Vec<f64>,
) -> Result<()> {
    targets.clear();
    weights.clear();
    for &(target, weight) in sorted {
        if targets.last() == Some(&target) {
            if let Some(existing) = weights.last_mut() {
                aggregation.merge(existing, weight, source, target)?;
            }
        } else {
            targets.push(target);
            weights.push(weight);
        }
    }
    Ok(())
}

/// Buffers half-edges and compresses them into a private [`Segment`].
///
/// Workers never share state with each other; hand each thread its own.
pub struct ImportWorker<'a> {
    importer: &'a RelationshipImporter,
    buffer: Vec<(u64, u64, f64)>,
    segment: Segment,
}

impl<'a> ImportWorker<'a> {
    /// Adds an edge between two original ids.
    ///
    /// Fails with [`Error::UnmappedNode`] if either id is not in the mapping.
    pub fn add_edge(&mut self, source: u64, target: u64, weight: f64) -> Result<()> {
        let id_map = &self.importer.id_map;
        let source = id_map.try_to_mapped(source)?;
        let target = id_map.try_to_mapped(target)?;
        self.push(source, target, weight)
    }

    /// Adds an edge between two dense node ids.
    ///
    /// Fails with [`Error::NodeOutOfRange`] if either id is not below the
    /// mapping's node count.
    pub fn add_mapped_edge(&mut self, source: u64, target: u64, weight: f64) -> Result<()> {
        let node_count = self.importer.id_map.node_count();
        for node in [source, target] {
            if node >= node_count {
                return Err(Error::NodeOutOfRange { node, node_count });
            }
        }
        self.push(source, target, weight)
    }

    #[inline]
    fn push(&mut self, source: u64, target: u64, weight: f64) -> Result<()> {
        match self.importer.projection.orientation() {
            Orientation::Natural => self.buffer.push((source, target, weight)),
            Orientation::Reverse => self.buffer.push((target, source, weight)),
            Orientation::Undirected => {
                self.buffer.push((source, target, weight));
                // A self-loop is one relationship, not two.
                if source != target {
                    self.buffer.push((target, source, weight));
                }
            }
        }
        if self.buffer.len() >= self.importer.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Half-edges currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Compresses the buffered half-edges into this worker's segment.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let aggregation = self.importer.aggregation;
        let weighted = self.importer.projection.is_weighted();
        let deferred = self.importer.defers_folding();
        let buffer = &mut self.buffer;
        let segment = &mut self.segment;

        // Stable: equal pairs keep ingestion order for `Single`.
        buffer.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut pairs: Vec<(u64, f64)> = Vec::new();
        let mut targets: Vec<u64> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        let mut i = 0;
        while i < buffer.len() {
            let source = buffer[i].0;
            pairs.clear();
            while i < buffer.len() && buffer[i].0 == source {
                pairs.push((buffer[i].1, buffer[i].2));
                i += 1;
            }
            if deferred {
                targets.clear();
                weights.clear();
                targets.extend(pairs.iter().map(|&(target, _)| target));
                weights.extend(pairs.iter().map(|&(_, weight)| weight));
            } else {
                aggregate(source, &pairs, aggregation, &mut targets, &mut weights)?;
            }
            segment.push_run(
                source,
                &targets,
                weighted.then_some(weights.as_slice()),
                !deferred,
            )?;
        }
        buffer.clear();
        Ok(())
    }

    /// Flushes what is left and hands over the segment for [`RelationshipImporter::build`].
    pub fn finish(mut self) -> Result<Segment> {
        self.flush()?;
        Ok(self.segment)
    }
}

/// A worker's private compressed output: one run per flushed source.
///
/// Runs of a weighted [`Aggregation::Sum`] import keep repeated targets;
/// their weights are added up in [`RelationshipImporter::build`].
#[derive(Debug, Default)]
pub struct Segment {
    runs: Vec<Run>,
    bytes: Vec<u8>,
    weights: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    source: u64,
    offset: usize,
    len: usize,
    weight_offset: usize,
    degree: u64,
    folded: bool,
}

impl Segment {
    /// Half-edges stored across all runs, counting repeats not yet folded.
    pub fn relationship_count(&self) -> u64 {
        self.runs.iter().map(|r| r.degree).sum()
    }

    /// Number of runs.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Returns `true` if nothing was flushed.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    fn push_run(
        &mut self,
        source: u64,
        targets: &[u64],
        weights: Option<&[f64]>,
        folded: bool,
    ) -> Result<()> {
        let offset = self.bytes.len();
        let len = varint::encode_record(source, targets, &mut self.bytes)?;
        let weight_offset = self.weights.len();
        if let Some(weights) = weights {
            self.weights.extend_from_slice(weights);
        }
        self.runs.push(Run {
            source,
            offset,
            len,
            weight_offset,
            degree: targets.len() as u64,
            folded,
        });
        Ok(())
    }

    fn run_bytes(&self, run: &Run) -> &[u8] {
        &self.bytes[run.offset..run.offset + run.len]
    }

    fn run_targets(&self, run: &Run) -> AdjacencyCursor<'_> {
        AdjacencyCursor::new(&self.bytes, run.offset as u64)
    }

    fn run_weights(&self, run: &Run) -> &[f64] {
        let end = (run.weight_offset + run.degree as usize).min(self.weights.len());
        &self.weights[run.weight_offset.min(end)..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RunRef {
    source: u64,
    segment: usize,
    run: usize,
}

#[derive(Debug, Default)]
struct Chunk {
    bytes: Vec<u8>,
    weights: Vec<f64>,
    lengths: Vec<(u64, u64)>,
}
