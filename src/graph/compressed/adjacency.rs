//! The immutable compressed adjacency store.

use std::sync::Arc;

use super::{AdjacencyCursor, AdjacencyOffsets};
use crate::memory::AllocationTracker;

/// Compressed neighbor lists for `0..node_count`, plus optional weights.
///
/// Created once by [`RelationshipImporter::build`](crate::graph::loading::RelationshipImporter::build)
/// and immutable afterwards, so any number of readers may decode it
/// concurrently without synchronization.
///
/// ### Performance Characteristics
/// | Operation | Complexity | Notes |
/// |-----------|------------|-------|
/// | `degree` | \(O(1)\) | Decodes the record header |
/// | `cursor` | \(O(1)\) | Lazy; iterating costs \(O(\text{degree})\) |
/// | `weights` | \(O(1)\) | Borrowed slice of the weight column |
/// | `has_relationship` | \(O(\text{degree})\) | Linear decode with early exit |
pub struct AdjacencyList {
    bytes: Vec<u8>,
    offsets: AdjacencyOffsets,
    weights: Option<Vec<f64>>,
    relationship_count: u64,
    tracker: Option<(Arc<AllocationTracker>, usize)>,
}

impl AdjacencyList {
    pub(crate) fn from_parts(
        bytes: Vec<u8>,
        offsets: AdjacencyOffsets,
        weights: Option<Vec<f64>>,
        relationship_count: u64,
    ) -> Self {
        debug_assert!(weights
            .as_ref()
            .map_or(true, |w| w.len() as u64 == relationship_count));
        Self {
            bytes,
            offsets,
            weights,
            relationship_count,
            tracker: None,
        }
    }

    /// Attributes this store's bytes to `tracker` until it is dropped.
    pub(crate) fn track(&mut self, tracker: &Arc<AllocationTracker>) -> crate::Result<()> {
        let bytes = self.size_of();
        tracker.try_add(bytes)?;
        self.tracker = Some((Arc::clone(tracker), bytes));
        Ok(())
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> u64 {
        self.offsets.len()
    }

    /// Number of stored (directed) relationships.
    #[inline]
    pub fn relationship_count(&self) -> u64 {
        self.relationship_count
    }

    /// Returns `true` if a weight column was built.
    #[inline]
    pub fn has_weights(&self) -> bool {
        self.weights.is_some()
    }

    /// Number of targets stored for `node`.
    #[inline]
    pub fn degree(&self, node: u64) -> u64 {
        self.check(node);
        self.cursor_unchecked(node).remaining()
    }

    /// Opens a forward-only cursor over `node`'s targets.
    ///
    /// # Panics
    /// Panics if `node >= node_count()`.
    #[inline]
    pub fn cursor(&self, node: u64) -> AdjacencyCursor<'_> {
        self.check(node);
        self.cursor_unchecked(node)
    }

    #[inline(always)]
    fn cursor_unchecked(&self, node: u64) -> AdjacencyCursor<'_> {
        AdjacencyCursor::new(&self.bytes, self.offsets.get(node))
    }

    /// The weights of `node`'s relationships, aligned with its cursor order.
    ///
    /// Returns `None` if the store was built without weights.
    pub fn weights(&self, node: u64) -> Option<&[f64]> {
        self.check(node);
        let weights = self.weights.as_deref()?;
        let start = self.offsets.relationship_offset(node) as usize;
        let end = start + self.cursor_unchecked(node).remaining() as usize;
        Some(&weights[start..end])
    }

    /// Checks whether `source -> target` is stored.
    pub fn has_relationship(&self, source: u64, target: u64) -> bool {
        // Sorted targets allow stopping at the first larger one.
        self.cursor(source)
            .take_while(|&t| t <= target)
            .any(|t| t == target)
    }

    /// The offset table.
    pub fn offsets(&self) -> &AdjacencyOffsets {
        &self.offsets
    }

    /// The raw compressed buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes held by records, offsets and weights.
    pub fn size_of(&self) -> usize {
        self.bytes.len()
            + self.offsets.size_of()
            + self.weights.as_ref().map_or(0, |w| w.len() * core::mem::size_of::<f64>())
    }

    #[inline(always)]
    fn check(&self, node: u64) {
        assert!(
            node < self.node_count(),
            "node {node} out of bounds for {} nodes",
            self.node_count()
        );
    }
}

impl Drop for AdjacencyList {
    fn drop(&mut self) {
        if let Some((tracker, bytes)) = self.tracker.take() {
            tracker.remove(bytes);
        }
    }
}

impl core::fmt::Debug for AdjacencyList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdjacencyList")
            .field("node_count", &self.node_count())
            .field("relationship_count", &self.relationship_count)
            .field("bytes", &self.bytes.len())
            .field("weighted", &self.has_weights())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::compressed::varint;

    fn build(adjacency: &[Vec<u64>], weights: Option<Vec<f64>>) -> AdjacencyList {
        let mut bytes = Vec::new();
        let mut lengths = Vec::new();
        for (node, targets) in adjacency.iter().enumerate() {
            let len = varint::encode_record(node as u64, targets, &mut bytes).unwrap();
            lengths.push((len as u64, targets.len() as u64));
        }
        let (offsets, total, rels) =
            AdjacencyOffsets::from_lengths(lengths, adjacency.len() as u64);
        assert_eq!(total as usize, bytes.len());
        AdjacencyList::from_parts(bytes, offsets, weights, rels)
    }

    #[test]
    fn basic_operations() {
        let adjacency = vec![vec![1, 2, 3], vec![0, 2], vec![], vec![0, 200]];
        let list = build(&adjacency, None);

        assert_eq!(list.node_count(), 4);
        assert_eq!(list.relationship_count(), 7);
        assert_eq!(list.degree(0), 3);
        assert_eq!(list.degree(2), 0);
        assert_eq!(list.cursor(3).collect::<Vec<_>>(), vec![0, 200]);
        assert!(list.has_relationship(3, 200));
        assert!(!list.has_relationship(3, 100));
        assert!(list.weights(0).is_none());
    }

    #[test]
    fn weights_align_with_cursor() {
        let adjacency = vec![vec![1, 2], vec![0], vec![0]];
        let list = build(&adjacency, Some(vec![0.5, 1.5, 2.5, 3.5]));
        assert_eq!(list.weights(0), Some(&[0.5, 1.5][..]));
        assert_eq!(list.weights(1), Some(&[2.5][..]));
        assert_eq!(list.weights(2), Some(&[3.5][..]));
    }

    #[test]
    fn tracked_bytes_are_released() {
        let tracker = Arc::new(AllocationTracker::new());
        let mut list = build(&[vec![1], vec![0]], None);
        list.track(&tracker).unwrap();
        assert_eq!(tracker.in_use(), list.size_of());
        drop(list);
        assert_eq!(tracker.in_use(), 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn cursor_out_of_bounds_panics() {
        let list = build(&[vec![]], None);
        let _ = list.cursor(1);
    }
}
