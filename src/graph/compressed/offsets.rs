//! Per-node offset tables.

use crate::collections::PagedArray;

/// Maps every node to the start of its record and of its weights.
///
/// Built once by a single sequential pass over per-node lengths and never
/// modified afterwards.
#[derive(Debug, Clone)]
pub struct AdjacencyOffsets {
    bytes: PagedArray<u64>,
    relationships: PagedArray<u64>,
}

impl AdjacencyOffsets {
    /// Prefix-sums per-node record lengths and degrees into offsets.
    ///
    /// Returns the table together with the total byte length and the total
    /// relationship count.
    pub fn from_lengths(
        lengths: impl IntoIterator<Item = (u64, u64)>,
        node_count: u64,
    ) -> (Self, u64, u64) {
        let mut bytes = PagedArray::zeroed(node_count);
        let mut relationships = PagedArray::zeroed(node_count);
        let mut byte_offset = 0u64;
        let mut relationship_offset = 0u64;
        let mut node = 0u64;
        for (record_len, degree) in lengths {
            bytes.set(node, byte_offset);
            relationships.set(node, relationship_offset);
            byte_offset += record_len;
            relationship_offset += degree;
            node += 1;
        }
        debug_assert_eq!(node, node_count, "one length per node");
        (
            Self {
                bytes,
                relationships,
            },
            byte_offset,
            relationship_offset,
        )
    }

    /// Byte offset of `node`'s record.
    #[inline]
    pub fn get(&self, node: u64) -> u64 {
        self.bytes.get(node)
    }

    /// Index of `node`'s first weight in the weight column.
    #[inline]
    pub fn relationship_offset(&self, node: u64) -> u64 {
        self.relationships.get(node)
    }

    /// Number of nodes covered.
    #[inline]
    pub fn len(&self) -> u64 {
        self.bytes.size()
    }

    /// Returns `true` if no node is covered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes held by both tables.
    pub fn size_of(&self) -> usize {
        self.bytes.size_of() + self.relationships.size_of()
    }
}
