//! Dense node ids for sparse original ids.

use foldhash::{HashMap, HashMapExt};

use crate::collections::PagedArray;
use crate::error::{Error, Result};

/// Bidirectional mapping between original ids and dense node ids `0..node_count`.
///
/// Node ids are assigned in first-seen order, so the same input order always
/// yields the same mapping.
#[derive(Debug, Clone)]
pub struct IdMap {
    to_original: PagedArray<u64>,
    to_mapped: HashMap<u64, u64>,
}

impl IdMap {
    /// Builds a mapping from original ids in import order; repeats are ignored.
    pub fn from_original_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        let ids = ids.into_iter();
        let mut builder = IdMapBuilder::with_capacity(ids.size_hint().0);
        for id in ids {
            builder.add_node(id);
        }
        builder.build()
    }

    /// The identity mapping over `0..node_count`.
    pub fn identity(node_count: u64) -> Self {
        Self::from_original_ids(0..node_count)
    }

    /// Number of mapped nodes.
    #[inline]
    pub fn node_count(&self) -> u64 {
        self.to_original.size()
    }

    /// Original id of `node`.
    ///
    /// # Panics
    /// Panics if `node >= node_count()`.
    #[inline]
    pub fn to_original(&self, node: u64) -> u64 {
        self.to_original.get(node)
    }

    /// Node id of `original`, or `None` if it was never imported.
    #[inline]
    pub fn to_mapped(&self, original: u64) -> Option<u64> {
        self.to_mapped.get(&original).copied()
    }

    /// Node id of `original`, failing with [`Error::UnmappedNode`].
    #[inline]
    pub fn try_to_mapped(&self, original: u64) -> Result<u64> {
        self.to_mapped(original)
            .ok_or(Error::UnmappedNode { original })
    }

    /// Returns `true` if `original` is mapped.
    #[inline]
    pub fn contains(&self, original: u64) -> bool {
        self.to_mapped.contains_key(&original)
    }

    /// Original ids in node id order.
    pub fn original_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.to_original.iter()
    }

    /// Approximate bytes held by both directions.
    pub fn size_of(&self) -> usize {
        self.to_original.size_of()
            + self.to_mapped.capacity() * (core::mem::size_of::<(u64, u64)>() + 1)
    }
}

/// Incrementally assigns dense node ids to original ids.
#[derive(Debug, Default)]
pub struct IdMapBuilder {
    originals: Vec<u64>,
    index: HashMap<u64, u64>,
}

impl IdMapBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder expecting about `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            originals: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the node id for `original`, assigning the next one if unseen.
    pub fn add_node(&mut self, original: u64) -> u64 {
        let next = self.originals.len() as u64;
        let mapped = *self.index.entry(original).or_insert(next);
        if mapped == next {
            self.originals.push(original);
        }
        mapped
    }

    /// Node id already assigned to `original`.
    pub fn get(&self, original: u64) -> Option<u64> {
        self.index.get(&original).copied()
    }

    /// Number of distinct ids seen so far.
    pub fn len(&self) -> usize {
        self.originals.len()
    }

    /// Returns `true` if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// Freezes the mapping.
    pub fn build(self) -> IdMap {
        IdMap {
            to_original: self.originals.into_iter().collect(),
            to_mapped: self.index,
        }
    }
}
