//! Read-only graph view.

use core::ops::Range;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::compressed::{AdjacencyCursor, AdjacencyList};
use super::id_map::IdMap;
use super::loading::Orientation;
use super::properties::NodeProperties;

/// An immutable graph: id mapping, compressed adjacency and node properties.
///
/// Cloning is cheap and clones share the same storage, so a graph can be
/// handed to any number of concurrent readers.
#[derive(Clone)]
pub struct Graph {
    id_map: Arc<IdMap>,
    adjacency: Arc<AdjacencyList>,
    orientation: Orientation,
    properties: BTreeMap<String, Arc<dyn NodeProperties>>,
}

impl Graph {
    /// Combines a mapping with the adjacency built for it.
    ///
    /// # Panics
    /// Panics if the two disagree on the node count.
    pub fn new(id_map: Arc<IdMap>, adjacency: Arc<AdjacencyList>, orientation: Orientation) -> Self {
        assert_eq!(
            id_map.node_count(),
            adjacency.node_count(),
            "id mapping and adjacency disagree on node count"
        );
        Self {
            id_map,
            adjacency,
            orientation,
            properties: BTreeMap::new(),
        }
    }

    /// Attaches a node property under `key`, replacing any previous one.
    #[must_use]
    pub fn with_node_properties(mut self, key: impl Into<String>, properties: Arc<dyn NodeProperties>) -> Self {
        self.properties.insert(key.into(), properties);
        self
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> u64 {
        self.id_map.node_count()
    }

    /// Number of stored relationships (both halves of an undirected edge).
    #[inline]
    pub fn relationship_count(&self) -> u64 {
        self.adjacency.relationship_count()
    }

    /// Orientation the relationships were loaded with.
    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns `true` if relationships carry stored weights.
    #[inline]
    pub fn has_relationship_weights(&self) -> bool {
        self.adjacency.has_weights()
    }

    /// All node ids.
    #[inline]
    pub fn nodes(&self) -> Range<u64> {
        0..self.node_count()
    }

    /// Visits node ids in ascending order until `visitor` returns `false`.
    ///
    /// Returns `false` if the visit stopped early.
    pub fn for_each_node(&self, mut visitor: impl FnMut(u64) -> bool) -> bool {
        self.nodes().all(|node| visitor(node))
    }

    /// Number of relationships leaving `node`.
    #[inline]
    pub fn degree(&self, node: u64) -> u64 {
        self.adjacency.degree(node)
    }

    /// Visits `(node, target, weight)` for each relationship of `node` in
    /// ascending target order until `visitor` returns `false`.
    ///
    /// `default_weight` is reported when the graph stores no weights.
    /// Returns `false` if the visit stopped early.
    pub fn for_each_relationship(
        &self,
        node: u64,
        default_weight: f64,
        mut visitor: impl FnMut(u64, u64, f64) -> bool,
    ) -> bool {
        self.relationships(node, default_weight)
            .all(|(target, weight)| visitor(node, target, weight))
    }

    /// Lazily decodes the `(target, weight)` pairs of `node`.
    pub fn relationships(&self, node: u64, default_weight: f64) -> Relationships<'_> {
        Relationships {
            cursor: self.adjacency.cursor(node),
            weights: self.adjacency.weights(node).unwrap_or(&[]),
            index: 0,
            default_weight,
        }
    }

    /// Checks whether `source -> target` is stored.
    pub fn exists(&self, source: u64, target: u64) -> bool {
        self.adjacency.has_relationship(source, target)
    }

    /// Original id of `node`.
    ///
    /// # Panics
    /// Panics if `node >= node_count()`.
    #[inline]
    pub fn to_original_node_id(&self, node: u64) -> u64 {
        self.id_map.to_original(node)
    }

    /// Node id of `original`, or `None` if the graph does not contain it.
    #[inline]
    pub fn to_mapped_node_id(&self, original: u64) -> Option<u64> {
        self.id_map.to_mapped(original)
    }

    /// The node property registered under `key`.
    pub fn node_properties(&self, key: &str) -> Option<&dyn NodeProperties> {
        self.properties.get(key).map(|p| p.as_ref())
    }

    /// Keys of all registered node properties.
    pub fn node_property_keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// The id mapping.
    pub fn id_map(&self) -> &Arc<IdMap> {
        &self.id_map
    }

    /// The compressed adjacency.
    pub fn adjacency(&self) -> &Arc<AdjacencyList> {
        &self.adjacency
    }

    /// Sum of all stored relationship weights.
    pub fn total_relationship_weight(&self, default_weight: f64) -> f64 {
        self.nodes()
            .map(|node| self.relationships(node, default_weight).map(|(_, w)| w).sum::<f64>())
            .sum()
    }

    /// Approximate bytes held by mapping and adjacency.
    pub fn size_of(&self) -> usize {
        self.id_map.size_of() + self.adjacency.size_of()
    }
}

impl core::fmt::Debug for Graph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.node_count())
            .field("relationship_count", &self.relationship_count())
            .field("orientation", &self.orientation)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Iterator over the `(target, weight)` pairs of one node.
pub struct Relationships<'a> {
    cursor: AdjacencyCursor<'a>,
    weights: &'a [f64],
    index: usize,
    default_weight: f64,
}

impl<'a> Iterator for Relationships<'a> {
    type Item = (u64, f64);

    #[inline]
    fn next(&mut self) -> Option<(u64, f64)> {
        let target = self.cursor.next()?;
        let weight = self
            .weights
            .get(self.index)
            .copied()
            .unwrap_or(self.default_weight);
        self.index += 1;
        Some((target, weight))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cursor.size_hint()
    }
}

impl<'a> ExactSizeIterator for Relationships<'a> {}
