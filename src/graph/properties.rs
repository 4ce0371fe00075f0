//! Per-node `f64` properties.

use std::sync::Arc;

use foldhash::{HashMap, HashMapExt};

use crate::collections::PagedArray;
use crate::graph::id_map::IdMap;

/// Read access to one `f64` value per node.
pub trait NodeProperties: Send + Sync {
    /// Value of `node`; `NaN` means "no value".
    fn node_property(&self, node: u64) -> f64;

    /// Number of nodes with a slot.
    fn size(&self) -> u64;
}

impl NodeProperties for PagedArray<f64> {
    #[inline]
    fn node_property(&self, node: u64) -> f64 {
        if node < self.size() {
            self.get(node)
        } else {
            f64::NAN
        }
    }

    fn size(&self) -> u64 {
        PagedArray::size(self)
    }
}

impl NodeProperties for Vec<f64> {
    #[inline]
    fn node_property(&self, node: u64) -> f64 {
        usize::try_from(node)
            .ok()
            .and_then(|i| self.get(i))
            .copied()
            .unwrap_or(f64::NAN)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

/// Exposes each node's original id as its property value.
///
/// On a summary graph the original id of a node is the community id it stands
/// for on the finer level, so this is the provenance of every summary node.
#[derive(Debug, Clone)]
pub struct OriginalIdProperties {
    id_map: Arc<IdMap>,
}

impl OriginalIdProperties {
    /// Wraps the mapping of a graph.
    pub fn new(id_map: Arc<IdMap>) -> Self {
        Self { id_map }
    }
}

impl NodeProperties for OriginalIdProperties {
    #[inline]
    fn node_property(&self, node: u64) -> f64 {
        if node < self.id_map.node_count() {
            self.id_map.to_original(node) as f64
        } else {
            f64::NAN
        }
    }

    fn size(&self) -> u64 {
        self.id_map.node_count()
    }
}

/// Seed communities derived from arbitrary per-node values.
///
/// Nodes sharing a value share a community, named after the first node id
/// that carries the value. A `NaN` value leaves the node in its own community.
/// The result always lies in `0..node_count`, so it can index per-community
/// arrays directly.
#[derive(Debug, Clone)]
pub struct SeedProperties {
    communities: PagedArray<u64>,
}

impl SeedProperties {
    /// Densifies `values` over `node_count` nodes.
    pub fn new(values: &dyn NodeProperties, node_count: u64) -> Self {
        let mut communities = PagedArray::<u64>::zeroed(node_count);
        let mut first: HashMap<u64, u64> = HashMap::new();
        communities.set_all(|node| {
            let value = values.node_property(node);
            if value.is_nan() {
                return node;
            }
            // -0.0 and 0.0 name the same community.
            let key = if value == 0.0 { 0 } else { value.to_bits() };
            *first.entry(key).or_insert(node)
        });
        Self { communities }
    }

    /// Seed community of `node`.
    #[inline]
    pub fn community(&self, node: u64) -> u64 {
        self.communities.get(node)
    }

    /// Number of distinct seed communities.
    pub fn community_count(&self) -> u64 {
        self.communities
            .iter()
            .enumerate()
            .filter(|&(node, community)| node as u64 == community)
            .count() as u64
    }

    /// The densified communities.
    pub fn into_communities(self) -> PagedArray<u64> {
        self.communities
    }
}

impl NodeProperties for SeedProperties {
    #[inline]
    fn node_property(&self, node: u64) -> f64 {
        if node < self.communities.size() {
            self.communities.get(node) as f64
        } else {
            f64::NAN
        }
    }

    fn size(&self) -> u64 {
        self.communities.size()
    }
}
