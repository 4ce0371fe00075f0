//! Relationship import: from raw edge streams to a compressed adjacency store.
//!
//! Loading runs in three stages:
//!
//! 1. **Ingest**: every worker owns an [`ImportWorker`] and buffers
//!    half-edges locally; callers may partition the edge stream any way they
//!    like.
//! 2. **Flush**: a full buffer is sorted by `(source, target)`, parallel
//!    edges are aggregated, and each source's targets are delta-encoded into
//!    the worker's private [`Segment`].
//! 3. **Build**: once all workers are done, [`RelationshipImporter::build`]
//!    merges runs of the same source coming from different segments, assigns
//!    offsets in one sequential pass, and concatenates everything into a
//!    single buffer. This is the only synchronization point.
//!
//! Every record is sorted and aggregated before encoding, and weighted sums
//! are folded once during the build in ascending weight order. For any
//! partitioning of the same edge set, both the compressed bytes and the
//! weight column are therefore bit-identical. [`Aggregation::Single`] is the
//! exception: it keeps the first relationship in segment order, which
//! follows the input order when the edge stream is split into contiguous
//! slices.

pub mod aggregation;
pub mod edge_list;
pub mod importer;
pub mod loader;


use serde::{Deserialize, Serialize};

pub use aggregation::Aggregation;
pub use edge_list::EdgeList;
pub use importer::{ImportWorker, RelationshipImporter, Segment};
pub use loader::{Edge, GraphLoader};

use crate::property::PropertyMapping;

/// Edges each worker buffers before compressing them.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Weight reported for relationships loaded without a weight property.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Which half-edges an imported edge produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    /// `source -> target` only.
    #[default]
    Natural,
    /// `target -> source` only.
    Reverse,
    /// Both directions.
    Undirected,
}

/// What to load for one relationship type.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipProjection {
    orientation: Orientation,
    aggregation: Aggregation,
    weight: Option<PropertyMapping>,
}

impl RelationshipProjection {
    /// A projection without weights.
    pub fn new(orientation: Orientation, aggregation: Aggregation) -> Self {
        Self {
            orientation,
            aggregation,
            weight: None,
        }
    }

    /// Loads relationship weights described by `mapping`.
    ///
    /// An aggregation configured on the mapping takes precedence over the
    /// projection's.
    #[must_use]
    pub fn with_weight(mut self, mapping: PropertyMapping) -> Self {
        self.weight = Some(mapping.with_aggregation(self.aggregation));
        self
    }

    /// The orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The weight mapping, if weights are loaded.
    pub fn weight(&self) -> Option<&PropertyMapping> {
        self.weight.as_ref()
    }

    /// Returns `true` if weights are loaded.
    pub fn is_weighted(&self) -> bool {
        self.weight.is_some()
    }

    /// The aggregation applied to parallel relationships.
    pub fn aggregation(&self) -> Aggregation {
        self.weight
            .as_ref()
            .and_then(PropertyMapping::aggregation)
            .unwrap_or(self.aggregation)
    }

    /// Weight substituted for edges that carry none.
    pub fn default_weight(&self) -> f64 {
        self.weight
            .as_ref()
            .map_or(DEFAULT_WEIGHT, |w| w.default_value_or(DEFAULT_WEIGHT))
    }
}

impl Default for RelationshipProjection {
    fn default() -> Self {
        Self::new(Orientation::Natural, Aggregation::default())
    }
}
