//! Graph storage and read access.
//!
//! Layers, bottom-up:
//! - `id_map`: dense `0..node_count` node ids for sparse original ids
//! - `compressed`: delta-encoded, varint-packed adjacency records
//! - `loading`: concurrent relationship import into a compressed store
//! - `view`: the immutable [`Graph`] handed to algorithms
//! - `properties`: per-node `f64` values attached to a graph

pub mod compressed;
pub mod id_map;
pub mod loading;
pub mod properties;
pub mod view;

pub use compressed::{AdjacencyCursor, AdjacencyList};
pub use id_map::{IdMap, IdMapBuilder};
pub use loading::{
    Aggregation, Edge, EdgeList, GraphLoader, Orientation, RelationshipImporter,
    RelationshipProjection,
};
pub use properties::{NodeProperties, OriginalIdProperties, SeedProperties};
pub use view::{Graph, Relationships};
