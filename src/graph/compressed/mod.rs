//! Compressed adjacency storage.
//!
//! Every node owns one record in a shared byte buffer:
//!
//! ```text
//! [degree][t0][t1 - t0][t2 - t1] ...
//! ```
//!
//! All values are variable-length unsigned integers (`varint`). Targets are
//! sorted ascending, so every delta is non-negative and small for local
//! neighborhoods. An offset table maps each node to the first byte of its
//! record; relationship weights, when present, live in a parallel `f64`
//! column indexed through a second offset table.
//!
//! Records decode forward only through [`AdjacencyCursor`].

pub mod adjacency;
pub mod cursor;
pub mod offsets;
pub mod varint;

pub use adjacency::AdjacencyList;
pub use cursor::AdjacencyCursor;
pub use offsets::AdjacencyOffsets;
