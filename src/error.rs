//! Error types shared by loading, graph access and clustering.
//!
//! Cancellation is not an error: a cancelled computation returns a
//! partial result flagged as such, never an `Err`.

use thiserror::Error;

/// Result alias for `colgraph`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the graph store and the algorithms running on it.
#[derive(Debug, Error)]
pub enum Error {
    /// An edge referenced an original id that the id mapping does not know.
    #[error("node with original id {original} is not part of the id mapping")]
    UnmappedNode {
        /// The offending original id.
        original: u64,
    },

    /// A dense node id outside `0..node_count`.
    #[error("node id {node} is out of range for a graph with {node_count} nodes")]
    NodeOutOfRange {
        /// The offending node id.
        node: u64,
        /// Node count of the graph or mapping.
        node_count: u64,
    },

    /// A parallel edge was imported while the projection forbids them.
    #[error("duplicate relationship ({source_node} -> {target_node}) is not allowed with aggregation NONE")]
    DuplicateRelationship {
        /// Mapped source node.
        source_node: u64,
        /// Mapped target node.
        target_node: u64,
    },

    /// Delta encoding saw targets out of order; the producing stage is broken.
    #[error("adjacency encoding failed for node {node}: target {target} follows {previous}")]
    Encoding {
        /// Node whose record was being written.
        node: u64,
        /// Previously written target.
        previous: u64,
        /// Target that broke the ordering.
        target: u64,
    },

    /// A resolved property mapping was resolved again with another key id.
    #[error("different property key ids: {expected} != {actual}")]
    PropertyKeyMismatch {
        /// Key id the mapping is already bound to.
        expected: u32,
        /// Key id it was asked to bind to.
        actual: u32,
    },

    /// Malformed property mapping description.
    #[error("invalid property mapping: {0}")]
    InvalidProperty(String),

    /// Invalid configuration value.
    #[error("invalid configuration '{name}': {message}")]
    InvalidConfig {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The allocation tracker ceiling would be exceeded.
    #[error("memory limit exceeded: requested {requested} bytes, {available} bytes available")]
    MemoryLimitExceeded {
        /// Bytes requested.
        requested: usize,
        /// Bytes still available under the ceiling.
        available: usize,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Reading an edge list failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An edge list line could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Parse failure description.
        message: String,
    },
}

impl Error {
    pub(crate) fn invalid_config(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            name,
            message: message.into(),
        }
    }
}
