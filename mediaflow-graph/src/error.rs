//! Graph error types.

use thiserror::Error;

/// Errors from graph construction, configuration, and execution.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Shared core error.
    #[error(transparent)]
    Core(#[from] mediaflow_core::Error),

    /// Buffering adapter error from a resampling node.
    #[error(transparent)]
    Adapter(#[from] mediaflow_resample::AdapterError),

    /// No filter kind registered under this name.
    #[error("Filter kind not found: {0}")]
    KindNotFound(String),

    /// A node with this instance name already exists.
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    /// No node with this instance name.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Pad index outside the node's declared pad count.
    #[error("Pad {pad} out of range on node {node}")]
    PadOutOfRange {
        /// Node instance name.
        node: String,
        /// Offending pad index.
        pad: usize,
    },

    /// Pad already carries a link.
    #[error("Pad {pad} on node {node} is already linked")]
    PadAlreadyLinked {
        /// Node instance name.
        node: String,
        /// Offending pad index.
        pad: usize,
    },

    /// Configuration found a pad with no link.
    #[error("Unlinked pad {pad} on node {node}")]
    UnlinkedPad {
        /// Node instance name.
        node: String,
        /// Offending pad index.
        pad: usize,
    },

    /// Adjacent nodes could not agree on a link format.
    #[error("Format negotiation failed: {0}")]
    Negotiation(String),

    /// The graph contains a cycle.
    #[error("Graph contains a cycle")]
    CycleDetected,

    /// Execution was attempted before a successful configure.
    #[error("Graph is not configured")]
    NotConfigured,
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
