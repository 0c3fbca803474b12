//! Error types for graph construction and mutation.

/// Errors that can occur while building or mutating a dataflow graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An operation referenced a node that does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A node with the same name already exists.
    #[error("duplicate node name: {0}")]
    DuplicateNode(String),

    /// An edge would connect a node to itself.
    #[error("self-loop rejected for node: {0}")]
    SelfLoop(String),
}
