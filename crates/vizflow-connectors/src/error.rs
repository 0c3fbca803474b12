//! Connector error types.
//!
//! Two tiers with different propagation policies:
//! - [`TransformError`]: programmer/operator errors (bad configuration,
//!   no discoverable consumer). Raised to the host runtime, which owns
//!   the user-visible failure presentation.
//! - [`ClientError`]: per-request failures (rejected query, unreachable
//!   service, malformed response). Caught at the client boundary, logged,
//!   and degraded to an empty row set so evaluation completes.

use thiserror::Error;

use vizflow_core::graph::GraphError;

/// Errors that abort a transform evaluation.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A required parameter is missing or has an invalid value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required configuration value was never provided.
    #[error("missing required config: {0}")]
    MissingConfig(String),

    /// The field-discovery walk found no consumer of the query node.
    #[error("no downstream consumer declares fields for node {0}")]
    GraphConsistency(String),

    /// The host graph rejected an operation.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Per-request failures at the remote query client boundary.
///
/// These never propagate past [`RemoteQueryClient::execute`]; they exist
/// so the classification is observable in logs and reachable from tests
/// via [`RemoteQueryClient::try_execute`].
///
/// [`RemoteQueryClient::execute`]: crate::client::RemoteQueryClient::execute
/// [`RemoteQueryClient::try_execute`]: crate::client::RemoteQueryClient::try_execute
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service returned a client-error status for the submitted query.
    #[error("query rejected ({status}): {detail}")]
    QueryRejected {
        /// The HTTP status code (400).
        status: u16,
        /// Status text combined with the response body.
        detail: String,
    },

    /// A network-level failure reaching the service, or an unexpected
    /// non-success status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the expected JSON document.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_display() {
        let err = TransformError::MissingConfig("endpoint host".into());
        assert_eq!(err.to_string(), "missing required config: endpoint host");
    }

    #[test]
    fn test_graph_error_converts() {
        let err: TransformError = GraphError::NodeNotFound("NodeId(3)".into()).into();
        assert!(matches!(err, TransformError::Graph(_)));
        assert!(err.to_string().contains("NodeId(3)"));
    }

    #[test]
    fn test_query_rejected_display() {
        let err = ClientError::QueryRejected {
            status: 400,
            detail: "Bad Request: syntax error at or near \"FORM\"".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("FORM"));
    }
}
