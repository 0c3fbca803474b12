//! Testing utilities for the remote query connector.
//!
//! Provides a scriptable mock transport and graph fixtures for testing
//! the transform without a live query service.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use vizflow_core::graph::{DataflowGraph, NodeId, NodeKind};

use crate::client::{QueryTransport, TransportResponse};
use crate::config::EndpointConfig;
use crate::error::ClientError;

/// Canonical status text for the statuses the mock deals in.
fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}

/// Scriptable transport that replays canned responses.
///
/// Responses are consumed in push order; once the script is exhausted,
/// every request resolves to `200 {"rows":[]}`. Sent form bodies are
/// recorded and reachable through [`requests_handle`](Self::requests_handle)
/// even after the transport has been moved behind an `Arc`.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, ClientError>>>,
    requests: Arc<Mutex<Vec<Vec<(String, String)>>>>,
}

impl MockTransport {
    /// Creates a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a response with the given status and body.
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().push_back(Ok(TransportResponse {
            status,
            status_text: status_text(status).to_string(),
            body: body.into(),
        }));
    }

    /// Queues a transport-level failure.
    pub fn push_failure(&self, error: ClientError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Returns a handle to the recorded form bodies.
    #[must_use]
    pub fn requests_handle(&self) -> Arc<Mutex<Vec<Vec<(String, String)>>>> {
        Arc::clone(&self.requests)
    }

    /// Returns the number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryTransport for MockTransport {
    async fn post_form(
        &self,
        _endpoint: &EndpointConfig,
        form: &[(String, String)],
    ) -> Result<TransportResponse, ClientError> {
        self.requests.lock().push(form.to_vec());
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Ok(TransportResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: r#"{"rows":[]}"#.to_string(),
            })
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Builds the canonical remote-query pipeline:
/// `query -> collect -> encoder(fields)`.
///
/// Returns `(graph, query_node, collect_node, encoder_node)`.
///
/// # Panics
///
/// Panics if graph construction fails (cannot happen with these inputs).
#[must_use]
pub fn remote_pipeline(fields: &[&str]) -> (DataflowGraph, NodeId, NodeId, NodeId) {
    let mut graph = DataflowGraph::new();
    let query = graph.add_node("remote_query", NodeKind::Operator).unwrap();
    let collect = graph.add_node("collect", NodeKind::Materialization).unwrap();
    let encoder = graph.add_node("marks", NodeKind::Encoding).unwrap();
    graph.add_edge(query, collect).unwrap();
    graph.add_edge(collect, encoder).unwrap();
    graph.declare_fields(encoder, fields.iter().copied()).unwrap();
    (graph, query, collect, encoder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let transport = MockTransport::new();
        transport.push_response(200, "first");
        transport.push_response(400, "second");

        let endpoint = EndpointConfig::default();
        let first = transport.post_form(&endpoint, &[]).await.unwrap();
        let second = transport.post_form(&endpoint, &[]).await.unwrap();

        assert_eq!(first.status, 200);
        assert_eq!(first.body, "first");
        assert_eq!(second.status, 400);
        assert_eq!(second.status_text, "Bad Request");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_default_is_empty_success() {
        let transport = MockTransport::new();
        let resp = transport
            .post_form(&EndpointConfig::default(), &[])
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, r#"{"rows":[]}"#);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let transport = MockTransport::new();
        transport.push_failure(ClientError::Transport("connection reset".into()));

        let err = transport
            .post_form(&EndpointConfig::default(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn test_pipeline_fixture_shape() {
        let (graph, query, collect, encoder) = remote_pipeline(&["a", "b"]);
        assert_eq!(graph.targets(query), &[collect]);
        assert_eq!(graph.source_of(encoder), Some(collect));
        assert_eq!(graph.node(encoder).unwrap().declared_fields.len(), 2);
    }
}
