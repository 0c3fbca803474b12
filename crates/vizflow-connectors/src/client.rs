//! Remote query client.
//!
//! [`RemoteQueryClient`] serializes a query into a form-encoded POST
//! request, sends it through a pluggable [`QueryTransport`], and parses
//! the JSON response into rows. Failures are classified
//! ([`ClientError`]) and then degraded: [`RemoteQueryClient::execute`]
//! never propagates an error past this boundary, it logs and resolves to
//! zero rows so the graph keeps evaluating.
//!
//! Exactly one request is issued per call. There is no retry, backoff,
//! or timeout beyond whatever the transport default provides.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use vizflow_core::pulse::Row;

use crate::config::{ConnectionConfig, EndpointConfig};
use crate::error::ClientError;

/// Form key carrying the query statement.
const FORM_KEY_QUERY: &str = "query";
/// Form key carrying the forwarded data-source connection string.
const FORM_KEY_CONNECTION: &str = "postgresConnectionString";

/// A fully buffered response from the transport layer.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Canonical status text (e.g., "Bad Request").
    pub status_text: String,
    /// The complete response body.
    pub body: String,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport for issuing one form-encoded POST per call.
///
/// Implementations must be `Send + Sync` so a client can be shared across
/// transform instances. A transport only moves bytes; classification of
/// statuses and body parsing happen in [`RemoteQueryClient`].
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Sends one POST request with a URL-encoded form body and buffers
    /// the full response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on any network-level failure
    /// (connection refused, DNS failure, reset).
    async fn post_form(
        &self,
        endpoint: &EndpointConfig,
        form: &[(String, String)],
    ) -> Result<TransportResponse, ClientError>;

    /// Returns the name of this transport for logging.
    fn name(&self) -> &str;
}

/// HTTP transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a new HTTP transport with default client settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn post_form(
        &self,
        endpoint: &EndpointConfig,
        form: &[(String, String)],
    ) -> Result<TransportResponse, ClientError> {
        let mut req = self.client.post(endpoint.url()).form(&form);
        for (name, value) in &endpoint.headers {
            req = req.header(name, value);
        }

        // Content-Type and Content-Length are set from the encoded form.
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("{}: {e}", endpoint.url())))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("reading response body: {e}")))?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// JSON document returned by the remote query service.
#[derive(Deserialize)]
struct QueryResponse {
    rows: Vec<Row>,
}

/// Client for the remote relational-query service.
pub struct RemoteQueryClient {
    transport: Arc<dyn QueryTransport>,
    connection: ConnectionConfig,
}

impl fmt::Debug for RemoteQueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteQueryClient")
            .field("transport", &self.transport.name())
            .field("endpoint", &self.connection.endpoint.url())
            .field(
                "has_connection_string",
                &self.connection.connection_string.is_some(),
            )
            .finish()
    }
}

impl RemoteQueryClient {
    /// Creates a client over the given transport and connection config.
    #[must_use]
    pub fn new(transport: Arc<dyn QueryTransport>, connection: ConnectionConfig) -> Self {
        Self {
            transport,
            connection,
        }
    }

    /// Returns the connection configuration.
    #[must_use]
    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    /// Executes a query, resolving every failure to an empty row set.
    ///
    /// Rejected queries (HTTP 400), transport failures, and malformed
    /// responses are logged at `warn` and degrade to zero rows. Callers
    /// must tolerate silently empty data rather than retry.
    pub async fn execute(&self, statement: &str) -> Vec<Row> {
        match self.try_execute(statement).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    error = %err,
                    transport = self.transport.name(),
                    endpoint = %self.connection.endpoint.url(),
                    "remote query degraded to empty result"
                );
                Vec::new()
            }
        }
    }

    /// Executes a query, surfacing the classified failure.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::QueryRejected` for HTTP 400,
    /// `ClientError::Transport` for network failures and other
    /// non-success statuses, and `ClientError::MalformedResponse` if the
    /// body is not a `{"rows": [...]}` document.
    pub async fn try_execute(&self, statement: &str) -> Result<Vec<Row>, ClientError> {
        let mut form = vec![(FORM_KEY_QUERY.to_string(), statement.to_string())];
        if let Some(conn) = &self.connection.connection_string {
            form.push((FORM_KEY_CONNECTION.to_string(), conn.clone()));
        }

        let resp = self
            .transport
            .post_form(&self.connection.endpoint, &form)
            .await?;

        if resp.status == 400 {
            return Err(ClientError::QueryRejected {
                status: resp.status,
                detail: format!("{}: {}", resp.status_text, resp.body),
            });
        }
        if !resp.is_success() {
            return Err(ClientError::Transport(format!(
                "unexpected status {} {}: {}",
                resp.status, resp.status_text, resp.body
            )));
        }

        let doc: QueryResponse = serde_json::from_str(&resp.body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        debug!(rows = doc.rows.len(), "remote query resolved");
        Ok(doc.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    fn client_with(transport: MockTransport) -> RemoteQueryClient {
        RemoteQueryClient::new(Arc::new(transport), ConnectionConfig::default())
    }

    #[tokio::test]
    async fn test_success_resolves_rows() {
        let transport = MockTransport::new();
        transport.push_response(200, r#"{"rows":[{"id":1},{"id":2}]}"#);
        let client = client_with(transport);

        let rows = client.try_execute("SELECT id FROM t;").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], serde_json::Value::from(1));
    }

    #[tokio::test]
    async fn test_rejection_classified_and_degraded() {
        let transport = MockTransport::new();
        transport.push_response(400, "syntax error at or near \"FORM\"");
        let client = client_with(transport);

        let err = client.try_execute("SELECT id FORM t;").await.unwrap_err();
        assert!(matches!(err, ClientError::QueryRejected { status: 400, .. }));

        // The degraded path resolves, it does not propagate.
        let transport = MockTransport::new();
        transport.push_response(400, "syntax error");
        let client = client_with(transport);
        assert!(client.execute("SELECT id FORM t;").await.is_empty());
    }

    #[tokio::test]
    async fn test_other_non_success_is_transport_error() {
        let transport = MockTransport::new();
        transport.push_response(503, "service unavailable");
        let client = client_with(transport);

        let err = client.try_execute("SELECT id FROM t;").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_classified() {
        let transport = MockTransport::new();
        transport.push_response(200, "not json");
        let client = client_with(transport);

        let err = client.try_execute("SELECT id FROM t;").await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_form_body_carries_query_and_connection_string() {
        let transport = MockTransport::new();
        transport.push_response(200, r#"{"rows":[]}"#);
        let requests = transport.requests_handle();
        let client = RemoteQueryClient::new(
            Arc::new(transport),
            ConnectionConfig::default().with_connection_string("postgres://localhost/db"),
        );

        client.execute("SELECT a FROM t;").await;

        let sent = requests.lock().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .iter()
            .any(|(k, v)| k == "query" && v == "SELECT a FROM t;"));
        assert!(sent[0]
            .iter()
            .any(|(k, v)| k == "postgresConnectionString" && v == "postgres://localhost/db"));
    }

    #[tokio::test]
    async fn test_connection_refused_degrades_to_empty() {
        // Bind and drop a listener to get a port nothing is listening on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let connection = ConnectionConfig::new(EndpointConfig::new("127.0.0.1", port));
        let client = RemoteQueryClient::new(Arc::new(HttpTransport::new()), connection);

        let err = client.try_execute("SELECT a FROM t;").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(client.execute("SELECT a FROM t;").await.is_empty());
    }
}
