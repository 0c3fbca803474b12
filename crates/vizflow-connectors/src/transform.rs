//! The remote-query transform operator.
//!
//! [`RemoteQueryTransform`] is the operator a host graph registers for a
//! node that fetches its rows from a remote relational-query service.
//! Each evaluation moves through the phases
//! `ValidatingConfig -> DiscoveringFields -> Querying -> Merging` and
//! returns the pulse the host propagates downstream.
//!
//! One remote query is issued per evaluation pass: when the discovery
//! walk finds consumers under several materialization nodes, their field
//! sets are unioned into a single projection against the configured
//! relation (per-requirement fan-out is unimplemented).

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use vizflow_core::graph::{collect_field_requirements, DataflowGraph, NodeId};
use vizflow_core::pulse::{Pulse, Tuple};

use crate::client::{QueryTransport, RemoteQueryClient};
use crate::config::ConnectionConfig;
use crate::error::TransformError;
use crate::query::{build_projection, BinParams, QueryDescriptor};

/// Evaluation phase, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalPhase {
    /// Between evaluations.
    Idle,
    /// Checking connection and parameter validity.
    ValidatingConfig,
    /// Walking the graph for consumed fields.
    DiscoveringFields,
    /// The remote request is in flight.
    Querying,
    /// Publishing rows through the pulse protocol.
    Merging,
}

impl fmt::Display for EvalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvalPhase::Idle => "idle",
            EvalPhase::ValidatingConfig => "validating_config",
            EvalPhase::DiscoveringFields => "discovering_fields",
            EvalPhase::Querying => "querying",
            EvalPhase::Merging => "merging",
        };
        f.write_str(name)
    }
}

/// Static parameters of a remote-query node.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParams {
    /// The relation the projection is synthesized against.
    pub relation: String,
    /// Binning parameters. Validated but reserved: synthesis ignores them.
    pub bin: Option<BinParams>,
}

impl TransformParams {
    /// Creates parameters for a plain projection against `relation`.
    #[must_use]
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            bin: None,
        }
    }

    /// Attaches binning parameters (reserved, see [`BinParams`]).
    #[must_use]
    pub fn with_bin(mut self, bin: BinParams) -> Self {
        self.bin = Some(bin);
        self
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::MissingConfig` if the relation name is
    /// empty, or the bin parameters' own validation error.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.relation.trim().is_empty() {
            return Err(TransformError::MissingConfig("relation name".into()));
        }
        if let Some(bin) = &self.bin {
            bin.validate()?;
        }
        Ok(())
    }
}

/// Operator that delegates a node's data production to a remote service.
pub struct RemoteQueryTransform {
    params: TransformParams,
    client: RemoteQueryClient,
}

impl fmt::Debug for RemoteQueryTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteQueryTransform")
            .field("params", &self.params)
            .field("client", &self.client)
            .finish()
    }
}

impl RemoteQueryTransform {
    /// Creates a transform over the given transport.
    ///
    /// Configuration is injected here and is immutable afterwards; the
    /// "set once before first use" contract is enforced as a constructor
    /// precondition instead of process-wide state.
    ///
    /// # Errors
    ///
    /// Returns `TransformError` if the connection config or parameters
    /// are invalid.
    pub fn new(
        params: TransformParams,
        connection: ConnectionConfig,
        transport: Arc<dyn QueryTransport>,
    ) -> Result<Self, TransformError> {
        connection.validate()?;
        params.validate()?;
        Ok(Self {
            params,
            client: RemoteQueryClient::new(transport, connection),
        })
    }

    /// Returns the transform's static parameters.
    #[must_use]
    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &RemoteQueryClient {
        &self.client
    }

    /// Evaluates the node once, returning the pulse for the host runtime.
    ///
    /// The node's materialized value is replaced unconditionally: a
    /// degraded (rejected or unreachable) query empties the node rather
    /// than preserving stale rows.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::Configuration`/`MissingConfig` if the
    /// configuration is invalid, or `TransformError::GraphConsistency`
    /// if no downstream consumer declares fields. Query and transport
    /// failures do not error; they arrive here already degraded to an
    /// empty row set.
    pub async fn evaluate(
        &self,
        graph: &mut DataflowGraph,
        node: NodeId,
    ) -> Result<Pulse, TransformError> {
        debug!(%node, phase = %EvalPhase::ValidatingConfig, "evaluating remote query node");
        self.params.validate()?;
        self.client.connection().validate()?;

        debug!(%node, phase = %EvalPhase::DiscoveringFields, "walking dependents");
        let requirements = collect_field_requirements(graph, node, node);
        if requirements.is_empty() {
            let name = graph.node_name(node).unwrap_or_else(|| format!("{node}"));
            return Err(TransformError::GraphConsistency(name));
        }

        // One query per pass: union fields across requirements, keyed
        // order made deterministic by materialization id.
        let mut keys: Vec<NodeId> = requirements.keys().copied().collect();
        keys.sort_unstable();
        let mut fields: Vec<String> = Vec::new();
        for key in keys {
            for field in &requirements[&key].fields {
                if !fields.iter().any(|f| f == field) {
                    fields.push(field.clone());
                }
            }
        }

        let descriptor = QueryDescriptor {
            relation: self.params.relation.clone(),
            fields,
        };
        let statement = build_projection(&descriptor)?;
        trace!(%statement, "synthesized projection");

        debug!(%node, phase = %EvalPhase::Querying, "issuing remote query");
        let rows = self.client.execute(&statement).await;

        debug!(%node, phase = %EvalPhase::Merging, rows = rows.len(), "publishing rows");
        let tuples: Vec<Tuple> = rows.into_iter().map(|row| graph.ingest(row)).collect();
        let previous = graph.set_value(node, tuples.clone())?;

        debug!(%node, phase = %EvalPhase::Idle, "evaluation complete");
        Ok(Pulse::replace(previous, tuples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{remote_pipeline, MockTransport};
    use vizflow_core::graph::NodeKind;
    use vizflow_core::pulse::Row;

    fn transform_with(transport: MockTransport, relation: &str) -> RemoteQueryTransform {
        RemoteQueryTransform::new(
            TransformParams::new(relation),
            ConnectionConfig::default(),
            Arc::new(transport),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_happy_path_end_to_end() {
        let (mut graph, query, _, _) = remote_pipeline(&["a", "b"]);

        let transport = MockTransport::new();
        transport.push_response(200, r#"{"rows":[{"a":1,"b":"x"},{"a":2,"b":"y"}]}"#);
        let requests = transport.requests_handle();
        let transform = transform_with(transport, "orders");

        let pulse = transform.evaluate(&mut graph, query).await.unwrap();

        assert_eq!(pulse.add_count(), 2);
        assert_eq!(pulse.rem_count(), 0);
        assert_eq!(pulse.source.len(), 2);
        assert!(pulse.skip_field_mods);
        assert!(pulse.skip_source_mods);
        assert_eq!(graph.value(query).len(), 2);

        let sent = requests.lock().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .iter()
            .any(|(k, v)| k == "query" && v == "SELECT a, b FROM orders;"));
    }

    #[tokio::test]
    async fn test_rejected_query_empties_node() {
        let (mut graph, query, _, _) = remote_pipeline(&["a"]);

        // Seed a previous value so the retraction is observable.
        let mut row = Row::new();
        row.insert("a".to_string(), serde_json::Value::from(9));
        let seeded = graph.ingest(row);
        graph.set_value(query, vec![seeded]).unwrap();

        let transport = MockTransport::new();
        transport.push_response(400, "syntax error");
        let transform = transform_with(transport, "orders");

        let pulse = transform.evaluate(&mut graph, query).await.unwrap();

        assert_eq!(pulse.add_count(), 0);
        assert_eq!(pulse.rem_count(), 1);
        assert!(graph.value(query).is_empty());
    }

    #[tokio::test]
    async fn test_no_consumer_is_graph_consistency_error() {
        let mut graph = DataflowGraph::new();
        let query = graph.add_node("remote_query", NodeKind::Operator).unwrap();
        let collect = graph.add_node("collect", NodeKind::Materialization).unwrap();
        graph.add_edge(query, collect).unwrap();

        let transport = MockTransport::new();
        let requests = transport.requests_handle();
        let transform = transform_with(transport, "orders");

        let err = transform.evaluate(&mut graph, query).await.unwrap_err();
        assert!(matches!(err, TransformError::GraphConsistency(_)));
        assert!(err.to_string().contains("remote_query"));
        // Failed before any network activity.
        assert!(requests.lock().is_empty());
    }

    #[test]
    fn test_invalid_connection_rejected_at_construction() {
        let err = RemoteQueryTransform::new(
            TransformParams::new("orders"),
            ConnectionConfig::new(crate::config::EndpointConfig::new("", 3000)),
            Arc::new(MockTransport::new()),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::MissingConfig(_)));
    }

    #[test]
    fn test_missing_relation_rejected_at_construction() {
        let err = RemoteQueryTransform::new(
            TransformParams::new(""),
            ConnectionConfig::default(),
            Arc::new(MockTransport::new()),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::MissingConfig(_)));
    }

    #[test]
    fn test_invalid_bin_params_rejected_at_construction() {
        let err = RemoteQueryTransform::new(
            TransformParams::new("orders").with_bin(BinParams::new("hp", 0)),
            ConnectionConfig::default(),
            Arc::new(MockTransport::new()),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_bin_params_do_not_change_statement() {
        let (mut graph, query, _, _) = remote_pipeline(&["hp"]);

        let transport = MockTransport::new();
        transport.push_response(200, r#"{"rows":[]}"#);
        let requests = transport.requests_handle();
        let transform = RemoteQueryTransform::new(
            TransformParams::new("cars").with_bin(BinParams::new("hp", 20)),
            ConnectionConfig::default(),
            Arc::new(transport),
        )
        .unwrap();

        transform.evaluate(&mut graph, query).await.unwrap();

        let sent = requests.lock().clone();
        assert!(sent[0]
            .iter()
            .any(|(k, v)| k == "query" && v == "SELECT hp FROM cars;"));
    }

    #[tokio::test]
    async fn test_two_materializations_union_into_one_query() {
        let mut graph = DataflowGraph::new();
        let query = graph.add_node("remote_query", NodeKind::Operator).unwrap();
        let m1 = graph.add_node("m1", NodeKind::Materialization).unwrap();
        let m2 = graph.add_node("m2", NodeKind::Materialization).unwrap();
        let e1 = graph.add_node("e1", NodeKind::Encoding).unwrap();
        let e2 = graph.add_node("e2", NodeKind::Encoding).unwrap();
        graph.add_edge(query, m1).unwrap();
        graph.add_edge(m1, e1).unwrap();
        graph.add_edge(m1, m2).unwrap();
        graph.add_edge(m2, e2).unwrap();
        graph.declare_fields(e1, ["a"]).unwrap();
        graph.declare_fields(e2, ["b", "a"]).unwrap();

        let transport = MockTransport::new();
        transport.push_response(200, r#"{"rows":[]}"#);
        let requests = transport.requests_handle();
        let transform = transform_with(transport, "orders");

        transform.evaluate(&mut graph, query).await.unwrap();

        let sent = requests.lock().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .iter()
            .any(|(k, v)| k == "query" && v == "SELECT a, b FROM orders;"));
    }

    #[tokio::test]
    async fn test_successive_evaluations_retract_previous_rows() {
        let (mut graph, query, _, _) = remote_pipeline(&["a"]);

        let transport = MockTransport::new();
        transport.push_response(200, r#"{"rows":[{"a":1}]}"#);
        transport.push_response(200, r#"{"rows":[{"a":2},{"a":3}]}"#);
        let transform = transform_with(transport, "orders");

        let first = transform.evaluate(&mut graph, query).await.unwrap();
        assert_eq!(first.add_count(), 1);
        assert_eq!(first.rem_count(), 0);

        let second = transform.evaluate(&mut graph, query).await.unwrap();
        assert_eq!(second.add_count(), 2);
        assert_eq!(second.rem_count(), 1);
        assert_eq!(second.rem[0].values["a"], serde_json::Value::from(1));
        assert_eq!(graph.value(query).len(), 2);
    }
}
