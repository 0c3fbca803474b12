//! Field-requirement discovery.
//!
//! Walks the graph downstream of a query node to find the encoding nodes
//! that depend on it, then walks each encoder's `source` chain upward to
//! the nearest materialization node. The result tells a remote-query
//! operator which fields each materialization point actually needs, so it
//! can synthesize a minimal projection instead of fetching every column.

use fxhash::{FxHashMap, FxHashSet};
use tracing::trace;

use super::topology::{DataflowGraph, NodeId, NodeKind};

/// The fields one materialization node must supply.
///
/// One entry exists per materialization node reachable upstream from an
/// encoding node that depends on the query node. Fields are deduplicated
/// per entry, preserving first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    /// The materialization node the fields are read through.
    pub materialization: NodeId,
    /// Required field names, first-seen order, no duplicates.
    pub fields: Vec<String>,
}

impl FieldRequirement {
    fn new(materialization: NodeId) -> Self {
        Self {
            materialization,
            fields: Vec::new(),
        }
    }

    fn push_fields(&mut self, fields: &[String]) {
        for field in fields {
            if !self.fields.iter().any(|f| f == field) {
                self.fields.push(field.clone());
            }
        }
    }
}

/// Collects the fields required downstream of `target`, starting at `from`.
///
/// Depth-first traversal over `targets` edges. At each visited node that
/// declares fields and whose `source` chain leads back to `target`, the
/// declared fields are recorded under the nearest materialization node on
/// that chain. Encoders under the same materialization node have their
/// field lists unioned.
///
/// An empty map means no downstream consumer declares fields (or none has
/// a source path back to the target); callers must treat that as "nothing
/// to query" rather than issue an empty projection.
#[must_use]
pub fn collect_field_requirements(
    graph: &DataflowGraph,
    from: NodeId,
    target: NodeId,
) -> FxHashMap<NodeId, FieldRequirement> {
    let mut requirements: FxHashMap<NodeId, FieldRequirement> = FxHashMap::default();
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    let mut stack = vec![from];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = graph.node(id) else {
            continue;
        };

        if !node.declared_fields.is_empty() && has_source_path(graph, id, target) {
            if let Some(collect) = nearest_materialization(graph, id) {
                trace!(encoder = %id, materialization = %collect, "field requirement");
                requirements
                    .entry(collect)
                    .or_insert_with(|| FieldRequirement::new(collect))
                    .push_fields(&node.declared_fields);
            }
        }

        stack.extend(node.targets.iter().copied());
    }

    requirements
}

/// Returns `true` if walking `source` back-references from `from` reaches
/// `target`.
///
/// The walk is bounded by the node count, so a malformed source chain
/// cannot loop forever.
fn has_source_path(graph: &DataflowGraph, from: NodeId, target: NodeId) -> bool {
    let mut current = graph.source_of(from);
    let mut hops = graph.node_count();
    while let Some(id) = current {
        if id == target {
            return true;
        }
        if hops == 0 {
            return false;
        }
        hops -= 1;
        current = graph.source_of(id);
    }
    false
}

/// Walks `source` back-references from `from` to the nearest
/// materialization-kind node, if one exists.
fn nearest_materialization(graph: &DataflowGraph, from: NodeId) -> Option<NodeId> {
    let mut current = graph.source_of(from);
    let mut hops = graph.node_count();
    while let Some(id) = current {
        if graph.node(id).map(|n| n.kind) == Some(NodeKind::Materialization) {
            return Some(id);
        }
        if hops == 0 {
            return None;
        }
        hops -= 1;
        current = graph.source_of(id);
    }
    None
}
