//! Graph topology data structures.
//!
//! Defines `GraphNode`, `NodeKind`, and the `DataflowGraph` arena with
//! index-based edges in both directions.

use std::fmt;
use std::mem;

use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::pulse::{Row, Tuple, TupleId};

use super::error::GraphError;

/// Unique identifier for a node within one graph instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Classification of a dataflow node.
///
/// The tag is explicit on the node record so traversal code never has to
/// introspect an operator's concrete type to find materialization points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Holds the authoritative, addressable row set other nodes read from.
    Materialization,
    /// Maps data fields to output properties and declares the fields it reads.
    Encoding,
    /// Any other transform stage (filter, derive, remote query, ...).
    Operator,
}

/// A node in the dataflow graph.
///
/// Nodes are created through [`DataflowGraph::add_node`] and wired up with
/// [`DataflowGraph::add_edge`]; they are plain records, owned by the arena.
pub struct GraphNode {
    /// Unique node identifier.
    pub id: NodeId,
    /// Human-readable name (e.g., "collect", "marks").
    pub name: String,
    /// Node classification.
    pub kind: NodeKind,
    /// Back-reference to the node this one was derived from, if any.
    pub source: Option<NodeId>,
    /// Downstream nodes. `SmallVec` avoids heap alloc for <= 4 targets.
    pub targets: SmallVec<[NodeId; 4]>,
    /// Field names this node reads. Empty for non-encoding nodes.
    pub declared_fields: Vec<String>,
    /// The node's currently materialized row set.
    pub value: Vec<Tuple>,
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("targets", &self.targets)
            .field("declared_fields", &self.declared_fields)
            .field("value_len", &self.value.len())
            .finish()
    }
}

/// Arena-backed dataflow graph.
///
/// Holds every node of one pipeline instance and the per-graph tuple-id
/// counter used to ingest rows into the pulse protocol.
pub struct DataflowGraph {
    /// All nodes, keyed by `NodeId`.
    nodes: FxHashMap<NodeId, GraphNode>,
    /// Name -> `NodeId` index for lookups.
    name_index: FxHashMap<String, NodeId>,
    /// Next node ID counter.
    next_node_id: u32,
    /// Next tuple ID counter (row identity, monotonic per graph).
    next_tuple_id: u64,
}

impl fmt::Debug for DataflowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataflowGraph")
            .field("node_count", &self.nodes.len())
            .field("next_tuple_id", &self.next_tuple_id)
            .finish_non_exhaustive()
    }
}

impl DataflowGraph {
    /// Creates a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            name_index: FxHashMap::default(),
            next_node_id: 0,
            next_tuple_id: 0,
        }
    }

    /// Adds a node to the graph.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateNode` if a node with the same name exists.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeId, GraphError> {
        let name = name.into();
        if self.name_index.contains_key(&name) {
            return Err(GraphError::DuplicateNode(name));
        }

        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let node = GraphNode {
            id,
            name: name.clone(),
            kind,
            source: None,
            targets: SmallVec::new(),
            declared_fields: Vec::new(),
            value: Vec::new(),
        };

        self.nodes.insert(id, node);
        self.name_index.insert(name, id);

        Ok(id)
    }

    /// Adds a downstream edge from `source` to `target`.
    ///
    /// The target's `source` back-reference is established by its first
    /// inbound edge; later edges extend fan-in without changing it.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if either node does not exist.
    /// Returns `GraphError::SelfLoop` if `source == target`.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<(), GraphError> {
        if source == target {
            let name = self.node_name(source).unwrap_or_default();
            return Err(GraphError::SelfLoop(name));
        }
        if !self.nodes.contains_key(&source) {
            return Err(GraphError::NodeNotFound(format!("{source}")));
        }
        if !self.nodes.contains_key(&target) {
            return Err(GraphError::NodeNotFound(format!("{target}")));
        }

        if let Some(node) = self.nodes.get_mut(&source) {
            node.targets.push(target);
        }
        if let Some(node) = self.nodes.get_mut(&target) {
            if node.source.is_none() {
                node.source = Some(source);
            }
        }

        Ok(())
    }

    /// Records the field names an encoding node reads.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if the node does not exist.
    pub fn declare_fields(
        &mut self,
        node: NodeId,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), GraphError> {
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| GraphError::NodeNotFound(format!("{node}")))?;
        entry
            .declared_fields
            .extend(fields.into_iter().map(Into::into));
        Ok(())
    }

    /// Assigns row identity, admitting a raw row into the pulse protocol.
    ///
    /// Tuple ids are monotonic per graph; a row must be ingested exactly
    /// once before it can appear in a pulse partition.
    pub fn ingest(&mut self, values: Row) -> Tuple {
        let id = TupleId(self.next_tuple_id);
        self.next_tuple_id += 1;
        Tuple { id, values }
    }

    /// Replaces a node's materialized value, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if the node does not exist.
    pub fn set_value(&mut self, node: NodeId, value: Vec<Tuple>) -> Result<Vec<Tuple>, GraphError> {
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| GraphError::NodeNotFound(format!("{node}")))?;
        Ok(mem::replace(&mut entry.value, value))
    }

    // ---- Accessors ----

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a reference to a node by ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    /// Returns the `NodeId` for a given node name.
    #[must_use]
    pub fn node_id_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    /// Returns the node name for a given `NodeId`.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<String> {
        self.nodes.get(&id).map(|n| n.name.clone())
    }

    /// Returns a node's downstream targets, or an empty slice if unknown.
    #[must_use]
    pub fn targets(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |n| n.targets.as_slice())
    }

    /// Returns a node's `source` back-reference, if it has one.
    #[must_use]
    pub fn source_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.source)
    }

    /// Returns a node's materialized value, or an empty slice if unknown.
    #[must_use]
    pub fn value(&self, id: NodeId) -> &[Tuple] {
        self.nodes.get(&id).map_or(&[], |n| n.value.as_slice())
    }
}

impl Default for DataflowGraph {
    fn default() -> Self {
        Self::new()
    }
}
