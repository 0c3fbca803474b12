//! # Dataflow Graph Topology
//!
//! Arena-backed directed graph for reactive dataflow pipelines.
//!
//! This module provides the topology layer consumed by transform
//! operators:
//!
//! - **`DataflowGraph`**: node arena with bidirectional index edges
//! - **`GraphNode`** / **`NodeId`**: adjacency-list representation
//! - **`NodeKind`**: explicit node classification tag
//! - **`collect_field_requirements`**: discovery of the fields downstream
//!   encoders actually consume
//!
//! Edges are stored as indices, never as owning references: `targets`
//! lists downstream nodes, `source` points back at the node a derived
//! node was created from. The host evaluates nodes downstream along
//! `targets`; field discovery additionally walks `source` chains upward.

pub mod error;
pub mod topology;
pub mod walker;


pub use error::GraphError;
pub use topology::{DataflowGraph, GraphNode, NodeId, NodeKind};
pub use walker::{collect_field_requirements, FieldRequirement};
