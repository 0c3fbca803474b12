//! # Vizflow Core
//!
//! The dataflow substrate for vizflow: an arena-backed reactive graph and
//! the incremental-update ("pulse") protocol that carries row deltas
//! between nodes.
//!
//! ## Overview
//!
//! - [`graph`] - Graph topology (`DataflowGraph`, `GraphNode`, `NodeId`)
//!   and field-requirement discovery for remote query delegation
//! - [`pulse`] - Row identity (`Tuple`) and the add/rem/source delta
//!   object exchanged between nodes on each evaluation
//!
//! Nodes are stored in an arena and reference each other by index in both
//! directions: `targets` point downstream, `source` points back at the
//! node a derived node was created from. This keeps traversal free of
//! ownership cycles while still supporting the upward walks the field
//! discovery pass needs.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Graph topology and traversal.
pub mod graph;

/// Tuples and the incremental-update protocol.
pub mod pulse;

pub use graph::{
    collect_field_requirements, DataflowGraph, FieldRequirement, GraphError, GraphNode, NodeId,
    NodeKind,
};
pub use pulse::{Pulse, Row, Tuple, TupleId};
