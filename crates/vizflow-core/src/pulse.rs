//! Tuples and the incremental-update ("pulse") protocol.
//!
//! A pulse is the per-evaluation delta object carrying added, removed, and
//! source row partitions between nodes. Rows become [`Tuple`]s when they
//! are ingested through [`DataflowGraph::ingest`], which assigns the
//! identity the protocol needs to track a record across evaluations.
//!
//! [`DataflowGraph::ingest`]: crate::graph::DataflowGraph::ingest

use std::fmt;

/// Unique identity of an ingested row, monotonic per graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TupleId(pub u64);

impl fmt::Display for TupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TupleId({})", self.0)
    }
}

/// A raw row as returned by a data producer.
///
/// The shape is dictated entirely by the producer (for remote queries, the
/// service's JSON response) and is opaque to the graph beyond being
/// record-like.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// An ingested row: identity plus values.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    /// Row identity assigned at ingest time.
    pub id: TupleId,
    /// The row's field values.
    pub values: Row,
}

/// The per-evaluation delta exchanged between nodes.
///
/// A node that replaces its entire value set emits the previous tuples in
/// `rem` and the new tuples in both `add` and `source`, with field- and
/// source-level diff tracking suppressed (there is no meaningful per-field
/// delta when the whole row set changes hands).
#[derive(Debug, Clone, Default)]
pub struct Pulse {
    /// Tuples added by this evaluation.
    pub add: Vec<Tuple>,
    /// Tuples removed by this evaluation.
    pub rem: Vec<Tuple>,
    /// The source partition downstream nodes read from.
    pub source: Vec<Tuple>,
    /// When set, downstream nodes must not consult per-field modification
    /// tracking for this pulse.
    pub skip_field_mods: bool,
    /// When set, downstream nodes must not consult per-source modification
    /// tracking for this pulse.
    pub skip_source_mods: bool,
}

impl Pulse {
    /// Builds a full-replacement pulse: `prev` retracted, `next` added.
    ///
    /// Field- and source-diff tracking are suppressed, since every row is
    /// being replaced rather than modified in place.
    #[must_use]
    pub fn replace(prev: Vec<Tuple>, next: Vec<Tuple>) -> Self {
        Self {
            add: next.clone(),
            rem: prev,
            source: next,
            skip_field_mods: true,
            skip_source_mods: true,
        }
    }

    /// Returns the number of tuples added by this pulse.
    #[must_use]
    pub fn add_count(&self) -> usize {
        self.add.len()
    }

    /// Returns the number of tuples removed by this pulse.
    #[must_use]
    pub fn rem_count(&self) -> usize {
        self.rem.len()
    }

    /// Returns `true` if the pulse carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.rem.is_empty() && self.source.is_empty()
    }
}
