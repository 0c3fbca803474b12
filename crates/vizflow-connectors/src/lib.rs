//! # Vizflow Connectors
//!
//! Remote query delegation for the vizflow dataflow graph.
//!
//! The [`transform::RemoteQueryTransform`] operator lets a data-producing
//! node fetch its rows from a remote relational-query service instead of
//! computing them locally. On each evaluation it:
//!
//! 1. walks the graph downstream to discover which fields dependent
//!    encoders actually consume (`vizflow_core::graph::walker`),
//! 2. synthesizes a minimal projection statement ([`query`]),
//! 3. POSTs it to the configured service over a pluggable transport
//!    ([`client`]), and
//! 4. merges the returned rows back into the graph's pulse protocol
//!    ([`transform`]).
//!
//! ## Failure policy
//!
//! Configuration and graph-consistency problems abort an evaluation with
//! an error. Query rejections and transport failures do not: the client
//! logs them and degrades to zero rows, so the graph keeps evaluating
//! with an emptied node. See [`error`] for the taxonomy.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Connector error types.
pub mod error;

/// Endpoint and connection configuration.
pub mod config;

/// Projection query synthesis.
pub mod query;

/// Remote query client and transport abstraction.
pub mod client;

/// The remote-query transform operator.
pub mod transform;

/// Testing utilities (mock transport, graph fixtures).
pub mod testing;

pub use client::{HttpTransport, QueryTransport, RemoteQueryClient, TransportResponse};
pub use config::{ConnectionConfig, EndpointConfig};
pub use error::{ClientError, TransformError};
pub use query::{build_projection, BinParams, QueryDescriptor};
pub use transform::{EvalPhase, RemoteQueryTransform, TransformParams};
