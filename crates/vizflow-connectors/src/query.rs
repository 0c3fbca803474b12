//! Projection query synthesis.
//!
//! Only field projection is synthesized: `SELECT f1, f2 FROM relation;`.
//! No filtering, grouping, or join logic is generated. Binning parameters
//! ([`BinParams`]) are accepted and validated at the configuration layer
//! but are reserved surface: synthesis deterministically ignores them
//! rather than miscompiling them into a statement.

use crate::error::TransformError;

/// The minimal contract needed to synthesize a projection statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// The relation to project from.
    pub relation: String,
    /// Field names, emitted in the order supplied.
    pub fields: Vec<String>,
}

impl QueryDescriptor {
    /// Creates a descriptor for the given relation and fields.
    #[must_use]
    pub fn new(
        relation: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            relation: relation.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Builds a projection statement from a descriptor.
///
/// Field and relation names are emitted verbatim: no quoting or escaping
/// is applied, so names must come from a trusted schema.
///
/// # Errors
///
/// Returns `TransformError::Configuration` if the relation name is empty
/// or the field list is empty.
pub fn build_projection(descriptor: &QueryDescriptor) -> Result<String, TransformError> {
    if descriptor.relation.trim().is_empty() {
        return Err(TransformError::Configuration(
            "projection requires a relation name".into(),
        ));
    }
    if descriptor.fields.is_empty() {
        return Err(TransformError::Configuration(format!(
            "projection against '{}' requires at least one field",
            descriptor.relation
        )));
    }
    Ok(format!(
        "SELECT {} FROM {};",
        descriptor.fields.join(", "),
        descriptor.relation
    ))
}

/// Binning parameters accepted at the configuration layer.
///
/// Reserved for future extension: [`validate`](Self::validate) enforces
/// their shape, but [`build_projection`] never consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct BinParams {
    /// The field to bin.
    pub field: String,
    /// Upper bound on the number of bins.
    pub max_bins: u32,
    /// Optional bin anchor value.
    pub anchor: Option<f64>,
    /// Optional explicit step size.
    pub step: Option<f64>,
}

impl BinParams {
    /// Creates binning parameters for a field.
    #[must_use]
    pub fn new(field: impl Into<String>, max_bins: u32) -> Self {
        Self {
            field: field.into(),
            max_bins,
            anchor: None,
            step: None,
        }
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::Configuration` if the field name is empty
    /// or `max_bins` is zero.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.field.trim().is_empty() {
            return Err(TransformError::MissingConfig("bin field".into()));
        }
        if self.max_bins == 0 {
            return Err(TransformError::Configuration(
                "max_bins must be at least 1".into(),
            ));
        }
        if let Some(step) = self.step {
            if step <= 0.0 {
                return Err(TransformError::Configuration(format!(
                    "bin step must be positive, got {step}"
                )));
            }
        }
        Ok(())
    }
}
