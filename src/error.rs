//! Crate-wide error type.
//!
//! All graph-construction failures are surfaced through [`GraphError`] with
//! the offending names and coordinates attached. Construction never panics
//! on bad input; panics are reserved for internal invariant violations.

use thiserror::Error;

use crate::graph::coordinate::Coordinate;

/// Errors raised while building a workflow graph.
///
/// Every variant is fatal to graph construction. Reference absences caused
/// by a failed `when` guard or an out-of-window lag are *not* errors; they
/// are silent by design.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A reference names a task or data template absent from the workflow
    /// definition.
    #[error("'{name}' is not declared in the workflow definition")]
    UnknownName { name: String },

    /// Two items with the same name and equal coordinates were inserted.
    #[error("'{name}': coordinate {coordinate} already occupied")]
    DuplicateCoordinate { name: String, coordinate: Coordinate },

    /// An item's coordinate dimensions differ from the dimensions its array
    /// was established with.
    #[error("'{name}': dimensions [{got}] don't match established dimensions [{expected}]")]
    DimensionMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// A coordinate was built or merged with the same dimension twice.
    #[error("dimension '{dimension}' given more than once")]
    DuplicateDimension { dimension: String },

    /// An input reference with a port resolved to zero data items without a
    /// guard or out-of-window excuse.
    #[error("task '{task}' {coordinate}: input '{input}' on port '{port}' resolved to no data")]
    UnresolvedInput {
        task: String,
        coordinate: Coordinate,
        input: String,
        port: String,
    },

    /// Two distinct tasks declare the same concrete data item as an output.
    #[error("data '{data}' {coordinate}: written by both '{first}' and '{second}'")]
    MultipleWriters {
        data: String,
        coordinate: Coordinate,
        first: String,
        second: String,
    },

    /// The materialized graph contains a non-temporal dependency cycle.
    #[error("dependency cycle involving task '{task}' {coordinate}")]
    Cyclic { task: String, coordinate: Coordinate },

    /// A malformed duration literal reached the core.
    #[error("invalid duration '{value}': {reason}")]
    BadDuration { value: String, reason: String },

    /// A malformed date literal reached the core.
    #[error("invalid date '{value}': {reason}")]
    BadDate { value: String, reason: String },

    /// A store lookup found no item under the given name and coordinate.
    #[error("no item '{name}' at {coordinate}")]
    Missing { name: String, coordinate: Coordinate },
}

impl GraphError {
    /// Builds a `DimensionMismatch` from dimension name lists.
    pub(crate) fn dimension_mismatch(name: &str, expected: &[String], got: &[String]) -> Self {
        GraphError::DimensionMismatch {
            name: name.to_string(),
            expected: expected.join(", "),
            got: got.join(", "),
        }
    }
}
