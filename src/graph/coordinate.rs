//! Multidimensional coordinates.
//!
//! A coordinate maps dimension names to single values. The reserved
//! dimension `date` carries a date; every other dimension carries an opaque
//! parameter value. Two coordinates are equal iff they cover the same
//! dimension names with equal values; dimension order is irrelevant. An
//! empty coordinate identifies a one-off item.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// The reserved dimension name carrying the cycle date.
pub const DATE_DIM: &str = "date";

/// A single value along one coordinate dimension.
///
/// Equality is structural; floats compare and hash by bit pattern so values
/// can key hash maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimValue {
    Int(i64),
    Float(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl PartialEq for DimValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DimValue::Int(a), DimValue::Int(b)) => a == b,
            (DimValue::Float(a), DimValue::Float(b)) => a.to_bits() == b.to_bits(),
            (DimValue::Date(a), DimValue::Date(b)) => a == b,
            (DimValue::Text(a), DimValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DimValue {}

impl Hash for DimValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            DimValue::Int(v) => v.hash(state),
            DimValue::Float(v) => v.to_bits().hash(state),
            DimValue::Date(v) => v.hash(state),
            DimValue::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for DimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimValue::Int(v) => write!(f, "{v}"),
            DimValue::Float(v) => write!(f, "{v}"),
            DimValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M")),
            DimValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for DimValue {
    fn from(v: i64) -> Self {
        DimValue::Int(v)
    }
}

impl From<f64> for DimValue {
    fn from(v: f64) -> Self {
        DimValue::Float(v)
    }
}

impl From<&str> for DimValue {
    fn from(v: &str) -> Self {
        DimValue::Text(v.to_string())
    }
}

impl From<String> for DimValue {
    fn from(v: String) -> Self {
        DimValue::Text(v)
    }
}

impl From<NaiveDateTime> for DimValue {
    fn from(v: NaiveDateTime) -> Self {
        DimValue::Date(v)
    }
}

/// A mapping from dimension name to value, normalized by dimension name so
/// that equality and hashing ignore construction order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    dims: Vec<(String, DimValue)>,
}

impl Coordinate {
    /// The zero-dimensional coordinate of a one-off item.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a coordinate from name/value pairs. Duplicate dimension names
    /// are rejected.
    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<DimValue>,
    {
        let mut dims: Vec<(String, DimValue)> = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        dims.sort_by(|a, b| a.0.cmp(&b.0));
        for pair in dims.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(GraphError::DuplicateDimension {
                    dimension: pair[0].0.clone(),
                });
            }
        }
        Ok(Self { dims })
    }

    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Value of a dimension, if present.
    pub fn get(&self, dim: &str) -> Option<&DimValue> {
        self.dims
            .binary_search_by(|(name, _)| name.as_str().cmp(dim))
            .ok()
            .map(|idx| &self.dims[idx].1)
    }

    pub fn contains_dim(&self, dim: &str) -> bool {
        self.get(dim).is_some()
    }

    /// The `date` dimension, if this coordinate is dated.
    pub fn date(&self) -> Option<NaiveDateTime> {
        match self.get(DATE_DIM) {
            Some(DimValue::Date(date)) => Some(*date),
            _ => None,
        }
    }

    /// Dimension names in normalized (sorted) order.
    pub fn dim_names(&self) -> Vec<String> {
        self.dims.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DimValue)> {
        self.dims.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Union of two coordinates with disjoint dimension sets.
    pub fn merge(&self, other: &Coordinate) -> Result<Coordinate, GraphError> {
        Coordinate::from_pairs(
            self.dims
                .iter()
                .chain(other.dims.iter())
                .map(|(name, value)| (name.clone(), value.clone())),
        )
    }

    /// Restriction to the given dimensions; dimensions this coordinate does
    /// not carry are skipped.
    pub fn project(&self, dims: &[String]) -> Coordinate {
        Coordinate {
            dims: self
                .dims
                .iter()
                .filter(|(name, _)| dims.contains(name))
                .cloned()
                .collect(),
        }
    }

    /// Agreement test against a partial coordinate: every dimension shared
    /// by both must carry equal values. Dimensions present on only one side
    /// are ignored.
    pub fn agrees_with(&self, partial: &Coordinate) -> bool {
        partial
            .iter()
            .all(|(dim, value)| self.get(dim).is_none_or(|mine| mine == value))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, (name, value)) in self.dims.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "]")
    }
}
