//! Concrete graph nodes and edges.
//!
//! Tasks and data items are the two node kinds of the unrolled graph,
//! rendered as a closed variant rather than trait objects: the store and
//! the resolver handle both through the shared name/coordinate prefix and
//! match on the variant where behavior differs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::coordinate::Coordinate;

/// Whether a data item pre-exists or is produced by a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Generated,
}

/// The role of an edge relative to its owning task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeRole {
    Input,
    Output,
    WaitOn,
}

/// A by-name-and-coordinate reference to a graph item.
///
/// Edges hold these instead of owning nodes, so the store stays the single
/// source of truth and the graph serializes without cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub name: String,
    pub coordinate: Coordinate,
}

impl ItemRef {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            coordinate,
        }
    }
}

/// A directed, typed edge between two concrete graph items.
///
/// Input and wait-on edges are owned by their sink task; output edges by
/// their source task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: ItemRef,
    pub sink: ItemRef,
    /// Port name on the task side. The literal string `"None"` is a valid
    /// port name meaning "unnamed"; the core does not interpret it.
    pub port: Option<String>,
    pub role: EdgeRole,
}

/// A concrete task invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub coordinate: Coordinate,
    /// Backend plugin identifier from the task template.
    pub plugin: String,
    /// Plugin-specific fields, stored as-is for the execution backend.
    pub payload: Map<String, Value>,
    pub inputs: Vec<Edge>,
    pub outputs: Vec<Edge>,
    pub wait_on: Vec<Edge>,
}

impl Task {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.name.clone(), self.coordinate.clone())
    }
}

/// A concrete data artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub name: String,
    pub coordinate: Coordinate,
    pub availability: Availability,
    /// Backend-specific fields, stored as-is.
    pub payload: Map<String, Value>,
}

impl Data {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.name.clone(), self.coordinate.clone())
    }
}

/// A node of the unrolled graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphItem {
    Task(Task),
    Data(Data),
}

impl GraphItem {
    pub fn name(&self) -> &str {
        match self {
            GraphItem::Task(task) => &task.name,
            GraphItem::Data(data) => &data.name,
        }
    }

    pub fn coordinate(&self) -> &Coordinate {
        match self {
            GraphItem::Task(task) => &task.coordinate,
            GraphItem::Data(data) => &data.coordinate,
        }
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.name().to_string(), self.coordinate().clone())
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            GraphItem::Task(task) => Some(task),
            GraphItem::Data(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&Data> {
        match self {
            GraphItem::Data(data) => Some(data),
            GraphItem::Task(_) => None,
        }
    }

    pub fn is_task(&self) -> bool {
        matches!(self, GraphItem::Task(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, GraphItem::Data(_))
    }
}
