//! The unrolled workflow graph.

use chrono::NaiveDateTime;
use log::info;

use crate::error::GraphError;
use crate::graph::coordinate::Coordinate;
use crate::graph::item::{Data, Edge, GraphItem, Task};
use crate::graph::store::Store;
use crate::workflow::expander::expand;
use crate::workflow::ir::WorkflowSpec;
use crate::workflow::resolver::resolve;
use crate::workflow::validator::validate_spec;

/// A fully unrolled workflow: every concrete task and data node with all
/// edges wired, ready to hand to an execution backend.
///
/// Construction is the only mutation point; afterwards the graph is frozen
/// and safe to read concurrently. Building is a pure function of the IR:
/// equal specs produce equal iteration orders and equal edge sets.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    start_date: Option<NaiveDateTime>,
    stop_date: Option<NaiveDateTime>,
    store: Store,
}

impl Workflow {
    /// Validates, expands and resolves the given IR into a concrete graph.
    pub fn from_spec(spec: &WorkflowSpec) -> Result<Self, GraphError> {
        validate_spec(spec)?;

        let mut store = Store::new();
        expand(spec, &mut store)?;
        resolve(spec, &mut store)?;

        let workflow = Self {
            name: spec.name.clone(),
            start_date: spec.start_date,
            stop_date: spec.stop_date,
            store,
        };
        info!(
            "workflow '{}' built: {} task(s), {} data item(s), {} edge(s)",
            workflow.name,
            workflow.tasks().count(),
            workflow.data().count(),
            workflow.edges().count()
        );
        Ok(workflow)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> Option<NaiveDateTime> {
        self.start_date
    }

    pub fn stop_date(&self) -> Option<NaiveDateTime> {
        self.stop_date
    }

    /// The underlying store, for read access to arrays and axes.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Concrete tasks, in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.store.iter_items().filter_map(GraphItem::as_task)
    }

    /// Concrete data items, in insertion order.
    pub fn data(&self) -> impl Iterator<Item = &Data> {
        self.store.iter_items().filter_map(GraphItem::as_data)
    }

    /// All edges: tasks in insertion order; per task its input edges in
    /// declaration order, then wait-on edges, then output edges.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.tasks().flat_map(|task| {
            task.inputs
                .iter()
                .chain(task.wait_on.iter())
                .chain(task.outputs.iter())
        })
    }

    /// Exact item lookup by name and full coordinate.
    pub fn lookup(&self, name: &str, coordinate: &Coordinate) -> Result<&GraphItem, GraphError> {
        self.store.lookup(name, coordinate)
    }
}
