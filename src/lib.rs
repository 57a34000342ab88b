//! cycleflow - Workflow Graph Compiler Core
//!
//! Compiles a declarative, cyclic, parameterized workflow description into
//! a finite dependency graph of concrete task invocations and data
//! artifacts, ready to hand to an execution backend. A configuration of a
//! few dozen lines can unroll into thousands of nodes; this crate's job is
//! to keep that unrolled graph consistent.
//!
//! # Architecture
//!
//! The library is organized into three main modules:
//!
//! - [`temporal`]: Calendar durations, cycle-date enumeration, `when` guards
//! - [`graph`]: Coordinates, graph items, edges, and the coordinate-indexed store
//! - [`workflow`]: The validated IR, template expansion, dependency
//!   resolution, and the frozen [`Workflow`] graph
//!
//! Parsing workflow files and dispatching the graph to a compute cluster
//! are front-end and backend concerns; this crate consumes an in-memory
//! [`WorkflowSpec`] and produces an immutable [`Workflow`].
//!
//! # Example
//!
//! ```rust
//! use cycleflow::{
//!     CalendarDuration, CycleSpec, CyclingSpec, DataTemplate, OutputRef,
//!     TaskRef, TaskTemplate, Workflow, WorkflowSpec,
//! };
//! use cycleflow::temporal::parse_date;
//!
//! fn main() -> Result<(), cycleflow::GraphError> {
//!     let spec = WorkflowSpec::new("demo")
//!         .with_task(TaskTemplate::new("model", "shell"))
//!         .with_generated_data(DataTemplate::new("model_output"))
//!         .with_cycle(
//!             CycleSpec::new("main")
//!                 .with_cycling(CyclingSpec::new(
//!                     parse_date("2026-01-01")?,
//!                     parse_date("2027-01-01")?,
//!                     CalendarDuration::parse("P2M")?,
//!                 ))
//!                 .with_task(
//!                     TaskRef::new("model").with_output(OutputRef::new("model_output")),
//!                 ),
//!         );
//!
//!     let workflow = Workflow::from_spec(&spec)?;
//!     assert_eq!(workflow.tasks().count(), 6);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod graph;
pub mod temporal;
pub mod workflow;

// Re-export commonly used types
pub use error::GraphError;
pub use graph::{
    Array, Availability, Coordinate, Data, DimValue, Edge, EdgeRole, GraphItem, ItemRef, Store,
    Task, DATE_DIM,
};
pub use temporal::{CalendarDuration, CyclingSpec, WhenSpec};
pub use workflow::{
    CycleSpec, DataSection, DataTemplate, DependencyRef, OutputRef, ParamMode, TargetCycle,
    TaskRef, TaskTemplate, Workflow, WorkflowSpec,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_module_exports_spec_builder() {
        let spec = WorkflowSpec::new("smoke");
        assert_eq!(spec.name, "smoke");
    }

    #[test]
    fn test_module_exports_coordinate() {
        assert!(Coordinate::empty().is_empty());
    }
}
