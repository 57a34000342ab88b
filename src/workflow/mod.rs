//! Workflow construction: IR, validation, expansion and resolution.

pub mod expander;
pub mod ir;
pub mod model;
pub mod resolver;
pub mod validator;

pub use ir::{
    CycleSpec, DataSection, DataTemplate, DependencyRef, OutputRef, ParamMode, TargetCycle,
    TaskRef, TaskTemplate, WorkflowSpec, ROOT_TASK,
};
pub use model::Workflow;
pub use validator::validate_spec;
