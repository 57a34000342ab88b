//! The validated intermediate representation consumed by the graph builder.
//!
//! Parsing and schema validation happen in a front-end; these types are the
//! in-memory contract between that front-end and the core. Builder-style
//! constructors cover programmatic construction (and keep test fixtures
//! readable); serde derives cover front-ends that deserialize straight into
//! the IR.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::coordinate::DimValue;
use crate::temporal::cycling::CyclingSpec;
use crate::temporal::duration::CalendarDuration;
use crate::temporal::when::WhenSpec;

/// The reserved template name whose scalar fields become defaults for every
/// other task template. Never instantiated.
pub const ROOT_TASK: &str = "ROOT";

/// Selects which cycle instance(s) of the target a reference points at.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCycle {
    /// The consumer's own cycle date (or no date at all).
    #[default]
    Current,
    /// One candidate per lag, each added to the consumer's cycle date.
    Lag(Vec<CalendarDuration>),
    /// An absolute date pin.
    Date(NaiveDateTime),
}

/// Per-dimension reference modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamMode {
    /// Fan out over every value of the dimension (the default).
    All,
    /// Pin to the consumer's own value.
    Single,
}

/// A reference from a task to another graph item: a data input or a task to
/// wait on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRef {
    pub name: String,
    /// Port the matched items bind to. Inputs carry one; wait-on references
    /// don't. `"None"` is a literal port name, not an absence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default)]
    pub when: WhenSpec,
    #[serde(default)]
    pub target_cycle: TargetCycle,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters: HashMap<String, ParamMode>,
}

impl DependencyRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: None,
            when: WhenSpec::any(),
            target_cycle: TargetCycle::Current,
            parameters: HashMap::new(),
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn with_when(mut self, when: WhenSpec) -> Self {
        self.when = when;
        self
    }

    /// Adds one lag to the target-cycle lag list.
    pub fn with_lag(mut self, lag: CalendarDuration) -> Self {
        match &mut self.target_cycle {
            TargetCycle::Lag(lags) => lags.push(lag),
            _ => self.target_cycle = TargetCycle::Lag(vec![lag]),
        }
        self
    }

    pub fn with_lags(self, lags: impl IntoIterator<Item = CalendarDuration>) -> Self {
        lags.into_iter().fold(self, Self::with_lag)
    }

    /// Pins the reference to an absolute cycle date.
    pub fn at_date(mut self, date: NaiveDateTime) -> Self {
        self.target_cycle = TargetCycle::Date(date);
        self
    }

    /// Pins a parameter dimension to the consumer's own value.
    pub fn with_single(mut self, dim: impl Into<String>) -> Self {
        self.parameters.insert(dim.into(), ParamMode::Single);
        self
    }
}

/// An output declaration on a cycle task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl OutputRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: None,
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }
}

/// A task's appearance in a cycle: which template to instantiate and how
/// its edges are declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<DependencyRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wait_on: Vec<DependencyRef>,
}

impl TaskRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            wait_on: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: DependencyRef) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: OutputRef) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_wait_on(mut self, wait_on: DependencyRef) -> Self {
        self.wait_on.push(wait_on);
        self
    }
}

/// A cycle: a block of tasks repeated per cycle date, or executed once when
/// no cycling block is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycling: Option<CyclingSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskRef>,
}

impl CycleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cycling: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_cycling(mut self, cycling: CyclingSpec) -> Self {
        self.cycling = Some(cycling);
        self
    }

    pub fn with_task(mut self, task: TaskRef) -> Self {
        self.tasks.push(task);
        self
    }
}

/// A task template: plugin, parameter dimensions and opaque backend fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub name: String,
    pub plugin: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl TaskTemplate {
    pub fn new(name: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin: plugin.into(),
            parameters: Vec::new(),
            payload: Map::new(),
        }
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Sets one opaque backend field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Shallow merge with the `ROOT` template: top-level payload fields the
    /// template does not set itself are taken from `ROOT`. Plugin and
    /// parameters are never inherited.
    pub fn merged_with_root(&self, root: Option<&TaskTemplate>) -> TaskTemplate {
        let mut merged = self.clone();
        if let Some(root) = root {
            for (key, value) in &root.payload {
                if !merged.payload.contains_key(key) {
                    merged.payload.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }
}

/// A data template, either pre-available or generated by tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTemplate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl DataTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            payload: Map::new(),
        }
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

/// Available and generated data declarations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<DataTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated: Vec<DataTemplate>,
}

/// The root of the validated IR: everything the core needs to unroll one
/// workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    /// Overall workflow window; cycles carry their own cycling windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycles: Vec<CycleSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskTemplate>,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters: HashMap<String, Vec<DimValue>>,
}

impl WorkflowSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_date: None,
            stop_date: None,
            cycles: Vec::new(),
            tasks: Vec::new(),
            data: DataSection::default(),
            parameters: HashMap::new(),
        }
    }

    pub fn with_window(mut self, start_date: NaiveDateTime, stop_date: NaiveDateTime) -> Self {
        self.start_date = Some(start_date);
        self.stop_date = Some(stop_date);
        self
    }

    pub fn with_cycle(mut self, cycle: CycleSpec) -> Self {
        self.cycles.push(cycle);
        self
    }

    pub fn with_task(mut self, task: TaskTemplate) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn with_available_data(mut self, data: DataTemplate) -> Self {
        self.data.available.push(data);
        self
    }

    pub fn with_generated_data(mut self, data: DataTemplate) -> Self {
        self.data.generated.push(data);
        self
    }

    pub fn with_parameter<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DimValue>,
    {
        self.parameters
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Task template by name, `ROOT` included.
    pub fn task_template(&self, name: &str) -> Option<&TaskTemplate> {
        self.tasks.iter().find(|template| template.name == name)
    }

    /// The `ROOT` defaults template, if declared.
    pub fn root_template(&self) -> Option<&TaskTemplate> {
        self.task_template(ROOT_TASK)
    }

    /// Data template by name, available or generated.
    pub fn data_template(&self, name: &str) -> Option<&DataTemplate> {
        self.data
            .available
            .iter()
            .chain(self.data.generated.iter())
            .find(|template| template.name == name)
    }

    pub fn generated_template(&self, name: &str) -> Option<&DataTemplate> {
        self.data
            .generated
            .iter()
            .find(|template| template.name == name)
    }
}
