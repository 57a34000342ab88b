//! Dependency resolution: turning declared references into concrete edges.
//!
//! Runs after expansion, when every node already exists. For each task
//! instance the declared input and wait-on references are resolved to sets
//! of target coordinates (lags, absolute date pins, parameter pins), looked
//! up through the store and wired as edges. Output declarations are wired
//! directly by projecting the task coordinate onto the output's dimensions.
//!
//! Reference absences fall in two classes. A failed `when` guard or a
//! candidate date outside every cycling window is silent; a ported input
//! left with zero matches for any other reason is `UnresolvedInput`.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;
use log::{debug, warn};

use crate::error::GraphError;
use crate::graph::coordinate::{Coordinate, DimValue, DATE_DIM};
use crate::graph::item::{Edge, EdgeRole, GraphItem, ItemRef};
use crate::graph::store::Store;
use crate::temporal::date::date_in_range;
use crate::workflow::expander::{cycle_dates, parameter_coordinates};
use crate::workflow::ir::{DependencyRef, ParamMode, TargetCycle, WorkflowSpec};

/// Wires all edges and enforces arity, single-writer and acyclicity.
pub fn resolve(spec: &WorkflowSpec, store: &mut Store) -> Result<(), GraphError> {
    let windows = Windows::from_spec(spec);
    let mut planned: Vec<PlannedEdges> = Vec::new();
    let mut writers: HashMap<ItemRef, ItemRef> = HashMap::new();

    // Same enumeration as the expander, so edge order follows task
    // insertion order and declaration order.
    for cycle in &spec.cycles {
        for date in cycle_dates(cycle.cycling.as_ref()) {
            for task_ref in &cycle.tasks {
                let template = spec.task_template(&task_ref.name).ok_or_else(|| {
                    GraphError::UnknownName {
                        name: task_ref.name.clone(),
                    }
                })?;

                for coordinate in parameter_coordinates(date, &template.parameters, spec)? {
                    let task = ItemRef::new(task_ref.name.clone(), coordinate);
                    let mut plan = PlannedEdges::new(task.clone());

                    for input in &task_ref.inputs {
                        plan.inputs.extend(resolve_dependency(
                            store,
                            &task,
                            input,
                            EdgeRole::Input,
                            &windows,
                        )?);
                    }

                    for output in &task_ref.outputs {
                        let data_template =
                            spec.generated_template(&output.name).ok_or_else(|| {
                                GraphError::UnknownName {
                                    name: output.name.clone(),
                                }
                            })?;
                        let mut dims = data_template.parameters.clone();
                        if date.is_some() {
                            dims.push(DATE_DIM.to_string());
                        }
                        let data_coordinate = task.coordinate.project(&dims);
                        let data_ref = store.lookup(&output.name, &data_coordinate)?.item_ref();

                        if let Some(previous) = writers.insert(data_ref.clone(), task.clone()) {
                            return Err(GraphError::MultipleWriters {
                                data: data_ref.name,
                                coordinate: data_ref.coordinate,
                                first: previous.name,
                                second: task.name,
                            });
                        }
                        plan.outputs.push(Edge {
                            source: task.clone(),
                            sink: data_ref,
                            port: output.port.clone(),
                            role: EdgeRole::Output,
                        });
                    }

                    for wait_on in &task_ref.wait_on {
                        plan.wait_on.extend(resolve_dependency(
                            store,
                            &task,
                            wait_on,
                            EdgeRole::WaitOn,
                            &windows,
                        )?);
                    }

                    debug!(
                        "task '{}' {}: {} input, {} output, {} wait-on edge(s)",
                        task.name,
                        task.coordinate,
                        plan.inputs.len(),
                        plan.outputs.len(),
                        plan.wait_on.len()
                    );
                    planned.push(plan);
                }
            }
        }
    }

    for plan in planned {
        let item = store.lookup_mut(&plan.task.name, &plan.task.coordinate)?;
        if let GraphItem::Task(task) = item {
            task.inputs = plan.inputs;
            task.outputs = plan.outputs;
            task.wait_on = plan.wait_on;
        }
    }

    detect_cycles(store, &writers)
}

struct PlannedEdges {
    task: ItemRef,
    inputs: Vec<Edge>,
    outputs: Vec<Edge>,
    wait_on: Vec<Edge>,
}

impl PlannedEdges {
    fn new(task: ItemRef) -> Self {
        Self {
            task,
            inputs: Vec::new(),
            outputs: Vec::new(),
            wait_on: Vec::new(),
        }
    }
}

/// The union of all dated cycling windows (plus the overall workflow window
/// when given). A candidate date missing from the store is excused only if
/// it falls outside every one of these.
struct Windows {
    spans: Vec<(NaiveDateTime, NaiveDateTime)>,
}

impl Windows {
    fn from_spec(spec: &WorkflowSpec) -> Self {
        let mut spans: Vec<(NaiveDateTime, NaiveDateTime)> = spec
            .cycles
            .iter()
            .filter_map(|cycle| cycle.cycling.as_ref())
            .map(|cycling| (cycling.start_date, cycling.stop_date))
            .collect();
        if let (Some(start), Some(stop)) = (spec.start_date, spec.stop_date) {
            spans.push((start, stop));
        }
        Self { spans }
    }

    fn contains(&self, date: NaiveDateTime) -> bool {
        self.spans
            .iter()
            .any(|(start, stop)| date_in_range(date, *start, *stop))
    }
}

/// Resolves one input or wait-on reference for one task instance.
fn resolve_dependency(
    store: &Store,
    task: &ItemRef,
    dep: &DependencyRef,
    role: EdgeRole,
    windows: &Windows,
) -> Result<Vec<Edge>, GraphError> {
    let task_date = task.coordinate.date();

    if !dep.when.is_active(task_date) {
        debug!(
            "task '{}' {}: reference '{}' suppressed by when guard",
            task.name, task.coordinate, dep.name
        );
        return Ok(Vec::new());
    }

    let candidate_dates: Vec<Option<NaiveDateTime>> = match &dep.target_cycle {
        TargetCycle::Current => vec![task_date],
        TargetCycle::Date(date) => vec![Some(*date)],
        // A lag needs a cycle date to offset from; an undated consumer
        // yields no candidates, which is never an excuse.
        TargetCycle::Lag(lags) => match task_date {
            Some(date) => lags.iter().map(|lag| Some(lag.add_to(date))).collect(),
            None => Vec::new(),
        },
    };

    let mut edges = Vec::new();
    let mut unexcused_miss = candidate_dates.is_empty();

    for candidate in candidate_dates {
        let mut pairs: Vec<(String, DimValue)> = Vec::new();
        if let Some(date) = candidate {
            pairs.push((DATE_DIM.to_string(), DimValue::Date(date)));
        }
        for (dim, mode) in &dep.parameters {
            if *mode == ParamMode::Single {
                match task.coordinate.get(dim) {
                    Some(value) => pairs.push((dim.clone(), value.clone())),
                    None => warn!(
                        "task '{}' {}: 'single' on dimension '{}' the task does not carry",
                        task.name, task.coordinate, dim
                    ),
                }
            }
        }
        let partial = Coordinate::from_pairs(pairs)?;

        let matched: Vec<&GraphItem> = store
            .lookup_partial(&dep.name, &partial)
            .into_iter()
            .filter(|item| match role {
                EdgeRole::Input => item.is_data(),
                EdgeRole::WaitOn => item.is_task(),
                EdgeRole::Output => false,
            })
            .collect();

        if matched.is_empty() {
            match candidate {
                Some(date) if !windows.contains(date) => {
                    debug!(
                        "task '{}' {}: reference '{}' dropped, {} outside every cycling window",
                        task.name,
                        task.coordinate,
                        dep.name,
                        date.format("%Y-%m-%dT%H:%M")
                    );
                }
                _ => unexcused_miss = true,
            }
        } else {
            for item in matched {
                edges.push(Edge {
                    source: item.item_ref(),
                    sink: task.clone(),
                    port: dep.port.clone(),
                    role,
                });
            }
        }
    }

    if edges.is_empty() && role == EdgeRole::Input && unexcused_miss {
        if let Some(port) = &dep.port {
            return Err(GraphError::UnresolvedInput {
                task: task.name.clone(),
                coordinate: task.coordinate.clone(),
                input: dep.name.clone(),
                port: port.clone(),
            });
        }
    }
    Ok(edges)
}

/// Topological traversal of the task graph projected through data items
/// (producer task → data → consumer task) and direct wait-on edges. Lagged
/// references point at other concrete nodes once dates are materialized, so
/// any remaining back-edge is a genuine cycle.
fn detect_cycles(store: &Store, writers: &HashMap<ItemRef, ItemRef>) -> Result<(), GraphError> {
    let task_refs: Vec<ItemRef> = store
        .iter_items()
        .filter(|item| item.is_task())
        .map(GraphItem::item_ref)
        .collect();

    let mut successors: HashMap<ItemRef, Vec<ItemRef>> = HashMap::new();
    let mut in_degree: HashMap<ItemRef, usize> =
        task_refs.iter().map(|r| (r.clone(), 0)).collect();

    for item in store.iter_items() {
        let Some(task) = item.as_task() else { continue };
        let consumer = task.item_ref();

        let producers = task
            .inputs
            .iter()
            .filter_map(|edge| writers.get(&edge.source).cloned())
            .chain(task.wait_on.iter().map(|edge| edge.source.clone()));

        for producer in producers {
            successors
                .entry(producer)
                .or_default()
                .push(consumer.clone());
            *in_degree
                .get_mut(&consumer)
                .expect("every task was seeded above") += 1;
        }
    }

    let mut queue: VecDeque<ItemRef> = task_refs
        .iter()
        .filter(|r| in_degree[*r] == 0)
        .cloned()
        .collect();
    let mut processed = 0usize;

    while let Some(current) = queue.pop_front() {
        processed += 1;
        if let Some(next) = successors.get(&current) {
            for consumer in next {
                let degree = in_degree
                    .get_mut(consumer)
                    .expect("successors only point at seeded tasks");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(consumer.clone());
                }
            }
        }
    }

    if processed != task_refs.len() {
        let stuck = task_refs
            .iter()
            .find(|r| in_degree[*r] > 0)
            .expect("some task must retain in-degree when the sort stalls");
        return Err(GraphError::Cyclic {
            task: stuck.name.clone(),
            coordinate: stuck.coordinate.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::cycling::CyclingSpec;
    use crate::temporal::date::parse_date;
    use crate::temporal::duration::CalendarDuration;
    use crate::temporal::when::WhenSpec;
    use crate::workflow::expander::expand;
    use crate::workflow::ir::{CycleSpec, DataTemplate, OutputRef, TaskRef, TaskTemplate};

    fn d(s: &str) -> NaiveDateTime {
        parse_date(s).unwrap()
    }

    fn lag(s: &str) -> CalendarDuration {
        CalendarDuration::parse(s).unwrap()
    }

    fn build(spec: &WorkflowSpec) -> Result<Store, GraphError> {
        let mut store = Store::new();
        expand(spec, &mut store)?;
        resolve(spec, &mut store)?;
        Ok(store)
    }

    fn task_at<'a>(store: &'a Store, name: &str, coordinate: &Coordinate) -> &'a crate::graph::item::Task {
        store
            .lookup(name, coordinate)
            .unwrap()
            .as_task()
            .unwrap()
    }

    fn dated(date: &str) -> Coordinate {
        Coordinate::from_pairs([(DATE_DIM, DimValue::Date(d(date)))]).unwrap()
    }

    fn self_cycling_spec() -> WorkflowSpec {
        // One task per bimonthly cycle, reading its own restart from the
        // previous cycle.
        WorkflowSpec::new("restart_chain")
            .with_task(TaskTemplate::new("icon", "shell"))
            .with_generated_data(DataTemplate::new("icon_restart"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_cycling(CyclingSpec::new(d("2026-01-01"), d("2026-06-01"), lag("P2M")))
                    .with_task(
                        TaskRef::new("icon")
                            .with_input(
                                DependencyRef::new("icon_restart")
                                    .with_port("restart")
                                    .with_lag(lag("-P2M"))
                                    .with_when(WhenSpec::after(d("2026-01-01"))),
                            )
                            .with_output(OutputRef::new("icon_restart")),
                    ),
            )
    }

    #[test]
    fn test_lagged_self_reference_wires_previous_cycle() {
        let store = build(&self_cycling_spec()).unwrap();

        let first = task_at(&store, "icon", &dated("2026-01-01"));
        assert!(first.inputs.is_empty());

        let second = task_at(&store, "icon", &dated("2026-03-01"));
        assert_eq!(second.inputs.len(), 1);
        assert_eq!(second.inputs[0].source.name, "icon_restart");
        assert_eq!(second.inputs[0].source.coordinate, dated("2026-01-01"));
        assert_eq!(second.inputs[0].port.as_deref(), Some("restart"));
    }

    #[test]
    fn test_unguarded_out_of_window_lag_is_silent() {
        let mut spec = self_cycling_spec();
        // Drop the guard: the first cycle's candidate lands before the
        // window and is excused.
        spec.cycles[0].tasks[0].inputs[0].when = WhenSpec::any();
        let store = build(&spec).unwrap();

        let first = task_at(&store, "icon", &dated("2026-01-01"));
        assert!(first.inputs.is_empty());
    }

    #[test]
    fn test_in_window_miss_is_unresolved_input() {
        let spec = WorkflowSpec::new("broken")
            .with_task(TaskTemplate::new("icon", "shell"))
            .with_generated_data(DataTemplate::new("never_produced"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_cycling(CyclingSpec::new(d("2026-01-01"), d("2026-06-01"), lag("P2M")))
                    .with_task(
                        TaskRef::new("icon")
                            .with_input(DependencyRef::new("never_produced").with_port("in")),
                    ),
            );
        let err = build(&spec).unwrap_err();
        assert!(matches!(err, GraphError::UnresolvedInput { .. }));
    }

    #[test]
    fn test_portless_wait_on_miss_is_silent() {
        let spec = WorkflowSpec::new("loose")
            .with_task(TaskTemplate::new("icon", "shell"))
            .with_task(TaskTemplate::new("cleanup", "shell"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_cycling(CyclingSpec::new(d("2026-01-01"), d("2026-06-01"), lag("P2M")))
                    .with_task(TaskRef::new("icon")),
            )
            .with_cycle(
                CycleSpec::new("finish").with_task(
                    TaskRef::new("cleanup")
                        // Pin to a date no cycle produces; wait-on has no
                        // port, so the absence is tolerated.
                        .with_wait_on(DependencyRef::new("icon").at_date(d("2026-02-01"))),
                ),
            );
        let store = build(&spec).unwrap();
        let cleanup = task_at(&store, "cleanup", &Coordinate::empty());
        assert!(cleanup.wait_on.is_empty());
    }

    #[test]
    fn test_absolute_date_pin() {
        let spec = WorkflowSpec::new("pinned")
            .with_task(TaskTemplate::new("icon", "shell"))
            .with_task(TaskTemplate::new("cleanup", "shell"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_cycling(CyclingSpec::new(d("2026-01-01"), d("2026-06-01"), lag("P2M")))
                    .with_task(TaskRef::new("icon")),
            )
            .with_cycle(
                CycleSpec::new("finish").with_task(
                    TaskRef::new("cleanup")
                        .with_wait_on(DependencyRef::new("icon").at_date(d("2026-05-01"))),
                ),
            );
        let store = build(&spec).unwrap();

        let cleanup = task_at(&store, "cleanup", &Coordinate::empty());
        assert_eq!(cleanup.wait_on.len(), 1);
        assert_eq!(cleanup.wait_on[0].source.name, "icon");
        assert_eq!(cleanup.wait_on[0].source.coordinate, dated("2026-05-01"));
        assert_eq!(cleanup.wait_on[0].role, EdgeRole::WaitOn);
    }

    #[test]
    fn test_undated_consumer_fans_over_all_dates() {
        let spec = WorkflowSpec::new("fan")
            .with_task(TaskTemplate::new("icon", "shell"))
            .with_task(TaskTemplate::new("cleanup", "shell"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_cycling(CyclingSpec::new(d("2026-01-01"), d("2026-06-01"), lag("P2M")))
                    .with_task(TaskRef::new("icon")),
            )
            .with_cycle(
                CycleSpec::new("finish")
                    .with_task(TaskRef::new("cleanup").with_wait_on(DependencyRef::new("icon"))),
            );
        let store = build(&spec).unwrap();

        let cleanup = task_at(&store, "cleanup", &Coordinate::empty());
        assert_eq!(cleanup.wait_on.len(), 3);
    }

    #[test]
    fn test_multiple_writers_detected_on_parameter_collapse() {
        // Two foo-instances of the same task both project onto the same
        // dimensionless output coordinate.
        let spec = WorkflowSpec::new("collapse")
            .with_parameter("foo", [0i64, 1])
            .with_task(TaskTemplate::new("icon", "shell").with_parameters(["foo"]))
            .with_generated_data(DataTemplate::new("summary"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_task(TaskRef::new("icon").with_output(OutputRef::new("summary"))),
            );
        let err = build(&spec).unwrap_err();
        assert!(matches!(err, GraphError::MultipleWriters { .. }));
    }

    #[test]
    fn test_zero_lag_self_reference_is_cyclic() {
        let spec = WorkflowSpec::new("loop")
            .with_task(TaskTemplate::new("icon", "shell"))
            .with_generated_data(DataTemplate::new("icon_output"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_cycling(CyclingSpec::new(d("2026-01-01"), d("2026-06-01"), lag("P2M")))
                    .with_task(
                        TaskRef::new("icon")
                            .with_input(
                                DependencyRef::new("icon_output")
                                    .with_port("in")
                                    .with_lag(lag("P0M")),
                            )
                            .with_output(OutputRef::new("icon_output")),
                    ),
            );
        let err = build(&spec).unwrap_err();
        assert!(matches!(err, GraphError::Cyclic { .. }));
    }

    #[test]
    fn test_two_task_cycle_detected() {
        let spec = WorkflowSpec::new("ab_loop")
            .with_task(TaskTemplate::new("a", "shell"))
            .with_task(TaskTemplate::new("b", "shell"))
            .with_generated_data(DataTemplate::new("a_out"))
            .with_generated_data(DataTemplate::new("b_out"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_task(
                        TaskRef::new("a")
                            .with_input(DependencyRef::new("b_out").with_port("in"))
                            .with_output(OutputRef::new("a_out")),
                    )
                    .with_task(
                        TaskRef::new("b")
                            .with_input(DependencyRef::new("a_out").with_port("in"))
                            .with_output(OutputRef::new("b_out")),
                    ),
            );
        let err = build(&spec).unwrap_err();
        assert!(matches!(err, GraphError::Cyclic { .. }));
    }

    #[test]
    fn test_producer_chain_is_acyclic() {
        let spec = WorkflowSpec::new("chain")
            .with_task(TaskTemplate::new("a", "shell"))
            .with_task(TaskTemplate::new("b", "shell"))
            .with_generated_data(DataTemplate::new("a_out"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_task(TaskRef::new("a").with_output(OutputRef::new("a_out")))
                    .with_task(
                        TaskRef::new("b").with_input(DependencyRef::new("a_out").with_port("in")),
                    ),
            );
        let store = build(&spec).unwrap();
        let b = task_at(&store, "b", &Coordinate::empty());
        assert_eq!(b.inputs.len(), 1);
        assert_eq!(b.inputs[0].source.name, "a_out");
    }

    #[test]
    fn test_literal_none_port_resolves() {
        let spec = WorkflowSpec::new("none_port")
            .with_task(TaskTemplate::new("a", "shell"))
            .with_task(TaskTemplate::new("b", "shell"))
            .with_generated_data(DataTemplate::new("a_out"))
            .with_cycle(
                CycleSpec::new("main")
                    .with_task(TaskRef::new("a").with_output(OutputRef::new("a_out")))
                    .with_task(
                        TaskRef::new("b")
                            .with_input(DependencyRef::new("a_out").with_port("None")),
                    ),
            );
        let store = build(&spec).unwrap();
        let b = task_at(&store, "b", &Coordinate::empty());
        assert_eq!(b.inputs[0].port.as_deref(), Some("None"));
    }
}
