//! Template expansion: templates × cycle dates × parameter products.
//!
//! Populates the store with every concrete task and data node the workflow
//! will contain. No edges are wired here; that is the resolver's job, and
//! it relies on every node already existing so lagged references can look
//! forward as well as back.
//!
//! Insertion order is part of the crate's contract: available data first,
//! then cycles in declaration order, dates in chronological order, task
//! refs in declaration order, tasks before their output data, parameter
//! products with the last declared dimension varying fastest.

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::error::GraphError;
use crate::graph::coordinate::{Coordinate, DimValue, DATE_DIM};
use crate::graph::item::{Availability, Data, GraphItem, Task};
use crate::graph::store::Store;
use crate::workflow::ir::WorkflowSpec;

/// Instantiates all task and data nodes into the store.
pub fn expand(spec: &WorkflowSpec, store: &mut Store) -> Result<(), GraphError> {
    for template in &spec.data.available {
        for coordinate in parameter_coordinates(None, &template.parameters, spec)? {
            store.insert(GraphItem::Data(Data {
                name: template.name.clone(),
                coordinate,
                availability: Availability::Available,
                payload: template.payload.clone(),
            }))?;
        }
    }

    for cycle in &spec.cycles {
        let dates = cycle_dates(cycle.cycling.as_ref());
        debug!(
            "expanding cycle '{}' over {} cycle point(s)",
            cycle.name,
            dates.len()
        );

        for date in &dates {
            for task_ref in &cycle.tasks {
                let template = spec
                    .task_template(&task_ref.name)
                    .ok_or_else(|| GraphError::UnknownName {
                        name: task_ref.name.clone(),
                    })?
                    .merged_with_root(spec.root_template());

                for coordinate in parameter_coordinates(*date, &template.parameters, spec)? {
                    store.insert(GraphItem::Task(Task {
                        name: template.name.clone(),
                        coordinate,
                        plugin: template.plugin.clone(),
                        payload: template.payload.clone(),
                        inputs: Vec::new(),
                        outputs: Vec::new(),
                        wait_on: Vec::new(),
                    }))?;
                }

                for output in &task_ref.outputs {
                    let data_template = spec.generated_template(&output.name).ok_or_else(|| {
                        GraphError::UnknownName {
                            name: output.name.clone(),
                        }
                    })?;
                    for coordinate in
                        parameter_coordinates(*date, &data_template.parameters, spec)?
                    {
                        store.insert(GraphItem::Data(Data {
                            name: data_template.name.clone(),
                            coordinate,
                            availability: Availability::Generated,
                            payload: data_template.payload.clone(),
                        }))?;
                    }
                }
            }
        }
    }

    info!(
        "workflow '{}' expanded to {} node(s)",
        spec.name,
        store.iter_items().count()
    );
    Ok(())
}

/// The cycle dates of a cycling block, or the single undated point.
pub(crate) fn cycle_dates(
    cycling: Option<&crate::temporal::cycling::CyclingSpec>,
) -> Vec<Option<NaiveDateTime>> {
    match cycling {
        Some(cycling) => cycling.dates().into_iter().map(Some).collect(),
        None => vec![None],
    }
}

/// The Cartesian product of the given parameter dimensions, each coordinate
/// extended with the cycle date when one is given. No dimensions and no
/// date yield the single empty coordinate; a dimension with no values
/// yields no coordinates at all.
pub(crate) fn parameter_coordinates(
    date: Option<NaiveDateTime>,
    param_names: &[String],
    spec: &WorkflowSpec,
) -> Result<Vec<Coordinate>, GraphError> {
    let mut axes: Vec<(&String, &Vec<DimValue>)> = Vec::with_capacity(param_names.len());
    for name in param_names {
        let values = spec
            .parameters
            .get(name)
            .ok_or_else(|| GraphError::UnknownName { name: name.clone() })?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        axes.push((name, values));
    }

    let mut coordinates = Vec::new();
    let mut indices = vec![0usize; axes.len()];
    loop {
        let mut pairs: Vec<(String, DimValue)> = Vec::with_capacity(axes.len() + 1);
        if let Some(date) = date {
            pairs.push((DATE_DIM.to_string(), DimValue::Date(date)));
        }
        for ((name, values), &idx) in axes.iter().zip(&indices) {
            pairs.push(((*name).clone(), values[idx].clone()));
        }
        coordinates.push(Coordinate::from_pairs(pairs)?);

        // Odometer increment, last dimension fastest.
        let mut pos = axes.len();
        loop {
            if pos == 0 {
                return Ok(coordinates);
            }
            pos -= 1;
            indices[pos] += 1;
            if indices[pos] < axes[pos].1.len() {
                break;
            }
            indices[pos] = 0;
        }
    }
}
