//! Pre-expansion validation of the IR.
//!
//! Cross-reference checks that would otherwise surface halfway through
//! expansion: every referenced name must be declared, every declared
//! parameter dimension must have a value list, and cycling blocks must be
//! internally consistent.

use log::{debug, info};

use crate::error::GraphError;
use crate::workflow::ir::{WorkflowSpec, ROOT_TASK};

/// Validates the IR before any graph item is created.
pub fn validate_spec(spec: &WorkflowSpec) -> Result<(), GraphError> {
    info!(
        "validating workflow '{}': {} cycles, {} task templates",
        spec.name,
        spec.cycles.len(),
        spec.tasks.len()
    );

    check_parameter_declarations(spec)?;

    for cycle in &spec.cycles {
        if let Some(cycling) = &cycle.cycling {
            cycling.validate(&cycle.name)?;
        }

        for task_ref in &cycle.tasks {
            // ROOT only supplies defaults; it cannot appear in a cycle.
            if task_ref.name == ROOT_TASK || spec.task_template(&task_ref.name).is_none() {
                return Err(GraphError::UnknownName {
                    name: task_ref.name.clone(),
                });
            }

            for input in &task_ref.inputs {
                if spec.data_template(&input.name).is_none() {
                    return Err(GraphError::UnknownName {
                        name: input.name.clone(),
                    });
                }
            }

            for output in &task_ref.outputs {
                let Some(data_template) = spec.generated_template(&output.name) else {
                    return Err(GraphError::UnknownName {
                        name: output.name.clone(),
                    });
                };
                // An output's dimensions must project out of the task's.
                let task_template = spec
                    .task_template(&task_ref.name)
                    .expect("presence checked above");
                let orphans: Vec<String> = data_template
                    .parameters
                    .iter()
                    .filter(|dim| !task_template.parameters.contains(dim))
                    .cloned()
                    .collect();
                if !orphans.is_empty() {
                    return Err(GraphError::dimension_mismatch(
                        &output.name,
                        &task_template.parameters,
                        &orphans,
                    ));
                }
            }

            for wait_on in &task_ref.wait_on {
                if wait_on.name == ROOT_TASK || spec.task_template(&wait_on.name).is_none() {
                    return Err(GraphError::UnknownName {
                        name: wait_on.name.clone(),
                    });
                }
            }
        }
        debug!("cycle '{}' validated", cycle.name);
    }

    Ok(())
}

/// Every parameter dimension named by a template must exist in the global
/// parameters map.
fn check_parameter_declarations(spec: &WorkflowSpec) -> Result<(), GraphError> {
    let template_params = spec
        .tasks
        .iter()
        .map(|template| (&template.name, &template.parameters))
        .chain(
            spec.data
                .available
                .iter()
                .chain(spec.data.generated.iter())
                .map(|template| (&template.name, &template.parameters)),
        );

    for (name, parameters) in template_params {
        for dim in parameters {
            if !spec.parameters.contains_key(dim) {
                return Err(GraphError::UnknownName {
                    name: format!("{name}.{dim}"),
                });
            }
        }
    }
    Ok(())
}
