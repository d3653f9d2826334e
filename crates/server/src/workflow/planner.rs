//! Workflow planning: dependency validation and phase computation.
//!
//! Tasks are topologically sorted into phases (anti-chains): every task in
//! phase N has all dependencies in earlier phases and no dependency on a
//! phase-N peer, so a phase can run fully in parallel. Planning rejects
//! cycles, unknown dependencies, unknown tools, duplicate task ids, and
//! malformed template references.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ServerError;
use crate::registry::{ComponentKind, ComponentRegistry};
use crate::workflow::{template, WorkflowDefinition};

/// The executable shape of a validated workflow.
#[derive(Debug, Clone)]
pub struct WorkflowPlan {
    /// Task ids grouped into sequential phases.
    pub phases: Vec<Vec<String>>,
}

impl WorkflowPlan {
    /// Dependency-ordered task ids, phase by phase.
    pub fn ordered_tasks(&self) -> Vec<String> {
        self.phases.iter().flatten().cloned().collect()
    }
}

/// Validate a definition and compute its phase plan.
///
/// When `registry` is provided, every referenced tool must already be
/// registered (workflows are discovered last, so tools are all present at
/// validation time).
///
/// # Errors
///
/// [`ServerError::WorkflowInvalid`] for structural problems: duplicate task
/// ids, unknown dependencies, dependency cycles, unknown tools, template
/// syntax errors, or task-output references to tasks that are not declared
/// dependencies.
pub fn plan(
    definition: &WorkflowDefinition,
    registry: Option<&ComponentRegistry>,
) -> Result<WorkflowPlan, ServerError> {
    let mut seen = BTreeSet::new();
    for task in &definition.tasks {
        if !seen.insert(task.task_id.as_str()) {
            return Err(ServerError::WorkflowInvalid(format!(
                "duplicate task id '{}'",
                task.task_id
            )));
        }
    }

    for task in &definition.tasks {
        for dep in &task.depends_on {
            if definition.task(dep).is_none() {
                return Err(ServerError::WorkflowInvalid(format!(
                    "task '{}' depends on unknown task '{dep}'",
                    task.task_id
                )));
            }
            if dep == &task.task_id {
                return Err(ServerError::WorkflowInvalid(format!(
                    "task '{}' depends on itself",
                    task.task_id
                )));
            }
        }

        if let Some(registry) = registry
            && registry.lookup(ComponentKind::Tool, &task.tool).is_none()
        {
            return Err(ServerError::WorkflowInvalid(format!(
                "task '{}' references unknown tool '{}'",
                task.task_id, task.tool
            )));
        }

        validate_templates(definition, task)?;
    }

    compute_phases(definition)
}

/// Template references must parse, and `${tasks.T.*}` may only name a
/// declared (transitive references are not resolvable at run time otherwise)
/// dependency of the referencing task.
fn validate_templates(
    definition: &WorkflowDefinition,
    task: &crate::workflow::WorkflowTask,
) -> Result<(), ServerError> {
    let refs = template::scan_value(&serde_json::Value::Object(task.arguments.clone()))?;
    for reference in refs {
        if let template::TemplateRef::TaskOutput { task_id, .. } = reference {
            if definition.task(&task_id).is_none() {
                return Err(ServerError::WorkflowInvalid(format!(
                    "task '{}' references output of unknown task '{task_id}'",
                    task.task_id
                )));
            }
            if !task.depends_on.contains(&task_id) {
                return Err(ServerError::WorkflowInvalid(format!(
                    "task '{}' references output of '{task_id}' without depending on it",
                    task.task_id
                )));
            }
        }
    }
    Ok(())
}

/// Kahn's algorithm, layered: each round takes every task whose remaining
/// in-degree is zero, which is exactly an anti-chain.
fn compute_phases(definition: &WorkflowDefinition) -> Result<WorkflowPlan, ServerError> {
    let mut remaining: BTreeMap<&str, BTreeSet<&str>> = definition
        .tasks
        .iter()
        .map(|task| {
            (
                task.task_id.as_str(),
                task.depends_on.iter().map(|d| d.as_str()).collect(),
            )
        })
        .collect();

    let mut phases = Vec::new();
    while !remaining.is_empty() {
        let ready: Vec<String> = remaining
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id.to_string())
            .collect();

        if ready.is_empty() {
            let stuck: Vec<&str> = remaining.keys().copied().collect();
            return Err(ServerError::WorkflowInvalid(format!(
                "dependency cycle involving tasks: {}",
                stuck.join(", ")
            )));
        }

        for id in &ready {
            remaining.remove(id.as_str());
        }
        for deps in remaining.values_mut() {
            for id in &ready {
                deps.remove(id.as_str());
            }
        }
        phases.push(ready);
    }

    Ok(WorkflowPlan { phases })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WorkflowTask;
    use serde_json::json;

    fn task(id: &str, deps: &[&str]) -> WorkflowTask {
        WorkflowTask {
            task_id: id.to_string(),
            tool: "noop".to_string(),
            arguments: serde_json::Map::new(),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            continue_on_error: false,
            timeout_ms: None,
        }
    }

    fn definition(tasks: Vec<WorkflowTask>) -> WorkflowDefinition {
        WorkflowDefinition {
            id: "test".to_string(),
            version: None,
            description: String::new(),
            category: None,
            default_context: Default::default(),
            tasks,
        }
    }

    #[test]
    fn diamond_produces_three_phases() {
        let def = definition(vec![
            task("a", &[]),
            task("b", &["a"]),
            task("c", &["a"]),
            task("d", &["b", "c"]),
        ]);
        let plan = plan(&def, None).unwrap();
        assert_eq!(plan.phases.len(), 3);
        assert_eq!(plan.phases[0], vec!["a"]);
        assert_eq!(plan.phases[1], vec!["b", "c"]);
        assert_eq!(plan.phases[2], vec!["d"]);
        assert_eq!(plan.ordered_tasks(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn zero_tasks_is_an_empty_plan() {
        let plan = plan(&definition(vec![]), None).unwrap();
        assert!(plan.phases.is_empty());
    }

    #[test]
    fn cycle_is_rejected() {
        let def = definition(vec![task("a", &["b"]), task("b", &["a"])]);
        let err = plan(&def, None).unwrap_err();
        assert!(matches!(err, ServerError::WorkflowInvalid(_)));
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn self_dependency_is_rejected() {
        let def = definition(vec![task("a", &["a"])]);
        assert!(plan(&def, None).is_err());
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let def = definition(vec![task("a", &["ghost"])]);
        let err = plan(&def, None).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn duplicate_task_id_is_rejected() {
        let def = definition(vec![task("a", &[]), task("a", &[])]);
        let err = plan(&def, None).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn task_ref_without_dependency_is_rejected() {
        let mut probe = task("probe", &[]);
        probe.arguments =
            json!({"query": "${tasks.other.results}"}).as_object().unwrap().clone();
        let def = definition(vec![task("other", &[]), probe]);
        let err = plan(&def, None).unwrap_err();
        assert!(err.to_string().contains("without depending"));
    }

    #[test]
    fn bad_template_syntax_is_rejected_at_plan_time() {
        let mut bad = task("bad", &[]);
        bad.arguments = json!({"query": "${env.HOME}"}).as_object().unwrap().clone();
        let def = definition(vec![bad]);
        assert!(plan(&def, None).is_err());
    }
}
