//! The workflow engine's tool surface: `run_workflow` and `list_workflows`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::InvocationContext;
use crate::error::{Result, ServerError};
use crate::registry::{
    ArgObject, ComponentEntry, ComponentFilter, ComponentKind, ComponentMetadata, HandlerFactory,
    Origin, ParamSpec, ParamType, ToolHandler,
};
use crate::tools::{arg_object, require_str};
use crate::workflow::{planner, runner, summary};

/// Name of the workflow execution tool.
pub const RUN_WORKFLOW_TOOL: &str = "run_workflow";
/// Name of the workflow listing tool.
pub const LIST_WORKFLOWS_TOOL: &str = "list_workflows";

struct RunWorkflow;

#[async_trait]
impl ToolHandler for RunWorkflow {
    async fn execute(&mut self, ctx: &InvocationContext, args: ArgObject) -> Result<Value> {
        let workflow_id = require_str(&args, "workflow")?;
        let overrides = arg_object(&args, "context").cloned().unwrap_or_default();

        let entry = ctx
            .dispatcher
            .registry()
            .lookup(ComponentKind::Workflow, workflow_id)
            .ok_or_else(|| ServerError::NotFound(format!("workflow '{workflow_id}'")))?;
        let HandlerFactory::Workflow(definition) = &entry.factory else {
            return Err(ServerError::Internal(format!(
                "'{workflow_id}' is not a workflow entry"
            )));
        };

        // Re-plan against the live registry; a tool deregistered since
        // discovery fails the run, not the definition.
        let plan = planner::plan(definition, Some(ctx.dispatcher.registry().as_ref()))?;

        let run = runner::run(
            definition,
            &plan,
            &overrides,
            ctx,
            ctx.dispatcher.max_parallel(),
        )
        .await;

        let structured = summary::structured_summary(&run);
        let (narrative, narrative_error) =
            summary::narrate(&run, &structured, &ctx.dispatcher, ctx).await;

        let mut result = structured;
        if let Some(narrative) = narrative {
            result["narrative"] = Value::String(narrative);
        }
        if let Some(error) = narrative_error {
            result["narrative_error"] = Value::String(error);
        }
        Ok(result)
    }
}

struct ListWorkflows;

#[async_trait]
impl ToolHandler for ListWorkflows {
    async fn execute(&mut self, ctx: &InvocationContext, args: ArgObject) -> Result<Value> {
        let filter = ComponentFilter {
            category: args
                .get("category")
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
            ..Default::default()
        };
        let workflows: Vec<Value> = ctx
            .dispatcher
            .registry()
            .list(ComponentKind::Workflow, Some(&filter))
            .into_iter()
            .map(|entry| {
                let task_count = match &entry.factory {
                    HandlerFactory::Workflow(definition) => definition.tasks.len(),
                    _ => 0,
                };
                json!({
                    "id": entry.metadata.name,
                    "description": entry.metadata.description,
                    "category": entry.metadata.category,
                    "origin": entry.metadata.origin,
                    "task_count": task_count,
                })
            })
            .collect();

        Ok(json!({
            "count": workflows.len(),
            "workflows": workflows,
        }))
    }
}

/// Registry entry for `run_workflow`.
pub fn run_entry() -> ComponentEntry {
    let metadata = ComponentMetadata::new(
        RUN_WORKFLOW_TOOL,
        "Execute a registered troubleshooting workflow: phases run in order, \
         independent tasks in parallel, and the result carries per-task state \
         plus a narrative summary",
        "workflow",
        false,
        Origin::Core,
        "tools/workflow.rs",
    )
    .with_tags(&["workflow", "orchestration"])
    .with_params(vec![
        ParamSpec::required("workflow", ParamType::String, "Id of the workflow to run"),
        ParamSpec::optional(
            "context",
            ParamType::Object,
            None,
            "Context fields merged over the workflow's defaults (focus, earliest_time, ...)",
        ),
    ]);
    ComponentEntry::tool(metadata, || RunWorkflow)
}

/// Registry entry for `list_workflows`.
pub fn list_entry() -> ComponentEntry {
    let metadata = ComponentMetadata::new(
        LIST_WORKFLOWS_TOOL,
        "List registered workflows with their descriptions and task counts",
        "workflow",
        false,
        Origin::Core,
        "tools/workflow.rs",
    )
    .with_tags(&["workflow"])
    .with_params(vec![ParamSpec::optional(
        "category",
        ParamType::String,
        None,
        "Only list workflows in this category",
    )]);
    ComponentEntry::tool(metadata, || ListWorkflows)
}
