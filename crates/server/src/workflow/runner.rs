//! Workflow execution.
//!
//! Phases execute sequentially; tasks within a phase execute in parallel,
//! bounded by a per-run semaphore. Each task's arguments are rendered
//! against the resolved context and earlier task outputs, then dispatched
//! through the same dispatcher the MCP surface uses, so workflow children
//! behave exactly like direct tool calls.
//!
//! # Invariants
//! - Tasks in phase N start only after every task in phase N-1 reached a
//!   terminal state.
//! - A task is skipped iff a transitive dependency failed without
//!   `continue_on_error`; peers already running complete normally.
//! - The engine never retries; retry policy lies with individual tools.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::InvocationContext;
use crate::envelope::Envelope;
use crate::error::ServerError;
use crate::workflow::planner::WorkflowPlan;
use crate::workflow::{
    template, RunStatus, TaskRecord, TaskState, WorkflowDefinition, WorkflowRun, WorkflowTask,
};

/// Execute a planned workflow.
///
/// `overrides` are call-time context fields merged over the definition's
/// `default_context`. Cancellation of `ctx.cancel` stops the run at the next
/// phase boundary and signals in-flight tasks cooperatively.
pub async fn run(
    definition: &WorkflowDefinition,
    plan: &WorkflowPlan,
    overrides: &Map<String, Value>,
    ctx: &InvocationContext,
    max_parallel: usize,
) -> WorkflowRun {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let context = definition.default_context.resolved(overrides);

    info!(run_id = %run_id, workflow = %definition.id, phases = plan.phases.len(), "workflow run starting");

    let mut records: HashMap<String, TaskRecord> = definition
        .tasks
        .iter()
        .map(|task| (task.task_id.clone(), TaskRecord::pending(task)))
        .collect();
    // Outputs visible to `${tasks.*}` references: result data of ok tasks,
    // error payloads of continue_on_error failures.
    let mut outputs: HashMap<String, Value> = HashMap::new();
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let mut cancelled = false;

    for phase in &plan.phases {
        if ctx.cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let mut futures = Vec::new();
        for task_id in phase {
            let Some(task) = definition.task(task_id) else {
                continue;
            };

            // Skip decision uses only earlier-phase states; anti-chains
            // guarantee no peer dependencies.
            if let Some(reason) = skip_reason(definition, task, &records) {
                if let Some(record) = records.get_mut(task_id) {
                    record.state = TaskState::Skipped;
                    record.skip_reason = Some(reason);
                }
                continue;
            }

            let rendered = render_arguments(task, &context, &outputs);
            futures.push(execute_task(
                task,
                rendered,
                ctx,
                Arc::clone(&semaphore),
            ));
        }

        let finished = futures::future::join_all(futures).await;
        for (task_id, record, output) in finished {
            if let Some(value) = output {
                outputs.insert(task_id.clone(), value);
            }
            records.insert(task_id, record);
        }
    }

    let status = if cancelled {
        RunStatus::Cancelled
    } else if records.values().all(|r| r.state == TaskState::Ok) {
        RunStatus::Ok
    } else {
        RunStatus::Failed
    };

    info!(run_id = %run_id, workflow = %definition.id, ?status, "workflow run finished");

    WorkflowRun {
        run_id,
        workflow_id: definition.id.clone(),
        status,
        resolved_context: context,
        tasks: records.into_iter().collect(),
        task_order: plan.ordered_tasks(),
        started_at: started_at.to_rfc3339(),
        finished_at: Utc::now().to_rfc3339(),
    }
}

/// If a transitive dependency failed without `continue_on_error` (or was
/// itself skipped or cancelled), return the id of the originally failing
/// task as the skip reason.
fn skip_reason(
    definition: &WorkflowDefinition,
    task: &WorkflowTask,
    records: &HashMap<String, TaskRecord>,
) -> Option<String> {
    for dep in &task.depends_on {
        let record = records.get(dep)?;
        match record.state {
            TaskState::Ok => {}
            TaskState::Failed => {
                let tolerated = definition
                    .task(dep)
                    .map(|d| d.continue_on_error)
                    .unwrap_or(false);
                if !tolerated {
                    return Some(dep.clone());
                }
            }
            TaskState::Skipped => {
                // Propagate the original failing task.
                return Some(record.skip_reason.clone().unwrap_or_else(|| dep.clone()));
            }
            TaskState::Cancelled | TaskState::Pending | TaskState::Running => {
                return Some(dep.clone());
            }
        }
    }
    None
}

fn render_arguments(
    task: &WorkflowTask,
    context: &Map<String, Value>,
    outputs: &HashMap<String, Value>,
) -> Result<Map<String, Value>, ServerError> {
    let lookup = |task_id: &str| outputs.get(task_id).cloned();
    let rendered = template::render_value(
        &Value::Object(task.arguments.clone()),
        context,
        &lookup,
    )?;
    match rendered {
        Value::Object(map) => Ok(map),
        _ => Err(ServerError::Internal(
            "rendered arguments are not an object".to_string(),
        )),
    }
}

/// Run one task to a terminal state, returning its record and, when the
/// result should be visible to dependents, its output value.
async fn execute_task(
    task: &WorkflowTask,
    rendered: Result<Map<String, Value>, ServerError>,
    ctx: &InvocationContext,
    semaphore: Arc<Semaphore>,
) -> (String, TaskRecord, Option<Value>) {
    let mut record = TaskRecord::pending(task);
    let _permit = semaphore.acquire().await.ok();

    let args = match rendered {
        Ok(args) => args,
        Err(err) => {
            record.state = TaskState::Failed;
            record.error_code = Some(err.code().to_string());
            record.error_message = Some(err.message());
            let output = task
                .continue_on_error
                .then(|| error_output(err.code(), &err.message()));
            return (task.task_id.clone(), record, output);
        }
    };

    record.state = TaskState::Running;
    record.started_at = Some(Utc::now().to_rfc3339());
    let start = std::time::Instant::now();
    debug!(task = %task.task_id, tool = %task.tool, "workflow task starting");

    let child_ctx = ctx.child();
    let envelope = {
        let call = Arc::clone(&child_ctx.dispatcher).call_tool(
            task.tool.clone(),
            args,
            child_ctx.clone(),
        );
        match task.timeout_ms {
            Some(timeout_ms) => {
                match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
                    Ok(envelope) => envelope,
                    Err(_) => {
                        // Signal the in-flight invocation before reporting.
                        child_ctx.cancel.cancel();
                        Envelope::error(
                            &ServerError::Timeout(format!(
                                "task '{}' exceeded {timeout_ms}ms",
                                task.task_id
                            )),
                            None,
                        )
                    }
                }
            }
            None => call.await,
        }
    };

    record.finished_at = Some(Utc::now().to_rfc3339());
    record.duration_ms = Some(start.elapsed().as_millis() as u64);

    let mut output = None;
    if envelope.is_ok() {
        record.state = TaskState::Ok;
        record.data = envelope.data.clone();
        output = Some(envelope.data.unwrap_or(Value::Null));
    } else {
        let code = envelope.code.unwrap_or_else(|| "Internal".to_string());
        let message = envelope.message.unwrap_or_default();
        record.state = if code == "Cancelled" {
            TaskState::Cancelled
        } else {
            TaskState::Failed
        };
        record.error_code = Some(code.clone());
        record.error_message = Some(message.clone());
        if task.continue_on_error {
            let error_value = error_output(&code, &message);
            record.data = Some(error_value.clone());
            output = Some(error_value);
        }
    }

    debug!(task = %task.task_id, state = ?record.state, "workflow task finished");
    (task.task_id.clone(), record, output)
}

/// The value dependents of a `continue_on_error` task observe.
fn error_output(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message,
    })
}
