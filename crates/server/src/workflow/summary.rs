//! Run summarisation: the structured block and the narrative.
//!
//! The structured summary is always produced. The narrative is routed
//! through the `summarize_run` LLM tool when one is registered; otherwise a
//! deterministic template is used. Narrative generation never blocks the
//! structured data; a failure populates `narrative_error` instead.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::context::InvocationContext;
use crate::registry::ComponentKind;
use crate::surface::Dispatcher;
use crate::workflow::{RunStatus, TaskState, WorkflowRun};

/// Name of the optional LLM narrator tool.
pub const NARRATOR_TOOL: &str = "summarize_run";

/// Build the structured summary block for a finished run.
pub fn structured_summary(run: &WorkflowRun) -> Value {
    let mut ok = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;
    let mut cancelled = 0usize;
    for record in run.tasks.values() {
        match record.state {
            TaskState::Ok => ok += 1,
            TaskState::Failed => failed += 1,
            TaskState::Skipped => skipped += 1,
            TaskState::Cancelled => cancelled += 1,
            TaskState::Pending | TaskState::Running => {}
        }
    }

    json!({
        "run_id": run.run_id,
        "workflow_id": run.workflow_id,
        "status": run.status,
        "started_at": run.started_at,
        "finished_at": run.finished_at,
        "resolved_context": run.resolved_context,
        "task_order": run.task_order,
        "tasks": run.tasks,
        "counts": {
            "ok": ok,
            "failed": failed,
            "skipped": skipped,
            "cancelled": cancelled,
            "total": run.tasks.len(),
        },
    })
}

/// Produce the narrative for a run.
///
/// Returns `(narrative, narrative_error)`; exactly one is `Some` unless the
/// deterministic fallback is used, which cannot fail.
pub async fn narrate(
    run: &WorkflowRun,
    summary: &Value,
    dispatcher: &Arc<Dispatcher>,
    ctx: &InvocationContext,
) -> (Option<String>, Option<String>) {
    if dispatcher
        .registry()
        .lookup(ComponentKind::Tool, NARRATOR_TOOL)
        .is_some()
    {
        let mut args = serde_json::Map::new();
        args.insert("summary".to_string(), summary.clone());

        let envelope = Arc::clone(dispatcher)
            .call_tool(NARRATOR_TOOL.to_string(), args, ctx.child())
            .await;

        if envelope.is_ok() {
            let narrative = envelope
                .data
                .as_ref()
                .and_then(|d| d["narrative"].as_str())
                .map(|s| s.to_string());
            match narrative {
                Some(text) => return (Some(text), None),
                None => {
                    return (
                        Some(deterministic_narrative(run)),
                        Some("narrator returned no narrative field".to_string()),
                    );
                }
            }
        }
        let reason = envelope
            .message
            .unwrap_or_else(|| "narrator tool failed".to_string());
        return (Some(deterministic_narrative(run)), Some(reason));
    }

    (Some(deterministic_narrative(run)), None)
}

/// Template narrative used when no LLM narrator is registered or it fails.
pub fn deterministic_narrative(run: &WorkflowRun) -> String {
    let mut lines = Vec::new();
    let verdict = match run.status {
        RunStatus::Ok => "completed successfully",
        RunStatus::Failed => "completed with failures",
        RunStatus::Cancelled => "was cancelled",
    };
    lines.push(format!(
        "Workflow '{}' (run {}) {verdict}.",
        run.workflow_id, run.run_id
    ));

    for task_id in &run.task_order {
        let Some(record) = run.tasks.get(task_id) else {
            continue;
        };
        let line = match record.state {
            TaskState::Ok => format!(
                "- {task_id} ({}) ok in {}ms",
                record.tool,
                record.duration_ms.unwrap_or(0)
            ),
            TaskState::Failed => format!(
                "- {task_id} ({}) failed: {}",
                record.tool,
                record.error_message.as_deref().unwrap_or("unknown error")
            ),
            TaskState::Skipped => format!(
                "- {task_id} skipped because '{}' failed",
                record.skip_reason.as_deref().unwrap_or("a dependency")
            ),
            TaskState::Cancelled => format!("- {task_id} cancelled"),
            TaskState::Pending => format!("- {task_id} never started"),
            TaskState::Running => format!("- {task_id} still running"),
        };
        lines.push(line);
    }

    lines.join("\n")
}
