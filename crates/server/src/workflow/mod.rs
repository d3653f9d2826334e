//! Declarative, multi-phase workflow engine.
//!
//! A workflow is a DAG of tasks, each of which fans out to a registered
//! tool. The [`planner`] topologically sorts tasks into phases (anti-chains)
//! and rejects cycles, unknown tools, and malformed template references. The
//! [`runner`] executes phases sequentially with bounded parallelism within
//! each phase, honours per-task timeouts and run-level cancellation, and the
//! summary module renders the structured result plus an optional narrative.

pub mod planner;
pub mod runner;
pub mod summary;
pub mod template;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default context shipped with a workflow definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowContext {
    /// What the workflow focuses on (an index, a host, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    /// Earliest time bound applied to searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_time: Option<String>,
    /// Latest time bound applied to searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_time: Option<String>,
    /// Additional free-form context fields.
    #[serde(default, flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl WorkflowContext {
    /// Merge call-time overrides over the definition's defaults and render
    /// the result as a flat object for `${ctx.*}` lookups.
    pub fn resolved(&self, overrides: &serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
        let mut out = serde_json::Map::new();
        if let Some(focus) = &self.focus {
            out.insert("focus".to_string(), Value::String(focus.clone()));
        }
        if let Some(earliest) = &self.earliest_time {
            out.insert("earliest_time".to_string(), Value::String(earliest.clone()));
        }
        if let Some(latest) = &self.latest_time {
            out.insert("latest_time".to_string(), Value::String(latest.clone()));
        }
        for (key, value) in &self.extra {
            out.insert(key.clone(), value.clone());
        }
        for (key, value) in overrides {
            out.insert(key.clone(), value.clone());
        }
        out
    }
}

/// One task in a workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTask {
    /// Unique id within the workflow.
    pub task_id: String,
    /// Name of the registered tool this task invokes.
    pub tool: String,
    /// Argument bindings: literals, `${ctx.X}`, or `${tasks.T.path}`.
    #[serde(default)]
    pub arguments: serde_json::Map<String, Value>,
    /// Task ids that must reach a terminal state first.
    #[serde(default)]
    pub depends_on: BTreeSet<String>,
    /// Whether dependents may proceed when this task fails.
    #[serde(default)]
    pub continue_on_error: bool,
    /// Per-task execution budget in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// A workflow definition as loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Workflow id; doubles as the registry name.
    pub id: String,
    /// Definition version string.
    #[serde(default)]
    pub version: Option<String>,
    /// Human description.
    #[serde(default)]
    pub description: String,
    /// Category for listings; defaults to "workflow".
    #[serde(default)]
    pub category: Option<String>,
    /// Context defaults tasks may reference via `${ctx.*}`.
    #[serde(default)]
    pub default_context: WorkflowContext,
    /// The task DAG.
    #[serde(default)]
    pub tasks: Vec<WorkflowTask>,
}

impl WorkflowDefinition {
    /// Look up a task by id.
    pub fn task(&self, task_id: &str) -> Option<&WorkflowTask> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }
}

/// Terminal and non-terminal states of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Ok,
    /// Completed with an error (including timeouts).
    Failed,
    /// Never started because a transitive dependency failed.
    Skipped,
    /// Stopped by run-level cancellation.
    Cancelled,
}

impl TaskState {
    /// Whether this state is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Pending | TaskState::Running)
    }
}

/// Result record for one task in a run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    /// Task id.
    pub task_id: String,
    /// Tool the task invoked.
    pub tool: String,
    /// Final (or current) state.
    pub state: TaskState,
    /// Tool result data when the task succeeded, or the error envelope
    /// payload when it failed with `continue_on_error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Envelope error code when the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human error message when the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Why the task was skipped (names the failing dependency).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Start timestamp, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// Finish timestamp, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// Execution duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl TaskRecord {
    fn pending(task: &WorkflowTask) -> Self {
        Self {
            task_id: task.task_id.clone(),
            tool: task.tool.clone(),
            state: TaskState::Pending,
            data: None,
            error_code: None,
            error_message: None,
            skip_reason: None,
            started_at: None,
            finished_at: None,
            duration_ms: None,
        }
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every task reached `ok` (or there were no tasks).
    Ok,
    /// At least one task failed or was skipped.
    Failed,
    /// The run was cancelled before completion.
    Cancelled,
}

/// An in-memory, ephemeral record of one workflow execution.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRun {
    /// Unique run id.
    pub run_id: String,
    /// The workflow that ran.
    pub workflow_id: String,
    /// Overall status.
    pub status: RunStatus,
    /// The context tasks resolved `${ctx.*}` against.
    pub resolved_context: serde_json::Map<String, Value>,
    /// Per-task records, keyed by task id.
    pub tasks: BTreeMap<String, TaskRecord>,
    /// Dependency-ordered task ids (phase by phase).
    pub task_order: Vec<String>,
    /// Run start timestamp, RFC 3339.
    pub started_at: String,
    /// Run finish timestamp, RFC 3339.
    pub finished_at: String,
}
