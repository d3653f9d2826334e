//! Workflow engine tests: dependency ordering, parallelism, failure
//! propagation, templates, timeouts, and cancellation.

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use splunk_mcp_server::context::InvocationContext;
use splunk_mcp_server::error::Result as ServerResult;
use splunk_mcp_server::registry::{ArgObject, ComponentEntry, ToolHandler};
use splunk_mcp_server::workflow::{planner, runner, RunStatus, TaskState, WorkflowDefinition};

use common::{context_with, dispatcher_with, tool_metadata, EchoTool, FailingTool};

type Span = (String, Instant, Instant);

/// Sleeps briefly and records its execution span under the `label` argument.
struct RecordTool {
    log: Arc<Mutex<Vec<Span>>>,
}

#[async_trait]
impl ToolHandler for RecordTool {
    async fn execute(&mut self, _ctx: &InvocationContext, args: ArgObject) -> ServerResult<Value> {
        let label = args
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();
        let start = Instant::now();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let end = Instant::now();
        self.log.lock().unwrap().push((label.clone(), start, end));
        Ok(json!({ "label": label }))
    }
}

/// Sleeps far longer than any test timeout budget.
struct SlowTool;

#[async_trait]
impl ToolHandler for SlowTool {
    async fn execute(&mut self, _ctx: &InvocationContext, _args: ArgObject) -> ServerResult<Value> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Value::Null)
    }
}

fn definition(tasks: Value) -> WorkflowDefinition {
    serde_json::from_value(json!({
        "id": "test_workflow",
        "description": "test",
        "tasks": tasks,
    }))
    .expect("definition parses")
}

fn span_of<'a>(log: &'a [Span], label: &str) -> &'a Span {
    log.iter().find(|(l, _, _)| l == label).expect("span recorded")
}

#[tokio::test]
async fn diamond_respects_dependencies_and_runs_peers_in_parallel() {
    let log: Arc<Mutex<Vec<Span>>> = Arc::new(Mutex::new(Vec::new()));
    let log_for_factory = Arc::clone(&log);
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata("record", false),
        move || RecordTool {
            log: Arc::clone(&log_for_factory),
        },
    )]);
    let ctx = context_with(&dispatcher, Default::default());

    let def = definition(json!([
        {"task_id": "a", "tool": "record", "arguments": {"label": "a"}},
        {"task_id": "b", "tool": "record", "arguments": {"label": "b"}, "depends_on": ["a"]},
        {"task_id": "c", "tool": "record", "arguments": {"label": "c"}, "depends_on": ["a"]},
        {"task_id": "d", "tool": "record", "arguments": {"label": "d"}, "depends_on": ["b", "c"]},
    ]));
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");
    let run = runner::run(&def, &plan, &serde_json::Map::new(), &ctx, 8).await;

    assert_eq!(run.status, RunStatus::Ok);
    assert_eq!(run.task_order, vec!["a", "b", "c", "d"]);

    let log = log.lock().unwrap();
    let (_, a_start, a_end) = span_of(&log, "a");
    let (_, b_start, b_end) = span_of(&log, "b");
    let (_, c_start, c_end) = span_of(&log, "c");
    let (_, d_start, _) = span_of(&log, "d");

    // Phase barriers: b and c start after a ends, d after both.
    assert!(b_start >= a_end);
    assert!(c_start >= a_end);
    assert!(*d_start >= *b_end.max(c_end));
    assert!(*a_start <= *b_start);

    // b and c overlap in time (parallelism within a phase).
    assert!(b_start < c_end && c_start < b_end, "b and c should overlap");
}

#[tokio::test]
async fn failure_skips_dependents_and_spares_independents() {
    let dispatcher = dispatcher_with(vec![
        ComponentEntry::tool(tool_metadata("boom", false), || {
            FailingTool("deliberate failure")
        }),
        ComponentEntry::tool(tool_metadata("echo", false), || EchoTool),
    ]);
    let ctx = context_with(&dispatcher, Default::default());

    let def = definition(json!([
        {"task_id": "a", "tool": "boom"},
        {"task_id": "b", "tool": "echo", "depends_on": ["a"]},
        {"task_id": "c", "tool": "echo"},
        {"task_id": "d", "tool": "echo", "depends_on": ["b"]},
    ]));
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");
    let run = runner::run(&def, &plan, &serde_json::Map::new(), &ctx, 8).await;

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.tasks["a"].state, TaskState::Failed);
    assert_eq!(run.tasks["a"].error_code.as_deref(), Some("ExecutionError"));
    assert_eq!(run.tasks["b"].state, TaskState::Skipped);
    assert_eq!(run.tasks["b"].skip_reason.as_deref(), Some("a"));
    assert_eq!(run.tasks["c"].state, TaskState::Ok);
    // Transitive skip still names the originally failing task.
    assert_eq!(run.tasks["d"].state, TaskState::Skipped);
    assert_eq!(run.tasks["d"].skip_reason.as_deref(), Some("a"));
}

#[tokio::test]
async fn continue_on_error_exposes_the_failure_to_dependents() {
    let dispatcher = dispatcher_with(vec![
        ComponentEntry::tool(tool_metadata("boom", false), || {
            FailingTool("tolerated failure")
        }),
        ComponentEntry::tool(tool_metadata("echo", false), || EchoTool),
    ]);
    let ctx = context_with(&dispatcher, Default::default());

    let def = definition(json!([
        {"task_id": "a", "tool": "boom", "continue_on_error": true},
        {
            "task_id": "b",
            "tool": "echo",
            "depends_on": ["a"],
            "arguments": {"upstream_status": "${tasks.a.status}", "upstream_code": "${tasks.a.code}"}
        },
    ]));
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");
    let run = runner::run(&def, &plan, &serde_json::Map::new(), &ctx, 8).await;

    assert_eq!(run.tasks["a"].state, TaskState::Failed);
    assert_eq!(run.tasks["b"].state, TaskState::Ok);
    let data = run.tasks["b"].data.as_ref().unwrap();
    assert_eq!(data["upstream_status"], "error");
    assert_eq!(data["upstream_code"], "ExecutionError");
    // The run still reports failure at the top level.
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn task_outputs_flow_through_templates_preserving_types() {
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata("echo", false),
        || EchoTool,
    )]);
    let ctx = context_with(&dispatcher, Default::default());

    let def = definition(json!([
        {"task_id": "a", "tool": "echo", "arguments": {"value": 42, "name": "probe"}},
        {
            "task_id": "b",
            "tool": "echo",
            "depends_on": ["a"],
            "arguments": {"forwarded": "${tasks.a.value}", "greeting": "hello ${tasks.a.name}"}
        },
    ]));
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");
    let run = runner::run(&def, &plan, &serde_json::Map::new(), &ctx, 8).await;

    assert_eq!(run.status, RunStatus::Ok);
    let data = run.tasks["b"].data.as_ref().unwrap();
    assert_eq!(data["forwarded"], 42);
    assert_eq!(data["greeting"], "hello probe");
}

#[tokio::test]
async fn context_fields_render_from_defaults_and_overrides() {
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata("echo", false),
        || EchoTool,
    )]);
    let ctx = context_with(&dispatcher, Default::default());

    let def: WorkflowDefinition = serde_json::from_value(json!({
        "id": "ctx_flow",
        "description": "",
        "default_context": {"earliest_time": "-24h", "focus": "main"},
        "tasks": [
            {"task_id": "a", "tool": "echo",
             "arguments": {"earliest": "${ctx.earliest_time}", "index": "${ctx.focus}"}}
        ]
    }))
    .unwrap();
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");

    let mut overrides = serde_json::Map::new();
    overrides.insert("focus".to_string(), json!("web"));
    let run = runner::run(&def, &plan, &overrides, &ctx, 8).await;

    let data = run.tasks["a"].data.as_ref().unwrap();
    assert_eq!(data["earliest"], "-24h");
    assert_eq!(data["index"], "web");
}

#[tokio::test]
async fn dangling_runtime_reference_fails_the_task() {
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata("echo", false),
        || EchoTool,
    )]);
    let ctx = context_with(&dispatcher, Default::default());

    let def = definition(json!([
        {"task_id": "a", "tool": "echo", "arguments": {}},
        {
            "task_id": "b",
            "tool": "echo",
            "depends_on": ["a"],
            "arguments": {"x": "${tasks.a.no_such_field}"}
        },
    ]));
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");
    let run = runner::run(&def, &plan, &serde_json::Map::new(), &ctx, 8).await;

    assert_eq!(run.tasks["b"].state, TaskState::Failed);
    assert_eq!(run.tasks["b"].error_code.as_deref(), Some("ReferenceError"));
}

#[tokio::test]
async fn task_timeout_fails_with_timeout_code() {
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata("slow", false),
        || SlowTool,
    )]);
    let ctx = context_with(&dispatcher, Default::default());

    let def = definition(json!([
        {"task_id": "a", "tool": "slow", "timeout_ms": 100},
    ]));
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");
    let start = Instant::now();
    let run = runner::run(&def, &plan, &serde_json::Map::new(), &ctx, 8).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.tasks["a"].state, TaskState::Failed);
    assert_eq!(run.tasks["a"].error_code.as_deref(), Some("Timeout"));
}

#[tokio::test]
async fn cancellation_stops_running_tasks_and_later_phases() {
    let dispatcher = dispatcher_with(vec![
        ComponentEntry::tool(tool_metadata("slow", false), || SlowTool),
        ComponentEntry::tool(tool_metadata("echo", false), || EchoTool),
    ]);
    let ctx = context_with(&dispatcher, Default::default());

    let def = definition(json!([
        {"task_id": "first", "tool": "slow"},
        {"task_id": "second", "tool": "echo", "depends_on": ["first"]},
    ]));
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let start = Instant::now();
    let run = runner::run(&def, &plan, &serde_json::Map::new(), &ctx, 8).await;

    assert!(start.elapsed() < Duration::from_secs(5), "cancel must interrupt");
    assert_eq!(run.status, RunStatus::Cancelled);
    assert_eq!(run.tasks["first"].state, TaskState::Cancelled);
    // The second phase never started.
    assert_eq!(run.tasks["second"].state, TaskState::Pending);
}

#[tokio::test]
async fn zero_task_workflow_succeeds_instantly() {
    let dispatcher = dispatcher_with(Vec::new());
    let ctx = context_with(&dispatcher, Default::default());

    let def = definition(json!([]));
    let plan = planner::plan(&def, Some(dispatcher.registry().as_ref())).expect("plan");
    let run = runner::run(&def, &plan, &serde_json::Map::new(), &ctx, 8).await;

    assert_eq!(run.status, RunStatus::Ok);
    assert!(run.tasks.is_empty());
}

#[tokio::test]
async fn run_workflow_tool_returns_summary_with_fallback_narrative() {
    use splunk_mcp_server::registry::{ComponentMetadata, Origin};

    let workflow: WorkflowDefinition = serde_json::from_value(json!({
        "id": "tiny",
        "description": "one echo",
        "tasks": [{"task_id": "only", "tool": "echo", "arguments": {"ok": true}}]
    }))
    .unwrap();

    // Drop the env-dependent narrator so the deterministic fallback runs.
    let mut entries: Vec<ComponentEntry> = splunk_mcp_server::tools::core_entries()
        .into_iter()
        .filter(|e| e.metadata.name != "summarize_run")
        .collect();
    entries.push(ComponentEntry::tool(tool_metadata("echo", false), || EchoTool));
    entries.push(ComponentEntry::workflow(
        ComponentMetadata::new("tiny", "one echo", "workflow", false, Origin::Core, "tests/tiny"),
        workflow,
    ));
    let dispatcher = dispatcher_with(entries);
    let ctx = context_with(&dispatcher, Default::default());

    let mut args = serde_json::Map::new();
    args.insert("workflow".to_string(), json!("tiny"));
    let envelope = Arc::clone(&dispatcher)
        .call_tool("run_workflow".to_string(), args, ctx)
        .await;

    assert!(envelope.is_ok(), "envelope: {:?}", envelope.to_value());
    let data = envelope.data.unwrap();
    assert_eq!(data["status"], "ok");
    assert_eq!(data["counts"]["ok"], 1);
    assert_eq!(data["tasks"]["only"]["state"], "ok");
    // With no narrator registered the deterministic template still names
    // the workflow.
    assert!(data["narrative"].as_str().unwrap().contains("tiny"));
}

#[tokio::test]
async fn unknown_workflow_is_not_found() {
    let dispatcher = dispatcher_with(splunk_mcp_server::tools::core_entries());
    let ctx = context_with(&dispatcher, Default::default());

    let mut args = serde_json::Map::new();
    args.insert("workflow".to_string(), json!("ghost"));
    let envelope = Arc::clone(&dispatcher)
        .call_tool("run_workflow".to_string(), args, ctx)
        .await;

    assert!(!envelope.is_ok());
    assert_eq!(envelope.code.as_deref(), Some("NotFound"));
}
