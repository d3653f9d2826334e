//! Narrator tool tests: `summarize_run` against a mocked OpenAI
//! chat-completions endpoint, and the workflow engine's `narrative_error`
//! fallback when the narrator fails.

mod common;

use std::sync::Arc;

use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use splunk_mcp_server::registry::{ComponentEntry, ComponentMetadata, Origin};
use splunk_mcp_server::workflow::WorkflowDefinition;
use splunk_mcp_server::Envelope;

use common::{context_with, dispatcher_with, tool_metadata, EchoTool};

/// Env vars the narrator reads, pointed at the mock server.
fn narrator_env(mock_uri: String) -> [(&'static str, Option<String>); 3] {
    [
        ("OPENAI_API_KEY", Some("test-api-key".to_string())),
        ("OPENAI_BASE_URL", Some(mock_uri)),
        ("OPENAI_MODEL", Some("test-model".to_string())),
    ]
}

/// Invoke `summarize_run` through the dispatcher with the given summary.
async fn call_narrator(summary: serde_json::Value) -> Envelope {
    let dispatcher = dispatcher_with(splunk_mcp_server::tools::core_entries());
    let ctx = context_with(&dispatcher, Default::default());

    let mut args = serde_json::Map::new();
    args.insert("summary".to_string(), summary);
    Arc::clone(&dispatcher)
        .call_tool("summarize_run".to_string(), args, ctx)
        .await
}

#[tokio::test]
#[serial]
async fn summarize_run_returns_the_model_narrative() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_string_contains("test-model"))
        // The structured summary rides in the user message.
        .and(body_string_contains("workflow_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Both tasks completed cleanly; nothing to investigate."
                }
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = temp_env::async_with_vars(
        narrator_env(mock_server.uri()),
        call_narrator(json!({"workflow_id": "wf", "counts": {"ok": 2, "failed": 0}})),
    )
    .await;

    assert!(envelope.is_ok(), "envelope: {:?}", envelope.to_value());
    assert_eq!(
        envelope.data.unwrap()["narrative"],
        "Both tasks completed cleanly; nothing to investigate."
    );
}

#[tokio::test]
#[serial]
async fn summarize_run_surfaces_non_2xx_as_execution_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "upstream overloaded"}
        })))
        .mount(&mock_server)
        .await;

    let envelope = temp_env::async_with_vars(
        narrator_env(mock_server.uri()),
        call_narrator(json!({"workflow_id": "wf"})),
    )
    .await;

    assert!(!envelope.is_ok());
    assert_eq!(envelope.code.as_deref(), Some("ExecutionError"));
    assert!(
        envelope.message.as_deref().unwrap_or("").contains("500"),
        "message: {:?}",
        envelope.message
    );
}

#[tokio::test]
#[serial]
async fn summarize_run_rejects_response_without_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let envelope = temp_env::async_with_vars(
        narrator_env(mock_server.uri()),
        call_narrator(json!({"workflow_id": "wf"})),
    )
    .await;

    assert!(!envelope.is_ok());
    assert_eq!(envelope.code.as_deref(), Some("ExecutionError"));
    assert!(
        envelope.message.as_deref().unwrap_or("").contains("no content"),
        "message: {:?}",
        envelope.message
    );
}

#[tokio::test]
#[serial]
async fn narrator_is_not_registered_without_an_api_key() {
    temp_env::async_with_vars([("OPENAI_API_KEY", None::<String>)], async {
        let entries = splunk_mcp_server::tools::core_entries();
        assert!(entries.iter().all(|e| e.metadata.name != "summarize_run"));
    })
    .await;
}

#[tokio::test]
#[serial]
async fn workflow_run_falls_back_to_template_when_narrator_fails() {
    let mock_server = MockServer::start().await;

    // A failing narrator must not block the structured result.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "quota exceeded"}
        })))
        .mount(&mock_server)
        .await;

    let workflow: WorkflowDefinition = serde_json::from_value(json!({
        "id": "tiny",
        "description": "one echo",
        "tasks": [{"task_id": "only", "tool": "echo", "arguments": {"ok": true}}]
    }))
    .unwrap();

    let envelope = temp_env::async_with_vars(narrator_env(mock_server.uri()), async {
        let mut entries = splunk_mcp_server::tools::core_entries();
        entries.push(ComponentEntry::tool(tool_metadata("echo", false), || EchoTool));
        entries.push(ComponentEntry::workflow(
            ComponentMetadata::new("tiny", "one echo", "workflow", false, Origin::Core, "tests/tiny"),
            workflow,
        ));
        let dispatcher = dispatcher_with(entries);
        let ctx = context_with(&dispatcher, Default::default());

        let mut args = serde_json::Map::new();
        args.insert("workflow".to_string(), json!("tiny"));
        Arc::clone(&dispatcher)
            .call_tool("run_workflow".to_string(), args, ctx)
            .await
    })
    .await;

    assert!(envelope.is_ok(), "envelope: {:?}", envelope.to_value());
    let data = envelope.data.unwrap();
    assert_eq!(data["counts"]["ok"], 1);
    // Deterministic fallback narrative plus the narrator's failure reason.
    assert!(data["narrative"].as_str().unwrap().contains("tiny"));
    assert!(
        data["narrative_error"].as_str().unwrap().contains("500"),
        "narrative_error: {}",
        data["narrative_error"]
    );
}
