//! Dispatch and envelope tests: the call_tool invocation path, resource
//! template binding, prompt rendering, and multi-tenant isolation.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use splunk_config::{ConfigField, ConfigSource, SplunkConfig};
use splunk_mcp_server::context::InvocationContext;
use splunk_mcp_server::error::Result as ServerResult;
use splunk_mcp_server::registry::{
    ComponentEntry, ComponentMetadata, Origin, PromptArgSpec, ResourceHandler,
};

use common::{
    config_for, context_with, dispatcher_with, tool_metadata, tool_metadata_with_query, EchoTool,
    StaticTool,
};

#[tokio::test]
async fn unknown_tool_returns_not_found_envelope() {
    let dispatcher = dispatcher_with(Vec::new());
    let ctx = context_with(&dispatcher, Default::default());

    let envelope = Arc::clone(&dispatcher)
        .call_tool("ghost".to_string(), serde_json::Map::new(), ctx)
        .await;

    let value = envelope.to_value();
    assert_eq!(value["status"], "error");
    assert_eq!(value["code"], "NotFound");
    assert!(value["message"].as_str().unwrap().contains("ghost"));
    // Exactly one of data / code+message.
    assert!(value.get("data").is_none());
}

#[tokio::test]
async fn invalid_args_carry_per_field_reasons() {
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata_with_query("needs_query"),
        || EchoTool,
    )]);
    let ctx = context_with(&dispatcher, Default::default());

    let envelope = Arc::clone(&dispatcher)
        .call_tool("needs_query".to_string(), serde_json::Map::new(), ctx)
        .await;

    let value = envelope.to_value();
    assert_eq!(value["code"], "InvalidArgs");
    assert_eq!(value["details"]["query"], "required argument is missing");
}

#[tokio::test]
async fn splunk_tool_without_usable_config_is_config_missing() {
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata("needs_splunk", true),
        || StaticTool(json!({"unreachable": true})),
    )]);
    let ctx = context_with(&dispatcher, SplunkConfig::default());

    let envelope = Arc::clone(&dispatcher)
        .call_tool("needs_splunk".to_string(), serde_json::Map::new(), ctx)
        .await;

    let value = envelope.to_value();
    assert_eq!(value["status"], "error");
    assert_eq!(value["code"], "ConfigMissing");
}

#[tokio::test]
async fn success_envelope_carries_meta() {
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata("pure", false),
        || StaticTool(json!({"answer": 42})),
    )]);

    let mut ctx = context_with(&dispatcher, Default::default());
    ctx.source_map
        .record(ConfigField::Host, ConfigSource::Header);

    let envelope = Arc::clone(&dispatcher)
        .call_tool("pure".to_string(), serde_json::Map::new(), ctx)
        .await;

    let value = envelope.to_value();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["data"]["answer"], 42);
    assert!(value["meta"]["duration_ms"].is_u64());
    assert!(value["meta"]["client_id"].as_str().unwrap().starts_with("stdio-"));
    assert_eq!(value["meta"]["config_source_map"]["host"], "header");
    assert!(value.get("code").is_none());
}

#[tokio::test]
async fn pure_tool_is_idempotent_across_calls() {
    let dispatcher = dispatcher_with(vec![ComponentEntry::tool(
        tool_metadata("pure", false),
        || StaticTool(json!({"answer": 42})),
    )]);

    let first = Arc::clone(&dispatcher)
        .call_tool(
            "pure".to_string(),
            serde_json::Map::new(),
            context_with(&dispatcher, Default::default()),
        )
        .await;
    let second = Arc::clone(&dispatcher)
        .call_tool(
            "pure".to_string(),
            serde_json::Map::new(),
            context_with(&dispatcher, Default::default()),
        )
        .await;

    // Identical data; only meta.duration_ms may differ.
    assert_eq!(first.data, second.data);
}

#[tokio::test]
async fn multi_tenant_isolation_keeps_fingerprints_apart() {
    // Two tenants, two Splunk instances.
    let splunk_a = MockServer::start().await;
    let splunk_b = MockServer::start().await;
    for server in [&splunk_a, &splunk_b] {
        Mock::given(method("GET"))
            .and(path("/services/server/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entry": [{"name": "i", "content": {"serverName": "s", "version": "9"}}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/services/data/indexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entry": [{"name": "main", "content": {"totalEventCount": 1}}]
            })))
            .mount(server)
            .await;
    }

    let dispatcher = dispatcher_with(splunk_mcp_server::tools::core_entries());

    let mut ctx_a = context_with(&dispatcher, config_for(&splunk_a.uri()));
    ctx_a.source_map.record(ConfigField::Host, ConfigSource::Header);
    let mut ctx_b = context_with(&dispatcher, config_for(&splunk_b.uri()));
    ctx_b.source_map.record(ConfigField::Host, ConfigSource::Header);

    let (env_a, env_b) = tokio::join!(
        Arc::clone(&dispatcher).call_tool(
            "list_indexes".to_string(),
            serde_json::Map::new(),
            ctx_a
        ),
        Arc::clone(&dispatcher).call_tool(
            "list_indexes".to_string(),
            serde_json::Map::new(),
            ctx_b
        ),
    );

    let value_a = env_a.to_value();
    let value_b = env_b.to_value();
    assert_eq!(value_a["status"], "ok", "{value_a}");
    assert_eq!(value_b["status"], "ok", "{value_b}");
    assert_eq!(value_a["meta"]["config_source_map"]["host"], "header");
    assert_eq!(value_b["meta"]["config_source_map"]["host"], "header");

    // Two live sessions with distinct fingerprints.
    assert_eq!(dispatcher.pool().len(), 2);
}

/// Resource handler that reports its binding.
struct BindingResource;

#[async_trait]
impl ResourceHandler for BindingResource {
    async fn read(
        &mut self,
        _ctx: &InvocationContext,
        binding: HashMap<String, String>,
    ) -> ServerResult<Value> {
        Ok(json!({ "binding": binding }))
    }
}

fn resource_entry(name: &str, uri: &str) -> ComponentEntry {
    ComponentEntry::resource(
        ComponentMetadata::new(
            name,
            format!("resource {name}"),
            "system",
            false,
            Origin::Core,
            format!("tests/{name}"),
        )
        .with_uri(uri),
        || BindingResource,
    )
}

#[tokio::test]
async fn resource_templates_match_longest_specific_wins() {
    let dispatcher = dispatcher_with(vec![
        resource_entry("by_template", "splunk://indexes/{name}"),
        resource_entry("exact_main", "splunk://indexes/main"),
    ]);
    let ctx = context_with(&dispatcher, Default::default());

    // The exact URI beats the template.
    let envelope = dispatcher.read_resource("splunk://indexes/main", &ctx).await;
    let value = envelope.to_value();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["data"]["binding"], json!({}));

    // Other names fall through to the template with a binding.
    let envelope = dispatcher
        .read_resource("splunk://indexes/_internal", &ctx)
        .await;
    let value = envelope.to_value();
    assert_eq!(value["data"]["binding"]["name"], "_internal");

    // Nothing matches entirely different URIs.
    let envelope = dispatcher.read_resource("splunk://nope", &ctx).await;
    assert_eq!(envelope.to_value()["code"], "NotFound");
}

#[tokio::test]
async fn prompts_render_and_enforce_required_args() {
    let dispatcher = dispatcher_with(splunk_mcp_server::prompts::core_entries());
    let ctx = context_with(&dispatcher, Default::default());

    let mut args = serde_json::Map::new();
    args.insert("index".to_string(), json!("web"));
    let rendered = dispatcher
        .render_prompt("troubleshoot_index", Some(&args), &ctx)
        .await
        .expect("render");
    assert!(rendered.contains("'web'"));

    let err = dispatcher
        .render_prompt("troubleshoot_index", None, &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "InvalidArgs");

    let err = dispatcher
        .render_prompt("no_such_prompt", None, &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NotFound");
}

#[tokio::test]
async fn prompt_metadata_lists_arguments() {
    let entries = splunk_mcp_server::prompts::core_entries();
    let troubleshoot = entries
        .iter()
        .find(|e| e.metadata.name == "troubleshoot_index")
        .expect("prompt exists");
    let names: Vec<&str> = troubleshoot
        .metadata
        .prompt_args
        .iter()
        .map(|a: &PromptArgSpec| a.name)
        .collect();
    assert_eq!(names, vec!["index", "earliest_time"]);
}
