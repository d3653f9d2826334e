//! Shared helpers for server integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use splunk_config::{ConfigField, SourceMap, SplunkConfig};
use splunk_mcp_server::context::{ClientIdentity, InvocationContext};
use splunk_mcp_server::error::{Result as ServerResult, ServerError};
use splunk_mcp_server::pool::SessionPool;
use splunk_mcp_server::registry::{
    ArgObject, ComponentEntry, ComponentMetadata, ComponentRegistry, Origin, ParamSpec, ParamType,
    ToolHandler,
};
use splunk_mcp_server::Dispatcher;

/// A usable config pointing at a wiremock Splunk on `base_url`.
pub fn config_for(base_url: &str) -> SplunkConfig {
    let url = url::Url::parse(base_url).expect("mock server uri");
    let mut config = SplunkConfig::default();
    config
        .set_field(ConfigField::Scheme, url.scheme(), "test")
        .unwrap();
    config
        .set_field(ConfigField::Host, url.host_str().unwrap(), "test")
        .unwrap();
    config
        .set_field(
            ConfigField::Port,
            &url.port().unwrap_or(8089).to_string(),
            "test",
        )
        .unwrap();
    config
        .set_field(ConfigField::Token, "test-token", "test")
        .unwrap();
    config
}

/// Build a dispatcher over the given entries (all registered as core).
pub fn dispatcher_with(entries: Vec<ComponentEntry>) -> Arc<Dispatcher> {
    let registry = Arc::new(ComponentRegistry::new());
    for entry in entries {
        registry.register(entry).expect("register test entry");
    }
    registry.freeze();
    Dispatcher::new(registry, Arc::new(SessionPool::new()), 8)
}

/// An invocation context bound to `dispatcher` with the given config.
pub fn context_with(dispatcher: &Arc<Dispatcher>, config: SplunkConfig) -> InvocationContext {
    InvocationContext {
        identity: ClientIdentity::synthetic("test"),
        config,
        source_map: SourceMap::new(),
        cancel: CancellationToken::new(),
        pool: Arc::clone(dispatcher.pool()),
        dispatcher: Arc::clone(dispatcher),
    }
}

/// A tool that returns a fixed value.
pub struct StaticTool(pub Value);

#[async_trait]
impl ToolHandler for StaticTool {
    async fn execute(&mut self, _ctx: &InvocationContext, _args: ArgObject) -> ServerResult<Value> {
        Ok(self.0.clone())
    }
}

/// A tool that always fails with `ExecutionError`.
pub struct FailingTool(pub &'static str);

#[async_trait]
impl ToolHandler for FailingTool {
    async fn execute(&mut self, _ctx: &InvocationContext, _args: ArgObject) -> ServerResult<Value> {
        Err(ServerError::ExecutionError(self.0.to_string()))
    }
}

/// A tool that echoes its arguments back as data.
pub struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    async fn execute(&mut self, _ctx: &InvocationContext, args: ArgObject) -> ServerResult<Value> {
        Ok(Value::Object(args))
    }
}

/// Metadata for a test tool with no declared parameters.
pub fn tool_metadata(name: &str, requires_splunk: bool) -> ComponentMetadata {
    ComponentMetadata::new(
        name,
        format!("test tool {name}"),
        "system",
        requires_splunk,
        Origin::Core,
        format!("tests/{name}"),
    )
}

/// Metadata for a test tool with one required string parameter.
pub fn tool_metadata_with_query(name: &str) -> ComponentMetadata {
    tool_metadata(name, false).with_params(vec![ParamSpec::required(
        "query",
        ParamType::String,
        "a query",
    )])
}
