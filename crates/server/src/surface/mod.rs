//! MCP surface binder.
//!
//! Adapts the component registry to the MCP protocol via the official
//! `rmcp` SDK and serves as the single dispatch entry point. Every
//! invocation resolves its own Splunk config, flows through the
//! [`Dispatcher`], and returns the standard envelope as its payload; MCP
//! protocol errors are reserved for protocol faults (unknown resource or
//! prompt names in listings, malformed requests).

pub mod dispatch;
pub mod uri;
pub mod validate;

use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    AnnotateAble, CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam,
    GetPromptResult, ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult,
    ListToolsResult, PaginatedRequestParam, Prompt, PromptArgument, PromptMessage,
    PromptMessageRole, RawResource, RawResourceTemplate, ReadResourceRequestParam,
    ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData as McpError;
use tracing::debug;
use uuid::Uuid;

use splunk_config::ConfigError;

use crate::context::{InvocationContext, TransportKind};
use crate::registry::{ArgObject, ComponentKind};
use crate::resolve::{self, ResolveInputs, Resolution};

pub use dispatch::Dispatcher;

/// HTTP request parts stored in rmcp extensions by the streamable HTTP
/// transport.
type HttpParts = http::request::Parts;

/// Header carrying the transport-assigned session identity.
const SESSION_ID_HEADER: &str = "mcp-session-id";

/// The MCP server handler bound to a populated registry.
#[derive(Clone)]
pub struct SplunkMcpServer {
    dispatcher: Arc<Dispatcher>,
    transport: TransportKind,
    /// Synthetic identity for stdio sessions, minted once per process.
    process_id: String,
}

impl SplunkMcpServer {
    /// Create a handler for the given transport.
    pub fn new(dispatcher: Arc<Dispatcher>, transport: TransportKind) -> Self {
        Self {
            dispatcher,
            transport,
            process_id: Uuid::new_v4().to_string(),
        }
    }

    /// The dispatcher, for tests and the workflow engine.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Resolve config and identity for the current request.
    fn resolution(
        &self,
        extensions: &rmcp::model::Extensions,
        args: Option<&ArgObject>,
    ) -> Result<Resolution, ConfigError> {
        let parts = extensions.get::<HttpParts>();
        let headers = parts.map(|p| &p.headers);
        let session_id = headers.and_then(|h| {
            h.get(SESSION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|s| !s.is_empty())
        });

        resolve::resolve(&ResolveInputs {
            transport: self.transport,
            headers,
            session_id,
            args,
            process_id: &self.process_id,
        })
    }

    /// Build the per-invocation context from a resolution.
    fn invocation_context(
        &self,
        resolution: Resolution,
        cancel: tokio_util::sync::CancellationToken,
    ) -> InvocationContext {
        InvocationContext {
            identity: resolution.identity,
            config: resolution.config,
            source_map: resolution.source_map,
            cancel,
            pool: Arc::clone(self.dispatcher.pool()),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

fn envelope_content(envelope: &crate::envelope::Envelope) -> Vec<Content> {
    let text = serde_json::to_string_pretty(&envelope.to_value())
        .unwrap_or_else(|_| r#"{"status":"error","code":"Internal"}"#.to_string());
    vec![Content::text(text)]
}

impl ServerHandler for SplunkMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            instructions: Some(
                "Splunk MCP server: tools, resources, prompts, and multi-phase \
                 troubleshooting workflows against Splunk Enterprise or Cloud. \
                 Supply connection details per request via tool arguments, \
                 X-Splunk-* headers, or SPLUNK_* environment variables."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools: Vec<Tool> = self
            .dispatcher
            .registry()
            .list(ComponentKind::Tool, None)
            .into_iter()
            .map(|entry| {
                Tool::new(
                    entry.metadata.name.clone(),
                    entry.metadata.description.clone(),
                    Arc::new(entry.metadata.params_json_schema()),
                )
            })
            .collect();

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name = request.name.to_string();
        let args = request.arguments.unwrap_or_default();
        debug!(tool = %name, "MCP tool call");

        let resolution = match self.resolution(&context.extensions, Some(&args)) {
            Ok(resolution) => resolution,
            Err(e) => {
                // Bad config values are invocation failures, not protocol faults.
                let err = crate::error::ServerError::from(e);
                let envelope = crate::envelope::Envelope::error(&err, None);
                return Ok(CallToolResult::error(envelope_content(&envelope)));
            }
        };

        let ctx = self.invocation_context(resolution, context.ct.child_token());
        let envelope = Arc::clone(&self.dispatcher)
            .call_tool(name, args, ctx)
            .await;

        let content = envelope_content(&envelope);
        if envelope.is_ok() {
            Ok(CallToolResult::success(content))
        } else {
            Ok(CallToolResult::error(content))
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self
            .dispatcher
            .registry()
            .list(ComponentKind::Resource, None)
            .into_iter()
            .filter_map(|entry| {
                let pattern = entry.metadata.uri.clone()?;
                let template = uri::UriTemplate::parse(&pattern).ok()?;
                if template.is_templated() {
                    return None;
                }
                let mut raw = RawResource::new(pattern, entry.metadata.name.clone());
                raw.description = Some(entry.metadata.description.clone());
                raw.mime_type = Some("application/json".to_string());
                Some(raw.no_annotation())
            })
            .collect();

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            ..Default::default()
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let resource_templates = self
            .dispatcher
            .registry()
            .list(ComponentKind::Resource, None)
            .into_iter()
            .filter_map(|entry| {
                let pattern = entry.metadata.uri.clone()?;
                let template = uri::UriTemplate::parse(&pattern).ok()?;
                if !template.is_templated() {
                    return None;
                }
                Some(
                    RawResourceTemplate {
                        uri_template: pattern,
                        name: entry.metadata.name.clone(),
                        title: None,
                        description: Some(entry.metadata.description.clone()),
                        mime_type: Some("application/json".to_string()),
                        icons: None,
                    }
                    .no_annotation(),
                )
            })
            .collect();

        Ok(ListResourceTemplatesResult {
            resource_templates,
            next_cursor: None,
            ..Default::default()
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let uri = request.uri.to_string();
        debug!(%uri, "MCP resource read");

        let resolution = self
            .resolution(&context.extensions, None)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let ctx = self.invocation_context(resolution, context.ct.child_token());

        let envelope = self.dispatcher.read_resource(&uri, &ctx).await;
        if envelope.code.as_deref() == Some("NotFound") {
            return Err(McpError::resource_not_found(
                format!("unknown resource '{uri}'"),
                None,
            ));
        }

        let text = serde_json::to_string_pretty(&envelope.to_value())
            .unwrap_or_else(|_| r#"{"status":"error","code":"Internal"}"#.to_string());
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        let prompts = self
            .dispatcher
            .registry()
            .list(ComponentKind::Prompt, None)
            .into_iter()
            .map(|entry| {
                let arguments: Vec<PromptArgument> = entry
                    .metadata
                    .prompt_args
                    .iter()
                    .map(|arg| PromptArgument {
                        name: arg.name.to_string(),
                        title: None,
                        description: Some(arg.description.to_string()),
                        required: Some(arg.required),
                    })
                    .collect();
                Prompt::new(
                    entry.metadata.name.clone(),
                    Some(entry.metadata.description.clone()),
                    Some(arguments),
                )
            })
            .collect();

        Ok(ListPromptsResult {
            prompts,
            next_cursor: None,
            ..Default::default()
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let name = request.name.to_string();
        debug!(prompt = %name, "MCP prompt render");

        let args: Option<ArgObject> = request.arguments;

        let resolution = self
            .resolution(&context.extensions, None)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let ctx = self.invocation_context(resolution, context.ct.child_token());

        let entry = self
            .dispatcher
            .registry()
            .lookup(ComponentKind::Prompt, &name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown prompt '{name}'"), None))?;

        let rendered = self
            .dispatcher
            .render_prompt(&name, args.as_ref(), &ctx)
            .await
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        Ok(GetPromptResult {
            description: Some(entry.metadata.description.clone()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, rendered)],
        })
    }
}
