//! The single dispatch entry point for component invocations.
//!
//! Both the MCP surface and the workflow engine route calls through the
//! [`Dispatcher`], so child invocations behave exactly like direct ones.
//! Dispatch is stateless beyond the registry and session pool, which makes
//! re-entrancy (a handler calling back in) safe.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::context::InvocationContext;
use crate::envelope::{Envelope, EnvelopeMeta};
use crate::error::ServerError;
use crate::pool::SessionPool;
use crate::registry::{ArgObject, ComponentKind, ComponentRegistry, HandlerFactory};
use crate::surface::uri::UriTemplate;
use crate::surface::validate;

/// Shared dispatch state: the frozen registry and the session pool.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ComponentRegistry>,
    pool: Arc<SessionPool>,
    max_parallel: usize,
}

impl Dispatcher {
    /// Build a dispatcher over a populated registry.
    pub fn new(
        registry: Arc<ComponentRegistry>,
        pool: Arc<SessionPool>,
        max_parallel: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            pool,
            max_parallel,
        })
    }

    /// The component registry.
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// The session pool.
    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.pool
    }

    /// Bound on parallel tasks within one workflow phase.
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Invoke a tool by name and wrap the outcome in the envelope.
    ///
    /// Boxed so the workflow engine can recurse through the dispatcher
    /// without an infinitely-sized future.
    pub fn call_tool(
        self: Arc<Self>,
        name: String,
        args: ArgObject,
        ctx: InvocationContext,
    ) -> BoxFuture<'static, Envelope> {
        Box::pin(async move {
            let start = Instant::now();
            let meta = |start: Instant| EnvelopeMeta {
                duration_ms: start.elapsed().as_millis() as u64,
                client_id: ctx.identity.to_string(),
                config_source_map: ctx.source_map.to_json(),
            };

            let Some(entry) = self.registry.lookup(ComponentKind::Tool, &name) else {
                return Envelope::error(
                    &ServerError::NotFound(format!("tool '{name}'")),
                    Some(meta(start)),
                );
            };

            let validated = match validate::validate_tool_args(&entry.metadata, Some(&args)) {
                Ok(validated) => validated,
                Err(err) => return Envelope::error(&err, Some(meta(start))),
            };

            if entry.metadata.requires_splunk && !ctx.config.is_usable() {
                return Envelope::error(
                    &ServerError::ConfigMissing(format!(
                        "tool '{name}' requires a Splunk connection; supply host and credentials \
                         via arguments, X-Splunk-* headers, or SPLUNK_* environment variables"
                    )),
                    Some(meta(start)),
                );
            }

            let HandlerFactory::Tool(factory) = &entry.factory else {
                return Envelope::error(
                    &ServerError::Internal(format!("'{name}' is not a tool entry")),
                    Some(meta(start)),
                );
            };

            debug!(tool = %name, client = %ctx.identity, "dispatching tool");
            // Fresh handler per invocation; per-call state stays local.
            let mut handler = factory();
            let result = tokio::select! {
                result = handler.execute(&ctx, validated) => result,
                () = ctx.cancel.cancelled() => {
                    Err(ServerError::Cancelled(format!("tool '{name}' cancelled")))
                }
            };

            match result {
                Ok(data) => Envelope::ok(data, meta(start)),
                Err(err) => {
                    warn!(tool = %name, code = err.code(), "tool invocation failed");
                    Envelope::error(&err, Some(meta(start)))
                }
            }
        })
    }

    /// Read a resource by URI, binding templates longest-specific-wins.
    pub async fn read_resource(
        self: &Arc<Self>,
        uri: &str,
        ctx: &InvocationContext,
    ) -> Envelope {
        let start = Instant::now();
        let meta = EnvelopeMeta {
            duration_ms: 0,
            client_id: ctx.identity.to_string(),
            config_source_map: ctx.source_map.to_json(),
        };

        let Some((entry, binding)) = self.match_resource(uri) else {
            return Envelope::error(
                &ServerError::NotFound(format!("resource '{uri}'")),
                Some(meta),
            );
        };

        if entry.metadata.requires_splunk && !ctx.config.is_usable() {
            return Envelope::error(
                &ServerError::ConfigMissing(format!(
                    "resource '{uri}' requires a Splunk connection"
                )),
                Some(meta),
            );
        }

        let HandlerFactory::Resource(factory) = &entry.factory else {
            return Envelope::error(
                &ServerError::Internal(format!("'{uri}' is not a resource entry")),
                Some(meta),
            );
        };

        let mut handler = factory();
        let result = tokio::select! {
            result = handler.read(ctx, binding) => result,
            () = ctx.cancel.cancelled() => {
                Err(ServerError::Cancelled(format!("resource '{uri}' cancelled")))
            }
        };

        let meta = EnvelopeMeta {
            duration_ms: start.elapsed().as_millis() as u64,
            client_id: ctx.identity.to_string(),
            config_source_map: ctx.source_map.to_json(),
        };
        match result {
            Ok(data) => Envelope::ok(data, meta),
            Err(err) => Envelope::error(&err, Some(meta)),
        }
    }

    /// Render a prompt by name.
    pub async fn render_prompt(
        self: &Arc<Self>,
        name: &str,
        args: Option<&ArgObject>,
        ctx: &InvocationContext,
    ) -> Result<String, ServerError> {
        let entry = self
            .registry
            .lookup(ComponentKind::Prompt, name)
            .ok_or_else(|| ServerError::NotFound(format!("prompt '{name}'")))?;

        let validated = validate::validate_prompt_args(&entry.metadata, args)?;

        let HandlerFactory::Prompt(factory) = &entry.factory else {
            return Err(ServerError::Internal(format!("'{name}' is not a prompt entry")));
        };

        let mut handler = factory();
        handler.render(ctx, validated).await
    }

    /// Find the resource entry whose URI or template matches, preferring
    /// the match with the most literal characters.
    fn match_resource(
        &self,
        uri: &str,
    ) -> Option<(Arc<crate::registry::ComponentEntry>, HashMap<String, String>)> {
        let mut best: Option<(usize, Arc<crate::registry::ComponentEntry>, HashMap<String, String>)> =
            None;
        for entry in self.registry.list(ComponentKind::Resource, None) {
            let Some(pattern) = &entry.metadata.uri else {
                continue;
            };
            // Patterns were validated at discovery time.
            let Ok(template) = UriTemplate::parse(pattern) else {
                continue;
            };
            if let Some(binding) = template.bind(uri) {
                let specificity = template.specificity();
                let better = best
                    .as_ref()
                    .is_none_or(|(current, _, _)| specificity > *current);
                if better {
                    best = Some((specificity, entry, binding));
                }
            }
        }
        best.map(|(_, entry, binding)| (entry, binding))
    }
}
