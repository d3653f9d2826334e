//! The `list_apps` tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::InvocationContext;
use crate::error::Result;
use crate::registry::{ArgObject, ComponentEntry, ComponentMetadata, Origin, ParamSpec, ParamType, ToolHandler};
use crate::tools::arg_u64;

struct ListApps;

#[async_trait]
impl ToolHandler for ListApps {
    async fn execute(&mut self, ctx: &InvocationContext, args: ArgObject) -> Result<Value> {
        let count = arg_u64(&args, "count");

        let session = ctx.pool.acquire(&ctx.config).await?;
        let apps = session.client().await.list_apps(count).await?;
        ctx.pool.release(&session);

        Ok(json!({
            "count": apps.len(),
            "apps": apps,
        }))
    }
}

/// Registry entry for the app listing tool.
pub fn entry() -> ComponentEntry {
    let metadata = ComponentMetadata::new(
        "list_apps",
        "List apps installed on the resolved Splunk instance",
        "metadata",
        true,
        Origin::Core,
        "tools/apps.rs",
    )
    .with_tags(&["apps", "metadata"])
    .with_params(vec![ParamSpec::optional(
        "count",
        ParamType::Integer,
        None,
        "Maximum number of apps to return (0 for all)",
    )]);
    ComponentEntry::tool(metadata, || ListApps)
}
