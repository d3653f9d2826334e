//! Community-supplied tools.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::InvocationContext;
use crate::error::Result;
use crate::registry::{ArgObject, ComponentEntry, ComponentMetadata, Origin, ToolHandler};

struct GetServerInfo;

#[async_trait]
impl ToolHandler for GetServerInfo {
    async fn execute(&mut self, ctx: &InvocationContext, _args: ArgObject) -> Result<Value> {
        let session = ctx.pool.acquire(&ctx.config).await?;
        let info = session.client().await.server_info().await?;
        ctx.pool.release(&session);

        Ok(json!({
            "server_name": info.server_name,
            "version": info.version,
            "build": info.build,
            "os_name": info.os_name,
            "license_state": info.license_state,
        }))
    }
}

/// Registry entry for the server info tool.
pub fn server_info_entry() -> ComponentEntry {
    let metadata = ComponentMetadata::new(
        "get_server_info",
        "Fetch version, build, and platform details of the resolved Splunk instance",
        "system",
        true,
        Origin::Contrib,
        "tools/contrib.rs",
    )
    .with_tags(&["system", "info"]);
    ComponentEntry::tool(metadata, || GetServerInfo)
}
