//! The `get_splunk_health` tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::InvocationContext;
use crate::error::Result;
use crate::registry::{ArgObject, ComponentEntry, ComponentMetadata, Origin, ToolHandler};

struct GetSplunkHealth;

#[async_trait]
impl ToolHandler for GetSplunkHealth {
    async fn execute(&mut self, ctx: &InvocationContext, _args: ArgObject) -> Result<Value> {
        let session = ctx.pool.acquire(&ctx.config).await?;
        let report = session.client().await.health().await?;
        ctx.pool.release(&session);

        Ok(json!({
            "health": report.health,
            "features": report.features,
        }))
    }
}

/// Registry entry for the health tool.
pub fn entry() -> ComponentEntry {
    let metadata = ComponentMetadata::new(
        "get_splunk_health",
        "Fetch the splunkd health report with per-feature status colors",
        "health",
        true,
        Origin::Core,
        "tools/health.rs",
    )
    .with_tags(&["health", "splunkd"]);
    ComponentEntry::tool(metadata, || GetSplunkHealth)
}
