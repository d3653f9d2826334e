//! The `list_indexes` tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::InvocationContext;
use crate::error::Result;
use crate::registry::{ArgObject, ComponentEntry, ComponentMetadata, Origin, ParamSpec, ParamType, ToolHandler};
use crate::tools::arg_u64;

struct ListIndexes;

#[async_trait]
impl ToolHandler for ListIndexes {
    async fn execute(&mut self, ctx: &InvocationContext, args: ArgObject) -> Result<Value> {
        let count = arg_u64(&args, "count");

        let session = ctx.pool.acquire(&ctx.config).await?;
        let indexes = session.client().await.list_indexes(count).await?;
        ctx.pool.release(&session);

        Ok(json!({
            "count": indexes.len(),
            "indexes": indexes,
        }))
    }
}

/// Registry entry for the index listing tool.
pub fn entry() -> ComponentEntry {
    let metadata = ComponentMetadata::new(
        "list_indexes",
        "List indexes on the resolved Splunk instance with event counts and sizes",
        "metadata",
        true,
        Origin::Core,
        "tools/indexes.rs",
    )
    .with_tags(&["indexes", "metadata"])
    .with_params(vec![ParamSpec::optional(
        "count",
        ParamType::Integer,
        Some(json!(30)),
        "Maximum number of indexes to return",
    )]);
    ComponentEntry::tool(metadata, || ListIndexes)
}
