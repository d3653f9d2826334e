//! The `run_splunk_search` tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use splunk_client::models::SearchOptions;

use crate::context::InvocationContext;
use crate::error::Result;
use crate::registry::{ArgObject, ComponentEntry, ComponentMetadata, Origin, ParamSpec, ParamType, ToolHandler};
use crate::tools::{arg_u64, arg_str, require_str};

/// Runs an SPL search and returns the result rows.
struct RunSplunkSearch;

#[async_trait]
impl ToolHandler for RunSplunkSearch {
    async fn execute(&mut self, ctx: &InvocationContext, args: ArgObject) -> Result<Value> {
        let query = require_str(&args, "query")?;
        let options = SearchOptions {
            earliest_time: arg_str(&args, "earliest_time").map(|s| s.to_string()),
            latest_time: arg_str(&args, "latest_time").map(|s| s.to_string()),
            max_results: arg_u64(&args, "max_results"),
        };

        let session = ctx.pool.acquire(&ctx.config).await?;
        let results = session.client().await.search(query, &options).await?;
        ctx.pool.release(&session);

        Ok(json!({
            "query": query,
            "count": results.len(),
            "results": results,
        }))
    }
}

/// Registry entry for the search tool.
pub fn entry() -> ComponentEntry {
    let metadata = ComponentMetadata::new(
        "run_splunk_search",
        "Run an SPL search against the resolved Splunk instance and return \
         matching events when the job completes",
        "search",
        true,
        Origin::Core,
        "tools/search.rs",
    )
    .with_tags(&["search", "spl"])
    .with_params(vec![
        ParamSpec::required("query", ParamType::String, "SPL query to execute"),
        ParamSpec::optional(
            "earliest_time",
            ParamType::String,
            Some(json!("-24h")),
            "Earliest time bound (e.g. -24h)",
        ),
        ParamSpec::optional(
            "latest_time",
            ParamType::String,
            Some(json!("now")),
            "Latest time bound (e.g. now)",
        ),
        ParamSpec::optional(
            "max_results",
            ParamType::Integer,
            Some(json!(100)),
            "Maximum number of result rows",
        ),
    ]);
    ComponentEntry::tool(metadata, || RunSplunkSearch)
}
