//! Core prompts.

use async_trait::async_trait;

use crate::context::InvocationContext;
use crate::error::Result;
use crate::registry::{
    ArgObject, ComponentEntry, ComponentMetadata, Origin, PromptArgSpec, PromptHandler,
};

fn arg_or<'a>(args: &'a ArgObject, name: &str, fallback: &'a str) -> &'a str {
    args.get(name)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(fallback)
}

/// Guides an assistant through triaging one index.
struct TroubleshootIndex;

#[async_trait]
impl PromptHandler for TroubleshootIndex {
    async fn render(&mut self, _ctx: &InvocationContext, args: ArgObject) -> Result<String> {
        let index = arg_or(&args, "index", "main");
        let earliest = arg_or(&args, "earliest_time", "-24h");

        Ok(format!(
            "You are troubleshooting the Splunk index '{index}'.\n\
             \n\
             Work through these steps with the available tools:\n\
             1. Call list_indexes and confirm '{index}' exists and is enabled.\n\
             2. Read splunk://indexes/{index} and note event counts and time bounds.\n\
             3. Call run_splunk_search with query \"index={index} | stats count by sourcetype\" \
             and earliest_time \"{earliest}\" to see what is arriving.\n\
             4. If counts are zero, call run_splunk_search over index=_internal to look for \
             blocked queues or forwarder errors mentioning '{index}'.\n\
             5. Summarise what you found and the most likely cause."
        ))
    }
}

/// Helps an assistant turn an intent into an SPL query.
struct SplBuilder;

#[async_trait]
impl PromptHandler for SplBuilder {
    async fn render(&mut self, _ctx: &InvocationContext, args: ArgObject) -> Result<String> {
        let intent = arg_or(&args, "intent", "find errors in the last hour");

        Ok(format!(
            "Write an SPL query for this goal: {intent}.\n\
             \n\
             Rules:\n\
             - Start from the narrowest index and time range that can answer the question.\n\
             - Prefer tstats over raw searches when only counts are needed.\n\
             - Show the final query alone in a code block, then explain each pipe stage \
             in one sentence.\n\
             - If the goal is ambiguous, state your assumption before the query."
        ))
    }
}

/// Core prompt entries.
pub fn core_entries() -> Vec<ComponentEntry> {
    vec![
        ComponentEntry::prompt(
            ComponentMetadata::new(
                "troubleshoot_index",
                "Step-by-step triage plan for one Splunk index",
                "troubleshooting",
                false,
                Origin::Core,
                "prompts.rs",
            )
            .with_prompt_args(vec![
                PromptArgSpec {
                    name: "index",
                    description: "Index to troubleshoot",
                    required: true,
                },
                PromptArgSpec {
                    name: "earliest_time",
                    description: "How far back to look (default -24h)",
                    required: false,
                },
            ]),
            || TroubleshootIndex,
        ),
        ComponentEntry::prompt(
            ComponentMetadata::new(
                "spl_builder",
                "Turn a natural-language intent into a well-formed SPL query",
                "search",
                false,
                Origin::Core,
                "prompts.rs",
            )
            .with_prompt_args(vec![PromptArgSpec {
                name: "intent",
                description: "What the query should find",
                required: true,
            }]),
            || SplBuilder,
        ),
    ]
}
