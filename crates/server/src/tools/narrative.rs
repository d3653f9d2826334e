//! The optional `summarize_run` LLM narrator.
//!
//! Registered only when `OPENAI_API_KEY` is present; the workflow engine
//! treats its absence (and its failures) as non-fatal and falls back to a
//! deterministic narrative.

use async_trait::async_trait;
use serde_json::{json, Value};

use splunk_config::env_var_or_none;

use crate::context::InvocationContext;
use crate::error::{Result, ServerError};
use crate::registry::{ArgObject, ComponentEntry, ComponentMetadata, Origin, ParamSpec, ParamType, ToolHandler};

/// Env var that enables the narrator.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f64 = 0.2;
const DEFAULT_MAX_TOKENS: u64 = 500;

/// Whether the narrator can run in this process.
pub fn is_configured() -> bool {
    env_var_or_none(OPENAI_API_KEY_VAR).is_some()
}

struct SummarizeRun;

#[async_trait]
impl ToolHandler for SummarizeRun {
    async fn execute(&mut self, _ctx: &InvocationContext, args: ArgObject) -> Result<Value> {
        let summary = args
            .get("summary")
            .cloned()
            .ok_or_else(|| ServerError::InvalidArgs {
                message: "argument 'summary' is required".to_string(),
                details: None,
            })?;

        let api_key = env_var_or_none(OPENAI_API_KEY_VAR).ok_or_else(|| {
            ServerError::ExecutionError("OPENAI_API_KEY is not set".to_string())
        })?;
        let base_url =
            env_var_or_none("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = env_var_or_none("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let temperature = env_var_or_none("OPENAI_TEMPERATURE")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);
        let max_tokens = env_var_or_none("OPENAI_MAX_TOKENS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let body = json!({
            "model": model,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "messages": [
                {
                    "role": "system",
                    "content": "You summarise Splunk troubleshooting workflow runs. \
                                Given the structured run result, write a short plain-text \
                                narrative: what ran, what failed, and what to look at next."
                },
                {
                    "role": "user",
                    "content": summary.to_string()
                }
            ]
        });

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ServerError::ExecutionError(e.to_string()))?;

        let response = client
            .post(format!("{}/chat/completions", base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServerError::ExecutionError(format!("narrator request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(ServerError::ExecutionError(format!(
                "narrator returned status {status}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ServerError::ExecutionError(format!("narrator response invalid: {e}")))?;

        let narrative = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ServerError::ExecutionError("narrator response has no content".to_string())
            })?;

        Ok(json!({ "narrative": narrative }))
    }
}

/// Registry entry for the narrator tool.
pub fn entry() -> ComponentEntry {
    let metadata = ComponentMetadata::new(
        "summarize_run",
        "Turn a structured workflow run summary into a short narrative using \
         the configured OpenAI model",
        "llm",
        false,
        Origin::Core,
        "tools/narrative.rs",
    )
    .with_tags(&["llm", "summary"])
    .with_params(vec![ParamSpec::required(
        "summary",
        ParamType::Object,
        "Structured workflow run summary",
    )]);
    ComponentEntry::tool(metadata, || SummarizeRun)
}
