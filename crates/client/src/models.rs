//! Data models for Splunk REST API responses.
//!
//! Only the endpoints the MCP server exposes are modelled; everything else
//! in the Splunk API surface is out of scope for this collaborator.

use serde::{Deserialize, Serialize};

/// Generic Splunk REST API response wrapper.
#[derive(Debug, Deserialize, Clone)]
pub struct SplunkResponse<T> {
    pub entry: Vec<Entry<T>>,
}

/// One entry in a Splunk collection response.
#[derive(Debug, Deserialize, Clone)]
pub struct Entry<T> {
    pub name: String,
    pub content: T,
}

/// A single message from Splunk (usually in error responses).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SplunkMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: String,
}

/// A collection of messages from Splunk.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SplunkMessages {
    pub messages: Vec<SplunkMessage>,
}

/// Options for running a search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Earliest time bound (e.g., "-24h").
    pub earliest_time: Option<String>,
    /// Latest time bound (e.g., "now").
    pub latest_time: Option<String>,
    /// Maximum number of results to return.
    pub max_results: Option<u64>,
}

/// Search job status, polled while waiting for completion.
#[derive(Debug, Deserialize, Clone)]
pub struct SearchJobStatus {
    #[serde(rename = "isDone", default)]
    pub is_done: bool,
    #[serde(rename = "isFailed", default)]
    pub is_failed: bool,
    #[serde(rename = "doneProgress", default)]
    pub done_progress: f64,
    #[serde(rename = "resultCount", default)]
    pub result_count: u64,
}

/// A Splunk index.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Index {
    /// Index name, copied from the entry name.
    #[serde(default)]
    pub name: String,
    /// Total number of events in the index.
    #[serde(rename = "totalEventCount", default)]
    pub total_event_count: u64,
    /// Current size of the index in megabytes.
    #[serde(rename = "currentDBSizeMB", default)]
    pub current_db_size_mb: u64,
    /// Maximum configured size in megabytes.
    #[serde(rename = "maxTotalDataSizeMB", default)]
    pub max_total_data_size_mb: u64,
    /// Whether the index is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Timestamp of the earliest event, if any.
    #[serde(rename = "minTime", default)]
    pub min_time: Option<String>,
    /// Timestamp of the latest event, if any.
    #[serde(rename = "maxTime", default)]
    pub max_time: Option<String>,
}

/// An installed Splunk app.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct App {
    /// App id, copied from the entry name.
    #[serde(default)]
    pub name: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// App version string.
    #[serde(default)]
    pub version: Option<String>,
    /// Whether the app is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Whether the app is visible in Splunk Web.
    #[serde(default)]
    pub visible: bool,
}

/// Splunk server information.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerInfo {
    #[serde(rename = "serverName", default)]
    pub server_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub build: Option<String>,
    #[serde(rename = "os_name", default)]
    pub os_name: Option<String>,
    #[serde(rename = "licenseState", default)]
    pub license_state: Option<String>,
}

/// splunkd health report, flattened from the health endpoint tree.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthReport {
    /// Overall health color ("green", "yellow", "red").
    #[serde(default)]
    pub health: String,
    /// Per-feature health colors.
    #[serde(default)]
    pub features: serde_json::Map<String, serde_json::Value>,
}
