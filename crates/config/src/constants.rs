//! Centralized constants for the Splunk MCP server workspace.
//!
//! This module contains default values used across crates to avoid
//! magic number duplication and improve maintainability.

// =============================================================================
// Connection & Timeout Defaults
// =============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default session time-to-live in seconds (1 hour).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Default buffer time before session expiry to proactively refresh tokens.
/// This prevents race conditions where a token expires during an API call.
pub const DEFAULT_EXPIRY_BUFFER_SECS: u64 = 60;

/// Default Splunk management port.
pub const DEFAULT_SPLUNK_PORT: u16 = 8089;

/// Default maximum number of retries for failed requests.
pub const DEFAULT_MAX_RETRIES: usize = 3;

// =============================================================================
// Session Pool Defaults
// =============================================================================

/// Default idle TTL after which pooled Splunk sessions are reaped, in seconds.
pub const DEFAULT_POOL_IDLE_TTL_SECS: u64 = 600;

/// Interval between session pool reaper sweeps, in seconds.
pub const DEFAULT_POOL_REAP_INTERVAL_SECS: u64 = 60;

// =============================================================================
// Search & Polling Defaults
// =============================================================================

/// Default polling interval for job status checks in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default maximum time to wait for search job completion in seconds.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 300;

/// Default maximum number of search results to return.
pub const DEFAULT_MAX_RESULTS: u64 = 1000;

// =============================================================================
// MCP Server Defaults
// =============================================================================

/// Default bind host for the streaming HTTP transport.
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";

/// Default bind port for the streaming HTTP transport.
pub const DEFAULT_HTTP_PORT: u16 = 8050;

/// Default bound on parallel tasks within one workflow phase.
pub const DEFAULT_WORKFLOW_PARALLELISM: usize = 8;

/// Maximum category length accepted for component metadata.
pub const MAX_CATEGORY_LEN: usize = 32;
