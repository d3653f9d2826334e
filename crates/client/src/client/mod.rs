//! Main Splunk REST API client and API methods.
//!
//! This module provides the primary [`SplunkClient`] for interacting with
//! the Splunk Enterprise REST API. It automatically handles authentication
//! and session management.
//!
//! # Submodules
//! - [`builder`]: Client construction and configuration
//! - `session`: Session token management helpers (private module)
//!
//! # Invariants
//! - All API methods handle 401/403 authentication errors by refreshing the
//!   session and retrying once (session-based authentication only; API
//!   tokens do not trigger retries)
//! - The `retry_call!` macro centralizes this retry pattern across all API
//!   methods

pub mod builder;
mod session;

use serde_json::Value;
use tracing::debug;

use crate::auth::SessionManager;
use crate::endpoints;
use crate::error::Result;
use crate::models::{App, HealthReport, Index, SearchOptions, ServerInfo};
use splunk_config::constants::{
    DEFAULT_MAX_RESULTS, DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_MS,
};

pub use builder::SplunkClientBuilder;

/// Macro to wrap an async API call with automatic session retry on 401/403.
///
/// When a 401 or 403 error is received and the client is using session-based
/// auth (not API token auth), it clears the session, re-authenticates, and
/// retries the call once.
macro_rules! retry_call {
    ($self:expr, $token:ident, $call:expr) => {{
        let $token = $self.get_auth_token().await?;
        let result = $call;

        match result {
            Ok(data) => Ok(data),
            Err(e) if e.is_auth_error() && !$self.is_api_token_auth() => {
                debug!("Session rejected, clearing and re-authenticating...");
                $self.session_manager.clear_session();
                let $token = $self.get_auth_token().await?;
                $call
            }
            Err(e) => Err(e),
        }
    }};
}

/// Splunk REST API client.
///
/// Construct with [`SplunkClient::builder()`]. Supports two authentication
/// strategies: `AuthStrategy::SessionToken` (username/password with
/// automatic session management) and `AuthStrategy::ApiToken` (static
/// bearer token).
#[derive(Debug)]
pub struct SplunkClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) session_manager: SessionManager,
    pub(crate) max_retries: usize,
    pub(crate) session_ttl_seconds: u64,
}

impl SplunkClient {
    /// Create a new client builder.
    pub fn builder() -> builder::SplunkClientBuilder {
        builder::SplunkClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform the authentication handshake without issuing any other call.
    ///
    /// For session auth this logs in and stores the session token; for API
    /// token auth it validates the token with a cheap authenticated request.
    /// The session pool calls this once when opening a session.
    pub async fn handshake(&mut self) -> Result<()> {
        if self.is_api_token_auth() {
            let token = self.get_auth_token().await?;
            endpoints::get_server_info(&self.http, &self.base_url, &token, self.max_retries)
                .await?;
        } else {
            self.login().await?;
        }
        Ok(())
    }

    /// Run a search and wait for its results.
    ///
    /// Creates a job, polls it to completion, and fetches up to
    /// `options.max_results` result rows.
    pub async fn search(&mut self, query: &str, options: &SearchOptions) -> Result<Vec<Value>> {
        let sid = retry_call!(
            self,
            token,
            endpoints::create_job(
                &self.http,
                &self.base_url,
                &token,
                query,
                options,
                self.max_retries,
            )
            .await
        )?;

        let token = self.get_auth_token().await?;
        endpoints::wait_for_job(
            &self.http,
            &self.base_url,
            &token,
            &sid,
            DEFAULT_POLL_INTERVAL_MS,
            DEFAULT_MAX_WAIT_SECS,
            self.max_retries,
        )
        .await?;

        endpoints::get_results(
            &self.http,
            &self.base_url,
            &token,
            &sid,
            options.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            0,
            self.max_retries,
        )
        .await
    }

    /// List indexes.
    pub async fn list_indexes(&mut self, count: Option<u64>) -> Result<Vec<Index>> {
        retry_call!(
            self,
            token,
            endpoints::list_indexes(&self.http, &self.base_url, &token, count, self.max_retries)
                .await
        )
    }

    /// Fetch a single index by name.
    pub async fn get_index(&mut self, name: &str) -> Result<Index> {
        retry_call!(
            self,
            token,
            endpoints::get_index(&self.http, &self.base_url, &token, name, self.max_retries).await
        )
    }

    /// List installed apps.
    pub async fn list_apps(&mut self, count: Option<u64>) -> Result<Vec<App>> {
        retry_call!(
            self,
            token,
            endpoints::list_apps(&self.http, &self.base_url, &token, count, self.max_retries).await
        )
    }

    /// Fetch server information.
    pub async fn server_info(&mut self) -> Result<ServerInfo> {
        retry_call!(
            self,
            token,
            endpoints::get_server_info(&self.http, &self.base_url, &token, self.max_retries).await
        )
    }

    /// Fetch the splunkd health report.
    pub async fn health(&mut self) -> Result<HealthReport> {
        retry_call!(
            self,
            token,
            endpoints::get_health(&self.http, &self.base_url, &token, self.max_retries).await
        )
    }
}
