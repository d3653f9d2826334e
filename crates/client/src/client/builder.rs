//! Client builder for constructing [`SplunkClient`] instances.
//!
//! Responsibilities:
//! - Provide a fluent builder API for client configuration
//! - Validate required configuration (base_url, auth_strategy)
//! - Normalize the base URL (removing trailing slashes)
//! - Configure the underlying HTTP client (timeouts, TLS verification)
//!
//! # Invariants
//! - `base_url` and `auth_strategy` are required before calling `build()`
//! - The base URL is always normalized to have no trailing slashes
//! - `danger_accept_invalid_certs` only affects HTTPS connections; plain
//!   HTTP URLs log a warning instead

use std::time::Duration;

use secrecy::ExposeSecret;

use crate::auth::{AuthStrategy, SessionManager};
use crate::client::SplunkClient;
use crate::error::{ClientError, Result};
use splunk_config::constants::{DEFAULT_MAX_RETRIES, DEFAULT_SESSION_TTL_SECS, DEFAULT_TIMEOUT_SECS};
use splunk_config::SplunkConfig;

/// Builder for creating a new [`SplunkClient`].
///
/// All options have sensible defaults except `base_url` and `auth_strategy`.
pub struct SplunkClientBuilder {
    base_url: Option<String>,
    auth_strategy: Option<AuthStrategy>,
    skip_verify: bool,
    timeout: Duration,
    max_retries: usize,
    session_ttl_seconds: u64,
}

impl Default for SplunkClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_strategy: None,
            skip_verify: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl SplunkClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL of the Splunk server, e.g. `https://localhost:8089`.
    pub fn base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set the authentication strategy.
    pub fn auth_strategy(mut self, strategy: AuthStrategy) -> Self {
        self.auth_strategy = Some(strategy);
        self
    }

    /// Set whether to skip TLS certificate verification.
    ///
    /// # Security Warning
    /// Only use this in development or testing environments.
    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = skip;
        self
    }

    /// Set the request timeout. Default is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries for rate-limited requests.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the session TTL in seconds, after which tokens are proactively
    /// refreshed. Default is 3600 seconds.
    pub fn session_ttl_seconds(mut self, ttl: u64) -> Self {
        self.session_ttl_seconds = ttl;
        self
    }

    /// Populate the builder from a resolved per-invocation [`SplunkConfig`].
    ///
    /// The config must be usable (host plus credentials); a bearer token
    /// takes precedence over a username/password pair when both are set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when the config carries no host
    /// and [`ClientError::AuthFailed`] when it carries no credentials.
    pub fn from_config(mut self, config: &SplunkConfig) -> Result<Self> {
        let base_url = config
            .base_url()
            .ok_or_else(|| ClientError::InvalidUrl("config has no host".to_string()))?;

        let auth_strategy = if let Some(token) = &config.token {
            AuthStrategy::ApiToken {
                token: token.expose_secret().to_string().into(),
            }
        } else if let (Some(username), Some(password)) = (&config.username, &config.password) {
            AuthStrategy::SessionToken {
                username: username.clone(),
                password: password.expose_secret().to_string().into(),
            }
        } else {
            return Err(ClientError::AuthFailed(
                "config has no token or username/password pair".to_string(),
            ));
        };

        self.base_url = Some(base_url);
        self.auth_strategy = Some(auth_strategy);
        self.skip_verify = !config.verify_tls();
        Ok(self)
    }

    /// Build the configured [`SplunkClient`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when `base_url` is missing or
    /// malformed and [`ClientError::AuthFailed`] when no auth strategy was
    /// provided.
    pub fn build(self) -> Result<SplunkClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::InvalidUrl("base_url is required".to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let parsed = url::Url::parse(&base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        if self.skip_verify && parsed.scheme() != "https" {
            tracing::warn!("skip_verify set on a non-HTTPS URL; it has no effect");
        }

        let auth_strategy = self
            .auth_strategy
            .ok_or_else(|| ClientError::AuthFailed("auth_strategy is required".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.skip_verify)
            .build()?;

        Ok(SplunkClient {
            http,
            base_url,
            session_manager: SessionManager::new(auth_strategy),
            max_retries: self.max_retries,
            session_ttl_seconds: self.session_ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splunk_config::ConfigField;

    #[test]
    fn test_build_requires_base_url() {
        let result = SplunkClientBuilder::new().build();
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_build_requires_auth_strategy() {
        let result = SplunkClientBuilder::new()
            .base_url("https://localhost:8089".to_string())
            .build();
        assert!(matches!(result, Err(ClientError::AuthFailed(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let client = SplunkClientBuilder::new()
            .base_url("https://localhost:8089/".to_string())
            .auth_strategy(AuthStrategy::ApiToken {
                token: "tok".to_string().into(),
            })
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://localhost:8089");
    }

    #[test]
    fn test_from_config_prefers_token_over_password() {
        let mut config = SplunkConfig::default();
        config
            .set_field(ConfigField::Host, "splunk.example", "test")
            .unwrap();
        config
            .set_field(ConfigField::Username, "admin", "test")
            .unwrap();
        config
            .set_field(ConfigField::Password, "pw", "test")
            .unwrap();
        config
            .set_field(ConfigField::Token, "tok", "test")
            .unwrap();

        let client = SplunkClientBuilder::new()
            .from_config(&config)
            .unwrap()
            .build()
            .unwrap();
        assert!(client.is_api_token_auth());
        assert_eq!(client.base_url(), "https://splunk.example:8089");
    }

    #[test]
    fn test_from_config_rejects_partial_config() {
        let mut config = SplunkConfig::default();
        config
            .set_field(ConfigField::Host, "splunk.example", "test")
            .unwrap();
        let result = SplunkClientBuilder::new().from_config(&config);
        assert!(matches!(result, Err(ClientError::AuthFailed(_))));
    }
}
