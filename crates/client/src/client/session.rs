//! Client-level session management helpers.
//!
//! Methods on [`SplunkClient`] that interact with the
//! [`crate::auth::SessionManager`] to obtain the bearer value for requests.
//!
//! # Invariants
//! - [`SplunkClient::get_auth_token`] requires `&mut self` because it may
//!   trigger a login call
//! - API token authentication never triggers login; the token is returned
//!   directly
//! - Session keys are replaced ahead of their TTL, never mid-call

use secrecy::ExposeSecret;

use crate::auth::AuthStrategy;
use crate::client::SplunkClient;
use crate::endpoints;
use crate::error::{ClientError, Result};

impl SplunkClient {
    /// Get the current authentication token, logging in if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AuthFailed`] if login fails and
    /// [`ClientError::SessionExpired`] if no valid token is available.
    pub(crate) async fn get_auth_token(&mut self) -> Result<String> {
        if self.session_manager.needs_login() {
            self.login().await?;
        }

        self.session_manager
            .bearer_token()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                let username = match self.session_manager.strategy() {
                    AuthStrategy::SessionToken { username, .. } => username.clone(),
                    AuthStrategy::ApiToken { .. } => "api-token".to_string(),
                };
                ClientError::SessionExpired { username }
            })
    }

    /// Check if the client is using API token authentication.
    pub fn is_api_token_auth(&self) -> bool {
        self.session_manager.is_api_token()
    }

    /// Login with username/password to get a session key.
    ///
    /// Only valid for [`AuthStrategy::SessionToken`] authentication. The
    /// obtained key is stored for subsequent API calls with a refresh
    /// deadline derived from the configured session TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AuthFailed`] if the auth strategy is not
    /// session-based or the credentials are rejected.
    pub async fn login(&mut self) -> Result<String> {
        if let AuthStrategy::SessionToken { username, password } = self.session_manager.strategy() {
            let token = endpoints::login(
                &self.http,
                &self.base_url,
                username,
                password.expose_secret(),
                self.max_retries,
            )
            .await?;

            self.session_manager
                .store_session_key(token.clone(), self.session_ttl_seconds);

            Ok(token)
        } else {
            Err(ClientError::AuthFailed(
                "Cannot login with API token auth strategy".to_string(),
            ))
        }
    }
}
