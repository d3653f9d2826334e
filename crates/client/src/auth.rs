//! Authentication strategies and session key lifecycle.
//!
//! The client needs exactly two answers from this module: which bearer
//! value to put on the wire, and whether a login must happen first. For
//! API tokens the answers never change; for session auth the key obtained
//! from login carries a refresh deadline computed ahead of its TTL, so a
//! key cannot lapse in the middle of an API call.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use splunk_config::constants::DEFAULT_EXPIRY_BUFFER_SECS;

/// Strategy for authenticating with Splunk.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// Username and password authentication.
    /// The client will automatically manage session keys.
    SessionToken {
        username: String,
        password: SecretString,
    },
    /// API token (bearer token authentication).
    /// Preferred for automation as it doesn't require session management.
    ApiToken { token: SecretString },
}

/// Holds the session key between logins and decides when to log in again.
#[derive(Debug)]
pub struct SessionManager {
    auth_strategy: AuthStrategy,
    /// Key from the most recent login; None until the first login.
    session_key: Option<SecretString>,
    /// When the key should be replaced; None means it never goes stale.
    refresh_after: Option<Instant>,
}

impl SessionManager {
    /// Create a new session manager with the given auth strategy.
    pub fn new(strategy: AuthStrategy) -> Self {
        Self {
            auth_strategy: strategy,
            session_key: None,
            refresh_after: None,
        }
    }

    /// The configured auth strategy.
    pub fn strategy(&self) -> &AuthStrategy {
        &self.auth_strategy
    }

    /// Whether this manager runs on a static API token (no login calls).
    pub fn is_api_token(&self) -> bool {
        matches!(self.auth_strategy, AuthStrategy::ApiToken { .. })
    }

    /// The bearer value for the Authorization header: the API token, or
    /// the stored session key if a login has happened.
    pub fn bearer_token(&self) -> Option<&str> {
        match &self.auth_strategy {
            AuthStrategy::ApiToken { token } => Some(token.expose_secret()),
            AuthStrategy::SessionToken { .. } => {
                self.session_key.as_ref().map(|k| k.expose_secret())
            }
        }
    }

    /// Whether the client must log in before its next request.
    ///
    /// Always false for API tokens. For session auth: true until the first
    /// login, and again once the stored key passes its refresh deadline.
    pub fn needs_login(&self) -> bool {
        if self.is_api_token() {
            return false;
        }
        self.session_key.is_none()
            || self
                .refresh_after
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Store the key returned by a login.
    ///
    /// The refresh deadline lands one buffer interval before the server's
    /// TTL. A TTL at or below the buffer yields a deadline of "now", which
    /// simply forces a fresh login on the next call.
    pub fn store_session_key(&mut self, key: String, ttl_seconds: u64) {
        let usable = ttl_seconds.saturating_sub(DEFAULT_EXPIRY_BUFFER_SECS);
        self.refresh_after = Some(Instant::now() + Duration::from_secs(usable));
        self.session_key = Some(SecretString::new(key.into()));
    }

    /// Drop the stored key, forcing re-authentication on the next call.
    pub fn clear_session(&mut self) {
        self.session_key = None;
        self.refresh_after = None;
    }
}
