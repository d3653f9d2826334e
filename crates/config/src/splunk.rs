//! Per-invocation Splunk connection configuration.
//!
//! Responsibilities:
//! - Define the connection tuple the resolver assembles per invocation.
//! - Decide whether a config is usable (host plus working credentials).
//! - Produce the fingerprint the session pool keys cached sessions by.
//!
//! Does NOT handle:
//! - Precedence between configuration sources (server resolver).
//! - Opening connections (client crate).
//!
//! Invariants:
//! - The fingerprint covers every field, secrets included; two configs share
//!   a fingerprint only if every field matches.
//! - Secrets never appear in `Debug` output.

use std::hash::{Hash, Hasher};

use secrecy::{ExposeSecret, SecretString};

use crate::constants::DEFAULT_SPLUNK_PORT;
use crate::error::ConfigError;
use crate::source::ConfigField;

/// URL scheme for the Splunk management endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// Plain HTTP; only sensible for local development.
    Http,
    /// HTTPS, the Splunk default.
    #[default]
    Https,
}

impl Scheme {
    /// Lowercase scheme string for URL assembly.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl std::str::FromStr for Scheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ConfigError::InvalidValue {
                var: "scheme".to_string(),
                message: format!("must be http or https, got '{other}'"),
            }),
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable hash of every [`SplunkConfig`] field, used as the session pool key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// The raw hash value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Connection parameters for one Splunk instance.
///
/// A config is assembled field by field from prioritized sources; until
/// [`SplunkConfig::is_usable`] holds it is a partial config that
/// Splunk-requiring collaborators must reject.
#[derive(Debug, Clone, Default)]
pub struct SplunkConfig {
    /// Splunk management host.
    pub host: Option<String>,
    /// Management port; `None` falls back to 8089.
    pub port: Option<u16>,
    /// URL scheme; `None` falls back to https.
    pub scheme: Option<Scheme>,
    /// Username for session authentication.
    pub username: Option<String>,
    /// Password paired with `username`.
    pub password: Option<SecretString>,
    /// Bearer token; preferred over username/password when both are present.
    pub token: Option<SecretString>,
    /// Whether to verify the server TLS certificate; `None` falls back to true.
    pub verify_tls: Option<bool>,
    /// Optional Splunk app namespace for REST calls.
    pub app: Option<String>,
}

impl SplunkConfig {
    /// Effective management port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SPLUNK_PORT)
    }

    /// Effective URL scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme.unwrap_or_default()
    }

    /// Effective TLS verification flag.
    pub fn verify_tls(&self) -> bool {
        self.verify_tls.unwrap_or(true)
    }

    /// Whether this config can open a Splunk connection: a host plus either
    /// a bearer token or a username/password pair.
    pub fn is_usable(&self) -> bool {
        let has_credentials =
            self.token.is_some() || (self.username.is_some() && self.password.is_some());
        self.host.is_some() && has_credentials
    }

    /// Base URL of the management endpoint, if a host is set.
    pub fn base_url(&self) -> Option<String> {
        self.host
            .as_ref()
            .map(|host| format!("{}://{}:{}", self.scheme().as_str(), host, self.port()))
    }

    /// Whether a given field currently holds a value.
    pub fn has_field(&self, field: ConfigField) -> bool {
        match field {
            ConfigField::Host => self.host.is_some(),
            ConfigField::Port => self.port.is_some(),
            ConfigField::Scheme => self.scheme.is_some(),
            ConfigField::Username => self.username.is_some(),
            ConfigField::Password => self.password.is_some(),
            ConfigField::Token => self.token.is_some(),
            ConfigField::VerifyTls => self.verify_tls.is_some(),
            ConfigField::App => self.app.is_some(),
        }
    }

    /// Parse a raw string value into a field.
    ///
    /// Used by the resolver, which collects all sources as strings. `var`
    /// names the originating argument/header/variable for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric or boolean field
    /// fails to parse.
    pub fn set_field(&mut self, field: ConfigField, raw: &str, var: &str) -> Result<(), ConfigError> {
        let raw = raw.trim();
        match field {
            ConfigField::Host => self.host = Some(raw.to_string()),
            ConfigField::Port => {
                let port: u16 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    var: var.to_string(),
                    message: "must be a port number".to_string(),
                })?;
                self.port = Some(port);
            }
            ConfigField::Scheme => self.scheme = Some(raw.parse()?),
            ConfigField::Username => self.username = Some(raw.to_string()),
            ConfigField::Password => self.password = Some(SecretString::new(raw.to_string().into())),
            ConfigField::Token => self.token = Some(SecretString::new(raw.to_string().into())),
            ConfigField::VerifyTls => {
                let verify: bool = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    var: var.to_string(),
                    message: "must be true or false".to_string(),
                })?;
                self.verify_tls = Some(verify);
            }
            ConfigField::App => self.app = Some(raw.to_string()),
        }
        Ok(())
    }

    /// Hash every field into the session pool key.
    ///
    /// Secrets are exposed into the hasher only; the resulting value cannot
    /// be inverted back to the credential.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.host.hash(&mut hasher);
        self.port().hash(&mut hasher);
        self.scheme().hash(&mut hasher);
        self.username.hash(&mut hasher);
        self.password
            .as_ref()
            .map(|s| s.expose_secret())
            .hash(&mut hasher);
        self.token
            .as_ref()
            .map(|s| s.expose_secret())
            .hash(&mut hasher);
        self.verify_tls().hash(&mut hasher);
        self.app.hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}
