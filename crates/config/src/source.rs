//! Source tracking for resolved configuration.
//!
//! Responsibilities:
//! - Name the configuration fields the resolver fills independently.
//! - Record which source supplied each field, for diagnostics and for the
//!   `config_source_map` block in response envelopes.
//!
//! Does NOT handle:
//! - The precedence walk itself (the server's resolver owns that).
//!
//! Invariants:
//! - A field appears in a [`SourceMap`] at most once; the first (highest
//!   precedence) source to define it wins.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// A configuration field the resolver fills independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigField {
    /// Splunk management host name.
    Host,
    /// Splunk management port.
    Port,
    /// URL scheme (http or https).
    Scheme,
    /// Username for session authentication.
    Username,
    /// Password for session authentication.
    Password,
    /// Bearer token for API authentication.
    Token,
    /// Whether the server certificate is verified.
    VerifyTls,
    /// Optional Splunk app namespace.
    App,
}

impl ConfigField {
    /// All fields, in the order the resolver walks them.
    pub const ALL: [ConfigField; 8] = [
        ConfigField::Host,
        ConfigField::Port,
        ConfigField::Scheme,
        ConfigField::Username,
        ConfigField::Password,
        ConfigField::Token,
        ConfigField::VerifyTls,
        ConfigField::App,
    ];

    /// Stable lowercase name used in diagnostics and source maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::Host => "host",
            ConfigField::Port => "port",
            ConfigField::Scheme => "scheme",
            ConfigField::Username => "username",
            ConfigField::Password => "password",
            ConfigField::Token => "token",
            ConfigField::VerifyTls => "verify_tls",
            ConfigField::App => "app",
        }
    }
}

impl std::fmt::Display for ConfigField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a configuration field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicit key on the tool call.
    Argument,
    /// `X-Splunk-*` transport header.
    Header,
    /// `MCP_SPLUNK_*` environment variable (client-originated).
    ClientEnv,
    /// `SPLUNK_*` environment variable (server default).
    Env,
    /// Built-in default (port, scheme, verify_tls).
    Default,
}

impl ConfigSource {
    /// Stable lowercase name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Argument => "argument",
            ConfigSource::Header => "header",
            ConfigSource::ClientEnv => "client_env",
            ConfigSource::Env => "env",
            ConfigSource::Default => "default",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field record of which source supplied each resolved value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: BTreeMap<ConfigField, ConfigSource>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the source for a field. The first record for a field wins.
    pub fn record(&mut self, field: ConfigField, source: ConfigSource) {
        self.entries.entry(field).or_insert(source);
    }

    /// Look up the source that supplied a field, if any.
    pub fn source_of(&self, field: ConfigField) -> Option<ConfigSource> {
        self.entries.get(&field).copied()
    }

    /// Whether any field was resolved at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(field, source)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (ConfigField, ConfigSource)> + '_ {
        self.entries.iter().map(|(f, s)| (*f, *s))
    }

    /// Render as a JSON object of `field -> source` for envelope metadata.
    ///
    /// Secret-bearing fields report only their source, never their value.
    pub fn to_json(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .entries
            .iter()
            .map(|(field, source)| {
                (
                    field.as_str().to_string(),
                    Value::String(source.as_str().to_string()),
                )
            })
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_wins() {
        let mut map = SourceMap::new();
        map.record(ConfigField::Host, ConfigSource::Header);
        map.record(ConfigField::Host, ConfigSource::Env);
        assert_eq!(map.source_of(ConfigField::Host), Some(ConfigSource::Header));
    }

    #[test]
    fn json_uses_stable_names() {
        let mut map = SourceMap::new();
        map.record(ConfigField::Host, ConfigSource::Header);
        map.record(ConfigField::VerifyTls, ConfigSource::Default);
        let json = map.to_json();
        assert_eq!(json["host"], "header");
        assert_eq!(json["verify_tls"], "default");
    }

    #[test]
    fn empty_map_serializes_to_empty_object() {
        let map = SourceMap::new();
        assert_eq!(map.to_json(), serde_json::json!({}));
        assert!(map.is_empty());
    }
}
