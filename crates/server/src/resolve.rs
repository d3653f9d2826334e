//! Per-invocation client configuration resolution.
//!
//! Resolves a [`SplunkConfig`] and [`ClientIdentity`] for the current
//! invocation from a prioritized chain of sources, independently per field:
//!
//! 1. invocation-level arguments (`splunk_host`, `splunk_token`, ...)
//! 2. `X-Splunk-*` transport headers (streaming HTTP only)
//! 3. `MCP_SPLUNK_*` environment variables (client-originated)
//! 4. `SPLUNK_*` environment variables (server defaults)
//!
//! A set value at any level stops the search for that field; partial configs
//! are returned, never raised; whether a missing Splunk is fatal is the
//! caller's decision.
//!
//! Empty or whitespace-only values count as unset at every level, matching
//! the environment variable convention used across the workspace.

use http::HeaderMap;
use serde_json::Value;
use tracing::debug;

use splunk_config::{
    env_var_or_none, ConfigError, ConfigField, ConfigSource, SourceMap, SplunkConfig,
};

use crate::context::{ClientIdentity, TransportKind};

/// Argument key, header name, and env suffix for one config field.
struct FieldSpec {
    field: ConfigField,
    arg: &'static str,
    header: &'static str,
    env_suffix: &'static str,
}

/// The resolution table. Header names are matched case-insensitively by the
/// `http` crate; `Verify-SSL` maps onto the `verify_tls` field.
const FIELD_SPECS: [FieldSpec; 8] = [
    FieldSpec {
        field: ConfigField::Host,
        arg: "splunk_host",
        header: "x-splunk-host",
        env_suffix: "HOST",
    },
    FieldSpec {
        field: ConfigField::Port,
        arg: "splunk_port",
        header: "x-splunk-port",
        env_suffix: "PORT",
    },
    FieldSpec {
        field: ConfigField::Scheme,
        arg: "splunk_scheme",
        header: "x-splunk-scheme",
        env_suffix: "SCHEME",
    },
    FieldSpec {
        field: ConfigField::Username,
        arg: "splunk_username",
        header: "x-splunk-username",
        env_suffix: "USERNAME",
    },
    FieldSpec {
        field: ConfigField::Password,
        arg: "splunk_password",
        header: "x-splunk-password",
        env_suffix: "PASSWORD",
    },
    FieldSpec {
        field: ConfigField::Token,
        arg: "splunk_token",
        header: "x-splunk-token",
        env_suffix: "TOKEN",
    },
    FieldSpec {
        field: ConfigField::VerifyTls,
        arg: "splunk_verify_ssl",
        header: "x-splunk-verify-ssl",
        env_suffix: "VERIFY_SSL",
    },
    FieldSpec {
        field: ConfigField::App,
        arg: "splunk_app",
        header: "x-splunk-app",
        env_suffix: "APP",
    },
];

/// What the resolver produced for one invocation.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The assembled (possibly partial) config.
    pub config: SplunkConfig,
    /// Stable caller identity for this transport session.
    pub identity: ClientIdentity,
    /// Which source supplied each field.
    pub source_map: SourceMap,
}

/// Inputs the transport hands to the resolver.
pub struct ResolveInputs<'a> {
    /// Which transport delivered the invocation.
    pub transport: TransportKind,
    /// Request headers; only consulted on the HTTP transport.
    pub headers: Option<&'a HeaderMap>,
    /// Transport-assigned session identifier, if any.
    pub session_id: Option<&'a str>,
    /// Invocation-level arguments.
    pub args: Option<&'a serde_json::Map<String, Value>>,
    /// Synthetic per-process id for stdio sessions.
    pub process_id: &'a str,
}

/// Resolve a config, identity, and source map for one invocation.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when the winning value for a field
/// fails to parse (bad port number, bad boolean); the caller surfaces this
/// as `InvalidArgs`.
pub fn resolve(inputs: &ResolveInputs<'_>) -> Result<Resolution, ConfigError> {
    let mut config = SplunkConfig::default();
    let mut source_map = SourceMap::new();

    for spec in &FIELD_SPECS {
        if let Some((raw, source, var)) = first_defined(inputs, spec) {
            config.set_field(spec.field, &raw, &var)?;
            source_map.record(spec.field, source);
            debug!(field = %spec.field, source = %source, "resolved config field");
        }
    }

    let identity = derive_identity(inputs, &config, &source_map);

    Ok(Resolution {
        config,
        identity,
        source_map,
    })
}

/// Walk the precedence chain for one field, returning the first defined
/// value together with its source and the variable name for diagnostics.
fn first_defined(
    inputs: &ResolveInputs<'_>,
    spec: &FieldSpec,
) -> Option<(String, ConfigSource, String)> {
    // 1. Invocation arguments.
    if let Some(args) = inputs.args
        && let Some(value) = args.get(spec.arg)
        && let Some(raw) = argument_as_string(value)
    {
        return Some((raw, ConfigSource::Argument, spec.arg.to_string()));
    }

    // 2. Transport headers, HTTP only.
    if inputs.transport == TransportKind::Http
        && let Some(headers) = inputs.headers
        && let Some(value) = headers.get(spec.header)
        && let Ok(raw) = value.to_str()
        && !raw.trim().is_empty()
    {
        return Some((
            raw.to_string(),
            ConfigSource::Header,
            spec.header.to_string(),
        ));
    }

    // 3. Client-originated env, passed through the MCP client launcher.
    let client_var = format!("MCP_SPLUNK_{}", spec.env_suffix);
    if let Some(raw) = env_var_or_none(&client_var) {
        return Some((raw, ConfigSource::ClientEnv, client_var));
    }

    // 4. Server default env.
    let server_var = format!("SPLUNK_{}", spec.env_suffix);
    if let Some(raw) = env_var_or_none(&server_var) {
        return Some((raw, ConfigSource::Env, server_var));
    }

    None
}

/// Arguments may carry strings, numbers, or booleans; everything is
/// normalized to the string form `SplunkConfig::set_field` parses.
fn argument_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Identity precedence: transport session id, then config fingerprint when
/// any source contributed, then the synthetic per-process stdio id.
fn derive_identity(
    inputs: &ResolveInputs<'_>,
    config: &SplunkConfig,
    source_map: &SourceMap,
) -> ClientIdentity {
    if let Some(session_id) = inputs.session_id {
        return ClientIdentity::from_session(session_id);
    }
    if !source_map.is_empty() {
        return ClientIdentity::from_fingerprint(config.fingerprint());
    }
    ClientIdentity::synthetic(inputs.process_id)
}
