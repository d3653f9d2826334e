//! The standardised success/error wrapper returned from every invocation.
//!
//! The envelope is the single source of truth for success and failure.
//! MCP-level transport errors are reserved for protocol faults.
//!
//! # Invariants
//! - Exactly one of `data` or (`code` + `message`) is present.

use serde::Serialize;
use serde_json::Value;

use crate::error::ServerError;

/// Metadata attached to successful envelopes.
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeMeta {
    /// Wall-clock duration of the invocation in milliseconds.
    pub duration_ms: u64,
    /// Opaque identity of the calling client.
    pub client_id: String,
    /// Per-field record of which source supplied each config value.
    pub config_source_map: Value,
}

/// Invocation result wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// "ok" or "error".
    pub status: &'static str,
    /// Present on success only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Present on failure only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Present on failure only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional structured failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Present on success; best-effort on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<EnvelopeMeta>,
}

impl Envelope {
    /// Build a success envelope.
    pub fn ok(data: Value, meta: EnvelopeMeta) -> Self {
        Self {
            status: "ok",
            data: Some(data),
            code: None,
            message: None,
            details: None,
            meta: Some(meta),
        }
    }

    /// Build an error envelope from a [`ServerError`].
    pub fn error(err: &ServerError, meta: Option<EnvelopeMeta>) -> Self {
        Self {
            status: "error",
            data: None,
            code: Some(err.code().to_string()),
            message: Some(err.message()),
            details: err.details(),
            meta,
        }
    }

    /// Whether this envelope reports success.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Render to a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "status": "error",
                "code": "Internal",
                "message": "failed to serialize envelope",
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> EnvelopeMeta {
        EnvelopeMeta {
            duration_ms: 12,
            client_id: "client-1".to_string(),
            config_source_map: serde_json::json!({"host": "header"}),
        }
    }

    #[test]
    fn ok_envelope_has_data_and_no_code() {
        let env = Envelope::ok(serde_json::json!({"rows": 3}), meta());
        let value = env.to_value();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["rows"], 3);
        assert!(value.get("code").is_none());
        assert!(value.get("message").is_none());
        assert_eq!(value["meta"]["client_id"], "client-1");
        assert_eq!(value["meta"]["config_source_map"]["host"], "header");
    }

    #[test]
    fn error_envelope_has_code_and_message_and_no_data() {
        let err = ServerError::ConfigMissing("no host resolved".to_string());
        let env = Envelope::error(&err, None);
        let value = env.to_value();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "ConfigMissing");
        assert!(value["message"].as_str().is_some());
        assert!(value.get("data").is_none());
    }

    #[test]
    fn invalid_args_details_survive() {
        let err = ServerError::InvalidArgs {
            message: "2 fields rejected".to_string(),
            details: Some(serde_json::json!({"query": "required"})),
        };
        let env = Envelope::error(&err, None);
        assert_eq!(env.to_value()["details"]["query"], "required");
    }
}
