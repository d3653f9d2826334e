//! Error types for the MCP server runtime.
//!
//! Every failure a component or the dispatcher can produce maps onto one of
//! the wire-stable envelope codes. There is no channel for partial success
//! through the error path.

use thiserror::Error;

use splunk_client::ClientError;
use splunk_config::ConfigError;

use crate::pool::PoolError;

/// Result alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Failures surfaced through the response envelope.
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    /// Component not found in the registry.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Arguments failed validation against the component's schema.
    #[error("Invalid arguments: {message}")]
    InvalidArgs {
        message: String,
        /// Per-field reasons.
        details: Option<serde_json::Value>,
    },

    /// The component requires Splunk but no usable config was resolved.
    #[error("No usable Splunk configuration: {0}")]
    ConfigMissing(String),

    /// Splunk rejected the credentials.
    #[error("Splunk authentication failed: {0}")]
    AuthFailed(String),

    /// Splunk could not be reached.
    #[error("Splunk unreachable: {0}")]
    Unreachable(String),

    /// TLS handshake or certificate verification failed.
    #[error("TLS failure: {0}")]
    TlsFailed(String),

    /// The invocation exceeded its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The invocation was cancelled.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// A workflow definition failed planning.
    #[error("Invalid workflow: {0}")]
    WorkflowInvalid(String),

    /// A workflow template reference could not be resolved at run time.
    #[error("Unresolved reference: {0}")]
    ReferenceError(String),

    /// A component failed while executing.
    #[error("Execution failed: {0}")]
    ExecutionError(String),

    /// An internal invariant was violated; the server remains available.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// The wire-stable envelope code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::NotFound(_) => "NotFound",
            ServerError::InvalidArgs { .. } => "InvalidArgs",
            ServerError::ConfigMissing(_) => "ConfigMissing",
            ServerError::AuthFailed(_) => "AuthFailed",
            ServerError::Unreachable(_) => "Unreachable",
            ServerError::TlsFailed(_) => "TLSFailed",
            ServerError::Timeout(_) => "Timeout",
            ServerError::Cancelled(_) => "Cancelled",
            ServerError::WorkflowInvalid(_) => "WorkflowInvalid",
            ServerError::ReferenceError(_) => "ReferenceError",
            ServerError::ExecutionError(_) => "ExecutionError",
            ServerError::Internal(_) => "Internal",
        }
    }

    /// Extra detail attached to the envelope, if any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServerError::InvalidArgs { details, .. } => details.clone(),
            _ => None,
        }
    }

    /// Human-readable message without the code prefix.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<PoolError> for ServerError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::AuthFailed(msg) => ServerError::AuthFailed(msg),
            PoolError::Unreachable(msg) => ServerError::Unreachable(msg),
            PoolError::TlsFailed(msg) => ServerError::TlsFailed(msg),
        }
    }
}

impl From<ClientError> for ServerError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::TlsError(msg) => ServerError::TlsFailed(msg),
            ClientError::OperationTimeout { .. } => ServerError::Timeout(e.to_string()),
            ClientError::ConnectionRefused(_) | ClientError::HttpError(_) => {
                ServerError::Unreachable(e.to_string())
            }
            ClientError::NotFound(resource) => ServerError::NotFound(resource),
            ClientError::InvalidRequest(msg) => ServerError::InvalidArgs {
                message: msg,
                details: None,
            },
            _ if e.is_auth_error() => ServerError::AuthFailed(e.to_string()),
            _ => ServerError::ExecutionError(e.to_string()),
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(e: ConfigError) -> Self {
        ServerError::InvalidArgs {
            message: e.to_string(),
            details: None,
        }
    }
}
