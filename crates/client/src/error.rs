//! Error types for the Splunk client.

use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during Splunk client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Unauthorized access.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API error response from Splunk.
    #[error("API error ({status}) at {url}: {message}")]
    ApiError {
        status: u16,
        url: String,
        message: String,
    },

    /// Session expired and could not be renewed.
    #[error("Session expired for user '{username}', please re-authenticate")]
    SessionExpired { username: String },

    /// Invalid response format from Splunk.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Request timed out during a specific operation.
    #[error("Operation '{operation}' timed out after {timeout:?}")]
    OperationTimeout {
        /// Name of the operation that timed out (e.g., "wait_for_job").
        operation: &'static str,
        /// The configured timeout duration.
        timeout: Duration,
    },

    /// Connection refused or host unreachable.
    #[error("Connection failed to {0}")]
    ConnectionRefused(String),

    /// TLS/SSL error.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Maximum retries exceeded.
    #[error("Maximum retries exceeded ({0} attempts)")]
    MaxRetriesExceeded(usize),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Check if this error is retryable by a caller that elects to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_) | Self::OperationTimeout { .. } | Self::ConnectionRefused(_)
        )
    }

    /// Check if this error indicates authentication failure.
    ///
    /// Includes explicit auth errors as well as ApiError with 401/403 status codes.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::AuthFailed(_) | Self::SessionExpired { .. } | Self::Unauthorized(_)
        ) || matches!(self, Self::ApiError { status, .. } if *status == 401 || *status == 403)
    }

    /// Create a ClientError from an HTTP status response with classification.
    ///
    /// Analyzes the status code and message to pick the most specific error
    /// variant (e.g., AuthFailed instead of generic ApiError).
    pub(crate) fn from_status_response(status: u16, url: String, message: String) -> Self {
        let lower = message.to_lowercase();

        if status == 401 {
            if lower.contains("session expired")
                || lower.contains("invalid session")
                || lower.contains("token expired")
            {
                return Self::SessionExpired {
                    username: "unknown".to_string(),
                };
            }
            if lower.contains("invalid credentials")
                || lower.contains("authentication failed")
                || lower.contains("invalid username")
                || lower.contains("invalid password")
                || lower.contains("login failed")
            {
                return Self::AuthFailed(message);
            }
            return Self::Unauthorized(message);
        }

        if status == 404 {
            return Self::NotFound(url);
        }

        if status == 400 {
            return Self::InvalidRequest(message);
        }

        Self::ApiError {
            status,
            url,
            message,
        }
    }

    /// Create a ClientError from a reqwest error with transport-level classification.
    ///
    /// Analyzes transport errors to detect TLS, connection, and timeout issues.
    pub(crate) fn from_reqwest_error_classified(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::OperationTimeout {
                operation: "http_request",
                timeout: Duration::from_secs(0),
            };
        }

        let text = format!(
            "{} {}",
            error.to_string().to_lowercase(),
            error
                .source()
                .map(|s| s.to_string().to_lowercase())
                .unwrap_or_default()
        );

        if text.contains("tls")
            || text.contains("ssl")
            || text.contains("certificate")
            || text.contains("x509")
            || text.contains("handshake")
            || text.contains("unknown ca")
        {
            return Self::TlsError(error.to_string());
        }

        if text.contains("connection refused")
            || text.contains("connection reset")
            || text.contains("broken pipe")
            || text.contains("network unreachable")
            || text.contains("no such host")
            || text.contains("dns")
        {
            return Self::ConnectionRefused(error.to_string());
        }

        Self::HttpError(error)
    }
}
