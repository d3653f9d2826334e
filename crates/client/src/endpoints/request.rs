//! Retry helper for HTTP requests with exponential backoff.
//!
//! Wraps a `reqwest::RequestBuilder` with retry logic that detects HTTP 429
//! responses, backs off exponentially (1s, 2s, 4s), and classifies non-success
//! responses into [`ClientError`] variants.

use reqwest::{RequestBuilder, Response};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::models::SplunkMessages;

/// Sends an HTTP request with automatic retry on HTTP 429 responses.
///
/// # Errors
///
/// Returns `ClientError::MaxRetriesExceeded` when retries are exhausted, a
/// classified transport error for connection/TLS/timeout failures, and a
/// classified API error for non-success status codes.
pub async fn send_request_with_retry(builder: RequestBuilder, max_retries: usize) -> Result<Response> {
    for attempt in 0..=max_retries {
        let attempt_builder = match builder.try_clone() {
            Some(cloned) => cloned,
            None => {
                if attempt == 0 {
                    debug!("Request builder cannot be cloned, single attempt only");
                    return builder
                        .send()
                        .await
                        .map_err(ClientError::from_reqwest_error_classified);
                }
                return Err(ClientError::MaxRetriesExceeded(attempt));
            }
        };

        match attempt_builder.send().await {
            Ok(response) if response.status().as_u16() == 429 => {
                if attempt < max_retries {
                    let backoff_secs = 2u64.pow(attempt as u32);
                    debug!(
                        attempt = attempt + 1,
                        backoff_secs, "Rate limited (HTTP 429), retrying with exponential backoff"
                    );
                    tokio::time::sleep(tokio::time::Duration::from_secs(backoff_secs)).await;
                } else {
                    return Err(ClientError::MaxRetriesExceeded(max_retries + 1));
                }
            }
            Ok(response) => {
                if response.status().is_success() {
                    if attempt > 0 {
                        debug!(attempt = attempt + 1, "Request succeeded after retry");
                    }
                    return Ok(response);
                }

                let status = response.status().as_u16();
                let url = response.url().to_string();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error response body".to_string());

                // Splunk error bodies carry a messages array; surface it cleanly
                let message = if let Ok(m) = serde_json::from_str::<SplunkMessages>(&body) {
                    m.messages
                        .iter()
                        .map(|msg| format!("{}: {}", msg.message_type, msg.text))
                        .collect::<Vec<_>>()
                        .join("; ")
                } else {
                    body
                };

                return Err(ClientError::from_status_response(status, url, message));
            }
            Err(e) => {
                return Err(ClientError::from_reqwest_error_classified(e));
            }
        }
    }

    Err(ClientError::MaxRetriesExceeded(max_retries + 1))
}
