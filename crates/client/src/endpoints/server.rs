//! Server info and health endpoints.

use reqwest::Client;
use serde_json::Value;

use crate::endpoints::send_request_with_retry;
use crate::error::{ClientError, Result};
use crate::models::{HealthReport, ServerInfo, SplunkResponse};

/// Fetch server information.
pub async fn get_server_info(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    max_retries: usize,
) -> Result<ServerInfo> {
    let url = format!("{base_url}/services/server/info");

    let builder = client
        .get(&url)
        .header("Authorization", format!("Bearer {auth_token}"))
        .query(&[("output_mode", "json")]);
    let response = send_request_with_retry(builder, max_retries).await?;

    let resp: SplunkResponse<ServerInfo> = response.json().await?;
    resp.entry
        .into_iter()
        .next()
        .map(|e| e.content)
        .ok_or_else(|| ClientError::InvalidResponse("Empty server info response".to_string()))
}

/// Fetch the splunkd health report.
pub async fn get_health(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    max_retries: usize,
) -> Result<HealthReport> {
    let url = format!("{base_url}/services/server/health/splunkd");

    let builder = client
        .get(&url)
        .header("Authorization", format!("Bearer {auth_token}"))
        .query(&[("output_mode", "json")]);
    let response = send_request_with_retry(builder, max_retries).await?;

    let body: Value = response.json().await?;
    let content = body["entry"][0]["content"].clone();
    let health = content["health"].as_str().unwrap_or("unknown").to_string();
    let features = content["features"]
        .as_object()
        .cloned()
        .unwrap_or_default();

    Ok(HealthReport { health, features })
}
