//! Search job endpoints.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::endpoints::send_request_with_retry;
use crate::error::{ClientError, Result};
use crate::models::{SearchJobStatus, SearchOptions, SplunkResponse};

/// Create a new search job, returning its sid.
pub async fn create_job(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    query: &str,
    options: &SearchOptions,
    max_retries: usize,
) -> Result<String> {
    debug!("Creating search job: {}", query);

    let url = format!("{base_url}/services/search/jobs");

    let mut form_data: Vec<(&str, String)> = vec![
        ("search", normalize_query(query)),
        ("output_mode", "json".to_string()),
    ];
    if let Some(earliest) = &options.earliest_time {
        form_data.push(("earliest_time", earliest.clone()));
    }
    if let Some(latest) = &options.latest_time {
        form_data.push(("latest_time", latest.clone()));
    }
    if let Some(max_count) = options.max_results {
        form_data.push(("max_count", max_count.to_string()));
    }

    let builder = client
        .post(&url)
        .header("Authorization", format!("Bearer {auth_token}"))
        .form(&form_data);
    let response = send_request_with_retry(builder, max_retries).await?;

    let body: Value = response.json().await?;
    body["sid"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ClientError::InvalidResponse("Missing sid in job response".to_string()))
}

/// Get the status of a search job.
pub async fn get_job_status(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    sid: &str,
    max_retries: usize,
) -> Result<SearchJobStatus> {
    let url = format!("{base_url}/services/search/jobs/{sid}");

    let builder = client
        .get(&url)
        .header("Authorization", format!("Bearer {auth_token}"))
        .query(&[("output_mode", "json")]);
    let response = send_request_with_retry(builder, max_retries).await?;

    let resp: SplunkResponse<SearchJobStatus> = response.json().await?;
    resp.entry
        .into_iter()
        .next()
        .map(|e| e.content)
        .ok_or_else(|| ClientError::InvalidResponse("Empty job status response".to_string()))
}

/// Poll a search job until it completes or the wait budget is exhausted.
pub async fn wait_for_job(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    sid: &str,
    poll_interval_ms: u64,
    max_wait_secs: u64,
    max_retries: usize,
) -> Result<SearchJobStatus> {
    let deadline = std::time::Instant::now() + Duration::from_secs(max_wait_secs);

    loop {
        let status = get_job_status(client, base_url, auth_token, sid, max_retries).await?;
        if status.is_failed {
            return Err(ClientError::InvalidResponse(format!(
                "Search job {sid} failed on the server"
            )));
        }
        if status.is_done {
            return Ok(status);
        }
        if std::time::Instant::now() >= deadline {
            return Err(ClientError::OperationTimeout {
                operation: "wait_for_job",
                timeout: Duration::from_secs(max_wait_secs),
            });
        }
        tokio::time::sleep(Duration::from_millis(poll_interval_ms)).await;
    }
}

/// Fetch results of a completed search job.
pub async fn get_results(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    sid: &str,
    count: u64,
    offset: u64,
    max_retries: usize,
) -> Result<Vec<Value>> {
    let url = format!("{base_url}/services/search/jobs/{sid}/results");

    let builder = client
        .get(&url)
        .header("Authorization", format!("Bearer {auth_token}"))
        .query(&[
            ("output_mode", "json".to_string()),
            ("count", count.to_string()),
            ("offset", offset.to_string()),
        ]);
    let response = send_request_with_retry(builder, max_retries).await?;

    let body: Value = response.json().await?;
    match body["results"].as_array() {
        Some(results) => Ok(results.clone()),
        None => Err(ClientError::InvalidResponse(
            "Missing results array in response".to_string(),
        )),
    }
}

/// Splunk requires queries to start with a generating command; prepend
/// `search` for bare filter expressions the way the UI does.
fn normalize_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.starts_with('|') || trimmed.starts_with("search ") || trimmed == "search" {
        trimmed.to_string()
    } else {
        format!("search {trimmed}")
    }
}
