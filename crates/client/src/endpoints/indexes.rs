//! Index management endpoints.

use reqwest::Client;

use crate::endpoints::send_request_with_retry;
use crate::error::Result;
use crate::models::{Index, SplunkResponse};

/// List indexes, copying each entry name into its content.
pub async fn list_indexes(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    count: Option<u64>,
    max_retries: usize,
) -> Result<Vec<Index>> {
    let url = format!("{base_url}/services/data/indexes");

    let builder = client
        .get(&url)
        .header("Authorization", format!("Bearer {auth_token}"))
        .query(&[
            ("output_mode", "json".to_string()),
            ("count", count.unwrap_or(30).to_string()),
        ]);
    let response = send_request_with_retry(builder, max_retries).await?;

    let resp: SplunkResponse<Index> = response.json().await?;

    Ok(resp
        .entry
        .into_iter()
        .map(|e| {
            let mut index = e.content;
            index.name = e.name;
            index
        })
        .collect())
}

/// Fetch a single index by name.
pub async fn get_index(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    name: &str,
    max_retries: usize,
) -> Result<Index> {
    let url = format!("{base_url}/services/data/indexes/{name}");

    let builder = client
        .get(&url)
        .header("Authorization", format!("Bearer {auth_token}"))
        .query(&[("output_mode", "json")]);
    let response = send_request_with_retry(builder, max_retries).await?;

    let resp: SplunkResponse<Index> = response.json().await?;
    resp.entry
        .into_iter()
        .next()
        .map(|e| {
            let mut index = e.content;
            index.name = e.name;
            index
        })
        .ok_or_else(|| {
            crate::error::ClientError::NotFound(format!("index '{name}' not found"))
        })
}
