//! App listing endpoints.

use reqwest::Client;

use crate::endpoints::send_request_with_retry;
use crate::error::Result;
use crate::models::{App, SplunkResponse};

/// List locally installed apps.
pub async fn list_apps(
    client: &Client,
    base_url: &str,
    auth_token: &str,
    count: Option<u64>,
    max_retries: usize,
) -> Result<Vec<App>> {
    let url = format!("{base_url}/services/apps/local");

    let builder = client
        .get(&url)
        .header("Authorization", format!("Bearer {auth_token}"))
        .query(&[
            ("output_mode", "json".to_string()),
            ("count", count.unwrap_or(0).to_string()),
        ]);
    let response = send_request_with_retry(builder, max_retries).await?;

    let resp: SplunkResponse<App> = response.json().await?;

    Ok(resp
        .entry
        .into_iter()
        .map(|e| {
            let mut app = e.content;
            app.name = e.name;
            app
        })
        .collect())
}
