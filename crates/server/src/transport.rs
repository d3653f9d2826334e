//! Transport layers: stdio and streaming HTTP.
//!
//! Stdio serves line-delimited JSON over standard streams (logs go to
//! stderr). HTTP serves the MCP Streamable HTTP transport on a single
//! `/mcp` endpoint via axum, with session identity assigned by the local
//! session manager and `X-Splunk-*` headers visible to the resolver through
//! rmcp request extensions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::ServiceExt;
use tracing::info;

use crate::surface::SplunkMcpServer;

/// Serve over standard streams until the client disconnects.
pub async fn serve_stdio(server: SplunkMcpServer) -> anyhow::Result<()> {
    info!("starting MCP server on stdio");
    let service = server
        .serve(rmcp::transport::io::stdio())
        .await
        .context("failed to start stdio transport")?;
    service.waiting().await.context("stdio transport failed")?;
    info!("stdio transport closed");
    Ok(())
}

/// Serve the Streamable HTTP transport on `host:port`.
///
/// `cors_disabled` removes the permissive CORS layer for local development
/// setups that dislike it.
pub async fn serve_http(
    server: SplunkMcpServer,
    host: &str,
    port: u16,
    cors_disabled: bool,
) -> anyhow::Result<()> {
    let config = StreamableHttpServerConfig {
        sse_keep_alive: Some(Duration::from_secs(15)),
        stateful_mode: true,
        ..Default::default()
    };

    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        config,
    );

    let mut app = axum::Router::new().route(
        "/mcp",
        axum::routing::any(move |req: axum::extract::Request| {
            let service = service.clone();
            async move { service.handle(req).await }
        }),
    );
    if !cors_disabled {
        app = app.layer(tower_http::cors::CorsLayer::permissive());
    }

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("MCP Streamable HTTP server on http://{addr}/mcp");

    axum::serve(listener, app)
        .await
        .context("HTTP transport failed")?;
    Ok(())
}
