//! Splunk MCP server binary.
//!
//! Responsibilities:
//! - Parse CLI flags and environment configuration.
//! - Run component discovery and freeze the registry.
//! - Start the session pool reaper and the selected transport.
//!
//! Does NOT handle:
//! - Splunk REST details (see `crates/client`).
//! - Per-invocation config resolution (see `resolve` in the library).
//!
//! Invariants / Assumptions:
//! - `.env` is loaded BEFORE CLI parsing so clap env defaults can read it.
//! - Logs go to stderr; stdout belongs to the stdio transport.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use splunk_config::constants::{
    DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT, DEFAULT_POOL_IDLE_TTL_SECS,
    DEFAULT_WORKFLOW_PARALLELISM,
};
use splunk_mcp_server::discovery::{self, WorkflowRoot};
use splunk_mcp_server::pool::SessionPool;
use splunk_mcp_server::registry::{ComponentRegistry, Origin};
use splunk_mcp_server::{prompts, resources, tools, transport};
use splunk_mcp_server::{Dispatcher, SplunkMcpServer, TransportKind};

/// MCP server exposing Splunk tools, resources, prompts, and workflows.
#[derive(Parser, Debug)]
#[command(name = "splunk-mcp-server", version, about)]
struct Cli {
    /// Transport: stdio or http.
    #[arg(long, env = "MCP_TRANSPORT", default_value = "stdio")]
    transport: String,

    /// Bind host for the HTTP transport.
    #[arg(long, env = "MCP_HTTP_HOST", default_value = DEFAULT_HTTP_HOST)]
    http_host: String,

    /// Bind port for the HTTP transport.
    #[arg(long, env = "MCP_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    http_port: u16,

    /// Disable the permissive CORS layer on the HTTP transport.
    #[arg(long, env = "MCP_CORS_DISABLED", default_value_t = false)]
    cors_disabled: bool,

    /// Directory of core workflow JSON definitions.
    #[arg(long, env = "MCP_CORE_WORKFLOWS_DIR", default_value = "workflows/core")]
    core_workflows_dir: PathBuf,

    /// Directory of contrib workflow JSON definitions.
    #[arg(long, env = "MCP_WORKFLOWS_DIR")]
    workflows_dir: Option<PathBuf>,

    /// Idle TTL for pooled Splunk sessions, in seconds.
    #[arg(long, env = "MCP_SESSION_IDLE_TTL_SECS", default_value_t = DEFAULT_POOL_IDLE_TTL_SECS)]
    session_idle_ttl_secs: u64,

    /// Bound on parallel tasks within one workflow phase.
    #[arg(long, env = "MCP_WORKFLOW_PARALLELISM", default_value_t = DEFAULT_WORKFLOW_PARALLELISM)]
    workflow_parallelism: usize,

    /// Allow registration after discovery (hot reload).
    #[arg(long, env = "MCP_HOT_RELOAD", default_value_t = false)]
    hot_reload: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env BEFORE CLI parsing so clap env defaults can read .env values.
    splunk_config::env::load_dotenv()?;

    let cli = Cli::parse();

    // Logs on stderr; stdout belongs to the stdio transport.
    let filter = EnvFilter::try_from_env("MCP_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = if cli.hot_reload {
        Arc::new(ComponentRegistry::with_hot_reload())
    } else {
        Arc::new(ComponentRegistry::new())
    };

    let mut core_entries = tools::core_entries();
    core_entries.extend(resources::core_entries());
    core_entries.extend(prompts::core_entries());
    let catalogues = vec![
        (Origin::Core, core_entries),
        (Origin::Contrib, tools::contrib_entries()),
    ];

    let mut workflow_roots = Vec::new();
    if cli.core_workflows_dir.is_dir() {
        workflow_roots.push(WorkflowRoot {
            origin: Origin::Core,
            path: cli.core_workflows_dir.clone(),
        });
    }
    if let Some(dir) = &cli.workflows_dir {
        workflow_roots.push(WorkflowRoot {
            origin: Origin::Contrib,
            path: dir.clone(),
        });
    }

    let report = discovery::run(&registry, catalogues, workflow_roots);
    for failure in &report.failures {
        tracing::warn!(path = %failure.path, kind = %failure.kind, reason = %failure.reason, "component load failure");
    }

    let pool = Arc::new(SessionPool::with_idle_ttl(Duration::from_secs(
        cli.session_idle_ttl_secs,
    )));
    let reaper = pool.spawn_reaper();

    let dispatcher = Dispatcher::new(
        Arc::clone(&registry),
        Arc::clone(&pool),
        cli.workflow_parallelism,
    );

    let result = match cli.transport.as_str() {
        "http" => {
            let server = SplunkMcpServer::new(dispatcher, TransportKind::Http);
            transport::serve_http(server, &cli.http_host, cli.http_port, cli.cors_disabled).await
        }
        "stdio" => {
            let server = SplunkMcpServer::new(dispatcher, TransportKind::Stdio);
            transport::serve_stdio(server).await
        }
        other => Err(anyhow::anyhow!(
            "unknown transport '{other}': expected stdio or http"
        )),
    };

    reaper.abort();
    pool.clear();
    result
}
