//! Splunk REST API client.
//!
//! This crate provides the Splunk collaborator for the MCP server: a
//! type-safe client for the Splunk Enterprise REST API v9+ supporting both
//! session token and API token authentication with automatic session renewal.
//! It is constructed per resolved [`splunk_config::SplunkConfig`]; the
//! server's session pool caches one client per config fingerprint.

mod auth;
mod client;
mod error;
pub mod models;

pub mod endpoints;

pub use auth::{AuthStrategy, SessionManager};
pub use client::{SplunkClient, SplunkClientBuilder};
pub use error::{ClientError, Result};
pub use models::{App, HealthReport, Index, SearchOptions, ServerInfo};
