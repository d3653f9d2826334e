//! Configuration types for the Splunk MCP server.
//!
//! This crate provides the per-invocation Splunk connection configuration,
//! the source-tracking types used by the resolver, and environment variable
//! helpers shared across the workspace.

#![cfg_attr(not(test), warn(clippy::unwrap_used))]

pub mod constants;
pub mod env;
mod error;
mod source;
mod splunk;

pub use env::env_var_or_none;
pub use error::ConfigError;
pub use source::{ConfigField, ConfigSource, SourceMap};
pub use splunk::{Fingerprint, Scheme, SplunkConfig};
