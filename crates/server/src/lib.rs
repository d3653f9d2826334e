//! Splunk MCP server runtime.
//!
//! This crate is the server-side core that exposes a catalogue of Splunk
//! operations to MCP clients:
//!
//! - [`resolve`]: per-invocation client configuration resolution from a
//!   prioritized chain of sources, so one process can multiplex tenants
//! - [`pool`]: lazily created, fingerprint-keyed Splunk session cache with
//!   single-flight handshakes and an idle reaper
//! - [`registry`]: the frozen-after-discovery component registry for tools,
//!   resources, prompts, and workflows
//! - [`discovery`]: startup loader that validates and registers components
//!   from the layered core + contrib namespace
//! - [`surface`]: the rmcp `ServerHandler` binding the registry to the MCP
//!   protocol, plus the re-entrant dispatcher all invocations flow through
//! - [`workflow`]: the declarative multi-phase workflow engine

#![cfg_attr(not(test), warn(clippy::unwrap_used))]

pub mod context;
pub mod discovery;
pub mod envelope;
pub mod error;
pub mod pool;
pub mod prompts;
pub mod registry;
pub mod resolve;
pub mod resources;
pub mod surface;
pub mod tools;
pub mod transport;
pub mod workflow;

pub use context::{ClientIdentity, InvocationContext, TransportKind};
pub use envelope::Envelope;
pub use error::ServerError;
pub use surface::{Dispatcher, SplunkMcpServer};
