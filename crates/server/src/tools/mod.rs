//! Core and contrib tool catalogues.
//!
//! Tools register statically from these modules (the compiled equivalent of
//! the layered tools directories): `core_entries` ships with the server,
//! `contrib_entries` carries community tools. Workflow definitions stay
//! file-discovered; see [`crate::discovery`].

mod apps;
mod contrib;
mod health;
mod indexes;
mod narrative;
mod search;
mod workflow;

use serde_json::Value;

use crate::error::ServerError;
use crate::registry::{ArgObject, ComponentEntry};

pub use narrative::OPENAI_API_KEY_VAR;
pub use workflow::{LIST_WORKFLOWS_TOOL, RUN_WORKFLOW_TOOL};

/// Core tools shipped with the server.
///
/// The LLM narrator registers only when `OPENAI_API_KEY` is set; its absence
/// is non-fatal and workflow summaries fall back to the deterministic
/// template.
pub fn core_entries() -> Vec<ComponentEntry> {
    let mut entries = vec![
        search::entry(),
        indexes::entry(),
        apps::entry(),
        health::entry(),
        workflow::run_entry(),
        workflow::list_entry(),
    ];
    if narrative::is_configured() {
        entries.push(narrative::entry());
    }
    entries
}

/// Community-supplied tools.
pub fn contrib_entries() -> Vec<ComponentEntry> {
    vec![contrib::server_info_entry()]
}

/// Read a string argument.
pub(crate) fn arg_str<'a>(args: &'a ArgObject, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// Read a required string argument.
pub(crate) fn require_str<'a>(args: &'a ArgObject, name: &str) -> Result<&'a str, ServerError> {
    arg_str(args, name).ok_or_else(|| ServerError::InvalidArgs {
        message: format!("argument '{name}' must be a string"),
        details: None,
    })
}

/// Read an unsigned integer argument.
pub(crate) fn arg_u64(args: &ArgObject, name: &str) -> Option<u64> {
    args.get(name).and_then(Value::as_u64)
}

/// Read an object argument.
pub(crate) fn arg_object<'a>(
    args: &'a ArgObject,
    name: &str,
) -> Option<&'a serde_json::Map<String, Value>> {
    args.get(name).and_then(Value::as_object)
}
