//! Environment variable helpers.
//!
//! Responsibilities:
//! - Read environment variables with empty/whitespace filtering.
//! - Load `.env` files before any variable is consulted.
//!
//! Does NOT handle:
//! - Precedence between variable families (the server's resolver owns that).
//! - Parsing values into typed fields (see `SplunkConfig::set_field`).
//!
//! Invariants / Assumptions:
//! - Empty or whitespace-only environment variables are treated as unset.

use crate::error::ConfigError;

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Load a `.env` file from the current directory if one exists.
///
/// A missing file is not an error; a malformed one is.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::DotenvError(e)),
    }
}
