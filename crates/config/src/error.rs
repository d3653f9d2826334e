//! Error types for configuration handling.

use thiserror::Error;

/// Errors raised while reading or validating configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A value failed to parse or violated a constraint.
    #[error("Invalid value for {var}: {message}")]
    InvalidValue {
        /// The variable, header, or argument that carried the value.
        var: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A `.env` file was present but could not be loaded.
    #[error("Failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}
