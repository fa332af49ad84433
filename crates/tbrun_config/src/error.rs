//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur while building a [`HarnessConfig`](crate::HarnessConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("{0} must be defined in environment")]
    MissingVar(String),

    /// A required environment variable is set to an empty string.
    #[error("{0} must be defined in environment as a non-empty string")]
    EmptyVar(String),

    /// `REPO_ROOT` points at a path that does not exist.
    #[error("REPO_ROOT path must exist: {}", .0.display())]
    RepoRootMissing(PathBuf),

    /// `SIM` names a simulator no backend recognizes.
    #[error("unknown simulator '{0}' (expected a name starting with icarus or verilator)")]
    UnknownBackend(String),

    /// A required field is missing or empty in `tbrun.toml`.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
