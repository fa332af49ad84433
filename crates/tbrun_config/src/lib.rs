//! Harness configuration: environment selection plus optional `tbrun.toml`.
//!
//! A [`HarnessConfig`] is built once at process start from `REPO_ROOT`, `SIM`
//! and the optional `tbrun.toml` file at the repository root, then passed by
//! reference to every component that needs it.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    load_config_from_env, load_config_with, load_file_config_from_str, load_verdict_settings,
    verdict_settings, CONFIG_FILE, REPO_ROOT_VAR, SIM_VAR,
};
pub use types::*;
