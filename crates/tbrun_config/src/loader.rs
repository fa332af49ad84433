//! Builds a [`HarnessConfig`] from environment variables and `tbrun.toml`.

use std::path::{Path, PathBuf};

use tbrun_common::{parse_duration, SimTime, Timescale};
use tracing::debug;

use crate::error::ConfigError;
use crate::types::{
    BitstreamSettings, FileConfig, HarnessConfig, SimSelector, VerdictSection, VerdictSettings,
};

/// Environment variable holding the absolute repository root.
pub const REPO_ROOT_VAR: &str = "REPO_ROOT";
/// Environment variable selecting the simulator.
pub const SIM_VAR: &str = "SIM";
/// Name of the optional configuration file at the repository root.
pub const CONFIG_FILE: &str = "tbrun.toml";

/// Loads the harness configuration from the process environment.
///
/// See [`load_config_with`] for the resolution rules.
pub fn load_config_from_env(config_file: Option<&Path>) -> Result<HarnessConfig, ConfigError> {
    load_config_with(|name| std::env::var(name).ok(), config_file)
}

/// Loads the harness configuration using `lookup` to read variables.
///
/// `REPO_ROOT` must be set, non-empty and exist; it is canonicalized. `SIM`
/// must be set and name a known backend. Settings come from `config_file` if
/// given, else from `<REPO_ROOT>/tbrun.toml` when that file exists, else from
/// defaults.
pub fn load_config_with<F>(lookup: F, config_file: Option<&Path>) -> Result<HarnessConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let repo_root = require_var(&lookup, REPO_ROOT_VAR)?;
    let repo_root = PathBuf::from(repo_root);
    if !repo_root.exists() {
        return Err(ConfigError::RepoRootMissing(repo_root));
    }
    let repo_root = repo_root.canonicalize()?;

    let sim_raw = require_var(&lookup, SIM_VAR)?;
    let sim = SimSelector::parse(&sim_raw).ok_or(ConfigError::UnknownBackend(sim_raw))?;

    let file_path = match config_file {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default_path = repo_root.join(CONFIG_FILE);
            default_path.is_file().then_some(default_path)
        }
    };

    let file_config = match &file_path {
        Some(path) => {
            debug!(path = %path.display(), "reading harness configuration");
            let content = std::fs::read_to_string(path)?;
            load_file_config_from_str(&content)?
        }
        None => FileConfig::default(),
    };

    let mut config = HarnessConfig::new(repo_root, sim);
    apply_file_config(&mut config, file_config)?;
    debug!(
        repo_root = %config.repo_root.display(),
        sim = %config.sim.name,
        "harness configuration loaded"
    );
    Ok(config)
}

/// Parses a `tbrun.toml` document.
///
/// Useful for testing without filesystem dependencies.
pub fn load_file_config_from_str(content: &str) -> Result<FileConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn require_var<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Err(ConfigError::MissingVar(name.to_string())),
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyVar(name.to_string())),
        Some(value) => Ok(value),
    }
}

/// Validates the raw file sections and stores them on `config`.
fn apply_file_config(config: &mut HarnessConfig, file: FileConfig) -> Result<(), ConfigError> {
    if let Some(ts) = &file.simulation.timescale {
        config.timescale = Timescale::parse(ts)
            .map_err(|e| ConfigError::ValidationError(format!("simulation.timescale: {e}")))?;
    }

    config.verdict = verdict_settings(file.verdict)?;

    if file.bitstream.program.trim().is_empty() {
        return Err(ConfigError::MissingField("bitstream.program".to_string()));
    }
    if file.bitstream.targets.is_empty() {
        return Err(ConfigError::MissingField("bitstream.targets".to_string()));
    }
    config.bitstream = BitstreamSettings {
        program: file.bitstream.program,
        targets: file.bitstream.targets,
    };
    Ok(())
}

/// Validates a `[verdict]` section.
pub fn verdict_settings(verdict: VerdictSection) -> Result<VerdictSettings, ConfigError> {
    let settle = duration_field("verdict.settle", &verdict.settle)?;
    let timeout = verdict
        .timeout
        .as_deref()
        .map(|t| duration_field("verdict.timeout", t))
        .transpose()?;
    if let Some(deadline) = timeout {
        if deadline <= settle {
            return Err(ConfigError::ValidationError(format!(
                "verdict.timeout ({deadline}) must be later than verdict.settle ({settle})"
            )));
        }
    }
    for (field, value) in [
        ("verdict.error_signal", &verdict.error_signal),
        ("verdict.pass_signal", &verdict.pass_signal),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(field.to_string()));
        }
    }
    if verdict.error_signal == verdict.pass_signal {
        return Err(ConfigError::ValidationError(
            "verdict.error_signal and verdict.pass_signal must differ".to_string(),
        ));
    }
    Ok(VerdictSettings {
        settle,
        timeout,
        tie_break: verdict.tie_break,
        error_signal: verdict.error_signal,
        pass_signal: verdict.pass_signal,
    })
}

/// Reads only the verdict settings, from `config_file` if given.
///
/// Needs neither `REPO_ROOT` nor `SIM`, so a recorded waveform can be judged
/// outside a repository.
pub fn load_verdict_settings(config_file: Option<&Path>) -> Result<VerdictSettings, ConfigError> {
    match config_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            verdict_settings(load_file_config_from_str(&content)?.verdict)
        }
        None => Ok(VerdictSettings::default()),
    }
}

fn duration_field(field: &str, value: &str) -> Result<SimTime, ConfigError> {
    parse_duration(value).map_err(|e| ConfigError::ValidationError(format!("{field}: {e}")))
}
