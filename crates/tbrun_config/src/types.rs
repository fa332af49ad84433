//! Configuration types: the raw `tbrun.toml` schema and the resolved harness config.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use tbrun_common::{SimTime, Timescale};

/// The contents of an optional `tbrun.toml` file, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Simulation defaults.
    #[serde(default)]
    pub simulation: SimulationSection,
    /// Verdict monitor settings.
    #[serde(default)]
    pub verdict: VerdictSection,
    /// Bitstream build settings.
    #[serde(default)]
    pub bitstream: BitstreamSection,
}

/// `[simulation]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    /// Default timescale for runs that do not pass one explicitly.
    #[serde(default)]
    pub timescale: Option<String>,
}

/// `[verdict]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerdictSection {
    /// Settling delay before the init check, e.g. `"1ns"`.
    #[serde(default = "default_settle")]
    pub settle: String,
    /// Optional deadline for the verdict wait.
    #[serde(default)]
    pub timeout: Option<String>,
    /// Resolution for rising edges on both signals at the same timestamp.
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Path or name of the error signal.
    #[serde(default = "default_error_signal")]
    pub error_signal: String,
    /// Path or name of the pass signal.
    #[serde(default = "default_pass_signal")]
    pub pass_signal: String,
}

impl Default for VerdictSection {
    fn default() -> Self {
        Self {
            settle: default_settle(),
            timeout: None,
            tie_break: TieBreak::default(),
            error_signal: default_error_signal(),
            pass_signal: default_pass_signal(),
        }
    }
}

/// `[bitstream]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BitstreamSection {
    /// The build program to invoke.
    #[serde(default = "default_make")]
    pub program: String,
    /// Targets passed to the build program, run in order.
    #[serde(default = "default_bitstream_targets")]
    pub targets: Vec<String>,
}

impl Default for BitstreamSection {
    fn default() -> Self {
        Self {
            program: default_make(),
            targets: default_bitstream_targets(),
        }
    }
}

fn default_settle() -> String {
    "1ns".to_string()
}

fn default_error_signal() -> String {
    "error_o".to_string()
}

fn default_pass_signal() -> String {
    "pass_o".to_string()
}

fn default_make() -> String {
    "make".to_string()
}

fn default_bitstream_targets() -> Vec<String> {
    vec!["clean".to_string(), "bitstream".to_string()]
}

/// How the verdict monitor resolves both signals rising in the same time step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Simultaneous activation is a failure.
    #[default]
    Fail,
    /// Simultaneous activation is a pass.
    Pass,
}

/// The simulator families the harness knows how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Icarus Verilog: compiles to a script and interprets it, no reusable build.
    Icarus,
    /// Verilator: elaborates to a compiled executable in a separate build tree.
    Verilator,
}

impl BackendKind {
    /// Picks a backend from a lower-cased `SIM` value by prefix.
    pub fn from_selector(selector: &str) -> Option<Self> {
        if selector.starts_with("icarus") {
            Some(BackendKind::Icarus)
        } else if selector.starts_with("verilator") {
            Some(BackendKind::Verilator)
        } else {
            None
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Icarus => write!(f, "icarus"),
            BackendKind::Verilator => write!(f, "verilator"),
        }
    }
}

/// The simulator selected through `SIM`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimSelector {
    /// The backend family.
    pub kind: BackendKind,
    /// The lower-cased selector exactly as given, used in artifact paths.
    pub name: String,
}

impl SimSelector {
    /// Normalizes a raw `SIM` value and matches it to a backend.
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim().to_lowercase();
        let kind = BackendKind::from_selector(&name)?;
        Some(Self { kind, name })
    }
}

/// Validated verdict monitor settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerdictSettings {
    /// Delay after simulation start at which both signals must be resolved and low.
    pub settle: SimTime,
    /// Deadline for the verdict; `None` waits for the end of the trace.
    pub timeout: Option<SimTime>,
    /// Same-timestamp resolution policy.
    pub tie_break: TieBreak,
    /// Path or name of the error signal.
    pub error_signal: String,
    /// Path or name of the pass signal.
    pub pass_signal: String,
}

impl Default for VerdictSettings {
    fn default() -> Self {
        Self {
            settle: SimTime::from_ns(1),
            timeout: None,
            tie_break: TieBreak::Fail,
            error_signal: default_error_signal(),
            pass_signal: default_pass_signal(),
        }
    }
}

/// Validated bitstream build settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitstreamSettings {
    /// The build program to invoke.
    pub program: String,
    /// Targets passed to the build program.
    pub targets: Vec<String>,
}

impl Default for BitstreamSettings {
    fn default() -> Self {
        Self {
            program: default_make(),
            targets: default_bitstream_targets(),
        }
    }
}

/// The fully resolved harness configuration.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Absolute, existing repository root; manifest paths are relative to it.
    pub repo_root: PathBuf,
    /// The selected simulator.
    pub sim: SimSelector,
    /// Default timescale for runs.
    pub timescale: Timescale,
    /// Verdict monitor settings.
    pub verdict: VerdictSettings,
    /// Bitstream build settings.
    pub bitstream: BitstreamSettings,
}

impl HarnessConfig {
    /// Creates a config with default settings for the given root and simulator.
    pub fn new(repo_root: impl Into<PathBuf>, sim: SimSelector) -> Self {
        Self {
            repo_root: repo_root.into(),
            sim,
            timescale: Timescale::default(),
            verdict: VerdictSettings::default(),
            bitstream: BitstreamSettings::default(),
        }
    }
}
