//! The simulator-agnostic run request and the concrete tool invocations a
//! backend derives from it.

use std::fmt;
use std::path::PathBuf;

use tbrun_common::{SimTime, Timescale};
use tbrun_config::VerdictSettings;

use crate::params::ParameterSet;

/// The verdict outputs a run watches so the simulation ends once it is decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerdictWatch {
    /// Hierarchical reference to the error output.
    pub error: String,
    /// Hierarchical reference to the pass output.
    pub pass: String,
    /// End the simulation here if neither output has risen.
    pub deadline: Option<SimTime>,
}

impl VerdictWatch {
    /// Watches the configured verdict outputs of `top`.
    ///
    /// A bare signal name is taken to live directly in `top`; a dotted one
    /// is used as the full hierarchical reference.
    pub fn new(top: &str, settings: &VerdictSettings) -> Self {
        let reference = |name: &str| {
            if name.contains('.') {
                name.to_string()
            } else {
                format!("{top}.{name}")
            }
        };
        Self {
            error: reference(&settings.error_signal),
            pass: reference(&settings.pass_signal),
            deadline: settings.timeout,
        }
    }
}

/// Everything a backend needs to compile and run one testbench.
///
/// Built fresh for each invocation and consumed by a single dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct RunRequest {
    /// Absolute HDL source paths in manifest order.
    pub sources: Vec<PathBuf>,
    /// The top-level HDL entity.
    pub top: String,
    /// The testbench module identifier exported to the simulation.
    pub testbench: String,
    /// Selected test case, or `None` for every test case.
    pub testcase: Option<String>,
    /// Simulation timescale.
    pub timescale: Timescale,
    /// Parameter overrides for the top entity.
    pub parameters: ParameterSet,
    /// Preprocessor defines, `NAME` or `NAME=VALUE`.
    pub defines: Vec<String>,
    /// Include directories.
    pub includes: Vec<PathBuf>,
    /// Extra arguments for the compile step.
    pub compile_args: Vec<String>,
    /// Extra plus-arguments for the run step.
    pub plus_args: Vec<String>,
    /// Arguments for the build-system step; empty skips it.
    pub make_args: Vec<String>,
    /// Execution directory.
    pub work_dir: PathBuf,
    /// Compiled-artifact directory.
    pub build_dir: PathBuf,
    /// Capture a waveform during the run.
    pub waves: bool,
    /// Verdict outputs that end the run; `None` runs until the testbench finishes.
    pub verdict: Option<VerdictWatch>,
    /// Stop after compilation.
    pub compile_only: bool,
    /// The selector string the run was keyed under.
    pub sim_name: String,
}

/// One external process to launch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Program name or path.
    pub program: String,
    /// Arguments, not including the program.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Additional environment variables.
    pub env: Vec<(String, String)>,
}

impl ToolInvocation {
    /// Creates an invocation with no arguments or environment.
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// What a finished tool reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if terminated by a signal.
    pub code: Option<i32>,
    /// Tail of the captured stderr.
    pub stderr: String,
}

impl ToolOutput {
    /// A successful exit with no output.
    pub fn success() -> Self {
        Self {
            code: Some(0),
            stderr: String::new(),
        }
    }

    /// Returns true for exit status zero.
    pub fn succeeded(&self) -> bool {
        self.code == Some(0)
    }
}
