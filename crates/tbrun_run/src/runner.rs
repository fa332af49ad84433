//! Launching external tools.
//!
//! Backends only describe processes as [`ToolInvocation`]s; a [`ToolRunner`]
//! turns them into real processes. [`SystemRunner`] is the production runner,
//! [`RecordingRunner`] records invocations without launching anything.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use tracing::debug;

use crate::error::RunError;
use crate::request::{ToolInvocation, ToolOutput};

/// Number of trailing stderr lines kept for error reports.
pub const STDERR_TAIL_LINES: usize = 20;

/// Something that can execute a [`ToolInvocation`].
///
/// Runners are shared across parallel sweep points, hence `Sync`.
pub trait ToolRunner: Sync {
    /// Runs one tool to completion and reports how it exited.
    ///
    /// A non-zero exit is reported through [`ToolOutput::code`], not as `Err`;
    /// `Err` is reserved for tools that could not be started.
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RunError>;
}

/// Runs each invocation in order, stopping at the first unsuccessful one.
pub fn dispatch(runner: &dyn ToolRunner, invocations: &[ToolInvocation]) -> Result<(), RunError> {
    for invocation in invocations {
        debug!(cwd = %invocation.cwd.display(), "running {invocation}");
        let output = runner.run(invocation)?;
        if !output.succeeded() {
            return Err(RunError::ToolFailed {
                program: invocation.program.clone(),
                code: output.code,
                stderr: output.stderr,
            });
        }
    }
    Ok(())
}

/// Launches real processes with [`std::process::Command`].
///
/// Standard output is passed through to the terminal; standard error is
/// passed through as well and its tail is kept for diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RunError> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| RunError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let _ = std::io::stderr().write_all(&output.stderr);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(ToolOutput {
            code: output.status.code(),
            stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
        })
    }
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// A runner that records every invocation and reports scripted results.
///
/// Used by tests and dry runs. By default every tool succeeds; programs
/// registered with [`fail_program`](Self::fail_program) exit with the given
/// status instead. With [`writes_waveform`](Self::writes_waveform) the run
/// step also leaves a VCD behind.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    failures: Vec<(String, i32, String)>,
    waveform: Option<String>,
}

impl RecordingRunner {
    /// Creates a runner on which every tool succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every invocation of `program` exit with `code` and `stderr`.
    pub fn fail_program(mut self, program: &str, code: i32, stderr: &str) -> Self {
        self.failures
            .push((program.to_string(), code, stderr.to_string()));
        self
    }

    /// Makes each run step write `vcd` to `<cwd>/<TOPLEVEL>.vcd`, where the
    /// generated harness module would dump it.
    ///
    /// The run step is the invocation that exports `TOPLEVEL`.
    pub fn writes_waveform(mut self, vcd: impl Into<String>) -> Self {
        self.waveform = Some(vcd.into());
        self
    }

    /// Returns the invocations seen so far, in call order.
    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RunError> {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(invocation.clone()),
            Err(poisoned) => poisoned.into_inner().push(invocation.clone()),
        }
        let failure = self
            .failures
            .iter()
            .find(|(program, _, _)| *program == invocation.program);
        if let Some((_, code, stderr)) = failure {
            return Ok(ToolOutput {
                code: Some(*code),
                stderr: stderr.clone(),
            });
        }
        let top = invocation
            .env
            .iter()
            .find(|(key, _)| key == "TOPLEVEL")
            .map(|(_, value)| value);
        if let (Some(vcd), Some(top)) = (&self.waveform, top) {
            let path = invocation.cwd.join(format!("{top}.vcd"));
            std::fs::write(&path, vcd).map_err(|e| RunError::io(&path, e))?;
        }
        Ok(ToolOutput::success())
    }
}
