//! Error types for invocation assembly and tool dispatch.

use std::path::PathBuf;

use tbrun_manifest::ManifestError;

/// Errors that can occur while assembling or dispatching a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The module manifest could not be read.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The module directory has no usable base name.
    #[error("module directory has no base name: {}", .0.display())]
    InvalidModuleDir(PathBuf),

    /// A directory or shim file could not be written.
    #[error("failed to prepare {}: {source}", .path.display())]
    Io {
        /// The path being created or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An external tool could not be started.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An external tool exited unsuccessfully.
    #[error("{program} exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    ToolFailed {
        /// The program that failed.
        program: String,
        /// Exit code, or `None` if terminated by a signal.
        code: Option<i32>,
        /// The last lines the tool wrote to stderr.
        stderr: String,
    },

    /// The bitstream build pipeline failed.
    #[error("bitstream build `{program} {}` failed with {}", .targets.join(" "), exit_label(.code))]
    BitstreamFailed {
        /// The build program.
        program: String,
        /// The targets that were requested.
        targets: Vec<String>,
        /// Exit code, or `None` if terminated by a signal.
        code: Option<i32>,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(":\n{}", stderr.trim_end())
    }
}

impl RunError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}
