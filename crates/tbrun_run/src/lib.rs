//! Run assembly and dispatch for tbrun.
//!
//! This crate turns a module directory and a [`ParameterSet`] into simulator
//! invocations:
//!
//! - [`params`] derives the run key that namespaces every artifact directory.
//! - [`backend`] holds one [`SimBackend`] per supported simulator.
//! - [`invoke`] assembles [`RunRequest`]s for simulation and lint builds.
//! - [`bitstream`] drives the FPGA build pipeline.
//! - [`runner`] launches the resulting processes.

#![warn(missing_docs)]

pub mod backend;
pub mod bitstream;
pub mod error;
pub mod invoke;
pub mod params;
pub mod request;
pub mod runner;

pub use backend::{backend_for, BuildDirPolicy, SimBackend, HARNESS_MODULE};
pub use bitstream::build_bitstream;
pub use error::RunError;
pub use invoke::{
    build_request, lint, run_name, run_paths, simulate, simulate_sweep, testbench_name,
    LintOptions, RunPaths, SimulationOptions, SimulationOutcome,
};
pub use params::{
    parse_assignment, parse_sweep_axis, run_key, ParamError, ParamValue, ParameterSet,
};
pub use request::{RunRequest, ToolInvocation, ToolOutput, VerdictWatch};
pub use runner::{dispatch, RecordingRunner, SystemRunner, ToolRunner};
