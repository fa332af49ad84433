//! Simulator backends.
//!
//! A [`SimBackend`] turns a [`RunRequest`] into the concrete processes for
//! one simulator. The invokers only talk to this trait, so a new simulator is
//! a new implementation here and nothing else.

mod icarus;
mod verilator;

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tbrun_config::BackendKind;

use crate::error::RunError;
use crate::request::{RunRequest, ToolInvocation};

pub use icarus::Icarus;
pub use verilator::Verilator;

/// Where a backend keeps compiled artifacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildDirPolicy {
    /// Nothing is reused between runs; the work directory doubles as the build directory.
    ReuseWorkDir,
    /// Compiled artifacts are reusable and live in their own run-key-scoped build directory.
    Separate,
}

/// Generated module that dumps the waveform and ends the run on a verdict.
pub const HARNESS_MODULE: &str = "tbrun_waves";

/// One simulator family.
pub trait SimBackend: Send + Sync {
    /// Short backend name.
    fn name(&self) -> &'static str;

    /// Where compiled artifacts go.
    fn build_dir_policy(&self) -> BuildDirPolicy;

    /// Arguments always added to the compile step.
    fn extra_compile_args(&self) -> Vec<String> {
        Vec::new()
    }

    /// Arguments always added to the run step.
    fn extra_plus_args(&self) -> Vec<String> {
        Vec::new()
    }

    /// The VCD the request will produce, if waves are enabled.
    fn waveform(&self, request: &RunRequest) -> Option<PathBuf> {
        (request.waves && !request.compile_only).then(|| dump_path(request))
    }

    /// Writes any support files the planned commands refer to.
    fn prepare(&self, request: &RunRequest) -> Result<(), RunError> {
        let _ = request;
        Ok(())
    }

    /// The ordered commands that compile and, unless compile-only, run the request.
    fn plan(&self, request: &RunRequest) -> Vec<ToolInvocation>;
}

/// Returns the backend implementation for a backend family.
pub fn backend_for(kind: BackendKind) -> &'static dyn SimBackend {
    match kind {
        BackendKind::Icarus => &Icarus,
        BackendKind::Verilator => &Verilator,
    }
}

/// Environment exported to the simulation process.
pub(crate) fn run_env(request: &RunRequest) -> Vec<(String, String)> {
    let mut env = vec![
        ("MODULE".to_string(), request.testbench.clone()),
        ("TOPLEVEL".to_string(), request.top.clone()),
    ];
    if let Some(testcase) = &request.testcase {
        env.push(("TESTCASE".to_string(), testcase.clone()));
    }
    env.push(("SIM".to_string(), request.sim_name.clone()));
    env
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// The waveform every backend dumps: `<work>/<top>.vcd`.
pub(crate) fn dump_path(request: &RunRequest) -> PathBuf {
    request.work_dir.join(format!("{}.vcd", request.top))
}

/// Where the generated harness module is written.
pub(crate) fn harness_source(request: &RunRequest) -> PathBuf {
    request.work_dir.join(format!("{HARNESS_MODULE}.v"))
}

/// Renders the harness module.
///
/// It dumps everything under the top entity. With a verdict watch it also
/// ends the simulation one time unit after either verdict output rises, so
/// a rise on the other output in the same step is still dumped, and at the
/// deadline when one is set. `bind_into_top` instantiates the module inside
/// the top entity for simulators that elaborate a single root.
pub(crate) fn harness_module(request: &RunRequest, bind_into_top: bool) -> String {
    let mut module = String::new();
    let _ = writeln!(module, "module {HARNESS_MODULE};");
    let _ = writeln!(module, "initial begin");
    let _ = writeln!(module, "    $dumpfile(\"{}\");", dump_path(request).display());
    let _ = writeln!(module, "    $dumpvars(0, {});", request.top);
    let _ = writeln!(module, "end");
    if let Some(watch) = &request.verdict {
        let (error, pass) = (&watch.error, &watch.pass);
        let _ = writeln!(module, "always @(posedge {error} or posedge {pass})");
        let _ = writeln!(
            module,
            "    if ({error} === 1'b1 || {pass} === 1'b1) #1 $finish;"
        );
        if let Some(deadline) = watch.deadline {
            let _ = writeln!(
                module,
                "initial #{} $finish;",
                request.timescale.delay_units(deadline)
            );
        }
    }
    let _ = writeln!(module, "endmodule");
    if bind_into_top {
        let _ = writeln!(
            module,
            "bind {} {HARNESS_MODULE} {HARNESS_MODULE}_i();",
            request.top
        );
    }
    module
}

/// Writes the harness module when the request captures waves.
pub(crate) fn write_harness(request: &RunRequest, bind_into_top: bool) -> Result<(), RunError> {
    if !request.waves {
        return Ok(());
    }
    let path = harness_source(request);
    fs::write(&path, harness_module(request, bind_into_top)).map_err(|e| RunError::io(&path, e))
}
