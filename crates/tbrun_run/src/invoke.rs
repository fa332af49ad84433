//! Simulation and lint invocation.
//!
//! [`build_request`] turns a module directory plus caller options into a
//! [`RunRequest`] for the configured backend; [`simulate`] and [`lint`]
//! prepare the artifact directories and dispatch it.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tbrun_common::Timescale;
use tbrun_config::HarnessConfig;
use tbrun_manifest::resolve_module;
use tracing::{debug, info};

use crate::backend::{backend_for, BuildDirPolicy, SimBackend, Verilator};
use crate::error::RunError;
use crate::params::ParameterSet;
use crate::request::{RunRequest, VerdictWatch};
use crate::runner::{dispatch, ToolRunner};

/// Prefix applied to a module directory's base name to form the testbench name.
pub const TESTBENCH_PREFIX: &str = "test_";
/// Run name used when no test case is selected.
pub const ALL_TESTS: &str = "all";
/// Defines added to every simulation run.
pub const TRACE_DEFINES: [&str; 2] = ["VM_TRACE_FST=1", "VM_TRACE=1"];
/// Directory, under the module directory, used for lint builds.
pub const LINT_DIR: &str = "lint";
/// Contents of the placeholder makefile written before a lint build.
pub const LINT_MAKEFILE_CONTENTS: &str = "all:";

/// Derives the testbench module name from a module directory.
pub fn testbench_name(module_dir: &Path) -> Result<String, RunError> {
    let base = module_dir
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| RunError::InvalidModuleDir(module_dir.to_path_buf()))?;
    Ok(format!("{TESTBENCH_PREFIX}{base}"))
}

/// The run name for an optional test-case selector.
pub fn run_name(testcase: Option<&str>) -> &str {
    testcase.unwrap_or(ALL_TESTS)
}

/// The artifact directories for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunPaths {
    /// `<module>/run/<run-name>/<run-key>/<sim>`.
    pub work_dir: PathBuf,
    /// `<module>/build/<run-key>`.
    pub build_dir: PathBuf,
}

/// Composes the work and build directories for a run.
///
/// An empty run key contributes no path segment.
pub fn run_paths(module_dir: &Path, run_name: &str, run_key: &str, sim_name: &str) -> RunPaths {
    let mut work_dir = module_dir.join("run").join(run_name);
    let mut build_dir = module_dir.join("build");
    if !run_key.is_empty() {
        work_dir.push(run_key);
        build_dir.push(run_key);
    }
    work_dir.push(sim_name);
    RunPaths {
        work_dir,
        build_dir,
    }
}

/// Caller-controlled options for one simulation.
#[derive(Clone, Debug, Default)]
pub struct SimulationOptions {
    /// Timescale; `None` uses the configured default.
    pub timescale: Option<Timescale>,
    /// Test case to run; `None` runs every test case.
    pub testcase: Option<String>,
    /// Parameter overrides.
    pub parameters: ParameterSet,
    /// Extra preprocessor defines.
    pub defines: Vec<String>,
    /// Top entity override; `None` reads it from the manifest.
    pub top: Option<String>,
    /// Leave the verdict outputs unwatched, for testbenches without them.
    pub no_verdict: bool,
}

/// Assembles the run request for a simulation of `module_dir`.
pub fn build_request(
    config: &HarnessConfig,
    backend: &dyn SimBackend,
    module_dir: &Path,
    options: &SimulationOptions,
) -> Result<RunRequest, RunError> {
    let testbench = testbench_name(module_dir)?;
    let run_key = options.parameters.run_key();
    let paths = run_paths(
        module_dir,
        run_name(options.testcase.as_deref()),
        &run_key,
        &config.sim.name,
    );
    let build_dir = match backend.build_dir_policy() {
        BuildDirPolicy::ReuseWorkDir => paths.work_dir.clone(),
        BuildDirPolicy::Separate => paths.build_dir,
    };

    let manifest = resolve_module(&config.repo_root, module_dir)?;
    let top = options.top.clone().unwrap_or(manifest.top);

    let mut defines = options.defines.clone();
    defines.extend(TRACE_DEFINES.iter().map(|d| d.to_string()));
    let verdict = (!options.no_verdict).then(|| VerdictWatch::new(&top, &config.verdict));

    Ok(RunRequest {
        sources: manifest.sources,
        top,
        testbench,
        testcase: options.testcase.clone(),
        timescale: options.timescale.unwrap_or(config.timescale),
        parameters: options.parameters.clone(),
        defines,
        includes: vec![module_dir.to_path_buf()],
        compile_args: backend.extra_compile_args(),
        plus_args: backend.extra_plus_args(),
        make_args: Vec::new(),
        work_dir: paths.work_dir,
        build_dir,
        waves: true,
        verdict,
        compile_only: false,
        sim_name: config.sim.name.clone(),
    })
}

/// What a finished simulation left behind.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationOutcome {
    /// The request that was dispatched.
    pub request: RunRequest,
    /// The VCD written by the run, if any.
    pub waveform: Option<PathBuf>,
}

fn create_dir(path: &Path) -> Result<(), RunError> {
    fs::create_dir_all(path).map_err(|e| RunError::io(path, e))
}

/// Builds and dispatches one simulation of `module_dir`.
///
/// Simulator failures are returned as-is; nothing is retried.
pub fn simulate(
    config: &HarnessConfig,
    runner: &dyn ToolRunner,
    module_dir: &Path,
    options: &SimulationOptions,
) -> Result<SimulationOutcome, RunError> {
    let backend = backend_for(config.sim.kind);
    let request = build_request(config, backend, module_dir, options)?;

    create_dir(&request.work_dir)?;
    if request.build_dir != request.work_dir {
        create_dir(&request.build_dir)?;
    }
    backend.prepare(&request)?;

    info!(
        testbench = %request.testbench,
        top = %request.top,
        backend = backend.name(),
        "simulating in {}",
        request.work_dir.display()
    );
    dispatch(runner, &backend.plan(&request))?;

    let waveform = backend.waveform(&request);
    Ok(SimulationOutcome { request, waveform })
}

/// Runs one simulation per parameter set in parallel.
///
/// Each point lands in its own run-key directory, so points never share
/// artifacts. Results are returned in input order.
pub fn simulate_sweep(
    config: &HarnessConfig,
    runner: &dyn ToolRunner,
    module_dir: &Path,
    base: &SimulationOptions,
    points: &[ParameterSet],
) -> Vec<(String, Result<SimulationOutcome, RunError>)> {
    debug!(points = points.len(), "running parameter sweep");
    points
        .par_iter()
        .map(|parameters| {
            let options = SimulationOptions {
                parameters: parameters.clone(),
                ..base.clone()
            };
            (
                parameters.run_key(),
                simulate(config, runner, module_dir, &options),
            )
        })
        .collect()
}

/// Caller-controlled options for a lint build.
#[derive(Clone, Debug, Default)]
pub struct LintOptions {
    /// Timescale; `None` uses the configured default.
    pub timescale: Option<Timescale>,
    /// Parameter overrides.
    pub parameters: ParameterSet,
    /// Preprocessor defines.
    pub defines: Vec<String>,
    /// Arguments for the compile step.
    pub compile_args: Vec<String>,
}

/// Compiles `module_dir` without running it.
///
/// A placeholder `Vtop.mk` is written into the lint directory first so the
/// build-system step (`make -n`) has a makefile to read.
pub fn lint(
    config: &HarnessConfig,
    runner: &dyn ToolRunner,
    module_dir: &Path,
    options: &LintOptions,
) -> Result<RunRequest, RunError> {
    let backend = backend_for(config.sim.kind);
    let testbench = testbench_name(module_dir)?;
    let manifest = resolve_module(&config.repo_root, module_dir)?;
    let lint_dir = module_dir.join(LINT_DIR);

    let request = RunRequest {
        sources: manifest.sources,
        top: manifest.top,
        testbench,
        testcase: None,
        timescale: options.timescale.unwrap_or(config.timescale),
        parameters: options.parameters.clone(),
        defines: options.defines.clone(),
        includes: Vec::new(),
        compile_args: options.compile_args.clone(),
        plus_args: Vec::new(),
        make_args: vec!["-n".to_string()],
        work_dir: lint_dir.clone(),
        build_dir: lint_dir.clone(),
        waves: false,
        verdict: None,
        compile_only: true,
        sim_name: config.sim.name.clone(),
    };

    create_dir(&lint_dir)?;
    let makefile = Verilator::makefile(&request);
    fs::write(&makefile, LINT_MAKEFILE_CONTENTS).map_err(|e| RunError::io(&makefile, e))?;
    backend.prepare(&request)?;

    info!(top = %request.top, backend = backend.name(), "linting {}", module_dir.display());
    dispatch(runner, &backend.plan(&request))?;
    Ok(request)
}
