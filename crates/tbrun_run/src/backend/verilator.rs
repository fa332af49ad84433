use std::path::PathBuf;

use super::{harness_source, path_arg, run_env, write_harness, BuildDirPolicy, SimBackend};
use crate::error::RunError;
use crate::request::{RunRequest, ToolInvocation};

/// Prefix of the generated model; the makefile is `Vtop.mk`.
pub const MODEL_PREFIX: &str = "Vtop";

/// Verilator: elaborates the design into a compiled executable.
///
/// Only the top entity is elaborated, so the harness module is bound into it
/// and the model is built with VCD tracing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verilator;

impl Verilator {
    /// The makefile generated in the build directory.
    pub fn makefile(request: &RunRequest) -> PathBuf {
        request.build_dir.join(format!("{MODEL_PREFIX}.mk"))
    }

    fn executable(request: &RunRequest) -> PathBuf {
        request.build_dir.join(MODEL_PREFIX)
    }
}

impl SimBackend for Verilator {
    fn name(&self) -> &'static str {
        "verilator"
    }

    fn build_dir_policy(&self) -> BuildDirPolicy {
        BuildDirPolicy::Separate
    }

    fn extra_compile_args(&self) -> Vec<String> {
        ["-Wno-fatal", "-DVM_TRACE_FST=1", "-DVM_TRACE=1", "--timing"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn extra_plus_args(&self) -> Vec<String> {
        vec!["--trace".to_string(), "--trace-fst".to_string()]
    }

    fn prepare(&self, request: &RunRequest) -> Result<(), RunError> {
        write_harness(request, true)
    }

    fn plan(&self, request: &RunRequest) -> Vec<ToolInvocation> {
        let mode = if request.compile_only { "--cc" } else { "--binary" };
        let mut compile = ToolInvocation::new("verilator", &request.work_dir)
            .arg(mode)
            .arg("--prefix")
            .arg(MODEL_PREFIX)
            .arg("-o")
            .arg(MODEL_PREFIX)
            .arg("--Mdir")
            .arg(path_arg(&request.build_dir))
            .arg("--top-module")
            .arg(&request.top)
            .arg("--timescale")
            .arg(request.timescale.to_string());
        if request.waves {
            compile = compile.arg("--trace");
        }
        for (name, value) in request.parameters.iter() {
            compile = compile.arg(format!("-G{}={}", name, value.to_hdl_literal()));
        }
        for define in &request.defines {
            compile = compile.arg(format!("-D{define}"));
        }
        for include in &request.includes {
            compile = compile.arg(format!("-I{}", include.display()));
        }
        compile = compile
            .args(request.compile_args.iter().cloned())
            .args(request.sources.iter().map(|s| path_arg(s)));
        if request.waves {
            compile = compile.arg(path_arg(&harness_source(request)));
        }

        let mut steps = vec![compile];
        if !request.make_args.is_empty() {
            steps.push(
                ToolInvocation::new("make", &request.work_dir)
                    .args(request.make_args.iter().cloned())
                    .arg("-C")
                    .arg(path_arg(&request.build_dir))
                    .arg("-f")
                    .arg(format!("{MODEL_PREFIX}.mk")),
            );
        }
        if !request.compile_only {
            let mut run = ToolInvocation::new(path_arg(&Self::executable(request)), &request.work_dir)
                .args(request.plus_args.iter().cloned());
            for (key, value) in run_env(request) {
                run = run.env(key, value);
            }
            steps.push(run);
        }
        steps
    }
}
