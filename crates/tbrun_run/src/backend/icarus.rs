use std::fs;

use super::{
    harness_source, path_arg, run_env, write_harness, BuildDirPolicy, SimBackend, HARNESS_MODULE,
};
use crate::error::RunError;
use crate::request::{RunRequest, ToolInvocation};

/// Command file carrying the timescale.
pub const COMMAND_FILE: &str = "cmds.f";
/// Compiled simulation image.
pub const IMAGE_FILE: &str = "sim.vvp";

/// Icarus Verilog: `iverilog` compiles to an image that `vvp` interprets.
///
/// The harness module is elaborated as a second root next to the top entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Icarus;

impl SimBackend for Icarus {
    fn name(&self) -> &'static str {
        "icarus"
    }

    fn build_dir_policy(&self) -> BuildDirPolicy {
        BuildDirPolicy::ReuseWorkDir
    }

    fn prepare(&self, request: &RunRequest) -> Result<(), RunError> {
        let cmd_file = request.build_dir.join(COMMAND_FILE);
        fs::write(&cmd_file, format!("+timescale+{}\n", request.timescale))
            .map_err(|e| RunError::io(&cmd_file, e))?;
        write_harness(request, false)
    }

    fn plan(&self, request: &RunRequest) -> Vec<ToolInvocation> {
        let image = request.build_dir.join(IMAGE_FILE);
        let mut compile = ToolInvocation::new("iverilog", &request.build_dir)
            .arg("-o")
            .arg(path_arg(&image))
            .arg("-g2012")
            .arg("-s")
            .arg(&request.top);
        if request.waves {
            compile = compile.arg("-s").arg(HARNESS_MODULE);
        }
        compile = compile
            .arg("-f")
            .arg(path_arg(&request.build_dir.join(COMMAND_FILE)));
        for (name, value) in request.parameters.iter() {
            compile = compile.arg(format!("-P{}.{}={}", request.top, name, value.to_hdl_literal()));
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
        if !request.compile_only {
            let mut run = ToolInvocation::new("vvp", &request.work_dir)
                .arg(path_arg(&image))
                .args(request.plus_args.iter().cloned());
            for (key, value) in run_env(request) {
                run = run.env(key, value);
            }
            steps.push(run);
        }
        steps
    }
}
