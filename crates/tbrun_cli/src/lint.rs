//! `tbrun lint`: compile a module without running it.

use tbrun_common::Timescale;
use tbrun_config::HarnessConfig;
use tbrun_run::{lint, parse_assignment, LintOptions, ParameterSet, SystemRunner, ToolRunner};

use crate::{resolve_module_dir, GlobalArgs, LintArgs};

/// Runs the `tbrun lint` command.
///
/// Compiler failures propagate as errors; a clean compile returns 0.
pub fn run(args: &LintArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = global.load_config()?;
    run_with(args, global, &config, &SystemRunner)
}

pub(crate) fn run_with(
    args: &LintArgs,
    global: &GlobalArgs,
    config: &HarnessConfig,
    runner: &dyn ToolRunner,
) -> Result<i32, Box<dyn std::error::Error>> {
    let module_dir = resolve_module_dir(&args.module_dir)?;

    let mut parameters = ParameterSet::new();
    for text in &args.params {
        let (name, value) = parse_assignment(text)?;
        parameters.insert(name, value);
    }
    let options = LintOptions {
        timescale: args
            .timescale
            .as_deref()
            .map(Timescale::parse)
            .transpose()?,
        parameters,
        defines: args.defines.clone(),
        compile_args: args.compile_args.clone(),
    };

    if !global.quiet {
        eprintln!("   Linting {} with {}", module_dir.display(), config.sim.name);
    }
    let request = lint(config, runner, &module_dir, &options)?;
    if !global.quiet {
        eprintln!(
            "   Finished lint of {} ({} source(s))",
            request.top,
            request.sources.len()
        );
    }
    Ok(0)
}
