//! `tbrun build`: run the FPGA bitstream pipeline.

use tbrun_config::{BackendKind, HarnessConfig};
use tbrun_run::{build_bitstream, SystemRunner, ToolRunner};

use crate::{resolve_module_dir, BuildArgs, GlobalArgs};

/// Runs the `tbrun build` command.
///
/// The bitstream only depends on the design, not the simulator, so it is
/// built only when `SIM` selects Icarus and skipped otherwise.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = global.load_config()?;
    run_with(args, global, &config, &SystemRunner)
}

pub(crate) fn run_with(
    args: &BuildArgs,
    global: &GlobalArgs,
    config: &HarnessConfig,
    runner: &dyn ToolRunner,
) -> Result<i32, Box<dyn std::error::Error>> {
    if config.sim.kind != BackendKind::Icarus {
        if !global.quiet {
            eprintln!(
                "   Skipping bitstream build (built once, under the icarus run; SIM={})",
                config.sim.name
            );
        }
        return Ok(0);
    }

    let module_dir = resolve_module_dir(&args.module_dir)?;
    if !global.quiet {
        eprintln!("   Building bitstream in {}", module_dir.display());
    }
    build_bitstream(&config.bitstream, runner, &module_dir)?;
    if !global.quiet {
        eprintln!("   Finished bitstream build");
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbrun_config::SimSelector;
    use tbrun_run::RecordingRunner;
    use tempfile::TempDir;

    fn quiet() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: None,
        }
    }

    #[test]
    fn builds_under_icarus() {
        let dir = TempDir::new().unwrap();
        let config = HarnessConfig::new(dir.path(), SimSelector::parse("icarus").unwrap());
        let args = BuildArgs {
            module_dir: dir.path().to_path_buf(),
        };
        let runner = RecordingRunner::new();
        assert_eq!(run_with(&args, &quiet(), &config, &runner).unwrap(), 0);
        assert_eq!(runner.calls()[0].args, vec!["clean", "bitstream"]);
    }

    #[test]
    fn skipped_under_verilator() {
        let dir = TempDir::new().unwrap();
        let config = HarnessConfig::new(dir.path(), SimSelector::parse("verilator").unwrap());
        let args = BuildArgs {
            module_dir: dir.path().to_path_buf(),
        };
        let runner = RecordingRunner::new();
        assert_eq!(run_with(&args, &quiet(), &config, &runner).unwrap(), 0);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn failed_build_is_error() {
        let dir = TempDir::new().unwrap();
        let config = HarnessConfig::new(dir.path(), SimSelector::parse("icarus").unwrap());
        let args = BuildArgs {
            module_dir: dir.path().to_path_buf(),
        };
        let runner = RecordingRunner::new().fail_program("make", 2, "");
        let err = run_with(&args, &quiet(), &config, &runner).unwrap_err();
        assert!(err.to_string().contains("make clean bitstream"));
    }
}
