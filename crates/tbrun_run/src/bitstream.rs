//! FPGA bitstream builds.

use std::path::Path;

use tbrun_config::BitstreamSettings;
use tracing::info;

use crate::error::RunError;
use crate::request::ToolInvocation;
use crate::runner::ToolRunner;

/// Runs the bitstream build pipeline in `module_dir`.
///
/// The configured program is invoked once with every target, so the targets
/// run in order. Any non-zero exit is a [`RunError::BitstreamFailed`].
pub fn build_bitstream(
    settings: &BitstreamSettings,
    runner: &dyn ToolRunner,
    module_dir: &Path,
) -> Result<(), RunError> {
    let invocation =
        ToolInvocation::new(&settings.program, module_dir).args(settings.targets.iter().cloned());
    info!("building bitstream: {invocation}");
    let output = runner.run(&invocation)?;
    if output.succeeded() {
        Ok(())
    } else {
        Err(RunError::BitstreamFailed {
            program: settings.program.clone(),
            targets: settings.targets.clone(),
            code: output.code,
        })
    }
}
