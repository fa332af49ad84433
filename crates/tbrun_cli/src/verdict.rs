//! `tbrun verdict`: judge a recorded waveform.

use tbrun_common::parse_duration;
use tbrun_config::{load_verdict_settings, TieBreak, VerdictSettings};
use tbrun_verdict::replay_file;

use crate::{GlobalArgs, TieBreakArg, VerdictArgs};

/// Runs the `tbrun verdict` command.
///
/// Prints the verdict and returns 0 for a pass, 1 for a fail or timeout.
/// Protocol violations are errors.
pub fn run(args: &VerdictArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = settings(args, load_verdict_settings(global.config.as_deref())?)?;
    let verdict = replay_file(&args.waveform, &settings)?;
    if !global.quiet {
        eprintln!("   {verdict}");
    }
    Ok(if verdict.is_pass() { 0 } else { 1 })
}

/// Applies command-line overrides on top of the configured settings.
fn settings(
    args: &VerdictArgs,
    mut settings: VerdictSettings,
) -> Result<VerdictSettings, Box<dyn std::error::Error>> {
    if let Some(settle) = &args.settle {
        settings.settle = parse_duration(settle)?;
    }
    if let Some(timeout) = &args.timeout {
        settings.timeout = Some(parse_duration(timeout)?);
    }
    if let Some(tie_break) = args.tie_break {
        settings.tie_break = match tie_break {
            TieBreakArg::Fail => TieBreak::Fail,
            TieBreakArg::Pass => TieBreak::Pass,
        };
    }
    if let Some(signal) = &args.error_signal {
        settings.error_signal = signal.clone();
    }
    if let Some(signal) = &args.pass_signal {
        settings.pass_signal = signal.clone();
    }
    if settings.error_signal == settings.pass_signal {
        return Err("error and pass signals must differ".into());
    }
    if let Some(deadline) = settings.timeout {
        if deadline <= settings.settle {
            return Err(format!(
                "timeout ({deadline}) must be later than settle ({})",
                settings.settle
            )
            .into());
        }
    }
    Ok(settings)
}
