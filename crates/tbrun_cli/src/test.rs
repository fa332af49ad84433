//! `tbrun test`: simulate a module and judge its verdict.
//!
//! Resolves the module's manifest, simulates one run per parameter set (a
//! single set, or every point of a `--sweep`), then replays each run's
//! waveform through the verdict monitor. Prints per-run status and a summary.

use std::path::Path;

use serde_json::json;
use tbrun_common::Timescale;
use tbrun_config::HarnessConfig;
use tbrun_run::{
    parse_assignment, parse_sweep_axis, simulate_sweep, testbench_name, ParameterSet, RunError,
    SimulationOptions, SimulationOutcome, SystemRunner, ToolRunner,
};
use tbrun_verdict::{replay_file, Verdict};
use tracing::debug;

use crate::{resolve_module_dir, GlobalArgs, ReportFormat, TestArgs};

/// How one run ended.
#[derive(Debug)]
enum RunStatus {
    /// The simulator succeeded and the verdict was a pass, or was not asked for.
    Passed(Option<Verdict>),
    /// The simulator succeeded but the verdict was a fail or timeout.
    Rejected(Verdict),
    /// The simulator, or the verdict protocol, failed.
    Error(String),
}

impl RunStatus {
    fn passed(&self) -> bool {
        matches!(self, RunStatus::Passed(_))
    }

    fn label(&self) -> &'static str {
        match self {
            RunStatus::Passed(_) => "PASS",
            RunStatus::Rejected(Verdict::Timeout { .. }) => "TIMEOUT",
            RunStatus::Rejected(_) => "FAIL",
            RunStatus::Error(_) => "ERROR",
        }
    }

    fn detail(&self) -> String {
        match self {
            RunStatus::Passed(Some(v)) | RunStatus::Rejected(v) => v.to_string(),
            RunStatus::Passed(None) => "simulation finished".to_string(),
            RunStatus::Error(message) => message.clone(),
        }
    }
}

/// Result of one parameterization.
struct RunReport {
    run_key: String,
    work_dir: Option<String>,
    status: RunStatus,
}

/// Runs the `tbrun test` command.
///
/// Returns exit code 0 if every run passes, 1 otherwise.
pub fn run(args: &TestArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = global.load_config()?;
    run_with(args, global, &config, &SystemRunner)
}

pub(crate) fn run_with(
    args: &TestArgs,
    global: &GlobalArgs,
    config: &HarnessConfig,
    runner: &dyn ToolRunner,
) -> Result<i32, Box<dyn std::error::Error>> {
    let module_dir = resolve_module_dir(&args.module_dir)?;
    let options = simulation_options(args)?;
    let points = sweep_points(&options.parameters, &args.sweep)?;

    if !global.quiet {
        eprintln!(
            "   Testing {} with {} ({} run(s))",
            testbench_name(&module_dir)?,
            config.sim.name,
            points.len()
        );
    }

    let reports: Vec<RunReport> = simulate_sweep(config, runner, &module_dir, &options, &points)
        .into_iter()
        .map(|(run_key, result)| judge(config, run_key, result, args.no_verdict))
        .collect();

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                for report in &reports {
                    print_report(report, global.verbose);
                }
            }
        }
        ReportFormat::Json => println!("{}", json_summary(&reports)),
    }

    let passed = reports.iter().filter(|r| r.status.passed()).count();
    let failed = reports.len() - passed;
    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!();
        eprintln!(
            "   Result: {passed} passed, {failed} failed out of {} run(s)",
            reports.len()
        );
    }

    Ok(if failed > 0 { 1 } else { 0 })
}

fn simulation_options(args: &TestArgs) -> Result<SimulationOptions, Box<dyn std::error::Error>> {
    let timescale = args
        .timescale
        .as_deref()
        .map(Timescale::parse)
        .transpose()?;
    let mut parameters = ParameterSet::new();
    for text in &args.params {
        let (name, value) = parse_assignment(text)?;
        parameters.insert(name, value);
    }
    Ok(SimulationOptions {
        timescale,
        testcase: args.testcase.clone(),
        parameters,
        defines: args.defines.clone(),
        top: args.top.clone(),
        no_verdict: args.no_verdict,
    })
}

fn sweep_points(
    base: &ParameterSet,
    sweep: &[String],
) -> Result<Vec<ParameterSet>, Box<dyn std::error::Error>> {
    let axes = sweep
        .iter()
        .map(|text| parse_sweep_axis(text))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(base.sweep(&axes))
}

fn judge(
    config: &HarnessConfig,
    run_key: String,
    result: Result<SimulationOutcome, RunError>,
    no_verdict: bool,
) -> RunReport {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            return RunReport {
                run_key,
                work_dir: None,
                status: RunStatus::Error(e.to_string()),
            }
        }
    };
    let work_dir = Some(outcome.request.work_dir.display().to_string());

    let status = match (&outcome.waveform, no_verdict) {
        (_, true) => RunStatus::Passed(None),
        (Some(path), false) => {
            debug!(run_key = %run_key, waveform = %path.display(), "judging verdict");
            judge_waveform(path, config)
        }
        (None, false) => RunStatus::Error("the run left no waveform to judge".to_string()),
    };
    RunReport {
        run_key,
        work_dir,
        status,
    }
}

fn judge_waveform(path: &Path, config: &HarnessConfig) -> RunStatus {
    match replay_file(path, &config.verdict) {
        Ok(verdict @ Verdict::Passed { .. }) => RunStatus::Passed(Some(verdict)),
        Ok(verdict) => RunStatus::Rejected(verdict),
        Err(e) => RunStatus::Error(e.to_string()),
    }
}

fn display_key(run_key: &str) -> &str {
    if run_key.is_empty() {
        "(default parameters)"
    } else {
        run_key
    }
}

fn print_report(report: &RunReport, verbose: bool) {
    eprintln!(
        "   {} {}: {}",
        report.status.label(),
        display_key(&report.run_key),
        report.status.detail()
    );
    if verbose {
        if let Some(dir) = &report.work_dir {
            eprintln!("        artifacts in {dir}");
        }
    }
}

fn json_summary(reports: &[RunReport]) -> serde_json::Value {
    let runs: Vec<serde_json::Value> = reports
        .iter()
        .map(|r| {
            json!({
                "run_key": r.run_key,
                "status": r.status.label(),
                "detail": r.status.detail(),
                "work_dir": r.work_dir,
            })
        })
        .collect();
    let passed = reports.iter().filter(|r| r.status.passed()).count();
    json!({
        "passed": passed,
        "failed": reports.len() - passed,
        "runs": runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tbrun_common::SimTime;
    use tbrun_config::SimSelector;
    use tbrun_run::RecordingRunner;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, HarnessConfig, std::path::PathBuf) {
        fixture_for("icarus")
    }

    fn fixture_for(sim: &str) -> (TempDir, HarnessConfig, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let module = dir.path().join("adder");
        fs::create_dir_all(&module).unwrap();
        fs::write(
            module.join("filelist.json"),
            r#"{"top":"adder","files":["rtl/adder.v"]}"#,
        )
        .unwrap();
        let config = HarnessConfig::new(dir.path(), SimSelector::parse(sim).unwrap());
        (dir, config, module)
    }

    fn args(module: &Path) -> TestArgs {
        TestArgs {
            module_dir: module.to_path_buf(),
            testcase: None,
            timescale: None,
            params: vec!["WIDTH=8".to_string()],
            defines: Vec::new(),
            top: None,
            sweep: Vec::new(),
            no_verdict: true,
            format: ReportFormat::Text,
        }
    }

    fn quiet() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: None,
        }
    }

    #[test]
    fn single_run_passes_without_verdict() {
        let (_dir, config, module) = fixture();
        let runner = RecordingRunner::new();
        let code = run_with(&args(&module), &quiet(), &config, &runner).unwrap();
        assert_eq!(code, 0);
        assert_eq!(runner.calls().len(), 2);
        assert!(module.join("run/all/WIDTH=8/icarus").is_dir());
    }

    #[test]
    fn sweep_runs_every_point() {
        let (_dir, config, module) = fixture();
        let runner = RecordingRunner::new();
        let mut a = args(&module);
        a.sweep = vec!["DEPTH=2,4".to_string()];
        let code = run_with(&a, &quiet(), &config, &runner).unwrap();
        assert_eq!(code, 0);
        assert!(module.join("run/all/WIDTH=8_DEPTH=2/icarus").is_dir());
        assert!(module.join("run/all/WIDTH=8_DEPTH=4/icarus").is_dir());
    }

    #[test]
    fn simulator_failure_sets_exit_code() {
        let (_dir, config, module) = fixture();
        let runner = RecordingRunner::new().fail_program("iverilog", 1, "syntax error");
        let code = run_with(&args(&module), &quiet(), &config, &runner).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn missing_vcd_is_an_error_status() {
        let (_dir, config, module) = fixture();
        let runner = RecordingRunner::new();
        let mut a = args(&module);
        a.no_verdict = false;
        let code = run_with(&a, &quiet(), &config, &runner).unwrap();
        assert_eq!(code, 1);
    }

    /// A dump of `adder` as the harness module writes it.
    fn adder_dump(changes: &str) -> String {
        format!(
            "$timescale 1ps $end\n$scope module adder $end\n\
             $var wire 1 e error_o $end\n$var wire 1 p pass_o $end\n$var wire 8 s sum $end\n\
             $upscope $end\n$enddefinitions $end\n{changes}"
        )
    }

    fn judged(sim: &str, changes: &str) -> (i32, Vec<String>) {
        let (_dir, config, module) = fixture_for(sim);
        let runner = RecordingRunner::new().writes_waveform(adder_dump(changes));
        let mut a = args(&module);
        a.no_verdict = false;
        let code = run_with(&a, &quiet(), &config, &runner).unwrap();
        let programs = runner.calls().into_iter().map(|c| c.program).collect();
        (code, programs)
    }

    #[test]
    fn recorded_pass_exits_zero() {
        let (code, programs) = judged("icarus", "#0\n0e\n0p\n#5000\n1p\n");
        assert_eq!(code, 0);
        assert_eq!(programs, vec!["iverilog", "vvp"]);
    }

    #[test]
    fn recorded_error_exits_one() {
        let (code, _) = judged("icarus", "#0\n0e\n0p\n#5000\n1e\n#5001\n1p\n");
        assert_eq!(code, 1);
    }

    #[test]
    fn unresolved_init_exits_one() {
        let (code, _) = judged("icarus", "#0\nxe\n0p\n#5000\n1p\n");
        assert_eq!(code, 1);
    }

    #[test]
    fn silent_run_exits_one() {
        let (code, _) = judged("icarus", "#0\n0e\n0p\nb0 s\n#90000\nb1 s\n");
        assert_eq!(code, 1);
    }

    #[test]
    fn verilator_runs_are_judged() {
        let (code, programs) = judged("verilator", "#0\n0e\n0p\n#5000\n1e\n");
        assert_eq!(code, 1);
        assert_eq!(programs[0], "verilator");
        assert!(programs[1].ends_with("Vtop"));

        let (code, _) = judged("verilator", "#0\n0e\n0p\n#5000\n1p\n");
        assert_eq!(code, 0);
    }

    #[test]
    fn verilator_without_waveform_is_not_a_pass() {
        let (_dir, config, module) = fixture_for("verilator");
        let mut a = args(&module);
        a.no_verdict = false;
        let code = run_with(&a, &quiet(), &config, &RecordingRunner::new()).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn deadline_reports_timeout() {
        let (_dir, mut config, module) = fixture();
        config.verdict.timeout = Some(SimTime::from_ns(20));
        let runner = RecordingRunner::new().writes_waveform(adder_dump("#0\n0e\n0p\n#20000\n"));
        let mut a = args(&module);
        a.no_verdict = false;
        let code = run_with(&a, &quiet(), &config, &runner).unwrap();
        assert_eq!(code, 1);
        let harness = fs::read_to_string(module.join("run/all/WIDTH=8/icarus/tbrun_waves.v")).unwrap();
        assert!(harness.contains("initial #20000 $finish;"));
    }

    #[test]
    fn no_verdict_leaves_outputs_unwatched() {
        let (_dir, config, module) = fixture();
        run_with(&args(&module), &quiet(), &config, &RecordingRunner::new()).unwrap();
        let harness = fs::read_to_string(module.join("run/all/WIDTH=8/icarus/tbrun_waves.v")).unwrap();
        assert!(harness.contains("$dumpvars(0, adder);"));
        assert!(!harness.contains("$finish"));
    }

    #[test]
    fn bad_parameter_is_rejected() {
        let (_dir, config, module) = fixture();
        let mut a = args(&module);
        a.params = vec!["WIDTH".to_string()];
        assert!(run_with(&a, &quiet(), &config, &RecordingRunner::new()).is_err());
    }

    #[test]
    fn verdict_labels() {
        let at = SimTime::from_ns(10);
        assert_eq!(RunStatus::Passed(Some(Verdict::Passed { at })).label(), "PASS");
        assert_eq!(RunStatus::Rejected(Verdict::Failed { at }).label(), "FAIL");
        assert_eq!(
            RunStatus::Rejected(Verdict::Timeout { deadline: at }).label(),
            "TIMEOUT"
        );
        assert_eq!(RunStatus::Error("x".into()).label(), "ERROR");
    }

    #[test]
    fn judges_recorded_waveform() {
        let (dir, config, _module) = fixture();
        let path = dir.path().join("adder.vcd");
        fs::write(
            &path,
            "$timescale 1ns $end\n$var wire 1 e error_o $end\n$var wire 1 p pass_o $end\n\
             $enddefinitions $end\n#0\n0e\n0p\n#50\n1e\n",
        )
        .unwrap();
        let status = judge_waveform(&path, &config);
        assert_eq!(status.label(), "FAIL");
        assert_eq!(status.detail(), "FAIL at 50 ns");
    }

    #[test]
    fn json_summary_counts() {
        let reports = vec![
            RunReport {
                run_key: "WIDTH=8".into(),
                work_dir: Some("/m/run/all/WIDTH=8/icarus".into()),
                status: RunStatus::Passed(None),
            },
            RunReport {
                run_key: "WIDTH=16".into(),
                work_dir: None,
                status: RunStatus::Error("iverilog exited with status 1".into()),
            },
        ];
        let v = json_summary(&reports);
        assert_eq!(v["passed"], 1);
        assert_eq!(v["failed"], 1);
        assert_eq!(v["runs"][1]["status"], "ERROR");
        assert_eq!(v["runs"][0]["run_key"], "WIDTH=8");
    }
}
