//! tbrun CLI: runs HDL testbenches against external simulators.
//!
//! Provides `tbrun test` for simulating a module (optionally across a
//! parameter sweep) and judging its pass/error verdict, `tbrun lint` for a
//! compile-only check, `tbrun build` for the FPGA bitstream, and
//! `tbrun verdict` for judging an existing waveform.

#![warn(missing_docs)]

mod build;
mod lint;
mod test;
mod verdict;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tbrun_config::HarnessConfig;
use tracing_subscriber::EnvFilter;

/// tbrun: HDL test orchestration.
#[derive(Parser, Debug)]
#[command(name = "tbrun", version, about = "HDL testbench runner")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `tbrun.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a module's testbench.
    Test(TestArgs),
    /// Compile a module without running it.
    Lint(LintArgs),
    /// Build the FPGA bitstream for a module.
    Build(BuildArgs),
    /// Judge the verdict recorded in a VCD waveform.
    Verdict(VerdictArgs),
}

/// Arguments for the `tbrun test` subcommand.
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Module directory containing `filelist.json`.
    pub module_dir: PathBuf,

    /// Run only this test case.
    #[arg(long)]
    pub testcase: Option<String>,

    /// Simulation timescale (e.g., "1ns/1ps").
    #[arg(long)]
    pub timescale: Option<String>,

    /// Parameter override `NAME=VALUE`; repeatable.
    #[arg(short = 'P', long = "param")]
    pub params: Vec<String>,

    /// Preprocessor define `NAME` or `NAME=VALUE`; repeatable.
    #[arg(short = 'D', long = "define")]
    pub defines: Vec<String>,

    /// Override the top entity from the manifest.
    #[arg(long)]
    pub top: Option<String>,

    /// Sweep axis `NAME=v1,v2,...`; repeatable, expanded as a cartesian product.
    #[arg(long)]
    pub sweep: Vec<String>,

    /// Neither watch nor judge the verdict outputs.
    #[arg(long)]
    pub no_verdict: bool,

    /// Output format for the run summary.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `tbrun lint` subcommand.
#[derive(Parser, Debug)]
pub struct LintArgs {
    /// Module directory containing `filelist.json`.
    pub module_dir: PathBuf,

    /// Simulation timescale (e.g., "1ns/1ps").
    #[arg(long)]
    pub timescale: Option<String>,

    /// Parameter override `NAME=VALUE`; repeatable.
    #[arg(short = 'P', long = "param")]
    pub params: Vec<String>,

    /// Preprocessor define; repeatable.
    #[arg(short = 'D', long = "define")]
    pub defines: Vec<String>,

    /// Extra argument for the compile step; repeatable.
    #[arg(long = "compile-arg", allow_hyphen_values = true)]
    pub compile_args: Vec<String>,
}

/// Arguments for the `tbrun build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Module directory whose build pipeline to run.
    pub module_dir: PathBuf,
}

/// Arguments for the `tbrun verdict` subcommand.
#[derive(Parser, Debug)]
pub struct VerdictArgs {
    /// The VCD waveform to judge.
    pub waveform: PathBuf,

    /// Settling delay before the init check (e.g., "1ns").
    #[arg(long)]
    pub settle: Option<String>,

    /// Deadline for the verdict (e.g., "10us").
    #[arg(long)]
    pub timeout: Option<String>,

    /// Resolution of same-timestamp edges.
    #[arg(long, value_enum)]
    pub tie_break: Option<TieBreakArg>,

    /// Error signal path or name.
    #[arg(long)]
    pub error_signal: Option<String>,

    /// Pass signal path or name.
    #[arg(long)]
    pub pass_signal: Option<String>,
}

/// Same-timestamp edge resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TieBreakArg {
    /// Simultaneous edges fail.
    Fail,
    /// Simultaneous edges pass.
    Pass,
}

/// Run summary output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON on stdout.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Loads the harness configuration from the environment.
    pub fn load_config(&self) -> Result<HarnessConfig, tbrun_config::ConfigError> {
        tbrun_config::load_config_from_env(self.config.as_deref())
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Test(ref args) => test::run(args, &global),
        Command::Lint(ref args) => lint::run(args, &global),
        Command::Build(ref args) => build::run(args, &global),
        Command::Verdict(ref args) => verdict::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Default log filter for the verbosity flags; `RUST_LOG` overrides it.
fn default_filter(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_tracing(quiet: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(quiet, verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves a module directory argument to an absolute path.
pub(crate) fn resolve_module_dir(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    dir.canonicalize()
        .map_err(|e| format!("module directory {} is not accessible: {e}", dir.display()).into())
}
