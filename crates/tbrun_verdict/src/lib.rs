//! Pass/error verdicts for tbrun simulations.
//!
//! A testbench reports its result on two single-bit outputs, `error_o` and
//! `pass_o`. Both must be resolved and low shortly after simulation start;
//! the first to rise afterwards is the verdict. [`VerdictMonitor`] implements
//! that protocol over a stream of value changes, and [`replay`] drives it
//! from a recorded VCD waveform.

#![warn(missing_docs)]

pub mod error;
pub mod monitor;
pub mod replay;
pub mod vcd;

pub use error::VerdictError;
pub use monitor::{MonitorState, Verdict, VerdictMonitor, VerdictSignal};
pub use replay::{merge_changes, replay, replay_file, ChangeBatch};
pub use vcd::{
    load_vcd_file, load_vcd_file_for, parse_vcd, parse_vcd_for, LoadedWaveform, VcdLoadError,
    VcdSignal,
};
