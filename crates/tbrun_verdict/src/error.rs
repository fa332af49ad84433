//! Verdict protocol violations.

use tbrun_common::SimTime;

use crate::vcd::VcdLoadError;

/// Errors raised while deciding a verdict.
#[derive(Debug, thiserror::Error)]
pub enum VerdictError {
    /// A verdict signal held X or Z at the init check.
    #[error(
        "Unresolvable value in {signal} (x or z in some or all bits) at Time {}ns.",
        .at.as_ns_f64()
    )]
    Unresolved {
        /// Path of the offending signal.
        signal: String,
        /// Time of the check.
        at: SimTime,
    },

    /// A verdict signal was already high at the init check.
    #[error(
        "Testbench pass/fail output ({signal}) is already 1 at Time {}ns, but must be explicitly set to 0 at start of simulation.",
        .at.as_ns_f64()
    )]
    ActiveAtInit {
        /// Path of the offending signal.
        signal: String,
        /// Time of the check.
        at: SimTime,
    },

    /// The simulation ended before either signal rose.
    #[error("simulation ended at Time {}ns before {error_signal} or {pass_signal} rose", .end.as_ns_f64())]
    NoVerdict {
        /// Last simulated time.
        end: SimTime,
        /// Path of the error signal.
        error_signal: String,
        /// Path of the pass signal.
        pass_signal: String,
    },

    /// A verdict signal is not in the waveform.
    #[error("signal '{0}' not found in waveform")]
    SignalNotFound(String),

    /// A verdict signal is wider than one bit.
    #[error("signal {signal} is {width} bits wide, verdict signals must be single-bit")]
    NotSingleBit {
        /// Path of the offending signal.
        signal: String,
        /// Its declared width.
        width: u32,
    },

    /// The waveform could not be loaded.
    #[error(transparent)]
    Waveform(#[from] VcdLoadError),
}
