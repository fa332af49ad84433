//! The verdict monitor state machine.
//!
//! The monitor watches two single-bit signals, `error_o` and `pass_o`. At the
//! settling instant both must be resolved and low; after that the first one
//! to rise decides the test.
//!
//! ```text
//!   AwaitingInit --init check--> AwaitingVerdict --first rise--> Resolved
//! ```
//!
//! The monitor is fed time-ordered batches of changes with
//! [`VerdictMonitor::observe`] and closed with [`VerdictMonitor::finish`].

use std::fmt;

use tbrun_common::{Logic, SimTime};
use tbrun_config::{TieBreak, VerdictSettings};
use tracing::debug;

use crate::error::VerdictError;

/// Which verdict signal a change applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerdictSignal {
    /// The error line.
    Error,
    /// The pass line.
    Pass,
}

/// The outcome of a test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// `pass_o` rose first.
    Passed {
        /// When it rose.
        at: SimTime,
    },
    /// `error_o` rose first.
    Failed {
        /// When it rose.
        at: SimTime,
    },
    /// Neither rose by the deadline.
    Timeout {
        /// The configured deadline.
        deadline: SimTime,
    },
}

impl Verdict {
    /// Returns true only for [`Verdict::Passed`].
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Passed { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed { at } => write!(f, "PASS at {at}"),
            Verdict::Failed { at } => write!(f, "FAIL at {at}"),
            Verdict::Timeout { deadline } => write!(f, "TIMEOUT after {deadline}"),
        }
    }
}

/// Where the monitor is in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    /// Before the settling instant.
    AwaitingInit,
    /// Init check passed; waiting for the first rise.
    AwaitingVerdict,
    /// Terminal.
    Resolved(Verdict),
}

/// Decides a verdict from the `error_o`/`pass_o` change stream.
#[derive(Clone, Debug)]
pub struct VerdictMonitor {
    settle: SimTime,
    timeout: Option<SimTime>,
    tie_break: TieBreak,
    error_path: String,
    pass_path: String,
    error: Logic,
    pass: Logic,
    state: MonitorState,
}

impl VerdictMonitor {
    /// Creates a monitor using the signal names in `settings` as their paths.
    pub fn new(settings: &VerdictSettings) -> Self {
        Self::with_paths(
            settings,
            settings.error_signal.clone(),
            settings.pass_signal.clone(),
        )
    }

    /// Creates a monitor reporting the given resolved signal paths.
    pub fn with_paths(settings: &VerdictSettings, error_path: String, pass_path: String) -> Self {
        Self {
            settle: settings.settle,
            timeout: settings.timeout,
            tie_break: settings.tie_break,
            error_path,
            pass_path,
            error: Logic::X,
            pass: Logic::X,
            state: MonitorState::AwaitingInit,
        }
    }

    /// The current state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Feeds every change stamped `at`; batches must arrive in time order.
    ///
    /// Returns the verdict once one is reached. Changes after a verdict are
    /// ignored.
    pub fn observe(
        &mut self,
        at: SimTime,
        changes: &[(VerdictSignal, Logic)],
    ) -> Result<Option<Verdict>, VerdictError> {
        if self.state == MonitorState::AwaitingInit {
            if at <= self.settle {
                for &(signal, value) in changes {
                    *self.slot(signal) = value;
                }
                return Ok(None);
            }
            self.check_init()?;
        }

        match self.state {
            MonitorState::Resolved(verdict) => Ok(Some(verdict)),
            MonitorState::AwaitingInit => Ok(None),
            MonitorState::AwaitingVerdict => {
                if let Some(deadline) = self.timeout {
                    if at > deadline {
                        return Ok(Some(self.resolve(Verdict::Timeout { deadline })));
                    }
                }
                let mut error_rose = false;
                let mut pass_rose = false;
                for &(signal, value) in changes {
                    let slot = self.slot(signal);
                    let rose = !slot.is_high() && value.is_high();
                    *slot = value;
                    match signal {
                        VerdictSignal::Error => error_rose |= rose,
                        VerdictSignal::Pass => pass_rose |= rose,
                    }
                }
                let verdict = match (error_rose, pass_rose) {
                    (true, true) => match self.tie_break {
                        TieBreak::Fail => Verdict::Failed { at },
                        TieBreak::Pass => Verdict::Passed { at },
                    },
                    (true, false) => Verdict::Failed { at },
                    (false, true) => Verdict::Passed { at },
                    (false, false) => return Ok(None),
                };
                Ok(Some(self.resolve(verdict)))
            }
        }
    }

    /// Closes the stream at simulation time `end`.
    pub fn finish(&mut self, end: SimTime) -> Result<Verdict, VerdictError> {
        if self.state == MonitorState::AwaitingInit {
            self.check_init()?;
        }
        match self.state {
            MonitorState::Resolved(verdict) => Ok(verdict),
            _ => match self.timeout {
                Some(deadline) if end >= deadline => Ok(self.resolve(Verdict::Timeout { deadline })),
                _ => Err(VerdictError::NoVerdict {
                    end,
                    error_signal: self.error_path.clone(),
                    pass_signal: self.pass_path.clone(),
                }),
            },
        }
    }

    fn slot(&mut self, signal: VerdictSignal) -> &mut Logic {
        match signal {
            VerdictSignal::Error => &mut self.error,
            VerdictSignal::Pass => &mut self.pass,
        }
    }

    /// Both signals must be resolved and low at the settling instant; error first.
    fn check_init(&mut self) -> Result<(), VerdictError> {
        for (path, value) in [(&self.error_path, self.error), (&self.pass_path, self.pass)] {
            if !value.is_resolvable() {
                return Err(VerdictError::Unresolved {
                    signal: path.clone(),
                    at: self.settle,
                });
            }
            if value.is_high() {
                return Err(VerdictError::ActiveAtInit {
                    signal: path.clone(),
                    at: self.settle,
                });
            }
        }
        debug!(settle = %self.settle, "verdict signals initialized");
        self.state = MonitorState::AwaitingVerdict;
        Ok(())
    }

    fn resolve(&mut self, verdict: Verdict) -> Verdict {
        debug!(%verdict, "verdict reached");
        self.state = MonitorState::Resolved(verdict);
        verdict
    }
}
