//! Simulation timestamps with femtosecond resolution.
//!
//! Waveform dumps, settling delays and verdict deadlines are all expressed as
//! [`SimTime`] so they compare directly regardless of the simulator timescale.

use std::fmt;

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;
/// Femtoseconds per nanosecond.
pub const FS_PER_NS: u64 = 1_000_000;
/// Femtoseconds per microsecond.
pub const FS_PER_US: u64 = 1_000_000_000;
/// Femtoseconds per millisecond.
pub const FS_PER_MS: u64 = 1_000_000_000_000;
/// Femtoseconds per second.
pub const FS_PER_S: u64 = 1_000_000_000_000_000;

/// A point in simulation time, in femtoseconds since simulation start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime {
    /// Simulation time in femtoseconds.
    pub fs: u64,
}

impl SimTime {
    /// Simulation start.
    pub const ZERO: SimTime = SimTime { fs: 0 };

    /// Creates a time from a femtosecond value.
    pub const fn from_fs(fs: u64) -> Self {
        Self { fs }
    }

    /// Creates a time from a picosecond value.
    pub const fn from_ps(ps: u64) -> Self {
        Self { fs: ps * FS_PER_PS }
    }

    /// Creates a time from a nanosecond value.
    pub const fn from_ns(ns: u64) -> Self {
        Self { fs: ns * FS_PER_NS }
    }

    /// Returns the time in nanoseconds as a float, for diagnostics.
    pub fn as_ns_f64(&self) -> f64 {
        self.fs as f64 / FS_PER_NS as f64
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs = self.fs;
        let units = [
            (FS_PER_S, "s"),
            (FS_PER_MS, "ms"),
            (FS_PER_US, "us"),
            (FS_PER_NS, "ns"),
            (FS_PER_PS, "ps"),
        ];
        if fs != 0 {
            for (scale, name) in units {
                if fs >= scale && fs % scale == 0 {
                    return write!(f, "{} {name}", fs / scale);
                }
            }
        }
        write!(f, "{fs} fs")
    }
}

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDurationError {
    /// The input was empty.
    #[error("empty duration string")]
    Empty,
    /// No leading digits were found.
    #[error("invalid duration: no numeric value in '{0}'")]
    NoNumber(String),
    /// The numeric part overflowed.
    #[error("duration '{0}' is out of range")]
    Overflow(String),
    /// The unit was missing.
    #[error("missing unit in duration '{0}' (use fs, ps, ns, us, ms, or s)")]
    MissingUnit(String),
    /// The unit was not recognized.
    #[error("unknown duration unit '{0}' (use fs, ps, ns, us, ms, or s)")]
    UnknownUnit(String),
}

/// Returns the number of femtoseconds in one `unit`, if the unit is known.
pub(crate) fn unit_fs(unit: &str) -> Option<u64> {
    match unit {
        "fs" => Some(1),
        "ps" => Some(FS_PER_PS),
        "ns" => Some(FS_PER_NS),
        "us" => Some(FS_PER_US),
        "ms" => Some(FS_PER_MS),
        "s" => Some(FS_PER_S),
        _ => None,
    }
}

/// Parses a human-readable duration such as `"100ns"` or `"1 us"`.
///
/// Supports units: `fs`, `ps`, `ns`, `us`, `ms`, `s`.
pub fn parse_duration(s: &str) -> Result<SimTime, ParseDurationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseDurationError::Empty);
    }
    let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if digit_end == 0 {
        return Err(ParseDurationError::NoNumber(s.to_string()));
    }
    let number: u64 = s[..digit_end]
        .parse()
        .map_err(|_| ParseDurationError::Overflow(s.to_string()))?;
    let unit = s[digit_end..].trim();
    if unit.is_empty() {
        return Err(ParseDurationError::MissingUnit(s.to_string()));
    }
    let scale = unit_fs(unit).ok_or_else(|| ParseDurationError::UnknownUnit(unit.to_string()))?;
    number
        .checked_mul(scale)
        .map(SimTime::from_fs)
        .ok_or_else(|| ParseDurationError::Overflow(s.to_string()))
}
