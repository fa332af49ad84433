//! Simulator timescale specifications such as `1ns/1ps`.

use std::fmt;
use std::str::FromStr;

use crate::time::{unit_fs, SimTime, FS_PER_MS, FS_PER_NS, FS_PER_PS, FS_PER_S, FS_PER_US};

/// A Verilog `` `timescale `` pair: time unit and time precision.
///
/// Both components are restricted to magnitudes 1, 10 or 100 of a standard
/// unit, and the precision may not be coarser than the unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timescale {
    /// The time unit for delays.
    pub unit: SimTime,
    /// The rounding precision.
    pub precision: SimTime,
}

/// Error returned when a timescale string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTimescaleError {
    /// The string was not of the form `<unit>/<precision>`.
    #[error("timescale '{0}' must have the form <unit>/<precision>, e.g. 1ns/1ps")]
    Shape(String),
    /// One component was not a valid magnitude and unit.
    #[error("invalid timescale component '{0}' (use 1, 10 or 100 of fs, ps, ns, us, ms, s)")]
    Component(String),
    /// The precision is coarser than the unit.
    #[error("timescale precision {precision} is coarser than unit {unit}")]
    PrecisionCoarserThanUnit {
        /// The unit component.
        unit: String,
        /// The precision component.
        precision: String,
    },
}

impl Timescale {
    /// Parses a timescale like `"1ps/1ps"` or `"10 ns / 100 ps"`.
    pub fn parse(s: &str) -> Result<Self, ParseTimescaleError> {
        let (unit, precision) = s
            .split_once('/')
            .ok_or_else(|| ParseTimescaleError::Shape(s.to_string()))?;
        let unit = parse_component(unit)?;
        let precision = parse_component(precision)?;
        if precision > unit {
            return Err(ParseTimescaleError::PrecisionCoarserThanUnit {
                unit: compact(unit),
                precision: compact(precision),
            });
        }
        Ok(Self { unit, precision })
    }

    /// The smallest whole number of time units that reaches `t`, for `#` delays.
    pub fn delay_units(&self, t: SimTime) -> u64 {
        t.fs.div_ceil(self.unit.fs.max(1))
    }
}

impl Default for Timescale {
    fn default() -> Self {
        Self {
            unit: SimTime::from_ps(1),
            precision: SimTime::from_ps(1),
        }
    }
}

impl FromStr for Timescale {
    type Err = ParseTimescaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Timescale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", compact(self.unit), compact(self.precision))
    }
}

fn parse_component(raw: &str) -> Result<SimTime, ParseTimescaleError> {
    let s = raw.trim();
    let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let magnitude = match &s[..digit_end] {
        "1" => 1,
        "10" => 10,
        "100" => 100,
        _ => return Err(ParseTimescaleError::Component(s.to_string())),
    };
    let scale = unit_fs(s[digit_end..].trim())
        .ok_or_else(|| ParseTimescaleError::Component(s.to_string()))?;
    Ok(SimTime::from_fs(magnitude * scale))
}

/// Renders a timescale component without spaces, e.g. `10ns`.
fn compact(t: SimTime) -> String {
    let units = [
        (FS_PER_S, "s"),
        (FS_PER_MS, "ms"),
        (FS_PER_US, "us"),
        (FS_PER_NS, "ns"),
        (FS_PER_PS, "ps"),
    ];
    for (scale, name) in units {
        if t.fs >= scale && t.fs % scale == 0 {
            return format!("{}{name}", t.fs / scale);
        }
    }
    format!("{}fs", t.fs)
}
