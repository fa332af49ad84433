//! Four-state logic levels as they appear in waveform dumps.

use std::fmt;

/// The level of one bit of a simulated net.
///
/// Only `Zero` and `One` are driven levels. A verdict signal sitting at `X`
/// (never assigned, or driven by conflicting sources) or `Z` (floating) is
/// unresolved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(u8)]
pub enum Logic {
    /// Driven low.
    Zero = 0,
    /// Driven high.
    One = 1,
    /// Unassigned or contended; what every net holds before its first change.
    #[default]
    X = 2,
    /// Floating.
    Z = 3,
}

impl Logic {
    /// Decodes a VCD scalar value character, case-insensitively for `x` and `z`.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            '0' => Logic::Zero,
            '1' => Logic::One,
            'x' => Logic::X,
            'z' => Logic::Z,
            _ => return None,
        })
    }

    /// Returns true for the driven levels `0` and `1`.
    pub fn is_resolvable(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Returns true only for a driven logic-1.
    pub fn is_high(self) -> bool {
        self == Logic::One
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'X',
            Logic::Z => 'Z',
        };
        write!(f, "{c}")
    }
}
