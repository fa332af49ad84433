//! Multi-bit signal values as recorded in waveform dumps.

use crate::logic::Logic;
use std::fmt;

/// Levels stored per byte, two bits each.
const LEVELS_PER_BYTE: u32 = 4;

/// The value of a `width`-bit net, bit 0 being the least significant.
///
/// Levels are packed two bits apiece using the [`Logic`] discriminants.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LogicVec {
    width: u32,
    packed: Vec<u8>,
}

impl LogicVec {
    /// A `width`-bit value with every bit at `level`.
    pub fn filled(width: u32, level: Logic) -> Self {
        let byte = (0..LEVELS_PER_BYTE).fold(0u8, |acc, slot| acc | (level as u8) << (slot * 2));
        Self {
            width,
            packed: vec![byte; width.div_ceil(LEVELS_PER_BYTE) as usize],
        }
    }

    /// A `width`-bit value of all zeros.
    pub fn new(width: u32) -> Self {
        Self::filled(width, Logic::Zero)
    }

    /// A single-bit value.
    pub fn from_logic(level: Logic) -> Self {
        Self::filled(1, level)
    }

    /// Parses the bit string of a VCD vector change, most significant bit first.
    pub fn from_binary_str(bits: &str) -> Option<Self> {
        let levels = bits
            .chars()
            .rev()
            .map(Logic::from_char)
            .collect::<Option<Vec<_>>>()?;
        let mut v = Self::new(levels.len() as u32);
        for (i, level) in levels.into_iter().enumerate() {
            v.set(i as u32, level);
        }
        Some(v)
    }

    /// Number of bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The level of bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        let (byte, shift) = self.slot(index);
        match (self.packed[byte] >> shift) & 0b11 {
            0 => Logic::Zero,
            1 => Logic::One,
            2 => Logic::X,
            _ => Logic::Z,
        }
    }

    /// Sets bit `index` to `level`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, level: Logic) {
        let (byte, shift) = self.slot(index);
        let cell = &mut self.packed[byte];
        *cell = (*cell & !(0b11 << shift)) | ((level as u8) << shift);
    }

    /// The unsigned value, if every bit is driven and the width fits in 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width > u64::BITS {
            return None;
        }
        (0..self.width).try_fold(0u64, |acc, i| match self.get(i) {
            Logic::Zero => Some(acc),
            Logic::One => Some(acc | 1 << i),
            Logic::X | Logic::Z => None,
        })
    }

    fn slot(&self, index: u32) -> (usize, u32) {
        assert!(
            index < self.width,
            "bit {index} is outside a {}-bit value",
            self.width
        );
        (
            (index / LEVELS_PER_BYTE) as usize,
            (index % LEVELS_PER_BYTE) * 2,
        )
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (0..self.width)
            .rev()
            .try_for_each(|i| write!(f, "{}", self.get(i)))
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b{self}", self.width)
    }
}
