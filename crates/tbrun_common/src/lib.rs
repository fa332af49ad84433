//! Shared foundational types used across the tbrun test harness.
//!
//! This crate provides 4-state logic values, packed logic vectors, simulation
//! timestamps, duration parsing, and simulator timescale specifications.

#![warn(missing_docs)]

pub mod logic;
pub mod logic_vec;
pub mod time;
pub mod timescale;

pub use logic::Logic;
pub use logic_vec::LogicVec;
pub use time::{parse_duration, ParseDurationError, SimTime};
pub use timescale::{ParseTimescaleError, Timescale};
