/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! Clock dividers and rate generators.
//!
//! Chips are stepped either by discrete clock pulses supplied by the host ([ClockDivider])
//! or by a number of elapsed chip clock cycles converted to a fixed tick rate ([RateGenerator]).
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::error::{ConfigError, check_rate};

/// The serial clock multiplier: the number of clock pulses per one bit-time.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClockMode {
    X1  = 0,
    X16 = 1,
    X32 = 2,
    X64 = 3
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseClockModeError;

impl Default for ClockMode {
    fn default() -> Self {
        ClockMode::X1
    }
}

impl ClockMode {
    /// Returns the number of clock pulses per bit-time.
    #[inline]
    pub fn multiplier(self) -> u8 {
        match self {
            ClockMode::X1  => 1,
            ClockMode::X16 => 16,
            ClockMode::X32 => 32,
            ClockMode::X64 => 64
        }
    }
    /// Decodes the mode from 2 bits at the lowest position of `bits`.
    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => ClockMode::X1,
            1 => ClockMode::X16,
            2 => ClockMode::X32,
            _ => ClockMode::X64
        }
    }
}

impl std::error::Error for ParseClockModeError {}

impl fmt::Display for ParseClockModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `ClockMode`: unrecognized string")
    }
}

impl FromStr for ClockMode {
    type Err = ParseClockModeError;
    fn from_str(mode: &str) -> core::result::Result<Self, Self::Err> {
        let mode = mode.trim_start_matches(|c| c == 'x' || c == 'X');
        match mode {
            "1" => Ok(ClockMode::X1),
            "16" => Ok(ClockMode::X16),
            "32" => Ok(ClockMode::X32),
            "64" => Ok(ClockMode::X64),
            _ => Err(ParseClockModeError)
        }
    }
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.multiplier())
    }
}

/// Counts clock pulses and signals the end of each bit-time.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ClockDivider {
    count: u8
}

impl ClockDivider {
    /// Registers a single clock pulse.
    ///
    /// Returns `true` when the number of counted pulses reaches the `mode`'s multiplier,
    /// in which case the counter starts over.
    #[inline]
    pub fn pulse(&mut self, mode: ClockMode) -> bool {
        self.count += 1;
        if self.count >= mode.multiplier() {
            self.count = 0;
            true
        }
        else {
            false
        }
    }
    /// Sets the number of pulses already counted in the current bit-time.
    ///
    /// Used to move the sampling point of the next bit-time, e.g. to the middle of a bit.
    #[inline]
    pub fn preset(&mut self, count: u8) {
        self.count = count;
    }
    /// Returns the number of pulses counted in the current bit-time.
    #[inline]
    pub fn count(&self) -> u8 {
        self.count
    }
    #[inline]
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Converts elapsed chip clock cycles into ticks of a slower, fixed rate.
///
/// The fractional remainder is carried between calls so no ticks are lost or gained
/// regardless of how the cycles are chunked.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateGenerator {
    clock_hz: u32,
    rate_hz: u32,
    phase: u64
}

impl RateGenerator {
    /// Creates a generator of `rate_hz` ticks per second from a `clock_hz` clock.
    pub fn new(rate_hz: u32, clock_hz: u32) -> Result<Self, ConfigError> {
        check_rate(rate_hz, clock_hz)?;
        Ok(RateGenerator { clock_hz, rate_hz, phase: 0 })
    }
    /// Advances the generator by `cycles` clock cycles and returns the number of ticks elapsed.
    pub fn advance(&mut self, cycles: u32) -> u32 {
        let clock = u64::from(self.clock_hz);
        let total = self.phase + u64::from(cycles) * u64::from(self.rate_hz);
        self.phase = total % clock;
        // rate <= clock, so the quotient never exceeds cycles
        (total / clock) as u32
    }
    /// Returns the number of clock cycles left until the next tick.
    pub fn cycles_to_next_tick(&self) -> u32 {
        let rate = u64::from(self.rate_hz);
        let missing = u64::from(self.clock_hz) - self.phase;
        ((missing + rate - 1) / rate) as u32
    }
    #[inline]
    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }
    #[inline]
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }
    /// Drops the accumulated fraction of a tick.
    #[inline]
    pub fn reset(&mut self) {
        self.phase = 0;
    }
}
