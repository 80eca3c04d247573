/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! Configuration errors.
use core::fmt;

/// An error returned when a chip configuration can not be used to build a chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The chip clock frequency is `0`.
    ZeroClock,
    /// The poll divisor of the PIO is `0`.
    ZeroPollDivisor,
    /// A fixed serial clock rate is `0`.
    ZeroRate,
    /// A derived rate in Hz exceeds the chip clock frequency in Hz.
    RateExceedsClock {
        rate: u32,
        clock: u32
    }
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroClock => write!(f, "the chip clock frequency must not be 0"),
            ConfigError::ZeroPollDivisor => write!(f, "the poll divisor must not be 0"),
            ConfigError::ZeroRate => write!(f, "a fixed serial clock rate must not be 0"),
            ConfigError::RateExceedsClock { rate, clock } => write!(f,
                "the rate of {} Hz exceeds the chip clock frequency of {} Hz", rate, clock)
        }
    }
}

/// Checks if `rate` is a usable tick rate for a chip clocked at `clock` Hz.
pub fn check_rate(rate: u32, clock: u32) -> Result<(), ConfigError> {
    if clock == 0 {
        Err(ConfigError::ZeroClock)
    }
    else if rate == 0 {
        Err(ConfigError::ZeroRate)
    }
    else if rate > clock {
        Err(ConfigError::RateExceedsClock { rate, clock })
    }
    else {
        Ok(())
    }
}
