/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use z80chips_core::error::{ConfigError, check_rate};
use crate::register::AddressLayout;

/// The default clock frequency of a PIO in Hz.
pub const DEFAULT_PIO_CLOCK_HZ: u32 = 4_000_000;
/// The default number of clock cycles per one bit-control mode poll.
pub const DEFAULT_POLL_DIVISOR: u32 = 16;

/// Variants of the Z80-PIO.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PioVariant {
    /// Zilog Z8420 (Z80-PIO).
    Z8420,
    /// Sharp LH0081, with a readable control register.
    Lh0081,
    /// Mostek MK3881.
    Mk3881
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsePioVariantError;

/// The PIO configuration.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(default, rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PioConfig {
    /// A name identifying the chip in logs.
    pub tag: String,
    /// The chip clock frequency in Hz.
    pub clock_hz: u32,
    /// The bit-control mode inputs are polled every `poll_divisor` clock cycles.
    pub poll_divisor: u32,
    pub variant: PioVariant,
    pub layout: AddressLayout
}

impl Default for PioVariant {
    fn default() -> Self {
        PioVariant::Z8420
    }
}

impl Default for PioConfig {
    fn default() -> Self {
        PioConfig {
            tag: String::from("pio"),
            clock_hz: DEFAULT_PIO_CLOCK_HZ,
            poll_divisor: DEFAULT_POLL_DIVISOR,
            variant: PioVariant::default(),
            layout: AddressLayout::default()
        }
    }
}

impl PioConfig {
    /// Checks if the chip can be built with this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_divisor == 0 {
            return Err(ConfigError::ZeroPollDivisor)
        }
        check_rate(self.poll_rate_hz(), self.clock_hz)
    }
    /// Returns the frequency of the bit-control mode polls in Hz.
    ///
    /// The result is never `0` for a non-zero clock.
    pub fn poll_rate_hz(&self) -> u32 {
        match self.poll_divisor {
            0 => 0,
            div => (self.clock_hz / div).max(self.clock_hz.min(1))
        }
    }
}

impl PioVariant {
    /// Returns the part name of the variant.
    pub fn name(self) -> &'static str {
        match self {
            PioVariant::Z8420 => "Z8420",
            PioVariant::Lh0081 => "LH0081",
            PioVariant::Mk3881 => "MK3881"
        }
    }
    /// Returns `true` if reading the control register returns the interrupt control bits.
    pub fn has_readable_control(self) -> bool {
        self == PioVariant::Lh0081
    }
}

impl std::error::Error for ParsePioVariantError {}

impl fmt::Display for ParsePioVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `PioVariant`: unrecognized string")
    }
}

impl FromStr for PioVariant {
    type Err = ParsePioVariantError;
    fn from_str(name: &str) -> core::result::Result<Self, Self::Err> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("z8420") || name.eq_ignore_ascii_case("z80pio") {
            Ok(PioVariant::Z8420)
        }
        else if name.eq_ignore_ascii_case("lh0081") {
            Ok(PioVariant::Lh0081)
        }
        else if name.eq_ignore_ascii_case("mk3881") {
            Ok(PioVariant::Mk3881)
        }
        else {
            Err(ParsePioVariantError)
        }
    }
}

impl fmt::Display for PioVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pio_config_works() {
        let config = PioConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.poll_rate_hz(), 250_000);
        let config = PioConfig { poll_divisor: 0, ..PioConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollDivisor));
        let config = PioConfig { clock_hz: 0, ..PioConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroClock));
        let config = PioConfig { clock_hz: 10, poll_divisor: 100, ..PioConfig::default() };
        assert_eq!(config.poll_rate_hz(), 1);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn pio_variant_works() {
        assert_eq!("LH0081".parse::<PioVariant>(), Ok(PioVariant::Lh0081));
        assert_eq!(" z80pio ".parse::<PioVariant>(), Ok(PioVariant::Z8420));
        assert_eq!("8255".parse::<PioVariant>(), Err(ParsePioVariantError));
        assert_eq!(PioVariant::Mk3881.to_string(), "MK3881");
        assert!(PioVariant::Lh0081.has_readable_control());
        assert!(!PioVariant::Z8420.has_readable_control());
    }
}
