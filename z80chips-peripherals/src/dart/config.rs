/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use z80chips_core::clock::RateGenerator;
use z80chips_core::error::{ConfigError, check_rate};
use crate::register::AddressLayout;

/// The default clock frequency of a DART in Hz.
pub const DEFAULT_DART_CLOCK_HZ: u32 = 4_000_000;

/// The DART configuration.
///
/// The serial clock inputs of a channel may be fed with pulses by the host, see [Z80Dart::rxca_w],
/// or generated internally from the chip clock at a fixed rate given here in pulses per second.
/// Internally generated pulses are run by [Z80Dart::advance].
///
/// [Z80Dart::rxca_w]: super::Z80Dart::rxca_w
/// [Z80Dart::advance]: super::Z80Dart::advance
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(default, rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DartConfig {
    /// A name identifying the chip in logs.
    pub tag: String,
    /// The chip clock frequency in Hz.
    pub clock_hz: u32,
    pub layout: AddressLayout,
    /// Fixed receiver clock rates of channels A and B.
    pub rx_rates: [Option<u32>; 2],
    /// Fixed transmitter clock rates of channels A and B.
    pub tx_rates: [Option<u32>; 2]
}

impl Default for DartConfig {
    fn default() -> Self {
        DartConfig {
            tag: String::from("dart"),
            clock_hz: DEFAULT_DART_CLOCK_HZ,
            layout: AddressLayout::default(),
            rx_rates: [None; 2],
            tx_rates: [None; 2]
        }
    }
}

impl DartConfig {
    /// Checks if the chip can be built with this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_hz == 0 {
            return Err(ConfigError::ZeroClock)
        }
        for rate in self.rx_rates.iter().chain(self.tx_rates.iter()).flatten() {
            check_rate(*rate, self.clock_hz)?;
        }
        Ok(())
    }

    pub(super) fn generators(rates: &[Option<u32>; 2], clock_hz: u32)
        -> Result<[Option<RateGenerator>; 2], ConfigError>
    {
        let mut gens = [None; 2];
        for (gen, rate) in gens.iter_mut().zip(rates.iter()) {
            if let Some(rate) = *rate {
                *gen = Some(RateGenerator::new(rate, clock_hz)?);
            }
        }
        Ok(gens)
    }
}
