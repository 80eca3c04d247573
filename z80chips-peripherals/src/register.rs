/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! Register addressing of the Z80 peripheral chips.
//!
//! Both the PIO and the DART expose 4 registers selected by two address lines: one selects
//! a port or a channel (`B/A`), the other selects the control or the data register (`C/D`).
//! Boards differ in which CPU address line is connected to which pin, hence the [AddressLayout].
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use z80chips_core::ChannelId;

/// The register kind selected by the `C/D` pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterSelect {
    Data,
    Control
}

/// Determines how a 2-bit register offset is decoded.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressLayout {
    /// `C/D` on offset bit 1, `B/A` on offset bit 0.
    ///
    /// Offsets: `0` - A data, `1` - B data, `2` - A control, `3` - B control.
    BaCd,
    /// `B/A` on offset bit 1, `C/D` on offset bit 0.
    ///
    /// Offsets: `0` - A data, `1` - A control, `2` - B data, `3` - B control.
    CdBa
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseAddressLayoutError;

impl Default for AddressLayout {
    fn default() -> Self {
        AddressLayout::BaCd
    }
}

impl AddressLayout {
    /// Decodes the lowest 2 bits of `offset`.
    #[inline]
    pub fn decode(self, offset: u8) -> (ChannelId, RegisterSelect) {
        let (channel, control) = match self {
            AddressLayout::BaCd => (offset & 1 != 0, offset & 2 != 0),
            AddressLayout::CdBa => (offset & 2 != 0, offset & 1 != 0),
        };
        let select = if control { RegisterSelect::Control } else { RegisterSelect::Data };
        (channel.into(), select)
    }
    /// Returns the offset addressing the given register.
    #[inline]
    pub fn encode(self, channel: ChannelId, select: RegisterSelect) -> u8 {
        let channel = channel.index() as u8;
        let control = (select == RegisterSelect::Control) as u8;
        match self {
            AddressLayout::BaCd => control << 1 | channel,
            AddressLayout::CdBa => channel << 1 | control,
        }
    }
}

impl std::error::Error for ParseAddressLayoutError {}

impl fmt::Display for ParseAddressLayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `AddressLayout`: unrecognized string")
    }
}

impl FromStr for AddressLayout {
    type Err = ParseAddressLayoutError;
    fn from_str(layout: &str) -> core::result::Result<Self, Self::Err> {
        if layout.eq_ignore_ascii_case("ba_cd") || layout.eq_ignore_ascii_case("bacd") {
            Ok(AddressLayout::BaCd)
        }
        else if layout.eq_ignore_ascii_case("cd_ba") || layout.eq_ignore_ascii_case("cdba") {
            Ok(AddressLayout::CdBa)
        }
        else {
            Err(ParseAddressLayoutError)
        }
    }
}

impl fmt::Display for AddressLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddressLayout::BaCd => "ba_cd",
            AddressLayout::CdBa => "cd_ba"
        })
    }
}

/// Register level access to a chip, used by the CPU bus.
pub trait ChipRegisters {
    /// Returns the address layout the chip is wired with.
    fn address_layout(&self) -> AddressLayout;
    /// Reads the selected register of the given port or channel.
    fn read_register(&mut self, channel: ChannelId, select: RegisterSelect) -> u8;
    /// Writes `data` to the selected register of the given port or channel.
    fn write_register(&mut self, channel: ChannelId, select: RegisterSelect, data: u8);
    /// Reads the register addressed by the lowest 2 bits of `offset`.
    #[inline]
    fn read(&mut self, offset: u8) -> u8 {
        let (channel, select) = self.address_layout().decode(offset);
        self.read_register(channel, select)
    }
    /// Writes `data` to the register addressed by the lowest 2 bits of `offset`.
    #[inline]
    fn write(&mut self, offset: u8, data: u8) {
        let (channel, select) = self.address_layout().decode(offset);
        self.write_register(channel, select, data)
    }
}
