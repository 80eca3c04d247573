/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    Z80CHIPS is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    Z80CHIPS is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! The core components of the Z80CHIPS library.
//!
//! * [daisy] - the interrupt daisy chain shared by every Z80 family peripheral.
//! * [lines] - logic levels of serial and modem control lines.
//! * [clock] - clock dividers and rate generators converting CPU cycles to chip ticks.
//! * [flags] - helper macros for [bitflags] register types.
//! * [error] - configuration errors.
pub mod clock;
pub mod daisy;
pub mod error;
pub mod flags;
pub mod lines;

pub use z80emu;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

/// Identifies one of the two ports of a PIO or one of the two channels of a DART.
///
/// Port or channel `A` always has the higher interrupt priority within a chip.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelId {
    A = 0,
    B = 1
}

impl ChannelId {
    /// Both channels in the order of their priority.
    pub const ALL: [ChannelId; 2] = [ChannelId::A, ChannelId::B];

    /// Returns the index of the channel: `0` for `A` and `1` for `B`.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
    /// Returns the other channel.
    #[inline]
    pub fn other(self) -> ChannelId {
        match self {
            ChannelId::A => ChannelId::B,
            ChannelId::B => ChannelId::A
        }
    }
}

impl From<bool> for ChannelId {
    /// `false` selects `A` and `true` selects `B`, as the channel select address line does.
    fn from(b: bool) -> Self {
        if b { ChannelId::B } else { ChannelId::A }
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ChannelId::A => "A",
            ChannelId::B => "B"
        })
    }
}
