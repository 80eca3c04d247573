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
//! Emulators of Z80 family peripheral chips.
//!
//! * [pio] - the Z80-PIO parallel input/output controller.
//! * [dart] - the Z80-DART dual asynchronous receiver/transmitter.
//! * [register] - the 2-bit register addressing shared by both chips.
//! * [chip] - a chain element holding either chip.
//! * [bus] - an implementation of [z80emu::Io] routing the CPU to the chips.
//!
//! [z80emu::Io]: z80chips_core::z80emu::Io
pub mod bus;
pub mod chip;
pub mod dart;
pub mod pio;
pub mod register;
