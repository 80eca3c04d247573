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
//! Z80CHIPS is a library of Zilog Z80 family peripheral chip emulators.
//!
//! * [pio] - the Z80-PIO parallel input/output controller.
//! * [dart] - the Z80-DART dual asynchronous receiver/transmitter.
//! * [daisy] - the interrupt daisy chain arbitrating between the chips.
//! * [bus] - the CPU side: I/O port decoding, interrupt acknowledge and `RETI`.
//!
//! The chips are driven from both sides: the CPU reads and writes their registers and the host
//! emulator drives their pins through [pio::PioDevice] and [dart::DartDevice] implementations.
//!
//! ```
//! use z80chips::{ChannelId, ChipSet};
//! use z80chips::bus::PortMatch;
//! use z80chips::dart::Z80Dart;
//! use z80chips::pio::Z80Pio;
//! use z80chips::z80emu::Io;
//!
//! let mut chips: ChipSet<(), ()> = ChipSet::new();
//! chips.attach(Z80Pio::new(()).into(), PortMatch::new(0x00));
//! chips.attach(Z80Dart::new(()).into(), PortMatch::new(0x04));
//! // DART channel B: the interrupt vector
//! chips.write_io(0x07, 0x02, 0);
//! chips.write_io(0x07, 0x40, 0);
//! // DART channel A: interrupt on every received character
//! chips.write_io(0x06, 0x01, 0);
//! chips.write_io(0x06, 0x18, 0);
//! chips.chain_mut()[1].as_dart_mut().unwrap().receive_data(ChannelId::A, b'Z');
//! assert!(chips.is_irq(0));
//! assert_eq!(chips.irq_data(0x0038, 0).0, 0x40);
//! assert_eq!(chips.read_io(0x04, 0).0, b'Z');
//! ```
pub use z80chips_core::{z80emu, ChannelId};
pub use z80chips_core::{clock, daisy, error, lines};
pub use z80chips_peripherals::{bus, chip, dart, pio, register};

/// A bus with a daisy chain of PIO and DART chips.
///
/// `P` is the device connected to the PIO ports and `S` the device connected to the DART
/// serial lines.
pub type ChipSet<P, S, T=i32> = bus::ChipBus<chip::DaisyChip<P, S>, T>;
