/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! A daisy chain element holding any of the peripheral chips.
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use z80chips_core::daisy::{DaisyDevice, IntState};
use z80chips_core::ChannelId;
use crate::dart::{DartDevice, Z80Dart};
use crate::pio::{PioDevice, Z80Pio};
use crate::register::{AddressLayout, ChipRegisters, RegisterSelect};

/// Either of the peripheral chips, so both kinds can share a single [DaisyChain].
///
/// `P` is the device connected to the PIO ports and `S` the device connected to the DART
/// serial lines.
///
/// [DaisyChain]: z80chips_core::daisy::DaisyChain
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(bound(
    deserialize = "P: Default, S: Default",
    serialize = "")))]
#[derive(Clone, Debug)]
pub enum DaisyChip<P, S> {
    Pio(Z80Pio<P>),
    Dart(Z80Dart<S>)
}

impl<P, S> DaisyChip<P, S> {
    /// Returns the tag of the contained chip.
    pub fn tag(&self) -> &str {
        match self {
            DaisyChip::Pio(pio) => pio.tag(),
            DaisyChip::Dart(dart) => dart.tag()
        }
    }

    pub fn as_pio(&self) -> Option<&Z80Pio<P>> {
        match self {
            DaisyChip::Pio(pio) => Some(pio),
            _ => None
        }
    }

    pub fn as_pio_mut(&mut self) -> Option<&mut Z80Pio<P>> {
        match self {
            DaisyChip::Pio(pio) => Some(pio),
            _ => None
        }
    }

    pub fn as_dart(&self) -> Option<&Z80Dart<S>> {
        match self {
            DaisyChip::Dart(dart) => Some(dart),
            _ => None
        }
    }

    pub fn as_dart_mut(&mut self) -> Option<&mut Z80Dart<S>> {
        match self {
            DaisyChip::Dart(dart) => Some(dart),
            _ => None
        }
    }
}

impl<P: PioDevice, S: DartDevice> DaisyChip<P, S> {
    /// Resets the contained chip.
    pub fn reset(&mut self) {
        match self {
            DaisyChip::Pio(pio) => pio.reset(),
            DaisyChip::Dart(dart) => dart.reset()
        }
    }
    /// Advances the clock driven parts of the contained chip by `cycles` chip clock cycles.
    pub fn advance(&mut self, cycles: u32) {
        match self {
            DaisyChip::Pio(pio) => pio.advance(cycles),
            DaisyChip::Dart(dart) => dart.advance(cycles)
        }
    }
}

impl<P, S> From<Z80Pio<P>> for DaisyChip<P, S> {
    fn from(pio: Z80Pio<P>) -> Self {
        DaisyChip::Pio(pio)
    }
}

impl<P, S> From<Z80Dart<S>> for DaisyChip<P, S> {
    fn from(dart: Z80Dart<S>) -> Self {
        DaisyChip::Dart(dart)
    }
}

impl<P: PioDevice, S: DartDevice> DaisyDevice for DaisyChip<P, S> {
    fn irq_state(&self) -> IntState {
        match self {
            DaisyChip::Pio(pio) => pio.irq_state(),
            DaisyChip::Dart(dart) => dart.irq_state()
        }
    }

    fn irq_ack(&mut self) -> u8 {
        match self {
            DaisyChip::Pio(pio) => pio.irq_ack(),
            DaisyChip::Dart(dart) => dart.irq_ack()
        }
    }

    fn irq_reti(&mut self) {
        match self {
            DaisyChip::Pio(pio) => pio.irq_reti(),
            DaisyChip::Dart(dart) => dart.irq_reti()
        }
    }
}

impl<P: PioDevice, S: DartDevice> ChipRegisters for DaisyChip<P, S> {
    fn address_layout(&self) -> AddressLayout {
        match self {
            DaisyChip::Pio(pio) => pio.address_layout(),
            DaisyChip::Dart(dart) => dart.address_layout()
        }
    }

    fn read_register(&mut self, channel: ChannelId, select: RegisterSelect) -> u8 {
        match self {
            DaisyChip::Pio(pio) => pio.read_register(channel, select),
            DaisyChip::Dart(dart) => dart.read_register(channel, select)
        }
    }

    fn write_register(&mut self, channel: ChannelId, select: RegisterSelect, data: u8) {
        match self {
            DaisyChip::Pio(pio) => pio.write_register(channel, select, data),
            DaisyChip::Dart(dart) => dart.write_register(channel, select, data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z80chips_core::daisy::DaisyChain;

    type Chip = DaisyChip<(), ()>;

    #[test]
    fn daisy_chip_works() {
        let mut chain: DaisyChain<Chip> = vec![
            Chip::from(Z80Pio::new(())),
            Chip::from(Z80Dart::new(()))
        ].into();
        assert_eq!(chain[0].tag(), "pio");
        assert_eq!(chain[1].tag(), "dart");
        assert!(chain[0].as_dart().is_none());
        assert!(chain[1].as_pio().is_none());
        // DART channel B vector and receive interrupts on all characters
        {
            let dart = chain[1].as_dart_mut().unwrap();
            dart.control_write(ChannelId::B, 2);
            dart.control_write(ChannelId::B, 0x20);
            dart.control_write(ChannelId::A, 1);
            dart.control_write(ChannelId::A, 0x18);
            dart.receive_data(ChannelId::A, 0x41);
        }
        assert!(chain.is_irq());
        assert_eq!(chain.requesting_device(), Some(1));
        assert_eq!(chain.acknowledge(), Some(0x20));
        assert!(!chain.is_irq());
        assert_eq!(chain[1].read(0), 0x41);
        assert_eq!(chain.reti(), Some(1));
        assert_eq!(chain[1].irq_state(), IntState::empty());
        chain[0].write(2, 0x10);
        assert_eq!(chain[0].as_pio().unwrap().port(ChannelId::A).interrupt_vector(), 0x10);
        chain[1].reset();
        assert_eq!(chain[1].as_dart().unwrap().channel(ChannelId::B).wr(2), 0x20);
    }
}
