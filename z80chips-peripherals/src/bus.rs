/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! Connects a daisy chain of chips to the Z80 CPU I/O bus.
//!
//! [ChipBus] implements [Io], so it can be handed to the [z80emu] CPU as its I/O device.
//! Each chip is selected by matching the I/O port address against a mask and bits; the lowest
//! 2 bits of the port address then select the chip register, see [AddressLayout].
//!
//! The interrupt acknowledge cycle and `RETI` detection are routed to the [DaisyChain].
//!
//! [AddressLayout]: crate::register::AddressLayout
use core::marker::PhantomData;
use core::num::NonZeroU16;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use z80chips_core::daisy::{DaisyChain, DaisyDevice};
use z80chips_core::z80emu::Io;
use crate::register::ChipRegisters;

/// The value read from an I/O port no chip responds to.
pub const OPEN_BUS: u8 = u8::max_value();

/// Selects a chip on the I/O bus when `port & mask == bits`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortMatch {
    pub mask: u16,
    pub bits: u16
}

impl PortMatch {
    /// Matches the 8 lower bits of the port address with `base`, ignoring the 2 register
    /// select bits.
    pub fn new(base: u8) -> Self {
        let mask = 0x00fc;
        PortMatch { mask, bits: u16::from(base) & mask }
    }
    #[inline]
    pub fn match_port(self, port: u16) -> bool {
        port & self.mask == self.bits
    }
}

/// A daisy chain of chips with I/O port decoding.
///
/// `T` is the timestamp type of the CPU clock. Timestamps are not used by the chips.
#[derive(Clone, Debug)]
pub struct ChipBus<D, T=i32> {
    chain: DaisyChain<D>,
    ports: Vec<(PortMatch, usize)>,
    _ts: PhantomData<T>
}

impl<D, T> Default for ChipBus<D, T> {
    fn default() -> Self {
        ChipBus { chain: DaisyChain::default(), ports: Vec::new(), _ts: PhantomData }
    }
}

impl<D, T> ChipBus<D, T> {
    pub fn new() -> Self {
        Self::default()
    }
    /// Appends a chip at the lowest priority end of the chain, selected by `port_match`.
    ///
    /// Returns the index of the chip in the chain.
    pub fn attach(&mut self, chip: D, port_match: PortMatch) -> usize {
        let index = self.chain.len();
        self.chain.push(chip);
        self.ports.push((port_match, index));
        index
    }
    /// Appends a chip at the lowest priority end of the chain that does not respond to
    /// any I/O port.
    pub fn attach_unmapped(&mut self, chip: D) -> usize {
        let index = self.chain.len();
        self.chain.push(chip);
        index
    }
    #[inline]
    pub fn chain(&self) -> &DaisyChain<D> {
        &self.chain
    }
    #[inline]
    pub fn chain_mut(&mut self) -> &mut DaisyChain<D> {
        &mut self.chain
    }
    /// Returns the index of the chip selected by `port`.
    pub fn find_chip(&self, port: u16) -> Option<usize> {
        self.ports.iter().find(|(port_match, _)| port_match.match_port(port))
                         .map(|&(_, index)| index)
    }
    pub fn into_chain(self) -> DaisyChain<D> {
        self.chain
    }
}

impl<D, T> ChipBus<D, T>
    where D: DaisyDevice + ChipRegisters
{
    /// Reads a chip register as a CPU `IN` instruction would.
    pub fn read_port(&mut self, port: u16) -> u8 {
        match self.find_chip(port) {
            Some(index) => self.chain[index].read(port as u8),
            None => {
                trace!("read from unmapped port: {:04x}", port);
                OPEN_BUS
            }
        }
    }
    /// Writes a chip register as a CPU `OUT` instruction would.
    pub fn write_port(&mut self, port: u16, data: u8) {
        match self.find_chip(port) {
            Some(index) => self.chain[index].write(port as u8, data),
            None => trace!("write to unmapped port: {:04x} <- {:02x}", port, data)
        }
    }
}

impl<D, T> Io for ChipBus<D, T>
    where D: DaisyDevice + ChipRegisters,
          T: Copy
{
    type Timestamp = T;
    type WrIoBreak = ();
    type RetiBreak = ();

    #[inline]
    fn is_irq(&mut self, _ts: T) -> bool {
        self.chain.is_irq()
    }

    fn read_io(&mut self, port: u16, _ts: T) -> (u8, Option<NonZeroU16>) {
        (self.read_port(port), None)
    }

    fn write_io(&mut self, port: u16, data: u8, _ts: T) -> (Option<()>, Option<NonZeroU16>) {
        self.write_port(port, data);
        (None, None)
    }

    fn irq_data(&mut self, _pc: u16, _ts: T) -> (u8, Option<NonZeroU16>) {
        (self.chain.acknowledge().unwrap_or(OPEN_BUS), None)
    }

    fn reti(&mut self, _addr: u16, _ts: T) -> Option<()> {
        self.chain.reti();
        None
    }
}
