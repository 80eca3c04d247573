/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! The Z80 interrupt daisy chain.
//!
//! Z80 family peripherals resolve the interrupt priority in hardware: each chip has an `IEI`
//! (interrupt enable in) and an `IEO` (interrupt enable out) pin, and the chips are chained
//! `IEO` to `IEI`. A chip may request an interrupt only if its `IEI` is high, and while one of
//! its sources is being serviced it keeps its `IEO` low, blocking every chip further down the
//! chain until the `RETI` instruction is decoded.
//!
//! Here each interrupt source is represented by an [IntState] slot. Chips keep their slots in
//! an [InterruptSources] container and expose the protocol via the [DaisyDevice] trait.
//! A [DaisyChain] orders chips by priority and performs the CPU side of the protocol.
use core::ops::{Index, IndexMut};
use core::iter::FromIterator;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use bitflags::bitflags;

use crate::register_flags_conv;

bitflags! {
    /// The state of a single interrupt source, or an aggregate state of a chip.
    ///
    /// * An empty state means the source is idle.
    /// * [IntState::INT] means the source requests an interrupt.
    /// * [IntState::IEO] means the interrupt of the source is being serviced, and lower priority
    ///   sources are blocked.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct IntState: u8 {
        const INT = 0b01;
        const IEO = 0b10;
    }
}
register_flags_conv!(IntState);

impl IntState {
    /// Returns `true` if an interrupt is requested.
    #[inline]
    pub fn is_requested(self) -> bool {
        self.contains(IntState::INT)
    }
    /// Returns `true` if an interrupt is being serviced.
    #[inline]
    pub fn is_under_service(self) -> bool {
        self.contains(IntState::IEO)
    }
}

/// An interface of the chips attached to the interrupt daisy chain.
pub trait DaisyDevice {
    /// Returns the aggregate interrupt state of the chip.
    ///
    /// Sources are scanned in the order of their priority and their states are combined until
    /// the first source being serviced is found. Thus [IntState::INT] is present only if a source
    /// of a higher priority than the one being serviced requests an interrupt.
    fn irq_state(&self) -> IntState;
    /// Acknowledges the interrupt of the highest priority source requesting it and returns its
    /// interrupt vector.
    ///
    /// The source becomes being serviced.
    fn irq_ack(&mut self) -> u8;
    /// Signals the end of the interrupt routine of the highest priority source being serviced.
    fn irq_reti(&mut self);
}

impl<D: DaisyDevice + ?Sized> DaisyDevice for Box<D> {
    #[inline]
    fn irq_state(&self) -> IntState {
        (**self).irq_state()
    }
    #[inline]
    fn irq_ack(&mut self) -> u8 {
        (**self).irq_ack()
    }
    #[inline]
    fn irq_reti(&mut self) {
        (**self).irq_reti()
    }
}

impl<D: DaisyDevice + ?Sized> DaisyDevice for &mut D {
    #[inline]
    fn irq_state(&self) -> IntState {
        (**self).irq_state()
    }
    #[inline]
    fn irq_ack(&mut self) -> u8 {
        (**self).irq_ack()
    }
    #[inline]
    fn irq_reti(&mut self) {
        (**self).irq_reti()
    }
}

/// The interrupt slots of a chip, one per source, ordered from the highest priority.
///
/// `S` is an array of [IntState], e.g. `[IntState; 2]` for a PIO.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct InterruptSources<S> {
    slots: S
}

impl<S> InterruptSources<S>
    where S: AsRef<[IntState]> + AsMut<[IntState]>
{
    /// Creates interrupt sources from the given `slots`.
    pub fn new(slots: S) -> Self {
        InterruptSources { slots }
    }
    /// Returns the number of sources.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.as_ref().len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.as_ref().is_empty()
    }
    /// Returns the state of the source at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> IntState {
        self.slots.as_ref()[index]
    }
    /// Returns an iterator over the states of all sources, in priority order.
    pub fn iter(&self) -> impl Iterator<Item=IntState> + '_ {
        self.slots.as_ref().iter().copied()
    }
    /// Requests an interrupt from the source at `index`.
    #[inline]
    pub fn request(&mut self, index: usize) {
        self.slots.as_mut()[index].insert(IntState::INT);
    }
    /// Withdraws the interrupt request of the source at `index`.
    #[inline]
    pub fn withdraw(&mut self, index: usize) {
        self.slots.as_mut()[index].remove(IntState::INT);
    }
    /// Sets or withdraws the interrupt request of the source at `index`.
    #[inline]
    pub fn set_requested(&mut self, index: usize, request: bool) {
        self.slots.as_mut()[index].set(IntState::INT, request);
    }
    /// Returns the aggregate state of all sources as described in [DaisyDevice::irq_state].
    pub fn state(&self) -> IntState {
        let mut state = IntState::empty();
        for &slot in self.slots.as_ref() {
            state |= slot;
            if slot.is_under_service() {
                break;
            }
        }
        state
    }
    /// Acknowledges the first source requesting an interrupt.
    ///
    /// The source is marked as being serviced and its index is returned.
    /// Returns `None` if no source requests an interrupt.
    pub fn acknowledge(&mut self) -> Option<usize> {
        let slots = self.slots.as_mut();
        let index = slots.iter().position(|slot| slot.is_requested())?;
        slots[index] = IntState::IEO;
        Some(index)
    }
    /// Ends servicing of the first source being serviced and returns its index.
    ///
    /// Returns `None` if no source is being serviced.
    pub fn return_from_interrupt(&mut self) -> Option<usize> {
        let slots = self.slots.as_mut();
        let index = slots.iter().position(|slot| slot.is_under_service())?;
        slots[index].remove(IntState::IEO);
        Some(index)
    }
    /// Brings all sources to the idle state.
    pub fn reset(&mut self) {
        for slot in self.slots.as_mut() {
            *slot = IntState::empty();
        }
    }
}

/// Chips attached to the interrupt daisy chain, ordered from the highest priority.
///
/// Chips can only be appended to the chain, so the index of each chip is stable and may be used
/// as its handle.
#[derive(Clone, Debug)]
pub struct DaisyChain<D> {
    devices: Vec<D>
}

impl<D> Default for DaisyChain<D> {
    fn default() -> Self {
        DaisyChain { devices: Vec::new() }
    }
}

impl<D> DaisyChain<D> {
    /// Creates a chain from devices given in the order of their priority.
    pub fn new(devices: Vec<D>) -> Self {
        DaisyChain { devices }
    }
    /// Appends a chip at the lowest priority end of the chain.
    pub fn push(&mut self, device: D) {
        self.devices.push(device);
    }
    /// Returns the number of chips in the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.devices.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
    /// Returns a reference to the chip at `index` or `None` if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&D> {
        self.devices.get(index)
    }
    /// Returns a mutable reference to the chip at `index` or `None` if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut D> {
        self.devices.get_mut(index)
    }
    pub fn iter(&self) -> core::slice::Iter<'_, D> {
        self.devices.iter()
    }
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, D> {
        self.devices.iter_mut()
    }
    /// Destructs the chain and returns the chips.
    pub fn into_inner(self) -> Vec<D> {
        self.devices
    }
}

impl<D: DaisyDevice> DaisyChain<D> {
    /// Returns the index of the chip which should be acknowledged next.
    ///
    /// The chain is walked from the head. The walk stops at the first chip requesting an
    /// interrupt, or at the first chip being serviced, which blocks the rest of the chain.
    pub fn requesting_device(&self) -> Option<usize> {
        for (index, device) in self.devices.iter().enumerate() {
            let state = device.irq_state();
            if state.is_requested() {
                return Some(index);
            }
            if state.is_under_service() {
                break;
            }
        }
        None
    }
    /// Returns `true` if the `INT` line of the CPU should be asserted.
    #[inline]
    pub fn is_irq(&self) -> bool {
        self.requesting_device().is_some()
    }
    /// Performs the interrupt acknowledge cycle and returns the vector supplied by the chip.
    ///
    /// Returns `None` if no chip is allowed to request an interrupt.
    pub fn acknowledge(&mut self) -> Option<u8> {
        match self.requesting_device() {
            Some(index) => Some(self.devices[index].irq_ack()),
            None => {
                error!("interrupt acknowledged with no chip requesting it");
                None
            }
        }
    }
    /// Delivers the `RETI` instruction to the chain.
    ///
    /// Only the first chip being serviced takes notice, since every chip below it sees its
    /// `IEI` low. Returns the index of that chip.
    pub fn reti(&mut self) -> Option<usize> {
        let found = self.devices.iter()
                    .position(|device| device.irq_state().is_under_service());
        match found {
            Some(index) => {
                self.devices[index].irq_reti();
                Some(index)
            }
            None => {
                error!("RETI with no chip being serviced");
                None
            }
        }
    }
}

impl<D> From<Vec<D>> for DaisyChain<D> {
    fn from(devices: Vec<D>) -> Self {
        DaisyChain::new(devices)
    }
}

impl<D> FromIterator<D> for DaisyChain<D> {
    fn from_iter<I: IntoIterator<Item=D>>(iter: I) -> Self {
        DaisyChain::new(iter.into_iter().collect())
    }
}

impl<D> Index<usize> for DaisyChain<D> {
    type Output = D;
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.devices[index]
    }
}

impl<D> IndexMut<usize> for DaisyChain<D> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.devices[index]
    }
}

impl<'a, D> IntoIterator for &'a DaisyChain<D> {
    type Item = &'a D;
    type IntoIter = core::slice::Iter<'a, D>;
    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_register_single_bits;

    #[derive(Default, Debug)]
    struct TestChip {
        vectors: [u8; 2],
        sources: InterruptSources<[IntState; 2]>,
        retis: u32
    }

    impl TestChip {
        fn new(vectors: [u8; 2]) -> Self {
            TestChip { vectors, ..Default::default() }
        }
    }

    impl DaisyDevice for TestChip {
        fn irq_state(&self) -> IntState {
            self.sources.state()
        }
        fn irq_ack(&mut self) -> u8 {
            let index = self.sources.acknowledge().unwrap_or(0);
            self.vectors[index]
        }
        fn irq_reti(&mut self) {
            self.retis += 1;
            self.sources.return_from_interrupt();
        }
    }

    #[test]
    fn int_state_works() {
        assert_register_single_bits!(IntState, 2);
        assert_eq!(IntState::from(0xff), IntState::INT|IntState::IEO);
        assert_eq!(u8::from(IntState::IEO), 2);
        assert!(IntState::INT.is_requested());
        assert!(!IntState::INT.is_under_service());
    }

    #[test]
    fn interrupt_sources_work() {
        let mut sources = InterruptSources::new([IntState::empty(); 3]);
        assert_eq!(sources.len(), 3);
        assert_eq!(sources.state(), IntState::empty());
        assert_eq!(sources.acknowledge(), None);
        assert_eq!(sources.return_from_interrupt(), None);
        sources.request(2);
        sources.request(1);
        assert_eq!(sources.state(), IntState::INT);
        assert_eq!(sources.acknowledge(), Some(1));
        assert_eq!(sources.get(1), IntState::IEO);
        // the lower priority request is hidden behind the source being serviced
        assert_eq!(sources.state(), IntState::IEO);
        // a higher priority source may still interrupt
        sources.request(0);
        assert_eq!(sources.state(), IntState::INT|IntState::IEO);
        assert_eq!(sources.acknowledge(), Some(0));
        assert_eq!(sources.return_from_interrupt(), Some(0));
        assert_eq!(sources.return_from_interrupt(), Some(1));
        assert_eq!(sources.state(), IntState::INT);
        sources.withdraw(2);
        assert_eq!(sources.state(), IntState::empty());
        sources.set_requested(0, true);
        sources.reset();
        assert!(sources.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn daisy_chain_works() {
        let mut chain: DaisyChain<TestChip> = vec![
            TestChip::new([0x10, 0x12]),
            TestChip::new([0x20, 0x22])].into();
        assert_eq!(chain.len(), 2);
        assert!(!chain.is_irq());
        assert_eq!(chain.acknowledge(), None);
        assert_eq!(chain.reti(), None);

        chain[1].sources.request(0);
        chain[0].sources.request(1);
        assert_eq!(chain.requesting_device(), Some(0));
        assert_eq!(chain.acknowledge(), Some(0x12));
        // the first chip being serviced blocks the second one
        assert!(!chain.is_irq());
        assert_eq!(chain[1].irq_state(), IntState::INT);
        assert_eq!(chain.reti(), Some(0));
        assert_eq!(chain[0].retis, 1);
        assert_eq!(chain[1].retis, 0);
        assert_eq!(chain.requesting_device(), Some(1));
        assert_eq!(chain.acknowledge(), Some(0x20));
        // a higher priority chip interrupts the routine of the second one
        chain[0].sources.request(0);
        assert_eq!(chain.acknowledge(), Some(0x10));
        assert_eq!(chain.reti(), Some(0));
        assert_eq!(chain.reti(), Some(1));
        assert!(!chain.is_irq());
        let chips = chain.into_inner();
        assert_eq!(chips[0].retis, 2);
        assert_eq!(chips[1].retis, 1);
    }

    #[test]
    fn daisy_chain_of_boxed_devices_works() {
        let mut chain: DaisyChain<Box<dyn DaisyDevice>> = (0..3u8)
            .map(|n| Box::new(TestChip::new([n, n + 1])) as Box<dyn DaisyDevice>)
            .collect();
        assert_eq!(chain.iter().count(), 3);
        assert!(!chain.is_irq());
        assert!(chain.get(3).is_none());
        assert_eq!(chain.get_mut(2).map(|d| d.irq_state()), Some(IntState::empty()));
    }
}
