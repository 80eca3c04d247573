/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
use core::mem;

use arrayvec::ArrayVec;
use bitflags::bitflags;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use z80chips_core::ChannelId;
use z80chips_core::clock::{ClockDivider, ClockMode};
use z80chips_core::lines::{ControlState, DataState};
use super::DartDevice;
use super::flags::*;

/// The depth of the receive FIFO.
pub const RX_FIFO_DEPTH: usize = 3;

/// A state of the bit-level receiver or transmitter.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitState {
    /// Waiting for a start bit, or a byte to send.
    Start,
    /// A start bit edge was seen, to be confirmed in the middle of the bit.
    StartCheck,
    Data,
    Parity,
    Stop,
    Stop2
}

bitflags! {
    /// Interrupt conditions raised by a channel.
    #[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
    pub(crate) struct Raised: u8 {
        const RECEIVE  = 0b001;
        const TRANSMIT = 0b010;
        const EXTERNAL = 0b100;
    }
}

/// A received character with its error flags.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct RxEntry {
    pub data: u8,
    pub errors: Rr1
}

#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Shifter {
    state: BitState,
    shift: u8,
    bits: u8,
    parity: bool,
    divider: ClockDivider
}

impl Default for Shifter {
    fn default() -> Self {
        Shifter {
            state: BitState::Start,
            shift: 0,
            bits: 0,
            parity: false,
            divider: ClockDivider::default()
        }
    }
}

impl Shifter {
    fn begin(&mut self, shift: u8) {
        self.state = BitState::Data;
        self.shift = shift;
        self.bits = 0;
        self.parity = false;
    }
    fn abort(&mut self) {
        self.state = BitState::Start;
        self.divider.reset();
    }
}

/// The state of a single DART channel.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DartChannel {
    wr: [u8; 6],
    rr0: Rr0,
    rr1: Rr1,
    fifo: ArrayVec<RxEntry, RX_FIFO_DEPTH>,
    rx_data: u8,
    tx_data: u8,
    first_char: bool,
    rx_special: bool,
    ext_latched: bool,
    break_detected: bool,
    cts: ControlState,
    dcd: ControlState,
    ri: ControlState,
    rts: ControlState,
    dtr: ControlState,
    rts_release_pending: bool,
    rx_errors: Rr1,
    rxd: DataState,
    txd: DataState,
    rx: Shifter,
    tx: Shifter
}

impl Default for DartChannel {
    fn default() -> Self {
        DartChannel {
            wr: [0; 6],
            rr0: Rr0::TX_BUFFER_EMPTY,
            rr1: Rr1::ALL_SENT,
            fifo: ArrayVec::new(),
            rx_data: 0,
            tx_data: 0,
            first_char: false,
            rx_special: false,
            ext_latched: false,
            break_detected: false,
            cts: ControlState::Inactive,
            dcd: ControlState::Inactive,
            ri: ControlState::Inactive,
            rts: ControlState::Inactive,
            dtr: ControlState::Inactive,
            rts_release_pending: false,
            rx_errors: Rr1::empty(),
            rxd: DataState::Mark,
            txd: DataState::Mark,
            rx: Shifter::default(),
            tx: Shifter::default()
        }
    }
}

impl DartChannel {
    /// Returns the last value written to the write register `reg` (0-5).
    ///
    /// # Panics
    /// Panics if `reg` is larger than 5.
    #[inline]
    pub fn wr(&self, reg: usize) -> u8 {
        self.wr[reg]
    }
    #[inline]
    pub fn wr1(&self) -> Wr1 {
        Wr1::from_data(self.wr[1])
    }
    #[inline]
    pub fn wr3(&self) -> Wr3 {
        Wr3::from_data(self.wr[3])
    }
    #[inline]
    pub fn wr4(&self) -> Wr4 {
        Wr4::from_data(self.wr[4])
    }
    #[inline]
    pub fn wr5(&self) -> Wr5 {
        Wr5::from_data(self.wr[5])
    }
    /// Returns read register 0 without the interrupt pending bit.
    #[inline]
    pub fn rr0(&self) -> Rr0 {
        self.rr0
    }
    #[inline]
    pub fn rr1(&self) -> Rr1 {
        self.rr1
    }
    /// Returns the number of characters waiting in the receive FIFO.
    #[inline]
    pub fn rx_fifo_len(&self) -> usize {
        self.fifo.len()
    }
    /// Returns `true` if a special receive condition awaits the error reset command.
    #[inline]
    pub fn is_special_condition(&self) -> bool {
        self.rx_special
    }
    /// Returns `true` if RR0 external status bits are latched.
    #[inline]
    pub fn is_ext_status_latched(&self) -> bool {
        self.ext_latched
    }
    #[inline]
    pub fn rts(&self) -> ControlState {
        self.rts
    }
    #[inline]
    pub fn dtr(&self) -> ControlState {
        self.dtr
    }
    #[inline]
    pub fn txd(&self) -> DataState {
        self.txd
    }
    #[inline]
    pub fn cts(&self) -> ControlState {
        self.cts
    }
    #[inline]
    pub fn dcd(&self) -> ControlState {
        self.dcd
    }
    #[inline]
    pub fn ri(&self) -> ControlState {
        self.ri
    }
    #[inline]
    pub fn rx_state(&self) -> BitState {
        self.rx.state
    }
    #[inline]
    pub fn tx_state(&self) -> BitState {
        self.tx.state
    }
    /// Returns `true` if the receiver is enabled, taking auto-enables into account.
    pub fn is_rx_enabled(&self) -> bool {
        let wr3 = self.wr3();
        wr3.contains(Wr3::RX_ENABLE) && (!wr3.contains(Wr3::AUTO_ENABLES) || self.dcd.is_active())
    }
    /// Returns `true` if the transmitter is enabled, taking auto-enables into account.
    pub fn is_tx_enabled(&self) -> bool {
        self.wr5().contains(Wr5::TX_ENABLE) &&
            (!self.wr3().contains(Wr3::AUTO_ENABLES) || self.cts.is_active())
    }
    /// Returns `true` when the transmit buffer and the shift register are both empty.
    #[inline]
    pub fn is_all_sent(&self) -> bool {
        self.rr1.contains(Rr1::ALL_SENT)
    }

    pub(super) fn pointer(&self) -> usize {
        Wr0::from_data(self.wr[0]).pointer().into()
    }

    pub(super) fn set_register(&mut self, reg: usize, data: u8) {
        self.wr[reg] = data;
    }

    pub(super) fn reset_pointer(&mut self) {
        self.wr[0] = 0;
    }

    pub(super) fn reset<D: DartDevice>(&mut self, id: ChannelId, device: &mut D) {
        self.wr[0] = 0;
        self.wr[1] = 0;
        self.wr[3] = 0;
        self.wr[5] = 0;
        self.fifo.clear();
        self.first_char = false;
        self.rx_special = false;
        self.ext_latched = false;
        self.break_detected = false;
        self.rts_release_pending = false;
        self.rx_errors = Rr1::empty();
        self.rx.abort();
        self.tx.abort();
        self.rr0 = Rr0::TX_BUFFER_EMPTY | self.ext_status();
        self.rr1 = Rr1::ALL_SENT;
        self.set_rts(id, device, ControlState::Inactive);
        self.set_dtr(id, device, ControlState::Inactive);
        self.set_txd(id, device, DataState::Mark);
    }

    pub(super) fn enable_interrupt_on_next_rx(&mut self) {
        self.first_char = true;
    }

    pub(super) fn reset_ext_status(&mut self) {
        self.ext_latched = false;
        self.rr0 = (self.rr0 & !Rr0::EXT_STATUS_MASK) | self.ext_status();
    }

    pub(super) fn error_reset(&mut self) {
        self.rr1 &= !Rr1::ERROR_MASK;
        self.rx_special = false;
    }

    /// Applies a write to WR3.
    pub(super) fn write_wr3(&mut self, data: u8) {
        self.wr[3] = data;
        if !self.is_rx_enabled() {
            self.rx.abort();
        }
    }

    /// Applies a write to WR5, updating the modem control outputs.
    pub(super) fn write_wr5<D: DartDevice>(&mut self, id: ChannelId, device: &mut D, data: u8) {
        let old = self.wr5();
        self.wr[5] = data;
        let wr5 = self.wr5();
        if wr5.contains(Wr5::RTS) {
            self.rts_release_pending = false;
            self.set_rts(id, device, ControlState::Active);
        }
        else if self.rts.is_active() {
            if self.is_all_sent() {
                self.set_rts(id, device, ControlState::Inactive);
            }
            else {
                self.rts_release_pending = true;
            }
        }
        self.set_dtr(id, device, ControlState::active_if(wr5.contains(Wr5::DTR)));
        if (old ^ wr5).contains(Wr5::SEND_BREAK) && self.tx.state == BitState::Start {
            let txd = if wr5.contains(Wr5::SEND_BREAK) { DataState::Space } else { DataState::Mark };
            self.set_txd(id, device, txd);
        }
    }

    /// Latches a byte for transmission.
    pub(super) fn write_data(&mut self, data: u8) {
        self.tx_data = data;
        self.rr0.remove(Rr0::TX_BUFFER_EMPTY);
        self.rr1.remove(Rr1::ALL_SENT);
    }

    /// Pops the oldest character from the receive FIFO.
    ///
    /// Returns the last character read if the FIFO is empty.
    pub(super) fn read_data(&mut self) -> u8 {
        if self.fifo.is_empty() {
            return self.rx_data;
        }
        let entry = self.fifo.remove(0);
        self.rx_data = entry.data;
        self.rr1 = (self.rr1 & (Rr1::STICKY_MASK|Rr1::ALL_SENT)) | entry.errors;
        if self.fifo.is_empty() {
            self.rr0.remove(Rr0::RX_CHAR_AVAILABLE);
        }
        entry.data
    }

    /// Returns `true` while a receive interrupt has a reason to stay requested.
    pub(super) fn rx_needs_service(&self) -> bool {
        !self.fifo.is_empty() || self.rx_special
    }

    /// Stores a received character in the FIFO.
    pub(super) fn receive(&mut self, id: ChannelId, data: u8, mut errors: Rr1) -> Raised {
        if self.fifo.is_full() {
            debug!("channel {}: receive overrun", id);
            errors |= Rr1::RX_OVERRUN;
            self.fifo.pop();
        }
        if errors.intersects(Rr1::FRAMING_ERROR|Rr1::PARITY_ERROR) {
            debug!("channel {}: received {:02x} with errors: {:?}", id, data, errors);
        }
        self.fifo.push(RxEntry { data, errors });
        self.rr0.insert(Rr0::RX_CHAR_AVAILABLE);
        self.rr1 |= errors;

        let mode = self.wr1().rx_interrupt_mode();
        let special = errors.intersects(Rr1::FRAMING_ERROR|Rr1::RX_OVERRUN) ||
                      (errors.contains(Rr1::PARITY_ERROR) && mode != RxInterruptMode::AllParityIgnored);
        let raise = match mode {
            RxInterruptMode::Disabled => false,
            RxInterruptMode::FirstCharacter => mem::replace(&mut self.first_char, false) || special,
            RxInterruptMode::AllParityAffectsVector|
            RxInterruptMode::AllParityIgnored => true
        };
        if special && mode != RxInterruptMode::Disabled {
            self.rx_special = true;
        }
        if raise { Raised::RECEIVE } else { Raised::empty() }
    }

    /// Updates one of the modem control inputs.
    pub(super) fn set_input(&mut self, line: Rr0, level: ControlState) -> Raised {
        let slot = if line == Rr0::CTS {
            &mut self.cts
        }
        else if line == Rr0::DCD {
            &mut self.dcd
        }
        else {
            &mut self.ri
        };
        if mem::replace(slot, level) == level {
            return Raised::empty();
        }
        if !self.is_rx_enabled() {
            self.rx.abort();
        }
        self.ext_status_changed()
    }

    /// Runs a receiver clock pulse.
    ///
    /// The line is sampled on every pulse while hunting for the start bit. Once found,
    /// the following bits are sampled in the middle of their bit-times.
    pub(super) fn rx_clock<D: DartDevice>(&mut self, id: ChannelId, device: &mut D) -> Raised {
        let mode = self.wr4().clock_mode();
        if self.rx.state == BitState::Start {
            let raised = self.rx_bit(id, device);
            if self.rx.state == BitState::StartCheck {
                let multiplier = mode.multiplier();
                self.rx.divider.preset(multiplier - multiplier / 2);
            }
            else {
                self.rx.divider.reset();
            }
            raised
        }
        else if self.rx.divider.pulse(mode) {
            self.rx_bit(id, device)
        }
        else {
            Raised::empty()
        }
    }

    /// Runs a transmitter clock pulse.
    pub(super) fn tx_clock<D: DartDevice>(&mut self, id: ChannelId, device: &mut D) -> Raised {
        if self.tx.divider.pulse(self.wr4().clock_mode()) {
            self.tx_bit(id, device)
        }
        else {
            Raised::empty()
        }
    }

    /// Runs one bit-time of the receiver.
    pub(super) fn rx_bit<D: DartDevice>(&mut self, id: ChannelId, device: &mut D) -> Raised {
        let level = device.rxd(id);
        let previous = mem::replace(&mut self.rxd, level);
        let mut raised = Raised::empty();
        match self.rx.state {
            BitState::Start => {
                if self.break_detected && level.is_mark() {
                    debug!("channel {}: break end", id);
                    self.break_detected = false;
                    raised |= self.ext_status_changed();
                }
                if self.is_rx_enabled() && previous.is_mark() && level.is_space() {
                    trace!("channel {}: start bit", id);
                    if self.wr4().clock_mode() == ClockMode::X1 {
                        self.rx.begin(0);
                        self.rx_errors = Rr1::empty();
                    }
                    else {
                        self.rx.state = BitState::StartCheck;
                    }
                }
            }
            BitState::StartCheck => {
                if level.is_space() {
                    self.rx.begin(0);
                    self.rx_errors = Rr1::empty();
                }
                else {
                    trace!("channel {}: false start bit", id);
                    self.rx.state = BitState::Start;
                }
            }
            BitState::Data => {
                let bit = level.is_mark();
                self.rx.shift = (self.rx.shift >> 1) | (u8::from(bit) << 7);
                self.rx.parity ^= bit;
                self.rx.bits += 1;
                let word_length = self.wr3().word_length();
                if self.rx.bits >= word_length {
                    self.rx.shift >>= 8 - word_length;
                    self.rx.state = if self.wr4().parity().is_some() {
                        BitState::Parity
                    }
                    else {
                        BitState::Stop
                    };
                }
            }
            BitState::Parity => {
                let even = self.wr4().contains(Wr4::PARITY_EVEN);
                let expected = self.rx.parity ^ !even;
                if level.is_mark() != expected {
                    self.rx_errors.insert(Rr1::PARITY_ERROR);
                }
                self.rx.state = BitState::Stop;
            }
            BitState::Stop => {
                if level.is_space() {
                    self.rx_errors.insert(Rr1::FRAMING_ERROR);
                }
                if self.wr4().stop_bits() == StopBits::One {
                    raised |= self.rx_complete(id);
                }
                else {
                    self.rx.state = BitState::Stop2;
                }
            }
            BitState::Stop2 => {
                if level.is_space() {
                    self.rx_errors.insert(Rr1::FRAMING_ERROR);
                }
                raised |= self.rx_complete(id);
            }
        }
        raised
    }

    /// Runs one bit-time of the transmitter.
    pub(super) fn tx_bit<D: DartDevice>(&mut self, id: ChannelId, device: &mut D) -> Raised {
        let mut raised = Raised::empty();
        match self.tx.state {
            BitState::Start|BitState::StartCheck => {
                if self.is_tx_enabled() && !self.rr0.contains(Rr0::TX_BUFFER_EMPTY) {
                    trace!("channel {}: transmit {:02x}", id, self.tx_data);
                    self.set_txd(id, device, DataState::Space);
                    self.tx.begin(self.tx_data);
                    self.rr0.insert(Rr0::TX_BUFFER_EMPTY);
                    if self.wr1().contains(Wr1::TX_INT_ENABLE) {
                        raised |= Raised::TRANSMIT;
                    }
                }
                else if self.wr5().contains(Wr5::SEND_BREAK) {
                    self.set_txd(id, device, DataState::Space);
                }
                else {
                    self.set_txd(id, device, DataState::Mark);
                }
            }
            BitState::Data => {
                let bit = self.tx.shift & 1 != 0;
                self.tx.shift >>= 1;
                self.tx.parity ^= bit;
                self.tx.bits += 1;
                self.set_txd(id, device, bit.into());
                if self.tx.bits >= self.wr5().word_length() {
                    self.tx.state = if self.wr4().parity().is_some() {
                        BitState::Parity
                    }
                    else {
                        BitState::Stop
                    };
                }
            }
            BitState::Parity => {
                let even = self.wr4().contains(Wr4::PARITY_EVEN);
                let bit = self.tx.parity ^ !even;
                self.set_txd(id, device, bit.into());
                self.tx.state = BitState::Stop;
            }
            BitState::Stop => {
                self.set_txd(id, device, DataState::Mark);
                if self.wr4().stop_bits() == StopBits::One {
                    self.tx_complete(id, device);
                }
                else {
                    self.tx.state = BitState::Stop2;
                }
            }
            BitState::Stop2 => {
                self.set_txd(id, device, DataState::Mark);
                self.tx_complete(id, device);
            }
        }
        raised
    }

    fn rx_complete(&mut self, id: ChannelId) -> Raised {
        self.rx.state = BitState::Start;
        let data = self.rx.shift;
        let errors = self.rx_errors;
        let mut raised = Raised::empty();
        if data == 0 && errors.contains(Rr1::FRAMING_ERROR) && !self.break_detected {
            debug!("channel {}: break detected", id);
            self.break_detected = true;
            raised |= self.ext_status_changed();
        }
        raised | self.receive(id, data, errors)
    }

    fn tx_complete<D: DartDevice>(&mut self, id: ChannelId, device: &mut D) {
        self.tx.state = BitState::Start;
        if self.rr0.contains(Rr0::TX_BUFFER_EMPTY) {
            self.rr1.insert(Rr1::ALL_SENT);
            if mem::replace(&mut self.rts_release_pending, false) {
                self.set_rts(id, device, ControlState::Inactive);
            }
        }
    }

    fn ext_status(&self) -> Rr0 {
        let mut status = Rr0::empty();
        status.set(Rr0::DCD, self.dcd.is_active());
        status.set(Rr0::CTS, self.cts.is_active());
        status.set(Rr0::RI, self.ri.is_active());
        status.set(Rr0::BREAK, self.break_detected);
        status
    }

    fn ext_status_changed(&mut self) -> Raised {
        if self.ext_latched {
            return Raised::empty();
        }
        self.rr0 = (self.rr0 & !Rr0::EXT_STATUS_MASK) | self.ext_status();
        if self.wr1().contains(Wr1::EXT_INT_ENABLE) {
            self.ext_latched = true;
            Raised::EXTERNAL
        }
        else {
            Raised::empty()
        }
    }

    fn set_rts<D: DartDevice>(&mut self, id: ChannelId, device: &mut D, rts: ControlState) {
        if self.rts != rts {
            trace!("channel {}: RTS {:?}", id, rts);
            self.rts = rts;
            device.rts_changed(id, rts);
        }
    }

    fn set_dtr<D: DartDevice>(&mut self, id: ChannelId, device: &mut D, dtr: ControlState) {
        if self.dtr != dtr {
            trace!("channel {}: DTR {:?}", id, dtr);
            self.dtr = dtr;
            device.dtr_changed(id, dtr);
        }
    }

    fn set_txd<D: DartDevice>(&mut self, id: ChannelId, device: &mut D, txd: DataState) {
        if self.txd != txd {
            self.txd = txd;
            device.txd_changed(id, txd);
        }
    }
}
