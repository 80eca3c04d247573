/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! An emulator of the Z80-DART dual asynchronous receiver/transmitter.
//!
//! Each of the two channels has indirectly addressed write registers `WR0`-`WR5` and read
//! registers `RR0`-`RR1`, plus `RR2` in channel B. Writing a register other than `WR0` requires
//! writing its number to the pointer bits of `WR0` first. The pointer returns to 0 after
//! the selected register has been accessed.
//!
//! | Register | Contents                                                          |
//! |----------|-------------------------------------------------------------------|
//! | WR0      | register pointer, commands, see [Command]                         |
//! | WR1      | interrupt enables, see [Wr1]                                      |
//! | WR2      | interrupt vector, channel B only                                  |
//! | WR3      | receiver word length and enable, auto-enables, see [Wr3]          |
//! | WR4      | parity, stop bits and the clock multiplier, see [Wr4]             |
//! | WR5      | transmitter word length and enable, break, `RTS`, `DTR`, see [Wr5] |
//! | RR0      | buffer and external status, see [Rr0]                             |
//! | RR1      | special receive conditions, see [Rr1]                             |
//! | RR2      | interrupt vector, modified if status affects vector, channel B only |
//!
//! Characters are framed and unframed bit by bit. Each bit-time runs after the number of
//! serial clock pulses selected by the clock multiplier. A received character may also be
//! injected directly with [Z80Dart::receive_data].
//!
//! Interrupt sources in priority order: channel A receive, transmit, external/status,
//! then the same for channel B.
mod channel;
mod config;
mod flags;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use z80chips_core::ChannelId;
use z80chips_core::clock::RateGenerator;
use z80chips_core::daisy::{DaisyDevice, IntState, InterruptSources};
use z80chips_core::error::ConfigError;
use z80chips_core::lines::{ControlState, DataState};
use crate::register::{AddressLayout, ChipRegisters, RegisterSelect};

use channel::Raised;
pub use channel::{BitState, DartChannel, RxEntry, RX_FIFO_DEPTH};
pub use config::*;
pub use flags::*;

/// The number of interrupt sources per channel.
const CHANNEL_SOURCES: usize = 3;
/// Mask of the vector bits replaced when status affects vector.
const VECTOR_STATUS_MASK: u8 = 0b0000_1110;

/// A kind of the DART interrupt source within a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterruptKind {
    /// A received character or a special receive condition.
    Receive = 0,
    /// The transmit buffer became empty.
    Transmit = 1,
    /// A change of `DCD`, `CTS`, `RI` or break.
    ExternalStatus = 2
}

/// An interface between the DART and the hardware connected to its serial pins.
///
/// All methods have default implementations of a channel with nothing connected.
pub trait DartDevice {
    /// Returns the level of the `RxD` input of a channel, sampled once per bit-time.
    fn rxd(&mut self, _channel: ChannelId) -> DataState {
        DataState::Mark
    }
    /// Called when the `TxD` output of a channel changes its level.
    fn txd_changed(&mut self, _channel: ChannelId, _txd: DataState) {}
    /// Called when the `RTS` output of a channel changes its state.
    fn rts_changed(&mut self, _channel: ChannelId, _rts: ControlState) {}
    /// Called when the `DTR` output of a channel changes its state.
    fn dtr_changed(&mut self, _channel: ChannelId, _dtr: ControlState) {}
    /// Called when the `INT` output of the chip changes its state.
    fn int_changed(&mut self, _asserted: bool) {}
}

impl DartDevice for () {}

impl<D: DartDevice + ?Sized> DartDevice for Box<D> {
    fn rxd(&mut self, channel: ChannelId) -> DataState {
        (**self).rxd(channel)
    }
    fn txd_changed(&mut self, channel: ChannelId, txd: DataState) {
        (**self).txd_changed(channel, txd)
    }
    fn rts_changed(&mut self, channel: ChannelId, rts: ControlState) {
        (**self).rts_changed(channel, rts)
    }
    fn dtr_changed(&mut self, channel: ChannelId, dtr: ControlState) {
        (**self).dtr_changed(channel, dtr)
    }
    fn int_changed(&mut self, asserted: bool) {
        (**self).int_changed(asserted)
    }
}

/// The Z80-DART.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct Z80Dart<D> {
    /// The hardware connected to the serial pins.
    #[cfg_attr(feature = "snapshot", serde(skip))]
    pub device: D,
    config: DartConfig,
    channels: [DartChannel; 2],
    sources: InterruptSources<[IntState; 6]>,
    int_line: bool,
    rx_clocks: [Option<RateGenerator>; 2],
    tx_clocks: [Option<RateGenerator>; 2]
}

impl<D: Default> Default for Z80Dart<D> {
    fn default() -> Self {
        Z80Dart::new(D::default())
    }
}

#[inline(always)]
fn source_index(channel: ChannelId, kind: InterruptKind) -> usize {
    channel.index() * CHANNEL_SOURCES + kind as usize
}

impl<D> Z80Dart<D> {
    /// Creates a DART with the default configuration in the reset state.
    ///
    /// Both channels are clocked by the host only.
    pub fn new(device: D) -> Self {
        Z80Dart {
            device,
            config: DartConfig::default(),
            channels: Default::default(),
            sources: Default::default(),
            int_line: false,
            rx_clocks: [None; 2],
            tx_clocks: [None; 2]
        }
    }
    /// Creates a DART with the given configuration in the reset state.
    pub fn with_config(device: D, config: DartConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rx_clocks = DartConfig::generators(&config.rx_rates, config.clock_hz)?;
        let tx_clocks = DartConfig::generators(&config.tx_rates, config.clock_hz)?;
        Ok(Z80Dart { config, rx_clocks, tx_clocks, ..Z80Dart::new(device) })
    }
    #[inline]
    pub fn config(&self) -> &DartConfig {
        &self.config
    }
    #[inline]
    pub fn tag(&self) -> &str {
        &self.config.tag
    }
    /// Returns a reference to the state of the given channel.
    #[inline]
    pub fn channel(&self, channel: ChannelId) -> &DartChannel {
        &self.channels[channel.index()]
    }
    /// Returns the state of the `RTS` output of the given channel.
    #[inline]
    pub fn rts(&self, channel: ChannelId) -> ControlState {
        self.channels[channel.index()].rts()
    }
    /// Returns the state of the `DTR` output of the given channel.
    #[inline]
    pub fn dtr(&self, channel: ChannelId) -> ControlState {
        self.channels[channel.index()].dtr()
    }
    /// Returns the level of the `TxD` output of the given channel.
    #[inline]
    pub fn txd(&self, channel: ChannelId) -> DataState {
        self.channels[channel.index()].txd()
    }
    /// Returns the state of the `INT` output.
    #[inline]
    pub fn int_line(&self) -> bool {
        self.int_line
    }
    /// Returns the state of the given interrupt source.
    #[inline]
    pub fn source_state(&self, channel: ChannelId, kind: InterruptKind) -> IntState {
        self.sources.get(source_index(channel, kind))
    }
    /// Returns the interrupt vector as presented in `RR2` of channel B.
    ///
    /// With status affects vector set in `WR1` of channel B, bits 1-3 of `WR2` are replaced
    /// with the code of the highest priority source requesting an interrupt:
    ///
    /// | Source                  | Ch. B | Ch. A |
    /// |-------------------------|-------|-------|
    /// | transmit buffer empty   | `000` | `100` |
    /// | external/status change  | `001` | `101` |
    /// | receive character       | `010` | `110` |
    /// | special receive         | `011` | `111` |
    ///
    /// Code `011` is also presented when no interrupt is requested.
    pub fn interrupt_vector(&self) -> u8 {
        let index = self.sources.iter().position(|state| state.is_requested());
        self.vector_for(index)
    }

    fn vector_for(&self, index: Option<usize>) -> u8 {
        let chan_b = &self.channels[ChannelId::B.index()];
        let vector = chan_b.wr(2);
        if !chan_b.wr1().contains(Wr1::STATUS_AFFECTS_VECTOR) {
            return vector
        }
        let code = match index {
            Some(index) => {
                let channel = &self.channels[index / CHANNEL_SOURCES];
                let code = match index % CHANNEL_SOURCES {
                    0 if channel.is_special_condition() => 0b011,
                    0 => 0b010,
                    1 => 0b000,
                    _ => 0b001
                };
                if index < CHANNEL_SOURCES { code | 0b100 } else { code }
            }
            None => 0b011
        };
        (vector & !VECTOR_STATUS_MASK) | (code << 1)
    }
}

impl<D: DartDevice> Z80Dart<D> {
    /// Resets the chip: both channels are reset and all interrupts are cleared.
    pub fn reset(&mut self) {
        debug!("{}: reset", self.config.tag);
        for channel in ChannelId::ALL.iter().copied() {
            self.channels[channel.index()].reset(channel, &mut self.device);
        }
        self.sources.reset();
        self.check_interrupt();
    }
    /// Writes `data` to the write register of the given channel selected by the `WR0` pointer.
    pub fn control_write(&mut self, channel: ChannelId, data: u8) {
        let index = channel.index();
        let reg = self.channels[index].pointer();
        trace!("{}: channel {} WR{} <- {:02x}", self.config.tag, channel, reg, data);
        match reg {
            0 => {
                self.channels[index].set_register(0, data & Wr0::POINTER_MASK.bits());
                self.command(channel, Wr0::from_data(data).command());
                return
            }
            1 => {
                self.channels[index].set_register(1, data);
                self.check_interrupt();
            }
            2|4 => self.channels[index].set_register(reg, data),
            3 => self.channels[index].write_wr3(data),
            5 => self.channels[index].write_wr5(channel, &mut self.device, data),
            _ => warn!("{}: channel {} WR{} does not exist", self.config.tag, channel, reg)
        }
        self.channels[index].reset_pointer();
    }
    /// Reads the read register of the given channel selected by the `WR0` pointer.
    ///
    /// `RR2` is available in channel B only. Channel A and registers that do not exist
    /// present `RR0`.
    pub fn control_read(&mut self, channel: ChannelId) -> u8 {
        let index = channel.index();
        let reg = self.channels[index].pointer();
        self.channels[index].reset_pointer();
        let data = match (reg, channel) {
            (1, _) => self.channels[index].rr1().bits(),
            (2, ChannelId::B) => self.interrupt_vector(),
            (0, _) => self.rr0(channel),
            _ => {
                debug!("{}: channel {} RR{} does not exist", self.config.tag, channel, reg);
                self.rr0(channel)
            }
        };
        trace!("{}: channel {} RR{} -> {:02x}", self.config.tag, channel, reg, data);
        data
    }
    /// Writes a byte to the transmit buffer of the given channel.
    pub fn data_write(&mut self, channel: ChannelId, data: u8) {
        trace!("{}: channel {} data <- {:02x}", self.config.tag, channel, data);
        self.channels[channel.index()].write_data(data);
        self.sources.withdraw(source_index(channel, InterruptKind::Transmit));
        self.check_interrupt();
    }
    /// Reads the oldest received character of the given channel.
    pub fn data_read(&mut self, channel: ChannelId) -> u8 {
        let chan = &mut self.channels[channel.index()];
        let data = chan.read_data();
        if !chan.rx_needs_service() {
            self.sources.withdraw(source_index(channel, InterruptKind::Receive));
            self.check_interrupt();
        }
        trace!("{}: channel {} data -> {:02x}", self.config.tag, channel, data);
        data
    }
    /// Stores a received character in the receive FIFO of the given channel, as if it was
    /// received from the `RxD` line.
    ///
    /// When the FIFO is full the newest character is overwritten and an overrun is reported.
    pub fn receive_data(&mut self, channel: ChannelId, data: u8) {
        let raised = self.channels[channel.index()].receive(channel, data, Rr1::empty());
        self.raise(channel, raised);
    }
    /// Sets the state of the `CTS` input of the given channel.
    pub fn cts_w(&mut self, channel: ChannelId, level: ControlState) {
        self.modem_input(channel, Rr0::CTS, level)
    }
    /// Sets the state of the `DCD` input of the given channel.
    pub fn dcd_w(&mut self, channel: ChannelId, level: ControlState) {
        self.modem_input(channel, Rr0::DCD, level)
    }
    /// Sets the state of the `RI` input of the given channel.
    pub fn ri_w(&mut self, channel: ChannelId, level: ControlState) {
        self.modem_input(channel, Rr0::RI, level)
    }
    /// Registers a pulse of the `RxCA` clock input.
    pub fn rxca_w(&mut self) {
        self.rx_clock(ChannelId::A)
    }
    /// Registers a pulse of the `TxCA` clock input.
    pub fn txca_w(&mut self) {
        self.tx_clock(ChannelId::A)
    }
    /// Registers a pulse of the `RxTxCB` clock input, shared by both directions of channel B.
    pub fn rxtxcb_w(&mut self) {
        self.rx_clock(ChannelId::B);
        self.tx_clock(ChannelId::B);
    }
    /// Registers a pulse of the receiver clock of the given channel.
    pub fn rx_clock(&mut self, channel: ChannelId) {
        let raised = self.channels[channel.index()].rx_clock(channel, &mut self.device);
        self.raise(channel, raised);
    }
    /// Registers a pulse of the transmitter clock of the given channel.
    pub fn tx_clock(&mut self, channel: ChannelId) {
        let raised = self.channels[channel.index()].tx_clock(channel, &mut self.device);
        self.raise(channel, raised);
    }
    /// Advances the internally generated serial clocks by `cycles` chip clock cycles.
    pub fn advance(&mut self, cycles: u32) {
        for channel in ChannelId::ALL.iter().copied() {
            let index = channel.index();
            let rx_pulses = self.rx_clocks[index].as_mut().map_or(0, |gen| gen.advance(cycles));
            let tx_pulses = self.tx_clocks[index].as_mut().map_or(0, |gen| gen.advance(cycles));
            for _ in 0..rx_pulses {
                self.rx_clock(channel);
            }
            for _ in 0..tx_pulses {
                self.tx_clock(channel);
            }
        }
    }
    /// Withdraws requests of the sources with interrupts disabled and updates the `INT` output.
    pub fn check_interrupt(&mut self) {
        for channel in ChannelId::ALL.iter().copied() {
            let wr1 = self.channels[channel.index()].wr1();
            if wr1.rx_interrupt_mode() == RxInterruptMode::Disabled {
                self.sources.withdraw(source_index(channel, InterruptKind::Receive));
            }
            if !wr1.contains(Wr1::TX_INT_ENABLE) {
                self.sources.withdraw(source_index(channel, InterruptKind::Transmit));
            }
            if !wr1.contains(Wr1::EXT_INT_ENABLE) {
                self.sources.withdraw(source_index(channel, InterruptKind::ExternalStatus));
            }
        }
        let asserted = self.sources.state().is_requested();
        if asserted != self.int_line {
            trace!("{}: INT: {}", self.config.tag, asserted);
            self.int_line = asserted;
            self.device.int_changed(asserted);
        }
    }

    fn rr0(&self, channel: ChannelId) -> u8 {
        let mut rr0 = self.channels[channel.index()].rr0();
        if channel == ChannelId::A && self.sources.iter().any(|state| state.is_requested()) {
            rr0.insert(Rr0::INT_PENDING);
        }
        rr0.bits()
    }

    fn command(&mut self, channel: ChannelId, command: Command) {
        let index = channel.index();
        match command {
            Command::Null => {}
            Command::SendAbort => {
                debug!("{}: channel {} send abort is not supported", self.config.tag, channel);
            }
            Command::ResetExtStatusInterrupts => {
                self.channels[index].reset_ext_status();
                self.sources.withdraw(source_index(channel, InterruptKind::ExternalStatus));
                self.check_interrupt();
            }
            Command::ChannelReset => {
                debug!("{}: channel {} reset", self.config.tag, channel);
                self.channels[index].reset(channel, &mut self.device);
                if channel == ChannelId::A {
                    self.sources.reset();
                }
                else {
                    for kind in [InterruptKind::Receive, InterruptKind::Transmit, InterruptKind::ExternalStatus].iter() {
                        self.sources.withdraw(source_index(channel, *kind));
                    }
                }
                self.check_interrupt();
            }
            Command::EnableInterruptOnNextRx => self.channels[index].enable_interrupt_on_next_rx(),
            Command::ResetTxInterruptPending => {
                self.sources.withdraw(source_index(channel, InterruptKind::Transmit));
                self.check_interrupt();
            }
            Command::ErrorReset => {
                let chan = &mut self.channels[index];
                chan.error_reset();
                if !chan.rx_needs_service() {
                    self.sources.withdraw(source_index(channel, InterruptKind::Receive));
                    self.check_interrupt();
                }
            }
            Command::ReturnFromInterrupt => {
                if channel == ChannelId::B {
                    debug!("{}: return from interrupt command in channel B", self.config.tag);
                }
                self.irq_reti();
            }
        }
    }

    fn modem_input(&mut self, channel: ChannelId, line: Rr0, level: ControlState) {
        trace!("{}: channel {} {:?}: {:?}", self.config.tag, channel, line, level);
        let raised = self.channels[channel.index()].set_input(line, level);
        self.raise(channel, raised);
    }

    fn raise(&mut self, channel: ChannelId, raised: Raised) {
        if raised.is_empty() {
            return
        }
        if raised.contains(Raised::RECEIVE) {
            self.sources.request(source_index(channel, InterruptKind::Receive));
        }
        if raised.contains(Raised::TRANSMIT) {
            self.sources.request(source_index(channel, InterruptKind::Transmit));
        }
        if raised.contains(Raised::EXTERNAL) {
            self.sources.request(source_index(channel, InterruptKind::ExternalStatus));
        }
        self.check_interrupt();
    }
}

impl<D: DartDevice> DaisyDevice for Z80Dart<D> {
    #[inline]
    fn irq_state(&self) -> IntState {
        self.sources.state()
    }

    fn irq_ack(&mut self) -> u8 {
        let index = self.sources.acknowledge();
        if index.is_none() {
            error!("{}: interrupt acknowledged with no interrupt requested", self.config.tag);
        }
        let vector = self.vector_for(index);
        self.check_interrupt();
        vector
    }

    fn irq_reti(&mut self) {
        if self.sources.return_from_interrupt().is_none() {
            error!("{}: RETI with no interrupt being serviced", self.config.tag);
        }
        self.check_interrupt();
    }
}

impl<D: DartDevice> ChipRegisters for Z80Dart<D> {
    #[inline]
    fn address_layout(&self) -> AddressLayout {
        self.config.layout
    }

    fn read_register(&mut self, channel: ChannelId, select: RegisterSelect) -> u8 {
        match select {
            RegisterSelect::Data => self.data_read(channel),
            RegisterSelect::Control => self.control_read(channel)
        }
    }

    fn write_register(&mut self, channel: ChannelId, select: RegisterSelect, data: u8) {
        match select {
            RegisterSelect::Data => self.data_write(channel, data),
            RegisterSelect::Control => self.control_write(channel, data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z80chips_core::ChannelId::{A, B};

    #[derive(Default, Debug)]
    struct TestLines {
        rts: Vec<(ChannelId, ControlState)>,
        dtr: Vec<(ChannelId, ControlState)>,
        int: Vec<bool>
    }

    impl DartDevice for TestLines {
        fn rts_changed(&mut self, channel: ChannelId, rts: ControlState) {
            self.rts.push((channel, rts));
        }
        fn dtr_changed(&mut self, channel: ChannelId, dtr: ControlState) {
            self.dtr.push((channel, dtr));
        }
        fn int_changed(&mut self, asserted: bool) {
            self.int.push(asserted);
        }
    }

    fn dart() -> Z80Dart<TestLines> {
        Z80Dart::new(TestLines::default())
    }

    fn write_reg(dart: &mut Z80Dart<TestLines>, channel: ChannelId, reg: u8, data: u8) {
        dart.control_write(channel, reg);
        dart.control_write(channel, data);
    }

    fn read_reg(dart: &mut Z80Dart<TestLines>, channel: ChannelId, reg: u8) -> u8 {
        dart.control_write(channel, reg);
        dart.control_read(channel)
    }

    #[test]
    fn dart_register_pointer_works() {
        let mut dart = dart();
        write_reg(&mut dart, B, 2, 0x40);
        write_reg(&mut dart, A, 4, 0x44);
        assert_eq!(dart.channel(B).wr(2), 0x40);
        assert_eq!(dart.channel(A).wr(4), 0x44);
        assert_eq!(dart.channel(A).wr(0), 0);
        assert_eq!(read_reg(&mut dart, B, 2), 0x40);
        // RR2 does not exist in channel A
        assert_eq!(read_reg(&mut dart, A, 2), Rr0::TX_BUFFER_EMPTY.bits());
        assert_eq!(read_reg(&mut dart, A, 1), Rr1::ALL_SENT.bits());
        assert_eq!(dart.control_read(A), Rr0::TX_BUFFER_EMPTY.bits());
        // WR6 and WR7 are absent
        dart.control_write(A, 0x0f);
        assert_eq!(dart.control_read(A), Rr0::TX_BUFFER_EMPTY.bits());
        write_reg(&mut dart, A, 7, 0x7e);
        assert_eq!(dart.channel(A).wr(0), 0);
    }

    #[test]
    fn dart_channel_reset_works() {
        let mut dart = dart();
        write_reg(&mut dart, A, 5, 0xea);
        assert_eq!(dart.rts(A), ControlState::Active);
        assert_eq!(dart.dtr(A), ControlState::Active);
        write_reg(&mut dart, A, 3, 0xc1);
        write_reg(&mut dart, A, 1, 0x18);
        dart.receive_data(A, 0x11);
        assert!(dart.int_line());
        dart.control_write(A, 0x18);
        assert_eq!(dart.rts(A), ControlState::Inactive);
        assert_eq!(dart.dtr(A), ControlState::Inactive);
        assert!(!dart.channel(A).is_rx_enabled());
        assert!(!dart.channel(A).is_tx_enabled());
        assert_eq!(dart.channel(A).rx_fifo_len(), 0);
        assert!(!dart.int_line());
        assert_eq!(dart.device.rts, [(A, ControlState::Active), (A, ControlState::Inactive)]);
        assert_eq!(dart.device.dtr, [(A, ControlState::Active), (A, ControlState::Inactive)]);
        assert_eq!(dart.device.int, [true, false]);
    }

    #[test]
    fn dart_channel_a_reset_clears_all_interrupts() {
        let mut dart = dart();
        write_reg(&mut dart, B, 1, 0x10);
        dart.receive_data(B, 0x22);
        assert_eq!(dart.source_state(B, InterruptKind::Receive), IntState::INT);
        dart.control_write(B, 0x18);
        assert_eq!(dart.source_state(B, InterruptKind::Receive), IntState::empty());
        write_reg(&mut dart, B, 1, 0x10);
        dart.receive_data(B, 0x33);
        dart.control_write(A, 0x18);
        assert_eq!(dart.irq_state(), IntState::empty());
        // channel B keeps its character
        assert_eq!(dart.data_read(B), 0x33);
    }

    #[test]
    fn dart_rts_release_is_deferred() {
        let mut dart = dart();
        write_reg(&mut dart, A, 4, 0x04);
        write_reg(&mut dart, A, 5, 0x6a);
        dart.data_write(A, 0xff);
        write_reg(&mut dart, A, 5, 0x68);
        assert_eq!(dart.rts(A), ControlState::Active);
        for _ in 0..9 {
            dart.txca_w();
            assert_eq!(dart.rts(A), ControlState::Active);
        }
        dart.txca_w();
        assert_eq!(dart.rts(A), ControlState::Inactive);
        assert!(dart.channel(A).is_all_sent());
        // released at once with nothing to send
        write_reg(&mut dart, A, 5, 0x6a);
        write_reg(&mut dart, A, 5, 0x68);
        assert_eq!(dart.device.rts.len(), 4);
        assert_eq!(dart.rts(A), ControlState::Inactive);
    }

    #[test]
    fn dart_data_read_withdraws_receive_interrupt() {
        let mut dart = dart();
        write_reg(&mut dart, A, 1, 0x18);
        dart.receive_data(A, 1);
        dart.receive_data(A, 2);
        assert!(dart.int_line());
        assert_eq!(read_reg(&mut dart, A, 0) & Rr0::INT_PENDING.bits(), Rr0::INT_PENDING.bits());
        assert_eq!(dart.data_read(A), 1);
        assert!(dart.int_line());
        assert_eq!(dart.data_read(A), 2);
        assert!(!dart.int_line());
        assert_eq!(dart.control_read(A) & Rr0::INT_PENDING.bits(), 0);
    }

    #[test]
    fn dart_transmit_interrupt_works() {
        let mut dart = dart();
        write_reg(&mut dart, B, 1, 0x02);
        write_reg(&mut dart, B, 5, 0x68);
        dart.data_write(B, 0x5a);
        dart.rxtxcb_w();
        assert_eq!(dart.source_state(B, InterruptKind::Transmit), IntState::INT);
        dart.data_write(B, 0xa5);
        assert_eq!(dart.source_state(B, InterruptKind::Transmit), IntState::empty());
        for _ in 0..10 {
            dart.rxtxcb_w();
        }
        assert!(dart.int_line());
        dart.control_write(B, 0x28);
        assert!(!dart.int_line());
    }

    #[test]
    fn dart_vectors_work() {
        let mut dart = dart();
        write_reg(&mut dart, B, 2, 0x60);
        write_reg(&mut dart, A, 1, 0x13);
        write_reg(&mut dart, B, 1, 0x17);
        assert_eq!(read_reg(&mut dart, B, 2), 0x66);
        dart.receive_data(B, 0);
        assert_eq!(dart.interrupt_vector(), 0x64);
        dart.cts_w(B, ControlState::Active);
        dart.cts_w(A, ControlState::Active);
        assert_eq!(dart.interrupt_vector(), 0x6a);
        assert_eq!(dart.irq_ack(), 0x6a);
        // channel A external/status is serviced, channel B is blocked
        assert_eq!(dart.irq_state(), IntState::IEO);
        dart.control_write(A, 0x10);
        dart.control_write(A, 0x38);
        assert_eq!(dart.irq_state(), IntState::INT);
        assert_eq!(dart.irq_ack(), 0x64);
        dart.irq_reti();
        assert_eq!(dart.irq_ack(), 0x62);
        dart.irq_reti();
        // special receive condition
        dart.receive_data(A, 1);
        dart.receive_data(A, 2);
        dart.receive_data(A, 3);
        dart.receive_data(A, 4);
        assert_eq!(dart.irq_ack(), 0x6e);
        dart.control_write(A, 0x30);
        assert!(!dart.channel(A).is_special_condition());
        dart.irq_reti();
        assert_eq!(dart.irq_state(), IntState::empty());
        assert_eq!([dart.data_read(A), dart.data_read(A), dart.data_read(A)], [1, 2, 4]);
        dart.receive_data(A, 5);
        assert_eq!(dart.interrupt_vector(), 0x6c);
        // without status affects vector
        write_reg(&mut dart, B, 1, 0x13);
        assert_eq!(dart.irq_ack(), 0x60);
    }

    #[test]
    fn dart_desync_is_harmless() {
        let mut dart = dart();
        write_reg(&mut dart, B, 2, 0x80);
        assert_eq!(dart.irq_ack(), 0x80);
        dart.irq_reti();
        assert_eq!(dart.irq_state(), IntState::empty());
    }

    #[test]
    fn dart_fixed_rate_clocks_work() {
        let config = DartConfig {
            clock_hz: 1_000_000,
            rx_rates: [Some(100_000), None],
            tx_rates: [Some(100_000), None],
            ..DartConfig::default()
        };
        let mut dart = Z80Dart::with_config(TestLines::default(), config).unwrap();
        write_reg(&mut dart, A, 4, 0x04);
        write_reg(&mut dart, A, 5, 0x68);
        dart.data_write(A, 0x00);
        dart.advance(9);
        assert_eq!(dart.txd(A), DataState::Mark);
        dart.advance(1);
        assert_eq!(dart.txd(A), DataState::Space);
        dart.advance(90);
        assert!(dart.channel(A).is_all_sent());
        let config = DartConfig { rx_rates: [None, Some(0)], ..DartConfig::default() };
        assert!(Z80Dart::with_config((), config).is_err());
    }

    #[test]
    fn dart_registers_work() {
        let mut dart = dart();
        dart.write(3, 2);
        dart.write(3, 0x90);
        // the pointer is back at 0 after each register access
        assert_eq!(dart.read(3) & Rr0::TX_BUFFER_EMPTY.bits(), Rr0::TX_BUFFER_EMPTY.bits());
        dart.write(3, 2);
        assert_eq!(dart.read(3), 0x90);
        dart.receive_data(A, 0x77);
        assert_eq!(dart.read(2) & Rr0::RX_CHAR_AVAILABLE.bits(), Rr0::RX_CHAR_AVAILABLE.bits());
        assert_eq!(dart.read(0), 0x77);
        dart.write(1, 0x55);
        assert!(!dart.channel(B).is_all_sent());
    }
}
