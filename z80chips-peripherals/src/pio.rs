/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! An emulator of the Z80-PIO parallel input/output controller.
//!
//! The chip has two 8-bit ports, `A` and `B`. Each port has a data register, a control register,
//! a pair of handshake lines (`ASTB`/`ARDY`, `BSTB`/`BRDY`) and an interrupt source.
//!
//! | Mode | Name          | Data write                  | Data read              |
//! |------|---------------|-----------------------------|------------------------|
//! | 0    | Output        | latched, driven, `RDY` high | output latch           |
//! | 1    | Input         | ignored                     | input latch, `RDY` pulse |
//! | 2    | Bidirectional | port A only, see [PioMode]  | input latch, `BRDY` pulse |
//! | 3    | Bit-control   | driven to output bits       | pins and output latch  |
//!
//! Control words written in the [ControlSequence::Normal] state:
//!
//! | Bits        | Meaning                                                       |
//! |-------------|---------------------------------------------------------------|
//! | `vvvv vvv0` | interrupt vector                                              |
//! | `mm-- 1111` | mode select, mode 3 is followed by the I/O direction byte      |
//! | `eahf 0111` | interrupt control, see [InterruptControl], `f` - mask follows |
//! | `e--- 0011` | interrupt enable flip-flop                                    |
//!
//! The host side of the port pins is provided by an implementation of [PioDevice].
mod config;
mod port;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use z80chips_core::ChannelId;
use z80chips_core::daisy::{DaisyDevice, IntState, InterruptSources};
use z80chips_core::error::ConfigError;
use crate::register::{AddressLayout, ChipRegisters, RegisterSelect};

pub use config::*;
pub use port::*;

const CONTROL_WORD_MASK: u8            = 0b0000_1111;
const CONTROL_MODE_SELECT: u8          = 0b0000_1111;
const CONTROL_INTERRUPT: u8            = 0b0000_0111;
const CONTROL_INTERRUPT_ENABLE: u8     = 0b0000_0011;
const CONTROL_VECTOR_FLAG: u8          = 0b0000_0001;
const CONTROL_ENABLE_BIT: u8           = 0b1000_0000;

/// An interface between the PIO and the hardware connected to its pins.
///
/// All methods have default implementations of a port with nothing connected.
pub trait PioDevice {
    /// Returns the levels of the port A pins. Not connected pins read high.
    fn read_port_a(&mut self) -> u8 {
        0xff
    }
    /// Receives the byte driven to the port A pins.
    fn write_port_a(&mut self, _data: u8) {}
    /// Returns the levels of the port B pins. Not connected pins read high.
    fn read_port_b(&mut self) -> u8 {
        0xff
    }
    /// Receives the byte driven to the port B pins.
    fn write_port_b(&mut self, _data: u8) {}
    /// Called when the `RDY` output of a port changes its level.
    fn ready_changed(&mut self, _port: ChannelId, _ready: bool) {}
    /// Called when the `INT` output of the chip changes its state.
    fn int_changed(&mut self, _asserted: bool) {}
}

impl PioDevice for () {}

impl<D: PioDevice + ?Sized> PioDevice for Box<D> {
    fn read_port_a(&mut self) -> u8 {
        (**self).read_port_a()
    }
    fn write_port_a(&mut self, data: u8) {
        (**self).write_port_a(data)
    }
    fn read_port_b(&mut self) -> u8 {
        (**self).read_port_b()
    }
    fn write_port_b(&mut self, data: u8) {
        (**self).write_port_b(data)
    }
    fn ready_changed(&mut self, port: ChannelId, ready: bool) {
        (**self).ready_changed(port, ready)
    }
    fn int_changed(&mut self, asserted: bool) {
        (**self).int_changed(asserted)
    }
}

/// The Z80-PIO.
///
/// Port `A` is the higher priority interrupt source.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct Z80Pio<D> {
    /// The hardware connected to the chip pins.
    #[cfg_attr(feature = "snapshot", serde(skip))]
    pub device: D,
    config: PioConfig,
    ports: [PioPort; 2],
    sources: InterruptSources<[IntState; 2]>,
    int_line: bool,
    poll_phase: u32,
}

impl<D: Default> Default for Z80Pio<D> {
    fn default() -> Self {
        Z80Pio::new(D::default())
    }
}

impl<D> Z80Pio<D> {
    /// Creates a PIO with the default configuration in the reset state.
    pub fn new(device: D) -> Self {
        Z80Pio {
            device,
            config: PioConfig::default(),
            ports: Default::default(),
            sources: Default::default(),
            int_line: false,
            poll_phase: 0
        }
    }
    /// Creates a PIO with the given configuration in the reset state.
    pub fn with_config(device: D, config: PioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Z80Pio { config, ..Z80Pio::new(device) })
    }
    #[inline]
    pub fn config(&self) -> &PioConfig {
        &self.config
    }
    #[inline]
    pub fn tag(&self) -> &str {
        &self.config.tag
    }
    /// Returns a reference to the state of the given port.
    #[inline]
    pub fn port(&self, port: ChannelId) -> &PioPort {
        &self.ports[port.index()]
    }
    /// Returns the level of the `RDY` output of the given port.
    #[inline]
    pub fn ready(&self, port: ChannelId) -> bool {
        self.ports[port.index()].ready
    }
    /// Returns the last level of the `STB` input of the given port.
    #[inline]
    pub fn strobe_level(&self, port: ChannelId) -> bool {
        self.ports[port.index()].strobe_level()
    }
    /// Returns the state of the `INT` output.
    #[inline]
    pub fn int_line(&self) -> bool {
        self.int_line
    }
    /// Returns the interrupt state of the given port.
    #[inline]
    pub fn source_state(&self, port: ChannelId) -> IntState {
        self.sources.get(port.index())
    }
}

impl<D: PioDevice> Z80Pio<D> {
    /// Resets the chip.
    ///
    /// Both ports enter [PioMode::Input] with interrupts disabled, all bits masked off and
    /// the output latch cleared. Interrupt vectors are retained.
    pub fn reset(&mut self) {
        debug!("{}: reset", self.config.tag);
        for port in ChannelId::ALL.iter().copied() {
            let pio_port = &mut self.ports[port.index()];
            pio_port.mode = PioMode::Input;
            pio_port.sequence = ControlSequence::Normal;
            pio_port.icw.remove(InterruptControl::ENABLE);
            pio_port.irq_enabled = false;
            pio_port.irq_pending = false;
            pio_port.matched = false;
            pio_port.ddr = 0;
            pio_port.mask = 0xff;
            pio_port.output = 0;
            self.set_ready(port, false);
        }
        self.sources.reset();
        self.check_interrupt();
    }
    /// Writes `data` to the control register of the given port.
    pub fn control_write(&mut self, port: ChannelId, data: u8) {
        trace!("{}: port {} control <- {:02x}", self.config.tag, port, data);
        let index = port.index();
        match self.ports[index].sequence {
            ControlSequence::Normal => self.control_word(port, data),
            ControlSequence::SettingDirection => {
                let pio_port = &mut self.ports[index];
                pio_port.ddr = data;
                pio_port.matched = false;
                pio_port.irq_enabled = pio_port.icw.contains(InterruptControl::ENABLE);
                pio_port.sequence = ControlSequence::Normal;
                self.check_interrupt();
            }
            ControlSequence::SettingMask => {
                let pio_port = &mut self.ports[index];
                pio_port.mask = data;
                pio_port.matched = false;
                pio_port.irq_enabled = pio_port.icw.contains(InterruptControl::ENABLE);
                pio_port.sequence = ControlSequence::Normal;
                self.check_interrupt();
            }
        }
    }
    /// Reads the control register of the given port.
    ///
    /// Only the LH0081 variant has a readable control register, returning the interrupt control
    /// bits of both ports. Other variants respond as to [Z80Pio::data_read].
    pub fn control_read(&mut self, port: ChannelId) -> u8 {
        if self.config.variant.has_readable_control() {
            let icw_a = self.ports[0].icw & InterruptControl::LOGIC_MASK;
            let icw_b = self.ports[1].icw & InterruptControl::LOGIC_MASK;
            icw_a.bits() | icw_b.bits() >> 4
        }
        else {
            self.data_read(port)
        }
    }
    /// Writes `data` to the data register of the given port.
    pub fn data_write(&mut self, port: ChannelId, data: u8) {
        trace!("{}: port {} data <- {:02x}", self.config.tag, port, data);
        let index = port.index();
        match self.ports[index].mode {
            PioMode::Output => {
                self.set_ready(port, false);
                self.ports[index].output = data;
                self.drive_pins(port);
                self.set_ready(port, true);
            }
            PioMode::Input => {}
            PioMode::Bidirectional => {
                self.set_ready(port, false);
                self.ports[index].output = data;
                if !self.ports[index].strobe {
                    self.drive_pins(port);
                }
                self.set_ready(port, true);
            }
            PioMode::BitControl => {
                self.ports[index].output = data;
                self.drive_pins(port);
            }
        }
    }
    /// Reads the data register of the given port.
    pub fn data_read(&mut self, port: ChannelId) -> u8 {
        let index = port.index();
        let data = match self.ports[index].mode {
            PioMode::Output => self.ports[index].output,
            PioMode::Input => {
                let data = self.ports[index].input;
                self.pulse_ready(port);
                data
            }
            PioMode::Bidirectional => {
                let PioPort { input, output, ddr, .. } = self.ports[ChannelId::A.index()];
                self.pulse_ready(ChannelId::B);
                input | (output & !ddr)
            }
            PioMode::BitControl => {
                let pins = self.read_pins(port);
                let pio_port = &mut self.ports[index];
                pio_port.input = pins;
                (pins & pio_port.ddr) | (pio_port.output & !pio_port.ddr)
            }
        };
        trace!("{}: port {} data -> {:02x}", self.config.tag, port, data);
        data
    }
    /// Sets the level of the `STB` input of the given port. The strobe is active low.
    pub fn strobe(&mut self, port: ChannelId, level: bool) {
        trace!("{}: port {} strobe: {}", self.config.tag, port, level);
        let index = port.index();
        let rising = level && !self.ports[index].strobe;
        if self.ports[0].mode == PioMode::Bidirectional {
            match port {
                ChannelId::A if !level => self.drive_pins(ChannelId::A),
                ChannelId::B if !level => {
                    let pins = self.read_pins(ChannelId::A);
                    self.ports[0].input = pins;
                }
                _ if rising => self.strobe_acknowledged(port),
                _ => {}
            }
        }
        else {
            match self.ports[index].mode {
                PioMode::Input if !level => {
                    let pins = self.read_pins(port);
                    self.ports[index].input = pins;
                }
                PioMode::Output|PioMode::Input if rising => self.strobe_acknowledged(port),
                _ => {}
            }
        }
        self.ports[index].strobe = level;
    }
    /// Sets the level of the `ASTB` input.
    #[inline]
    pub fn strobe_a(&mut self, level: bool) {
        self.strobe(ChannelId::A, level)
    }
    /// Sets the level of the `BSTB` input.
    #[inline]
    pub fn strobe_b(&mut self, level: bool) {
        self.strobe(ChannelId::B, level)
    }
    /// Samples the inputs of the ports in bit-control mode and evaluates their match condition.
    ///
    /// An interrupt is triggered when the condition becomes met.
    pub fn poll_tick(&mut self) {
        for port in ChannelId::ALL.iter().copied() {
            let index = port.index();
            if self.ports[index].mode != PioMode::BitControl || self.ports[index].mask == 0xff {
                continue;
            }
            let pins = self.read_pins(port);
            let pio_port = &mut self.ports[index];
            pio_port.input = pins;
            let matched = pio_port.match_condition(pins);
            let rising = matched && !pio_port.matched;
            pio_port.matched = matched;
            if rising {
                trace!("{}: port {} match: {:02x}", self.config.tag, port, pins);
                self.trigger_interrupt(port);
            }
        }
    }
    /// Advances the poll timer by `cycles` chip clock cycles, running the elapsed poll ticks.
    pub fn advance(&mut self, cycles: u32) {
        let divisor = self.config.poll_divisor.max(1);
        let total = u64::from(self.poll_phase) + u64::from(cycles);
        self.poll_phase = (total % u64::from(divisor)) as u32;
        for _ in 0..total / u64::from(divisor) {
            self.poll_tick();
        }
    }
    /// Re-evaluates interrupt requests of both ports and updates the `INT` output.
    ///
    /// A condition latched while interrupts of a port were disabled becomes a request once
    /// they are enabled, and the request of a port with interrupts disabled is withdrawn.
    pub fn check_interrupt(&mut self) {
        for (index, pio_port) in self.ports.iter_mut().enumerate() {
            if pio_port.irq_enabled {
                if pio_port.irq_pending {
                    self.sources.request(index);
                    pio_port.irq_pending = false;
                }
            }
            else {
                self.sources.withdraw(index);
            }
        }
        let asserted = self.sources.state().is_requested();
        if asserted != self.int_line {
            trace!("{}: INT: {}", self.config.tag, asserted);
            self.int_line = asserted;
            self.device.int_changed(asserted);
        }
    }

    fn control_word(&mut self, port: ChannelId, data: u8) {
        let index = port.index();
        if data & CONTROL_VECTOR_FLAG == 0 {
            self.ports[index].vector = data;
            return;
        }
        match data & CONTROL_WORD_MASK {
            CONTROL_MODE_SELECT => self.set_mode(port, PioMode::from_control_word(data)),
            CONTROL_INTERRUPT => {
                let icw = InterruptControl::from_data(data);
                let pio_port = &mut self.ports[index];
                pio_port.icw = icw;
                if icw.contains(InterruptControl::MASK_FOLLOWS) {
                    pio_port.irq_enabled = false;
                    pio_port.irq_pending = false;
                    pio_port.matched = false;
                    pio_port.sequence = ControlSequence::SettingMask;
                }
                else {
                    pio_port.irq_enabled = icw.contains(InterruptControl::ENABLE);
                }
                self.check_interrupt();
            }
            CONTROL_INTERRUPT_ENABLE => {
                let enable = data & CONTROL_ENABLE_BIT != 0;
                let pio_port = &mut self.ports[index];
                pio_port.icw.set(InterruptControl::ENABLE, enable);
                pio_port.irq_enabled = enable;
                self.check_interrupt();
            }
            _ => warn!("{}: port {} unknown control word: {:02x}", self.config.tag, port, data)
        }
    }

    fn set_mode(&mut self, port: ChannelId, mode: PioMode) {
        let index = port.index();
        debug!("{} {}: port {} mode: {:?}", self.config.tag, self.config.variant, port, mode);
        match mode {
            PioMode::Output => {
                self.ports[index].mode = mode;
                self.drive_pins(port);
                self.set_ready(port, true);
            }
            PioMode::Input => {
                self.ports[index].mode = mode;
            }
            PioMode::Bidirectional if port == ChannelId::B => {
                warn!("{}: port B can not be bidirectional", self.config.tag);
            }
            PioMode::Bidirectional => {
                self.ports[index].mode = mode;
            }
            PioMode::BitControl => {
                if port == ChannelId::A || self.ports[0].mode != PioMode::Bidirectional {
                    self.set_ready(port, false);
                }
                let pio_port = &mut self.ports[index];
                pio_port.mode = mode;
                pio_port.irq_enabled = false;
                pio_port.matched = false;
                pio_port.sequence = ControlSequence::SettingDirection;
                self.check_interrupt();
            }
        }
    }

    fn strobe_acknowledged(&mut self, port: ChannelId) {
        self.trigger_interrupt(port);
        self.set_ready(port, false);
    }

    fn trigger_interrupt(&mut self, port: ChannelId) {
        let index = port.index();
        if self.ports[index].irq_enabled {
            self.sources.request(index);
        }
        else {
            self.ports[index].irq_pending = true;
        }
        self.check_interrupt();
    }

    fn read_pins(&mut self, port: ChannelId) -> u8 {
        match port {
            ChannelId::A => self.device.read_port_a(),
            ChannelId::B => self.device.read_port_b()
        }
    }

    fn drive_pins(&mut self, port: ChannelId) {
        let data = self.ports[port.index()].pin_output();
        match port {
            ChannelId::A => self.device.write_port_a(data),
            ChannelId::B => self.device.write_port_b(data)
        }
    }

    fn set_ready(&mut self, port: ChannelId, ready: bool) {
        let pio_port = &mut self.ports[port.index()];
        if pio_port.ready != ready {
            pio_port.ready = ready;
            self.device.ready_changed(port, ready);
        }
    }

    fn pulse_ready(&mut self, port: ChannelId) {
        self.set_ready(port, false);
        self.set_ready(port, true);
    }
}

impl<D: PioDevice> DaisyDevice for Z80Pio<D> {
    #[inline]
    fn irq_state(&self) -> IntState {
        self.sources.state()
    }

    fn irq_ack(&mut self) -> u8 {
        let vector = match self.sources.acknowledge() {
            Some(index) => self.ports[index].vector,
            None => {
                error!("{}: interrupt acknowledged with no interrupt requested", self.config.tag);
                self.ports[0].vector
            }
        };
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

impl<D: PioDevice> ChipRegisters for Z80Pio<D> {
    #[inline]
    fn address_layout(&self) -> AddressLayout {
        self.config.layout
    }

    fn read_register(&mut self, port: ChannelId, select: RegisterSelect) -> u8 {
        match select {
            RegisterSelect::Data => self.data_read(port),
            RegisterSelect::Control => self.control_read(port)
        }
    }

    fn write_register(&mut self, port: ChannelId, select: RegisterSelect, data: u8) {
        match select {
            RegisterSelect::Data => self.data_write(port, data),
            RegisterSelect::Control => self.control_write(port, data)
        }
    }
}
