/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
use core::convert::TryFrom;
use core::fmt;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use bitflags::bitflags;
use z80chips_core::{register_flags_conv, register_masks};

/// The operating mode of a PIO port.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PioMode {
    /// Mode 0: byte output with a handshake.
    Output = 0,
    /// Mode 1: byte input with a handshake.
    Input = 1,
    /// Mode 2: byte input and output on port A, using handshake lines of both ports.
    Bidirectional = 2,
    /// Mode 3: each bit is an input or an output, no handshake.
    BitControl = 3
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TryFromU8PioModeError(pub u8);

/// Which byte the control register of a port expects next.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlSequence {
    /// A control word is expected.
    Normal,
    /// The I/O direction of bit-control mode is expected after a mode select word.
    SettingDirection,
    /// The interrupt mask is expected after an interrupt control word.
    SettingMask
}

bitflags! {
    /// The upper nibble of the interrupt control word of a PIO port.
    ///
    /// | b7  | b6  | b5  | b4  | b3-b0  |
    /// |-----|-----|-----|-----|--------|
    /// | EN  | A/O | H/L | MF  | `0111` |
    ///
    /// * `EN` - interrupts enabled.
    /// * `A/O` - in bit-control mode all (1) or any (0) of the monitored bits must be active.
    /// * `H/L` - monitored bits are active high (1) or low (0).
    /// * `MF` - the mask byte follows.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct InterruptControl: u8 {
        const MASK_FOLLOWS = 0b0001_0000;
        const ACTIVE_HIGH  = 0b0010_0000;
        const AND_LOGIC    = 0b0100_0000;
        const ENABLE       = 0b1000_0000;
    }
}
register_flags_conv!(InterruptControl);
register_masks!(InterruptControl {
    /// The bits reported by the LH0081 control register read.
    pub const LOGIC_MASK = ENABLE|AND_LOGIC;
});

/// The state of a single PIO port.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PioPort {
    pub(super) mode: PioMode,
    pub(super) sequence: ControlSequence,
    pub(super) icw: InterruptControl,
    pub(super) vector: u8,
    /// 1 - input, 0 - output.
    pub(super) ddr: u8,
    /// 1 - bit is ignored by the match logic.
    pub(super) mask: u8,
    pub(super) input: u8,
    pub(super) output: u8,
    pub(super) irq_enabled: bool,
    pub(super) irq_pending: bool,
    pub(super) matched: bool,
    /// The last level of the strobe input, high is inactive.
    pub(super) strobe: bool,
    pub(super) ready: bool,
}

impl Default for PioPort {
    fn default() -> Self {
        PioPort {
            mode: PioMode::Input,
            sequence: ControlSequence::Normal,
            icw: InterruptControl::empty(),
            vector: 0,
            ddr: 0,
            mask: 0xff,
            input: 0,
            output: 0,
            irq_enabled: false,
            irq_pending: false,
            matched: false,
            strobe: true,
            ready: false
        }
    }
}

impl PioPort {
    /// Returns the current operating mode.
    #[inline]
    pub fn mode(&self) -> PioMode {
        self.mode
    }
    /// Returns the state of the control register sequence.
    #[inline]
    pub fn control_sequence(&self) -> ControlSequence {
        self.sequence
    }
    /// Returns the last interrupt control word.
    #[inline]
    pub fn interrupt_control(&self) -> InterruptControl {
        self.icw
    }
    #[inline]
    pub fn interrupt_vector(&self) -> u8 {
        self.vector
    }
    #[inline]
    pub fn is_interrupt_enabled(&self) -> bool {
        self.irq_enabled
    }
    /// Returns `true` if an interrupt condition was latched while interrupts were disabled.
    #[inline]
    pub fn is_interrupt_pending(&self) -> bool {
        self.irq_pending
    }
    /// Returns the I/O direction of bit-control mode, bits set to 1 are inputs.
    #[inline]
    pub fn direction(&self) -> u8 {
        self.ddr
    }
    /// Returns the interrupt mask of bit-control mode, bits set to 1 are not monitored.
    #[inline]
    pub fn mask(&self) -> u8 {
        self.mask
    }
    #[inline]
    pub fn input_latch(&self) -> u8 {
        self.input
    }
    #[inline]
    pub fn output_latch(&self) -> u8 {
        self.output
    }
    /// Returns `true` if the bit-control mode match condition was met at the last poll.
    #[inline]
    pub fn is_matched(&self) -> bool {
        self.matched
    }
    /// Returns the level of the ready output.
    #[inline]
    pub fn ready(&self) -> bool {
        self.ready
    }
    /// Returns the last level of the strobe input.
    #[inline]
    pub fn strobe_level(&self) -> bool {
        self.strobe
    }
    /// The byte driven to the port pins, input bits of bit-control mode are left out.
    #[inline]
    pub(super) fn pin_output(&self) -> u8 {
        match self.mode {
            PioMode::BitControl => self.output & !self.ddr,
            _ => self.output
        }
    }
    /// Evaluates the bit-control match condition for the given pin levels.
    pub(super) fn match_condition(&self, pins: u8) -> bool {
        let monitored = self.ddr & !self.mask;
        if monitored == 0 {
            return false;
        }
        let levels = if self.icw.contains(InterruptControl::ACTIVE_HIGH) { pins } else { !pins };
        let active = levels & monitored;
        if self.icw.contains(InterruptControl::AND_LOGIC) {
            active == monitored
        }
        else {
            active != 0
        }
    }
}

impl std::error::Error for TryFromU8PioModeError {}

impl fmt::Display for TryFromU8PioModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer ({}) out of range for `PioMode`", self.0)
    }
}

impl TryFrom<u8> for PioMode {
    type Error = TryFromU8PioModeError;
    fn try_from(mode: u8) -> core::result::Result<Self, Self::Error> {
        Ok(match mode {
            0 => PioMode::Output,
            1 => PioMode::Input,
            2 => PioMode::Bidirectional,
            3 => PioMode::BitControl,
            _ => return Err(TryFromU8PioModeError(mode))
        })
    }
}

impl PioMode {
    /// Decodes the mode from bits 6-7 of a mode select control word.
    #[inline]
    pub fn from_control_word(data: u8) -> Self {
        match data >> 6 {
            0 => PioMode::Output,
            1 => PioMode::Input,
            2 => PioMode::Bidirectional,
            _ => PioMode::BitControl
        }
    }
}
