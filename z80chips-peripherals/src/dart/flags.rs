/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use bitflags::bitflags;
use z80chips_core::clock::ClockMode;
use z80chips_core::{register_flags_conv, register_masks};

bitflags! {
    /// Write register 0: register pointer and commands.
    ///
    /// | b7-b6 | b5-b3   | b2-b0    |
    /// |-------|---------|----------|
    /// | n/u   | command | pointer  |
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Wr0: u8 {
        const PTR0 = 0b0000_0001;
        const PTR1 = 0b0000_0010;
        const PTR2 = 0b0000_0100;
        const CMD0 = 0b0000_1000;
        const CMD1 = 0b0001_0000;
        const CMD2 = 0b0010_0000;
    }
}
register_flags_conv!(Wr0);
register_masks!(Wr0 {
    pub const POINTER_MASK = PTR2|PTR1|PTR0;
    pub const COMMAND_MASK = CMD2|CMD1|CMD0;
});

/// Commands encoded in bits 3-5 of [Wr0].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Null,
    /// Not available on the DART.
    SendAbort,
    ResetExtStatusInterrupts,
    ChannelReset,
    EnableInterruptOnNextRx,
    ResetTxInterruptPending,
    ErrorReset,
    ReturnFromInterrupt
}

impl Wr0 {
    /// Returns the register pointer.
    #[inline]
    pub fn pointer(self) -> u8 {
        (self & Wr0::POINTER_MASK).bits()
    }
    /// Returns the command.
    pub fn command(self) -> Command {
        match (self & Wr0::COMMAND_MASK).bits() >> 3 {
            0 => Command::Null,
            1 => Command::SendAbort,
            2 => Command::ResetExtStatusInterrupts,
            3 => Command::ChannelReset,
            4 => Command::EnableInterruptOnNextRx,
            5 => Command::ResetTxInterruptPending,
            6 => Command::ErrorReset,
            _ => Command::ReturnFromInterrupt
        }
    }
}

bitflags! {
    /// Write register 1: interrupt control.
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Wr1: u8 {
        const EXT_INT_ENABLE        = 0b0000_0001;
        const TX_INT_ENABLE         = 0b0000_0010;
        /// Effective in channel B only.
        const STATUS_AFFECTS_VECTOR = 0b0000_0100;
        const RX_INT0               = 0b0000_1000;
        const RX_INT1               = 0b0001_0000;
        const WAIT_READY_ON_RT      = 0b0010_0000;
        const WAIT_READY_FUNCTION   = 0b0100_0000;
        const WAIT_READY_ENABLE     = 0b1000_0000;
    }
}
register_flags_conv!(Wr1);
register_masks!(Wr1 {
    pub const RX_INT_MASK = RX_INT1|RX_INT0;
});

/// Receive interrupt modes selected by bits 3-4 of [Wr1].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RxInterruptMode {
    Disabled,
    /// Interrupt on the first received character after the enable command.
    FirstCharacter,
    /// Interrupt on every character, a parity error is a special receive condition.
    AllParityAffectsVector,
    /// Interrupt on every character, parity errors are ignored by the vector.
    AllParityIgnored
}

impl Wr1 {
    pub fn rx_interrupt_mode(self) -> RxInterruptMode {
        match (self & Wr1::RX_INT_MASK).bits() >> 3 {
            0 => RxInterruptMode::Disabled,
            1 => RxInterruptMode::FirstCharacter,
            2 => RxInterruptMode::AllParityAffectsVector,
            _ => RxInterruptMode::AllParityIgnored
        }
    }
}

bitflags! {
    /// Write register 3: receiver parameters.
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Wr3: u8 {
        const RX_ENABLE    = 0b0000_0001;
        const UNUSED1      = 0b0000_0010;
        const UNUSED2      = 0b0000_0100;
        const UNUSED3      = 0b0000_1000;
        const UNUSED4      = 0b0001_0000;
        const AUTO_ENABLES = 0b0010_0000;
        const RX_BITS0     = 0b0100_0000;
        const RX_BITS1     = 0b1000_0000;
    }
}
register_flags_conv!(Wr3);
register_masks!(Wr3 {
    pub const RX_BITS_MASK = RX_BITS1|RX_BITS0;
});

impl Wr3 {
    /// Returns the number of data bits per received character.
    #[inline]
    pub fn word_length(self) -> u8 {
        word_length((self & Wr3::RX_BITS_MASK).bits() >> 6)
    }
}

bitflags! {
    /// Write register 4: framing parameters and the clock mode.
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Wr4: u8 {
        const PARITY_ENABLE = 0b0000_0001;
        const PARITY_EVEN   = 0b0000_0010;
        const STOP_BITS0    = 0b0000_0100;
        const STOP_BITS1    = 0b0000_1000;
        const UNUSED4       = 0b0001_0000;
        const UNUSED5       = 0b0010_0000;
        const CLOCK_MODE0   = 0b0100_0000;
        const CLOCK_MODE1   = 0b1000_0000;
    }
}
register_flags_conv!(Wr4);
register_masks!(Wr4 {
    pub const STOP_BITS_MASK = STOP_BITS1|STOP_BITS0;
    pub const CLOCK_MODE_MASK = CLOCK_MODE1|CLOCK_MODE0;
});

/// The number of stop bits selected by bits 2-3 of [Wr4].
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopBits {
    One,
    /// Framed as two stop bits, the receiver checks one and a half.
    OneAndHalf,
    Two
}

impl Wr4 {
    #[inline]
    pub fn clock_mode(self) -> ClockMode {
        ClockMode::from_bits((self & Wr4::CLOCK_MODE_MASK).bits() >> 6)
    }
    /// Returns the number of stop bits. The synchronous mode code `00` is treated as one stop bit.
    #[inline]
    pub fn stop_bits(self) -> StopBits {
        match (self & Wr4::STOP_BITS_MASK).bits() >> 2 {
            0|1 => StopBits::One,
            2 => StopBits::OneAndHalf,
            _ => StopBits::Two
        }
    }
    /// Returns `Some(true)` for even parity, `Some(false)` for odd parity or `None` if disabled.
    #[inline]
    pub fn parity(self) -> Option<bool> {
        if self.contains(Wr4::PARITY_ENABLE) {
            Some(self.contains(Wr4::PARITY_EVEN))
        }
        else {
            None
        }
    }
}

bitflags! {
    /// Write register 5: transmitter parameters and modem control outputs.
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Wr5: u8 {
        const UNUSED0    = 0b0000_0001;
        const RTS        = 0b0000_0010;
        const UNUSED2    = 0b0000_0100;
        const TX_ENABLE  = 0b0000_1000;
        const SEND_BREAK = 0b0001_0000;
        const TX_BITS0   = 0b0010_0000;
        const TX_BITS1   = 0b0100_0000;
        const DTR        = 0b1000_0000;
    }
}
register_flags_conv!(Wr5);
register_masks!(Wr5 {
    pub const TX_BITS_MASK = TX_BITS1|TX_BITS0;
});

impl Wr5 {
    /// Returns the number of data bits per transmitted character.
    #[inline]
    pub fn word_length(self) -> u8 {
        word_length((self & Wr5::TX_BITS_MASK).bits() >> 5)
    }
}

/// Decodes the 2-bit word length code shared by [Wr3] and [Wr5].
#[inline]
fn word_length(code: u8) -> u8 {
    match code & 3 {
        0 => 5,
        1 => 7,
        2 => 6,
        _ => 8
    }
}

bitflags! {
    /// Read register 0: buffer and external status.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Rr0: u8 {
        const RX_CHAR_AVAILABLE = 0b0000_0001;
        /// Reported in channel A only.
        const INT_PENDING       = 0b0000_0010;
        const TX_BUFFER_EMPTY   = 0b0000_0100;
        const DCD               = 0b0000_1000;
        const RI                = 0b0001_0000;
        const CTS               = 0b0010_0000;
        const UNUSED6           = 0b0100_0000;
        const BREAK             = 0b1000_0000;
    }
}
register_flags_conv!(Rr0);
register_masks!(Rr0 {
    pub const EXT_STATUS_MASK = BREAK|CTS|RI|DCD;
});

bitflags! {
    /// Read register 1: special receive conditions.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Rr1: u8 {
        const ALL_SENT      = 0b0000_0001;
        const UNUSED1       = 0b0000_0010;
        const UNUSED2       = 0b0000_0100;
        const UNUSED3       = 0b0000_1000;
        const PARITY_ERROR  = 0b0001_0000;
        const RX_OVERRUN    = 0b0010_0000;
        const FRAMING_ERROR = 0b0100_0000;
        const UNUSED7       = 0b1000_0000;
    }
}
register_flags_conv!(Rr1);
register_masks!(Rr1 {
    pub const ERROR_MASK = FRAMING_ERROR|RX_OVERRUN|PARITY_ERROR;
    /// Bits kept until the error reset command.
    pub const STICKY_MASK = RX_OVERRUN|PARITY_ERROR;
});

#[cfg(test)]
mod tests {
    use super::*;
    use z80chips_core::assert_register_single_bits;

    #[test]
    fn register_flags_all_bits_defined() {
        assert_register_single_bits!(Wr0, 6);
        assert_register_single_bits!(Wr1, 8);
        assert_register_single_bits!(Wr3, 8);
        assert_register_single_bits!(Wr4, 8);
        assert_register_single_bits!(Wr5, 8);
        assert_register_single_bits!(Rr0, 8);
        assert_register_single_bits!(Rr1, 8);
    }

    #[test]
    fn wr0_works() {
        assert_eq!(Wr0::from(0x18).command(), Command::ChannelReset);
        assert_eq!(Wr0::from(0x10).command(), Command::ResetExtStatusInterrupts);
        assert_eq!(Wr0::from(0x20).command(), Command::EnableInterruptOnNextRx);
        assert_eq!(Wr0::from(0x28).command(), Command::ResetTxInterruptPending);
        assert_eq!(Wr0::from(0x30).command(), Command::ErrorReset);
        assert_eq!(Wr0::from(0x38).command(), Command::ReturnFromInterrupt);
        assert_eq!(Wr0::from(0xcf).command(), Command::SendAbort);
        assert_eq!(Wr0::from(0xcf).pointer(), 7);
        assert_eq!(Wr0::from(0x15).pointer(), 5);
    }

    #[test]
    fn write_registers_decode() {
        assert_eq!(Wr1::from(0x00).rx_interrupt_mode(), RxInterruptMode::Disabled);
        assert_eq!(Wr1::from(0x08).rx_interrupt_mode(), RxInterruptMode::FirstCharacter);
        assert_eq!(Wr1::from(0x10).rx_interrupt_mode(), RxInterruptMode::AllParityAffectsVector);
        assert_eq!(Wr1::from(0x1f).rx_interrupt_mode(), RxInterruptMode::AllParityIgnored);
        assert_eq!(Wr3::from(0x01).word_length(), 5);
        assert_eq!(Wr3::from(0x41).word_length(), 7);
        assert_eq!(Wr3::from(0x81).word_length(), 6);
        assert_eq!(Wr3::from(0xc1).word_length(), 8);
        assert_eq!(Wr5::from(0x68).word_length(), 8);
        assert_eq!(Wr5::from(0x40).word_length(), 6);
        let wr4 = Wr4::from(0x44);
        assert_eq!(wr4.clock_mode(), ClockMode::X16);
        assert_eq!(wr4.stop_bits(), StopBits::One);
        assert_eq!(wr4.parity(), None);
        let wr4 = Wr4::from(0xcf);
        assert_eq!(wr4.clock_mode(), ClockMode::X64);
        assert_eq!(wr4.stop_bits(), StopBits::Two);
        assert_eq!(wr4.parity(), Some(true));
        assert_eq!(Wr4::from(0x09).stop_bits(), StopBits::OneAndHalf);
        assert_eq!(Wr4::from(0x05).parity(), Some(false));
    }
}
