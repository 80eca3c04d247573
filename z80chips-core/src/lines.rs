/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! Logic levels of serial data and modem control lines.
//!
//! The terminology regarding the lines of a serial controller:
//!
//! * `RxD` (Receive Data) serial data received by the chip.
//! * `TxD` (Transmit Data) serial data sent by the chip.
//! * `RTS` (Request to Send) and `DTR` (Data Terminal Ready) outputs of the chip.
//! * `CTS` (Clear to Send), `DCD` (Data Carrier Detect) and `RI` (Ring Indicator) inputs of the chip.
use core::ops::Not;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

/// A type representing a state on one of the `DATA` lines: `RxD` or `TxD`.
///
/// `Space` represents a logical 0, while `Mark` represents a logical 1.
/// An idle line is marking.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DataState {
    Space = 0,
    Mark = 1
}

/// A type representing a state on one of the `CONTROL` lines: `RTS`, `DTR`, `CTS`, `DCD` or `RI`.
///
/// The control pins of Z80 family chips are active low: `Active` represents a logical 0 on the pin,
/// while `Inactive` represents a logical 1.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ControlState {
    Active = 0,
    Inactive = 1
}

impl Default for DataState {
    fn default() -> Self {
        DataState::Mark
    }
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState::Inactive
    }
}

impl DataState {
    #[inline]
    pub fn is_space(self) -> bool {
        self == DataState::Space
    }
    #[inline]
    pub fn is_mark(self) -> bool {
        self == DataState::Mark
    }
}

impl ControlState {
    #[inline]
    pub fn is_active(self) -> bool {
        self == ControlState::Active
    }
    #[inline]
    pub fn is_inactive(self) -> bool {
        self == ControlState::Inactive
    }
    /// Returns [ControlState::Active] if `active` is `true`.
    #[inline]
    pub fn active_if(active: bool) -> Self {
        if active { ControlState::Active } else { ControlState::Inactive }
    }
}

impl Not for DataState {
    type Output = DataState;
    #[inline]
    fn not(self) -> DataState {
        match self {
            DataState::Space => DataState::Mark,
            DataState::Mark => DataState::Space
        }
    }
}

impl Not for ControlState {
    type Output = ControlState;
    #[inline]
    fn not(self) -> ControlState {
        match self {
            ControlState::Active => ControlState::Inactive,
            ControlState::Inactive => ControlState::Active
        }
    }
}

impl From<DataState> for bool {
    #[inline]
    fn from(ds: DataState) -> bool {
        match ds {
            DataState::Space => false,
            DataState::Mark => true,
        }
    }
}

impl From<DataState> for u8 {
    #[inline]
    fn from(ds: DataState) -> u8 {
        ds as u8
    }
}

impl From<bool> for DataState {
    #[inline]
    fn from(flag: bool) -> DataState {
        if flag {
            DataState::Mark
        }
        else {
            DataState::Space
        }
    }
}

impl From<ControlState> for bool {
    /// Returns the pin level: `false` for [ControlState::Active].
    #[inline]
    fn from(cs: ControlState) -> bool {
        match cs {
            ControlState::Active => false,
            ControlState::Inactive => true,
        }
    }
}

impl From<bool> for ControlState {
    /// Converts the pin level, `false` being [ControlState::Active].
    #[inline]
    fn from(flag: bool) -> ControlState {
        if flag {
            ControlState::Inactive
        }
        else {
            ControlState::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_work() {
        assert_eq!(DataState::default(), DataState::Mark);
        assert_eq!(ControlState::default(), ControlState::Inactive);
        assert!(DataState::from(false).is_space());
        assert!(DataState::from(true).is_mark());
        assert_eq!(u8::from(DataState::Mark), 1);
        assert!(ControlState::from(false).is_active());
        assert!(ControlState::from(true).is_inactive());
        assert!(ControlState::active_if(true).is_active());
        assert!(!bool::from(ControlState::Active));
        assert_eq!(!DataState::Space, DataState::Mark);
        assert_eq!(!ControlState::Inactive, ControlState::Active);
    }
}
