/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of Z80CHIPS, a Rust library for emulating Zilog Z80 peripheral chips.

    For the full copyright notice, see the lib.rs file.
*/
//! Helper macros for chip register types built with [bitflags].

/// Implements register conversions for a [bitflags] type backed by `u8`.
///
/// Creates:
///
/// * `fn from_data(data: u8) -> Self` truncating the undefined bits,
/// * `From<u8>` for the flags type, using `from_data`,
/// * `From<flags type>` for `u8`.
///
/// The conversions make the type usable with `serde(from = "u8", into = "u8")`.
#[macro_export]
macro_rules! register_flags_conv {
    ($bitflags:ty) => {
        impl $bitflags {
            /// Creates flags from the raw register `data`, truncating undefined bits.
            #[inline]
            pub fn from_data(data: u8) -> Self {
                <$bitflags>::from_bits_retain(data) & <$bitflags>::all()
            }
        }

        impl From<u8> for $bitflags {
            #[inline]
            fn from(data: u8) -> Self {
                <$bitflags>::from_data(data)
            }
        }

        impl From<$bitflags> for u8 {
            #[inline]
            fn from(flags: $bitflags) -> u8 {
                flags.bits()
            }
        }
    };
}

/// Defines multi-bit mask constants on a [bitflags] type without registering them as flags.
///
/// ```
/// use bitflags::bitflags;
/// use z80chips_core::register_masks;
///
/// bitflags! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub struct Control: u8 {
///         const BIT6 = 0b0100_0000;
///         const BIT7 = 0b1000_0000;
///     }
/// }
/// register_masks!(Control {
///     pub const FIELD = BIT7|BIT6;
/// });
/// assert_eq!(Control::FIELD.bits(), 0b1100_0000);
/// ```
#[macro_export]
macro_rules! register_masks {
    (@ pub const $mask:ident = $($flag:ident)|*;) => {
        pub const $mask: Self = Self::from_bits_retain($(Self::$flag.bits())|*);
    };
    (@#[doc = $doc:expr] pub const $mask:ident = $($flag:ident)|*;) => {
        #[doc = $doc] pub const $mask: Self = Self::from_bits_retain($(Self::$flag.bits())|*);
    };
    ($bitflags:ty {$($(#[doc = $doc:expr])? pub const $mask:ident = $($flag:ident)|*;)*}) => {
        impl $bitflags {$(
            $crate::register_masks!(@$(#[doc = $doc])? pub const $mask = $($flag)|*;);
        )*}
    };
}

/// Asserts that every bit of a register flags type up to `$nbits` is defined and
/// that each defined flag consists of a single bit.
///
/// Intended for unit tests.
#[macro_export]
macro_rules! assert_register_single_bits {
    ($ty:ty, $nbits:expr) => {{
        let mut last = 0;
        for f in <$ty as bitflags::Flags>::FLAGS.iter() {
            let bits = f.value().bits();
            assert!(bits.is_power_of_two(), "{} is not a single bit", f.name());
            assert!(bits > last, "{} is out of order", f.name());
            last = bits;
        }
        let all: u16 = (1u16 << $nbits) - 1;
        assert_eq!(u16::from(<$ty>::all().bits()), all);
    }};
}
