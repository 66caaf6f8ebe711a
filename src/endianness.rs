//! Byte-order handling
//!
//! Every multi-byte field of a pcap-ng stream is read in native order and then passed
//! through [`ReverseByteOrder`], using a single flag that is fixed for the whole stream.
//! Writers do the opposite: the value is reversed first, then written in native order.

use std::io::Write;

use cookie_factory::bytes::{ne_i32, ne_i64, ne_u16, ne_u32, ne_u64};
use cookie_factory::SerializeFn;
use nom::number::{streaming, Endianness};
use nom::IResult;

use crate::error::PcapError;

/// Conditionally reverse the byte order of a fixed-width integer
pub trait ReverseByteOrder: Sized {
    /// Return the value with its bytes reversed if `reverse` is true, or unchanged
    fn reverse_byte_order(self, reverse: bool) -> Self;
}

macro_rules! impl_reverse_byte_order {
    ($($t:ty),*) => {
        $(
            impl ReverseByteOrder for $t {
                #[inline]
                fn reverse_byte_order(self, reverse: bool) -> Self {
                    if reverse {
                        self.swap_bytes()
                    } else {
                        self
                    }
                }
            }
        )*
    };
}

impl_reverse_byte_order!(i16, u16, i32, u32, i64, u64);

macro_rules! reversible_parser {
    ($name:ident, $parser:ident, $t:ty) => {
        #[inline]
        pub fn $name<'a>(
            reverse: bool,
        ) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], $t, PcapError> {
            move |i: &'a [u8]| {
                let (i, v) = streaming::$parser(Endianness::Native)(i)?;
                Ok((i, v.reverse_byte_order(reverse)))
            }
        }
    };
}

reversible_parser!(parse_u16, u16, u16);
reversible_parser!(parse_i16, i16, i16);
reversible_parser!(parse_u32, u32, u32);
reversible_parser!(parse_i32, i32, i32);
reversible_parser!(parse_u64, u64, u64);
reversible_parser!(parse_i64, i64, i64);

#[inline]
pub fn gen_u16<W: Write>(v: u16, reverse: bool) -> impl SerializeFn<W> {
    ne_u16(v.reverse_byte_order(reverse))
}

#[inline]
pub fn gen_i16<W: Write>(v: i16, reverse: bool) -> impl SerializeFn<W> {
    gen_u16(v as u16, reverse)
}

#[inline]
pub fn gen_u32<W: Write>(v: u32, reverse: bool) -> impl SerializeFn<W> {
    ne_u32(v.reverse_byte_order(reverse))
}

#[inline]
pub fn gen_i32<W: Write>(v: i32, reverse: bool) -> impl SerializeFn<W> {
    ne_i32(v.reverse_byte_order(reverse))
}

#[inline]
pub fn gen_u64<W: Write>(v: u64, reverse: bool) -> impl SerializeFn<W> {
    ne_u64(v.reverse_byte_order(reverse))
}

#[inline]
pub fn gen_i64<W: Write>(v: i64, reverse: bool) -> impl SerializeFn<W> {
    ne_i64(v.reverse_byte_order(reverse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn reverse_matches_byte_reversal() {
        let v: u32 = 0x1A2B_3C4D;
        let mut bytes = v.to_ne_bytes();
        bytes.reverse();
        assert_eq!(v.reverse_byte_order(true), u32::from_ne_bytes(bytes));
        assert_eq!(v.reverse_byte_order(false), v);
        assert_eq!((-2i16).reverse_byte_order(true), i16::from_be_bytes([0xfe, 0xff]));
        assert_eq!(
            0x0102_0304_0506_0708u64.reverse_byte_order(true),
            0x0807_0605_0403_0201
        );
        assert_eq!(1i64.reverse_byte_order(true).reverse_byte_order(true), 1);
    }

    #[test]
    fn parse_reversed() {
        let input = hex!("0a 0d 0d 0a 01 02");
        let (rem, magic) = parse_u32(false)(&input[..]).expect("parse");
        assert_eq!(magic, 0x0A0D_0D0A);
        let (rem, v) = parse_u16(true)(rem).expect("parse");
        assert!(rem.is_empty());
        assert_eq!(v, u16::from_ne_bytes([2, 1]));
        assert!(matches!(
            parse_u64(false)(&input[..]),
            Err(nom::Err::Incomplete(_))
        ));
    }

    #[test]
    fn gen_reversed() {
        let v = cookie_factory::gen_simple(gen_u32(0x1122_3344, true), Vec::new()).expect("gen");
        assert_eq!(v, 0x1122_3344u32.swap_bytes().to_ne_bytes());
    }
}
