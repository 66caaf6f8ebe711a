use std::io::Write;

use cookie_factory::sequence::tuple;
use cookie_factory::SerializeFn;
use nom::IResult;

use crate::endianness::{gen_u32, parse_u32, ReverseByteOrder};
use crate::error::PcapError;

use super::option::option_array;

const MICROS_PER_SEC: u64 = 1_000_000;

/// Capture time of a packet, with microsecond resolution
///
/// On the wire, the timestamp is a single 64-bit count of microseconds since the Unix
/// epoch, split in two 32-bit words (high word first).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub seconds: u64,
    /// Always lower than 1_000_000 for decoded values
    pub microseconds: u64,
}

impl Timestamp {
    pub fn new(seconds: u64, microseconds: u64) -> Self {
        Timestamp {
            seconds,
            microseconds,
        }
    }

    /// Build a timestamp from the two 32-bit words found on the wire
    pub fn from_parts(high: u32, low: u32) -> Self {
        Timestamp::from_raw(((high as u64) << 32) | (low as u64))
    }

    /// Build a timestamp from a count of microseconds since the epoch
    pub fn from_raw(ts: u64) -> Self {
        Timestamp {
            seconds: ts / MICROS_PER_SEC,
            microseconds: ts % MICROS_PER_SEC,
        }
    }

    /// Count of microseconds since the epoch
    ///
    /// Wraps around if the timestamp does not fit in 64 bits.
    pub fn raw(&self) -> u64 {
        self.seconds
            .wrapping_mul(MICROS_PER_SEC)
            .wrapping_add(self.microseconds)
    }

    /// High and low 32-bit words
    pub fn to_parts(&self) -> (u32, u32) {
        let ts = self.raw();
        ((ts >> 32) as u32, ts as u32)
    }

    /// Decode an 8-byte option value (high word, then low word)
    pub(crate) fn from_option(
        field: &'static str,
        value: &[u8],
        reverse: bool,
    ) -> Result<Timestamp, PcapError> {
        let b: [u8; 8] = option_array(field, value)?;
        let high = u32::from_ne_bytes([b[0], b[1], b[2], b[3]]).reverse_byte_order(reverse);
        let low = u32::from_ne_bytes([b[4], b[5], b[6], b[7]]).reverse_byte_order(reverse);
        Ok(Timestamp::from_parts(high, low))
    }

    /// Encode as an 8-byte option value
    pub(crate) fn to_option_value(self, reverse: bool) -> Vec<u8> {
        let (high, low) = self.to_parts();
        let mut v = Vec::with_capacity(8);
        v.extend_from_slice(&high.reverse_byte_order(reverse).to_ne_bytes());
        v.extend_from_slice(&low.reverse_byte_order(reverse).to_ne_bytes());
        v
    }

    /// Interpret the raw value with another resolution and offset
    ///
    /// Resolution is in units per second (see [`build_ts_resolution`]), offset in seconds.
    /// Returns the seconds and the fractional part, in resolution units.
    pub fn decode_with_resolution(&self, ts_offset: i64, resolution: u64) -> (i64, u64) {
        let ts = self.raw();
        let resolution = resolution.max(1);
        let seconds = ts_offset.wrapping_add((ts / resolution) as i64);
        (seconds, ts % resolution)
    }
}

pub(crate) fn parse_timestamp<'a>(
    i: &'a [u8],
    reverse: bool,
) -> IResult<&'a [u8], Timestamp, PcapError> {
    let (i, high) = parse_u32(reverse)(i)?;
    let (i, low) = parse_u32(reverse)(i)?;
    Ok((i, Timestamp::from_parts(high, low)))
}

pub(crate) fn gen_timestamp<W: Write>(ts: Timestamp, reverse: bool) -> impl SerializeFn<W> {
    let (high, low) = ts.to_parts();
    tuple((gen_u32(high, reverse), gen_u32(low, reverse)))
}

/// Compute the timestamp resolution, in units per second
///
/// Return the resolution, or `None` if the resolution is invalid (for ex. greater than `2^64`)
pub fn build_ts_resolution(ts_resol: u8) -> Option<u64> {
    let ts_mode = ts_resol & 0x80;
    let unit = if ts_mode == 0 {
        // 10^if_tsresol
        // check that if_tsresol <= 19 (10^19 is the largest power of 10 to fit in a u64)
        if ts_resol > 19 {
            return None;
        }
        10u64.pow(ts_resol as u32)
    } else {
        // 2^if_tsresol
        let exp = ts_resol & 0x7f;
        if exp > 63 {
            return None;
        }
        1u64 << exp
    };
    Some(unit)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn decode_ts() {
        // from https://datatracker.ietf.org/doc/html/draft-ietf-opsawg-pcapng section 4.6 (ISB)
        // '97 c3 04 00 aa 47 ca 64', in Little Endian, decodes to 2012-06-29 07:28:25.298858 UTC.
        const INPUT: [u8; 8] = hex!("97 c3 04 00 aa 47 ca 64");
        let reverse = cfg!(target_endian = "big");
        let (rem, ts) = parse_timestamp(&INPUT, reverse).expect("parse");
        assert!(rem.is_empty());
        assert_eq!(ts.seconds, 1340954905);
        assert_eq!(ts.microseconds, 298858);
    }

    #[test]
    fn timestamp_from_words() {
        let ts = Timestamp::from_parts(1, 1);
        assert_eq!(ts.seconds, 4294);
        assert_eq!(ts.microseconds, 967297);
        assert_eq!(ts.to_parts(), (1, 1));
    }

    #[test]
    fn timestamp_words_round_trip() {
        for &(sec, usec) in &[(0, 0), (1_432_723_816, 123_456), (4_294_967_295, 999_999)] {
            let ts = Timestamp::new(sec, usec);
            let (high, low) = ts.to_parts();
            assert_eq!(Timestamp::from_parts(high, low), ts);
            for &reverse in &[false, true] {
                let v = cookie_factory::gen_simple(gen_timestamp(ts, reverse), Vec::new())
                    .expect("gen");
                assert_eq!(Timestamp::from_option("ts", &v, reverse).unwrap(), ts);
                assert_eq!(ts.to_option_value(reverse), v);
            }
        }
    }

    #[test]
    fn other_resolutions() {
        assert_eq!(build_ts_resolution(6), Some(1_000_000));
        assert_eq!(build_ts_resolution(9), Some(1_000_000_000));
        assert_eq!(build_ts_resolution(0x80 | 10), Some(1024));
        assert_eq!(build_ts_resolution(20), None);
        let ts = Timestamp::from_raw(3_500);
        assert_eq!(ts.decode_with_resolution(10, 1_000), (13, 500));
    }
}
