use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;
use nom::IResult;
use rusticata_macros::newtype_enum;

use crate::endianness::{gen_u16, gen_u32, parse_u16, parse_u32};
use crate::error::{ErrorReporter, PcapError};
use crate::linktype::Linktype;

use super::option::{option_array, option_i32, option_i64, option_string, option_u64, option_u8};
use super::*;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct InterfaceDescriptionOptionCode(pub u16);

newtype_enum! {
impl debug InterfaceDescriptionOptionCode {
    EndOfOpt = 0,
    Comment = 1,
    Name = 2,
    Description = 3,
    Ipv4Address = 4,
    Ipv6Address = 5,
    MacAddress = 6,
    EuiAddress = 7,
    Speed = 8,
    TimestampResolution = 9,
    TimeZone = 10,
    Filter = 11,
    OperatingSystem = 12,
    FrameCheckSequence = 13,
    TimeOffsetSeconds = 14,
}
}

/// Options of an Interface Description Block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceDescriptionOptions {
    pub comment: Option<String>,
    /// Name of the device used to capture data
    pub name: Option<String>,
    pub description: Option<String>,
    pub ipv4_address: Option<Ipv4AddressMask>,
    pub ipv6_address: Option<Ipv6AddressPrefix>,
    pub mac_address: Option<[u8; 6]>,
    pub eui_address: Option<[u8; 8]>,
    /// Interface speed, in bits per second
    pub speed: Option<u64>,
    /// Resolution of timestamps (see [`build_ts_resolution`])
    pub timestamp_resolution: Option<u8>,
    pub time_zone: Option<i32>,
    /// Filter used to capture traffic, first byte is the filter type
    pub filter: Option<Vec<u8>>,
    pub operating_system: Option<String>,
    /// Length of the Frame Check Sequence, in bits
    pub frame_check_sequence: Option<u8>,
    /// Offset in seconds added to every timestamp of the interface
    pub time_offset_seconds: Option<i64>,
}

impl OptionSchema for InterfaceDescriptionOptions {
    fn decode_option(&mut self, option: &PcapNGOption, reverse: bool) -> Result<bool, PcapError> {
        let value = option.value();
        match InterfaceDescriptionOptionCode(option.code) {
            InterfaceDescriptionOptionCode::Comment => {
                self.comment = Some(option_string("opt_comment", value)?)
            }
            InterfaceDescriptionOptionCode::Name => {
                self.name = Some(option_string("if_name", value)?)
            }
            InterfaceDescriptionOptionCode::Description => {
                self.description = Some(option_string("if_description", value)?)
            }
            InterfaceDescriptionOptionCode::Ipv4Address => {
                self.ipv4_address = Some(Ipv4AddressMask::from_bytes("if_IPv4addr", value)?)
            }
            InterfaceDescriptionOptionCode::Ipv6Address => {
                self.ipv6_address = Some(Ipv6AddressPrefix::from_bytes("if_IPv6addr", value)?)
            }
            InterfaceDescriptionOptionCode::MacAddress => {
                self.mac_address = Some(option_array("if_MACaddr", value)?)
            }
            InterfaceDescriptionOptionCode::EuiAddress => {
                self.eui_address = Some(option_array("if_EUIaddr", value)?)
            }
            InterfaceDescriptionOptionCode::Speed => {
                self.speed = Some(option_u64("if_speed", value, reverse)?)
            }
            InterfaceDescriptionOptionCode::TimestampResolution => {
                self.timestamp_resolution = Some(option_u8("if_tsresol", value)?)
            }
            InterfaceDescriptionOptionCode::TimeZone => {
                self.time_zone = Some(option_i32("if_tzone", value, reverse)?)
            }
            InterfaceDescriptionOptionCode::Filter => self.filter = Some(value.to_vec()),
            InterfaceDescriptionOptionCode::OperatingSystem => {
                self.operating_system = Some(option_string("if_os", value)?)
            }
            InterfaceDescriptionOptionCode::FrameCheckSequence => {
                self.frame_check_sequence = Some(option_u8("if_fcslen", value)?)
            }
            InterfaceDescriptionOptionCode::TimeOffsetSeconds => {
                self.time_offset_seconds = Some(option_i64("if_tsoffset", value, reverse)?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn to_options(&self, reverse: bool) -> Vec<PcapNGOption<'_>> {
        type Code = InterfaceDescriptionOptionCode;
        let mut options = Vec::new();
        if let Some(ref s) = self.comment {
            options.push(PcapNGOption::string(Code::Comment.0, s));
        }
        if let Some(ref s) = self.name {
            options.push(PcapNGOption::string(Code::Name.0, s));
        }
        if let Some(ref s) = self.description {
            options.push(PcapNGOption::string(Code::Description.0, s));
        }
        if let Some(addr) = self.ipv4_address {
            options.push(PcapNGOption::new(Code::Ipv4Address.0, addr.to_bytes()));
        }
        if let Some(addr) = self.ipv6_address {
            options.push(PcapNGOption::new(Code::Ipv6Address.0, addr.to_bytes()));
        }
        if let Some(ref mac) = self.mac_address {
            options.push(PcapNGOption::new(Code::MacAddress.0, &mac[..]));
        }
        if let Some(ref eui) = self.eui_address {
            options.push(PcapNGOption::new(Code::EuiAddress.0, &eui[..]));
        }
        if let Some(speed) = self.speed {
            options.push(PcapNGOption::from_u64(Code::Speed.0, speed, reverse));
        }
        if let Some(tsresol) = self.timestamp_resolution {
            options.push(PcapNGOption::from_u8(Code::TimestampResolution.0, tsresol));
        }
        if let Some(tzone) = self.time_zone {
            options.push(PcapNGOption::from_i32(Code::TimeZone.0, tzone, reverse));
        }
        if let Some(ref filter) = self.filter {
            options.push(PcapNGOption::new(Code::Filter.0, &filter[..]));
        }
        if let Some(ref s) = self.operating_system {
            options.push(PcapNGOption::string(Code::OperatingSystem.0, s));
        }
        if let Some(fcslen) = self.frame_check_sequence {
            options.push(PcapNGOption::from_u8(Code::FrameCheckSequence.0, fcslen));
        }
        if let Some(offset) = self.time_offset_seconds {
            options.push(PcapNGOption::from_i64(Code::TimeOffsetSeconds.0, offset, reverse));
        }
        options
    }
}

/// An Interface Description Block (IDB) is the container for information
/// describing an interface on which packet data is captured.
///
/// Interfaces are numbered by order of appearance in their section, starting at 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceDescriptionBlock {
    pub linktype: Linktype,
    /// Maximum number of bytes stored for each packet of this interface
    pub snaplen: u32,
    pub options: InterfaceDescriptionOptions,
}

impl Default for InterfaceDescriptionBlock {
    fn default() -> Self {
        InterfaceDescriptionBlock::new(Linktype::ETHERNET, 65535)
    }
}

impl InterfaceDescriptionBlock {
    pub fn new(linktype: Linktype, snaplen: u32) -> Self {
        InterfaceDescriptionBlock {
            linktype,
            snaplen,
            options: InterfaceDescriptionOptions::default(),
        }
    }

    /// Decode the interface time resolution, in units per second
    ///
    /// The default resolution is microseconds. Return `None` if the resolution is invalid
    /// (for ex. greater than `2^64`)
    #[inline]
    pub fn ts_resolution(&self) -> Option<u64> {
        build_ts_resolution(self.options.timestamp_resolution.unwrap_or(6))
    }

    /// Return the interface timestamp offset, in seconds
    #[inline]
    pub fn ts_offset(&self) -> i64 {
        self.options.time_offset_seconds.unwrap_or(0)
    }
}

impl PcapNGBlock for InterfaceDescriptionBlock {
    const BLOCK_TYPE: BlockType = BlockType::InterfaceDescription;

    fn parse_body<'a>(
        i: &'a [u8],
        reverse: bool,
        errors: &mut ErrorReporter,
    ) -> IResult<&'a [u8], Self, PcapError> {
        let (i, linktype) = parse_u16(reverse)(i)?;
        let (i, _reserved) = parse_u16(reverse)(i)?;
        let (i, snaplen) = parse_u32(reverse)(i)?;
        let (i, options) =
            InterfaceDescriptionOptions::parse_area(i, reverse, errors).map_err(nom::Err::Error)?;
        let block = InterfaceDescriptionBlock {
            linktype: Linktype(linktype),
            snaplen,
            options,
        };
        Ok((i, block))
    }

    fn body_to_vec(&self, reverse: bool) -> Result<Vec<u8>, PcapError> {
        let mut v = gen_simple(
            tuple((
                gen_u16(self.linktype.0, reverse),
                gen_u16(0, reverse),
                gen_u32(self.snaplen, reverse),
            )),
            Vec::with_capacity(64),
        )?;
        v.extend_from_slice(&self.options.encode(reverse)?);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn full_options() -> InterfaceDescriptionOptions {
        InterfaceDescriptionOptions {
            comment: Some("Test Comment".to_string()),
            name: Some("eth0".to_string()),
            description: Some("Test description".to_string()),
            ipv4_address: Some(Ipv4AddressMask::new(
                Ipv4Addr::new(127, 0, 0, 1),
                Ipv4Addr::new(255, 255, 255, 0),
            )),
            ipv6_address: Some(Ipv6AddressPrefix::new(
                Ipv6Addr::new(0x2001, 0x0ddb, 0, 0, 0, 0, 0x1428, 0x57ab),
                64,
            )),
            mac_address: Some([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]),
            eui_address: Some([0x02, 0x34, 0x56, 0xFF, 0xFE, 0x78, 0x9A, 0xBC]),
            speed: Some(12_345_678),
            timestamp_resolution: Some(6),
            time_zone: Some(-3600),
            filter: Some(vec![0x00, b't', b'c', b'p']),
            operating_system: Some("Linux".to_string()),
            frame_check_sequence: Some(32),
            time_offset_seconds: Some(1234),
        }
    }

    #[test]
    fn idb_options_round_trip() {
        let options = full_options();
        for &reverse in &[false, true] {
            let v = options.encode(reverse).expect("serialize");
            let (rem, decoded) =
                InterfaceDescriptionOptions::parse_area(&v, reverse, &mut ErrorReporter::fatal())
                    .expect("parse");
            assert!(rem.is_empty());
            assert_eq!(decoded, options);
        }
    }

    #[test]
    fn absent_options_stay_absent() {
        let options = InterfaceDescriptionOptions {
            name: Some("lo".to_string()),
            ..Default::default()
        };
        let v = options.encode(false).expect("serialize");
        let (_, decoded) =
            InterfaceDescriptionOptions::parse_area(&v, false, &mut ErrorReporter::fatal())
                .expect("parse");
        assert_eq!(decoded.name.as_deref(), Some("lo"));
        assert_eq!(decoded.timestamp_resolution, None);
        assert_eq!(decoded.speed, None);
        assert_eq!(decoded, options);
    }

    #[test]
    fn invalid_option_length_is_reported() {
        // if_speed with 4 bytes, then if_name
        let raw = vec![
            PcapNGOption::new(8, vec![1, 2, 3, 4]),
            PcapNGOption::string(2, "eth1"),
        ];
        let v = options_to_vec(&raw, false).expect("serialize");
        let mut seen = Vec::new();
        let mut handler = |e: PcapError| seen.push(e);
        let mut errors = ErrorReporter::new(&mut handler);
        let (_, decoded) =
            InterfaceDescriptionOptions::parse_area(&v, false, &mut errors).expect("parse");
        drop(errors);
        assert_eq!(decoded.speed, None);
        assert_eq!(decoded.name.as_deref(), Some("eth1"));
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].to_string(),
            "if_speed contains invalid length. Received: 4 bytes, expected: 8"
        );
        // no handler: the error is fatal
        let res = InterfaceDescriptionOptions::parse_area(&v, false, &mut ErrorReporter::fatal());
        assert!(res.is_err());
    }

    #[test]
    fn idb_block_round_trip() {
        let idb = InterfaceDescriptionBlock {
            linktype: Linktype::IEEE802_11_RADIOTAP,
            snaplen: 262_144,
            options: full_options(),
        };
        for &reverse in &[false, true] {
            let framed = idb.encode(reverse).expect("encode");
            assert_eq!(framed.block_type, BlockType::InterfaceDescription);
            let decoded =
                InterfaceDescriptionBlock::decode(&framed, &mut ErrorReporter::fatal()).expect("decode");
            assert_eq!(decoded, idb);
        }
        assert_eq!(idb.ts_resolution(), Some(1_000_000));
        assert_eq!(idb.ts_offset(), 1234);
        assert_eq!(InterfaceDescriptionBlock::default().ts_resolution(), Some(1_000_000));
    }

    #[test]
    fn unknown_linktype_is_kept() {
        let idb = InterfaceDescriptionBlock::new(Linktype(4321), 1500);
        let framed = idb.encode(false).expect("encode");
        let decoded =
            InterfaceDescriptionBlock::decode(&framed, &mut ErrorReporter::fatal()).expect("decode");
        assert_eq!(decoded.linktype, Linktype(4321));
    }
}
