use std::convert::TryFrom;

use cookie_factory::combinator::slice;
use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;
use nom::bytes::streaming::take;
use nom::{Err, IResult};
use rusticata_macros::newtype_enum;

use crate::endianness::{gen_u32, parse_u32};
use crate::error::{ErrorReporter, PcapError};
use crate::packet::Packet;
use crate::serialize::{padding_for, padding_len};

use super::option::{option_string, option_u32, option_u64};
use super::time::{gen_timestamp, parse_timestamp};
use super::*;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct EnhancedPacketOptionCode(pub u16);

newtype_enum! {
impl debug EnhancedPacketOptionCode {
    EndOfOpt = 0,
    Comment = 1,
    Flags = 2,
    Hash = 3,
    DropCount = 4,
}
}

/// Options of an Enhanced Packet Block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnhancedPacketOptions {
    pub comment: Option<String>,
    pub flags: Option<PacketFlags>,
    pub hash: Option<HashValue>,
    /// Packets lost between this packet and the preceding one
    pub drop_count: Option<u64>,
}

impl OptionSchema for EnhancedPacketOptions {
    fn decode_option(&mut self, option: &PcapNGOption, reverse: bool) -> Result<bool, PcapError> {
        let value = option.value();
        match EnhancedPacketOptionCode(option.code) {
            EnhancedPacketOptionCode::Comment => {
                self.comment = Some(option_string("opt_comment", value)?)
            }
            EnhancedPacketOptionCode::Flags => {
                self.flags = Some(PacketFlags(option_u32("epb_flags", value, reverse)?))
            }
            EnhancedPacketOptionCode::Hash => self.hash = Some(HashValue::from_bytes(value)?),
            EnhancedPacketOptionCode::DropCount => {
                self.drop_count = Some(option_u64("epb_dropcount", value, reverse)?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn to_options(&self, reverse: bool) -> Vec<PcapNGOption<'_>> {
        let mut options = Vec::new();
        if let Some(ref comment) = self.comment {
            options.push(PcapNGOption::string(EnhancedPacketOptionCode::Comment.0, comment));
        }
        if let Some(flags) = self.flags {
            options.push(PcapNGOption::from_u32(
                EnhancedPacketOptionCode::Flags.0,
                flags.0,
                reverse,
            ));
        }
        if let Some(ref hash) = self.hash {
            options.push(PcapNGOption::new(EnhancedPacketOptionCode::Hash.0, hash.to_bytes()));
        }
        if let Some(count) = self.drop_count {
            options.push(PcapNGOption::from_u64(
                EnhancedPacketOptionCode::DropCount.0,
                count,
                reverse,
            ));
        }
        options
    }
}

/// An Enhanced Packet Block (EPB) is the standard container for storing the packets
/// coming from the network.
///
/// The captured length is not stored: it is the length of `data`. `packet_length` is
/// the length of the packet on the wire, which can be greater when the packet was
/// truncated by the snapshot length of the interface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnhancedPacketBlock {
    pub interface_id: u32,
    pub timestamp: Timestamp,
    /// Original (wire) length of the packet
    pub packet_length: u32,
    pub data: Vec<u8>,
    pub options: EnhancedPacketOptions,
}

impl EnhancedPacketBlock {
    pub fn new(interface_id: u32, timestamp: Timestamp, data: Vec<u8>) -> Self {
        EnhancedPacketBlock {
            interface_id,
            timestamp,
            packet_length: data.len() as u32,
            data,
            options: EnhancedPacketOptions::default(),
        }
    }

    /// Wrap a packet into a block for interface 0, without options
    pub fn from_packet<P: Packet + ?Sized>(packet: &P) -> Self {
        EnhancedPacketBlock::new(
            0,
            Timestamp::new(packet.seconds(), packet.microseconds()),
            packet.data().to_vec(),
        )
    }
}

impl Packet for EnhancedPacketBlock {
    fn seconds(&self) -> u64 {
        self.timestamp.seconds
    }
    fn microseconds(&self) -> u64 {
        self.timestamp.microseconds
    }
    fn data(&self) -> &[u8] {
        &self.data
    }
    fn to_block(&self) -> Block {
        Block::EnhancedPacket(self.clone())
    }
}

/// Read `caplen` bytes of packet data, and the padding that follows
///
/// The padding may be missing at the end of a block body.
pub(crate) fn parse_packet_data(i: &[u8], caplen: u32) -> IResult<&[u8], &[u8], PcapError> {
    let (i, data) = take(caplen as usize)(i)?;
    let pad = padding_len(caplen as usize).min(i.len());
    let (i, _) = take(pad)(i)?;
    Ok((i, data))
}

pub(crate) fn captured_length(data: &[u8]) -> Result<u32, PcapError> {
    u32::try_from(data.len())
        .map_err(|_| PcapError::Serialize(format!("packet data too long ({} bytes)", data.len())))
}

impl PcapNGBlock for EnhancedPacketBlock {
    const BLOCK_TYPE: BlockType = BlockType::EnhancedPacket;

    fn parse_body<'a>(
        i: &'a [u8],
        reverse: bool,
        errors: &mut ErrorReporter,
    ) -> IResult<&'a [u8], Self, PcapError> {
        let (i, interface_id) = parse_u32(reverse)(i)?;
        let (i, timestamp) = parse_timestamp(i, reverse)?;
        let (i, caplen) = parse_u32(reverse)(i)?;
        let (i, packet_length) = parse_u32(reverse)(i)?;
        let (i, data) = parse_packet_data(i, caplen)?;
        let (i, options) =
            EnhancedPacketOptions::parse_area(i, reverse, errors).map_err(Err::Error)?;
        let block = EnhancedPacketBlock {
            interface_id,
            timestamp,
            packet_length,
            data: data.to_vec(),
            options,
        };
        Ok((i, block))
    }

    fn body_to_vec(&self, reverse: bool) -> Result<Vec<u8>, PcapError> {
        let caplen = captured_length(&self.data)?;
        let mut v = gen_simple(
            tuple((
                gen_u32(self.interface_id, reverse),
                gen_timestamp(self.timestamp, reverse),
                gen_u32(caplen, reverse),
                gen_u32(self.packet_length, reverse),
                slice(&self.data),
                padding_for(self.data.len()),
            )),
            Vec::with_capacity(32 + self.data.len()),
        )?;
        v.extend_from_slice(&self.options.encode(reverse)?);
        Ok(v)
    }

    fn associated_interface_id(&self) -> Option<u32> {
        Some(self.interface_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::ToVec;
    use hex_literal::hex;

    const REVERSE_LE: bool = cfg!(target_endian = "big");

    // EPB on interface 0, 5 bytes of data, epb_flags 1 (inbound)
    const EPB_LE: &[u8] = &hex!(
        "06 00 00 00 34 00 00 00
         00 00 00 00 97 c3 04 00 aa 47 ca 64
         05 00 00 00 3c 00 00 00
         01 02 03 04 05 00 00 00
         02 00 04 00 01 00 00 00
         00 00 00 00
         34 00 00 00"
    );

    #[test]
    fn decode_epb() {
        let (rem, framed) = parse_framed_block(EPB_LE, REVERSE_LE, 0).expect("frame");
        assert!(rem.is_empty());
        let epb = EnhancedPacketBlock::decode(&framed, &mut ErrorReporter::fatal()).expect("decode");
        assert_eq!(epb.interface_id, 0);
        assert_eq!(epb.timestamp, Timestamp::new(1340954905, 298858));
        assert_eq!(epb.data, vec![1, 2, 3, 4, 5]);
        assert_eq!(epb.packet_length, 60);
        let flags = epb.options.flags.expect("flags");
        assert!(flags.inbound());
        assert!(!flags.outbound());
        assert_eq!(epb.associated_interface_id(), Some(0));
        let v = Block::from(epb).to_vec(REVERSE_LE).expect("serialize");
        assert_eq!(&v[..], EPB_LE);
    }

    #[test]
    fn epb_round_trip() {
        let epb = EnhancedPacketBlock {
            interface_id: 3,
            timestamp: Timestamp::new(1_432_723_816, 123_456),
            packet_length: 1514,
            data: (0..=255).collect(),
            options: EnhancedPacketOptions {
                comment: Some("truncated".to_string()),
                flags: Some(PacketFlags(0x0100_0006)),
                hash: Some(HashValue::new(HashAlgorithm::Crc32, vec![0xde, 0xad, 0xbe, 0xef])),
                drop_count: Some(42),
            },
        };
        for &reverse in &[false, true] {
            let framed = epb.encode(reverse).expect("encode");
            let decoded =
                EnhancedPacketBlock::decode(&framed, &mut ErrorReporter::fatal()).expect("decode");
            assert_eq!(decoded, epb);
        }
    }

    #[test]
    fn bad_hash_is_dropped() {
        let raw = vec![PcapNGOption::new(3, vec![2]), PcapNGOption::from_u64(4, 7, false)];
        let v = options_to_vec(&raw, false).expect("serialize");
        let mut count = 0;
        let mut handler = |_e: PcapError| count += 1;
        let (_, options) =
            EnhancedPacketOptions::parse_area(&v, false, &mut ErrorReporter::new(&mut handler))
                .expect("parse");
        assert_eq!(options.hash, None);
        assert_eq!(options.drop_count, Some(7));
        assert_eq!(count, 1);
    }

    #[test]
    fn from_raw_packet() {
        let packet = crate::packet::RawPacket::new(10, 20, vec![0xaa; 7]);
        let epb = EnhancedPacketBlock::from_packet(&packet);
        assert_eq!(epb.interface_id, 0);
        assert_eq!(epb.seconds(), 10);
        assert_eq!(epb.microseconds(), 20);
        assert_eq!(epb.packet_length, 7);
        assert_eq!(epb.options, EnhancedPacketOptions::default());
        assert_eq!(packet.to_block(), Block::EnhancedPacket(epb));
    }
}
