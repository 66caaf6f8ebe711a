use cookie_factory::combinator::slice;
use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;
use nom::{Err, IResult};
use rusticata_macros::newtype_enum;

use crate::endianness::{gen_u16, gen_u32, parse_u16, parse_u32};
use crate::error::{ErrorReporter, PcapError};
use crate::packet::Packet;
use crate::serialize::padding_for;

use super::enhanced_packet::{captured_length, parse_packet_data};
use super::option::{option_string, option_u32};
use super::time::{gen_timestamp, parse_timestamp};
use super::*;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct PacketOptionCode(pub u16);

newtype_enum! {
impl debug PacketOptionCode {
    EndOfOpt = 0,
    Comment = 1,
    Flags = 2,
    Hash = 3,
}
}

/// Options of a (legacy) Packet Block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PacketOptions {
    pub comment: Option<String>,
    pub flags: Option<PacketFlags>,
    pub hash: Option<HashValue>,
}

impl OptionSchema for PacketOptions {
    fn decode_option(&mut self, option: &PcapNGOption, reverse: bool) -> Result<bool, PcapError> {
        let value = option.value();
        match PacketOptionCode(option.code) {
            PacketOptionCode::Comment => self.comment = Some(option_string("opt_comment", value)?),
            PacketOptionCode::Flags => {
                self.flags = Some(PacketFlags(option_u32("pack_flags", value, reverse)?))
            }
            PacketOptionCode::Hash => self.hash = Some(HashValue::from_bytes(value)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn to_options(&self, reverse: bool) -> Vec<PcapNGOption<'_>> {
        let mut options = Vec::new();
        if let Some(ref comment) = self.comment {
            options.push(PcapNGOption::string(PacketOptionCode::Comment.0, comment));
        }
        if let Some(flags) = self.flags {
            options.push(PcapNGOption::from_u32(PacketOptionCode::Flags.0, flags.0, reverse));
        }
        if let Some(ref hash) = self.hash {
            options.push(PcapNGOption::new(PacketOptionCode::Hash.0, hash.to_bytes()));
        }
        options
    }
}

/// The Packet Block is obsolete, and replaced by the Enhanced Packet Block. It is
/// decoded and encoded for compatibility with old files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PacketBlock {
    pub interface_id: u16,
    /// Packets dropped by the interface since the previous packet
    pub drop_count: u16,
    pub timestamp: Timestamp,
    pub packet_length: u32,
    pub data: Vec<u8>,
    pub options: PacketOptions,
}

impl Packet for PacketBlock {
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
        Block::Packet(self.clone())
    }
}

impl PcapNGBlock for PacketBlock {
    const BLOCK_TYPE: BlockType = BlockType::Packet;

    fn parse_body<'a>(
        i: &'a [u8],
        reverse: bool,
        errors: &mut ErrorReporter,
    ) -> IResult<&'a [u8], Self, PcapError> {
        let (i, interface_id) = parse_u16(reverse)(i)?;
        let (i, drop_count) = parse_u16(reverse)(i)?;
        let (i, timestamp) = parse_timestamp(i, reverse)?;
        let (i, caplen) = parse_u32(reverse)(i)?;
        let (i, packet_length) = parse_u32(reverse)(i)?;
        let (i, data) = parse_packet_data(i, caplen)?;
        let (i, options) = PacketOptions::parse_area(i, reverse, errors).map_err(Err::Error)?;
        let block = PacketBlock {
            interface_id,
            drop_count,
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
                gen_u16(self.interface_id, reverse),
                gen_u16(self.drop_count, reverse),
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
        Some(u32::from(self.interface_id))
    }
}
