use cookie_factory::combinator::slice;
use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;
use nom::bytes::streaming::take;
use nom::IResult;

use crate::endianness::{gen_u32, parse_u32};
use crate::error::{ErrorReporter, PcapError};
use crate::packet::Packet;
use crate::serialize::padding_for;

use super::*;

/// The Simple Packet Block (SPB) is a lightweight container for storing the packets
/// coming from the network.
///
/// This block does not carry an interface id (the packet belongs to the first interface
/// of the section), a timestamp or options. Since the captured length is not stored
/// either, `data` always holds `packet_length` bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimplePacketBlock {
    /// Original (wire) length of the packet
    pub packet_length: u32,
    pub data: Vec<u8>,
}

impl SimplePacketBlock {
    pub fn new(data: Vec<u8>) -> Self {
        SimplePacketBlock {
            packet_length: data.len() as u32,
            data,
        }
    }
}

impl Packet for SimplePacketBlock {
    fn seconds(&self) -> u64 {
        0
    }
    fn microseconds(&self) -> u64 {
        0
    }
    fn data(&self) -> &[u8] {
        &self.data
    }
    fn to_block(&self) -> Block {
        Block::SimplePacket(self.clone())
    }
}

impl PcapNGBlock for SimplePacketBlock {
    const BLOCK_TYPE: BlockType = BlockType::SimplePacket;

    /// The captured length is not stored: the body holds exactly `packet_length` bytes
    /// of data, followed by padding. A shorter body is reported as truncated.
    fn parse_body<'a>(
        i: &'a [u8],
        reverse: bool,
        _errors: &mut ErrorReporter,
    ) -> IResult<&'a [u8], Self, PcapError> {
        let (i, packet_length) = parse_u32(reverse)(i)?;
        let (i, data) = take(packet_length as usize)(i)?;
        let (i, _padding) = take(i.len())(i)?;
        let block = SimplePacketBlock {
            packet_length,
            data: data.to_vec(),
        };
        Ok((i, block))
    }

    fn body_to_vec(&self, reverse: bool) -> Result<Vec<u8>, PcapError> {
        if self.data.len() != self.packet_length as usize {
            return Err(PcapError::Serialize(format!(
                "simple packet data has {} bytes, packet length is {}",
                self.data.len(),
                self.packet_length
            )));
        }
        let v = gen_simple(
            tuple((
                gen_u32(self.packet_length, reverse),
                slice(&self.data),
                padding_for(self.data.len()),
            )),
            Vec::with_capacity(8 + self.data.len()),
        )?;
        Ok(v)
    }

    fn associated_interface_id(&self) -> Option<u32> {
        Some(0)
    }
}
