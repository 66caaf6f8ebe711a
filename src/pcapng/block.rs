use std::io::{Read, Seek};

use nom::IResult;

use crate::error::{finish, ErrorReporter, PcapError};
use crate::packet::Packet;
use crate::serialize::ToVec;

use super::*;

/// Common interface of all block types: conversion between a typed block and the body
/// of a [`FramedBlock`]
pub trait PcapNGBlock: Sized {
    const BLOCK_TYPE: BlockType;

    /// Parse a block body (without envelope)
    ///
    /// Field and option level errors are given to `errors`.
    fn parse_body<'a>(
        i: &'a [u8],
        reverse: bool,
        errors: &mut ErrorReporter,
    ) -> IResult<&'a [u8], Self, PcapError>;

    /// Serialize the block body (without envelope)
    fn body_to_vec(&self, reverse: bool) -> Result<Vec<u8>, PcapError>;

    /// Index of the interface this block belongs to, if any
    fn associated_interface_id(&self) -> Option<u32> {
        None
    }

    /// Decode a framed block, using the byte order it was framed with
    fn decode(framed: &FramedBlock, errors: &mut ErrorReporter) -> Result<Self, PcapError> {
        let (_, block) = finish(
            Self::parse_body(&framed.body, framed.reverse_byte_order, errors),
            framed.position,
        )?;
        Ok(block)
    }

    /// Encode the block into an envelope
    fn encode(&self, reverse: bool) -> Result<FramedBlock, PcapError> {
        let body = self.body_to_vec(reverse)?;
        Ok(FramedBlock::new(Self::BLOCK_TYPE, body, reverse))
    }
}

/// A block from a PcapNG file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    SectionHeader(SectionHeaderBlock),
    InterfaceDescription(InterfaceDescriptionBlock),
    EnhancedPacket(EnhancedPacketBlock),
    Packet(PacketBlock),
    SimplePacket(SimplePacketBlock),
    NameResolution(NameResolutionBlock),
    InterfaceStatistics(InterfaceStatisticsBlock),
}

impl Block {
    /// Returns true if blocks contains a network packet
    pub fn is_data_block(&self) -> bool {
        matches!(
            self,
            &Block::EnhancedPacket(_) | &Block::Packet(_) | &Block::SimplePacket(_)
        )
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Block::SectionHeader(_) => BlockType::SectionHeader,
            Block::InterfaceDescription(_) => BlockType::InterfaceDescription,
            Block::EnhancedPacket(_) => BlockType::EnhancedPacket,
            Block::Packet(_) => BlockType::Packet,
            Block::SimplePacket(_) => BlockType::SimplePacket,
            Block::NameResolution(_) => BlockType::NameResolution,
            Block::InterfaceStatistics(_) => BlockType::InterfaceStatistics,
        }
    }

    /// Index of the interface the block belongs to
    ///
    /// Packet blocks return the interface they were captured on. Simple Packet blocks
    /// always belong to the first interface.
    pub fn associated_interface_id(&self) -> Option<u32> {
        match self {
            Block::SectionHeader(b) => b.associated_interface_id(),
            Block::InterfaceDescription(b) => b.associated_interface_id(),
            Block::EnhancedPacket(b) => b.associated_interface_id(),
            Block::Packet(b) => b.associated_interface_id(),
            Block::SimplePacket(b) => b.associated_interface_id(),
            Block::NameResolution(b) => b.associated_interface_id(),
            Block::InterfaceStatistics(b) => b.associated_interface_id(),
        }
    }

    /// Return the packet view of data blocks
    pub fn as_packet(&self) -> Option<&dyn Packet> {
        match self {
            Block::EnhancedPacket(b) => Some(b),
            Block::Packet(b) => Some(b),
            Block::SimplePacket(b) => Some(b),
            _ => None,
        }
    }

    /// Decode a framed block
    pub fn decode(framed: &FramedBlock, errors: &mut ErrorReporter) -> Result<Block, PcapError> {
        let block = match framed.block_type {
            BlockType::SectionHeader => {
                Block::SectionHeader(SectionHeaderBlock::decode(framed, errors)?)
            }
            BlockType::InterfaceDescription => {
                Block::InterfaceDescription(InterfaceDescriptionBlock::decode(framed, errors)?)
            }
            BlockType::EnhancedPacket => {
                Block::EnhancedPacket(EnhancedPacketBlock::decode(framed, errors)?)
            }
            BlockType::Packet => Block::Packet(PacketBlock::decode(framed, errors)?),
            BlockType::SimplePacket => {
                Block::SimplePacket(SimplePacketBlock::decode(framed, errors)?)
            }
            BlockType::NameResolution => {
                Block::NameResolution(NameResolutionBlock::decode(framed, errors)?)
            }
            BlockType::InterfaceStatistics => {
                Block::InterfaceStatistics(InterfaceStatisticsBlock::decode(framed, errors)?)
            }
            other => {
                return Err(PcapError::UnrecognizedBlockType {
                    block_type: other.0,
                    offset: framed.position,
                })
            }
        };
        Ok(block)
    }

    /// Encode the block into an envelope
    pub fn encode(&self, reverse: bool) -> Result<FramedBlock, PcapError> {
        match self {
            Block::SectionHeader(b) => b.encode(reverse),
            Block::InterfaceDescription(b) => b.encode(reverse),
            Block::EnhancedPacket(b) => b.encode(reverse),
            Block::Packet(b) => b.encode(reverse),
            Block::SimplePacket(b) => b.encode(reverse),
            Block::NameResolution(b) => b.encode(reverse),
            Block::InterfaceStatistics(b) => b.encode(reverse),
        }
    }
}

impl ToVec for Block {
    fn to_vec(&self, reverse_byte_order: bool) -> Result<Vec<u8>, PcapError> {
        self.encode(reverse_byte_order)?.to_vec(reverse_byte_order)
    }
}

macro_rules! block_from {
    ($variant:ident, $t:ty) => {
        impl From<$t> for Block {
            fn from(b: $t) -> Block {
                Block::$variant(b)
            }
        }
    };
}

block_from!(SectionHeader, SectionHeaderBlock);
block_from!(InterfaceDescription, InterfaceDescriptionBlock);
block_from!(EnhancedPacket, EnhancedPacketBlock);
block_from!(Packet, PacketBlock);
block_from!(SimplePacket, SimplePacketBlock);
block_from!(NameResolution, NameResolutionBlock);
block_from!(InterfaceStatistics, InterfaceStatisticsBlock);

/// Read and decode the next block of a stream
///
/// The stream must be positioned at a block boundary. Framing errors are returned;
/// errors inside the block body are given to `errors`.
pub fn read_next_block<R: Read + Seek>(
    reader: &mut R,
    reverse_byte_order: bool,
    errors: &mut ErrorReporter,
) -> Result<Block, PcapError> {
    let framed = read_framed_block(reader, reverse_byte_order)?;
    Block::decode(&framed, errors)
}

/// Parse one block from a byte slice
///
/// `offset` is the position of `i` in its stream, used for error reporting. Returns the
/// remaining bytes and the block.
pub fn parse_block<'a>(
    i: &'a [u8],
    reverse_byte_order: bool,
    offset: u64,
    errors: &mut ErrorReporter,
) -> Result<(&'a [u8], Block), PcapError> {
    let (rem, framed) = finish(parse_framed_block(i, reverse_byte_order, offset), offset)?;
    let block = Block::decode(&framed, errors)?;
    Ok((rem, block))
}
