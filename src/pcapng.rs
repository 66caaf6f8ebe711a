//! PCAPNG file format
//!
//! See <https://github.com/pcapng/pcapng> for details.
//!
//! ## File format
//!
//! A capture file is organized in blocks. Every block uses the same envelope:
//!
//! ```text
//! u32 block type | u32 total length | body | padding | u32 total length
//! ```
//!
//! Blocks are organized in sections, each section starting with a Section Header Block
//! (SHB) followed by the Interface Description Blocks (IDB) of the section, then by
//! packet and metadata blocks. Most blocks end with a list of options, encoded as
//! `u16 code | u16 length | value | padding` and terminated by a zero code.
//!
//! ## Layers
//!
//! - [`FramedBlock`] handles the envelope only ([`parse_framed_block`],
//!   [`read_framed_block`]);
//! - [`PcapNGOption`] and [`OptionSchema`] handle the generic options area;
//! - each block type has its own struct, and [`Block`] is the sum of all of them
//!   ([`read_next_block`], [`parse_block`]);
//! - [`PcapNGReader`](crate::PcapNGReader) and [`PcapNGWriter`](crate::PcapNGWriter)
//!   track section headers and interfaces on top of the blocks.
//!
//! ## Endianness
//!
//! The byte order of a stream is given when the reader is created, and is used for all
//! the blocks of the stream. When writing, each section is written with the byte order
//! recorded in its Section Header Block.

use rusticata_macros::newtype_enum;

mod address;
mod block;
mod enhanced_packet;
mod flags;
mod frame;
mod hash;
mod interface_description;
mod interface_statistics;
mod name_resolution;
mod option;
mod packet_block;
mod reader;
mod section;
mod section_header;
mod simple_packet;
mod time;
mod writer;

pub use address::*;
pub use block::*;
pub use enhanced_packet::*;
pub use flags::*;
pub use frame::*;
pub use hash::*;
pub use interface_description::*;
pub use interface_statistics::*;
pub use name_resolution::*;
pub use option::*;
pub use packet_block::*;
pub use reader::*;
pub use section::*;
pub use section_header::*;
pub use simple_packet::*;
pub use time::*;
pub use writer::*;

/// Block type code, as stored in the first field of every block
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct BlockType(pub u32);

newtype_enum! {
impl debug BlockType {
    InterfaceDescription = 0x0000_0001,
    Packet = 0x0000_0002,
    SimplePacket = 0x0000_0003,
    NameResolution = 0x0000_0004,
    InterfaceStatistics = 0x0000_0005,
    EnhancedPacket = 0x0000_0006,
    SectionHeader = 0x0A0D_0D0A,
}
}

impl BlockType {
    /// Returns true if the block type is handled by this crate
    pub fn is_known(self) -> bool {
        matches!(
            self,
            BlockType::SectionHeader
                | BlockType::InterfaceDescription
                | BlockType::Packet
                | BlockType::SimplePacket
                | BlockType::NameResolution
                | BlockType::InterfaceStatistics
                | BlockType::EnhancedPacket
        )
    }
}

/// Byte Order magic, first field of the Section Header Block body
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;

/// Size of the block envelope: type, leading and trailing total length
pub const BLOCK_ENVELOPE_LEN: usize = 12;
