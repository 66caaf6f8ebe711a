use crate::pcapng::{Block, EnhancedPacketBlock};

/// Minimal view of a captured packet
///
/// This is the boundary between the codec and the rest of an application: anything that
/// can report a capture time and the captured bytes can be handed to a
/// [`PcapNGWriter`](crate::PcapNGWriter).
pub trait Packet {
    /// Capture time, seconds since the Unix epoch
    fn seconds(&self) -> u64;
    /// Sub-second part of the capture time, in microseconds
    fn microseconds(&self) -> u64;
    /// Captured bytes
    fn data(&self) -> &[u8];

    /// Convert the packet to the block that will be written for it
    ///
    /// Packets that are not pcap-ng blocks are wrapped into an Enhanced Packet Block
    /// attached to interface 0.
    fn to_block(&self) -> Block {
        Block::EnhancedPacket(EnhancedPacketBlock::from_packet(self))
    }
}

/// A packet built outside of any capture file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawPacket {
    pub seconds: u64,
    pub microseconds: u64,
    pub data: Vec<u8>,
}

impl RawPacket {
    pub fn new(seconds: u64, microseconds: u64, data: Vec<u8>) -> Self {
        RawPacket {
            seconds,
            microseconds,
            data,
        }
    }
}

impl Packet for RawPacket {
    fn seconds(&self) -> u64 {
        self.seconds
    }
    fn microseconds(&self) -> u64 {
        self.microseconds
    }
    fn data(&self) -> &[u8] {
        &self.data
    }
}

impl<'a, P: Packet + ?Sized> Packet for &'a P {
    fn seconds(&self) -> u64 {
        (**self).seconds()
    }
    fn microseconds(&self) -> u64 {
        (**self).microseconds()
    }
    fn data(&self) -> &[u8] {
        (**self).data()
    }
    fn to_block(&self) -> Block {
        (**self).to_block()
    }
}
