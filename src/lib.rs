//! # PCAPNG reader and writer
//!
//! This crate decodes and encodes files in the PCAPNG format, the block-structured
//! successor of the legacy pcap capture format.
//!
//! The crate is organized in layers:
//!
//! - the block envelope (type, length, body, padding) and the generic options area;
//! - one typed structure per block (Section Header, Interface Description, Enhanced
//!   Packet, Packet, Simple Packet, Name Resolution, Interface Statistics), converted
//!   from and to envelopes, and the [`Block`] sum type;
//! - a [`PcapNGReader`] tracking sections and interfaces, and delivering packets to a
//!   callback;
//! - a [`PcapNGWriter`] writing sections, and checking packets against the interfaces
//!   of the current section.
//!
//! Both little and big-endian files are supported. The byte order is given by the caller
//! as a `reverse_byte_order` flag: `true` means the file byte order differs from the
//! byte order of the host.
//!
//! # Errors
//!
//! Framing errors (bad lengths, unknown block types, truncated data) are always
//! returned to the caller. Errors limited to one field or one block (an option with a
//! wrong length, an invalid string, a corrupted block while streaming) are recoverable:
//! they are given to an error handler if one was registered, and returned otherwise.
//!
//! # Example: writing then reading a capture
//!
//! ```rust
//! use pcapng_codec::*;
//! use std::io::Cursor;
//! use std::sync::atomic::AtomicBool;
//!
//! let writer = PcapNGWriter::with_default_group(Vec::new(), false).expect("PcapNGWriter");
//! for i in 0..3 {
//!     let packet = RawPacket::new(1_432_723_816 + i, 0, vec![0u8; 60]);
//!     writer.write_packet(&packet).expect("write_packet");
//! }
//! let data = writer.into_inner();
//!
//! let reader = PcapNGReader::new(Cursor::new(data), false).expect("PcapNGReader");
//! let mut num_packets = 0;
//! reader
//!     .read_packets(&AtomicBool::new(false), &mut |_group, _block| num_packets += 1, None)
//!     .expect("read_packets");
//! assert_eq!(num_packets, 3);
//! ```
//!
//! Single blocks can also be decoded from memory with [`parse_block`], or from a stream
//! with [`read_next_block`].

pub mod endianness;
mod error;
mod linktype;
mod packet;
mod serialize;

pub use error::*;
pub use linktype::*;
pub use packet::*;
pub use serialize::ToVec;

pub mod pcapng;
pub use pcapng::*;
