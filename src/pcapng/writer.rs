use std::io::Write;
use std::sync::{Mutex, PoisonError};

use log::{debug, warn};

use crate::error::PcapError;
use crate::packet::Packet;
use crate::serialize::ToVec;

use super::*;

/// Handler receiving the errors of failed block writes
pub type ErrorHandler = Box<dyn FnMut(PcapError) + Send>;

struct WriterState<W> {
    writer: W,
    /// Last group written, used for interface and snapshot length checks
    group: SectionGroup,
    error_handler: Option<ErrorHandler>,
}

impl<W: Write> WriterState<W> {
    fn write_group(&mut self, group: SectionGroup) -> Result<(), PcapError> {
        let data = group.to_vec(group.reverse_byte_order())?;
        self.writer.write_all(&data)?;
        debug!(
            "wrote section header with {} interface(s) ({} bytes)",
            group.interfaces.len(),
            data.len()
        );
        self.group = group;
        Ok(())
    }

    /// Encode and check the block completely before writing anything
    ///
    /// Interface Description blocks are added to the current group.
    fn write_block(&mut self, block: &Block) -> Result<(), PcapError> {
        if let Block::SectionHeader(_) = block {
            return Err(PcapError::UnexpectedSectionHeader);
        }
        let reverse = self.group.reverse_byte_order();
        let framed = block.encode(reverse)?;
        if let Some(interface_id) = block.associated_interface_id() {
            let idb = self
                .group
                .interface(interface_id)
                .ok_or(PcapError::InterfaceOutOfRange {
                    interface_id,
                    count: self.group.interfaces.len(),
                })?;
            let length = framed.encoded_length();
            if length > idb.snaplen as usize {
                return Err(PcapError::SnapLengthExceeded {
                    length,
                    snaplen: idb.snaplen,
                });
            }
        }
        let data = framed.to_vec(reverse)?;
        self.writer.write_all(&data)?;
        if let Block::InterfaceDescription(idb) = block {
            self.group.interfaces.push(idb.clone());
            debug!(
                "interface {} added to current section",
                self.group.interfaces.len() - 1
            );
        }
        Ok(())
    }

    fn fail(&mut self, err: PcapError) -> Result<(), PcapError> {
        match self.error_handler.as_mut() {
            Some(handler) => {
                warn!("write failed: {}", err);
                handler(err);
                Ok(())
            }
            None => Err(err),
        }
    }
}

/// Writer of pcap-ng streams
///
/// Section groups given on creation are written immediately. Packets are then written
/// as blocks, checked against the interfaces of the last section group written:
/// the interface must be declared, and the encoded block must not be longer than the
/// interface snapshot length. A block failing these checks is not written at all.
///
/// Failed writes are given to the error handler if one is set, and returned otherwise.
///
/// ## Example
///
/// ```rust
/// use pcapng_codec::*;
///
/// let writer = PcapNGWriter::with_default_group(Vec::new(), false).expect("PcapNGWriter");
/// let packet = RawPacket::new(1_432_723_816, 12, vec![0u8; 98]);
/// writer.write_packet(&packet).expect("write_packet");
/// let data = writer.into_inner();
/// assert_eq!(data.len(), 32 + 24 + 136);
/// ```
pub struct PcapNGWriter<W: Write> {
    state: Mutex<WriterState<W>>,
}

impl<W: Write> PcapNGWriter<W> {
    /// Create a writer and write all `groups`, in order
    pub fn new(writer: W, groups: Vec<SectionGroup>) -> Result<PcapNGWriter<W>, PcapError> {
        let mut groups = groups.into_iter();
        let first = groups.next().ok_or(PcapError::EmptyHeaderGroups)?;
        let mut state = WriterState {
            writer,
            group: first.clone(),
            error_handler: None,
        };
        state.write_group(first)?;
        for group in groups {
            state.write_group(group)?;
        }
        Ok(PcapNGWriter {
            state: Mutex::new(state),
        })
    }

    /// Create a writer with one default section (see [`SectionGroup::create_empty`])
    pub fn with_default_group(
        writer: W,
        reverse_byte_order: bool,
    ) -> Result<PcapNGWriter<W>, PcapError> {
        PcapNGWriter::new(writer, vec![SectionGroup::create_empty(reverse_byte_order)])
    }

    /// Set the handler receiving failed block writes
    pub fn set_error_handler(&self, handler: ErrorHandler) {
        self.lock().error_handler = Some(handler);
    }

    /// Write a packet
    ///
    /// Packet blocks are written as-is, other packets are wrapped in an Enhanced Packet
    /// Block for interface 0.
    pub fn write_packet<P: Packet + ?Sized>(&self, packet: &P) -> Result<(), PcapError> {
        self.write_block(&packet.to_block())
    }

    /// Write any block, with the checks of [`write_packet`](PcapNGWriter::write_packet)
    /// when the block belongs to an interface
    ///
    /// An Interface Description block declares a new interface in the current section.
    /// Section Header blocks are rejected: sections are started with
    /// [`write_header_group`](PcapNGWriter::write_header_group).
    pub fn write_block(&self, block: &Block) -> Result<(), PcapError> {
        let mut state = self.lock();
        match state.write_block(block) {
            Ok(()) => Ok(()),
            Err(e) => state.fail(e),
        }
    }

    /// Start a new section: following packets are checked against its interfaces
    ///
    /// Errors go to the error handler, like failed block writes.
    pub fn write_header_group(&self, group: SectionGroup) -> Result<(), PcapError> {
        let mut state = self.lock();
        match state.write_group(group) {
            Ok(()) => Ok(()),
            Err(e) => state.fail(e),
        }
    }

    /// Copy of the section group packets are currently checked against
    pub fn current_group(&self) -> SectionGroup {
        self.lock().group.clone()
    }

    pub fn flush(&self) -> Result<(), PcapError> {
        self.lock().writer.flush()?;
        Ok(())
    }

    /// Consume the writer, returning the underlying output
    pub fn into_inner(self) -> W {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .writer
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WriterState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linktype::Linktype;
    use crate::packet::RawPacket;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Output refusing writes past `capacity` bytes
    struct LimitedWriter {
        data: Vec<u8>,
        capacity: usize,
    }

    impl Write for LimitedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.data.len() + buf.len() > self.capacity {
                return Err(io::Error::new(io::ErrorKind::Other, "output full"));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn group(reverse: bool, snaplens: &[u32]) -> SectionGroup {
        let interfaces = snaplens
            .iter()
            .map(|&snaplen| InterfaceDescriptionBlock::new(Linktype::ETHERNET, snaplen))
            .collect();
        SectionGroup::new(SectionHeaderBlock::new(reverse), interfaces).expect("group")
    }

    #[test]
    fn needs_a_group() {
        let res = PcapNGWriter::new(Vec::new(), Vec::new());
        assert!(matches!(res, Err(PcapError::EmptyHeaderGroups)));
    }

    #[test]
    fn snaplen_exceeded() {
        let writer = PcapNGWriter::new(Vec::new(), vec![group(false, &[64])]).expect("writer");
        // 32 bytes of EPB fields and envelope, 4 bytes of options
        writer
            .write_packet(&RawPacket::new(0, 0, vec![0; 28]))
            .expect("fits");
        let res = writer.write_packet(&RawPacket::new(0, 0, vec![0; 29]));
        assert!(matches!(
            res,
            Err(PcapError::SnapLengthExceeded {
                length: 68,
                snaplen: 64
            })
        ));
        assert_eq!(writer.into_inner().len(), 32 + 24 + 64);
    }

    #[test]
    fn errors_go_to_handler() {
        let writer = PcapNGWriter::new(Vec::new(), vec![group(true, &[100])]).expect("writer");
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        writer.set_error_handler(Box::new(move |e: PcapError| {
            if let Ok(mut v) = sink.lock() {
                v.push(e)
            }
        }));
        let mut epb = EnhancedPacketBlock::new(1, Timestamp::new(5, 6), vec![1, 2, 3]);
        writer.write_packet(&epb).expect("reported");
        epb.interface_id = 0;
        writer.write_packet(&epb).expect("written");
        let data = writer.into_inner();
        assert_eq!(data.len(), 32 + 24 + 40);
        let errors = errors.lock().expect("lock");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            PcapError::InterfaceOutOfRange {
                interface_id: 1,
                count: 1
            }
        ));
    }

    #[test]
    fn checks_use_last_group() {
        let writer = PcapNGWriter::new(Vec::new(), vec![group(false, &[65535, 65535])])
            .expect("writer");
        let mut epb = EnhancedPacketBlock::new(1, Timestamp::new(5, 6), vec![0; 200]);
        writer.write_packet(&epb).expect("interface 1 of first group");
        writer
            .write_header_group(group(false, &[100]))
            .expect("second group");
        assert_eq!(writer.current_group().interfaces.len(), 1);
        assert!(matches!(
            writer.write_packet(&epb),
            Err(PcapError::InterfaceOutOfRange { .. })
        ));
        epb.interface_id = 0;
        assert!(matches!(
            writer.write_packet(&epb),
            Err(PcapError::SnapLengthExceeded { snaplen: 100, .. })
        ));
        writer.write_header_group(group(false, &[1000])).expect("third group");
        writer.write_packet(&epb).expect("fits third group");
        writer.flush().expect("flush");
    }

    #[test]
    fn blocks_without_interface_are_not_checked() {
        let writer = PcapNGWriter::new(Vec::new(), vec![group(false, &[16])]).expect("writer");
        let nrb = NameResolutionBlock {
            records: vec![NameRecord::new(
                std::net::Ipv4Addr::LOCALHOST,
                "a-rather-long-host-name.localdomain",
            )],
            options: NameResolutionOptions::default(),
        };
        writer.write_block(&Block::from(nrb)).expect("nrb");
        let spb = SimplePacketBlock::new(vec![0; 8]);
        assert!(matches!(
            writer.write_packet(&spb),
            Err(PcapError::SnapLengthExceeded { .. })
        ));
    }

    #[test]
    fn interface_block_declares_interface() {
        let writer = PcapNGWriter::with_default_group(Vec::new(), false).expect("writer");
        let epb = EnhancedPacketBlock::new(1, Timestamp::new(5, 6), vec![0; 10]);
        assert!(matches!(
            writer.write_packet(&epb),
            Err(PcapError::InterfaceOutOfRange {
                interface_id: 1,
                count: 1
            })
        ));
        let idb = InterfaceDescriptionBlock::new(Linktype::RAW, 128);
        writer.write_block(&Block::from(idb)).expect("idb");
        assert_eq!(writer.current_group().interfaces.len(), 2);
        writer.write_packet(&epb).expect("interface 1 declared");
        let data = writer.into_inner();

        let reader = PcapNGReader::new(std::io::Cursor::new(data), false).expect("reader");
        assert_eq!(reader.current_group().interfaces.len(), 2);
        assert_eq!(reader.current_group().interfaces[1].snaplen, 128);
    }

    #[test]
    fn section_header_block_is_rejected() {
        let writer = PcapNGWriter::with_default_group(Vec::new(), false).expect("writer");
        let res = writer.write_block(&Block::from(SectionHeaderBlock::default()));
        assert!(matches!(res, Err(PcapError::UnexpectedSectionHeader)));
        assert_eq!(writer.into_inner().len(), 32 + 24);
    }

    #[test]
    fn header_group_errors_go_to_handler() {
        let output = LimitedWriter {
            data: Vec::new(),
            capacity: 32 + 24 + 8,
        };
        let writer = PcapNGWriter::new(output, vec![group(false, &[100])]).expect("writer");
        let res = writer.write_header_group(group(false, &[200]));
        assert!(matches!(res, Err(PcapError::Io(_))));

        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        writer.set_error_handler(Box::new(move |e: PcapError| {
            if let Ok(mut v) = sink.lock() {
                v.push(e)
            }
        }));
        writer
            .write_header_group(group(false, &[300]))
            .expect("error goes to the handler");
        assert_eq!(writer.current_group().interfaces[0].snaplen, 100);
        let errors = errors.lock().expect("lock");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], PcapError::Io(_)));
    }
}
