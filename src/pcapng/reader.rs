use std::io::{Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{debug, trace, warn};

use crate::error::{ErrorReporter, PcapError};

use super::*;

/// Reader of pcap-ng streams
///
/// ## Initialization
///
/// On creation, the reader reads the Section Header and Interface Description blocks at
/// the start of the stream, and builds one [`SectionGroup`] per Section Header. The
/// first block of any other type ends this phase: the stream is left at the start of
/// this block, the *base position*.
///
/// ## Streaming
///
/// [`read_packets`](PcapNGReader::read_packets) then reads blocks one by one from the
/// current position, and gives packet blocks (EPB, Packet, SPB) to a callback with the
/// last section group built during initialization. Other blocks are skipped, including
/// Section Headers and Interface Descriptions found after the base position.
///
/// The stream is owned by the reader and protected by a mutex, so the reader can be
/// shared between threads. Reads are strictly sequential.
///
/// ## Example
///
/// ```rust
/// use pcapng_codec::*;
/// use std::io::Cursor;
/// use std::sync::atomic::AtomicBool;
///
/// # let mut data = SectionGroup::create_empty(false).to_vec(false).unwrap();
/// # data.extend(Block::from(EnhancedPacketBlock::new(0, Timestamp::new(1, 2), vec![0; 60])).to_vec(false).unwrap());
/// let reader = PcapNGReader::new(Cursor::new(data), false).expect("PcapNGReader");
/// let cancel = AtomicBool::new(false);
/// let mut num_packets = 0;
/// reader
///     .read_packets(
///         &cancel,
///         &mut |group, block| {
///             let linktype = group.interfaces[0].linktype;
///             if let Some(packet) = block.as_packet() {
///                 println!("{} bytes ({})", packet.data().len(), linktype);
///             }
///             num_packets += 1;
///         },
///         None,
///     )
///     .expect("read_packets");
/// assert_eq!(num_packets, 1);
/// ```
pub struct PcapNGReader<R>
where
    R: Read + Seek,
{
    reader: Mutex<R>,
    groups: Vec<SectionGroup>,
    reverse_byte_order: bool,
    base_position: u64,
}

impl<R> PcapNGReader<R>
where
    R: Read + Seek,
{
    /// Creates a new `PcapNGReader<R>`, reading the section headers and interfaces
    ///
    /// The stream is read from its current position, with the given byte order. Any
    /// error during initialization is fatal.
    pub fn new(mut reader: R, reverse_byte_order: bool) -> Result<PcapNGReader<R>, PcapError> {
        let start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;

        let mut groups: Vec<SectionGroup> = Vec::new();
        let mut errors = ErrorReporter::fatal();
        let mut position = start;
        while position < end {
            let framed = read_framed_block(&mut reader, reverse_byte_order)?;
            match framed.block_type {
                BlockType::SectionHeader => {
                    let header = SectionHeaderBlock::decode(&framed, &mut errors)?;
                    groups.push(SectionGroup {
                        header,
                        interfaces: Vec::new(),
                    });
                }
                BlockType::InterfaceDescription => {
                    let idb = InterfaceDescriptionBlock::decode(&framed, &mut errors)?;
                    match groups.last_mut() {
                        Some(group) => group.interfaces.push(idb),
                        None => {
                            return Err(PcapError::InterfaceBeforeSectionHeader { offset: position })
                        }
                    }
                }
                _ => {
                    reader.seek(SeekFrom::Start(position))?;
                    break;
                }
            }
            position = reader.stream_position()?;
        }

        if groups.is_empty() {
            return Err(PcapError::NoSectionHeader);
        }
        // a section is only usable with at least one interface
        let num_sections = groups.len();
        groups.retain(|group| !group.interfaces.is_empty());
        if groups.is_empty() {
            return Err(PcapError::NoInterfaceDescription);
        }
        if groups.len() < num_sections {
            debug!(
                "dropped {} section(s) without Interface Description",
                num_sections - groups.len()
            );
        }
        debug!(
            "pcap-ng stream: {} section(s), {} interface(s), base position {}",
            groups.len(),
            groups.iter().map(|group| group.interfaces.len()).sum::<usize>(),
            position
        );
        Ok(PcapNGReader {
            reader: Mutex::new(reader),
            groups,
            reverse_byte_order,
            base_position: position,
        })
    }

    /// Section groups found during initialization, in stream order
    ///
    /// Sections without any Interface Description are not kept.
    pub fn groups(&self) -> &[SectionGroup] {
        &self.groups
    }

    /// Group given to packet callbacks
    pub fn current_group(&self) -> &SectionGroup {
        // initialization guarantees at least one group
        &self.groups[self.groups.len() - 1]
    }

    /// Offset of the first block after the initial headers and interfaces
    pub fn base_position(&self) -> u64 {
        self.base_position
    }

    pub fn reverse_byte_order(&self) -> bool {
        self.reverse_byte_order
    }

    /// Seek back to the base position, so packets can be read again
    pub fn rewind(&self) -> Result<(), PcapError> {
        let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        reader.seek(SeekFrom::Start(self.base_position))?;
        Ok(())
    }

    /// Read blocks until the end of stream, or until `cancel` is set
    ///
    /// `on_packet` is called for every packet block. Errors while reading a block are given
    /// to `on_error` and reading continues with the next block, unless the stream did not
    /// move forward. Without `on_error`, the first error is returned.
    ///
    /// `cancel` is checked between blocks. The stream is locked during the whole call:
    /// callbacks must not call other methods of this reader.
    pub fn read_packets(
        &self,
        cancel: &AtomicBool,
        on_packet: &mut dyn FnMut(&SectionGroup, &Block),
        on_error: Option<&mut dyn FnMut(PcapError)>,
    ) -> Result<(), PcapError> {
        let mut guard = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        let reader = &mut *guard;
        let group = self.current_group();
        let mut errors = ErrorReporter::from_option(on_error);

        let mut position = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(position))?;

        while position < end {
            if cancel.load(Ordering::Relaxed) {
                debug!("read_packets cancelled at offset {}", position);
                break;
            }
            match read_next_block(reader, self.reverse_byte_order, &mut errors) {
                Ok(block) if block.is_data_block() => on_packet(group, &block),
                Ok(block) => trace!(
                    "skipping {:?} block at offset {}",
                    block.block_type(),
                    position
                ),
                Err(e) => {
                    errors.report(e)?;
                    let next = reader.stream_position()?;
                    if next <= position {
                        warn!("no progress after error at offset {}, stopping", position);
                        break;
                    }
                    warn!("skipped invalid block at offset {}", position);
                }
            }
            position = reader.stream_position()?;
        }
        Ok(())
    }

    /// Consume the reader, returning the underlying stream
    pub fn into_inner(self) -> R {
        self.reader
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
