use std::convert::TryFrom;
use std::io::{self, Read, Seek};

use cookie_factory::combinator::slice;
use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;
use log::trace;
use nom::bytes::streaming::take;
use nom::{Err, IResult};

use crate::endianness::{gen_u32, parse_u32};
use crate::error::{finish, PcapError};
use crate::serialize::{padding_for, padding_len, ToVec};

use super::{BlockType, BLOCK_ENVELOPE_LEN};

/// A block envelope, with the body left undecoded
///
/// The body does not include the padding bytes nor the length fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramedBlock {
    pub block_type: BlockType,
    pub body: Vec<u8>,
    pub reverse_byte_order: bool,
    /// Offset of the first byte of the block in its stream
    pub position: u64,
}

impl FramedBlock {
    pub fn new(block_type: BlockType, body: Vec<u8>, reverse_byte_order: bool) -> Self {
        FramedBlock {
            block_type,
            body,
            reverse_byte_order,
            position: 0,
        }
    }

    /// Value written in both total length fields
    #[inline]
    pub fn total_length(&self) -> usize {
        self.body.len() + BLOCK_ENVELOPE_LEN
    }

    /// Number of bytes the block occupies once written, padding included
    #[inline]
    pub fn encoded_length(&self) -> usize {
        self.total_length() + padding_len(self.body.len())
    }
}

impl ToVec for FramedBlock {
    /// Serialize the envelope and body
    ///
    /// The `reverse_byte_order` argument takes precedence over the flag stored in the block.
    fn to_vec(&self, reverse_byte_order: bool) -> Result<Vec<u8>, PcapError> {
        let total_length = u32::try_from(self.total_length()).map_err(|_| {
            PcapError::Serialize(format!("block body too large ({} bytes)", self.body.len()))
        })?;
        let v = Vec::with_capacity(self.encoded_length());
        let v = gen_simple(
            tuple((
                gen_u32(self.block_type.0, reverse_byte_order),
                gen_u32(total_length, reverse_byte_order),
                slice(&self.body),
                padding_for(self.body.len()),
                gen_u32(total_length, reverse_byte_order),
            )),
            v,
        )?;
        Ok(v)
    }
}

fn parse_block_type(i: &[u8], reverse: bool, position: u64) -> IResult<&[u8], BlockType, PcapError> {
    let (i, raw) = parse_u32(reverse)(i)?;
    let block_type = BlockType(raw);
    if !block_type.is_known() {
        return Err(Err::Error(PcapError::UnrecognizedBlockType {
            block_type: raw,
            offset: position,
        }));
    }
    Ok((i, block_type))
}

fn parse_total_length(i: &[u8], reverse: bool, position: u64) -> IResult<&[u8], u32, PcapError> {
    let (i, length) = parse_u32(reverse)(i)?;
    if (length as usize) < BLOCK_ENVELOPE_LEN {
        return Err(Err::Error(PcapError::InsufficientLength {
            length,
            offset: position,
        }));
    }
    Ok((i, length))
}

/// Parse everything following the leading total length field
fn parse_block_tail(
    i: &[u8],
    block_type: BlockType,
    total_length: u32,
    reverse: bool,
    position: u64,
) -> IResult<&[u8], FramedBlock, PcapError> {
    let body_len = total_length as usize - BLOCK_ENVELOPE_LEN;
    let (i, body) = take(body_len)(i)?;
    let (i, _padding) = take(padding_len(body_len))(i)?;
    let (i, trailing) = parse_u32(reverse)(i)?;
    if trailing != total_length {
        return Err(Err::Error(PcapError::LengthMismatch {
            leading: total_length,
            trailing,
            offset: position,
        }));
    }
    let block = FramedBlock {
        block_type,
        body: body.to_vec(),
        reverse_byte_order: reverse,
        position,
    };
    Ok((i, block))
}

/// Parse a block envelope from a byte slice
///
/// `position` is the offset of `i` in its stream, and is only used to fill
/// `FramedBlock::position` and error offsets. Missing data is reported as
/// `nom::Err::Incomplete`.
pub fn parse_framed_block(
    i: &[u8],
    reverse_byte_order: bool,
    position: u64,
) -> IResult<&[u8], FramedBlock, PcapError> {
    let (i, block_type) = parse_block_type(i, reverse_byte_order, position)?;
    let (i, total_length) = parse_total_length(i, reverse_byte_order, position)?;
    parse_block_tail(i, block_type, total_length, reverse_byte_order, position)
}

fn read_field<R: Read>(reader: &mut R, position: u64) -> Result<[u8; 4], PcapError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => PcapError::TruncatedStream { offset: position },
        _ => PcapError::Io(e),
    })?;
    Ok(buf)
}

/// Read the next block envelope from a stream positioned at a block boundary
///
/// Fields are consumed one after the other, so on error the stream is left after the
/// last field that could be read.
pub fn read_framed_block<R: Read + Seek>(
    reader: &mut R,
    reverse_byte_order: bool,
) -> Result<FramedBlock, PcapError> {
    let position = reader.stream_position()?;

    let field = read_field(reader, position)?;
    let (_, block_type) = finish(
        parse_block_type(&field[..], reverse_byte_order, position),
        position,
    )?;
    let field = read_field(reader, position)?;
    let (_, total_length) = finish(
        parse_total_length(&field[..], reverse_byte_order, position),
        position,
    )?;

    let body_len = total_length as usize - BLOCK_ENVELOPE_LEN;
    let remaining = body_len + padding_len(body_len) + 4;
    let mut tail = Vec::new();
    reader.by_ref().take(remaining as u64).read_to_end(&mut tail)?;
    let (_, block) = finish(
        parse_block_tail(&tail, block_type, total_length, reverse_byte_order, position),
        position,
    )?;
    trace!(
        "framed block {:?} at offset {} (total length {})",
        block.block_type,
        position,
        total_length
    );
    Ok(block)
}
