use nom::error::{ErrorKind, ParseError};
use std::io;
use thiserror::Error;

/// Errors raised while framing, decoding or encoding pcap-ng data
///
/// Offsets are absolute positions in the underlying stream, in bytes.
#[derive(Debug, Error)]
pub enum PcapError {
    #[error("unrecognized block type {block_type:#010x} at offset {offset}")]
    UnrecognizedBlockType { block_type: u32, offset: u64 },
    #[error("block at offset {offset} has insufficient length ({length} < 12)")]
    InsufficientLength { length: u32, offset: u64 },
    #[error("truncated stream: block at offset {offset} ends past the end of data")]
    TruncatedStream { offset: u64 },
    #[error("block at offset {offset} is corrupted: total length {leading} != trailing {trailing}")]
    LengthMismatch {
        leading: u32,
        trailing: u32,
        offset: u64,
    },
    #[error("bad byte-order magic {0:#010x}")]
    BadMagic(u32),
    #[error("malformed stream: no Section Header block")]
    NoSectionHeader,
    #[error("malformed stream: no Interface Description block")]
    NoInterfaceDescription,
    #[error("malformed stream: Interface Description block at offset {offset} before any Section Header")]
    InterfaceBeforeSectionHeader { offset: u64 },
    #[error("a section group needs at least one Interface Description block")]
    EmptyInterfaceList,
    #[error("a writer needs at least one section group")]
    EmptyHeaderGroups,

    #[error("{field} contains invalid length. Received: {received} bytes, expected: {expected}")]
    InvalidOptionLength {
        field: &'static str,
        received: usize,
        expected: usize,
    },
    #[error("option {code} declares {length} bytes, only {available} available")]
    TruncatedOption {
        code: u16,
        length: u16,
        available: usize,
    },
    #[error("hash value too short ({received} bytes, at least 2 expected)")]
    InvalidHashValue { received: usize },
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("interface id {interface_id} out of range ({count} interfaces declared)")]
    InterfaceOutOfRange { interface_id: u32, count: usize },
    #[error("encoded block length {length} exceeds snapshot length {snaplen}")]
    SnapLengthExceeded { length: usize, snaplen: u32 },
    #[error("section headers are written with their interfaces, as a section group")]
    UnexpectedSectionHeader,

    #[error("serialization failed: {0}")]
    Serialize(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("parser error: {0:?}")]
    NomError(ErrorKind),
}

impl PcapError {
    /// Returns true if this error describes a damaged or incomplete block, as opposed
    /// to a field-level decoding problem
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            PcapError::UnrecognizedBlockType { .. }
                | PcapError::InsufficientLength { .. }
                | PcapError::TruncatedStream { .. }
                | PcapError::LengthMismatch { .. }
        )
    }
}

impl<I> ParseError<I> for PcapError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        PcapError::NomError(kind)
    }
    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl From<cookie_factory::GenError> for PcapError {
    fn from(e: cookie_factory::GenError) -> Self {
        match e {
            cookie_factory::GenError::IoError(e) => PcapError::Io(e),
            e => PcapError::Serialize(format!("{:?}", e)),
        }
    }
}

/// Convert the result of a nom parser into a `PcapError`, mapping missing data to
/// [`PcapError::TruncatedStream`] at `offset`
pub(crate) fn finish<T>(
    res: nom::IResult<&[u8], T, PcapError>,
    offset: u64,
) -> Result<(&[u8], T), PcapError> {
    match res {
        Ok(r) => Ok(r),
        Err(nom::Err::Incomplete(_)) => Err(PcapError::TruncatedStream { offset }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e),
    }
}

/// Destination for recoverable errors
///
/// Field-level and block-level errors are not allowed to abort a decode on their own: they
/// are handed to the registered handler and decoding continues. When no handler is
/// registered, [`report`](ErrorReporter::report) returns the error instead, so that it
/// can be propagated with `?` and no error is ever silently dropped.
pub struct ErrorReporter<'h> {
    handler: Option<&'h mut dyn FnMut(PcapError)>,
}

impl<'h> ErrorReporter<'h> {
    /// Forward every reported error to `handler`
    pub fn new(handler: &'h mut dyn FnMut(PcapError)) -> Self {
        ErrorReporter {
            handler: Some(handler),
        }
    }

    /// Reporter without handler: every reported error is returned to the caller
    pub fn fatal() -> ErrorReporter<'static> {
        ErrorReporter { handler: None }
    }

    pub fn from_option(handler: Option<&'h mut dyn FnMut(PcapError)>) -> Self {
        ErrorReporter { handler }
    }

    #[inline]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Report a recoverable error
    ///
    /// Returns `Err(err)` if no handler is registered.
    pub fn report(&mut self, err: PcapError) -> Result<(), PcapError> {
        match self.handler.as_mut() {
            Some(handler) => {
                handler(err);
                Ok(())
            }
            None => Err(err),
        }
    }
}
