use std::borrow::Cow;
use std::convert::TryFrom;
use std::io::Write;

use cookie_factory::combinator::slice;
use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;
use cookie_factory::SerializeFn;
use log::{trace, warn};
use nom::bytes::streaming::take;
use nom::IResult;

use crate::endianness::{gen_u16, parse_u16, ReverseByteOrder};
use crate::error::{ErrorReporter, PcapError};
use crate::serialize::{padding_for, padding_len};

/// Largest value an option can hold (the length field is 16 bits)
pub const MAX_OPTION_LEN: usize = u16::MAX as usize;

/// A raw option entry: code and value, without length and padding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcapNGOption<'a> {
    pub code: u16,
    pub value: Cow<'a, [u8]>,
}

impl<'a> PcapNGOption<'a> {
    pub fn new<V: Into<Cow<'a, [u8]>>>(code: u16, value: V) -> Self {
        PcapNGOption {
            code,
            value: value.into(),
        }
    }

    /// Build an option holding a UTF-8 string (not NUL-terminated)
    pub fn string(code: u16, s: &'a str) -> Self {
        PcapNGOption::new(code, s.as_bytes())
    }

    pub fn from_u8(code: u16, v: u8) -> PcapNGOption<'static> {
        PcapNGOption::new(code, vec![v])
    }

    pub fn from_u32(code: u16, v: u32, reverse: bool) -> PcapNGOption<'static> {
        PcapNGOption::new(code, v.reverse_byte_order(reverse).to_ne_bytes().to_vec())
    }

    pub fn from_i32(code: u16, v: i32, reverse: bool) -> PcapNGOption<'static> {
        PcapNGOption::new(code, v.reverse_byte_order(reverse).to_ne_bytes().to_vec())
    }

    pub fn from_u64(code: u16, v: u64, reverse: bool) -> PcapNGOption<'static> {
        PcapNGOption::new(code, v.reverse_byte_order(reverse).to_ne_bytes().to_vec())
    }

    pub fn from_i64(code: u16, v: i64, reverse: bool) -> PcapNGOption<'static> {
        PcapNGOption::new(code, v.reverse_byte_order(reverse).to_ne_bytes().to_vec())
    }

    /// Return a reference to the option value
    #[inline]
    pub fn value(&self) -> &[u8] {
        self.value.as_ref()
    }
}

/// Parse one option entry
///
/// Returns `None` for the end-of-options entry (any entry with a zero length).
pub fn parse_option(i: &[u8], reverse: bool) -> IResult<&[u8], Option<PcapNGOption>, PcapError> {
    let (i, code) = parse_u16(reverse)(i)?;
    let (i, len) = parse_u16(reverse)(i)?;
    if len == 0 {
        return Ok((i, None));
    }
    if i.len() < len as usize {
        return Err(nom::Err::Error(PcapError::TruncatedOption {
            code,
            length: len,
            available: i.len(),
        }));
    }
    let (i, value) = take(len as usize)(i)?;
    // the last option of a block may come without its padding
    let pad = padding_len(len as usize).min(i.len());
    let (i, _) = take(pad)(i)?;
    Ok((i, Some(PcapNGOption::new(code, value))))
}

/// Parse an options area
///
/// Extraction stops at the end-of-options entry, when fewer than 4 bytes remain, or at the
/// first malformed entry. A malformed entry is given to `errors` and the options read so
/// far are kept.
pub fn parse_options<'a>(
    mut i: &'a [u8],
    reverse: bool,
    errors: &mut ErrorReporter,
) -> Result<(&'a [u8], Vec<PcapNGOption<'a>>), PcapError> {
    let mut options = Vec::new();
    while i.len() >= 4 {
        match parse_option(i, reverse) {
            Ok((rem, Some(option))) => {
                options.push(option);
                i = rem;
            }
            Ok((rem, None)) => {
                i = rem;
                break;
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                errors.report(e)?;
                i = &i[i.len()..];
                break;
            }
            Err(nom::Err::Incomplete(_)) => {
                errors.report(PcapError::TruncatedOption {
                    code: 0,
                    length: 0,
                    available: i.len(),
                })?;
                i = &i[i.len()..];
                break;
            }
        }
    }
    Ok((i, options))
}

fn gen_option<'a, W: Write + 'a>(
    option: &'a PcapNGOption,
    reverse: bool,
) -> impl SerializeFn<W> + 'a {
    tuple((
        gen_u16(option.code, reverse),
        gen_u16(option.value.len() as u16, reverse),
        slice(option.value()),
        padding_for(option.value.len()),
    ))
}

/// Serialize an options area, including the end-of-options entry
///
/// Options with a value longer than [`MAX_OPTION_LEN`] cannot be represented and are
/// skipped.
pub fn options_to_vec(options: &[PcapNGOption], reverse: bool) -> Result<Vec<u8>, PcapError> {
    let mut v = Vec::new();
    for option in options {
        if option.value.len() > MAX_OPTION_LEN {
            warn!(
                "option {} omitted: value too long ({} bytes)",
                option.code,
                option.value.len()
            );
            continue;
        }
        v = gen_simple(gen_option(option, reverse), v)?;
    }
    let v = gen_simple(tuple((gen_u16(0, reverse), gen_u16(0, reverse))), v)?;
    Ok(v)
}

/// Typed view of the options of one block type
///
/// Implementors map option codes to fields. Decoding is lenient: a value that does not
/// decode is reported and the field is left empty, and unknown codes are ignored.
pub trait OptionSchema: Default {
    /// Store `option` in the matching field
    ///
    /// Returns `Ok(false)` if the code does not belong to this schema.
    fn decode_option(&mut self, option: &PcapNGOption, reverse: bool) -> Result<bool, PcapError>;

    /// Raw options for all present fields, in code order
    fn to_options(&self, reverse: bool) -> Vec<PcapNGOption<'_>>;

    /// Parse an options area into a typed option set
    fn parse_area<'a>(
        i: &'a [u8],
        reverse: bool,
        errors: &mut ErrorReporter,
    ) -> Result<(&'a [u8], Self), PcapError> {
        let (rem, raw) = parse_options(i, reverse, errors)?;
        let mut set = Self::default();
        for option in &raw {
            match set.decode_option(option, reverse) {
                Ok(true) => (),
                Ok(false) => trace!(
                    "ignoring option code {} ({} bytes)",
                    option.code,
                    option.value.len()
                ),
                Err(e) => errors.report(e)?,
            }
        }
        Ok((rem, set))
    }

    /// Serialize the option set, including the end-of-options entry
    fn encode(&self, reverse: bool) -> Result<Vec<u8>, PcapError> {
        options_to_vec(&self.to_options(reverse), reverse)
    }
}

pub(crate) fn option_string(field: &'static str, value: &[u8]) -> Result<String, PcapError> {
    std::str::from_utf8(value)
        .map(str::to_owned)
        .map_err(|_| PcapError::InvalidUtf8 { field })
}

pub(crate) fn option_array<const N: usize>(
    field: &'static str,
    value: &[u8],
) -> Result<[u8; N], PcapError> {
    <[u8; N]>::try_from(value).map_err(|_| PcapError::InvalidOptionLength {
        field,
        received: value.len(),
        expected: N,
    })
}

pub(crate) fn option_u8(field: &'static str, value: &[u8]) -> Result<u8, PcapError> {
    option_array::<1>(field, value).map(|b| b[0])
}

pub(crate) fn option_u32(field: &'static str, value: &[u8], reverse: bool) -> Result<u32, PcapError> {
    option_array(field, value).map(|b| u32::from_ne_bytes(b).reverse_byte_order(reverse))
}

pub(crate) fn option_i32(field: &'static str, value: &[u8], reverse: bool) -> Result<i32, PcapError> {
    option_array(field, value).map(|b| i32::from_ne_bytes(b).reverse_byte_order(reverse))
}

pub(crate) fn option_u64(field: &'static str, value: &[u8], reverse: bool) -> Result<u64, PcapError> {
    option_array(field, value).map(|b| u64::from_ne_bytes(b).reverse_byte_order(reverse))
}

pub(crate) fn option_i64(field: &'static str, value: &[u8], reverse: bool) -> Result<i64, PcapError> {
    option_array(field, value).map(|b| i64::from_ne_bytes(b).reverse_byte_order(reverse))
}
