use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;
use nom::{Err, IResult};
use rusticata_macros::newtype_enum;

use crate::endianness::{gen_i64, gen_u16, gen_u32, parse_i64, parse_u16, parse_u32};
use crate::error::{ErrorReporter, PcapError};

use super::option::option_string;
use super::*;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct SectionHeaderOptionCode(pub u16);

newtype_enum! {
impl debug SectionHeaderOptionCode {
    EndOfOpt = 0,
    Comment = 1,
    Hardware = 2,
    OperatingSystem = 3,
    UserApplication = 4,
}
}

/// Options of a Section Header Block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionHeaderOptions {
    pub comment: Option<String>,
    /// Description of the hardware used to create the section
    pub hardware: Option<String>,
    pub operating_system: Option<String>,
    /// Name of the application used to create the section
    pub user_application: Option<String>,
}

impl OptionSchema for SectionHeaderOptions {
    fn decode_option(&mut self, option: &PcapNGOption, _reverse: bool) -> Result<bool, PcapError> {
        let value = option.value();
        match SectionHeaderOptionCode(option.code) {
            SectionHeaderOptionCode::Comment => {
                self.comment = Some(option_string("opt_comment", value)?)
            }
            SectionHeaderOptionCode::Hardware => {
                self.hardware = Some(option_string("shb_hardware", value)?)
            }
            SectionHeaderOptionCode::OperatingSystem => {
                self.operating_system = Some(option_string("shb_os", value)?)
            }
            SectionHeaderOptionCode::UserApplication => {
                self.user_application = Some(option_string("shb_userappl", value)?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn to_options(&self, _reverse: bool) -> Vec<PcapNGOption<'_>> {
        let mut options = Vec::new();
        if let Some(ref comment) = self.comment {
            options.push(PcapNGOption::string(SectionHeaderOptionCode::Comment.0, comment));
        }
        if let Some(ref hardware) = self.hardware {
            options.push(PcapNGOption::string(SectionHeaderOptionCode::Hardware.0, hardware));
        }
        if let Some(ref os) = self.operating_system {
            options.push(PcapNGOption::string(SectionHeaderOptionCode::OperatingSystem.0, os));
        }
        if let Some(ref appl) = self.user_application {
            options.push(PcapNGOption::string(SectionHeaderOptionCode::UserApplication.0, appl));
        }
        options
    }
}

/// The Section Header Block (SHB) starts a section, and declares its byte order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeaderBlock {
    pub major_version: u16,
    pub minor_version: u16,
    /// Length of the section in bytes, excluding this block, or -1 if unknown
    pub section_length: i64,
    pub options: SectionHeaderOptions,
    /// Byte order the section is (or will be) written with
    pub reverse_byte_order: bool,
}

impl Default for SectionHeaderBlock {
    fn default() -> Self {
        SectionHeaderBlock {
            major_version: 1,
            minor_version: 0,
            section_length: -1,
            options: SectionHeaderOptions::default(),
            reverse_byte_order: false,
        }
    }
}

impl SectionHeaderBlock {
    pub fn new(reverse_byte_order: bool) -> Self {
        SectionHeaderBlock {
            reverse_byte_order,
            ..Default::default()
        }
    }

    /// Returns true if the section is stored in big-endian format
    pub fn big_endian(&self) -> bool {
        cfg!(target_endian = "big") != self.reverse_byte_order
    }
}

impl PcapNGBlock for SectionHeaderBlock {
    const BLOCK_TYPE: BlockType = BlockType::SectionHeader;

    fn parse_body<'a>(
        i: &'a [u8],
        reverse: bool,
        errors: &mut ErrorReporter,
    ) -> IResult<&'a [u8], Self, PcapError> {
        let (i, bom) = parse_u32(reverse)(i)?;
        if bom != BOM_MAGIC {
            return Err(Err::Error(PcapError::BadMagic(bom)));
        }
        let (i, major_version) = parse_u16(reverse)(i)?;
        let (i, minor_version) = parse_u16(reverse)(i)?;
        let (i, section_length) = parse_i64(reverse)(i)?;
        let (i, options) =
            SectionHeaderOptions::parse_area(i, reverse, errors).map_err(Err::Error)?;
        let block = SectionHeaderBlock {
            major_version,
            minor_version,
            section_length,
            options,
            reverse_byte_order: reverse,
        };
        Ok((i, block))
    }

    fn body_to_vec(&self, reverse: bool) -> Result<Vec<u8>, PcapError> {
        let mut v = gen_simple(
            tuple((
                gen_u32(BOM_MAGIC, reverse),
                gen_u16(self.major_version, reverse),
                gen_u16(self.minor_version, reverse),
                gen_i64(self.section_length, reverse),
            )),
            Vec::with_capacity(64),
        )?;
        v.extend_from_slice(&self.options.encode(reverse)?);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const REVERSE_LE: bool = cfg!(target_endian = "big");

    // SHB body, version 1.0, unknown section length, shb_userappl "pcapng"
    const SHB_BODY_LE: &[u8] = &hex!(
        "4d 3c 2b 1a 01 00 00 00
         ff ff ff ff ff ff ff ff
         04 00 06 00 70 63 61 70 6e 67 00 00
         00 00 00 00"
    );

    #[test]
    fn parse_shb_body() {
        let (rem, shb) =
            SectionHeaderBlock::parse_body(SHB_BODY_LE, REVERSE_LE, &mut ErrorReporter::fatal())
                .expect("parse");
        assert!(rem.is_empty());
        assert_eq!(shb.major_version, 1);
        assert_eq!(shb.minor_version, 0);
        assert_eq!(shb.section_length, -1);
        assert_eq!(shb.options.user_application.as_deref(), Some("pcapng"));
        assert_eq!(shb.options.comment, None);
        assert!(!shb.big_endian());
        let v = shb.body_to_vec(REVERSE_LE).expect("serialize");
        assert_eq!(&v[..], SHB_BODY_LE);
    }

    #[test]
    fn wrong_byte_order_is_bad_magic() {
        let res =
            SectionHeaderBlock::parse_body(SHB_BODY_LE, !REVERSE_LE, &mut ErrorReporter::fatal());
        assert!(matches!(res, Err(Err::Error(PcapError::BadMagic(_)))));
    }

    #[test]
    fn shb_options_round_trip() {
        let options = SectionHeaderOptions {
            comment: Some("section".to_string()),
            hardware: Some("x86_64".to_string()),
            operating_system: None,
            user_application: Some("writer".to_string()),
        };
        for &reverse in &[false, true] {
            let v = options.encode(reverse).expect("serialize");
            let (rem, decoded) =
                SectionHeaderOptions::parse_area(&v, reverse, &mut ErrorReporter::fatal())
                    .expect("parse");
            assert!(rem.is_empty());
            assert_eq!(decoded, options);
        }
    }
}
