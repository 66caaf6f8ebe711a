use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use log::trace;
use nom::{Err, IResult};
use rusticata_macros::newtype_enum;

use crate::error::{ErrorReporter, PcapError};

use super::option::{option_array, option_string};
use super::*;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct NameRecordType(pub u16);

newtype_enum! {
impl debug NameRecordType {
    End = 0,
    Ipv4 = 1,
    Ipv6 = 2,
}
}

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct NameResolutionOptionCode(pub u16);

newtype_enum! {
impl debug NameResolutionOptionCode {
    EndOfOpt = 0,
    Comment = 1,
    DnsName = 2,
    DnsIpv4Address = 3,
    DnsIpv6Address = 4,
}
}

/// Association between an address and a name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameRecord {
    pub address: IpAddr,
    pub name: String,
}

impl NameRecord {
    pub fn new<A: Into<IpAddr>, S: Into<String>>(address: A, name: S) -> Self {
        NameRecord {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Decode a record entry. Returns `Ok(None)` for record types this crate does not know.
    fn from_entry(entry: &PcapNGOption) -> Result<Option<NameRecord>, PcapError> {
        let value = entry.value();
        let (address, name) = match NameRecordType(entry.code) {
            NameRecordType::Ipv4 => {
                if value.len() < 4 {
                    return Err(PcapError::InvalidOptionLength {
                        field: "nrb_record_ipv4",
                        received: value.len(),
                        expected: 4,
                    });
                }
                let b: [u8; 4] = option_array("nrb_record_ipv4", &value[..4])?;
                (IpAddr::V4(Ipv4Addr::from(b)), &value[4..])
            }
            NameRecordType::Ipv6 => {
                if value.len() < 16 {
                    return Err(PcapError::InvalidOptionLength {
                        field: "nrb_record_ipv6",
                        received: value.len(),
                        expected: 16,
                    });
                }
                let b: [u8; 16] = option_array("nrb_record_ipv6", &value[..16])?;
                (IpAddr::V6(Ipv6Addr::from(b)), &value[16..])
            }
            _ => return Ok(None),
        };
        let end = name.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
        let name = option_string("nrb_record_name", &name[..end])?;
        Ok(Some(NameRecord { address, name }))
    }

    fn to_entry(&self) -> PcapNGOption<'static> {
        let (code, mut value) = match self.address {
            IpAddr::V4(addr) => (NameRecordType::Ipv4, addr.octets().to_vec()),
            IpAddr::V6(addr) => (NameRecordType::Ipv6, addr.octets().to_vec()),
        };
        value.extend_from_slice(self.name.as_bytes());
        value.push(0);
        PcapNGOption::new(code.0, value)
    }
}

/// Options of a Name Resolution Block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameResolutionOptions {
    pub comment: Option<String>,
    /// Name of the DNS server used to perform the resolutions
    pub dns_name: Option<String>,
    pub dns_ipv4_address: Option<Ipv4Addr>,
    pub dns_ipv6_address: Option<Ipv6Addr>,
}

impl OptionSchema for NameResolutionOptions {
    fn decode_option(&mut self, option: &PcapNGOption, _reverse: bool) -> Result<bool, PcapError> {
        let value = option.value();
        match NameResolutionOptionCode(option.code) {
            NameResolutionOptionCode::Comment => {
                self.comment = Some(option_string("opt_comment", value)?)
            }
            NameResolutionOptionCode::DnsName => {
                self.dns_name = Some(option_string("ns_dnsname", value)?)
            }
            NameResolutionOptionCode::DnsIpv4Address => {
                let b: [u8; 4] = option_array("ns_dnsIP4addr", value)?;
                self.dns_ipv4_address = Some(Ipv4Addr::from(b))
            }
            NameResolutionOptionCode::DnsIpv6Address => {
                let b: [u8; 16] = option_array("ns_dnsIP6addr", value)?;
                self.dns_ipv6_address = Some(Ipv6Addr::from(b))
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn to_options(&self, _reverse: bool) -> Vec<PcapNGOption<'_>> {
        type Code = NameResolutionOptionCode;
        let mut options = Vec::new();
        if let Some(ref comment) = self.comment {
            options.push(PcapNGOption::string(Code::Comment.0, comment));
        }
        if let Some(ref name) = self.dns_name {
            options.push(PcapNGOption::string(Code::DnsName.0, name));
        }
        if let Some(addr) = self.dns_ipv4_address {
            options.push(PcapNGOption::new(Code::DnsIpv4Address.0, addr.octets().to_vec()));
        }
        if let Some(addr) = self.dns_ipv6_address {
            options.push(PcapNGOption::new(Code::DnsIpv6Address.0, addr.octets().to_vec()));
        }
        options
    }
}

/// The Name Resolution Block (NRB) is used to support the correlation of numeric addresses
/// (present in the captured packets) and their corresponding canonical names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameResolutionBlock {
    pub records: Vec<NameRecord>,
    pub options: NameResolutionOptions,
}

/// Parse the records area, up to and including the end record
fn parse_name_records<'a>(
    i: &'a [u8],
    reverse: bool,
    errors: &mut ErrorReporter,
) -> Result<(&'a [u8], Vec<NameRecord>), PcapError> {
    let (rem, entries) = parse_options(i, reverse, errors)?;
    let mut records = Vec::with_capacity(entries.len());
    for entry in &entries {
        match NameRecord::from_entry(entry) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => trace!("ignoring name record type {}", entry.code),
            Err(e) => errors.report(e)?,
        }
    }
    Ok((rem, records))
}

impl PcapNGBlock for NameResolutionBlock {
    const BLOCK_TYPE: BlockType = BlockType::NameResolution;

    fn parse_body<'a>(
        i: &'a [u8],
        reverse: bool,
        errors: &mut ErrorReporter,
    ) -> IResult<&'a [u8], Self, PcapError> {
        let (i, records) = parse_name_records(i, reverse, errors).map_err(Err::Error)?;
        let (i, options) =
            NameResolutionOptions::parse_area(i, reverse, errors).map_err(Err::Error)?;
        Ok((i, NameResolutionBlock { records, options }))
    }

    fn body_to_vec(&self, reverse: bool) -> Result<Vec<u8>, PcapError> {
        let entries: Vec<_> = self.records.iter().map(NameRecord::to_entry).collect();
        let mut v = options_to_vec(&entries, reverse)?;
        v.extend_from_slice(&self.options.encode(reverse)?);
        Ok(v)
    }
}
