use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::PcapError;

use super::option::option_array;

/// IPv4 address and netmask of an interface (`if_IPv4addr` option, 8 bytes)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ipv4AddressMask {
    pub address: Ipv4Addr,
    pub mask: Ipv4Addr,
}

impl Ipv4AddressMask {
    pub const LEN: usize = 8;

    pub fn new(address: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Ipv4AddressMask { address, mask }
    }

    pub fn from_bytes(field: &'static str, value: &[u8]) -> Result<Self, PcapError> {
        let b: [u8; 8] = option_array(field, value)?;
        Ok(Ipv4AddressMask {
            address: Ipv4Addr::new(b[0], b[1], b[2], b[3]),
            mask: Ipv4Addr::new(b[4], b[5], b[6], b[7]),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(Self::LEN);
        v.extend_from_slice(&self.address.octets());
        v.extend_from_slice(&self.mask.octets());
        v
    }
}

/// Dotted address and mask, separated by a space: `192.168.0.1 255.255.255.0`
impl fmt::Display for Ipv4AddressMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.address, self.mask)
    }
}

/// IPv6 address and prefix length of an interface (`if_IPv6addr` option, 17 bytes)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ipv6AddressPrefix {
    pub address: Ipv6Addr,
    pub prefix_len: u8,
}

impl Ipv6AddressPrefix {
    pub const LEN: usize = 17;

    pub fn new(address: Ipv6Addr, prefix_len: u8) -> Self {
        Ipv6AddressPrefix {
            address,
            prefix_len,
        }
    }

    pub fn from_bytes(field: &'static str, value: &[u8]) -> Result<Self, PcapError> {
        let b: [u8; 17] = option_array(field, value)?;
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&b[..16]);
        Ok(Ipv6AddressPrefix {
            address: Ipv6Addr::from(octets),
            prefix_len: b[16],
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(Self::LEN);
        v.extend_from_slice(&self.address.octets());
        v.push(self.prefix_len);
        v
    }
}

/// Eight groups of four hex digits (not compressed), then the prefix length:
/// `2001:0db8:85a3:08d3:1319:8a2e:0370:7344/64`
impl fmt::Display for Ipv6AddressPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (idx, group) in self.address.segments().iter().enumerate() {
            if idx > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:04x}", group)?;
        }
        write!(f, "/{}", self.prefix_len)
    }
}
