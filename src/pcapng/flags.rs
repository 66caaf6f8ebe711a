use std::fmt;

/// Link-layer information of a packet (`epb_flags` option)
///
/// Accessors test bits only, no consistency check is done between them.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PacketFlags(pub u32);

macro_rules! flag_accessors {
    ($($(#[$meta:meta])* $name:ident = $mask:expr),* $(,)?) => {
        impl PacketFlags {
            $(
                $(#[$meta])*
                #[inline]
                pub fn $name(&self) -> bool {
                    self.0 & $mask == $mask
                }
            )*
        }
    };
}

flag_accessors! {
    inbound = 0x0000_0001,
    outbound = 0x0000_0002,
    unicast = 0x0000_0004,
    multicast = 0x0000_0008,
    /// Both reception type bits set
    broadcast = 0x0000_000C,
    promiscuous = 0x0000_0010,
    /// All the FCS length bits are set
    fcs_length = 0x0000_01E0,
    crc_error = 0x0100_0000,
    packet_too_long = 0x0200_0000,
    packet_too_short = 0x0400_0000,
    wrong_inter_frame_gap = 0x0800_0000,
    unaligned_frame = 0x1000_0000,
    start_frame_delimiter_error = 0x2000_0000,
    preamble_error = 0x4000_0000,
    symbol_error = 0x8000_0000,
}

impl PacketFlags {
    /// Length of the Frame Check Sequence, in bytes (bits 5-8)
    pub fn fcs_len(&self) -> u8 {
        ((self.0 >> 5) & 0xf) as u8
    }

    /// Link-layer dependent error bits (bits 16-31)
    pub fn link_layer_errors(&self) -> u16 {
        (self.0 >> 16) as u16
    }
}

impl From<u32> for PacketFlags {
    fn from(v: u32) -> Self {
        PacketFlags(v)
    }
}

impl fmt::Debug for PacketFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PacketFlags({:#010x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction() {
        assert!(PacketFlags(511).inbound());
        assert!(!PacketFlags(512).inbound());
        assert!(PacketFlags(254).outbound());
        assert!(!PacketFlags(253).outbound());
    }

    #[test]
    fn reception_type() {
        let flags = PacketFlags(255);
        assert!(flags.unicast());
        assert!(flags.multicast());
        assert!(flags.broadcast());
        let flags = PacketFlags(128);
        assert!(!flags.unicast());
        assert!(!flags.multicast());
        assert!(!flags.broadcast());
    }

    #[test]
    fn fcs() {
        assert!(PacketFlags(480).fcs_length());
        assert!(!PacketFlags(128).fcs_length());
        assert_eq!(PacketFlags(4 << 5).fcs_len(), 4);
    }

    #[test]
    fn error_bits() {
        let flags = PacketFlags(0xFF00_0000);
        assert!(flags.crc_error());
        assert!(flags.packet_too_long());
        assert!(flags.packet_too_short());
        assert!(flags.wrong_inter_frame_gap());
        assert!(flags.unaligned_frame());
        assert!(flags.start_frame_delimiter_error());
        assert!(flags.preamble_error());
        assert!(flags.symbol_error());
        assert_eq!(flags.link_layer_errors(), 0xff00);
        let flags = PacketFlags(128);
        assert!(!flags.crc_error());
        assert!(!flags.symbol_error());
    }
}
