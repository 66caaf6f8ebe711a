use rusticata_macros::newtype_enum;

/// Link-layer header type of an interface
///
/// Stored as the 16-bit value found in the Interface Description block. Values without
/// a name below are kept as-is.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Linktype(pub u16);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,
    AX25 = 3,
    IEEE802_5 = 6,
    ARCNET_BSD = 7,
    SLIP = 8,
    PPP = 9,
    FDDI = 10,
    PPP_HDLC = 50,
    PPP_ETHER = 51,
    ATM_RFC1483 = 100,
    RAW = 101,
    C_HDLC = 104,
    IEEE802_11 = 105,
    FRELAY = 107,
    LOOP = 108,
    LINUX_SLL = 113,
    LTALK = 114,
    PFLOG = 117,
    IEEE802_11_PRISM = 119,
    IP_OVER_FC = 122,
    SUNATM = 123,
    IEEE802_11_RADIOTAP = 127,
    ARCNET_LINUX = 129,
    LINUX_IRDA = 144,
    IEEE802_11_AVS = 163,
    BLUETOOTH_HCI_H4 = 187,
    USB_LINUX = 189,
    PPI = 192,
    IEEE802_15_4 = 195,
    SITA = 196,
    ERF = 197,
    IPV4 = 228,
    IPV6 = 229,
    NFLOG = 239,
    NETANALYZER = 240,
    IPOIB = 242,
    WIRESHARK_UPPER_PDU = 252,
    LINUX_SLL2 = 276,
}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_linktype() {
        assert_eq!(Linktype::ETHERNET.to_string(), "ETHERNET");
        assert_eq!(Linktype(1), Linktype::ETHERNET);
        assert_eq!(Linktype::default(), Linktype::NULL);
    }
}
