use crate::error::PcapError;
use crate::serialize::ToVec;

use super::*;

/// A Section Header Block and the interfaces declared in its section
///
/// Interfaces are indexed by order of appearance: packet blocks refer to them with
/// their interface id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionGroup {
    pub header: SectionHeaderBlock,
    pub interfaces: Vec<InterfaceDescriptionBlock>,
}

impl SectionGroup {
    /// Build a group, checking it declares at least one interface
    pub fn new(
        header: SectionHeaderBlock,
        interfaces: Vec<InterfaceDescriptionBlock>,
    ) -> Result<SectionGroup, PcapError> {
        if interfaces.is_empty() {
            return Err(PcapError::EmptyInterfaceList);
        }
        Ok(SectionGroup { header, interfaces })
    }

    /// A default section with a single Ethernet interface (snaplen 65535)
    pub fn create_empty(reverse_byte_order: bool) -> SectionGroup {
        SectionGroup {
            header: SectionHeaderBlock::new(reverse_byte_order),
            interfaces: vec![InterfaceDescriptionBlock::default()],
        }
    }

    /// Byte order recorded in the section header
    #[inline]
    pub fn reverse_byte_order(&self) -> bool {
        self.header.reverse_byte_order
    }

    /// Interface with the given id, if declared
    pub fn interface(&self, interface_id: u32) -> Option<&InterfaceDescriptionBlock> {
        self.interfaces.get(interface_id as usize)
    }
}

impl ToVec for SectionGroup {
    /// Serialize the header followed by all interfaces
    fn to_vec(&self, reverse_byte_order: bool) -> Result<Vec<u8>, PcapError> {
        let mut v = self.header.encode(reverse_byte_order)?.to_vec(reverse_byte_order)?;
        for idb in &self.interfaces {
            v.extend_from_slice(&idb.encode(reverse_byte_order)?.to_vec(reverse_byte_order)?);
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReporter;
    use crate::linktype::Linktype;

    #[test]
    fn group_needs_an_interface() {
        let res = SectionGroup::new(SectionHeaderBlock::default(), Vec::new());
        assert!(matches!(res, Err(PcapError::EmptyInterfaceList)));
        let group = SectionGroup::new(
            SectionHeaderBlock::default(),
            vec![InterfaceDescriptionBlock::new(Linktype::RAW, 1500)],
        )
        .expect("group");
        assert_eq!(group.interface(0).map(|idb| idb.snaplen), Some(1500));
        assert!(group.interface(1).is_none());
    }

    #[test]
    fn empty_group_serialization() {
        for &reverse in &[false, true] {
            let group = SectionGroup::create_empty(reverse);
            assert_eq!(group.reverse_byte_order(), reverse);
            let v = group.to_vec(reverse).expect("serialize");
            // SHB: 12 + 16 + 4 bytes, IDB: 12 + 8 + 4 bytes
            assert_eq!(v.len(), 32 + 24);
            let mut errors = ErrorReporter::fatal();
            let (rem, shb) = parse_block(&v, reverse, 0, &mut errors).expect("shb");
            assert_eq!(shb, Block::SectionHeader(group.header.clone()));
            let (rem, idb) = parse_block(rem, reverse, 32, &mut errors).expect("idb");
            assert!(rem.is_empty());
            assert_eq!(idb, Block::InterfaceDescription(group.interfaces[0].clone()));
        }
    }
}
