use std::io::Write;

use cookie_factory::combinator::slice;
use cookie_factory::SerializeFn;
use rusticata_macros::align32;

use crate::error::PcapError;

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation, reversing the byte order of every multi-byte
    /// field if `reverse_byte_order` is true.
    fn to_vec(&self, reverse_byte_order: bool) -> Result<Vec<u8>, PcapError>;
}

/// Number of zero bytes needed to pad `unaligned_length` to the next multiple of 4
#[inline]
pub(crate) fn padding_len(unaligned_length: usize) -> usize {
    (4 - unaligned_length % 4) % 4
}

pub(crate) fn padding_for<'a, W: Write + 'a>(unaligned_length: usize) -> impl SerializeFn<W> + 'a {
    let length = align32!(unaligned_length) - unaligned_length;
    slice(if length > 0 {
        &[0, 0, 0, 0][..length]
    } else {
        b""
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding() {
        assert_eq!(padding_len(0), 0);
        assert_eq!(padding_len(98), 2);
        assert_eq!(padding_len(155), 1);
        assert_eq!(padding_len(156), 0);
        let v = cookie_factory::gen_simple(padding_for(5), Vec::new()).expect("gen");
        assert_eq!(v, vec![0, 0, 0]);
    }
}
