use crate::error::PcapError;

/// Hash algorithm of a packet hash option
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HashAlgorithm {
    TwoSComplement = 0,
    Xor = 1,
    Crc32 = 2,
    Md5 = 3,
    Sha1 = 4,
    /// Any algorithm byte not listed above
    Invalid = 7,
}

impl From<u8> for HashAlgorithm {
    fn from(v: u8) -> Self {
        match v {
            0 => HashAlgorithm::TwoSComplement,
            1 => HashAlgorithm::Xor,
            2 => HashAlgorithm::Crc32,
            3 => HashAlgorithm::Md5,
            4 => HashAlgorithm::Sha1,
            _ => HashAlgorithm::Invalid,
        }
    }
}

/// Hash of a packet: algorithm byte followed by the digest
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HashValue {
    pub algorithm: HashAlgorithm,
    pub value: Vec<u8>,
}

impl HashValue {
    pub fn new(algorithm: HashAlgorithm, value: Vec<u8>) -> Self {
        HashValue { algorithm, value }
    }

    /// Decode an option value
    ///
    /// At least one byte of digest is required. An unknown algorithm byte is not an error
    /// and decodes to [`HashAlgorithm::Invalid`].
    pub fn from_bytes(i: &[u8]) -> Result<HashValue, PcapError> {
        match i {
            [algorithm, value @ ..] if !value.is_empty() => Ok(HashValue {
                algorithm: HashAlgorithm::from(*algorithm),
                value: value.to_vec(),
            }),
            _ => Err(PcapError::InvalidHashValue { received: i.len() }),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(1 + self.value.len());
        v.push(self.algorithm as u8);
        v.extend_from_slice(&self.value);
        v
    }
}
