//! Four-byte magic numbers shared by the index and pack formats, plus the helpers
//! that read a big-endian signature/length pair out of a fixed 8-byte slot.

use std::fmt::{self, Display};

use byteorder::{BigEndian, ByteOrder};
use serde::{Serialize, Serializer};

use crate::errors::VerifyError;

/// Size of an extension header: 4-byte signature + 4-byte big-endian length.
pub const SIGNATURE_AND_LENGTH_SIZE: usize = 8;

/// A big-endian 4-byte tag, e.g. `DIRC` or `PACK`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature(pub u32);

impl Signature {
    /// `DIRC`, the staging-area index magic.
    pub const INDEX: Signature = Signature(0x4449_5243);
    /// `PACK`, the pack file magic.
    pub const PACK: Signature = Signature(0x5041_434B);
    /// `EOIE`, end of index entries.
    pub const EOIE: Signature = Signature(0x454F_4945);
    /// `TREE`, cached tree.
    pub const TREE: Signature = Signature(0x5452_4545);
    /// `IEOT`, index entry offset table.
    pub const IEOT: Signature = Signature(0x4945_4F54);

    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// Renders the tag as four ASCII characters, only meant for diagnostics.
impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Read a big-endian u32 from the first four bytes of `buf`.
pub fn read_be_u32(buf: &[u8]) -> Result<u32, VerifyError> {
    if buf.len() < 4 {
        return Err(VerifyError::MalformedHeader(format!(
            "need 4 bytes for a big-endian u32, got {}",
            buf.len()
        )));
    }
    Ok(BigEndian::read_u32(&buf[..4]))
}

/// Split an 8-byte slot into its signature and declared length.
pub fn read_signature_and_length(buf: &[u8]) -> Result<(Signature, u32), VerifyError> {
    if buf.len() < SIGNATURE_AND_LENGTH_SIZE {
        return Err(VerifyError::MalformedHeader(format!(
            "invalid extension header length {}",
            buf.len()
        )));
    }
    let signature = Signature(BigEndian::read_u32(&buf[0..4]));
    let length = BigEndian::read_u32(&buf[4..8]);
    Ok((signature, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        assert_eq!(Signature::INDEX.to_string(), "DIRC");
        assert_eq!(Signature::PACK.to_string(), "PACK");
        assert_eq!(Signature::EOIE.to_string(), "EOIE");
        assert_eq!(Signature(0x0041_4243).to_string(), ".ABC");
    }

    #[test]
    fn test_read_signature_and_length() {
        let buf = [b'T', b'R', b'E', b'E', 0, 0, 1, 2, 0xff];
        let (sig, len) = read_signature_and_length(&buf).unwrap();
        assert_eq!(sig, Signature::TREE);
        assert_eq!(len, 0x0102);
    }

    #[test]
    fn test_short_header_is_malformed() {
        let err = read_signature_and_length(b"TREE\0\0\0").unwrap_err();
        assert!(matches!(err, VerifyError::MalformedHeader(_)));

        let err = read_be_u32(&[1, 2]).unwrap_err();
        assert!(matches!(err, VerifyError::MalformedHeader(_)));
    }

    #[test]
    fn test_signature_serializes_as_tag() {
        assert_eq!(serde_json::to_string(&Signature::IEOT).unwrap(), "\"IEOT\"");
    }
}
