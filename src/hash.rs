//! In Git, the SHA-1 hash algorithm is used to identify objects and to seal files with a trailing
//! checksum. This crate never computes those hashes; it only carries the raw 20 bytes it finds in
//! ref-delta headers, index extensions and pack trailers so callers can print or compare them.

use std::{fmt::Display, str::FromStr};

use serde::{Serialize, Serializer};

/// Size in bytes of a raw SHA-1 value.
pub const SHA1_SIZE: usize = 20;

/// The [`ObjectHash`] struct, encapsulating a `[u8; 20]` array, represents a raw Git SHA-1 value
/// as it appears on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectHash(pub [u8; SHA1_SIZE]);

impl Display for ObjectHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for ObjectHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for ObjectHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a 40-character hexadecimal string.
impl FromStr for ObjectHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| e.to_string())?;
        ObjectHash::from_bytes(&bytes)
    }
}

impl ObjectHash {
    /// Create ObjectHash from a byte slice, which must be exactly 20 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<ObjectHash, String> {
        if bytes.len() != SHA1_SIZE {
            return Err(format!(
                "Invalid byte length: got {}, expected {}",
                bytes.len(),
                SHA1_SIZE
            ));
        }
        let mut h = [0u8; SHA1_SIZE];
        h.copy_from_slice(bytes);
        Ok(ObjectHash(h))
    }
}
