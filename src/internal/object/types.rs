//! Pack object type enumeration.

use std::fmt::{self, Display};

use serde::Serialize;

/// In Git, each object type is assigned a unique integer value, which is carried in bits 4-6 of
/// the first byte of every pack object header.
///
/// * `Commit` (1), `Tree` (2), `Blob` (3), `Tag` (4): base objects stored whole.
/// * `OffsetDelta` (6): a delta whose base is addressed by a negative offset inside the pack.
/// * `HashDelta` (7): a delta whose base is addressed by its object id.
///
/// Values 0 and 5 are reserved and never valid in a pack.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Commit = 1,
    Tree,
    Blob,
    Tag,
    OffsetDelta = 6,
    HashDelta,
}

/// Display trait for Git objects type
impl Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ObjectType::Blob => write!(f, "blob"),
            ObjectType::Tree => write!(f, "tree"),
            ObjectType::Commit => write!(f, "commit"),
            ObjectType::Tag => write!(f, "tag"),
            ObjectType::OffsetDelta => write!(f, "ofs-delta"),
            ObjectType::HashDelta => write!(f, "ref-delta"),
        }
    }
}

impl ObjectType {
    /// Decode 3-bit pack header type id to object type, `None` for the reserved ids.
    pub fn from_pack_type_u8(number: u8) -> Option<ObjectType> {
        match number {
            1 => Some(ObjectType::Commit),
            2 => Some(ObjectType::Tree),
            3 => Some(ObjectType::Blob),
            4 => Some(ObjectType::Tag),
            6 => Some(ObjectType::OffsetDelta),
            7 => Some(ObjectType::HashDelta),
            _ => None,
        }
    }

    /// Convert object type to 3-bit pack header type id.
    pub fn to_pack_type_u8(self) -> u8 {
        self as u8
    }

    /// Commit, tree, blob and tag are stored whole; the two delta types are not.
    pub fn is_base(&self) -> bool {
        match self {
            ObjectType::Commit | ObjectType::Tree | ObjectType::Blob | ObjectType::Tag => true,
            ObjectType::OffsetDelta | ObjectType::HashDelta => false,
        }
    }
}
