//! Per-object records produced while walking a pack: the decoded object header and its position
//! in the file.

use std::fmt::{self, Display};

use serde::Serialize;

use crate::{hash::ObjectHash, internal::object::types::ObjectType};

/// Decoded pack object header. Delta variants carry the reference to their base; the base itself
/// is never resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectHeader {
    /// Commit, tree, blob or tag stored whole.
    Base { obj_type: ObjectType, size: u64 },
    /// Delta against the object starting at the absolute pack offset `base_offset`.
    OffsetDelta { size: u64, base_offset: u64 },
    /// Delta against the object with id `base_hash`.
    HashDelta { size: u64, base_hash: ObjectHash },
}

impl ObjectHeader {
    pub fn obj_type(&self) -> ObjectType {
        match self {
            ObjectHeader::Base { obj_type, .. } => *obj_type,
            ObjectHeader::OffsetDelta { .. } => ObjectType::OffsetDelta,
            ObjectHeader::HashDelta { .. } => ObjectType::HashDelta,
        }
    }

    /// Size of the inflated payload (for deltas, of the delta instructions).
    pub fn size(&self) -> u64 {
        match self {
            ObjectHeader::Base { size, .. }
            | ObjectHeader::OffsetDelta { size, .. }
            | ObjectHeader::HashDelta { size, .. } => *size,
        }
    }
}

///
/// One object of a pack, in stream order
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Object {
    /// 0-based position in the pack.
    pub index: u32,
    /// Absolute offset of the object header.
    pub offset: u64,
    pub header: ObjectHeader,
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index={} offset={}, type={}, size={}",
            self.index,
            self.offset,
            self.header.obj_type(),
            self.header.size()
        )?;
        match &self.header {
            ObjectHeader::Base { .. } => Ok(()),
            ObjectHeader::OffsetDelta { base_offset, .. } => write!(f, ", base={base_offset}"),
            ObjectHeader::HashDelta { base_hash, .. } => write!(f, ", base={base_hash}"),
        }
    }
}
