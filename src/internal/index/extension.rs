//! Index extensions: the end-of-index-entries marker that tells where the extension area starts,
//! and the opaque extensions whose placement and declared lengths get checked.

use std::fmt::{self, Display};

use serde::Serialize;

use crate::{
    errors::VerifyError,
    hash::{ObjectHash, SHA1_SIZE},
    internal::signature::{
        SIGNATURE_AND_LENGTH_SIZE, Signature, read_be_u32, read_signature_and_length,
    },
};

/// Payload of the EOIE extension: 4-byte offset + SHA-1.
pub const EOIE_SIZE: u32 = 4 + SHA1_SIZE as u32;
pub const EOIE_SIZE_WITH_HEADER: usize = EOIE_SIZE as usize + SIGNATURE_AND_LENGTH_SIZE;

/// Extension signatures this parser understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtensionKind {
    EndOfIndexEntries,
    CachedTree,
    IndexEntryOffsetTable,
}

impl ExtensionKind {
    pub fn from_signature(signature: Signature) -> Option<ExtensionKind> {
        match signature {
            Signature::EOIE => Some(ExtensionKind::EndOfIndexEntries),
            Signature::TREE => Some(ExtensionKind::CachedTree),
            Signature::IEOT => Some(ExtensionKind::IndexEntryOffsetTable),
            _ => None,
        }
    }

    pub fn signature(self) -> Signature {
        match self {
            ExtensionKind::EndOfIndexEntries => Signature::EOIE,
            ExtensionKind::CachedTree => Signature::TREE,
            ExtensionKind::IndexEntryOffsetTable => Signature::IEOT,
        }
    }
}

/// The EOIE extension, always the last one before the trailing checksum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndOfIndexEntries {
    /// Where the EOIE header itself starts.
    pub offset: u64,
    pub size: u32,
    /// Where the cache entries end and the first extension starts.
    pub entries_end_offset: u32,
    /// Hash over the extension headers; carried, not checked.
    pub checksum: ObjectHash,
}

impl EndOfIndexEntries {
    /// Parse an EOIE at `offset` of `buf`.
    ///
    /// A different signature at that position is not an error, it just means the index has no
    /// EOIE, so `Ok(None)` comes back. Anything else off about the record is a hard error.
    pub fn parse(buf: &[u8], offset: usize) -> Result<Option<EndOfIndexEntries>, VerifyError> {
        let end = offset + EOIE_SIZE_WITH_HEADER;
        if end > buf.len() {
            return Err(VerifyError::UnexpectedEndOfInput {
                offset: offset as u64,
                needed: EOIE_SIZE_WITH_HEADER,
                available: buf.len().saturating_sub(offset),
            });
        }

        let (signature, size) =
            read_signature_and_length(&buf[offset..offset + SIGNATURE_AND_LENGTH_SIZE])?;
        if signature != Signature::EOIE {
            return Ok(None);
        }
        if size != EOIE_SIZE {
            return Err(VerifyError::ExtensionSizeMismatch {
                offset: offset as u64,
                signature,
                declared: size as u64,
                available: EOIE_SIZE as u64,
            });
        }

        let payload = &buf[offset + SIGNATURE_AND_LENGTH_SIZE..end];
        Ok(Some(EndOfIndexEntries {
            offset: offset as u64,
            size,
            entries_end_offset: read_be_u32(&payload[..4])?,
            checksum: ObjectHash::from_bytes(&payload[4..]).map_err(VerifyError::MalformedHeader)?,
        }))
    }
}

/// One index extension, in the order it was recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extension {
    EndOfIndexEntries(EndOfIndexEntries),
    /// `TREE`; payload not interpreted.
    CachedTree { offset: u64, size: u32 },
    /// `IEOT`; payload not interpreted.
    IndexEntryOffsetTable { offset: u64, size: u32 },
}

impl Extension {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            Extension::EndOfIndexEntries(_) => ExtensionKind::EndOfIndexEntries,
            Extension::CachedTree { .. } => ExtensionKind::CachedTree,
            Extension::IndexEntryOffsetTable { .. } => ExtensionKind::IndexEntryOffsetTable,
        }
    }

    pub fn signature(&self) -> Signature {
        self.kind().signature()
    }

    /// Offset of the extension header.
    pub fn offset(&self) -> u64 {
        match self {
            Extension::EndOfIndexEntries(eoie) => eoie.offset,
            Extension::CachedTree { offset, .. }
            | Extension::IndexEntryOffsetTable { offset, .. } => *offset,
        }
    }

    /// Declared payload size, header excluded.
    pub fn size(&self) -> u32 {
        match self {
            Extension::EndOfIndexEntries(eoie) => eoie.size,
            Extension::CachedTree { size, .. } | Extension::IndexEntryOffsetTable { size, .. } => {
                *size
            }
        }
    }
}

impl Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind() {
            ExtensionKind::EndOfIndexEntries => "eoie",
            ExtensionKind::CachedTree => "tree",
            ExtensionKind::IndexEntryOffsetTable => "ieot",
        };
        write!(
            f,
            "[{tag}] signature:{}, offset:{} size:{}",
            self.signature(),
            self.offset(),
            self.size()
        )?;
        if let Extension::EndOfIndexEntries(eoie) = self {
            write!(
                f,
                ", eoieOffset:{}, hash:{}",
                eoie.entries_end_offset, eoie.checksum
            )?;
        }
        Ok(())
    }
}
