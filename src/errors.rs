//! Error types for the git-verify crate.
//!
//! This module defines the single error enumeration returned by the buffered
//! reader, the pack object decoder and the index extension parser. It integrates
//! with `thiserror` to provide rich `Display` implementations.
//!
//! Notes:
//! - Variants carry the absolute byte offset and the expected/actual values so a
//!   corrupted file can be diagnosed from the message alone.
//! - The first error aborts the enclosing parse.

use thiserror::Error;

use crate::internal::signature::Signature;

#[derive(Error, Debug)]
/// Unified error enumeration for pack and index verification.
pub enum VerifyError {
    /// Wrong magic number, version or fixed-size header length.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The byte source ran dry before a required field was complete.
    #[error("Unexpected end of input at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEndOfInput {
        offset: u64,
        needed: usize,
        available: usize,
    },

    /// A single read asked for more than the stream buffer can ever hold.
    #[error("Cannot fill {requested} bytes, buffer capacity is {capacity}")]
    RequestTooLarge { requested: usize, capacity: usize },

    /// Pack object type bits outside commit/tree/blob/tag/ofs-delta/ref-delta.
    #[error("Bad object type {type_id} at offset {offset}")]
    UnknownObjectType { offset: u64, type_id: u8 },

    /// Index extension signature this parser does not know.
    #[error("Unknown extension signature `{signature}` at offset {offset}")]
    UnknownExtensionSignature { offset: u64, signature: Signature },

    /// Offset-delta base would lie at or before the start of the pack, or at/after the delta itself.
    #[error("Delta base offset is out of bound: offset={offset}, distance={distance}")]
    DeltaBaseOutOfBounds { offset: u64, distance: u64 },

    /// Variable-length object size does not fit into 64 bits.
    #[error("Object size overflows 64 bits at offset {offset}")]
    SizeOverflow { offset: u64 },

    /// The zlib stream of an object is corrupt.
    #[error("Inflate failed for object at offset {offset}: {reason}")]
    InflateFailure { offset: u64, reason: String },

    /// The inflated payload length differs from the size declared in the object header.
    #[error("Inflated size mismatch for object at offset {offset}: expected {expected}, got {actual}")]
    InflateSizeMismatch {
        offset: u64,
        expected: u64,
        actual: u64,
    },

    /// Declared extension size disagrees with the bytes available for its payload.
    #[error(
        "Extension `{signature}` at offset {offset} declares {declared} bytes, {available} available"
    )]
    ExtensionSizeMismatch {
        offset: u64,
        signature: Signature,
        declared: u64,
        available: u64,
    },

    /// Unusable configuration value.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error from the underlying byte source.
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}
