//! Git-Verify: a structural checker for the two binary files Git keeps repository metadata in,
//! the staging-area index and the object pack.
//!
//! Goals
//! - Parse both formats byte-exactly with strict checks on magic numbers, versions and offsets.
//! - Read packs as a stream through a fixed-size buffer, inflating each object only to check
//!   that its payload is well formed and has the declared size.
//! - Report the first corruption found, with the offset and the expected/actual values.
//!
//! Core Capabilities
//! - Pack: header, type/size varints, offset-delta and ref-delta base references, zlib payloads.
//! - Index: header, end-of-index-entries extension, cached-tree and entry-offset-table extensions.
//! - Delta bases are checked for placement only; objects are never reconstructed and checksums
//!   are never recomputed.
//!
//! Modules
//! - `internal::buffer`: the sliding stream buffer every reader goes through.
//! - `internal::signature`: 4-byte magic numbers and signature/length headers.
//! - `internal::pack`: pack header, object walk, varint codecs.
//! - `internal::index`: index header and extension walk.
//! - `internal::zlib`: incremental inflate stream.
//! - `config`: buffer sizing.
//! - `errors`: unified error type.
//! - `hash`: raw SHA-1 values as found on disk.
//!
//! Typical Usage
//! - `verify_pack(path)` / `verify_index(path)` for files on disk.
//! - `PackFile::new(reader, &config)?.decode()` or `IndexFile::from_reader(reader, &config)?.parse()`
//!   for any other byte source.

pub mod config;
pub mod errors;
pub mod hash;
pub mod internal;

pub use config::VerifyConfig;
pub use errors::VerifyError;
pub use internal::{
    index::{IndexFile, IndexHeader, IndexReport, verify_index, verify_index_with_config},
    pack::{
        PackFile, PackHeader, PackReport,
        decode::{verify_pack, verify_pack_with_config},
    },
};
