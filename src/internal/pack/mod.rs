//! Pack file verifier that walks every object of a pack stream following the
//! [pack-format spec](https://git-scm.com/docs/pack-format): header, per-object varints,
//! delta base references and the zlib payloads, without keeping any object content.

pub mod decode;
pub mod entry;
pub mod utils;

use std::fmt::{self, Display};

use serde::Serialize;

use crate::{
    hash::ObjectHash,
    internal::{buffer::StreamBuffer, pack::entry::Object},
};

/// `PACK` + version + object count.
pub const PACK_HEADER_SIZE: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PackHeader {
    /// 2 or 3.
    pub version: u32,
    pub object_count: u32,
}

impl Display for PackHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[header] signature:PACK, version:{}, objects:{}",
            self.version, self.object_count
        )
    }
}

/// Representation of a pack file being verified.
///
/// Owns the stream buffer over its byte source and the catalog of objects decoded so far.
pub struct PackFile<R> {
    input: StreamBuffer<R>,
    inflate_chunk_size: usize,
    pub header: Option<PackHeader>,
    pub objects: Vec<Object>,
}

/// Outcome of a successful pack verification.
#[derive(Clone, Debug, Serialize)]
pub struct PackReport {
    pub header: PackHeader,
    /// Every object in stream order, `header.object_count` long.
    pub objects: Vec<Object>,
    /// Trailing checksum as found on disk; never verified.
    pub trailer: Option<ObjectHash>,
    /// Total size of the stream, trailer included.
    pub bytes_read: u64,
}
