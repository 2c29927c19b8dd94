//! Internal building blocks (stream buffer, signatures, object types, zlib, pack and index
//! parsers) that power the public verify APIs.

pub mod buffer;
pub mod index;
pub mod object;
pub mod pack;
pub mod signature;
pub mod zlib;
