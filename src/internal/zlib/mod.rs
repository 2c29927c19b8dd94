//! zlib helpers for pack payloads.

pub mod stream;
