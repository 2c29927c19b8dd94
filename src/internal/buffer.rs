//! Fixed-capacity sliding window over a byte source that keeps track of the absolute stream
//! position, so decoders can refill without losing bytes they have seen but not yet consumed.

use std::io::{self, Read};

use crate::errors::VerifyError;

/// Default window size, large enough for every fixed-size field in both formats.
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 12;

/// [`StreamBuffer`] owns a byte arena and an index-based window `offset..offset + length`
/// of bytes that were read from `inner` but not consumed yet.
///
/// Fields:
/// * `inner`: The byte source, read once, never seeked.
/// * `buf`: The arena; its length is the fixed capacity.
/// * `offset`/`length`: The valid window. `offset + length <= buf.len()` always holds.
/// * `position`: How many bytes have been consumed since the start of the stream.
pub struct StreamBuffer<R> {
    inner: R,
    buf: Vec<u8>,
    offset: usize,
    length: usize,
    position: u64,
}

impl<R> StreamBuffer<R>
where
    R: Read,
{
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        Self {
            inner,
            buf: vec![0; capacity],
            offset: 0,
            length: 0,
            position: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Absolute offset of the first unconsumed byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The currently valid bytes, without touching the source.
    pub fn buffer(&self) -> &[u8] {
        &self.buf[self.offset..self.offset + self.length]
    }

    /// Make sure at least `min` bytes are available and return the whole valid window.
    ///
    /// The window may be longer than `min`. If more bytes are needed, the window is first
    /// moved to the head of the arena so each read gets as much contiguous room as possible.
    pub fn fill(&mut self, min: usize) -> Result<&[u8], VerifyError> {
        if min <= self.length {
            return Ok(self.buffer());
        }
        if min > self.capacity() {
            return Err(VerifyError::RequestTooLarge {
                requested: min,
                capacity: self.capacity(),
            });
        }

        self.compact();
        while self.length < min {
            if self.read_more()? == 0 {
                return Err(VerifyError::UnexpectedEndOfInput {
                    offset: self.position,
                    needed: min,
                    available: self.length,
                });
            }
        }

        Ok(self.buffer())
    }

    /// Drop `amt` bytes from the front of the window.
    ///
    /// # Panics
    /// If `amt` exceeds the number of valid bytes.
    pub fn consume(&mut self, amt: usize) {
        assert!(
            amt <= self.length,
            "consume {amt} bytes with only {} buffered",
            self.length
        );
        self.offset += amt;
        self.length -= amt;
        self.position += amt as u64;
    }

    pub fn read_u8(&mut self) -> Result<u8, VerifyError> {
        let b = self.fill(1)?[0];
        self.consume(1);
        Ok(b)
    }

    /// Read exactly `N` bytes into a fixed array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], VerifyError> {
        let mut bytes = [0; N];
        bytes.copy_from_slice(&self.fill(N)?[..N]);
        self.consume(N);
        Ok(bytes)
    }

    /// Consume everything left in the window and the source.
    pub fn read_remaining(&mut self) -> Result<Vec<u8>, VerifyError> {
        let mut out = Vec::new();
        loop {
            out.extend_from_slice(self.buffer());
            self.consume(self.length);
            self.compact();
            if self.read_more()? == 0 {
                return Ok(out);
            }
        }
    }

    /// Move the valid window to the head of the arena.
    fn compact(&mut self) {
        if self.offset != 0 {
            self.buf
                .copy_within(self.offset..self.offset + self.length, 0);
            self.offset = 0;
        }
    }

    /// One read into the free tail of the arena; `Ok(0)` means the source is exhausted.
    fn read_more(&mut self) -> Result<usize, VerifyError> {
        let start = self.offset + self.length;
        if start == self.buf.len() {
            return Ok(0);
        }
        loop {
            match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => {
                    self.length += n;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
