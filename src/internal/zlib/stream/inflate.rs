//! Incremental inflate stream for pack object payloads. The caller owns the input bytes and hands
//! over whatever it has buffered; the stream reports how much of it was actually part of the
//! DEFLATE data, so nothing past the end of one object is swallowed.

use flate2::{Decompress, FlushDecompress, Status};

use crate::errors::VerifyError;

/// Where the stream stands after a [`InflateStream::feed`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InflateStatus {
    /// All supplied input was used up and the stream has not ended yet.
    NeedsInput,
    /// The zlib trailer was seen; no further input belongs to this stream.
    StreamEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InflateProgress {
    /// Bytes taken from the chunk passed to this call.
    pub consumed: usize,
    /// Bytes produced since the stream was created.
    pub total_out: u64,
    pub status: InflateStatus,
}

/// InflateStream decompresses one zlib stream whose decompressed length is known up front.
///
/// Output is written to a reused scratch buffer and discarded; only the count matters when
/// verifying structure.
pub struct InflateStream {
    /// The decompressor doing all the work.
    decompressor: Box<Decompress>,
    scratch: Vec<u8>,
    expected_size: u64,
    /// Pack offset of the owning object, for error context.
    offset: u64,
}

impl InflateStream {
    pub fn new(offset: u64, expected_size: u64, scratch_size: usize) -> Self {
        InflateStream {
            decompressor: Box::new(Decompress::new(true)),
            scratch: vec![0; scratch_size.max(1)],
            expected_size,
            offset,
        }
    }

    pub fn total_out(&self) -> u64 {
        self.decompressor.total_out()
    }

    /// Push `input` through the decompressor until it is used up or the stream ends.
    pub fn feed(&mut self, input: &[u8]) -> Result<InflateProgress, VerifyError> {
        let mut consumed = 0;
        loop {
            let before_in = self.decompressor.total_in();
            let before_out = self.decompressor.total_out();
            let ret = self.decompressor.decompress(
                &input[consumed..],
                &mut self.scratch,
                FlushDecompress::None,
            );
            let read = (self.decompressor.total_in() - before_in) as usize;
            let written = (self.decompressor.total_out() - before_out) as usize;
            consumed += read;

            if self.total_out() > self.expected_size {
                return Err(VerifyError::InflateSizeMismatch {
                    offset: self.offset,
                    expected: self.expected_size,
                    actual: self.total_out(),
                });
            }

            let status = match ret {
                Ok(Status::StreamEnd) => InflateStatus::StreamEnd,
                // Output space ran out; drain again before asking for more input.
                Ok(Status::Ok | Status::BufError) if written == self.scratch.len() => continue,
                Ok(Status::Ok | Status::BufError) if consumed < input.len() && read != 0 => {
                    continue;
                }
                Ok(Status::Ok | Status::BufError) => InflateStatus::NeedsInput,
                Err(e) => {
                    return Err(VerifyError::InflateFailure {
                        offset: self.offset,
                        reason: e.to_string(),
                    });
                }
            };
            return Ok(InflateProgress {
                consumed,
                total_out: self.total_out(),
                status,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{Compression, write::ZlibEncoder};

    use super::*;

    /// Helper to build zlib-compressed bytes from input data.
    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn inflate_whole_stream_stops_at_trailer() {
        let body = b"hello";
        let mut input = zlib_compress(body);
        let stream_len = input.len();
        input.extend_from_slice(b"next object");

        let mut stream = InflateStream::new(12, body.len() as u64, 64);
        let progress = stream.feed(&input).unwrap();
        assert_eq!(progress.status, InflateStatus::StreamEnd);
        assert_eq!(progress.consumed, stream_len);
        assert_eq!(progress.total_out, 5);
    }

    #[test]
    fn inflate_byte_by_byte_with_tiny_scratch() {
        let body: Vec<u8> = (0..4000u32).map(|i| (i * 7 % 251) as u8).collect();
        let input = zlib_compress(&body);

        let mut stream = InflateStream::new(0, body.len() as u64, 3);
        let mut fed = 0;
        loop {
            let progress = stream.feed(&input[fed..fed + 1]).unwrap();
            fed += progress.consumed;
            if progress.status == InflateStatus::StreamEnd {
                break;
            }
            assert_eq!(progress.consumed, 1);
        }
        assert_eq!(fed, input.len());
        assert_eq!(stream.total_out(), body.len() as u64);
    }

    #[test]
    fn more_output_than_declared_is_a_size_mismatch() {
        let input = zlib_compress(b"hello world");
        let mut stream = InflateStream::new(40, 5, 64);
        let err = stream.feed(&input).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::InflateSizeMismatch {
                offset: 40,
                expected: 5,
                ..
            }
        ));
    }

    #[test]
    fn corrupt_stream_returns_error() {
        let data = b"not a valid zlib stream";
        let mut stream = InflateStream::new(7, data.len() as u64, 16);
        let err = stream.feed(data).unwrap_err();
        assert!(matches!(err, VerifyError::InflateFailure { offset: 7, .. }));
    }

    #[test]
    fn partial_input_needs_more() {
        let input = zlib_compress(b"some payload that is long enough");
        let mut stream = InflateStream::new(0, 32, 64);
        let progress = stream.feed(&input[..4]).unwrap();
        assert_eq!(progress.status, InflateStatus::NeedsInput);
        assert_eq!(progress.consumed, 4);
    }
}
