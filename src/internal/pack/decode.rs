//! Streaming decode of a pack: header, then one object at a time straight off the stream buffer,
//! inflating each payload only to check its length.

use std::{fs::File, io::Read, path::Path};

use crate::{
    config::VerifyConfig,
    errors::VerifyError,
    hash::{ObjectHash, SHA1_SIZE},
    internal::{
        buffer::StreamBuffer,
        object::types::ObjectType,
        pack::{
            PACK_HEADER_SIZE, PackFile, PackHeader, PackReport,
            entry::{Object, ObjectHeader},
            utils::{read_offset_encoding, read_type_and_size, resolve_base_offset},
        },
        signature::{Signature, read_be_u32},
        zlib::stream::inflate::{InflateStatus, InflateStream},
    },
};

impl<R> PackFile<R>
where
    R: Read,
{
    pub fn new(inner: R, config: &VerifyConfig) -> Result<Self, VerifyError> {
        Ok(PackFile {
            input: StreamBuffer::with_capacity(inner, config.buffer_capacity()?),
            inflate_chunk_size: config.inflate_chunk_size()?,
            header: None,
            objects: Vec::new(),
        })
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.input.position()
    }

    /// Check the 12-byte pack header: `PACK`, version 2 or 3, object count.
    pub fn parse_header(&mut self) -> Result<PackHeader, VerifyError> {
        let header = self.input.read_array::<PACK_HEADER_SIZE>()?;

        let signature = Signature(read_be_u32(&header[0..4])?);
        if signature != Signature::PACK {
            return Err(VerifyError::MalformedHeader(format!(
                "bad pack signature `{signature}` ({:02x?})",
                &header[0..4]
            )));
        }

        let version = read_be_u32(&header[4..8])?;
        if version != 2 && version != 3 {
            return Err(VerifyError::MalformedHeader(format!(
                "bad pack version {version}"
            )));
        }

        let header = PackHeader {
            version,
            object_count: read_be_u32(&header[8..12])?,
        };
        tracing::info!("{}", header);
        self.header = Some(header);
        Ok(header)
    }

    /// Decode the object starting at the current offset and append it to the catalog.
    pub fn parse_object(&mut self, index: u32) -> Result<&Object, VerifyError> {
        let offset = self.input.position();
        let (type_id, size) = read_type_and_size(offset, || self.input.read_u8())?;

        let header = match ObjectType::from_pack_type_u8(type_id) {
            Some(obj_type) if obj_type.is_base() => ObjectHeader::Base { obj_type, size },
            Some(ObjectType::OffsetDelta) => {
                let distance = read_offset_encoding(offset, || self.input.read_u8())?;
                ObjectHeader::OffsetDelta {
                    size,
                    base_offset: resolve_base_offset(offset, distance)?,
                }
            }
            Some(ObjectType::HashDelta) => ObjectHeader::HashDelta {
                size,
                base_hash: ObjectHash(self.input.read_array::<SHA1_SIZE>()?),
            },
            Some(_) | None => return Err(VerifyError::UnknownObjectType { offset, type_id }),
        };

        let object = Object {
            index,
            offset,
            header,
        };
        tracing::debug!("{}", object);

        self.inflate_payload(offset, size)?;
        self.objects.push(object);
        Ok(&self.objects[self.objects.len() - 1])
    }

    /// Run the zlib payload of one object through a fresh inflate stream.
    ///
    /// The buffer only advances by what the inflater actually consumed, so bytes of the next
    /// object stay buffered.
    fn inflate_payload(&mut self, offset: u64, size: u64) -> Result<(), VerifyError> {
        let mut stream = InflateStream::new(offset, size, self.inflate_chunk_size);

        loop {
            let available = self.input.fill(1)?;
            let progress = stream.feed(available)?;
            self.input.consume(progress.consumed);

            match progress.status {
                InflateStatus::StreamEnd => break,
                InflateStatus::NeedsInput if progress.consumed == 0 => {
                    return Err(VerifyError::InflateFailure {
                        offset,
                        reason: "inflate made no progress".to_string(),
                    });
                }
                InflateStatus::NeedsInput => {}
            }
        }

        if stream.total_out() != size {
            return Err(VerifyError::InflateSizeMismatch {
                offset,
                expected: size,
                actual: stream.total_out(),
            });
        }
        Ok(())
    }

    /// Decode every remaining object, reading the header first if that has not happened yet.
    pub fn parse_objects(&mut self) -> Result<PackHeader, VerifyError> {
        let header = match self.header {
            Some(header) => header,
            None => self.parse_header()?,
        };
        for i in self.objects.len() as u32..header.object_count {
            self.parse_object(i)?;
        }
        Ok(header)
    }

    /// Walk the whole pack and hand back the catalog.
    ///
    /// Whatever follows the last object is taken as the trailer and recorded without checking it.
    pub fn decode(mut self) -> Result<PackReport, VerifyError> {
        let header = self.parse_objects()?;

        let rest = self.input.read_remaining()?;
        let trailer = match rest.len() {
            SHA1_SIZE => ObjectHash::from_bytes(&rest).ok(),
            0 => {
                tracing::warn!("pack has no trailer after {} objects", header.object_count);
                None
            }
            n => {
                tracing::warn!("expected a {SHA1_SIZE}-byte pack trailer, found {n} bytes");
                None
            }
        };

        Ok(PackReport {
            header,
            objects: self.objects,
            trailer,
            bytes_read: self.input.position(),
        })
    }
}

/// Verify the pack at `path` with the default configuration.
pub fn verify_pack(path: impl AsRef<Path>) -> Result<PackReport, VerifyError> {
    verify_pack_with_config(path, &VerifyConfig::default())
}

pub fn verify_pack_with_config(
    path: impl AsRef<Path>,
    config: &VerifyConfig,
) -> Result<PackReport, VerifyError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let report = PackFile::new(file, config)?.decode()?;
    tracing::info!(
        "{} ok: {} objects, {} bytes",
        path.display(),
        report.objects.len(),
        report.bytes_read
    );
    Ok(report)
}
