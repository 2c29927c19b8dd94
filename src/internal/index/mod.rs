//! Staging-area index (`.git/index`) verifier: checks the fixed header, finds the
//! end-of-index-entries extension at the tail of the file and walks the extensions it points to.
//! Cache entries themselves are skipped.

pub mod extension;

use std::{
    fmt::{self, Display},
    fs::File,
    io::Read,
    path::Path,
};

use serde::Serialize;

use crate::{
    config::VerifyConfig,
    errors::VerifyError,
    hash::SHA1_SIZE,
    internal::{
        buffer::StreamBuffer,
        index::extension::{EOIE_SIZE_WITH_HEADER, EndOfIndexEntries, Extension, ExtensionKind},
        signature::{SIGNATURE_AND_LENGTH_SIZE, Signature, read_be_u32, read_signature_and_length},
    },
};

/// `DIRC` + version + entry count.
pub const INDEX_HEADER_SIZE: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IndexHeader {
    /// 2, 3 or 4.
    pub version: u32,
    pub entry_count: u32,
}

impl Display for IndexHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[header] signature:{}, version:{}, entriesCount:{}",
            Signature::INDEX,
            self.version,
            self.entry_count
        )
    }
}

/// An index file held in memory; locating the EOIE needs the total file size.
pub struct IndexFile {
    data: Vec<u8>,
    pub header: Option<IndexHeader>,
    pub extensions: Vec<Extension>,
}

/// Outcome of a successful index verification.
#[derive(Clone, Debug, Serialize)]
pub struct IndexReport {
    pub header: IndexHeader,
    pub file_size: u64,
    /// The EOIE first when present, then the other extensions in on-disk order.
    pub extensions: Vec<Extension>,
}

impl IndexReport {
    pub fn end_of_entries(&self) -> Option<&EndOfIndexEntries> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::EndOfIndexEntries(eoie) => Some(eoie),
            _ => None,
        })
    }

    /// Extensions other than the EOIE.
    pub fn trailing_extensions(&self) -> impl Iterator<Item = &Extension> {
        self.extensions
            .iter()
            .filter(|ext| ext.kind() != ExtensionKind::EndOfIndexEntries)
    }
}

impl IndexFile {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        IndexFile {
            data,
            header: None,
            extensions: Vec::new(),
        }
    }

    /// Drain `reader` through a stream buffer sized by `config`.
    pub fn from_reader<R: Read>(reader: R, config: &VerifyConfig) -> Result<Self, VerifyError> {
        let mut input = StreamBuffer::with_capacity(reader, config.buffer_capacity()?);
        Ok(Self::from_bytes(input.read_remaining()?))
    }

    pub fn file_size(&self) -> usize {
        self.data.len()
    }

    pub fn parse_header(&mut self) -> Result<IndexHeader, VerifyError> {
        if self.data.len() < INDEX_HEADER_SIZE {
            return Err(VerifyError::UnexpectedEndOfInput {
                offset: 0,
                needed: INDEX_HEADER_SIZE,
                available: self.data.len(),
            });
        }

        let signature = Signature(read_be_u32(&self.data[0..4])?);
        if signature != Signature::INDEX {
            return Err(VerifyError::MalformedHeader(format!(
                "index parse header failed: expect signature: {}, actual signature: {}",
                Signature::INDEX,
                signature
            )));
        }

        let version = read_be_u32(&self.data[4..8])?;
        if !(2..=4).contains(&version) {
            return Err(VerifyError::MalformedHeader(format!(
                "invalid index header version {version}"
            )));
        }

        let header = IndexHeader {
            version,
            entry_count: read_be_u32(&self.data[8..12])?,
        };
        tracing::info!("{}", header);
        self.header = Some(header);
        Ok(header)
    }

    /// Look for the EOIE right before the trailing checksum.
    fn parse_end_of_index_entries(&mut self) -> Result<Option<EndOfIndexEntries>, VerifyError> {
        let ext_offset = match self
            .data
            .len()
            .checked_sub(EOIE_SIZE_WITH_HEADER + SHA1_SIZE)
        {
            Some(offset) if offset >= INDEX_HEADER_SIZE => offset,
            // a tail position inside the 12-byte header cannot hold an EOIE
            _ => return Ok(None),
        };

        let Some(eoie) = EndOfIndexEntries::parse(&self.data, ext_offset)? else {
            return Ok(None);
        };

        let entries_end = eoie.entries_end_offset as usize;
        if entries_end < INDEX_HEADER_SIZE || entries_end > ext_offset {
            return Err(VerifyError::MalformedHeader(format!(
                "end of index entries offset {entries_end} outside {INDEX_HEADER_SIZE}..={ext_offset}"
            )));
        }

        let ext = Extension::EndOfIndexEntries(eoie.clone());
        tracing::debug!("{}", ext);
        self.extensions.push(ext);
        Ok(Some(eoie))
    }

    /// Walk the extensions between the end of the cache entries and the EOIE.
    fn parse_extensions(&mut self, eoie: &EndOfIndexEntries) -> Result<(), VerifyError> {
        let end = eoie.offset as usize;
        let mut offset = eoie.entries_end_offset as usize;

        while offset < end {
            if offset + SIGNATURE_AND_LENGTH_SIZE > end {
                return Err(VerifyError::UnexpectedEndOfInput {
                    offset: offset as u64,
                    needed: SIGNATURE_AND_LENGTH_SIZE,
                    available: end - offset,
                });
            }
            let (signature, size) =
                read_signature_and_length(&self.data[offset..offset + SIGNATURE_AND_LENGTH_SIZE])?;

            let ext = match ExtensionKind::from_signature(signature) {
                Some(ExtensionKind::CachedTree) => Extension::CachedTree {
                    offset: offset as u64,
                    size,
                },
                Some(ExtensionKind::IndexEntryOffsetTable) => Extension::IndexEntryOffsetTable {
                    offset: offset as u64,
                    size,
                },
                Some(ExtensionKind::EndOfIndexEntries) => {
                    return Err(VerifyError::MalformedHeader(format!(
                        "stray {signature} extension at offset {offset}, expected at {end}"
                    )));
                }
                None => {
                    return Err(VerifyError::UnknownExtensionSignature {
                        offset: offset as u64,
                        signature,
                    });
                }
            };

            let payload_start = offset + SIGNATURE_AND_LENGTH_SIZE;
            let available = end - payload_start;
            if size as usize > available {
                return Err(VerifyError::ExtensionSizeMismatch {
                    offset: offset as u64,
                    signature,
                    declared: size as u64,
                    available: available as u64,
                });
            }

            tracing::debug!("{}", ext);
            self.extensions.push(ext);
            offset = payload_start + size as usize;
        }

        Ok(())
    }

    /// Header, EOIE, then the extension walk.
    pub fn parse(mut self) -> Result<IndexReport, VerifyError> {
        tracing::info!("[file] size: {}", self.data.len());
        let header = self.parse_header()?;

        match self.parse_end_of_index_entries()? {
            Some(eoie) => self.parse_extensions(&eoie)?,
            None => tracing::warn!("no end of index entries extension, extensions not checked"),
        }

        Ok(IndexReport {
            header,
            file_size: self.data.len() as u64,
            extensions: self.extensions,
        })
    }
}

/// Verify the index at `path` with the default configuration.
pub fn verify_index(path: impl AsRef<Path>) -> Result<IndexReport, VerifyError> {
    verify_index_with_config(path, &VerifyConfig::default())
}

pub fn verify_index_with_config(
    path: impl AsRef<Path>,
    config: &VerifyConfig,
) -> Result<IndexReport, VerifyError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let report = IndexFile::from_reader(file, config)?.parse()?;
    tracing::info!(
        "{} ok: {} extensions",
        path.display(),
        report.extensions.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{hash::ObjectHash, internal::pack::tests::init_logger};

    fn index_header(version: u32, entries: u32) -> Vec<u8> {
        let mut out = b"DIRC".to_vec();
        out.extend_from_slice(&version.to_be_bytes());
        out.extend_from_slice(&entries.to_be_bytes());
        out
    }

    fn push_extension(buf: &mut Vec<u8>, signature: &[u8; 4], size: u32, payload_len: usize) {
        buf.extend_from_slice(signature);
        buf.extend_from_slice(&size.to_be_bytes());
        buf.extend(std::iter::repeat_n(0x42, payload_len));
    }

    /// Append the EOIE pointing at `entries_end` and a fake trailing checksum.
    fn finish(mut buf: Vec<u8>, entries_end: u32) -> Vec<u8> {
        buf.extend_from_slice(b"EOIE");
        buf.extend_from_slice(&24u32.to_be_bytes());
        buf.extend_from_slice(&entries_end.to_be_bytes());
        buf.extend_from_slice(&[0x77; SHA1_SIZE]);
        buf.extend_from_slice(&[0xee; SHA1_SIZE]);
        buf
    }

    fn parse(data: Vec<u8>) -> Result<IndexReport, VerifyError> {
        IndexFile::from_bytes(data).parse()
    }

    #[test]
    fn test_header_then_eoie_only() {
        init_logger();
        let data = finish(index_header(2, 3), 12);
        let report = parse(data).unwrap();
        assert_eq!(
            report.header,
            IndexHeader {
                version: 2,
                entry_count: 3
            }
        );
        assert_eq!(report.file_size, 64);
        assert_eq!(report.trailing_extensions().count(), 0);
        let eoie = report.end_of_entries().unwrap();
        assert_eq!(eoie.offset, 12);
        assert_eq!(eoie.entries_end_offset, 12);
        assert_eq!(eoie.checksum, ObjectHash([0x77; SHA1_SIZE]));
    }

    #[test]
    fn test_tree_and_ieot_in_disk_order() {
        init_logger();
        let mut data = index_header(4, 0);
        data.extend_from_slice(&[0u8; 40]); // stand-in for cache entries
        let entries_end = data.len() as u32;
        push_extension(&mut data, b"TREE", 25, 25);
        push_extension(&mut data, b"IEOT", 0, 0);
        push_extension(&mut data, b"TREE", 3, 3);
        let eoie_offset = data.len() as u64;
        let report = parse(finish(data, entries_end)).unwrap();

        let kinds: Vec<ExtensionKind> = report.extensions.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ExtensionKind::EndOfIndexEntries,
                ExtensionKind::CachedTree,
                ExtensionKind::IndexEntryOffsetTable,
                ExtensionKind::CachedTree,
            ]
        );
        assert_eq!(report.extensions[0].offset(), eoie_offset);
        assert_eq!(report.extensions[1].offset(), entries_end as u64);
        assert_eq!(report.extensions[1].size(), 25);
        assert_eq!(report.extensions[2].offset(), entries_end as u64 + 33);
        assert_eq!(report.extensions[3].offset(), entries_end as u64 + 41);
    }

    #[test]
    fn test_no_eoie_means_no_extensions() {
        // too small to hold an EOIE
        let report = parse(index_header(3, 0)).unwrap();
        assert!(report.extensions.is_empty());

        // large enough, but something else sits at the tail position
        let mut data = index_header(2, 1);
        data.extend_from_slice(&[0u8; 100]);
        let report = parse(data).unwrap();
        assert!(report.extensions.is_empty());
    }

    #[test]
    fn test_tail_offset_inside_header_means_no_extensions() {
        // 60 bytes: the EOIE would have to start at offset 8, inside the header
        let mut data = index_header(2, 0);
        data.extend_from_slice(&[0u8; 48]);
        let report = parse(data).unwrap();
        assert_eq!(report.file_size, 60);
        assert!(report.extensions.is_empty());
    }

    #[test]
    fn test_stray_eoie_inside_extension_walk() {
        let mut data = index_header(2, 0);
        push_extension(&mut data, b"TREE", 2, 2);
        push_extension(&mut data, b"EOIE", 24, 24);
        let eoie_offset = data.len();
        let err = parse(finish(data, 12)).unwrap_err();
        match err {
            VerifyError::MalformedHeader(msg) => {
                assert!(msg.contains("offset 22"), "{msg}");
                assert!(msg.contains(&eoie_offset.to_string()), "{msg}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_extension_signature() {
        let mut data = index_header(2, 0);
        push_extension(&mut data, b"LINK", 4, 4);
        let err = parse(finish(data, 12)).unwrap_err();
        match err {
            VerifyError::UnknownExtensionSignature { offset, signature } => {
                assert_eq!(offset, 12);
                assert_eq!(signature.to_string(), "LINK");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_extension_size_overruns_eoie() {
        let mut data = index_header(2, 0);
        push_extension(&mut data, b"TREE", 100, 10);
        let err = parse(finish(data, 12)).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::ExtensionSizeMismatch {
                offset: 12,
                declared: 100,
                available: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_short_gap_before_eoie() {
        let mut data = index_header(2, 0);
        push_extension(&mut data, b"TREE", 2, 2);
        data.extend_from_slice(&[0u8; 3]);
        let err = parse(finish(data, 12)).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::UnexpectedEndOfInput {
                offset: 22,
                needed: 8,
                available: 3
            }
        ));
    }

    #[test]
    fn test_wrong_eoie_size_is_an_error() {
        let mut data = finish(index_header(2, 0), 12);
        data[16..20].copy_from_slice(&23u32.to_be_bytes());
        assert!(matches!(
            parse(data).unwrap_err(),
            VerifyError::ExtensionSizeMismatch { .. }
        ));
    }

    #[test]
    fn test_entries_end_out_of_range() {
        for entries_end in [0u32, 11, 13, 1000] {
            let data = finish(index_header(2, 0), entries_end);
            assert!(matches!(
                parse(data).unwrap_err(),
                VerifyError::MalformedHeader(_)
            ));
        }
    }

    #[test]
    fn test_bad_header() {
        let good = finish(index_header(2, 3), 12);
        for i in 0..4 {
            let mut data = good.clone();
            data[i] = data[i].wrapping_add(1);
            assert!(matches!(
                parse(data).unwrap_err(),
                VerifyError::MalformedHeader(_)
            ));
        }
        for version in [0u32, 1, 5] {
            let mut data = good.clone();
            data[4..8].copy_from_slice(&version.to_be_bytes());
            assert!(matches!(
                parse(data).unwrap_err(),
                VerifyError::MalformedHeader(_)
            ));
        }
        assert!(matches!(
            parse(good[..11].to_vec()).unwrap_err(),
            VerifyError::UnexpectedEndOfInput { needed: 12, .. }
        ));
    }

    #[test]
    fn test_from_reader_small_buffer() {
        let mut data = index_header(2, 0);
        push_extension(&mut data, b"TREE", 30, 30);
        let data = finish(data, 12);
        let config = VerifyConfig {
            buffer_capacity: "8".to_string(),
            ..Default::default()
        };
        let file = IndexFile::from_reader(Cursor::new(data.clone()), &config).unwrap();
        assert_eq!(file.file_size(), data.len());
        let report = file.parse().unwrap();
        assert_eq!(report.extensions.len(), 2);
    }
}
