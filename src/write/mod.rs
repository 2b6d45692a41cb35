//! Archive writing API for 3MF print archives.
//!
//! The writer serializes a list of [`EntryInput`] records into a fresh ZIP
//! byte stream: local headers and payloads in input order, then one central
//! directory record per entry, then the end-of-central-directory record.
//! There is no Zip64 support; sizes and offsets must fit in 32 bits.
//!
//! # Example
//!
//! ```rust
//! use plateloop::read::list_entries;
//! use plateloop::write::{ArchiveWriter, EntryInput};
//!
//! let mut writer = ArchiveWriter::new();
//! writer.add(EntryInput::stored("Metadata/plate_1.gcode", b"G28\n".to_vec()));
//! let (bytes, result) = writer.finish();
//!
//! assert_eq!(result.entries_written, 1);
//! assert_eq!(list_entries(&bytes).unwrap()[0].name, "Metadata/plate_1.gcode");
//! ```

mod entry_input;
pub mod minimal;

pub use entry_input::EntryInput;
pub use minimal::minimal_archive;

mod header_encode;

use header_encode::{
    HeaderFields, encode_central_header, encode_end_of_central_directory, encode_local_header,
};

use crate::checksum::crc32;
use crate::codec::CompressionMethod;

/// Result of a write operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of entries written.
    pub entries_written: usize,
    /// Total uncompressed bytes.
    pub total_size: u64,
    /// Total compressed (stored) bytes.
    pub compressed_size: u64,
    /// Size of the produced archive in bytes.
    pub archive_size: u64,
}

impl WriteResult {
    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_size as f64
        }
    }
}

/// Collects entries and serializes them into a new archive.
#[derive(Debug, Default)]
pub struct ArchiveWriter<'a> {
    entries: Vec<EntryInput<'a>>,
}

impl<'a> ArchiveWriter<'a> {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an entry. Entries are written in insertion order.
    pub fn add(&mut self, entry: EntryInput<'a>) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Returns the number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes all queued entries.
    pub fn finish(self) -> (Vec<u8>, WriteResult) {
        encode_archive(&self.entries)
    }
}

impl<'a> Extend<EntryInput<'a>> for ArchiveWriter<'a> {
    fn extend<I: IntoIterator<Item = EntryInput<'a>>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

/// Serializes `entries` into a new archive.
///
/// For stored entries a missing CRC or size is computed from the payload.
/// For deflated entries the writer never decompresses: a missing CRC or
/// uncompressed size is written as zero.
pub fn write_archive(entries: &[EntryInput<'_>]) -> Vec<u8> {
    encode_archive(entries).0
}

fn resolve<'n>(entry: &'n EntryInput<'_>) -> HeaderFields<'n> {
    let payload = entry.payload.as_ref();
    let stored = entry.method == CompressionMethod::Store;

    let crc = match entry.crc32 {
        Some(crc) => crc,
        None if stored => crc32(payload),
        None => {
            log::warn!(
                "writing '{}' ({}) without a CRC; readers will reject it",
                entry.name_lossy(),
                entry.method
            );
            0
        }
    };
    let uncompressed_size = entry
        .uncompressed_size
        .unwrap_or(if stored { payload.len() as u32 } else { 0 });

    HeaderFields {
        name: &entry.name,
        flags: entry.flags,
        method: entry.method.id(),
        crc32: crc,
        compressed_size: entry.compressed_size.unwrap_or(payload.len() as u32),
        uncompressed_size,
    }
}

fn encode_archive(entries: &[EntryInput<'_>]) -> (Vec<u8>, WriteResult) {
    let resolved: Vec<HeaderFields<'_>> = entries.iter().map(resolve).collect();

    let payload_total: usize = entries.iter().map(|e| e.payload.len()).sum();
    let mut out = Vec::with_capacity(payload_total + entries.len() * 128);
    let mut offsets = Vec::with_capacity(entries.len());
    let mut result = WriteResult::default();

    for (entry, fields) in entries.iter().zip(&resolved) {
        offsets.push(out.len() as u32);
        encode_local_header(&mut out, fields);
        out.extend_from_slice(&entry.payload);

        result.entries_written += 1;
        result.total_size += fields.uncompressed_size as u64;
        result.compressed_size += entry.payload.len() as u64;
    }

    let cd_offset = out.len();
    for (fields, offset) in resolved.iter().zip(offsets) {
        encode_central_header(&mut out, fields, offset);
    }
    let cd_size = out.len() - cd_offset;

    encode_end_of_central_directory(
        &mut out,
        entries.len() as u16,
        cd_size as u32,
        cd_offset as u32,
    );

    result.archive_size = out.len() as u64;
    (out, result)
}
