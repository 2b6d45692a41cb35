//! Entry inputs for the archive writer.
//!
//! An [`EntryInput`] is one record to serialize: a name, a method, the
//! payload exactly as it should be stored, and optionally the CRC and sizes.
//! Stored entries derive missing values from the payload. Deflated entries
//! carry an already compressed payload, so the caller must supply the CRC
//! and uncompressed size of the original data.

use std::borrow::Cow;

use crate::codec::CompressionMethod;
use crate::read::{ArchiveEntry, FLAG_UTF8_NAME};

/// A record handed to the [`ArchiveWriter`](super::ArchiveWriter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInput<'a> {
    /// Name bytes written to both headers.
    pub name: Vec<u8>,
    /// Compression method recorded in the headers.
    pub method: CompressionMethod,
    /// Payload as stored in the archive (compressed for deflate).
    pub payload: Cow<'a, [u8]>,
    /// CRC-32 of the uncompressed data.
    pub crc32: Option<u32>,
    /// Stored payload size; defaults to the payload length.
    pub compressed_size: Option<u32>,
    /// Uncompressed data size.
    pub uncompressed_size: Option<u32>,
    /// General purpose flags (only the UTF-8 name bit is meaningful).
    pub flags: u16,
}

impl<'a> EntryInput<'a> {
    /// Creates a stored (method 0) entry. CRC and sizes are computed on write.
    pub fn stored(name: &str, data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            method: CompressionMethod::Store,
            payload: data.into(),
            crc32: None,
            compressed_size: None,
            uncompressed_size: None,
            flags: name_flags(name),
        }
    }

    /// Creates a deflated (method 8) entry from an already compressed payload.
    ///
    /// `crc32` and `uncompressed_size` describe the data before compression.
    pub fn deflated(
        name: &str,
        compressed: impl Into<Cow<'a, [u8]>>,
        crc32: u32,
        uncompressed_size: u32,
    ) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            method: CompressionMethod::Deflate,
            payload: compressed.into(),
            crc32: Some(crc32),
            compressed_size: None,
            uncompressed_size: Some(uncompressed_size),
            flags: name_flags(name),
        }
    }

    /// Copies an existing entry unchanged: same name bytes, method, payload,
    /// CRC and sizes.
    pub fn passthrough(entry: &ArchiveEntry, payload: &'a [u8]) -> Self {
        Self {
            name: entry.raw_name.clone(),
            method: entry.method,
            payload: Cow::Borrowed(payload),
            crc32: Some(entry.crc32),
            compressed_size: Some(entry.compressed_size),
            uncompressed_size: Some(entry.uncompressed_size),
            flags: entry.flags & FLAG_UTF8_NAME,
        }
    }

    /// Takes the exact name bytes of `entry`, keeping its original casing.
    pub fn named_like(mut self, entry: &ArchiveEntry) -> Self {
        self.name = entry.raw_name.clone();
        self.flags = entry.flags & FLAG_UTF8_NAME;
        self
    }

    /// Returns the name as text (lossy).
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }
}

fn name_flags(name: &str) -> u16 {
    if name.is_ascii() { 0 } else { FLAG_UTF8_NAME }
}
