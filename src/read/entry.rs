//! Archive entry types and selectors.

use crate::codec::CompressionMethod;

/// General purpose flag bit 11: the entry name is UTF-8.
pub const FLAG_UTF8_NAME: u16 = 0x0800;

/// An entry listed in an archive's central directory.
///
/// Entries are immutable snapshots of the central directory record. To
/// change an archive, build new [`EntryInput`](crate::write::EntryInput)s
/// and hand them to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ArchiveEntry {
    /// Path within the archive, decoded as UTF-8 (lossy).
    ///
    /// Stored with its original casing; lookups by convention ignore case.
    pub name: String,
    /// The exact name bytes from the central directory.
    pub raw_name: Vec<u8>,
    /// Compression method.
    pub method: CompressionMethod,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the stored payload in bytes.
    pub compressed_size: u32,
    /// Size of the data after decompression.
    pub uncompressed_size: u32,
    /// Byte offset of the entry's local file header.
    pub local_header_offset: u32,
    /// General purpose bit flags from the central directory.
    pub flags: u16,
}

impl ArchiveEntry {
    /// Returns `true` if the name matches `path`, ignoring ASCII case.
    pub fn name_matches(&self, path: &str) -> bool {
        self.name.eq_ignore_ascii_case(path)
    }

    /// Returns `true` if the entry is a directory placeholder.
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Returns `true` if the entry is a G-code file (`*.gcode`, any case).
    pub fn is_instruction_file(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".gcode")
    }

    /// Returns `true` if the name was flagged as UTF-8.
    pub fn has_utf8_name(&self) -> bool {
        self.flags & FLAG_UTF8_NAME != 0
    }

    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.uncompressed_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.uncompressed_size as f64
        }
    }
}

/// Trait for selecting entries from an archive listing.
pub trait EntrySelector {
    /// Returns true if the entry should be selected.
    fn select(&self, entry: &ArchiveEntry) -> bool;
}

/// Selector that matches all entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAll;

impl EntrySelector for SelectAll {
    fn select(&self, _entry: &ArchiveEntry) -> bool {
        true
    }
}

/// Selector that matches entries by name, ignoring ASCII case.
#[derive(Debug, Clone)]
pub struct SelectByName {
    names: Vec<String>,
}

impl SelectByName {
    /// Creates a selector for the given names.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl EntrySelector for SelectByName {
    fn select(&self, entry: &ArchiveEntry) -> bool {
        self.names.iter().any(|name| entry.name_matches(name))
    }
}

/// Selector that matches G-code entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectInstructionFiles;

impl EntrySelector for SelectInstructionFiles {
    fn select(&self, entry: &ArchiveEntry) -> bool {
        entry.is_instruction_file()
    }
}

// Implement for closures
impl<F: Fn(&ArchiveEntry) -> bool> EntrySelector for F {
    fn select(&self, entry: &ArchiveEntry) -> bool {
        self(entry)
    }
}
