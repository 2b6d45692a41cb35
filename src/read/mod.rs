//! Archive reading API for 3MF print archives.
//!
//! This module parses the ZIP central directory of an in-memory archive,
//! hands out raw (still compressed) entry payloads, and offers convenience
//! extraction that decompresses and verifies the CRC.
//!
//! # Example
//!
//! ```rust,ignore
//! use plateloop::read::Archive;
//!
//! let bytes = std::fs::read("benchy.gcode.3mf")?;
//! let archive = Archive::parse(&bytes)?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes ({})", entry.name, entry.uncompressed_size, entry.method);
//! }
//!
//! let instruction = archive.extract_first_instruction()?;
//! println!("{} lines", instruction.text.lines().count());
//! ```

mod entry;

pub use entry::{
    ArchiveEntry, EntrySelector, FLAG_UTF8_NAME, SelectAll, SelectByName, SelectInstructionFiles,
};

use crate::checksum::crc32;
use crate::codec::{self, CompressionMethod};
use crate::format::{
    CENTRAL_HEADER_SIGNATURE, CENTRAL_HEADER_SIZE, END_OF_CENTRAL_DIRECTORY_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_SIZE, LOCAL_HEADER_SIGNATURE, LOCAL_HEADER_SIZE, central, eocd,
    local, read_u16, read_u32,
};
use crate::{Error, Result};

/// A parsed archive borrowing the caller's buffer.
///
/// Parsing only walks the central directory; payloads are located lazily.
#[derive(Debug, Clone)]
pub struct Archive<'a> {
    data: &'a [u8],
    entries: Vec<ArchiveEntry>,
}

impl<'a> Archive<'a> {
    /// Parses the central directory of `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let entries = list_entries(data)?;
        Ok(Self { data, entries })
    }

    /// Returns the archive bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns all entries in central-directory order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds an entry by path, ignoring ASCII case.
    pub fn find(&self, path: &str) -> Option<&ArchiveEntry> {
        find_entry(&self.entries, path)
    }

    /// Returns the entries accepted by `selector`.
    pub fn select(&self, selector: &impl EntrySelector) -> Vec<&ArchiveEntry> {
        self.entries.iter().filter(|e| selector.select(e)).collect()
    }

    /// Returns the raw payload of `entry`.
    pub fn payload(&self, entry: &ArchiveEntry) -> Result<&'a [u8]> {
        read_entry_payload(self.data, entry)
    }

    /// Decompresses `entry` and verifies its CRC.
    pub fn extract(&self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        extract_entry(self.data, entry)
    }

    /// Extracts the first `.gcode` entry as text.
    pub fn extract_first_instruction(&self) -> Result<ExtractedInstruction> {
        extract_first_instruction_from(self.data, &self.entries)
    }
}

/// Instruction text extracted from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedInstruction {
    /// Entry path the text came from.
    pub name: String,
    /// Decoded text.
    pub text: String,
}

/// Lists the entries of an archive by walking its central directory.
///
/// The end-of-central-directory record is found by scanning backward from
/// the end of the buffer, so archives with a trailing comment of any length
/// are accepted.
///
/// # Errors
///
/// Returns [`Error::NotAnArchive`] if no end-of-central-directory record is
/// found, and [`Error::Corrupt`] if the directory points outside the buffer
/// or a record is truncated.
pub fn list_entries(data: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let eocd_pos = find_end_of_central_directory(data).ok_or_else(|| {
        Error::NotAnArchive("end of central directory record not found".into())
    })?;

    let entry_count = read_u16(data, eocd_pos + eocd::ENTRY_COUNT).unwrap_or(0);
    let cd_size = read_u32(data, eocd_pos + eocd::CD_SIZE).unwrap_or(0) as usize;
    let cd_offset = read_u32(data, eocd_pos + eocd::CD_OFFSET).unwrap_or(0) as usize;

    let cd_end = cd_offset.checked_add(cd_size).ok_or_else(|| {
        Error::corrupt(eocd_pos as u64, "central directory size overflows")
    })?;
    if cd_end > data.len() {
        return Err(Error::corrupt(
            eocd_pos as u64,
            format!(
                "central directory [{cd_offset}, {cd_end}) runs past end of archive ({} bytes)",
                data.len()
            ),
        ));
    }

    let mut entries = Vec::with_capacity(entry_count as usize);
    let mut pos = cd_offset;
    while pos + CENTRAL_HEADER_SIZE <= cd_end {
        if read_u32(data, pos) != Some(CENTRAL_HEADER_SIGNATURE) {
            log::warn!(
                "stopping central directory walk at offset {pos:#x}: unexpected signature"
            );
            break;
        }
        let (entry, record_len) = parse_central_record(data, pos)?;
        entries.push(entry);
        pos += record_len;
    }

    if entries.len() != entry_count as usize {
        log::debug!(
            "central directory declares {} entries, found {}",
            entry_count,
            entries.len()
        );
    }

    Ok(entries)
}

fn find_end_of_central_directory(data: &[u8]) -> Option<usize> {
    if data.len() < END_OF_CENTRAL_DIRECTORY_SIZE {
        return None;
    }
    (0..=data.len() - END_OF_CENTRAL_DIRECTORY_SIZE)
        .rev()
        .find(|&i| read_u32(data, i) == Some(END_OF_CENTRAL_DIRECTORY_SIGNATURE))
}

fn parse_central_record(data: &[u8], pos: usize) -> Result<(ArchiveEntry, usize)> {
    let field16 = |offset: usize| {
        read_u16(data, pos + offset)
            .ok_or_else(|| Error::corrupt(pos as u64, "truncated central directory record"))
    };
    let field32 = |offset: usize| {
        read_u32(data, pos + offset)
            .ok_or_else(|| Error::corrupt(pos as u64, "truncated central directory record"))
    };

    let flags = field16(central::FLAGS)?;
    let method = CompressionMethod::from_id(field16(central::METHOD)?);
    let crc32 = field32(central::CRC)?;
    let compressed_size = field32(central::COMPRESSED_SIZE)?;
    let uncompressed_size = field32(central::UNCOMPRESSED_SIZE)?;
    let name_len = field16(central::NAME_LEN)? as usize;
    let extra_len = field16(central::EXTRA_LEN)? as usize;
    let comment_len = field16(central::COMMENT_LEN)? as usize;
    let local_header_offset = field32(central::LOCAL_HEADER_OFFSET)?;

    let name_start = pos + CENTRAL_HEADER_SIZE;
    let raw_name = data
        .get(name_start..name_start + name_len)
        .ok_or_else(|| Error::corrupt(pos as u64, "entry name runs past end of archive"))?
        .to_vec();
    let name = String::from_utf8_lossy(&raw_name).into_owned();

    let entry = ArchiveEntry {
        name,
        raw_name,
        method,
        crc32,
        compressed_size,
        uncompressed_size,
        local_header_offset,
        flags,
    };
    Ok((entry, CENTRAL_HEADER_SIZE + name_len + extra_len + comment_len))
}

/// Returns the raw, still compressed payload of `entry`.
///
/// The local header at the recorded offset must carry the local header
/// signature and the same name length as the central directory record.
///
/// # Errors
///
/// Returns [`Error::Corrupt`] if the local header does not validate or the
/// payload runs past the end of the buffer.
pub fn read_entry_payload<'a>(data: &'a [u8], entry: &ArchiveEntry) -> Result<&'a [u8]> {
    let offset = entry.local_header_offset as usize;
    if read_u32(data, offset) != Some(LOCAL_HEADER_SIGNATURE) {
        return Err(Error::corrupt(
            offset as u64,
            format!("bad local header signature for '{}'", entry.name),
        ));
    }

    let truncated = || Error::corrupt(offset as u64, "truncated local header");
    let name_len = read_u16(data, offset + local::NAME_LEN).ok_or_else(truncated)? as usize;
    let extra_len = read_u16(data, offset + local::EXTRA_LEN).ok_or_else(truncated)? as usize;

    if name_len != entry.raw_name.len() {
        return Err(Error::corrupt(
            offset as u64,
            format!(
                "local header name length {} disagrees with central directory ({}) for '{}'",
                name_len,
                entry.raw_name.len(),
                entry.name
            ),
        ));
    }

    let start = offset + LOCAL_HEADER_SIZE + name_len + extra_len;
    let end = start + entry.compressed_size as usize;
    data.get(start..end).ok_or_else(|| {
        Error::corrupt(
            start as u64,
            format!("payload of '{}' runs past end of archive", entry.name),
        )
    })
}

/// Decompresses `entry` according to its method and verifies the CRC.
///
/// # Errors
///
/// Propagates [`read_entry_payload`] failures, returns
/// [`Error::UnsupportedMethod`] for methods other than store/deflate and
/// [`Error::CrcMismatch`] if the data does not match the directory record.
pub fn extract_entry(data: &[u8], entry: &ArchiveEntry) -> Result<Vec<u8>> {
    let payload = read_entry_payload(data, entry)?;
    let out = codec::decompress(entry.method, payload, entry.uncompressed_size as usize)?;

    let actual = crc32(&out);
    if actual != entry.crc32 {
        return Err(Error::CrcMismatch {
            name: entry.name.clone(),
            expected: entry.crc32,
            actual,
        });
    }
    Ok(out)
}

/// Finds an entry by path, ignoring ASCII case.
pub fn find_entry<'e>(entries: &'e [ArchiveEntry], path: &str) -> Option<&'e ArchiveEntry> {
    entries.iter().find(|e| e.name_matches(path))
}

/// Lists the archive and extracts its first `.gcode` entry as text.
///
/// Text that is not valid UTF-8 is decoded lossily.
///
/// # Errors
///
/// Returns [`Error::EntryNotFound`] if the archive has no `.gcode` entry,
/// plus any listing or extraction failure.
pub fn extract_first_instruction(data: &[u8]) -> Result<ExtractedInstruction> {
    let entries = list_entries(data)?;
    extract_first_instruction_from(data, &entries)
}

fn extract_first_instruction_from(
    data: &[u8],
    entries: &[ArchiveEntry],
) -> Result<ExtractedInstruction> {
    let entry = entries
        .iter()
        .find(|e| SelectInstructionFiles.select(e))
        .ok_or_else(|| Error::EntryNotFound {
            path: "*.gcode".into(),
        })?;

    let bytes = extract_entry(data, entry)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("'{}' is not valid UTF-8, decoding lossily", entry.name);
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };

    Ok(ExtractedInstruction {
        name: entry.name.clone(),
        text,
    })
}
