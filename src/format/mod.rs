//! ZIP container constants used by 3MF print archives.
//!
//! A `.gcode.3mf` file is a plain ZIP archive. Only the subset needed to
//! read and rewrite one is modelled here: local file headers, central
//! directory records and the end-of-central-directory record, all
//! little-endian, no Zip64, no data descriptors, no encryption.

pub mod detect;

/// Two-byte prefix every accepted archive starts with (`'P' 'K'`).
pub const ARCHIVE_PREFIX: &[u8; 2] = b"PK";

/// Local file header signature (`PK\x03\x04`).
pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Central directory file header signature (`PK\x01\x02`).
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;

/// End of central directory signature (`PK\x05\x06`).
pub const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

/// Fixed part of a local file header, before the name and extra fields.
///
/// - 4 bytes: signature
/// - 2 bytes: version needed
/// - 2 bytes: general purpose flags
/// - 2 bytes: compression method
/// - 2 bytes: modification time
/// - 2 bytes: modification date
/// - 4 bytes: CRC-32
/// - 4 bytes: compressed size
/// - 4 bytes: uncompressed size
/// - 2 bytes: name length
/// - 2 bytes: extra field length
pub const LOCAL_HEADER_SIZE: usize = 30;

/// Fixed part of a central directory record, before name/extra/comment.
pub const CENTRAL_HEADER_SIZE: usize = 46;

/// Size of the end-of-central-directory record without its trailing comment.
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 22;

/// "Version needed to extract" / "version made by" written for every entry (2.0).
pub const VERSION: u16 = 20;

/// Field offsets inside a local file header.
pub mod local {
    /// Compression method.
    pub const METHOD: usize = 8;
    /// CRC-32 of the uncompressed data.
    pub const CRC: usize = 14;
    /// Compressed size.
    pub const COMPRESSED_SIZE: usize = 18;
    /// Uncompressed size.
    pub const UNCOMPRESSED_SIZE: usize = 22;
    /// File name length.
    pub const NAME_LEN: usize = 26;
    /// Extra field length.
    pub const EXTRA_LEN: usize = 28;
}

/// Field offsets inside a central directory record.
pub mod central {
    /// General purpose flags.
    pub const FLAGS: usize = 8;
    /// Compression method.
    pub const METHOD: usize = 10;
    /// CRC-32 of the uncompressed data.
    pub const CRC: usize = 16;
    /// Compressed size.
    pub const COMPRESSED_SIZE: usize = 20;
    /// Uncompressed size.
    pub const UNCOMPRESSED_SIZE: usize = 24;
    /// File name length.
    pub const NAME_LEN: usize = 28;
    /// Extra field length.
    pub const EXTRA_LEN: usize = 30;
    /// File comment length.
    pub const COMMENT_LEN: usize = 32;
    /// Offset of the matching local header.
    pub const LOCAL_HEADER_OFFSET: usize = 42;
}

/// Field offsets inside the end-of-central-directory record.
pub mod eocd {
    /// Total number of central directory records.
    pub const ENTRY_COUNT: usize = 10;
    /// Size of the central directory in bytes.
    pub const CD_SIZE: usize = 12;
    /// Offset of the first central directory record.
    pub const CD_OFFSET: usize = 16;
}

/// Reads a little-endian `u16` at `offset`, or `None` past the end of `data`.
pub(crate) fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Reads a little-endian `u32` at `offset`, or `None` past the end of `data`.
pub(crate) fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures_spell_pk() {
        assert_eq!(&LOCAL_HEADER_SIGNATURE.to_le_bytes()[..2], ARCHIVE_PREFIX);
        assert_eq!(&CENTRAL_HEADER_SIGNATURE.to_le_bytes()[..2], ARCHIVE_PREFIX);
        assert_eq!(
            &END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes()[..2],
            ARCHIVE_PREFIX
        );
    }

    #[test]
    fn test_read_helpers_bounds() {
        let data = [0x50, 0x4B, 0x03, 0x04, 0x14];
        assert_eq!(read_u32(&data, 0), Some(LOCAL_HEADER_SIGNATURE));
        assert_eq!(read_u16(&data, 3), Some(0x1404));
        assert_eq!(read_u16(&data, 4), None);
        assert_eq!(read_u32(&data, 2), None);
        assert_eq!(read_u32(&data, usize::MAX), None);
    }
}
