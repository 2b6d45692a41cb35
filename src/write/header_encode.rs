//! Record encoding for ZIP archives.
//!
//! Every record is little-endian with zeroed timestamps, no extra fields
//! and no comments.

use crate::format::{
    CENTRAL_HEADER_SIGNATURE, CENTRAL_HEADER_SIZE, END_OF_CENTRAL_DIRECTORY_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_SIZE, LOCAL_HEADER_SIGNATURE, LOCAL_HEADER_SIZE, VERSION,
};

/// Header fields resolved for one entry, shared by both header kinds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeaderFields<'n> {
    pub name: &'n [u8],
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Appends a local file header (without payload).
pub(crate) fn encode_local_header(out: &mut Vec<u8>, fields: &HeaderFields<'_>) {
    out.reserve(LOCAL_HEADER_SIZE + fields.name.len());
    put_u32(out, LOCAL_HEADER_SIGNATURE);
    put_u16(out, VERSION);
    put_u16(out, fields.flags);
    put_u16(out, fields.method);
    put_u16(out, 0); // mod time
    put_u16(out, 0); // mod date
    put_u32(out, fields.crc32);
    put_u32(out, fields.compressed_size);
    put_u32(out, fields.uncompressed_size);
    put_u16(out, fields.name.len() as u16);
    put_u16(out, 0); // extra length
    out.extend_from_slice(fields.name);
}

/// Appends a central directory record pointing at `local_header_offset`.
pub(crate) fn encode_central_header(
    out: &mut Vec<u8>,
    fields: &HeaderFields<'_>,
    local_header_offset: u32,
) {
    out.reserve(CENTRAL_HEADER_SIZE + fields.name.len());
    put_u32(out, CENTRAL_HEADER_SIGNATURE);
    put_u16(out, VERSION); // made by
    put_u16(out, VERSION); // needed
    put_u16(out, fields.flags);
    put_u16(out, fields.method);
    put_u16(out, 0);
    put_u16(out, 0);
    put_u32(out, fields.crc32);
    put_u32(out, fields.compressed_size);
    put_u32(out, fields.uncompressed_size);
    put_u16(out, fields.name.len() as u16);
    put_u16(out, 0); // extra length
    put_u16(out, 0); // comment length
    put_u16(out, 0); // disk number start
    put_u16(out, 0); // internal attributes
    put_u32(out, 0); // external attributes
    put_u32(out, local_header_offset);
    out.extend_from_slice(fields.name);
}

/// Appends the end-of-central-directory record.
pub(crate) fn encode_end_of_central_directory(
    out: &mut Vec<u8>,
    entry_count: u16,
    cd_size: u32,
    cd_offset: u32,
) {
    out.reserve(END_OF_CENTRAL_DIRECTORY_SIZE);
    put_u32(out, END_OF_CENTRAL_DIRECTORY_SIGNATURE);
    put_u16(out, 0); // this disk
    put_u16(out, 0); // disk with central directory
    put_u16(out, entry_count);
    put_u16(out, entry_count);
    put_u32(out, cd_size);
    put_u32(out, cd_offset);
    put_u16(out, 0); // comment length
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{central, local, read_u16, read_u32};

    fn fields(name: &[u8]) -> HeaderFields<'_> {
        HeaderFields {
            name,
            flags: 0,
            method: 8,
            crc32: 0xDEAD_BEEF,
            compressed_size: 10,
            uncompressed_size: 20,
        }
    }

    #[test]
    fn test_local_header_layout() {
        let mut out = Vec::new();
        encode_local_header(&mut out, &fields(b"a.gcode"));
        assert_eq!(out.len(), LOCAL_HEADER_SIZE + 7);
        assert_eq!(read_u32(&out, 0), Some(LOCAL_HEADER_SIGNATURE));
        assert_eq!(read_u16(&out, local::METHOD), Some(8));
        assert_eq!(read_u32(&out, local::CRC), Some(0xDEAD_BEEF));
        assert_eq!(read_u32(&out, local::UNCOMPRESSED_SIZE), Some(20));
        assert_eq!(read_u16(&out, local::NAME_LEN), Some(7));
        assert_eq!(&out[LOCAL_HEADER_SIZE..], b"a.gcode");
    }

    #[test]
    fn test_central_header_layout() {
        let mut out = Vec::new();
        encode_central_header(&mut out, &fields(b"b"), 1234);
        assert_eq!(out.len(), CENTRAL_HEADER_SIZE + 1);
        assert_eq!(read_u32(&out, 0), Some(CENTRAL_HEADER_SIGNATURE));
        assert_eq!(read_u32(&out, central::COMPRESSED_SIZE), Some(10));
        assert_eq!(read_u32(&out, central::LOCAL_HEADER_OFFSET), Some(1234));
    }

    #[test]
    fn test_end_record_layout() {
        let mut out = Vec::new();
        encode_end_of_central_directory(&mut out, 3, 100, 200);
        assert_eq!(out.len(), END_OF_CENTRAL_DIRECTORY_SIZE);
        assert_eq!(read_u32(&out, 0), Some(END_OF_CENTRAL_DIRECTORY_SIGNATURE));
        assert_eq!(read_u16(&out, 10), Some(3));
        assert_eq!(read_u32(&out, 16), Some(200));
    }
}
