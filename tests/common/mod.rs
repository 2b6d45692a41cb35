//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use plateloop::checksum::{crc32, md5_hex_upper};
use plateloop::codec::{self, DeflateEncoderOptions};
use plateloop::read::Archive;
use plateloop::write::{EntryInput, write_archive};
use plateloop::{CompressionMethod, LineEnding};

/// Path of plate 1's instruction file.
pub const PLATE_1: &str = "Metadata/plate_1.gcode";

/// Path of plate 1's checksum sidecar.
pub const PLATE_1_MD5: &str = "Metadata/plate_1.gcode.md5";

/// A small but complete sliced plate: thumbnail comment, header and config
/// blocks, a nozzle load line, one flush block and two layers.
pub const PLATE_GCODE: &str = "\
; thumbnail begin 8x8
; HEADER_BLOCK_START
; generated by test slicer
; total layer number: 2
; HEADER_BLOCK_END
; CONFIG_BLOCK_START
; layer_height = 0.2
; nozzle_temperature = 220
; CONFIG_BLOCK_END
; EXECUTABLE_BLOCK_START
M140 S55
M190 S55
G28
;===== nozzle load line =====
G1 X20 Y-0.5 E2 F300
G1 X60 E4
; filament start gcode
; FLUSH_START
G1 E10 F200
G1 E-2
; FLUSH_END
;LAYER:0
G1 X100 Y100 E1
G1 X110 Y100 E1
;LAYER:1
G1 X100 Y110 E1
; EXECUTABLE_BLOCK_END
";

/// Purge lines [`PLATE_GCODE`] carries: thumbnail 1, nozzle load 3, flush 4.
pub const PLATE_PURGE_LINES: usize = 8;

/// Returns [`PLATE_GCODE`] with the given line ending.
pub fn plate_gcode(eol: LineEnding) -> String {
    eol.normalize(PLATE_GCODE)
}

/// Deflates `data` into an entry input with the right CRC and size.
pub fn deflated(name: &str, data: &[u8]) -> EntryInput<'static> {
    let packed = codec::compress(
        CompressionMethod::Deflate,
        data,
        &DeflateEncoderOptions::default(),
    )
    .expect("deflate in memory");
    EntryInput::deflated(name, packed, crc32(data), data.len() as u32)
}

/// Builds a slicer-like `.gcode.3mf` around `gcode`.
///
/// The instruction file uses `method`; the model and slice info are
/// deflated, everything else stored.
pub fn sliced_job(gcode: &str, method: CompressionMethod) -> Vec<u8> {
    let instruction = match method {
        CompressionMethod::Deflate => deflated(PLATE_1, gcode.as_bytes()),
        _ => EntryInput::stored(PLATE_1, gcode.as_bytes()),
    };
    let md5 = md5_hex_upper(gcode.as_bytes());

    write_archive(&[
        EntryInput::stored(
            "[Content_Types].xml",
            &b"<?xml version=\"1.0\"?><Types/>"[..],
        ),
        deflated("3D/3dmodel.model", MODEL_XML.as_bytes()),
        instruction,
        EntryInput::stored(PLATE_1_MD5, md5.into_bytes()),
        EntryInput::stored("Metadata/plate_1.png", THUMBNAIL.to_vec()),
        deflated("Metadata/slice_info.config", b"<config><plate index=\"1\"/></config>"),
    ])
}

/// Decompresses the entry `name` of `archive`.
pub fn entry_bytes(archive: &[u8], name: &str) -> Vec<u8> {
    let archive = Archive::parse(archive).expect("parse archive");
    let entry = archive.find(name).expect("entry present");
    archive.extract(entry).expect("extract entry")
}

/// Decompresses the entry `name` of `archive` as UTF-8 text.
pub fn entry_text(archive: &[u8], name: &str) -> String {
    String::from_utf8(entry_bytes(archive, name)).expect("utf-8 entry")
}

const MODEL_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
    <model unit=\"millimeter\"><resources/><build/></model>\n";

const THUMBNAIL: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
