//! Replacing a plate's instruction file inside a sliced job.

mod common;

use plateloop::checksum::md5_hex_upper;
use plateloop::edit::{InstructionMerger, merge_instruction};
use plateloop::read::Archive;
use plateloop::write::{EntryInput, write_archive};
use plateloop::{CompressionMethod, Error, LineEnding};

use common::{PLATE_1, PLATE_1_MD5, entry_bytes, entry_text, plate_gcode, sliced_job};

#[test]
fn test_untouched_entries_are_copied_verbatim() {
    let original = sliced_job(&plate_gcode(LineEnding::Lf), CompressionMethod::Deflate);
    let merged = merge_instruction(&original, 1, b"G28\nG1 X1\n").unwrap();

    let before = Archive::parse(&original).unwrap();
    let after = Archive::parse(&merged).unwrap();
    assert_eq!(before.len(), after.len());

    for (old, new) in before.entries().iter().zip(after.entries()) {
        assert_eq!(old.raw_name, new.raw_name);
        assert_eq!(old.method, new.method);
        if old.name == PLATE_1 || old.name == PLATE_1_MD5 {
            continue;
        }
        assert_eq!(old.crc32, new.crc32, "{}", old.name);
        assert_eq!(old.compressed_size, new.compressed_size);
        assert_eq!(old.uncompressed_size, new.uncompressed_size);
        assert_eq!(
            before.payload(old).unwrap(),
            after.payload(new).unwrap(),
            "{}",
            old.name
        );
    }
}

#[test]
fn test_checksum_matches_new_instruction() {
    let original = sliced_job(&plate_gcode(LineEnding::Lf), CompressionMethod::Store);
    let merged = merge_instruction(&original, 1, b"G28\nG1 X1\n").unwrap();

    let gcode = entry_bytes(&merged, PLATE_1);
    let md5 = entry_text(&merged, PLATE_1_MD5);
    assert_eq!(md5, md5_hex_upper(&gcode));
    assert_eq!(md5.len(), 32);
    assert!(md5.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
}

#[test]
fn test_original_line_ending_is_kept() {
    let original = sliced_job(&plate_gcode(LineEnding::CrLf), CompressionMethod::Deflate);
    let report = InstructionMerger::new(&original)
        .apply(b"G28\nG1 X1\r\nG1 X2\n")
        .unwrap();

    assert_eq!(report.line_ending, Some(LineEnding::CrLf));
    assert_eq!(report.instruction_method, Some(CompressionMethod::Deflate));
    assert_eq!(
        entry_bytes(&report.bytes, PLATE_1),
        b"G28\r\nG1 X1\r\nG1 X2\r\n"
    );
    assert_eq!(report.checksum, md5_hex_upper(b"G28\r\nG1 X1\r\nG1 X2\r\n"));
    assert_eq!(report.entries_updated, 2);
    assert_eq!(report.entries_added, 0);
    assert_eq!(report.total_entries(), 6);
}

#[test]
fn test_lf_original_normalizes_crlf_input() {
    let original = sliced_job(&plate_gcode(LineEnding::Lf), CompressionMethod::Store);
    let merged = merge_instruction(&original, 1, b"G28\r\nG1 X1\r\n").unwrap();
    assert_eq!(entry_bytes(&merged, PLATE_1), b"G28\nG1 X1\n");
}

#[test]
fn test_missing_instruction_and_checksum_are_appended() {
    let original = write_archive(&[EntryInput::stored("3D/3dmodel.model", &b"<model/>"[..])]);
    let report = InstructionMerger::new(&original)
        .plate(2)
        .apply(b"G28\r\nG1 X1\n")
        .unwrap();

    assert_eq!(report.line_ending, None);
    assert_eq!(report.entries_kept, 1);
    assert_eq!(report.entries_added, 2);

    let archive = Archive::parse(&report.bytes).unwrap();
    let names: Vec<&str> = archive.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "3D/3dmodel.model",
            "Metadata/plate_2.gcode",
            "Metadata/plate_2.gcode.md5"
        ]
    );
    // Without an original to copy the convention from, bytes stay as given.
    assert_eq!(
        entry_bytes(&report.bytes, "Metadata/plate_2.gcode"),
        b"G28\r\nG1 X1\n"
    );
}

#[test]
fn test_original_name_casing_is_kept() {
    let original = write_archive(&[
        EntryInput::stored("metadata/Plate_1.gcode", &b"G28\n"[..]),
        EntryInput::stored("metadata/Plate_1.gcode.MD5", &b"0"[..]),
    ]);
    let merged = merge_instruction(&original, 1, b"G29\n").unwrap();
    let archive = Archive::parse(&merged).unwrap();
    assert_eq!(archive.len(), 2);
    assert_eq!(archive.entries()[0].name, "metadata/Plate_1.gcode");
    assert_eq!(archive.entries()[1].name, "metadata/Plate_1.gcode.MD5");
    assert_eq!(entry_bytes(&merged, PLATE_1), b"G29\n");
}

#[test]
fn test_merge_rejects_non_archive() {
    let err = merge_instruction(b"G28\n", 1, b"G28\n").unwrap_err();
    assert!(matches!(err, Error::InvalidArchive(_)));
}
