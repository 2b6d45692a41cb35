//! End-to-end looping of a sliced job.

mod common;

use plateloop::checksum::md5_hex_upper;
use plateloop::gcode::{
    CoolingMode, DetachConfig, LoopPlan, PurgeConfig, PurgeStage, SEQUENCE_END, SEQUENCE_START,
    detect_defaults,
};
use plateloop::pipeline::{build_looped_archive, build_looped_text, output_file_name};
use plateloop::read::Archive;
use plateloop::{CompressionMethod, Error, LineEnding};
use tempfile::TempDir;

use common::{
    PLATE_1, PLATE_1_MD5, PLATE_GCODE, PLATE_PURGE_LINES, entry_bytes, entry_text, plate_gcode,
    sliced_job,
};

#[test]
fn test_loop_count_and_structure() {
    let looped = build_looped_text(PLATE_GCODE, &LoopPlan::new(3)).unwrap();
    let text = &looped.text;

    assert_eq!(text.matches("; HEADER_BLOCK_START").count(), 1);
    assert_eq!(text.matches("; CONFIG_BLOCK_END").count(), 1);
    assert_eq!(text.matches(";LAYER:0").count(), 3);
    assert_eq!(text.matches(SEQUENCE_START).count(), 3);
    assert_eq!(text.matches(SEQUENCE_END).count(), 3);
    for i in 1..=3 {
        assert!(text.contains(&format!("; ===== LOOP {i} / 3 =====")));
    }

    // Loop banners come in order, each before its own copy of the body.
    let first = text.find("; ===== LOOP 1 / 3 =====").unwrap();
    let second = text.find("; ===== LOOP 2 / 3 =====").unwrap();
    let layer = text.find(";LAYER:0").unwrap();
    assert!(first < layer && layer < second);
    assert!(text.ends_with('\n'));
}

#[test]
fn test_purge_is_removed_from_every_loop() {
    let looped = build_looped_text(PLATE_GCODE, &LoopPlan::new(2)).unwrap();

    assert!(!looped.text.contains("thumbnail begin"));
    assert!(!looped.text.contains("nozzle load line"));
    assert!(!looped.text.contains("FLUSH_START"));
    assert!(!looped.text.contains("G1 E10 F200"));
    assert_eq!(looped.text.matches("; filament start gcode").count(), 2);

    let trace = &looped.trace;
    assert_eq!(trace.total_lines(), PLATE_PURGE_LINES);
    assert!(trace.removed_by(PurgeStage::TopOfFile));
    assert!(trace.removed_by(PurgeStage::NozzleLoadLine));
    assert!(trace.removed_by(PurgeStage::FlushBlocks));
    assert!(!trace.removed_by(PurgeStage::LinePurge));
    assert!(trace.summary().starts_with("Purge cleanup:"));
}

#[test]
fn test_purge_can_be_disabled() {
    let plan = LoopPlan::new(2).purge(PurgeConfig::none());
    let looped = build_looped_text(PLATE_GCODE, &plan).unwrap();
    assert!(looped.trace.is_empty());
    assert_eq!(looped.text.matches("FLUSH_START").count(), 2);
    assert_eq!(looped.trace.summary(), "No purge block detected.");

    let keep_flush = PurgeConfig::default().with_stage(PurgeStage::FlushBlocks, false);
    let looped = build_looped_text(PLATE_GCODE, &LoopPlan::new(2).purge(keep_flush)).unwrap();
    assert!(looped.text.contains("FLUSH_START"));
    assert!(!looped.text.contains("nozzle load line"));
}

#[test]
fn test_bed_hold_rewrites_every_bed_command() {
    let plan = LoopPlan::new(2).bed_hold(65.0);
    let looped = build_looped_text(PLATE_GCODE, &plan).unwrap();
    assert_eq!(looped.text.matches("M140 S65").count(), 2);
    assert_eq!(looped.text.matches("M190 S65").count(), 2);
    assert!(!looped.text.contains("S55"));
}

#[test]
fn test_cooling_modes() {
    let wait = LoopPlan::new(1).detach(DetachConfig::default().cooling(CoolingMode::WaitForBed {
        max_temp_c: 28.0,
    }));
    let looped = build_looped_text(PLATE_GCODE, &wait).unwrap();
    assert!(looped.text.contains("M190 R28"));

    let dwell = LoopPlan::new(1).detach(DetachConfig::default().cooling(CoolingMode::Dwell {
        seconds: 90.0,
    }));
    let looped = build_looped_text(PLATE_GCODE, &dwell).unwrap();
    assert!(looped.text.contains("G4 S90"));
}

#[test]
fn test_detected_defaults_follow_generated_output() {
    let detach = DetachConfig::default()
        .fan_on(false)
        .home_between(true)
        .cooling(CoolingMode::Dwell { seconds: 45.0 });
    let looped = build_looped_text(PLATE_GCODE, &LoopPlan::new(4).detach(detach)).unwrap();

    let defaults = detect_defaults(&looped.text);
    assert_eq!(defaults.loops, 4);
    assert!(!defaults.fan_on);
    assert!(defaults.home_between);
    assert!(defaults.dwell_cooling);
    assert_eq!(defaults.cool_seconds, 45);
}

#[test]
fn test_build_looped_archive_keeps_archive_consistent() {
    let gcode = plate_gcode(LineEnding::CrLf);
    let original = sliced_job(&gcode, CompressionMethod::Deflate);
    let result = build_looped_archive(&original, &LoopPlan::new(2)).unwrap();

    assert_eq!(result.source_entry, PLATE_1);
    assert_eq!(result.report.line_ending, Some(LineEnding::CrLf));
    assert_eq!(result.report.instruction_method, Some(CompressionMethod::Deflate));

    let looped = entry_bytes(&result.archive, PLATE_1);
    assert!(!looped.windows(2).any(|w| w[1] == b'\n' && w[0] != b'\r'));
    assert_eq!(entry_text(&result.archive, PLATE_1_MD5), md5_hex_upper(&looped));
    assert_eq!(result.report.checksum, md5_hex_upper(&looped));

    let before = Archive::parse(&original).unwrap();
    let after = Archive::parse(&result.archive).unwrap();
    assert_eq!(
        before.payload(before.find("Metadata/plate_1.png").unwrap()).unwrap(),
        after.payload(after.find("Metadata/plate_1.png").unwrap()).unwrap()
    );
}

#[test]
fn test_build_errors() {
    let err = build_looped_archive(b"G28\n", &LoopPlan::new(2)).unwrap_err();
    assert!(matches!(err, Error::NotAnArchive(_)));
    assert!(err.is_archive_error());

    let no_markers = sliced_job("G28\nG1 X10\n", CompressionMethod::Store);
    let err = build_looped_archive(&no_markers, &LoopPlan::new(2)).unwrap_err();
    assert!(matches!(err, Error::MissingMarkers { .. }));
}

#[test]
fn test_write_looped_job_to_disk() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Benchy.gcode.3mf");
    std::fs::write(&input, sliced_job(PLATE_GCODE, CompressionMethod::Store)).unwrap();

    let original = std::fs::read(&input).unwrap();
    let result = build_looped_archive(&original, &LoopPlan::new(5)).unwrap();
    let output = dir.path().join(output_file_name("Benchy.gcode.3mf", 5));
    std::fs::write(&output, &result.archive).unwrap();

    assert!(output.ends_with("Benchy__loopx5.gcode.3mf"));
    let written = std::fs::read(&output).unwrap();
    assert_eq!(entry_text(&written, PLATE_1), result.instruction_text);
    assert_eq!(result.instruction_text.matches(SEQUENCE_START).count(), 5);
}
