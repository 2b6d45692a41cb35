//! Property-based tests using proptest.
//!
//! These tests verify invariants of the archive layers and the text
//! pipeline using randomly generated inputs.

use proptest::prelude::*;

use plateloop::checksum::md5_hex_upper;
use plateloop::edit::merge_instruction;
use plateloop::gcode::{
    LoopPlan, PurgeConfig, format_number, split_blocks, strip_body, sweep_columns,
};
use plateloop::pipeline::build_looped_text;
use plateloop::read::Archive;
use plateloop::write::{EntryInput, write_archive};
use plateloop::{LineEnding, list_entries};

/// Strategy for archive entry names: 1-3 lowercase segments.
fn name_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z][a-z0-9_]{0,7}", 1..4).prop_map(|parts| parts.join("/"))
}

/// Strategy for body lines that carry no block or purge markers.
fn body_line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..300, 0u32..300).prop_map(|(x, y)| format!("G1 X{x} Y{y} E0.05")),
        (0u32..300).prop_map(|z| format!("G0 Z{z}")),
        Just("M400".to_string()),
        Just(";LAYER:1".to_string()),
    ]
}

fn document(
    preamble: &[String],
    header: &[String],
    config: &[String],
    body: &[String],
    eol: &str,
) -> String {
    let mut lines: Vec<String> = preamble.to_vec();
    lines.push("; HEADER_BLOCK_START".into());
    lines.extend(header.iter().cloned());
    lines.push("; HEADER_BLOCK_END".into());
    lines.push("; CONFIG_BLOCK_START".into());
    lines.extend(config.iter().cloned());
    lines.push("; CONFIG_BLOCK_END".into());
    lines.extend(body.iter().cloned());
    let mut text = lines.join(eol);
    text.push_str(eol);
    text
}

proptest! {
    /// Stored entries come back with their names and data.
    #[test]
    fn stored_entries_round_trip(
        entries in proptest::collection::btree_map(
            name_strategy(),
            proptest::collection::vec(any::<u8>(), 0..512),
            1..6,
        )
    ) {
        let inputs: Vec<EntryInput<'_>> = entries
            .iter()
            .map(|(name, data)| EntryInput::stored(name, data.as_slice()))
            .collect();
        let bytes = write_archive(&inputs);

        let archive = Archive::parse(&bytes).unwrap();
        prop_assert_eq!(archive.len(), entries.len());
        for ((name, data), entry) in entries.iter().zip(archive.entries()) {
            prop_assert_eq!(&entry.name, name);
            prop_assert_eq!(&archive.extract(entry).unwrap(), data);
        }
    }

    /// Concatenating the split spans reproduces the document.
    #[test]
    fn split_blocks_concat_is_identity(
        preamble in proptest::collection::vec("; [a-z ]{0,12}", 0..4),
        header in proptest::collection::vec("; [a-z]{1,8}: [0-9]{1,3}", 0..5),
        config in proptest::collection::vec("; [a-z_]{1,10} = [0-9]{1,3}", 0..5),
        body in proptest::collection::vec(body_line_strategy(), 0..20),
        crlf in any::<bool>(),
    ) {
        let eol = if crlf { "\r\n" } else { "\n" };
        let text = document(&preamble, &header, &config, &body, eol);
        let doc = split_blocks(&text).unwrap();
        prop_assert_eq!(doc.concat(), text.clone());
        prop_assert_eq!(doc.body_lines().len(), body.len());
        prop_assert_eq!(doc.line_ending(), LineEnding::detect(&text));
    }

    /// Purge stages only ever remove lines, and the trace accounts for all of them.
    #[test]
    fn strip_body_removes_a_subsequence(
        body in proptest::collection::vec(
            prop_oneof![
                body_line_strategy(),
                Just("; FLUSH_START".to_string()),
                Just("; FLUSH_END".to_string()),
                Just("; wipe and shake".to_string()),
            ],
            0..60,
        )
    ) {
        let lines: Vec<&str> = body.iter().map(String::as_str).collect();
        let out = strip_body(&lines, &PurgeConfig::default());

        prop_assert_eq!(out.lines.len() + out.trace.total_lines(), lines.len());
        let mut rest = lines.iter();
        for kept in &out.lines {
            prop_assert!(rest.any(|line| line == kept), "{} out of order", kept);
        }
    }

    /// Every repetition appears once and the checksum matches the merged text.
    #[test]
    fn looped_archive_is_self_consistent(
        body in proptest::collection::vec(body_line_strategy(), 1..15),
        loops in 1u32..6,
    ) {
        let text = document(&[], &[], &[], &body, "\n");
        let looped = build_looped_text(&text, &LoopPlan::new(loops)).unwrap();
        for i in 1..=loops {
            let banner = format!("; ===== LOOP {} / {} =====", i, loops);
            prop_assert_eq!(looped.text.matches(&banner).count(), 1);
        }

        let original = write_archive(&[EntryInput::stored("Metadata/plate_1.gcode", text.as_bytes())]);
        let merged = merge_instruction(&original, 1, looped.text.as_bytes()).unwrap();
        let entries = list_entries(&merged).unwrap();
        let archive = Archive::parse(&merged).unwrap();
        let gcode = archive.extract(&entries[0]).unwrap();
        let md5 = archive.extract(&entries[1]).unwrap();
        prop_assert_eq!(String::from_utf8(md5).unwrap(), md5_hex_upper(&gcode));
    }

    /// Formatted numbers parse back to within half a thousandth.
    #[test]
    fn format_number_is_close(value in -10_000.0f64..10_000.0) {
        let printed = format_number(value);
        let parsed: f64 = printed.parse().unwrap();
        prop_assert!((parsed - value).abs() <= 0.0005 + 1e-9, "{} -> {}", value, printed);
        prop_assert!(!printed.ends_with('.'));
        prop_assert!(!printed.contains('.') || !printed.ends_with('0'));
    }

    /// Sweep columns stay inside the requested range.
    #[test]
    fn sweep_columns_stay_in_range(
        min in 0.0f64..200.0,
        span in 0.0f64..200.0,
        step in 1.0f64..60.0,
    ) {
        let max = min + span;
        let columns = sweep_columns(min, max, step);
        prop_assert!(!columns.is_empty());
        for x in &columns {
            prop_assert!(*x >= min - 0.001 && *x <= max + 0.001);
        }
        prop_assert!(columns.windows(2).all(|w| w[0] < w[1]));
    }
}
