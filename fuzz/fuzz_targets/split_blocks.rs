//! Fuzz target for the text pipeline: splitting, purge removal and assembly.
//!
//! Run with: cargo +nightly fuzz run split_blocks

#![no_main]

use libfuzzer_sys::fuzz_target;
use plateloop::gcode::{LoopPlan, detect_defaults, split_blocks, split_print_region};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(doc) = split_blocks(&text) {
        let _ = doc.concat();
        let _ = doc.body_lines();
    }
    let _ = plateloop::build_looped_text(&text, &LoopPlan::new(2));
    let _ = split_print_region(&text).concat();
    let _ = detect_defaults(&text);
});
