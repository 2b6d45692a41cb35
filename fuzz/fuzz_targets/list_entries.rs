//! Fuzz target for archive listing and extraction with arbitrary bytes.
//!
//! Run with: cargo +nightly fuzz run list_entries

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // We don't care about the result - we're looking for panics or hangs
    if let Ok(archive) = plateloop::Archive::parse(data) {
        for entry in archive.entries() {
            let _ = archive.extract(entry);
        }
        let _ = plateloop::merge_instruction(data, 1, b"G28\n");
    }
});
