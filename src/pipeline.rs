//! End-to-end build: archive in, looped archive out.
//!
//! The stages run in a fixed order:
//!
//! 1. [`adjust_bed_hold`] when a hold temperature is set
//! 2. [`strip_top_of_file`] and [`strip_nozzle_load_line`] on the whole text
//! 3. [`split_blocks`] into prefix and body
//! 4. [`strip_body`] on the body lines
//! 5. [`assemble`] the repetitions
//! 6. [`InstructionMerger`] back into the original archive
//!
//! Every stage except splitting and merging is infallible.

use crate::edit::{InstructionMerger, MergeReport, instruction_path};
use crate::format::detect::ensure_archive;
use crate::gcode::{
    LoopPlan, PurgeTrace, adjust_bed_hold, assemble, split_blocks, strip_body,
    strip_nozzle_load_line, strip_top_of_file,
};
use crate::read::{Archive, ArchiveEntry, EntrySelector, SelectInstructionFiles};
use crate::text::LineEnding;
use crate::{Error, Result};

/// Looped instruction text with its purge trace.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopedText {
    /// The generated instruction text.
    pub text: String,
    /// Everything the purge stages removed.
    pub trace: PurgeTrace,
    /// Line ending of the source text, used for every emitted line.
    pub line_ending: LineEnding,
}

/// Result of [`build_looped_archive`].
#[must_use = "the looped archive bytes live in the result"]
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The new archive.
    pub archive: Vec<u8>,
    /// The instruction text embedded in the archive, before line-ending
    /// normalization, for preview.
    pub instruction_text: String,
    /// Everything the purge stages removed.
    pub trace: PurgeTrace,
    /// Entry statistics of the merge. Its `bytes` are moved into `archive`.
    pub report: MergeReport,
    /// Entry the instruction text was read from.
    pub source_entry: String,
}

/// Builds the looped instruction text for `text`.
///
/// # Errors
///
/// Returns [`Error::MissingMarkers`] if the text has no header/config
/// block markers.
///
/// # Example
///
/// ```rust
/// use plateloop::gcode::LoopPlan;
/// use plateloop::pipeline::build_looped_text;
///
/// let text = "; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n\
///             ; CONFIG_BLOCK_START\n; CONFIG_BLOCK_END\nG1 X5 Y5 E1\n";
/// let looped = build_looped_text(text, &LoopPlan::new(2))?;
/// assert!(looped.text.contains("; ===== LOOP 2 / 2 ====="));
/// assert!(looped.trace.is_empty());
/// # Ok::<(), plateloop::Error>(())
/// ```
pub fn build_looped_text(text: &str, plan: &LoopPlan) -> Result<LoopedText> {
    let held = adjust_bed_hold(text, plan.bed_hold_c);
    let top = strip_top_of_file(&held, &plan.purge);
    let nozzle = strip_nozzle_load_line(&top.text, &plan.purge);

    let document = split_blocks(&nozzle.text)?;
    let body = document.body_lines();
    let stripped = strip_body(&body, &plan.purge);
    let looped = assemble(&document, &stripped.lines, plan);

    let mut trace = top.trace;
    trace.extend(nozzle.trace);
    trace.extend(stripped.trace);
    log::debug!(
        "purge removed {} lines in {} blocks",
        trace.total_lines(),
        trace.removals().len()
    );

    Ok(LoopedText {
        text: looped,
        trace,
        line_ending: document.line_ending(),
    })
}

fn locate_instruction<'e>(archive: &'e Archive<'_>, plate_index: u32) -> Result<&'e ArchiveEntry> {
    let target = instruction_path(plate_index);
    if let Some(entry) = archive.find(&target) {
        return Ok(entry);
    }
    let fallback = archive
        .entries()
        .iter()
        .find(|e| SelectInstructionFiles.select(e))
        .ok_or_else(|| Error::EntryNotFound {
            path: target.clone(),
        })?;
    log::warn!("'{}' not found, using '{}' instead", target, fallback.name);
    Ok(fallback)
}

/// Repeats the print in `original` according to `plan`.
///
/// Reads the plate's instruction file (or the first `.gcode` entry if the
/// plate path is absent), loops it, and merges it back so that only the
/// instruction file and its checksum change.
///
/// # Errors
///
/// - [`Error::NotAnArchive`] if `original` does not start with `PK` or has
///   no central directory
/// - [`Error::EntryNotFound`] if the archive holds no `.gcode` entry
/// - [`Error::MissingMarkers`] if the instruction text lacks block markers
/// - archive corruption and CRC errors from reading and merging
pub fn build_looped_archive(original: &[u8], plan: &LoopPlan) -> Result<MergeResult> {
    ensure_archive(original)?;
    let archive = Archive::parse(original)?;
    let plate_index = plan.plate_index();

    let entry = locate_instruction(&archive, plate_index)?;
    let bytes = archive.extract(entry)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("'{}' is not valid UTF-8, decoding lossily", entry.name);
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };

    let looped = build_looped_text(&text, plan)?;
    let mut report = InstructionMerger::new(original)
        .plate(plate_index)
        .apply(looped.text.as_bytes())?;
    let merged = std::mem::take(&mut report.bytes);

    log::debug!(
        "built {} loops of '{}' into a {} byte archive",
        plan.loop_count(),
        entry.name,
        merged.len()
    );

    Ok(MergeResult {
        archive: merged,
        instruction_text: looped.text,
        trace: looped.trace,
        source_entry: entry.name.clone(),
        report,
    })
}

/// Output file name for a looped job: `<stem>__loopx<N>.gcode.3mf`.
///
/// The first `.gcode` or `.gcode.3mf` in `input_name` (any case) is
/// removed to form the stem.
///
/// ```rust
/// use plateloop::pipeline::output_file_name;
///
/// assert_eq!(output_file_name("Benchy.gcode.3mf", 3), "Benchy__loopx3.gcode.3mf");
/// assert_eq!(output_file_name("part.GCODE", 2), "part__loopx2.gcode.3mf");
/// ```
pub fn output_file_name(input_name: &str, loops: u32) -> String {
    let lower = input_name.to_ascii_lowercase();
    let stem = match lower.find(".gcode") {
        Some(at) => {
            let mut end = at + ".gcode".len();
            if lower[end..].starts_with(".3mf") {
                end += ".3mf".len();
            }
            format!("{}{}", &input_name[..at], &input_name[end..])
        }
        None => input_name.to_string(),
    };
    format!("{stem}__loopx{}.gcode.3mf", loops.max(1))
}
