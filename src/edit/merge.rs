//! Replacing a plate's instruction file inside an existing archive.

use std::borrow::Cow;

use crate::checksum::{crc32, md5_hex_upper};
use crate::codec::{self, CompressionMethod, DeflateEncoderOptions};
use crate::read::{self, ArchiveEntry};
use crate::text::LineEnding;
use crate::write::{ArchiveWriter, EntryInput};
use crate::{Error, Result};

use super::paths::{checksum_path, instruction_path};

/// What happened to one entry during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Copied byte-for-byte.
    Kept,
    /// Rewritten in place with new content.
    Updated,
    /// Appended because the original archive lacked it.
    Added,
}

/// Result of a merge.
#[must_use = "the merged archive bytes live in the report"]
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// The new archive.
    pub bytes: Vec<u8>,
    /// Number of entries copied unchanged.
    pub entries_kept: usize,
    /// Number of entries rewritten (instruction file and/or checksum).
    pub entries_updated: usize,
    /// Number of entries appended.
    pub entries_added: usize,
    /// Line ending of the original instruction file, if it existed.
    pub line_ending: Option<LineEnding>,
    /// Method the new instruction file was stored with.
    pub instruction_method: Option<CompressionMethod>,
    /// Uppercase MD5 written to the checksum sidecar.
    pub checksum: String,
}

impl MergeReport {
    /// Returns the total number of entries in the new archive.
    pub fn total_entries(&self) -> usize {
        self.entries_kept + self.entries_updated + self.entries_added
    }

    fn record(&mut self, action: MergeAction) {
        match action {
            MergeAction::Kept => self.entries_kept += 1,
            MergeAction::Updated => self.entries_updated += 1,
            MergeAction::Added => self.entries_added += 1,
        }
    }
}

/// Rewrites the instruction file of one plate inside an archive.
///
/// Only `Metadata/plate_<n>.gcode` and its `.md5` sidecar change; every
/// other entry keeps its name, method, payload, CRC and sizes.
///
/// # Example
///
/// ```rust,ignore
/// use plateloop::edit::InstructionMerger;
///
/// let original = std::fs::read("benchy.gcode.3mf")?;
/// let report = InstructionMerger::new(&original)
///     .plate(1)
///     .apply(b"; HEADER_BLOCK_START\n...")?;
/// std::fs::write("benchy__loopx3.gcode.3mf", &report.bytes)?;
/// ```
#[derive(Debug, Clone)]
pub struct InstructionMerger<'a> {
    original: &'a [u8],
    plate_index: u32,
    options: DeflateEncoderOptions,
}

impl<'a> InstructionMerger<'a> {
    /// Creates a merger targeting plate 1 of `original`.
    pub fn new(original: &'a [u8]) -> Self {
        Self {
            original,
            plate_index: 1,
            options: DeflateEncoderOptions::default(),
        }
    }

    /// Selects the plate (1-based; 0 is treated as 1).
    pub fn plate(mut self, plate_index: u32) -> Self {
        self.plate_index = plate_index.max(1);
        self
    }

    /// Sets the deflate options used when re-compressing the instruction file.
    pub fn with_options(mut self, options: DeflateEncoderOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the new archive with `instruction` as the plate's G-code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchive`] if `original` has no central
    /// directory, [`Error::Corrupt`] if any entry's local header does not
    /// validate, and propagates compression failures.
    pub fn apply(self, instruction: &[u8]) -> Result<MergeReport> {
        let entries = read::list_entries(self.original).map_err(|err| match err {
            Error::NotAnArchive(_) => Error::InvalidArchive("no central directory".into()),
            other => other,
        })?;

        let target = instruction_path(self.plate_index);
        let target_checksum = checksum_path(self.plate_index);

        let mut report = MergeReport::default();
        report.line_ending = match read::find_entry(&entries, &target) {
            Some(entry) => Some(self.detect_line_ending(entry)?),
            None => None,
        };

        let normalized = match report.line_ending {
            Some(eol) => eol.normalize_bytes(instruction),
            None => instruction.to_vec(),
        };
        let crc = crc32(&normalized);
        report.checksum = md5_hex_upper(&normalized);
        let checksum_bytes = report.checksum.clone().into_bytes();

        log::debug!(
            "merging {} bytes into '{}' (line ending {}, md5 {})",
            normalized.len(),
            target,
            report
                .line_ending
                .map_or_else(|| "unchanged".to_string(), |e| e.to_string()),
            report.checksum
        );

        let mut writer = ArchiveWriter::new();
        let mut saw_instruction = false;
        let mut saw_checksum = false;

        for entry in &entries {
            let payload = read::read_entry_payload(self.original, entry)?;

            if entry.name_matches(&target) {
                saw_instruction = true;
                let input = self.instruction_input(entry.method, &normalized, crc)?;
                report.instruction_method = Some(input.method);
                writer.add(input.named_like(entry));
                report.record(MergeAction::Updated);
            } else if entry.name_matches(&target_checksum) {
                saw_checksum = true;
                writer.add(
                    EntryInput::stored(&target_checksum, checksum_bytes.as_slice())
                        .named_like(entry),
                );
                report.record(MergeAction::Updated);
            } else {
                writer.add(EntryInput::passthrough(entry, payload));
                report.record(MergeAction::Kept);
            }
        }

        if !saw_instruction {
            log::debug!("'{}' not in archive, appending", target);
            writer.add(EntryInput::stored(&target, normalized.as_slice()));
            report.instruction_method = Some(CompressionMethod::Store);
            report.record(MergeAction::Added);
        }
        if !saw_checksum {
            log::debug!("'{}' not in archive, appending", target_checksum);
            writer.add(EntryInput::stored(&target_checksum, checksum_bytes.as_slice()));
            report.record(MergeAction::Added);
        }

        log::debug!(
            "merge kept {} entries, updated {}, added {}",
            report.entries_kept,
            report.entries_updated,
            report.entries_added
        );

        let (bytes, _) = writer.finish();
        report.bytes = bytes;
        Ok(report)
    }

    fn detect_line_ending(&self, entry: &ArchiveEntry) -> Result<LineEnding> {
        let payload = read::read_entry_payload(self.original, entry)?;
        let text: Cow<'_, [u8]> = match entry.method {
            CompressionMethod::Store => Cow::Borrowed(payload),
            CompressionMethod::Deflate => Cow::Owned(codec::decompress(
                entry.method,
                payload,
                entry.uncompressed_size as usize,
            )?),
            CompressionMethod::Other(id) => {
                log::warn!(
                    "'{}' uses method {}; detecting line endings on raw bytes",
                    entry.name,
                    id
                );
                Cow::Borrowed(payload)
            }
        };
        Ok(LineEnding::detect_bytes(&text))
    }

    fn instruction_input<'n>(
        &self,
        original_method: CompressionMethod,
        normalized: &'n [u8],
        crc: u32,
    ) -> Result<EntryInput<'n>> {
        let name = instruction_path(self.plate_index);
        if original_method == CompressionMethod::Deflate {
            let packed = codec::compress(CompressionMethod::Deflate, normalized, &self.options)?;
            Ok(EntryInput::deflated(
                &name,
                packed,
                crc,
                normalized.len() as u32,
            ))
        } else {
            Ok(EntryInput::stored(&name, normalized))
        }
    }
}

/// Replaces plate `plate_index`'s instruction file and checksum in `original`.
///
/// Shorthand for [`InstructionMerger`] with default deflate options.
pub fn merge_instruction(original: &[u8], plate_index: u32, instruction: &[u8]) -> Result<Vec<u8>> {
    Ok(InstructionMerger::new(original)
        .plate(plate_index)
        .apply(instruction)?
        .bytes)
}
