//! Entry paths of plate instruction files inside a 3MF archive.

/// Directory holding per-plate G-code.
pub const METADATA_DIR: &str = "Metadata";

/// Suffix of the checksum sidecar.
pub const CHECKSUM_SUFFIX: &str = ".md5";

/// Returns `Metadata/plate_<n>.gcode`, with `n` clamped to at least 1.
///
/// # Example
///
/// ```rust
/// use plateloop::edit::{checksum_path, instruction_path};
///
/// assert_eq!(instruction_path(2), "Metadata/plate_2.gcode");
/// assert_eq!(instruction_path(0), "Metadata/plate_1.gcode");
/// assert_eq!(checksum_path(2), "Metadata/plate_2.gcode.md5");
/// ```
pub fn instruction_path(plate_index: u32) -> String {
    format!("{METADATA_DIR}/plate_{}.gcode", plate_index.max(1))
}

/// Returns the checksum sidecar path for a plate.
pub fn checksum_path(plate_index: u32) -> String {
    format!("{}{CHECKSUM_SUFFIX}", instruction_path(plate_index))
}
