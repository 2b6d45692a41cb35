//! Input format detection.
//!
//! Uploads are either a sliced 3MF archive (`.gcode.3mf`) or a bare G-code
//! file. Archives are recognized by their `PK` prefix; anything else is
//! rejected before parsing begins.

use super::ARCHIVE_PREFIX;
use crate::{Error, Result};

/// Returns `true` if `data` starts with the `PK` archive prefix.
///
/// # Example
///
/// ```rust
/// use plateloop::format::detect::is_archive;
///
/// assert!(is_archive(b"PK\x03\x04"));
/// assert!(!is_archive(b"; HEADER_BLOCK_START\n"));
/// ```
pub fn is_archive(data: &[u8]) -> bool {
    data.starts_with(ARCHIVE_PREFIX)
}

/// Fails with [`Error::NotAnArchive`] unless `data` starts with `PK`.
pub fn ensure_archive(data: &[u8]) -> Result<()> {
    if is_archive(data) {
        Ok(())
    } else {
        Err(Error::NotAnArchive(
            "missing PK signature; expected a .gcode.3mf exported by the slicer".into(),
        ))
    }
}
