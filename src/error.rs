//! Error types for archive repacking and instruction rewriting.
//!
//! This module provides the [`Error`] enum which represents every failure
//! the crate can report, along with a convenient [`Result<T>`] type alias.
//!
//! The purge heuristics never fail: a pattern that is not found simply
//! skips its stage. Errors come from the archive layer (a buffer that is not
//! an archive, a damaged record, a method we cannot decode) and from the
//! block splitter when the instruction text lacks its header/config markers.
//!
//! # Example
//!
//! ```rust
//! use plateloop::Error;
//!
//! fn print_user_message(error: &Error) {
//!     match error {
//!         Error::NotAnArchive(_) => println!("Please upload a .gcode.3mf file."),
//!         Error::MissingMarkers { .. } => println!("The G-code is not a recognized slicer export."),
//!         e if e.is_corruption() => println!("The archive is damaged."),
//!         _ => println!("Error: {}", error),
//!     }
//! }
//! ```

use std::io;

/// Helper struct for formatting CrcMismatch error messages.
struct CrcMismatchDisplay<'a> {
    name: &'a str,
    expected: u32,
    actual: u32,
}

impl std::fmt::Display for CrcMismatchDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CRC mismatch for entry '{}': expected {:#010x}, got {:#010x}",
            self.name, self.expected, self.actual
        )
    }
}

/// The main error type for this crate.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | Compression streams, file access in the CLI |
/// | Archive | [`NotAnArchive`][Self::NotAnArchive], [`InvalidArchive`][Self::InvalidArchive], [`Corrupt`][Self::Corrupt] | Not a ZIP container, or a damaged one |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod] | Entry compressed with something other than store/deflate |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch] | Extracted data does not match its header |
/// | Lookup | [`EntryNotFound`][Self::EntryNotFound] | No instruction file inside the archive |
/// | Instruction text | [`MissingMarkers`][Self::MissingMarkers] | Header/config block markers absent |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while compressing, decompressing or accessing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The buffer is not a ZIP-family archive.
    ///
    /// Returned when the `PK` prefix is missing or no end-of-central-directory
    /// record can be found scanning backward from the end of the buffer.
    #[error("Not an archive: {0}")]
    NotAnArchive(String),

    /// The archive handed to the merge step has no usable central directory.
    #[error("Invalid 3mf: {0}")]
    InvalidArchive(String),

    /// A record inside the archive is damaged or truncated.
    #[error("Corrupt archive at offset {offset:#x}: {reason}")]
    Corrupt {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The entry uses a compression method other than store (0) or deflate (8).
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The ZIP method identifier.
        method: u16,
    },

    /// Extracted data does not match the CRC-32 recorded for the entry.
    #[error("{}", CrcMismatchDisplay { name: name.as_str(), expected: *expected, actual: *actual })]
    CrcMismatch {
        /// Name of the entry.
        name: String,
        /// The CRC recorded in the central directory.
        expected: u32,
        /// The CRC of the extracted data.
        actual: u32,
    },

    /// No entry with the requested path exists in the archive.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// The instruction text lacks the header/config block markers.
    ///
    /// `marker` names the first marker that could not be found in order.
    #[error("Invalid G-code: missing {marker} marker (expected HEADER/CONFIG block markers)")]
    MissingMarkers {
        /// The marker that was not found.
        marker: &'static str,
    },
}

impl Error {
    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CrcMismatch { .. } | Error::Corrupt { .. })
    }

    /// Returns `true` if the error means the input is not a usable archive at all.
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            Error::NotAnArchive(_) | Error::InvalidArchive(_) | Error::Corrupt { .. }
        )
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::CrcMismatch { name, .. } => Some(name.as_str()),
            Error::EntryNotFound { path } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Creates a Corrupt error.
    pub fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        Error::Corrupt {
            offset,
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
