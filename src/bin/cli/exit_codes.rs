//! Exit codes for the CLI tool.

use plateloop::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Input is not a usable archive
pub const BAD_ARCHIVE: i32 = 3;
/// G-code lacks the block markers
pub const BAD_GCODE: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    BadGcode,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::BadGcode => BAD_GCODE,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a plateloop error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(_) => ExitCode::IoError,
        Error::NotAnArchive(_) | Error::InvalidArchive(_) | Error::Corrupt { .. } => {
            ExitCode::BadArchive
        }
        Error::CrcMismatch { .. } | Error::UnsupportedMethod { .. } => ExitCode::BadArchive,
        Error::EntryNotFound { .. } => ExitCode::BadArgs,
        Error::MissingMarkers { .. } => ExitCode::BadGcode,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
