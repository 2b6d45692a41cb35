//! Checksum computation utilities.
//!
//! Two checksums matter for a 3MF print archive:
//!
//! - **CRC-32** (IEEE 802.3 polynomial, reflected `0xEDB88320`) is stored in
//!   every local header and central-directory record.
//! - **MD5** of the plate G-code is stored next to it as a sidecar entry
//!   (`plate_<n>.gcode.md5`) holding 32 uppercase hex characters. Printer
//!   firmware compares it against the G-code it receives.
//!
//! # Example
//!
//! ```rust
//! use plateloop::checksum::{Checksum, Crc32, crc32, md5_hex_upper};
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), crc32(b"Hello, World!"));
//!
//! assert_eq!(md5_hex_upper(b""), "D41D8CD98F00B204E9800998ECF8427E");
//! ```

use std::fmt::Write as _;

/// Common trait for checksum computation.
pub trait Checksum: Default + Clone {
    /// The output type of this checksum.
    type Output: Copy + Eq + std::fmt::Debug;

    /// Creates a new checksum calculator.
    fn new() -> Self;

    /// Updates the checksum with additional data.
    fn update(&mut self, data: &[u8]);

    /// Finishes the checksum computation and returns the value.
    fn finalize(&self) -> Self::Output;

    /// Resets the checksum to its initial state.
    fn reset(&mut self);

    /// Computes the checksum of a single slice in one call.
    fn compute(data: &[u8]) -> Self::Output {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// CRC-32 checksum calculator.
///
/// Uses the IEEE 802.3 polynomial, the checksum format used by ZIP headers.
///
/// # Example
///
/// ```rust
/// use plateloop::checksum::{Crc32, Checksum};
///
/// let crc = Crc32::compute(b"Hello, World!");
/// assert_eq!(crc, 0xEC4AC3D0);
/// ```
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Checksum for Crc32 {
    type Output = u32;

    fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    fn reset(&mut self) {
        self.hasher.reset();
    }
}

/// Computes the CRC-32 of a buffer.
pub fn crc32(data: &[u8]) -> u32 {
    Crc32::compute(data)
}

/// Computes the MD5 digest of a buffer as 32 uppercase hex characters.
///
/// This is the exact content of a `.gcode.md5` sidecar entry; no trailing
/// newline is appended.
pub fn md5_hex_upper(data: &[u8]) -> String {
    let digest = md5::compute(data);
    let mut out = String::with_capacity(32);
    for byte in digest.0 {
        // Writing into a String cannot fail.
        let _ = write!(out, "{byte:02X}");
    }
    out
}
