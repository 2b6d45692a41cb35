//! Compression methods for archive entries.
//!
//! 3MF archives written by slicers only ever use two ZIP methods: store (0)
//! and raw deflate (8, no zlib or gzip wrapper). Other method identifiers are
//! carried through untouched when an entry is copied, but cannot be decoded.

pub mod deflate;

use crate::{Error, Result};

pub use deflate::DeflateEncoderOptions;

/// ZIP compression method identifiers.
pub mod method {
    /// Stored (no compression).
    pub const STORE: u16 = 0;
    /// Raw deflate.
    pub const DEFLATE: u16 = 8;
}

/// Compression method of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Stored without compression (method 0).
    Store,
    /// Raw deflate (method 8).
    Deflate,
    /// Any other method; preserved on passthrough, never decoded.
    Other(u16),
}

impl CompressionMethod {
    /// Maps a ZIP method identifier to a method.
    pub fn from_id(id: u16) -> Self {
        match id {
            method::STORE => Self::Store,
            method::DEFLATE => Self::Deflate,
            other => Self::Other(other),
        }
    }

    /// Returns the ZIP method identifier.
    pub fn id(self) -> u16 {
        match self {
            Self::Store => method::STORE,
            Self::Deflate => method::DEFLATE,
            Self::Other(id) => id,
        }
    }

    /// Returns `true` if this crate can encode and decode the method.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns a short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Deflate => "deflate",
            Self::Other(_) => "unknown",
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(id) => write!(f, "method {}", id),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Compresses `data` with `method`.
///
/// Store returns a copy of the input.
pub fn compress(
    method: CompressionMethod,
    data: &[u8],
    options: &DeflateEncoderOptions,
) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Store => Ok(data.to_vec()),
        CompressionMethod::Deflate => Ok(deflate::deflate(data, options)?),
        CompressionMethod::Other(id) => Err(Error::UnsupportedMethod { method: id }),
    }
}

/// Decompresses `data` with `method`.
///
/// `size_hint` is the declared uncompressed size. It pre-sizes the output
/// buffer up to [`deflate::MAX_RESERVE`] and is not enforced here (callers
/// verify the CRC).
pub fn decompress(method: CompressionMethod, data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Store => Ok(data.to_vec()),
        CompressionMethod::Deflate => Ok(deflate::inflate(data, size_hint)?),
        CompressionMethod::Other(id) => Err(Error::UnsupportedMethod { method: id }),
    }
}
