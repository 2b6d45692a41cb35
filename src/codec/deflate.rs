//! Raw deflate (ZIP method 8).
//!
//! Entry payloads carry a bare deflate stream with no zlib or gzip wrapper,
//! so only flate2's raw `Deflate*` types apply here.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::bufread::DeflateDecoder;
use flate2::write::DeflateEncoder;

/// Largest output reservation made up front from a declared size.
pub const MAX_RESERVE: usize = 1 << 24;

/// Reservation per compressed byte; larger declared sizes grow on demand.
const RESERVE_RATIO: usize = 8;

/// Deflate encoder options.
#[derive(Debug, Clone)]
pub struct DeflateEncoderOptions {
    /// Compression level (0-9, default 6).
    pub level: u32,
}

impl Default for DeflateEncoderOptions {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl DeflateEncoderOptions {
    /// Creates options with the given compression level.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

/// Returns how many bytes to reserve before inflating `compressed_len`
/// bytes that claim to expand to `declared`.
///
/// The declared size comes from the central directory and is untrusted.
pub fn reserve_for(declared: usize, compressed_len: usize) -> usize {
    declared
        .min(compressed_len.saturating_mul(RESERVE_RATIO))
        .min(MAX_RESERVE)
}

/// Inflates a raw deflate stream.
pub fn inflate(compressed: &[u8], declared: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(reserve_for(declared, compressed.len()));
    DeflateDecoder::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}

/// Deflates `data` into a raw stream.
pub fn deflate(data: &[u8], options: &DeflateEncoderOptions) -> io::Result<Vec<u8>> {
    let level = Compression::new(options.level.min(9));
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), level);
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_roundtrip_has_no_zlib_header() {
        let data = b"; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n".repeat(8);
        let compressed = deflate(&data, &DeflateEncoderOptions::default()).unwrap();

        // zlib streams start with 0x78; raw deflate must not carry that wrapper.
        assert_ne!(compressed.first(), Some(&0x78));
        assert_eq!(inflate(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_deflate_encoder_options() {
        assert_eq!(DeflateEncoderOptions::default().level, 6);
        assert_eq!(DeflateEncoderOptions::with_level(9).level, 9);
        assert_eq!(DeflateEncoderOptions::with_level(100).level, 9);
    }

    #[test]
    fn test_reservation_is_bounded() {
        assert_eq!(reserve_for(100, 50), 100);
        assert_eq!(reserve_for(u32::MAX as usize, 2), 16);
        assert_eq!(reserve_for(usize::MAX, usize::MAX), MAX_RESERVE);
        assert_eq!(reserve_for(0, 1000), 0);
    }

    #[test]
    fn test_inflate_grows_past_reservation() {
        let data = vec![b'G'; 100_000];
        let compressed = deflate(&data, &DeflateEncoderOptions::with_level(9)).unwrap();
        assert!(reserve_for(data.len(), compressed.len()) < data.len());
        assert_eq!(inflate(&compressed, data.len()).unwrap(), data);
    }
}
