//! Gzip plumbing shared by the three file tiers.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Why a decompression was refused. The tiers map this onto their own
/// `ProtocolError` variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompressError {
    /// Input is not a gzip stream (including plain uncompressed JSON).
    Malformed,
    /// Decompressed size exceeded the caller's cap.
    TooLarge,
}

pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .expect("writing to an in-memory encoder is infallible");
    encoder
        .finish()
        .expect("finishing an in-memory encoder is infallible")
}

/// Decompress `data`, refusing to inflate past `max_decompressed_bytes`.
/// The cap is enforced while reading, so a gzip bomb never materialises.
pub fn decompress(data: &[u8], max_decompressed_bytes: usize) -> Result<Vec<u8>, DecompressError> {
    let decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .take(max_decompressed_bytes as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|_| DecompressError::Malformed)?;
    if out.len() > max_decompressed_bytes {
        return Err(DecompressError::TooLarge);
    }
    Ok(out)
}
