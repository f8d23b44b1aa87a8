//! FlateDecode (zlib/deflate) via flate2.

use super::decode_error;
use crate::error::Result;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Inflate zlib data, reading at most `max_size + 1` bytes.
///
/// Falls back to raw deflate when the zlib header is damaged, and keeps
/// whatever was recovered before a mid-stream error.
pub fn decode_flate(input: &[u8], max_size: usize) -> Result<Vec<u8>> {
    let limit = max_size as u64 + 1;
    let mut output = Vec::new();
    match ZlibDecoder::new(input).take(limit).read_to_end(&mut output) {
        Ok(_) => return Ok(output),
        Err(e) if !output.is_empty() => {
            log::warn!("FlateDecode partial recovery: {} bytes before error: {}", output.len(), e);
            return Ok(output);
        },
        Err(e) => log::debug!("zlib decode failed ({}), trying raw deflate", e),
    }

    output.clear();
    match DeflateDecoder::new(input).take(limit).read_to_end(&mut output) {
        Ok(_) => Ok(output),
        Err(_) if !output.is_empty() => Ok(output),
        Err(e) => Err(decode_error("FlateDecode", e)),
    }
}

/// Compress with zlib at the default level.
pub fn encode_flate(input: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(input)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flate_roundtrip() {
        let original = b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET".repeat(10);
        let compressed = encode_flate(&original).unwrap();
        assert!(compressed.len() < original.len());
        assert_eq!(decode_flate(&compressed, 1 << 20).unwrap(), original);
    }

    #[test]
    fn test_flate_garbage_fails() {
        assert!(decode_flate(b"definitely not zlib", 1024).is_err());
    }
}
