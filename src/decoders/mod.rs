//! Stream filter decoders.
//!
//! Supported filters:
//! - FlateDecode (zlib/deflate), with PNG and TIFF predictors
//! - ASCIIHexDecode
//! - ASCII85Decode
//!
//! Image codecs (DCTDecode, JPXDecode) are passed through untouched since the
//! engine never needs decoded pixels. Anything else is reported as
//! [`Error::Unsupported`].

use crate::error::{Error, Result};

mod ascii;
mod flate;
mod predictor;

pub use ascii::{decode_ascii85, decode_ascii_hex};
pub use flate::{decode_flate, encode_flate};
pub use predictor::{decode_predictor, DecodeParams};

/// Upper bound on the size of any single decoded stream.
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 100 * 1024 * 1024;

/// Decode stream data through a filter pipeline, applying filters in order.
pub fn decode_stream(
    data: &[u8],
    filters: &[String],
    params: Option<&DecodeParams>,
) -> Result<Vec<u8>> {
    decode_stream_with_limit(data, filters, params, DEFAULT_MAX_DECOMPRESSED_SIZE)
}

/// Like [`decode_stream`] with an explicit output size limit.
pub fn decode_stream_with_limit(
    data: &[u8],
    filters: &[String],
    params: Option<&DecodeParams>,
    max_size: usize,
) -> Result<Vec<u8>> {
    let mut current = data.to_vec();

    for filter in filters {
        current = match filter.as_str() {
            "FlateDecode" | "Fl" => {
                let inflated = decode_flate(&current, max_size)?;
                match params {
                    Some(p) if p.predictor > 1 => decode_predictor(&inflated, p)?,
                    _ => inflated,
                }
            },
            "ASCIIHexDecode" | "AHx" => decode_ascii_hex(&current)?,
            "ASCII85Decode" | "A85" => decode_ascii85(&current)?,
            "DCTDecode" | "DCT" | "JPXDecode" => current,
            other => return Err(Error::Unsupported(format!("stream filter /{}", other))),
        };
        if current.len() > max_size {
            return Err(Error::Unsupported(format!(
                "decoded stream exceeds {} bytes",
                max_size
            )));
        }
    }

    Ok(current)
}

/// Error for bad filter input. Offsets are not meaningful inside a stream.
pub(crate) fn decode_error(filter: &str, reason: impl std::fmt::Display) -> Error {
    Error::malformed(0, format!("{}: {}", filter, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filters_is_identity() {
        assert_eq!(decode_stream(b"abc", &[], None).unwrap(), b"abc");
    }

    #[test]
    fn test_filter_chain() {
        let compressed = encode_flate(b"Hello, chain!").unwrap();
        let hex: String = compressed.iter().map(|b| format!("{:02X}", b)).collect();
        let input = format!("{}>", hex);
        let filters = vec!["ASCIIHexDecode".to_string(), "FlateDecode".to_string()];
        let out = decode_stream(input.as_bytes(), &filters, None).unwrap();
        assert_eq!(out, b"Hello, chain!");
    }

    #[test]
    fn test_unknown_filter_is_unsupported() {
        let err = decode_stream(b"x", &["JBIG2Decode".to_string()], None).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_size_limit() {
        let compressed = encode_flate(&vec![0u8; 4096]).unwrap();
        let err = decode_stream_with_limit(&compressed, &["FlateDecode".to_string()], None, 100)
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
