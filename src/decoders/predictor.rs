//! PNG (10-15) and TIFF (2) predictor reversal.
//!
//! Xref streams written by most producers use `/Predictor 12` (PNG Up).

use super::decode_error;
use crate::error::Result;

/// Decode parameters from a `/DecodeParms` dictionary.
#[derive(Debug, Clone)]
pub struct DecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: i64,
    /// Samples per row
    pub columns: usize,
    /// Components per sample
    pub colors: usize,
    /// Bits per component
    pub bits_per_component: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl DecodeParams {
    fn row_bytes(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component).div_ceil(8)
    }

    fn pixel_bytes(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }
}

/// Reverse the predictor named in `params`.
pub fn decode_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => decode_tiff(data, params),
        10..=15 => decode_png(data, params),
        other => Err(decode_error("Predictor", format!("unsupported predictor {}", other))),
    }
}

fn decode_png(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let row_len = params.row_bytes();
    let bpp = params.pixel_bytes();
    let mut output = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_len];

    for chunk in data.chunks(row_len + 1) {
        let (tag, encoded) = match chunk.split_first() {
            Some(split) => split,
            None => break,
        };
        let mut row = encoded.to_vec();
        row.resize(row_len, 0);

        for i in 0..row_len {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                t => return Err(decode_error("Predictor", format!("invalid PNG row tag {}", t))),
            };
            row[i] = row[i].wrapping_add(predicted);
        }

        output.extend_from_slice(&row[..encoded.len().min(row_len)]);
        prev = row;
    }
    Ok(output)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn decode_tiff(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    if params.bits_per_component != 8 {
        return Err(decode_error("Predictor", "TIFF predictor only supports 8 bits per component"));
    }
    let row_len = params.row_bytes();
    let mut output = data.to_vec();
    for row in output.chunks_mut(row_len) {
        for i in params.colors..row.len() {
            row[i] = row[i].wrapping_add(row[i - params.colors]);
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(predictor: i64, columns: usize) -> DecodeParams {
        DecodeParams {
            predictor,
            columns,
            ..Default::default()
        }
    }

    #[test]
    fn test_png_up() {
        // Two rows of width 3; second row encoded as differences from the first.
        let data = [2, 1, 2, 3, 2, 1, 1, 1];
        let out = decode_predictor(&data, &params(12, 3)).unwrap();
        assert_eq!(out, vec![1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn test_png_sub() {
        let data = [1, 5, 1, 1];
        let out = decode_predictor(&data, &params(11, 3)).unwrap();
        assert_eq!(out, vec![5, 6, 7]);
    }

    #[test]
    fn test_tiff() {
        let out = decode_predictor(&[10, 1, 1], &params(2, 3)).unwrap();
        assert_eq!(out, vec![10, 11, 12]);
    }

    #[test]
    fn test_unknown_predictor() {
        assert!(decode_predictor(&[0], &params(7, 1)).is_err());
    }
}
