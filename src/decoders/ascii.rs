//! ASCIIHexDecode and ASCII85Decode.

use super::decode_error;
use crate::error::Result;

/// Decode hex pairs up to `>`. Whitespace is ignored and an odd final digit
/// is padded with 0.
pub fn decode_ascii_hex(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() / 2);
    let mut high: Option<u8> = None;

    for &byte in input {
        if byte == b'>' {
            break;
        }
        if byte.is_ascii_whitespace() {
            continue;
        }
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => return Err(decode_error("ASCIIHexDecode", format!("invalid digit '{}'", byte as char))),
        };
        match high.take() {
            Some(h) => output.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }
    if let Some(h) = high {
        output.push(h << 4);
    }
    Ok(output)
}

/// Decode base-85 groups up to `~>`. `z` stands for four zero bytes.
pub fn decode_ascii85(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 4 / 5);
    let mut group = [0u32; 5];
    let mut count = 0;

    for &byte in input {
        match byte {
            b'~' => break,
            b'z' if count == 0 => output.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[count] = (byte - b'!') as u32;
                count += 1;
                if count == 5 {
                    output.extend_from_slice(&group_value(&group)?.to_be_bytes());
                    count = 0;
                }
            },
            _ if byte.is_ascii_whitespace() => {},
            _ => return Err(decode_error("ASCII85Decode", format!("invalid character '{}'", byte as char))),
        }
    }

    if count == 1 {
        return Err(decode_error("ASCII85Decode", "truncated final group"));
    }
    if count > 1 {
        // Pad with 'u' and keep count - 1 bytes.
        for slot in group.iter_mut().skip(count) {
            *slot = 84;
        }
        let bytes = group_value(&group)?.to_be_bytes();
        output.extend_from_slice(&bytes[..count - 1]);
    }
    Ok(output)
}

fn group_value(group: &[u32; 5]) -> Result<u32> {
    group
        .iter()
        .try_fold(0u32, |acc, &d| acc.checked_mul(85).and_then(|v| v.checked_add(d)))
        .ok_or_else(|| decode_error("ASCII85Decode", "group overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_hex() {
        assert_eq!(decode_ascii_hex(b"48 65 6C6C6F>").unwrap(), b"Hello");
        assert_eq!(decode_ascii_hex(b"7>").unwrap(), vec![0x70]);
        assert!(decode_ascii_hex(b"XY>").is_err());
    }

    #[test]
    fn test_ascii85() {
        assert_eq!(decode_ascii85(b"87cURD]i,\"Ebo80~>").unwrap(), b"Hello World!");
        assert_eq!(decode_ascii85(b"z~>").unwrap(), vec![0, 0, 0, 0]);
        // Partial final group
        assert_eq!(decode_ascii85(b"87cURDZ~>").unwrap(), b"Hello");
    }
}
