//! Object streams (`/Type /ObjStm`).
//!
//! The decoded body starts with `/N` pairs of `object-number offset`, and the
//! objects themselves follow at `/First + offset`. The reader expands every
//! object stream on load so the graph only holds plain indirect objects.

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::{Dict, Object};
use crate::parser::parse_value;

/// Parse the objects in an object stream.
///
/// `decoded` is the stream body after decryption and filter decoding.
/// Returns `(object number, object)` in stream order.
pub fn parse_object_stream(dict: &Dict, decoded: &[u8], max_nesting: usize) -> Result<Vec<(u32, Object)>> {
    let int = |key: &str| {
        dict.get(key)
            .and_then(|o| o.as_integer())
            .filter(|&n| n >= 0)
            .map(|n| n as usize)
            .ok_or_else(|| Error::malformed(0, format!("object stream missing /{}", key)))
    };
    let count = int("N")?;
    let first = int("First")?;
    if first > decoded.len() {
        return Err(Error::malformed(0, "object stream /First past end of data"));
    }

    let mut header = &decoded[..first];
    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let (rest, num) = read_int(header)?;
        let (rest, offset) = read_int(rest)?;
        pairs.push((num as u32, offset as usize));
        header = rest;
    }

    let body = &decoded[first..];
    let mut objects = Vec::with_capacity(count);
    for (num, offset) in pairs {
        if offset >= body.len() {
            log::warn!("object {} offset {} outside object stream", num, offset);
            continue;
        }
        match parse_value(&body[offset..], max_nesting, &|_| None) {
            Ok((_, obj)) => objects.push((num, obj)),
            Err(e) => log::warn!("skipping unreadable object {} in object stream: {:?}", num, e),
        }
    }
    Ok(objects)
}

fn read_int(input: &[u8]) -> Result<(&[u8], u32)> {
    match token(input) {
        Ok((rest, Token::Integer(n))) if (0..=u32::MAX as i64).contains(&n) => Ok((rest, n as u32)),
        _ => Err(Error::malformed(0, "object stream header is not a list of integers")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(n: i64, first: i64) -> Dict {
        Object::dict(vec![
            ("Type", Object::name("ObjStm")),
            ("N", Object::Integer(n)),
            ("First", Object::Integer(first)),
        ])
        .as_dict()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_parse_two_objects() {
        let header = b"10 0 11 13 ";
        let body = b"<< /A 1 >>   [1 2 3]";
        let mut data = header.to_vec();
        data.extend_from_slice(body);
        let objs = parse_object_stream(&dict(2, header.len() as i64), &data, 16).unwrap();
        assert_eq!(objs.len(), 2);
        assert_eq!(objs[0].0, 10);
        assert_eq!(objs[0].1.as_dict().unwrap()["A"], Object::Integer(1));
        assert_eq!(objs[1].0, 11);
        assert_eq!(objs[1].1.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_keys() {
        let d = Object::dict(vec![("N", Object::Integer(1))]).as_dict().cloned().unwrap();
        assert!(parse_object_stream(&d, b"1 0 null", 16).is_err());
    }

    #[test]
    fn test_first_past_end() {
        assert!(parse_object_stream(&dict(1, 99), b"1 0 null", 16).is_err());
    }
}
