//! PDF object parser.
//!
//! Recursive descent over lexer tokens. Composite values (arrays,
//! dictionaries, streams) recurse with a nesting limit; `N G R` triples are
//! recognized by two-token lookahead after an integer.
//!
//! All functions return nom's `IResult`. [`to_error`] turns a nom failure
//! into [`Error::MalformedDocument`] with the absolute byte offset.

use crate::error::{Error, Result};
use crate::lexer::{skip_ws, token, Token};
use crate::object::{Dict, Object, ObjectRef};
use nom::IResult;

/// Nesting limit used by [`parse_object`].
pub const DEFAULT_MAX_NESTING: usize = 256;

/// Resolves an indirect `/Length` while a stream body is being read.
pub type LengthResolver<'r> = &'r dyn Fn(ObjectRef) -> Option<usize>;

fn fail(input: &[u8], kind: nom::error::ErrorKind) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}

/// Convert a nom error into a malformed-document error.
///
/// `buffer_len` is the length of the whole file. Parsers are always handed a
/// suffix of the file, so `buffer_len - remaining` is the absolute offset.
pub fn to_error(buffer_len: usize, err: nom::Err<nom::error::Error<&[u8]>>, what: &str) -> Error {
    match err {
        nom::Err::Incomplete(_) => Error::malformed(buffer_len, format!("truncated {}", what)),
        nom::Err::Error(e) | nom::Err::Failure(e) => Error::malformed(
            buffer_len.saturating_sub(e.input.len()),
            format!("invalid {} ({:?})", what, e.code),
        ),
    }
}

/// Decode escape sequences in a raw literal string.
///
/// Handles `\n \r \t \b \f \( \) \\`, one to three digit octal escapes, and
/// backslash line continuations. An unknown escape drops the backslash.
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let c = raw[i];
        if c == b'\r' {
            // Bare CR and CRLF inside a string both mean LF.
            out.push(b'\n');
            i += if raw.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
            continue;
        }
        if c != b'\\' || i + 1 >= raw.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let esc = raw[i + 1];
        i += 2;
        match esc {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'(' | b')' | b'\\' => out.push(esc),
            b'\n' => {},
            b'\r' => {
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            },
            b'0'..=b'7' => {
                let mut value = (esc - b'0') as u32;
                for _ in 0..2 {
                    match raw.get(i) {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            i += 1;
                        },
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            },
            other => out.push(other),
        }
    }
    out
}

/// Decode the contents of a hex string. Whitespace is ignored and an odd
/// digit count is padded with a trailing 0.
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    crate::decoders::decode_ascii_hex(hex_bytes)
}

/// Parse one direct object.
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    parse_value(input, DEFAULT_MAX_NESTING, &|_| None)
}

/// Parse one direct object with an explicit nesting limit and a resolver
/// for indirect stream lengths.
pub fn parse_value<'a>(
    input: &'a [u8],
    depth: usize,
    lengths: LengthResolver<'_>,
) -> IResult<&'a [u8], Object> {
    if depth == 0 {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TooLarge,
        )));
    }
    let (rest, tok) = token(input)?;

    match tok {
        Token::Null => Ok((rest, Object::Null)),
        Token::True => Ok((rest, Object::Boolean(true))),
        Token::False => Ok((rest, Object::Boolean(false))),
        Token::Real(r) => Ok((rest, Object::Real(r))),
        Token::Name(n) => Ok((rest, Object::Name(n))),
        Token::LiteralString(raw) => Ok((rest, Object::String(decode_literal_string_escapes(raw)))),
        Token::HexString(raw) => {
            let bytes = decode_hex(raw).map_err(|_| fail(input, nom::error::ErrorKind::HexDigit))?;
            Ok((rest, Object::String(bytes)))
        },
        Token::Integer(i) => {
            if let Ok((after_gen, Token::Integer(gen))) = token(rest) {
                if let Ok((after_r, Token::R)) = token(after_gen) {
                    if (0..=u32::MAX as i64).contains(&i) && (0..=u16::MAX as i64).contains(&gen) {
                        return Ok((after_r, Object::Reference(ObjectRef::new(i as u32, gen as u16))));
                    }
                }
            }
            Ok((rest, Object::Integer(i)))
        },
        Token::ArrayStart => parse_array(rest, depth, lengths),
        Token::DictStart => {
            let (rest, dict) = parse_dict_body(rest, depth, lengths)?;
            match token(rest) {
                Ok((body, Token::StreamStart)) => {
                    let (rest, data) = parse_stream_data(body, &dict, lengths)?;
                    Ok((rest, Object::Stream { dict, data: data.into() }))
                },
                _ => Ok((rest, Object::Dictionary(dict))),
            }
        },
        _ => Err(fail(input, nom::error::ErrorKind::Tag)),
    }
}

fn parse_array<'a>(
    mut input: &'a [u8],
    depth: usize,
    lengths: LengthResolver<'_>,
) -> IResult<&'a [u8], Object> {
    let mut items = Vec::new();
    loop {
        if let Ok((rest, Token::ArrayEnd)) = token(input) {
            return Ok((rest, Object::Array(items)));
        }
        let (rest, item) = parse_value(input, depth - 1, lengths)?;
        items.push(item);
        input = rest;
    }
}

fn parse_dict_body<'a>(
    mut input: &'a [u8],
    depth: usize,
    lengths: LengthResolver<'_>,
) -> IResult<&'a [u8], Dict> {
    let mut dict = Dict::new();
    loop {
        let (rest, tok) = token(input)?;
        match tok {
            Token::DictEnd => return Ok((rest, dict)),
            Token::Name(key) => {
                let (rest, value) = parse_value(rest, depth - 1, lengths)?;
                // A null value is equivalent to the key being absent.
                if !value.is_null() {
                    dict.insert(key, value);
                }
                input = rest;
            },
            _ => return Err(fail(input, nom::error::ErrorKind::Tag)),
        }
    }
}

/// Read a stream body that follows the `stream` keyword.
///
/// Uses `/Length` when it is direct or resolvable and is followed by
/// `endstream`; otherwise scans forward for `endstream`.
fn parse_stream_data<'a>(
    input: &'a [u8],
    dict: &Dict,
    lengths: LengthResolver<'_>,
) -> IResult<&'a [u8], Vec<u8>> {
    let body = if let Some(rest) = input.strip_prefix(b"\r\n") {
        rest
    } else if let Some(rest) = input.strip_prefix(b"\n") {
        rest
    } else if let Some(rest) = input.strip_prefix(b"\r") {
        log::warn!("stream keyword followed by bare CR");
        rest
    } else {
        input
    };

    let declared = match dict.get("Length") {
        Some(Object::Integer(n)) if *n >= 0 => Some(*n as usize),
        Some(Object::Reference(r)) => lengths(*r),
        _ => None,
    };

    if let Some(len) = declared {
        if len <= body.len() {
            if let Ok((rest, Token::StreamEnd)) = token(&body[len..]) {
                return Ok((rest, body[..len].to_vec()));
            }
        }
        log::warn!("stream /Length {} does not match endstream, scanning", len);
    }

    let pos = find_endstream(body).ok_or_else(|| fail(input, nom::error::ErrorKind::Eof))?;
    let mut data = &body[..pos];
    // Drop the EOL that precedes endstream.
    if data.ends_with(b"\r\n") {
        data = &data[..data.len() - 2];
    } else if data.ends_with(b"\n") || data.ends_with(b"\r") {
        data = &data[..data.len() - 1];
    }
    Ok((&body[pos + b"endstream".len()..], data.to_vec()))
}

fn find_endstream(input: &[u8]) -> Option<usize> {
    let keyword = b"endstream";
    input.windows(keyword.len()).position(|w| w == keyword)
}

/// Parse `N G obj <value> endobj`.
///
/// A missing `endobj` is tolerated; the next `N G obj` header or EOF ends
/// the object.
pub fn parse_indirect_object<'a>(
    input: &'a [u8],
    max_nesting: usize,
    lengths: LengthResolver<'_>,
) -> IResult<&'a [u8], (ObjectRef, Object)> {
    let (rest, id) = match token(input)? {
        (rest, Token::Integer(n)) if n >= 0 && n <= u32::MAX as i64 => (rest, n as u32),
        _ => return Err(fail(input, nom::error::ErrorKind::Digit)),
    };
    let (rest, gen) = match token(rest)? {
        (rest, Token::Integer(g)) if (0..=u16::MAX as i64).contains(&g) => (rest, g as u16),
        _ => return Err(fail(rest, nom::error::ErrorKind::Digit)),
    };
    let rest = match token(rest)? {
        (rest, Token::ObjStart) => rest,
        _ => return Err(fail(rest, nom::error::ErrorKind::Tag)),
    };

    // "N G obj endobj" is an empty object, treated as null.
    if let Ok((after, Token::ObjEnd)) = token(rest) {
        return Ok((after, (ObjectRef::new(id, gen), Object::Null)));
    }

    let (rest, value) = parse_value(rest, max_nesting, lengths)?;
    let rest = match token(rest) {
        Ok((after, Token::ObjEnd)) => after,
        _ => {
            log::debug!("object {} {} has no endobj", id, gen);
            skip_ws(rest)
        },
    };
    Ok((rest, (ObjectRef::new(id, gen), value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(input: &[u8]) -> Object {
        parse_object(input).unwrap().1
    }

    #[test]
    fn test_scalars() {
        assert_eq!(obj(b"null"), Object::Null);
        assert_eq!(obj(b"true"), Object::Boolean(true));
        assert_eq!(obj(b"42"), Object::Integer(42));
        assert_eq!(obj(b"-1.5"), Object::Real(-1.5));
        assert_eq!(obj(b"/Name"), Object::Name("Name".to_string()));
        assert_eq!(obj(b"<48656C6C6F>"), Object::String(b"Hello".to_vec()));
    }

    #[test]
    fn test_literal_escapes() {
        assert_eq!(decode_literal_string_escapes(br"a\nb"), b"a\nb");
        assert_eq!(decode_literal_string_escapes(br"\(x\)"), b"(x)");
        assert_eq!(decode_literal_string_escapes(br"\247"), vec![0xA7]);
        assert_eq!(decode_literal_string_escapes(br"\0053"), vec![0x05, b'3']);
        assert_eq!(decode_literal_string_escapes(b"ab\\\ncd"), b"abcd");
        assert_eq!(decode_literal_string_escapes(br"\q"), b"q");
    }

    #[test]
    fn test_reference_lookahead() {
        assert_eq!(obj(b"12 0 R"), Object::Reference(ObjectRef::new(12, 0)));
        let arr = obj(b"[1 2 3 0 R 4]");
        assert_eq!(
            arr,
            Object::Array(vec![
                Object::Integer(1),
                Object::Integer(2),
                Object::Reference(ObjectRef::new(3, 0)),
                Object::Integer(4),
            ])
        );
    }

    #[test]
    fn test_dictionary_and_null_values() {
        let d = obj(b"<< /Type /Page /Rotate 90 /Gone null /Kids [1 0 R] >>");
        let dict = d.as_dict().unwrap();
        assert_eq!(dict["Type"].as_name(), Some("Page"));
        assert_eq!(dict["Rotate"].as_integer(), Some(90));
        assert!(!dict.contains_key("Gone"));
    }

    #[test]
    fn test_stream_with_length() {
        let input = b"<< /Length 5 >>\nstream\nHelloendstream";
        let s = obj(input);
        match s {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"Hello"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_with_wrong_length_falls_back() {
        let input = b"<< /Length 99 >>\r\nstream\r\nabc\r\nendstream";
        match obj(input) {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"abc"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_with_indirect_length() {
        let input = b"<< /Length 9 0 R >>\nstream\nab\nendstreamXX\nendstream";
        let resolver = |r: ObjectRef| if r.id == 9 { Some(14) } else { None };
        let (_, o) = parse_value(input, 16, &resolver).unwrap();
        match o {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"ab\nendstreamXX"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_indirect_object() {
        let input = b"7 0 obj\n<< /A 1 >>\nendobj\n8 0 obj";
        let (rest, (r, o)) = parse_indirect_object(input, 16, &|_| None).unwrap();
        assert_eq!(r, ObjectRef::new(7, 0));
        assert_eq!(o.as_dict().unwrap()["A"], Object::Integer(1));
        assert!(rest.starts_with(b"\n8 0 obj") || rest.starts_with(b"8 0 obj"));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = b"[[[[[[1]]]]]]";
        assert!(parse_value(deep, 3, &|_| None).is_err());
        assert!(parse_value(deep, 10, &|_| None).is_ok());
    }

    #[test]
    fn test_error_offset() {
        let buf = b"<< /A ) >>";
        let err = parse_object(buf).unwrap_err();
        match to_error(buf.len(), err, "object") {
            Error::MalformedDocument { offset, .. } => assert!(offset <= buf.len()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
