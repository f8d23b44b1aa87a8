//! PDF object serialization.
//!
//! Output is deterministic: dictionary keys are written in sorted order and
//! reals use at most five decimals with trailing zeros trimmed.

use crate::object::{Dict, Object, ObjectRef};

/// Serializer for PDF objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer {
    /// Put each dictionary entry on its own line.
    pretty: bool,
}

impl ObjectSerializer {
    /// Compact serializer (single-line dictionaries).
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializer that breaks dictionaries across lines.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj);
        buf
    }

    /// Serialize an indirect object definition:
    /// `{id} {gen} obj\n{object}\nendobj\n`.
    pub fn serialize_indirect(&self, r: ObjectRef, obj: &Object) -> Vec<u8> {
        let mut buf = format!("{} {} obj\n", r.id, r.gen).into_bytes();
        self.write_object(&mut buf, obj);
        buf.extend_from_slice(b"\nendobj\n");
        buf
    }

    /// Append `obj` to `buf`.
    pub fn write_object(&self, buf: &mut Vec<u8>, obj: &Object) {
        match obj {
            Object::Null => buf.extend_from_slice(b"null"),
            Object::Boolean(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => buf.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => write_real(buf, *r),
            Object::String(s) => write_string(buf, s),
            Object::Name(n) => write_name(buf, n),
            Object::Array(arr) => {
                buf.push(b'[');
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    self.write_object(buf, item);
                }
                buf.push(b']');
            },
            Object::Dictionary(dict) => self.write_dictionary(buf, dict),
            Object::Stream { dict, data } => {
                let mut dict = dict.clone();
                dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
                self.write_dictionary(buf, &dict);
                buf.extend_from_slice(b"\nstream\n");
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\nendstream");
            },
            Object::Reference(r) => buf.extend_from_slice(format!("{} {} R", r.id, r.gen).as_bytes()),
        }
    }

    fn write_dictionary(&self, buf: &mut Vec<u8>, dict: &Dict) {
        let mut keys: Vec<&String> = dict.keys().collect();
        keys.sort();

        buf.extend_from_slice(b"<<");
        for key in keys {
            buf.extend_from_slice(if self.pretty { b"\n  " } else { b" " });
            write_name(buf, key);
            buf.push(b' ');
            self.write_object(buf, &dict[key]);
        }
        buf.extend_from_slice(if self.pretty && !dict.is_empty() { b"\n>>" } else { b" >>" });
    }
}

/// Reals: whole values print as integers, others with up to five decimals.
pub fn write_real(buf: &mut Vec<u8>, value: f64) {
    let value = if value.is_finite() { value } else { 0.0 };
    if value.fract() == 0.0 && value.abs() < 1e15 {
        buf.extend_from_slice((value as i64).to_string().as_bytes());
        return;
    }
    let formatted = format!("{:.5}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    let trimmed = match trimmed {
        "-0" | "" => "0",
        t => t,
    };
    buf.extend_from_slice(trimmed.as_bytes());
}

/// Literal syntax for printable text, hex syntax for anything else.
pub fn write_string(buf: &mut Vec<u8>, data: &[u8]) {
    let printable = data
        .iter()
        .all(|&b| matches!(b, b'\n' | b'\r' | b'\t') || (0x20..=0x7E).contains(&b));

    if printable {
        buf.push(b'(');
        for &byte in data {
            match byte {
                b'(' => buf.extend_from_slice(b"\\("),
                b')' => buf.extend_from_slice(b"\\)"),
                b'\\' => buf.extend_from_slice(b"\\\\"),
                b'\n' => buf.extend_from_slice(b"\\n"),
                b'\r' => buf.extend_from_slice(b"\\r"),
                b'\t' => buf.extend_from_slice(b"\\t"),
                _ => buf.push(byte),
            }
        }
        buf.push(b')');
    } else {
        buf.push(b'<');
        for byte in data {
            buf.extend_from_slice(format!("{:02X}", byte).as_bytes());
        }
        buf.push(b'>');
    }
}

/// Names escape `#`, delimiters, whitespace and non-printable bytes as `#XX`.
///
/// Characters up to U+00FF stand for a single byte (the lexer decodes names
/// that way); anything above is written as its UTF-8 bytes.
pub fn write_name(buf: &mut Vec<u8>, name: &str) {
    buf.push(b'/');
    let mut utf8 = [0u8; 4];
    for ch in name.chars() {
        let bytes: &[u8] = if (ch as u32) <= 0xFF {
            utf8[0] = ch as u32 as u8;
            &utf8[..1]
        } else {
            ch.encode_utf8(&mut utf8).as_bytes()
        };
        for &b in bytes {
            let plain = (0x21..=0x7E).contains(&b)
                && !matches!(b, b'#' | b'/' | b'%' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}');
            if plain {
                buf.push(b);
            } else {
                buf.extend_from_slice(format!("#{:02X}", b).as_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_object;

    fn ser(obj: &Object) -> String {
        String::from_utf8(ObjectSerializer::new().serialize(obj)).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(ser(&Object::Null), "null");
        assert_eq!(ser(&Object::Boolean(false)), "false");
        assert_eq!(ser(&Object::Integer(-3)), "-3");
        assert_eq!(ser(&Object::Real(2.0)), "2");
        assert_eq!(ser(&Object::Real(0.125)), "0.125");
        assert_eq!(ser(&Object::Real(1.0 / 3.0)), "0.33333");
        assert_eq!(ser(&Object::Real(-0.000001)), "0");
        assert_eq!(ser(&Object::Real(f64::NAN)), "0");
    }

    #[test]
    fn test_strings() {
        assert_eq!(ser(&Object::text("a(b)c\\")), "(a\\(b\\)c\\\\)");
        assert_eq!(ser(&Object::String(vec![0x00, 0xFF])), "<00FF>");
    }

    #[test]
    fn test_names() {
        assert_eq!(ser(&Object::name("Type")), "/Type");
        assert_eq!(ser(&Object::name("A B")), "/A#20B");
        assert_eq!(ser(&Object::name("x#y")), "/x#23y");
        assert_eq!(ser(&Object::Name("\u{e9}".to_string())), "/#E9");
    }

    #[test]
    fn test_dictionary_is_sorted() {
        let d = Object::dict(vec![
            ("Zeta", Object::Integer(1)),
            ("Alpha", Object::Reference(ObjectRef::new(4, 0))),
        ]);
        assert_eq!(ser(&d), "<< /Alpha 4 0 R /Zeta 1 >>");
        assert_eq!(ser(&Object::dict(vec![])), "<< >>");
    }

    #[test]
    fn test_stream_gets_length() {
        let s = Object::stream(Default::default(), b"abc".to_vec());
        assert_eq!(ser(&s), "<< /Length 3 >>\nstream\nabc\nendstream");
    }

    #[test]
    fn test_indirect() {
        let out = ObjectSerializer::new().serialize_indirect(ObjectRef::new(3, 0), &Object::Integer(7));
        assert_eq!(out, b"3 0 obj\n7\nendobj\n");
    }

    #[test]
    fn test_reparse_matches() {
        let original = Object::dict(vec![
            ("Name", Object::Name("we#ird (name)".to_string())),
            ("Str", Object::String(b"line\nbreak \\ (x)".to_vec())),
            ("Bin", Object::String(vec![1, 2, 250])),
            ("Arr", Object::Array(vec![Object::Real(1.5), Object::Null, Object::Boolean(true)])),
        ]);
        let bytes = ObjectSerializer::pretty().serialize(&original);
        let (_, parsed) = parse_object(&bytes).unwrap();
        // Null array members survive; null dictionary values would not.
        assert_eq!(parsed, original);
    }
}
