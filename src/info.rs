//! The document information dictionary (`/Info`).

use crate::object::{Dict, Object};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

/// Document metadata from the trailer's `/Info` dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentInfo {
    /// `/Title`
    pub title: Option<String>,
    /// `/Author`
    pub author: Option<String>,
    /// `/Subject`
    pub subject: Option<String>,
    /// `/Keywords`
    pub keywords: Option<String>,
    /// `/Creator`
    pub creator: Option<String>,
    /// `/Producer`
    pub producer: Option<String>,
    /// `/CreationDate`
    pub creation_date: Option<DateTime<FixedOffset>>,
    /// `/ModDate`
    pub mod_date: Option<DateTime<FixedOffset>>,
}

impl DocumentInfo {
    /// Read the known keys from an info dictionary. Unreadable dates are
    /// skipped.
    pub fn from_dict(dict: &Dict) -> Self {
        let text = |key: &str| dict.get(key).and_then(|o| o.as_string()).map(decode_text_string);
        let date = |key: &str| {
            dict.get(key)
                .and_then(|o| o.as_string())
                .and_then(|s| parse_pdf_date(&decode_text_string(s)))
        };
        Self {
            title: text("Title"),
            author: text("Author"),
            subject: text("Subject"),
            keywords: text("Keywords"),
            creator: text("Creator"),
            producer: text("Producer"),
            creation_date: date("CreationDate"),
            mod_date: date("ModDate"),
        }
    }

    /// Write the set fields into `dict`, leaving other keys alone.
    pub fn apply_to(&self, dict: &mut Dict) {
        let texts = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ];
        for (key, value) in texts {
            if let Some(v) = value {
                dict.insert(key.to_string(), Object::String(encode_text_string(v)));
            }
        }
        for (key, value) in [("CreationDate", &self.creation_date), ("ModDate", &self.mod_date)] {
            if let Some(d) = value {
                dict.insert(key.to_string(), Object::String(format_pdf_date(d).into_bytes()));
            }
        }
    }

    /// Stamp `/ModDate` (and `/Producer` when unset).
    pub fn touch(&mut self, producer: &str) {
        self.mod_date = Some(DateTime::<FixedOffset>::from(Utc::now()));
        if self.producer.is_none() {
            self.producer = Some(producer.to_string());
        }
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, UTF-8 with a
/// BOM, or single-byte text.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode text as a PDF text string: single bytes when every character
/// fits in Latin-1, UTF-16BE with a BOM otherwise.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.chars().all(|c| (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32))) {
        return text.chars().map(|c| c as u32 as u8).collect();
    }
    let mut out = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Parse `D:YYYYMMDDHHmmSSOHH'mm'`. Every field after the year is optional.
///
/// ```
/// use pdf_graft::info::parse_pdf_date;
///
/// let d = parse_pdf_date("D:20240131120000+02'00'").unwrap();
/// assert_eq!(d.to_rfc3339(), "2024-01-31T12:00:00+02:00");
/// ```
pub fn parse_pdf_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let field = |start: usize, len: usize, default: u32| -> u32 {
        digits
            .get(start..start + len)
            .and_then(|f| f.parse().ok())
            .unwrap_or(default)
    };
    let year: i32 = digits[..4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4, 2, 1), field(6, 2, 1))?;
    let naive: NaiveDateTime = date.and_hms_opt(field(8, 2, 0), field(10, 2, 0), field(12, 2, 0))?;

    let tz = &s[digits.len()..];
    let offset_secs = match tz.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let nums: String = tz[1..].chars().filter(|c| c.is_ascii_digit()).collect();
            let hours: i32 = nums.get(..2).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i32 = nums.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            let secs = hours * 3600 + minutes * 60;
            if sign == '-' {
                -secs
            } else {
                secs
            }
        },
        _ => 0,
    };
    FixedOffset::east_opt(offset_secs)?
        .from_local_datetime(&naive)
        .single()
}

/// Format a date as `D:YYYYMMDDHHmmSS+HH'mm'` (or `Z` for UTC).
pub fn format_pdf_date(date: &DateTime<FixedOffset>) -> String {
    let offset = date.offset().local_minus_utc();
    let tz = if offset == 0 {
        "Z".to_string()
    } else {
        let sign = if offset < 0 { '-' } else { '+' };
        let abs = offset.abs();
        format!("{}{:02}'{:02}'", sign, abs / 3600, (abs % 3600) / 60)
    };
    format!("D:{}{}", date.format("%Y%m%d%H%M%S"), tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_roundtrip() {
        let d = parse_pdf_date("D:19991231235959-05'30'").unwrap();
        assert_eq!(format_pdf_date(&d), "D:19991231235959-05'30'");
        let utc = parse_pdf_date("D:2020Z").unwrap();
        assert_eq!(format_pdf_date(&utc), "D:20200101000000Z");
        assert!(parse_pdf_date("D:20").is_none());
        assert!(parse_pdf_date("D:20241399").is_none());
    }

    #[test]
    fn test_text_strings() {
        assert_eq!(encode_text_string("Report"), b"Report");
        let utf16 = encode_text_string("\u{65e5}\u{672c}");
        assert_eq!(&utf16[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text_string(&utf16), "\u{65e5}\u{672c}");
        assert_eq!(decode_text_string(&encode_text_string("caf\u{e9}")), "caf\u{e9}");
    }

    #[test]
    fn test_info_dict_roundtrip() {
        let info = DocumentInfo {
            title: Some("Minutes".into()),
            author: Some("Board".into()),
            creation_date: parse_pdf_date("D:20230405060708Z"),
            ..Default::default()
        };
        let mut dict = Dict::new();
        dict.insert("Custom".into(), Object::text("kept"));
        info.apply_to(&mut dict);
        assert!(dict.contains_key("Custom"));
        assert_eq!(DocumentInfo::from_dict(&dict), info);
    }
}
