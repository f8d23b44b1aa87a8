//! Cross-reference recovery for damaged files.
//!
//! When `startxref` or the table it points at cannot be read, the file is
//! scanned for `N G obj` headers instead. A later header for the same
//! object number wins, matching incremental-update semantics. The trailer is
//! taken from the last readable `trailer` dictionary with a `/Root`, or
//! synthesized from the first `/Type /Catalog` object found.

use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};
use crate::parser::{parse_indirect_object, parse_object};
use crate::xref::{CrossRefTable, XRefEntry};
use lazy_static::lazy_static;

lazy_static! {
    static ref RE_OBJ_HEADER: regex::bytes::Regex =
        regex::bytes::Regex::new(r"(\d{1,10})[ \t\r\n\x0C\x00]+(\d{1,5})[ \t\r\n\x0C\x00]+obj\b")
            .expect("static regex");
    static ref RE_TRAILER: regex::bytes::Regex =
        regex::bytes::Regex::new(r"trailer[ \t\r\n\x0C\x00]*<<").expect("static regex");
}

/// Rebuild a cross-reference table by scanning the whole file.
pub fn reconstruct_xref(data: &[u8]) -> Result<CrossRefTable> {
    log::warn!("reconstructing xref by scanning {} bytes", data.len());

    let mut table = CrossRefTable::new();
    for cap in RE_OBJ_HEADER.captures_iter(data) {
        let (Some(whole), Some(num), Some(gen)) = (cap.get(0), cap.get(1), cap.get(2)) else {
            continue;
        };
        // Reject matches glued to a preceding digit ("123 0 obj" inside "9123 0 obj").
        if whole.start() > 0 && data[whole.start() - 1].is_ascii_digit() {
            continue;
        }
        let parse = |m: regex::bytes::Match<'_>| {
            std::str::from_utf8(m.as_bytes())
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
        };
        let (Some(num), Some(gen)) = (parse(num), parse(gen)) else {
            continue;
        };
        if num > u32::MAX as u64 || gen > u16::MAX as u64 {
            continue;
        }
        table.add_entry(
            num as u32,
            XRefEntry::InUse {
                offset: whole.start(),
                gen: gen as u16,
            },
        );
    }

    if table.is_empty() {
        return Err(Error::malformed(0, "no objects found while reconstructing xref"));
    }
    log::info!("reconstructed xref with {} objects", table.len());

    let trailer = match find_trailer(data) {
        Some(t) => t,
        None => synthesize_trailer(data, &table)?,
    };
    table.set_trailer(trailer);
    Ok(table)
}

fn find_trailer(data: &[u8]) -> Option<Dict> {
    RE_TRAILER
        .find_iter(data)
        .filter_map(|m| {
            let start = m.start() + "trailer".len();
            match parse_object(&data[start..]) {
                Ok((_, Object::Dictionary(d))) if d.contains_key("Root") => Some(d),
                _ => None,
            }
        })
        .last()
}

fn synthesize_trailer(data: &[u8], table: &CrossRefTable) -> Result<Dict> {
    for (num, entry) in table.iter() {
        let XRefEntry::InUse { offset, gen } = *entry else {
            continue;
        };
        let Ok((_, (_, obj))) = parse_indirect_object(&data[offset..], 64, &|_| None) else {
            continue;
        };
        let is_catalog = obj
            .as_dict()
            .and_then(|d| d.get("Type"))
            .and_then(|t| t.as_name())
            == Some("Catalog");
        if is_catalog {
            log::info!("using object {} {} as catalog", num, gen);
            let mut trailer = Dict::new();
            trailer.insert("Root".to_string(), Object::Reference(ObjectRef::new(num, gen)));
            trailer.insert("Size".to_string(), Object::Integer(num as i64 + 1));
            return Ok(trailer);
        }
    }
    Err(Error::malformed(0, "no catalog found while reconstructing xref"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruct_with_trailer() {
        let data = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n2 0 obj\n(x)\nendobj\n\
trailer\n<< /Root 1 0 R /Size 3 >>\n%%EOF";
        let table = reconstruct_xref(data).unwrap();
        assert_eq!(table.get(1), Some(&XRefEntry::InUse { offset: 9, gen: 0 }));
        assert!(table.get(2).is_some());
        assert_eq!(
            table.trailer().get("Root"),
            Some(&Object::Reference(ObjectRef::new(1, 0)))
        );
    }

    #[test]
    fn test_reconstruct_without_trailer_finds_catalog() {
        let data = b"%PDF-1.4\n3 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n\
4 0 obj\n<< /Type /Catalog /Pages 3 0 R >>\nendobj\n";
        let table = reconstruct_xref(data).unwrap();
        assert_eq!(
            table.trailer().get("Root"),
            Some(&Object::Reference(ObjectRef::new(4, 0)))
        );
    }

    #[test]
    fn test_later_definition_wins() {
        let data = b"%PDF-1.4\n1 0 obj\n(old)\nendobj\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";
        let table = reconstruct_xref(data).unwrap();
        match table.get(1) {
            Some(XRefEntry::InUse { offset, .. }) => assert!(*offset > 20),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nothing_to_reconstruct() {
        assert!(reconstruct_xref(b"%PDF-1.4\ngarbage only").is_err());
    }
}
