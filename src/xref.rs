//! Cross-reference table parsing.
//!
//! Handles classic `xref` tables with their `trailer` dictionaries,
//! cross-reference streams (`/Type /XRef`), hybrid files that point at a
//! stream through `/XRefStm`, and `/Prev` chains left behind by incremental
//! updates. Sections are read newest first; an object number already seen in
//! a newer section is never overwritten by an older one.

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::{Dict, Object};
use crate::parser::{parse_indirect_object, parse_value, to_error};
use byteorder::{BigEndian, ByteOrder};
use std::collections::{BTreeMap, HashSet};

/// One cross-reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Free (deleted) object
    Free {
        /// Next free object number
        next: u32,
        /// Generation to use if the number is reused
        gen: u16,
    },
    /// Object stored directly in the file
    InUse {
        /// Byte offset of `N G obj`
        offset: usize,
        /// Generation number
        gen: u16,
    },
    /// Object stored inside an object stream
    Compressed {
        /// Object number of the containing `/ObjStm`
        stream: u32,
        /// Index within the stream
        index: u32,
    },
}

impl XRefEntry {
    /// Whether the entry refers to a live object.
    pub fn is_in_use(&self) -> bool {
        !matches!(self, XRefEntry::Free { .. })
    }
}

/// Cross-reference table: object number to entry, plus the trailer.
#[derive(Debug, Clone, Default)]
pub struct CrossRefTable {
    entries: BTreeMap<u32, XRefEntry>,
    trailer: Dict,
}

impl CrossRefTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trailer dictionary of the newest section.
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// Replace the trailer.
    pub fn set_trailer(&mut self, trailer: Dict) {
        self.trailer = trailer;
    }

    /// Insert or replace an entry.
    pub fn add_entry(&mut self, object_number: u32, entry: XRefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// Look up an entry.
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// Entries in ascending object-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &XRefEntry)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold in an older section: existing entries win. The trailer is only
    /// taken if this table has none yet; `/Root`, `/Info`, `/Encrypt` and
    /// `/ID` missing from the newer trailer are inherited.
    pub fn merge_older(&mut self, older: CrossRefTable) {
        for (num, entry) in older.entries {
            self.entries.entry(num).or_insert(entry);
        }
        for key in ["Root", "Info", "Encrypt", "ID"] {
            if !self.trailer.contains_key(key) {
                if let Some(v) = older.trailer.get(key) {
                    self.trailer.insert(key.to_string(), v.clone());
                }
            }
        }
    }
}

/// Find the offset recorded after the last `startxref` in the final 2 KiB.
pub fn find_startxref(data: &[u8]) -> Result<usize> {
    let tail_start = data.len().saturating_sub(2048);
    let tail = &data[tail_start..];
    let keyword = b"startxref";
    let pos = tail
        .windows(keyword.len())
        .rposition(|w| w == keyword)
        .ok_or_else(|| Error::malformed(data.len(), "startxref not found"))?;

    let after = tail_start + pos + keyword.len();
    match token(&data[after..]) {
        Ok((_, Token::Integer(n))) if n >= 0 && (n as usize) < data.len() => Ok(n as usize),
        _ => Err(Error::malformed(after, "startxref offset is not a valid position")),
    }
}

/// Read the full cross-reference chain starting at `offset`.
pub fn parse_xref_chain(data: &[u8], offset: usize, max_chain: usize) -> Result<CrossRefTable> {
    let mut table = CrossRefTable::new();
    let mut visited = HashSet::new();
    let mut next = Some(offset);

    while let Some(off) = next.take() {
        if !visited.insert(off) {
            log::warn!("xref /Prev loop at offset {}", off);
            break;
        }
        if visited.len() > max_chain {
            return Err(Error::malformed(off, "xref /Prev chain too long"));
        }

        let section = parse_xref_section(data, off)?;
        log::debug!("xref section at {}: {} entries", off, section.len());
        next = section
            .trailer()
            .get("Prev")
            .and_then(|p| p.as_integer())
            .filter(|&p| p >= 0)
            .map(|p| p as usize);

        // Hybrid file: the companion stream has priority over the table it
        // belongs to, but not over newer sections.
        let hybrid = section
            .trailer()
            .get("XRefStm")
            .and_then(|p| p.as_integer())
            .filter(|&p| p >= 0)
            .map(|p| p as usize);

        let mut section = section;
        if let Some(stm_off) = hybrid {
            match parse_xref_stream(data, stm_off) {
                Ok(stm) => {
                    let mut combined = CrossRefTable::new();
                    combined.trailer = section.trailer.clone();
                    combined.entries = stm.entries;
                    combined.merge_older(section);
                    section = combined;
                },
                Err(e) => log::warn!("ignoring unreadable /XRefStm at {}: {}", stm_off, e),
            }
        }

        if table.is_empty() && table.trailer.is_empty() {
            table = section;
        } else {
            table.merge_older(section);
        }
    }

    if !table.trailer.contains_key("Root") {
        return Err(Error::malformed(offset, "trailer has no /Root"));
    }
    Ok(table)
}

/// Parse a single section, classic or stream, at `offset`.
pub fn parse_xref_section(data: &[u8], offset: usize) -> Result<CrossRefTable> {
    if offset >= data.len() {
        return Err(Error::malformed(offset, "xref offset past end of file"));
    }
    match token(&data[offset..]) {
        Ok((_, Token::Keyword(b"xref"))) => parse_classic_xref(data, offset),
        Ok((_, Token::Integer(_))) => parse_xref_stream(data, offset),
        _ => Err(Error::malformed(offset, "expected xref table or xref stream")),
    }
}

fn expect_int(data: &[u8], input: &[u8]) -> Result<(i64, usize)> {
    match token(input) {
        Ok((rest, Token::Integer(n))) => Ok((n, input.len() - rest.len())),
        _ => Err(Error::malformed(data.len() - input.len(), "expected integer in xref table")),
    }
}

fn parse_classic_xref(data: &[u8], offset: usize) -> Result<CrossRefTable> {
    let mut table = CrossRefTable::new();
    let (mut input, _) = token(&data[offset..]).map_err(|e| to_error(data.len(), e, "xref"))?;

    loop {
        match token(input) {
            Ok((rest, Token::Keyword(b"trailer"))) => {
                let (_, trailer) =
                    parse_value(rest, 64, &|_| None).map_err(|e| to_error(data.len(), e, "trailer"))?;
                match trailer {
                    Object::Dictionary(d) => table.trailer = d,
                    other => return Err(Error::wrong_type("Dictionary", other.type_name())),
                }
                return Ok(table);
            },
            Ok((_, Token::Integer(_))) => {},
            _ => return Err(Error::malformed(data.len() - input.len(), "expected xref subsection or trailer")),
        }

        let (start, used) = expect_int(data, input)?;
        input = &input[used..];
        let (count, used) = expect_int(data, input)?;
        input = &input[used..];
        if start < 0 || count < 0 {
            return Err(Error::malformed(data.len() - input.len(), "negative xref subsection bounds"));
        }

        for i in 0..count as u32 {
            let (field1, used) = expect_int(data, input)?;
            input = &input[used..];
            let (field2, used) = expect_int(data, input)?;
            input = &input[used..];
            let (rest, kind) = token(input).map_err(|e| to_error(data.len(), e, "xref entry"))?;
            input = rest;

            let num = subsection_number(start, i, data.len() - input.len())?;
            let gen = field2.clamp(0, u16::MAX as i64) as u16;
            let entry = match kind {
                Token::Keyword(b"n") => XRefEntry::InUse {
                    offset: field1.max(0) as usize,
                    gen,
                },
                Token::Keyword(b"f") => XRefEntry::Free {
                    next: field1.max(0) as u32,
                    gen,
                },
                _ => {
                    return Err(Error::malformed(
                        data.len() - input.len(),
                        "xref entry type must be n or f",
                    ))
                },
            };
            // Within one section the first entry for a number counts.
            table.entries.entry(num).or_insert(entry);
        }
    }
}

/// Parse a `/Type /XRef` stream object at `offset`.
pub fn parse_xref_stream(data: &[u8], offset: usize) -> Result<CrossRefTable> {
    if offset >= data.len() {
        return Err(Error::malformed(offset, "xref stream offset past end of file"));
    }
    let (_, (_, obj)) = parse_indirect_object(&data[offset..], 64, &|_| None)
        .map_err(|e| to_error(data.len(), e, "xref stream"))?;
    let dict = obj.expect_dict()?.clone();
    if dict.get("Type").and_then(|t| t.as_name()) != Some("XRef") {
        return Err(Error::malformed(offset, "object at startxref is not an xref stream"));
    }

    let widths: Vec<usize> = dict
        .get("W")
        .and_then(|w| w.as_array())
        .ok_or_else(|| Error::malformed(offset, "xref stream missing /W"))?
        .iter()
        .map(|w| w.as_integer().unwrap_or(0).clamp(0, 8) as usize)
        .collect();
    if widths.len() != 3 {
        return Err(Error::malformed(offset, "xref stream /W must have three entries"));
    }
    let row_len: usize = widths.iter().sum();
    if row_len == 0 {
        return Err(Error::malformed(offset, "xref stream /W is all zero"));
    }

    let size = dict.get("Size").and_then(|s| s.as_integer()).unwrap_or(0).max(0);
    let index: Vec<i64> = match dict.get("Index").and_then(|i| i.as_array()) {
        Some(arr) => arr.iter().filter_map(|o| o.as_integer()).collect(),
        None => vec![0, size],
    };

    let decoded = obj.decode_stream_data()?;
    let mut rows = decoded.chunks_exact(row_len);
    let mut table = CrossRefTable::new();

    for pair in index.chunks_exact(2) {
        let (start, count) = (pair[0], pair[1].clamp(0, u32::MAX as i64) as u32);
        for i in 0..count {
            let Some(row) = rows.next() else {
                log::warn!("xref stream at {} shorter than its /Index", offset);
                break;
            };
            let f1 = &row[..widths[0]];
            let f2 = &row[widths[0]..widths[0] + widths[1]];
            let f3 = &row[widths[0] + widths[1]..];
            // Type defaults to 1 when its field width is zero.
            let kind = if widths[0] == 0 { 1 } else { read_be(f1) };
            let entry = match kind {
                0 => XRefEntry::Free {
                    next: read_be(f2) as u32,
                    gen: read_be(f3) as u16,
                },
                1 => XRefEntry::InUse {
                    offset: read_be(f2) as usize,
                    gen: read_be(f3) as u16,
                },
                2 => XRefEntry::Compressed {
                    stream: read_be(f2) as u32,
                    index: read_be(f3) as u32,
                },
                _ => continue,
            };
            table.entries.entry(subsection_number(start, i, offset)?).or_insert(entry);
        }
    }

    let mut trailer = dict;
    for key in ["Type", "W", "Index", "Filter", "DecodeParms", "Length"] {
        trailer.remove(key);
    }
    table.trailer = trailer;
    Ok(table)
}

/// Object number of entry `i` in a subsection starting at `start`.
fn subsection_number(start: i64, i: u32, offset: usize) -> Result<u32> {
    u32::try_from(start)
        .ok()
        .and_then(|s| s.checked_add(i))
        .ok_or_else(|| Error::malformed(offset, "xref subsection out of range"))
}

fn read_be(bytes: &[u8]) -> u64 {
    if bytes.is_empty() {
        0
    } else {
        BigEndian::read_uint(bytes, bytes.len())
    }
}
