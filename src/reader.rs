//! Turning PDF bytes into a [`PdfDocument`].
//!
//! Loading happens in a fixed order: header, cross-reference chain (or a
//! scan-based reconstruction), every in-use object, decryption, expansion of
//! object streams, then a structural check of the catalog and page tree.
//! The loaded bytes and graph are kept as the baseline for incremental
//! saves.

use crate::document::{Baseline, EncryptionState, PdfDocument};
use crate::encryption::{EncryptionInfo, SecurityHandler};
use crate::error::{Error, Result};
use crate::graph::ObjectGraph;
use crate::object::{Object, ObjectRef};
use crate::objstm::parse_object_stream;
use crate::page::collect_pages;
use crate::parser::{parse_indirect_object, to_error};
use crate::parser_config::ParserOptions;
use crate::xref::{find_startxref, parse_xref_chain, CrossRefTable, XRefEntry};
use crate::xref_reconstruction::reconstruct_xref;
use std::collections::BTreeMap;
use std::path::Path;

/// How far into the file a lenient reader looks for `%PDF-`.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Trailer keys that only describe the cross-reference section they came
/// from.
const SECTION_KEYS: [&str; 8] = ["Prev", "XRefStm", "Type", "W", "Index", "Filter", "DecodeParms", "Length"];

/// Parse a document with default options.
///
/// Encrypted documents are tried with the empty user password. If that
/// does not authenticate, the document still loads for its structure but
/// strings and streams stay encrypted until it is unlocked.
pub fn parse(data: &[u8]) -> Result<PdfDocument> {
    parse_with_options(data, None, &ParserOptions::default())
}

/// Parse a document, authenticating with `password`.
///
/// Fails with [`Error::Authentication`] when the document is encrypted and
/// the password matches neither the user nor the owner password.
pub fn parse_with_password(data: &[u8], password: &str) -> Result<PdfDocument> {
    parse_with_options(data, Some(password.as_bytes()), &ParserOptions::default())
}

/// Read and parse a file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<PdfDocument> {
    let data = std::fs::read(path.as_ref())?;
    log::debug!("read {} bytes from {}", data.len(), path.as_ref().display());
    parse(&data)
}

/// Parse with explicit options and an optional password.
pub fn parse_with_options(data: &[u8], password: Option<&[u8]>, options: &ParserOptions) -> Result<PdfDocument> {
    let header_at = find_header(data, options.strict)?;
    let version = header_version(&data[header_at..]);

    let (table, xref_offset) = match find_startxref(data)
        .and_then(|off| parse_xref_chain(data, off, options.max_xref_chain).map(|t| (t, off)))
    {
        Ok((table, off)) => (table, Some(off)),
        Err(e) if options.strict => return Err(e),
        Err(e) => {
            log::warn!("cross-reference data unusable ({}), scanning file", e);
            (reconstruct_xref(data)?, None)
        },
    };

    let loaded = match load(data, &table, password, options) {
        Ok(loaded) => (loaded, xref_offset),
        // Offsets in a stale xref can point at garbage even though the
        // objects themselves are intact.
        Err(e) if !options.strict && xref_offset.is_some() && recoverable(&e) => {
            log::warn!("document unreadable through its xref ({}), scanning file", e);
            (load(data, &reconstruct_xref(data)?, password, options)?, None)
        },
        Err(e) => return Err(e),
    };
    let ((graph, encryption, handler), xref_offset) = loaded;

    let version = catalog_version(&graph)
        .filter(|v| version_number(v) > version_number(&version))
        .unwrap_or(version);

    log::info!(
        "parsed PDF {} with {} objects{}",
        version,
        graph.len(),
        match (&encryption, &handler) {
            (EncryptionState::Plain, _) => String::new(),
            (EncryptionState::Encrypted(info), Some(_)) => format!(", {} decrypted", info.algorithm),
            (EncryptionState::Encrypted(info), None) => format!(", {} locked", info.algorithm),
        }
    );

    let baseline = Baseline {
        bytes: bytes::Bytes::copy_from_slice(data),
        graph: graph.clone(),
        xref_offset,
    };
    Ok(PdfDocument::from_parts(graph, version, encryption, handler, Some(baseline)))
}

fn recoverable(e: &Error) -> bool {
    matches!(
        e,
        Error::MalformedDocument { .. } | Error::DanglingReference(_) | Error::InvalidObjectType { .. }
    )
}

type Loaded = (ObjectGraph, EncryptionState, Option<SecurityHandler>);

fn load(data: &[u8], table: &CrossRefTable, password: Option<&[u8]>, options: &ParserOptions) -> Result<Loaded> {
    let mut graph = read_objects(data, table, options)?;

    let mut trailer = table.trailer().clone();
    for key in SECTION_KEYS {
        trailer.remove(key);
    }
    *graph.trailer_mut() = trailer;
    if let Some(size) = graph.trailer().get("Size").and_then(|s| s.as_integer()) {
        if size > 0 {
            graph.reserve_through(size.min(u32::MAX as i64) as u32 - 1);
        }
    }

    let (encryption, handler) = decrypt(&mut graph, password, options)?;
    expand_object_streams(&mut graph, table, handler.is_some() || matches!(encryption, EncryptionState::Plain), options)?;

    let root = graph.root_ref()?;
    let pages = graph
        .resolve(root)?
        .expect_dict()?
        .get("Pages")
        .and_then(|p| p.as_reference())
        .ok_or_else(|| Error::malformed(0, "catalog has no /Pages reference"))?;
    collect_pages(&graph, pages)?;
    if options.strict {
        graph.validate()?;
    }
    Ok((graph, encryption, handler))
}

/// Parse every object the table marks as stored directly in the file.
fn read_objects(data: &[u8], table: &CrossRefTable, options: &ParserOptions) -> Result<ObjectGraph> {
    let lengths = |r: ObjectRef| -> Option<usize> {
        match table.get(r.id)? {
            XRefEntry::InUse { offset, .. } => {
                let no_lengths = |_: ObjectRef| None;
                let (_, (found, obj)) =
                    parse_indirect_object(data.get(*offset..)?, options.max_nesting, &no_lengths).ok()?;
                if found.id != r.id {
                    return None;
                }
                obj.as_integer().filter(|&n| n >= 0).map(|n| n as usize)
            },
            _ => None,
        }
    };

    let mut graph = ObjectGraph::new();
    for (number, entry) in table.iter() {
        let XRefEntry::InUse { offset, gen } = *entry else {
            continue;
        };
        if number == 0 {
            continue;
        }
        let parsed = match data.get(offset..) {
            Some(input) => parse_indirect_object(input, options.max_nesting, &lengths)
                .map_err(|e| to_error(data.len(), e, "indirect object")),
            None => Err(Error::malformed(offset, "object offset past end of file")),
        };
        match parsed {
            Ok((_, (r, obj))) if r.id == number => {
                if r.gen != gen {
                    log::debug!("object {} has generation {} but xref says {}", number, r.gen, gen);
                }
                graph.insert(r, obj);
            },
            Ok((_, (r, _))) => {
                let reason = format!("xref entry for object {} points at object {}", number, r.id);
                if options.strict {
                    return Err(Error::malformed(offset, reason));
                }
                log::warn!("{}", reason);
            },
            Err(e) if options.strict => return Err(e),
            Err(e) => log::warn!("skipping object {}: {}", number, e),
        }
    }
    log::debug!("read {} objects", graph.len());
    Ok(graph)
}

/// Authenticate against `/Encrypt` and decrypt the graph in place when the
/// password is right.
fn decrypt(
    graph: &mut ObjectGraph,
    password: Option<&[u8]>,
    options: &ParserOptions,
) -> Result<(EncryptionState, Option<SecurityHandler>)> {
    let Some(encrypt) = graph.trailer().get("Encrypt").cloned() else {
        return Ok((EncryptionState::Plain, None));
    };
    let encrypt_ref = encrypt.as_reference();
    let file_id = graph
        .trailer()
        .get("ID")
        .and_then(|id| id.as_array())
        .and_then(|a| a.first())
        .and_then(|s| s.as_string())
        .map(|s| s.to_vec())
        .unwrap_or_default();
    let info = EncryptionInfo::from_dict(graph.deref_dict(&encrypt)?, &file_id)?;

    let handler = match password {
        Some(pw) => Some(info.authenticate(pw).ok_or(Error::Authentication)?),
        None => info.authenticate(b""),
    };
    let Some(handler) = handler else {
        log::info!("{} encrypted document opened without a password", info.algorithm);
        return Ok((EncryptionState::Encrypted(info), None));
    };

    let refs: Vec<ObjectRef> = graph.iter().map(|(r, _)| r).collect();
    for r in refs {
        if Some(r) == encrypt_ref {
            continue;
        }
        let obj = graph.resolve_mut(r)?;
        if !info.covers(obj) {
            continue;
        }
        match handler.decrypt_object(r, obj) {
            Ok(()) => {},
            Err(e) if options.strict => return Err(e),
            Err(e) => log::warn!("could not decrypt {}: {}", r, e),
        }
    }
    Ok((EncryptionState::Encrypted(info), Some(handler)))
}

/// Move objects out of `/ObjStm` containers, then drop the containers and
/// any cross-reference streams.
fn expand_object_streams(
    graph: &mut ObjectGraph,
    table: &CrossRefTable,
    readable: bool,
    options: &ParserOptions,
) -> Result<()> {
    let mut by_stream: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (number, entry) in table.iter() {
        if let XRefEntry::Compressed { stream, .. } = entry {
            by_stream.entry(*stream).or_default().push(number);
        }
    }
    if !by_stream.is_empty() && !readable {
        // Object streams are encrypted as a whole, so without the key
        // the objects inside cannot be reached.
        return Err(Error::Authentication);
    }

    for (stream, members) in &by_stream {
        let expanded = graph
            .resolve(ObjectRef::new(*stream, 0))
            .and_then(|obj| {
                let decoded = obj.decode_stream_data_with_limit(options.max_decompressed_size)?;
                parse_object_stream(obj.expect_dict()?, &decoded, options.max_nesting)
            });
        let objects = match expanded {
            Ok(objects) => objects,
            Err(e) if options.strict => return Err(e),
            Err(e) => {
                log::warn!("skipping object stream {}: {}", stream, e);
                continue;
            },
        };
        for (number, obj) in objects {
            // The xref decides which copy of an object is current.
            if members.contains(&number) {
                graph.insert(ObjectRef::new(number, 0), obj);
            }
        }
    }

    let containers: Vec<ObjectRef> = graph
        .iter()
        .filter(|(_, obj)| {
            matches!(
                obj,
                Object::Stream { dict, .. }
                    if matches!(dict.get("Type").and_then(|t| t.as_name()), Some("ObjStm") | Some("XRef"))
            )
        })
        .map(|(r, _)| r)
        .collect();
    for r in &containers {
        graph.remove(*r);
    }
    if !containers.is_empty() {
        log::debug!("expanded {} object streams", containers.len());
    }
    Ok(())
}

fn find_header(data: &[u8], strict: bool) -> Result<usize> {
    if data.starts_with(b"%PDF-") {
        return Ok(0);
    }
    if !strict {
        let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
        if let Some(pos) = window.windows(5).position(|w| w == b"%PDF-") {
            log::warn!("{} bytes of junk before %PDF- header", pos);
            return Ok(pos);
        }
    }
    Err(Error::malformed(0, "missing %PDF- header"))
}

fn header_version(header: &[u8]) -> String {
    let version: String = header[5..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|&b| b as char)
        .collect();
    if version.is_empty() {
        log::warn!("header carries no version number, assuming 1.4");
        "1.4".to_string()
    } else {
        version
    }
}

/// `/Version` in the catalog overrides the header when it is later.
fn catalog_version(graph: &ObjectGraph) -> Option<String> {
    let root = graph.root_ref().ok()?;
    let catalog = graph.get(root)?.as_dict()?;
    catalog.get("Version")?.as_name().map(str::to_string)
}

fn version_number(v: &str) -> f64 {
    v.parse().unwrap_or(0.0)
}
