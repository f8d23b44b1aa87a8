//! Full-rewrite PDF writer.
//!
//! Assembles a complete file from a document's graph: header, every object
//! in ascending number, a classic xref table, and the trailer.

use super::object_serializer::ObjectSerializer;
use super::SaveOptions;
use crate::decoders::encode_flate;
use crate::document::{EncryptionState, PdfDocument};
use crate::encryption::{EncryptionInfo, SecurityHandler};
use crate::error::Result;
use crate::object::{Dict, Object, ObjectRef};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::io::Write;

/// Streams shorter than this are left uncompressed.
const MIN_COMPRESS_LEN: usize = 64;

/// Writes a document as a fresh file.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: SaveOptions,
    serializer: ObjectSerializer,
}

impl PdfWriter {
    /// Writer with the given options. `incremental` is ignored.
    pub fn new(options: SaveOptions) -> Self {
        Self {
            options,
            serializer: ObjectSerializer::new(),
        }
    }

    /// Build the complete file.
    pub fn write(&self, doc: &PdfDocument) -> Result<Vec<u8>> {
        let graph = doc.graph();
        graph.resolve(graph.root_ref()?)?;
        let keep = self.options.garbage_collect.then(|| graph.reachable_from_root());
        let encoder = ObjectEncoder::new(doc, self.options.compress);

        let version = self.options.version.as_deref().unwrap_or(doc.version());
        let mut output = Vec::new();
        writeln!(output, "%PDF-{}", version)?;
        // Binary marker (recommended for binary content)
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut entries = BTreeMap::new();
        let mut skipped = 0;
        for (r, obj) in graph.iter() {
            if keep.as_ref().is_some_and(|k| !k.contains(&r)) {
                skipped += 1;
                continue;
            }
            let encoded = encoder.encode(r, obj)?;
            entries.insert(r.id, XrefSlot::InUse(output.len(), r.gen));
            output.extend_from_slice(&self.serializer.serialize_indirect(r, &encoded));
        }
        if skipped > 0 {
            log::debug!("dropped {} unreachable objects", skipped);
        }

        let size = entries.keys().next_back().map_or(1, |id| id + 1);
        let free: Vec<u32> = (1..size).filter(|id| !entries.contains_key(id)).collect();
        // Free entries form a list through object 0.
        let mut next_free = 0;
        for id in free.iter().rev() {
            entries.insert(*id, XrefSlot::Free(next_free, 65535));
            next_free = *id;
        }
        entries.insert(0, XrefSlot::Free(next_free, 65535));

        let xref_start = output.len();
        write_xref(&mut output, &entries)?;

        let mut trailer = graph.trailer().clone();
        trailer.insert("Size".to_string(), Object::Integer(size as i64));
        if !trailer.contains_key("ID") {
            let id = body_digest(&output[..xref_start]);
            trailer.insert(
                "ID".to_string(),
                Object::Array(vec![Object::String(id.clone()), Object::String(id)]),
            );
        }
        write_trailer(&mut output, &self.serializer, &trailer, xref_start)?;

        log::info!(
            "wrote {} objects ({} bytes, PDF {})",
            entries.len() - 1 - free.len(),
            output.len(),
            version
        );
        Ok(output)
    }
}

/// Where an object lives in the xref.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XrefSlot {
    /// byte offset, generation
    InUse(usize, u16),
    /// next free number, generation
    Free(u32, u16),
}

/// Write `xref` with one subsection per run of consecutive numbers.
pub(crate) fn write_xref(output: &mut Vec<u8>, entries: &BTreeMap<u32, XrefSlot>) -> Result<()> {
    writeln!(output, "xref")?;
    let numbers: Vec<u32> = entries.keys().copied().collect();
    let mut start = 0;
    while start < numbers.len() {
        let mut end = start + 1;
        while end < numbers.len() && numbers[end] == numbers[end - 1] + 1 {
            end += 1;
        }
        writeln!(output, "{} {}", numbers[start], end - start)?;
        for n in &numbers[start..end] {
            // Entries are exactly 20 bytes including the two-byte EOL.
            match entries[n] {
                XrefSlot::InUse(offset, gen) => writeln!(output, "{:010} {:05} n ", offset, gen)?,
                XrefSlot::Free(next, gen) => writeln!(output, "{:010} {:05} f ", next, gen)?,
            }
        }
        start = end;
    }
    Ok(())
}

pub(crate) fn write_trailer(
    output: &mut Vec<u8>,
    serializer: &ObjectSerializer,
    trailer: &Dict,
    xref_start: usize,
) -> Result<()> {
    writeln!(output, "trailer")?;
    serializer.write_object(output, &Object::Dictionary(trailer.clone()));
    writeln!(output)?;
    writeln!(output, "startxref")?;
    writeln!(output, "{}", xref_start)?;
    writeln!(output, "%%EOF")?;
    Ok(())
}

/// A file identifier derived from the written body, so output stays
/// deterministic.
pub(crate) fn body_digest(body: &[u8]) -> Vec<u8> {
    Md5::digest(body).to_vec()
}

/// Per-object transformations applied on the way out: optional Flate
/// compression, then encryption under the document's security handler.
pub(crate) struct ObjectEncoder<'a> {
    handler: Option<&'a SecurityHandler>,
    info: Option<&'a EncryptionInfo>,
    encrypt_ref: Option<ObjectRef>,
    compress: bool,
}

impl<'a> ObjectEncoder<'a> {
    pub(crate) fn new(doc: &'a PdfDocument, compress: bool) -> Self {
        let info = match doc.encryption() {
            EncryptionState::Encrypted(info) => Some(info),
            EncryptionState::Plain => None,
        };
        if info.is_some() && doc.security_handler().is_none() {
            log::debug!("document is locked; objects are written as loaded");
        }
        Self {
            handler: doc.security_handler(),
            info,
            encrypt_ref: doc.graph().trailer().get("Encrypt").and_then(|e| e.as_reference()),
            // Ciphertext does not compress and must not be touched.
            compress: compress && doc.is_content_accessible(),
        }
    }

    pub(crate) fn encode(&self, r: ObjectRef, obj: &Object) -> Result<Object> {
        let mut obj = obj.clone();
        if self.compress {
            compress_stream(&mut obj)?;
        }
        if let (Some(handler), Some(info)) = (self.handler, self.info) {
            if Some(r) != self.encrypt_ref && info.covers(&obj) {
                handler.encrypt_object(r, &mut obj)?;
            }
        }
        Ok(obj)
    }
}

fn compress_stream(obj: &mut Object) -> Result<()> {
    let Object::Stream { dict, data } = obj else {
        return Ok(());
    };
    if dict.contains_key("Filter") || data.len() < MIN_COMPRESS_LEN {
        return Ok(());
    }
    if matches!(dict.get("Type").and_then(|t| t.as_name()), Some("Metadata") | Some("XRef")) {
        return Ok(());
    }
    let compressed = encode_flate(data)?;
    if compressed.len() < data.len() {
        *data = compressed.into();
        dict.insert("Filter".to_string(), Object::name("FlateDecode"));
        dict.remove("DecodeParms");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn sample() -> PdfDocument {
        let mut doc = PdfDocument::create_empty();
        doc.add_page(Rect::new(0.0, 0.0, 200.0, 300.0), Dict::new(), b"0 0 m 10 10 l S".repeat(20))
            .unwrap();
        doc
    }

    #[test]
    fn test_file_structure() {
        let out = PdfWriter::default().write(&sample()).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.starts_with("%PDF-1.7\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("xref\n0 5\n0000000000 65535 f \n"));
        assert!(text.contains("/Size 5"));
        assert!(text.contains("/ID ["));
    }

    #[test]
    fn test_output_is_deterministic() {
        let doc = sample();
        let a = PdfWriter::default().write(&doc).unwrap();
        let b = PdfWriter::default().write(&doc).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_garbage_collection_leaves_free_entries() {
        let mut doc = sample();
        let orphan = doc.graph_mut().allocate(Object::Integer(7));
        let opts = SaveOptions::full_rewrite();
        let out = PdfWriter::new(opts.clone()).write(&doc).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(!text.contains(&format!("{} 0 obj", orphan.id)));

        let kept = PdfWriter::new(SaveOptions {
            garbage_collect: false,
            ..opts
        })
        .write(&doc)
        .unwrap();
        assert!(String::from_utf8_lossy(&kept).contains(&format!("{} 0 obj\n7", orphan.id)));
    }

    #[test]
    fn test_compression() {
        let opts = SaveOptions {
            compress: true,
            ..SaveOptions::full_rewrite()
        };
        let out = PdfWriter::new(opts).write(&sample()).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("/Filter /FlateDecode"));
    }

    #[test]
    fn test_xref_subsections() {
        let mut entries = BTreeMap::new();
        entries.insert(0, XrefSlot::Free(0, 65535));
        entries.insert(1, XrefSlot::InUse(15, 0));
        entries.insert(7, XrefSlot::Free(0, 1));
        entries.insert(8, XrefSlot::InUse(120, 0));
        let mut out = Vec::new();
        write_xref(&mut out, &entries).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "xref\n0 2\n0000000000 65535 f \n0000000015 00000 n \n7 2\n0000000000 00001 f \n0000000120 00000 n \n"
        );
    }
}
