//! Incremental updates.
//!
//! The original bytes are kept untouched and an update section is appended:
//! the objects that differ from what was loaded, an xref section covering
//! exactly those numbers, and a trailer whose `/Prev` points at the
//! previous xref.

use super::object_serializer::ObjectSerializer;
use super::pdf_writer::{body_digest, write_trailer, write_xref, ObjectEncoder, XrefSlot};
use super::SaveOptions;
use crate::document::PdfDocument;
use crate::error::{Error, Result};
use crate::object::Object;
use std::collections::{BTreeMap, HashSet};

/// Appends an update section to the bytes a document was loaded from.
#[derive(Debug, Clone, Default)]
pub struct IncrementalWriter {
    options: SaveOptions,
    serializer: ObjectSerializer,
}

impl IncrementalWriter {
    /// Writer with the given options. Only `compress` applies.
    pub fn new(options: SaveOptions) -> Self {
        Self {
            options,
            serializer: ObjectSerializer::new(),
        }
    }

    /// Original bytes plus the update. Returns the original bytes unchanged
    /// when nothing differs.
    pub fn write(&self, doc: &PdfDocument) -> Result<Vec<u8>> {
        let baseline = doc.baseline().ok_or_else(|| {
            Error::Validation("incremental save needs a document loaded from bytes".to_string())
        })?;
        let prev = baseline.xref_offset.ok_or_else(|| {
            Error::Validation(
                "incremental save is not possible after the cross-reference table was rebuilt".to_string(),
            )
        })?;
        let graph = doc.graph();
        let original = &baseline.graph;
        if graph.trailer().get("Encrypt") != original.trailer().get("Encrypt") {
            return Err(Error::Validation(
                "encryption changed since the document was loaded; use a full rewrite".to_string(),
            ));
        }
        graph.resolve(graph.root_ref()?)?;

        let changed: Vec<_> = graph
            .iter()
            .filter(|(r, obj)| original.get(*r) != Some(*obj))
            .collect();
        let live: HashSet<u32> = graph.iter().map(|(r, _)| r.id).collect();
        let deleted: Vec<_> = original
            .iter()
            .filter(|(r, _)| !live.contains(&r.id))
            .map(|(r, _)| r)
            .collect();
        if changed.is_empty() && deleted.is_empty() && graph.trailer() == original.trailer() {
            log::debug!("no changes since load, returning original bytes");
            return Ok(baseline.bytes.to_vec());
        }

        let encoder = ObjectEncoder::new(doc, self.options.compress);
        let mut output = baseline.bytes.to_vec();
        if !output.ends_with(b"\n") {
            output.push(b'\n');
        }
        let body_start = output.len();

        let mut entries = BTreeMap::new();
        for (r, obj) in &changed {
            let encoded = encoder.encode(*r, obj)?;
            entries.insert(r.id, XrefSlot::InUse(output.len(), r.gen));
            output.extend_from_slice(&self.serializer.serialize_indirect(*r, &encoded));
        }
        for r in &deleted {
            entries.insert(r.id, XrefSlot::Free(0, r.gen.saturating_add(1)));
        }

        let xref_start = output.len();
        write_xref(&mut output, &entries)?;

        let original_size = original
            .trailer()
            .get("Size")
            .and_then(|s| s.as_integer())
            .unwrap_or(0);
        let size = original_size.max(graph.max_id() as i64 + 1);
        let mut trailer = graph.trailer().clone();
        trailer.insert("Size".to_string(), Object::Integer(size));
        trailer.insert("Prev".to_string(), Object::Integer(prev as i64));
        if !trailer.contains_key("ID") {
            let id = body_digest(&output[body_start..xref_start]);
            trailer.insert(
                "ID".to_string(),
                Object::Array(vec![Object::String(id.clone()), Object::String(id)]),
            );
        }
        write_trailer(&mut output, &self.serializer, &trailer, xref_start)?;

        log::info!(
            "appended update: {} objects written, {} freed, {} bytes added",
            changed.len(),
            deleted.len(),
            output.len() - baseline.bytes.len()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::object::Dict;
    use crate::reader;
    use crate::writer::PdfWriter;

    fn loaded() -> (Vec<u8>, PdfDocument) {
        let mut doc = PdfDocument::create_empty();
        for _ in 0..2 {
            doc.add_page(Rect::new(0.0, 0.0, 300.0, 300.0), Dict::new(), b"q Q".to_vec())
                .unwrap();
        }
        let bytes = PdfWriter::default().write(&doc).unwrap();
        let doc = reader::parse(&bytes).unwrap();
        (bytes, doc)
    }

    #[test]
    fn test_unchanged_document_returns_original() {
        let (bytes, doc) = loaded();
        let out = IncrementalWriter::default().write(&doc).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_appends_only_changes() {
        let (bytes, mut doc) = loaded();
        doc.set_page_rotation(1, 90).unwrap();
        let page_ref = doc.page(1).unwrap().object_ref;

        let out = IncrementalWriter::default().write(&doc).unwrap();
        assert_eq!(&out[..bytes.len()], &bytes[..]);
        let update = String::from_utf8_lossy(&out[bytes.len()..]).into_owned();
        assert!(update.starts_with(&format!("{} 0 obj", page_ref.id)));
        assert_eq!(update.matches(" obj\n").count(), 1);
        assert!(update.contains(&format!("xref\n{} 1\n", page_ref.id)));
        assert!(update.contains("/Prev "));

        let reparsed = reader::parse(&out).unwrap();
        assert_eq!(reparsed.page(1).unwrap().rotation(), 90);
        assert_eq!(reparsed.page(0).unwrap().rotation(), 0);
    }

    #[test]
    fn test_removed_page_is_freed() {
        let (_, mut doc) = loaded();
        let removed = doc.page(0).unwrap().object_ref;
        doc.remove_page(0).unwrap();
        let out = IncrementalWriter::default().write(&doc).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains(&format!("{} 1\n0000000000 00001 f ", removed.id)));
        assert_eq!(reader::parse(&out).unwrap().page_count().unwrap(), 1);
    }

    #[test]
    fn test_requires_baseline() {
        let doc = PdfDocument::create_empty();
        let err = IncrementalWriter::default().write(&doc).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
