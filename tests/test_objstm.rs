//! Loading PDF 1.5 files whose objects live in object streams and whose
//! cross-reference data is a `/Type /XRef` stream.

mod common;

use common::*;
use pdf_graft::decoders::encode_flate;
use pdf_graft::geometry::Rect;
use pdf_graft::object::ObjectRef;
use pdf_graft::reader::parse;
use pdf_graft::writer::{save, serialize, SaveOptions};

fn push_stream(out: &mut Vec<u8>, header: &str, data: &[u8]) {
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(b"\nstream\n");
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nendstream\nendobj\n");
}

/// Catalog and page tree compressed into object 4, the page itself stored
/// plainly, cross-references in stream object 5.
fn compressed_pdf() -> Vec<u8> {
    let bodies = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
    ];
    let mut header = String::new();
    let mut section = String::new();
    for (i, body) in bodies.iter().enumerate() {
        header.push_str(&format!("{} {} ", i + 1, section.len()));
        section.push_str(body);
        section.push(' ');
    }
    let container = encode_flate(format!("{}{}", header, section).as_bytes()).unwrap();

    let mut out = b"%PDF-1.5\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let page_offset = out.len();
    out.extend_from_slice(
        b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] /Contents 6 0 R >>\nendobj\n",
    );
    let objstm_offset = out.len();
    push_stream(
        &mut out,
        &format!(
            "4 0 obj\n<< /Type /ObjStm /N 2 /First {} /Filter /FlateDecode /Length {} >>",
            header.len(),
            container.len()
        ),
        &container,
    );
    let content_offset = out.len();
    let content = b"% compressed";
    push_stream(&mut out, &format!("6 0 obj\n<< /Length {} >>", content.len()), content);

    let xref_offset = out.len();
    let mut rows: Vec<[u8; 4]> = vec![[0, 0, 0, 255]; 7];
    rows[1] = [2, 0, 4, 0];
    rows[2] = [2, 0, 4, 1];
    for (num, offset) in [(3, page_offset), (4, objstm_offset), (5, xref_offset), (6, content_offset)] {
        rows[num] = [1, (offset >> 8) as u8, (offset & 0xFF) as u8, 0];
    }
    let table: Vec<u8> = rows.concat();
    push_stream(
        &mut out,
        &format!(
            "5 0 obj\n<< /Type /XRef /Size 7 /W [1 2 1] /Root 1 0 R /Length {} >>",
            table.len()
        ),
        &table,
    );
    out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());
    out
}

#[test]
fn test_objects_expanded_from_object_stream() {
    let doc = parse(&compressed_pdf()).unwrap();
    assert_eq!(doc.version(), "1.5");
    assert_eq!(doc.page_count().unwrap(), 1);
    assert_eq!(doc.page(0).unwrap().media_box(), Rect::new(0.0, 0.0, 200.0, 100.0));
    assert_eq!(contents(&doc), vec!["% compressed".to_string()]);

    // Containers are gone; their members are ordinary objects.
    assert!(objects_of_type(&doc, "ObjStm").is_empty());
    assert!(objects_of_type(&doc, "XRef").is_empty());
    assert!(doc.graph().get(ObjectRef::new(1, 0)).is_some());
    assert!(doc.graph().get(ObjectRef::new(4, 0)).is_none());
    doc.graph().validate().unwrap();
}

#[test]
fn test_compressed_file_survives_rewrite() {
    let doc = parse(&compressed_pdf()).unwrap();
    let again = parse(&serialize(&doc).unwrap()).unwrap();
    assert_eq!(geometry(&again), geometry(&doc));
    assert_eq!(contents(&again), contents(&doc));
}

#[test]
fn test_incremental_update_after_xref_stream() {
    let original = compressed_pdf();
    let doc = parse(&original).unwrap();
    let mut edited = doc.clone();
    edited.set_page_rotation(0, 270).unwrap();

    let out = save(&edited, &SaveOptions::incremental()).unwrap();
    assert!(out.starts_with(&original));
    let again = parse(&out).unwrap();
    assert_eq!(geometry(&again), vec![(200.0, 100.0, 270)]);
    assert_eq!(contents(&again), contents(&doc));
}
