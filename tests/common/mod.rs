//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use pdf_graft::document::PdfDocument;
use pdf_graft::geometry::Rect;
use pdf_graft::object::{Object, ObjectRef};

/// Assemble a classic PDF from object bodies numbered 1, 2, ... with a
/// correct xref table. Object 1 is the catalog.
pub fn build_pdf(objects: &[String], trailer_extra: &str) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R {}>>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            trailer_extra,
            xref
        )
        .as_bytes(),
    );
    out
}

/// A stream object body with a correct `/Length`.
pub fn stream(content: &str) -> String {
    format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content)
}

/// Three pages in a two-level tree with inherited attributes:
///
/// - page 1: 500x700, rotation 90 and Courier resources from the root node
/// - pages 2 and 3: 300x400 from an intermediate node, rotation 90 inherited
///   by page 3 and overridden to 0 on page 2
pub fn inherited_tree_pdf() -> Vec<u8> {
    let objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 3 /MediaBox [0 0 500 700] /Rotate 90 \
         /Resources << /Font << /F1 9 0 R >> >> >>"
            .to_string(),
        "<< /Type /Page /Parent 2 0 R /Contents 7 0 R >>".to_string(),
        "<< /Type /Pages /Parent 2 0 R /Kids [5 0 R 6 0 R] /Count 2 /MediaBox [0 0 300 400] >>".to_string(),
        "<< /Type /Page /Parent 4 0 R /Rotate 0 /Contents 8 0 R >>".to_string(),
        "<< /Type /Page /Parent 4 0 R /Contents 10 0 R >>".to_string(),
        stream("BT /F1 12 Tf 72 600 Td (one) Tj ET"),
        stream("BT /F1 12 Tf 72 300 Td (two) Tj ET"),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>".to_string(),
        stream("BT /F1 12 Tf 72 300 Td (three) Tj ET"),
    ];
    build_pdf(&objects, "")
}

/// A document built in memory: one page per `(width, height)`, each with
/// the content `% page N`.
pub fn sized_document(sizes: &[(f64, f64)]) -> PdfDocument {
    let mut doc = PdfDocument::create_empty();
    for (i, (w, h)) in sizes.iter().enumerate() {
        doc.add_page(
            Rect::new(0.0, 0.0, *w, *h),
            Default::default(),
            format!("% page {}", i + 1).into_bytes(),
        )
        .expect("add page");
    }
    doc
}

/// `n` Letter pages.
pub fn letter_document(n: usize) -> PdfDocument {
    sized_document(&vec![(612.0, 792.0); n])
}

/// Page contents as strings, in page order.
pub fn contents(doc: &PdfDocument) -> Vec<String> {
    (0..doc.page_count().expect("page count"))
        .map(|i| String::from_utf8_lossy(&doc.page_content(i).expect("content")).into_owned())
        .collect()
}

/// `(width, height, rotation)` per page.
pub fn geometry(doc: &PdfDocument) -> Vec<(f64, f64, i64)> {
    doc.pages()
        .expect("pages")
        .iter()
        .map(|p| {
            let b = p.media_box();
            (b.width, b.height, p.rotation())
        })
        .collect()
}

/// Indirect objects of the given `/Type`.
pub fn objects_of_type(doc: &PdfDocument, ty: &str) -> Vec<ObjectRef> {
    doc.graph()
        .iter()
        .filter(|(_, o)| o.as_dict().and_then(|d| d.get("Type")).and_then(Object::as_name) == Some(ty))
        .map(|(r, _)| r)
        .collect()
}
