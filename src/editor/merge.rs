//! Merging documents.

use super::derived_document;
use crate::document::PdfDocument;
use crate::error::{Error, Result};

/// Concatenate `docs` into a new document.
///
/// Documents appear in the order given and each keeps its own page order.
/// Resources shared between pages of one source stay shared in the result.
/// The version is the highest of the inputs; metadata comes from the first.
///
/// Fails with [`Error::Validation`] for fewer than two documents and with
/// [`Error::Authentication`] if any input is still locked.
pub fn merge(docs: &[PdfDocument]) -> Result<PdfDocument> {
    if docs.len() < 2 {
        return Err(Error::Validation(format!(
            "merge needs at least two documents, got {}",
            docs.len()
        )));
    }
    let mut counts = Vec::with_capacity(docs.len());
    for doc in docs {
        doc.require_content_access()?;
        counts.push(doc.page_count()?);
    }

    let mut out = derived_document(&docs[0])?;
    let version = docs
        .iter()
        .map(|d| d.version())
        .max_by(|a, b| {
            let parse = |v: &str| v.parse::<f64>().unwrap_or(0.0);
            parse(a).total_cmp(&parse(b))
        })
        .unwrap_or(crate::document::DEFAULT_VERSION)
        .to_string();
    out.set_version(version);

    let mut at = 0;
    for (doc, count) in docs.iter().zip(&counts) {
        let indices: Vec<usize> = (0..*count).collect();
        out.insert_pages(at, doc, &indices)?;
        at += count;
    }
    log::info!("merged {} documents into {} pages", docs.len(), at);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn doc(widths: &[f64]) -> PdfDocument {
        let mut doc = PdfDocument::create_empty();
        for w in widths {
            doc.add_page(Rect::new(0.0, 0.0, *w, 100.0), Default::default(), Vec::new())
                .unwrap();
        }
        doc
    }

    #[test]
    fn test_merge_preserves_order() {
        let a = doc(&[10.0, 20.0]);
        let b = doc(&[30.0]);
        let mut c = doc(&[40.0]);
        c.set_version("1.5");
        let merged = merge(&[a.clone(), b, c]).unwrap();
        let widths: Vec<f64> = merged.pages().unwrap().iter().map(|p| p.media_box().width).collect();
        assert_eq!(widths, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(merged.version(), "1.7");
        merged.graph().validate().unwrap();
        // Inputs are untouched.
        assert_eq!(a.page_count().unwrap(), 2);
    }

    #[test]
    fn test_merge_needs_two() {
        assert!(matches!(merge(&[doc(&[10.0])]), Err(Error::Validation(_))));
        assert!(matches!(merge(&[]), Err(Error::Validation(_))));
    }
}
