//! Reordering and deleting pages.

use super::{copy_pages, to_indices};
use crate::document::PdfDocument;
use crate::error::{Error, Result};

/// Build a new document from the 1-based pages in `order`, exactly in that
/// order. Pages left out are dropped. A page listed twice appears twice, as
/// two page objects sharing resources.
pub fn organize(doc: &PdfDocument, order: &[usize]) -> Result<PdfDocument> {
    doc.require_content_access()?;
    if order.is_empty() {
        return Err(Error::Validation("page order is empty".to_string()));
    }
    let indices = to_indices(order, doc.page_count()?)?;
    let out = copy_pages(doc, &indices)?;
    log::info!("organized document into {} pages", indices.len());
    Ok(out)
}

/// Same as [`organize`].
pub fn reorder(doc: &PdfDocument, order: &[usize]) -> Result<PdfDocument> {
    organize(doc, order)
}

/// Drop the given 1-based pages, keeping the rest in order.
///
/// Deleting every page is rejected.
pub fn delete_pages(doc: &PdfDocument, pages: &[usize]) -> Result<PdfDocument> {
    let count = doc.page_count()?;
    let doomed = to_indices(pages, count)?;
    let keep: Vec<usize> = (1..=count).filter(|n| !doomed.contains(&(n - 1))).collect();
    if keep.is_empty() {
        return Err(Error::Validation("cannot delete every page".to_string()));
    }
    organize(doc, &keep)
}
