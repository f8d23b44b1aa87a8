//! Document mutation operations.
//!
//! Every operation takes its source documents by shared reference and
//! returns a new [`PdfDocument`]; inputs are never modified. Parameters are
//! checked before anything is copied, so a rejected call leaves nothing
//! half-built behind.
//!
//! ## Architecture
//!
//! ```text
//! &PdfDocument (source, read-only)
//!     ↓
//! validate parameters ── Error::Validation / Error::Authentication
//!     ↓
//! fresh document (merge, split, organize, images)
//!   or cloned document (rotate, crop, stamp, protect, unlock)
//!     ↓
//! PdfDocument (result)
//! ```
//!
//! Page numbers taken by these functions are 1-based, as a user would type
//! them. [`Placement`](crate::geometry::Placement) keeps its zero-based
//! `page_index`.

mod images;
mod merge;
mod organize;
mod page_props;
mod resource_manager;
mod security;
mod split;
mod stamp;

pub use images::{images_to_pdf, jpeg_info, ImageFit, ImagesToPdfOptions, JpegInfo};
pub use merge::merge;
pub use organize::{delete_pages, organize, reorder};
pub use page_props::{crop, rotate, Margins};
pub use resource_manager::ResourceManager;
pub use security::{protect, unlock, ProtectOptions};
pub use split::{burst, extract_pages, parse_page_ranges, parse_range_groups, split, split_into_ranges};
pub use stamp::{
    apply_placements, number_pages, stamp_text, watermark, Color, PageNumberOptions, PlacementStyle,
    TextStamp, WatermarkOptions,
};

use crate::document::PdfDocument;
use crate::error::{Error, Result};

/// Convert 1-based page numbers to indices, rejecting anything outside
/// `1..=page_count`. Order and duplicates are kept.
pub(crate) fn to_indices(pages: &[usize], page_count: usize) -> Result<Vec<usize>> {
    pages
        .iter()
        .map(|&n| {
            if n == 0 || n > page_count {
                Err(Error::Validation(format!(
                    "page {} does not exist (document has {} pages)",
                    n, page_count
                )))
            } else {
                Ok(n - 1)
            }
        })
        .collect()
}

/// Indices selected by an optional page list; `None` means every page.
pub(crate) fn target_indices(pages: Option<&[usize]>, page_count: usize) -> Result<Vec<usize>> {
    match pages {
        Some(list) if list.is_empty() => Err(Error::Validation("no pages selected".to_string())),
        Some(list) => {
            let mut indices = to_indices(list, page_count)?;
            indices.sort_unstable();
            indices.dedup();
            Ok(indices)
        },
        None => Ok((0..page_count).collect()),
    }
}

/// An empty document carrying over the source's version and metadata.
pub(crate) fn derived_document(source: &PdfDocument) -> Result<PdfDocument> {
    let mut doc = PdfDocument::create_empty();
    doc.set_version(source.version());
    let info = source.info()?;
    if info != Default::default() {
        doc.set_info(&info)?;
    }
    Ok(doc)
}

/// Copy the pages at `indices` (in that order) into a new document.
pub(crate) fn copy_pages(source: &PdfDocument, indices: &[usize]) -> Result<PdfDocument> {
    let mut doc = derived_document(source)?;
    doc.insert_pages(0, source, indices)?;
    Ok(doc)
}
