//! Rotation and crop box edits.

use super::target_indices;
use crate::document::PdfDocument;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::page::normalize_rotation;
use serde::{Deserialize, Serialize};

/// Rotate pages by `delta` degrees (clockwise, as `/Rotate` is defined).
///
/// `pages` holds 1-based page numbers; `None` rotates every page. The new
/// value is `(current + delta) mod 360`. `delta` must be a multiple of 90.
pub fn rotate(doc: &PdfDocument, pages: Option<&[usize]>, delta: i64) -> Result<PdfDocument> {
    doc.require_content_access()?;
    if delta % 90 != 0 {
        return Err(Error::Validation(format!(
            "rotation must be a multiple of 90 degrees, got {}",
            delta
        )));
    }
    let targets = target_indices(pages, doc.page_count()?)?;

    let mut out = doc.clone();
    for &i in &targets {
        let current = out.page(i)?.rotation();
        out.set_page_rotation(i, normalize_rotation(current + delta))?;
    }
    log::info!("rotated {} pages by {} degrees", targets.len(), delta);
    Ok(out)
}

/// Margins in points, measured inwards from each edge of the media box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    /// From the top edge
    pub top: f64,
    /// From the right edge
    pub right: f64,
    /// From the bottom edge
    pub bottom: f64,
    /// From the left edge
    pub left: f64,
}

impl Margins {
    /// Margins given clockwise from the top, like CSS.
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// The same margin on every side.
    pub fn uniform(margin: f64) -> Self {
        Self::new(margin, margin, margin, margin)
    }

    /// The crop box these margins cut out of `media_box`.
    pub fn apply(&self, media_box: Rect) -> Rect {
        Rect::new(
            media_box.x + self.left,
            media_box.y + self.bottom,
            media_box.width - self.left - self.right,
            media_box.height - self.top - self.bottom,
        )
    }
}

/// Set each target page's crop box to its media box shrunk by `margins`.
///
/// Nothing is clamped: negative margins, or margins that leave no positive
/// width or height on any target page, are rejected before any page is
/// touched.
pub fn crop(doc: &PdfDocument, pages: Option<&[usize]>, margins: Margins) -> Result<PdfDocument> {
    doc.require_content_access()?;
    let m = margins;
    if [m.top, m.right, m.bottom, m.left].iter().any(|v| *v < 0.0 || !v.is_finite()) {
        return Err(Error::Validation(format!("crop margins must be non-negative, got {:?}", margins)));
    }
    let targets = target_indices(pages, doc.page_count()?)?;

    let mut boxes = Vec::with_capacity(targets.len());
    for &i in &targets {
        let media = doc.page(i)?.media_box();
        let crop = margins.apply(media);
        if !crop.is_valid() {
            return Err(Error::Validation(format!(
                "margins leave a {}x{} crop box on page {} ({}x{})",
                crop.width,
                crop.height,
                i + 1,
                media.width,
                media.height
            )));
        }
        boxes.push((i, crop));
    }

    let mut out = doc.clone();
    for (i, crop) in boxes {
        out.set_page_crop_box(i, crop)?;
    }
    log::info!("cropped {} pages", targets.len());
    Ok(out)
}
