//! Interfaces to services this crate does not implement.
//!
//! Rendering pages to pixels, recognizing text in them and comparing two
//! renderings are left to the host. Implementations are handed to
//! [`Capabilities`] once at startup; feature helpers take the
//! `Capabilities` explicitly and report [`Error::Unsupported`] when the
//! piece they need is missing.

use crate::document::PdfDocument;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// An owned RGBA image, 4 bytes per pixel, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGBA samples
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap an RGBA buffer, checking its length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::Validation(format!(
                "{}x{} RGBA image needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }
}

/// Result of comparing two rasters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDiff {
    /// Pixels that differ
    pub changed_pixels: u64,
    /// `changed_pixels` over the total
    pub ratio: f64,
    /// Optional visualization of the differences
    #[serde(skip)]
    pub mask: Option<RasterImage>,
}

/// Renders a page to pixels.
pub trait PageRasterizer: Send + Sync {
    /// Render page `page_index` at `scale` (1.0 = 72 dpi).
    fn render(&self, doc: &PdfDocument, page_index: usize, scale: f64) -> Result<RasterImage>;
}

/// Recognizes text in a raster.
pub trait TextRecognizer: Send + Sync {
    /// Extract the text shown in `image`.
    fn extract(&self, image: &RasterImage) -> Result<String>;
}

/// Compares two rasters.
pub trait ImageDiffer: Send + Sync {
    /// Compare `a` with `b`.
    fn compare(&self, a: &RasterImage, b: &RasterImage) -> Result<ImageDiff>;
}

/// Whether a capability can be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Availability {
    /// Ready to use
    Ready,
    /// Not usable, with the reason
    Unavailable(String),
}

impl Availability {
    /// Whether this is [`Availability::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, Availability::Ready)
    }
}

/// Status of every optional capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityStatus {
    /// Page rendering
    pub rasterizer: Availability,
    /// Text recognition
    pub recognizer: Availability,
    /// Raster comparison
    pub differ: Availability,
}

/// The collaborators available to this process, fixed at startup.
#[derive(Clone, Default)]
pub struct Capabilities {
    rasterizer: Option<Arc<dyn PageRasterizer>>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    differ: Option<Arc<dyn ImageDiffer>>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities").field("status", &self.status()).finish()
    }
}

impl Capabilities {
    /// No collaborators at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a page rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Add a text recognizer.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Add an image differ.
    pub fn with_differ(mut self, differ: Arc<dyn ImageDiffer>) -> Self {
        self.differ = Some(differ);
        self
    }

    /// Availability of each capability.
    pub fn status(&self) -> CapabilityStatus {
        fn of<T: ?Sized>(slot: &Option<Arc<T>>, what: &str) -> Availability {
            match slot {
                Some(_) => Availability::Ready,
                None => Availability::Unavailable(format!("no {} configured", what)),
            }
        }
        CapabilityStatus {
            rasterizer: of(&self.rasterizer, "page rasterizer"),
            recognizer: of(&self.recognizer, "text recognizer"),
            differ: of(&self.differ, "image differ"),
        }
    }

    fn rasterizer(&self) -> Result<&dyn PageRasterizer> {
        self.rasterizer
            .as_deref()
            .ok_or_else(|| Error::Unsupported("page rendering is not available".to_string()))
    }
}

/// Render page `page_index` and run text recognition on it.
pub fn ocr_page(capabilities: &Capabilities, doc: &PdfDocument, page_index: usize, scale: f64) -> Result<String> {
    let recognizer = capabilities
        .recognizer
        .as_deref()
        .ok_or_else(|| Error::Unsupported("text recognition is not available".to_string()))?;
    let rasterizer = capabilities.rasterizer()?;
    doc.page(page_index)?;
    let image = rasterizer.render(doc, page_index, scale)?;
    recognizer.extract(&image)
}

/// Render the same page of two documents and compare the results.
pub fn diff_pages(
    capabilities: &Capabilities,
    a: &PdfDocument,
    b: &PdfDocument,
    page_index: usize,
    scale: f64,
) -> Result<ImageDiff> {
    let differ = capabilities
        .differ
        .as_deref()
        .ok_or_else(|| Error::Unsupported("image comparison is not available".to_string()))?;
    let rasterizer = capabilities.rasterizer()?;
    a.page(page_index)?;
    b.page(page_index)?;
    let left = rasterizer.render(a, page_index, scale)?;
    let right = rasterizer.render(b, page_index, scale)?;
    differ.compare(&left, &right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    struct Blank;

    impl PageRasterizer for Blank {
        fn render(&self, doc: &PdfDocument, page_index: usize, scale: f64) -> Result<RasterImage> {
            let size = doc.page(page_index)?.media_box();
            let (w, h) = ((size.width * scale) as u32, (size.height * scale) as u32);
            RasterImage::new(w, h, vec![255; w as usize * h as usize * 4])
        }
    }

    struct Fixed;

    impl TextRecognizer for Fixed {
        fn extract(&self, image: &RasterImage) -> Result<String> {
            Ok(format!("{}x{}", image.width, image.height))
        }
    }

    struct Exact;

    impl ImageDiffer for Exact {
        fn compare(&self, a: &RasterImage, b: &RasterImage) -> Result<ImageDiff> {
            let changed = a.pixels.chunks(4).zip(b.pixels.chunks(4)).filter(|(x, y)| x != y).count() as u64;
            let total = (a.width as u64 * a.height as u64).max(1);
            Ok(ImageDiff {
                changed_pixels: changed,
                ratio: changed as f64 / total as f64,
                mask: None,
            })
        }
    }

    fn doc() -> PdfDocument {
        let mut doc = PdfDocument::create_empty();
        doc.add_page(Rect::new(0.0, 0.0, 20.0, 10.0), Default::default(), Vec::new())
            .unwrap();
        doc
    }

    #[test]
    fn test_missing_capabilities_are_unsupported() {
        let caps = Capabilities::none();
        assert!(!caps.status().recognizer.is_ready());
        assert!(matches!(ocr_page(&caps, &doc(), 0, 1.0), Err(Error::Unsupported(_))));
        assert!(matches!(diff_pages(&caps, &doc(), &doc(), 0, 1.0), Err(Error::Unsupported(_))));

        let only_ocr = Capabilities::none().with_recognizer(Arc::new(Fixed));
        assert!(matches!(ocr_page(&only_ocr, &doc(), 0, 1.0), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_injected_capabilities() {
        let caps = Capabilities::none()
            .with_rasterizer(Arc::new(Blank))
            .with_recognizer(Arc::new(Fixed))
            .with_differ(Arc::new(Exact));
        assert_eq!(caps.status().differ, Availability::Ready);
        assert_eq!(ocr_page(&caps, &doc(), 0, 2.0).unwrap(), "40x20");
        assert_eq!(diff_pages(&caps, &doc(), &doc(), 0, 1.0).unwrap().changed_pixels, 0);
        assert!(matches!(ocr_page(&caps, &doc(), 3, 1.0), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_raster_length_checked() {
        assert!(RasterImage::new(2, 2, vec![0; 16]).is_ok());
        assert!(RasterImage::new(2, 2, vec![0; 15]).is_err());
    }
}
