//! Text stamping: free text, watermarks, page numbers and placements.
//!
//! Every stamp is drawn into a fresh content stream appended to the page.
//! The page's existing content is bracketed by `q`/`Q` (see
//! [`PdfDocument::append_content`]) and each stamp runs inside its own
//! `q`/`Q`, so neither side can disturb the other's graphics state.

use super::{target_indices, to_indices, ResourceManager};
use crate::document::PdfDocument;
use crate::error::{Error, Result};
use crate::geometry::{ui_to_pdf, Placement};
use crate::writer::{ContentStreamBuilder, StandardFont};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f64,
    /// Green
    pub g: f64,
    /// Blue
    pub b: f64,
}

impl Color {
    /// Black
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    /// A color from its components.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// A shade of gray.
    pub const fn gray(level: f64) -> Self {
        Self::rgb(level, level, level)
    }

    fn is_valid(&self) -> bool {
        [self.r, self.g, self.b].iter().all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// One run of text to draw on a page, in PDF user space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStamp {
    /// Text to draw (WinAnsi; unmappable characters become `?`)
    pub text: String,
    /// Baseline origin x
    pub x: f64,
    /// Baseline origin y
    pub y: f64,
    /// Font
    pub font: StandardFont,
    /// Font size in points
    pub size: f64,
    /// Fill color
    pub color: Color,
    /// Fill and stroke alpha
    pub opacity: f64,
    /// Counter-clockwise rotation about the origin, in degrees
    pub rotation: f64,
}

impl TextStamp {
    /// Black 12pt Helvetica at `(x, y)`.
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font: StandardFont::Helvetica,
            size: 12.0,
            color: Color::BLACK,
            opacity: 1.0,
            rotation: 0.0,
        }
    }

    /// Set the font.
    pub fn with_font(mut self, font: StandardFont) -> Self {
        self.font = font;
        self
    }

    /// Set the font size.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Set the fill color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the rotation.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.size > 0.0 && self.size.is_finite()) {
            return Err(Error::Validation(format!("font size must be positive, got {}", self.size)));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::Validation(format!("opacity must be within 0..=1, got {}", self.opacity)));
        }
        if !self.color.is_valid() {
            return Err(Error::Validation(format!("color components must be within 0..=1, got {:?}", self.color)));
        }
        if !(self.x.is_finite() && self.y.is_finite() && self.rotation.is_finite()) {
            return Err(Error::Validation("stamp position and rotation must be finite".to_string()));
        }
        Ok(())
    }
}

/// Draw `stamps` on the 1-based page `page_number`.
pub fn stamp_text(doc: &PdfDocument, page_number: usize, stamps: &[TextStamp]) -> Result<PdfDocument> {
    doc.require_content_access()?;
    if stamps.is_empty() {
        return Err(Error::Validation("no text to stamp".to_string()));
    }
    let index = to_indices(&[page_number], doc.page_count()?)?[0];
    stamp_pages(doc, vec![(index, stamps.to_vec())])
}

/// Watermark settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    /// Watermark text
    pub text: String,
    /// Font
    pub font: StandardFont,
    /// Font size in points
    pub size: f64,
    /// Fill color
    pub color: Color,
    /// Opacity
    pub opacity: f64,
    /// Counter-clockwise rotation in degrees
    pub rotation: f64,
    /// 1-based pages to mark; `None` for all
    pub pages: Option<Vec<usize>>,
}

impl WatermarkOptions {
    /// Defaults with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: "CONFIDENTIAL".to_string(),
            font: StandardFont::HelveticaBold,
            size: 50.0,
            color: Color::rgb(0.9, 0.2, 0.2),
            opacity: 0.3,
            rotation: -45.0,
            pages: None,
        }
    }
}

/// Draw `options.text` centered on each target page's crop box.
///
/// The text is rotated about its own center, so the visual center of the
/// run lands on the center of the visible page whatever the angle.
pub fn watermark(doc: &PdfDocument, options: &WatermarkOptions) -> Result<PdfDocument> {
    doc.require_content_access()?;
    if options.text.trim().is_empty() {
        return Err(Error::Validation("watermark text is empty".to_string()));
    }
    let targets = target_indices(options.pages.as_deref(), doc.page_count()?)?;

    let width = options.font.text_width(&options.text, options.size);
    let height = options.font.cap_height() * options.size / 1000.0;
    let (sin, cos) = options.rotation.to_radians().sin_cos();
    // Offset from the text origin to its center, after rotation.
    let dx = width / 2.0 * cos - height / 2.0 * sin;
    let dy = width / 2.0 * sin + height / 2.0 * cos;

    let mut runs = Vec::with_capacity(targets.len());
    for index in targets {
        let center = doc.page(index)?.crop_box().center();
        let stamp = TextStamp::new(options.text.clone(), center.x - dx, center.y - dy)
            .with_font(options.font)
            .with_size(options.size)
            .with_color(options.color)
            .with_opacity(options.opacity)
            .with_rotation(options.rotation);
        runs.push((index, vec![stamp]));
    }
    stamp_pages(doc, runs)
}

/// Page numbering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNumberOptions {
    /// Template; `{n}` is the page number and `{total}` the page count
    pub format: String,
    /// Font
    pub font: StandardFont,
    /// Font size in points
    pub size: f64,
    /// Fill color
    pub color: Color,
    /// Baseline distance from the bottom of the crop box
    pub margin: f64,
    /// Number given to the first page
    pub start: usize,
    /// 1-based pages to number; `None` for all
    pub pages: Option<Vec<usize>>,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            format: "{n} / {total}".to_string(),
            font: StandardFont::Helvetica,
            size: 12.0,
            color: Color::gray(0.5),
            margin: 20.0,
            start: 1,
            pages: None,
        }
    }
}

impl PageNumberOptions {
    /// The label for the page at `index` of `total`.
    pub fn label(&self, index: usize, total: usize) -> String {
        self.format
            .replace("{n}", &(self.start + index).to_string())
            .replace("{total}", &(self.start + total - 1).to_string())
    }
}

/// Draw a page number centered at the bottom of each target page.
pub fn number_pages(doc: &PdfDocument, options: &PageNumberOptions) -> Result<PdfDocument> {
    doc.require_content_access()?;
    if options.format.is_empty() {
        return Err(Error::Validation("page number format is empty".to_string()));
    }
    let total = doc.page_count()?;
    let targets = target_indices(options.pages.as_deref(), total)?;

    let mut runs = Vec::with_capacity(targets.len());
    for index in targets {
        let crop = doc.page(index)?.crop_box();
        let label = options.label(index, total);
        let width = options.font.text_width(&label, options.size);
        let stamp = TextStamp::new(label, crop.x + (crop.width - width) / 2.0, crop.y + options.margin)
            .with_font(options.font)
            .with_size(options.size)
            .with_color(options.color);
        runs.push((index, vec![stamp]));
    }
    stamp_pages(doc, runs)
}

/// How placement text is drawn inside its box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementStyle {
    /// Font
    pub font: StandardFont,
    /// Font size in points
    pub size: f64,
    /// Fill color
    pub color: Color,
    /// Inset of the baseline origin from the box's bottom-left corner
    pub padding: f64,
}

impl Default for PlacementStyle {
    fn default() -> Self {
        Self {
            font: StandardFont::Helvetica,
            size: 12.0,
            color: Color::rgb(0.1, 0.1, 0.4),
            padding: 5.0,
        }
    }
}

/// Draw each placement's value inside its box.
///
/// Placement boxes are in top-left-origin UI space relative to the visible
/// (crop) box and convert with [`ui_to_pdf`]. Placements with an empty
/// value are skipped.
pub fn apply_placements(doc: &PdfDocument, placements: &[Placement], style: &PlacementStyle) -> Result<PdfDocument> {
    doc.require_content_access()?;
    let count = doc.page_count()?;

    let mut by_page: BTreeMap<usize, Vec<TextStamp>> = BTreeMap::new();
    for placement in placements {
        if placement.page_index >= count {
            return Err(Error::Validation(format!(
                "placement {} targets page index {} but the document has {} pages",
                placement.id, placement.page_index, count
            )));
        }
        if !(placement.width > 0.0 && placement.height > 0.0) {
            return Err(Error::Validation(format!("placement {} has an empty box", placement.id)));
        }
        if placement.value.is_empty() {
            log::debug!("skipping empty placement {}", placement.id);
            continue;
        }
        let page_box = doc.page(placement.page_index)?.crop_box();
        let rect = ui_to_pdf(placement.ui_rect(), page_box);
        let stamp = TextStamp::new(
            placement.value.clone(),
            rect.x + style.padding,
            rect.y + style.padding,
        )
        .with_font(style.font)
        .with_size(style.size)
        .with_color(style.color);
        by_page.entry(placement.page_index).or_default().push(stamp);
    }
    stamp_pages(doc, by_page.into_iter().collect())
}

/// Validate every run, then draw them on a copy of `doc`.
fn stamp_pages(doc: &PdfDocument, runs: Vec<(usize, Vec<TextStamp>)>) -> Result<PdfDocument> {
    for (_, stamps) in &runs {
        for stamp in stamps {
            stamp.validate()?;
        }
    }

    let mut out = doc.clone();
    let mut resources = ResourceManager::for_document(&out);
    let mut drawn = 0;
    for (index, stamps) in runs {
        let content = render(&mut out, &mut resources, index, &stamps)?;
        out.append_content(index, content)?;
        drawn += stamps.len();
    }
    log::info!("stamped {} text runs", drawn);
    Ok(out)
}

fn render(
    doc: &mut PdfDocument,
    resources: &mut ResourceManager,
    index: usize,
    stamps: &[TextStamp],
) -> Result<Vec<u8>> {
    let mut builder = ContentStreamBuilder::new();
    for stamp in stamps {
        let font = resources.page_font(doc, index, stamp.font)?;
        builder.save_state();
        if stamp.opacity < 1.0 {
            let gs = resources.page_opacity(doc, index, stamp.opacity)?;
            builder.set_ext_gstate(&gs);
        }
        builder
            .begin_text()
            .set_font(&font, stamp.size)
            .set_fill_color(stamp.color.r, stamp.color.g, stamp.color.b)
            .text_at(&stamp.text, stamp.x, stamp.y, stamp.rotation)
            .end_text()
            .restore_state();
    }
    builder.build()
}
