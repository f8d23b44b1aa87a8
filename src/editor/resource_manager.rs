//! Shared resources for content added to a document.
//!
//! Stamping needs fonts and graphics states. Each standard font and each
//! opacity level is created once per document and then only referenced, so
//! stamping every page of a thousand-page file adds one font object, not a
//! thousand.

use crate::document::PdfDocument;
use crate::error::Result;
use crate::object::{Object, ObjectRef};
use crate::writer::StandardFont;
use indexmap::IndexMap;

/// Registry of document-level resources created or found so far.
///
/// Registration order is kept so output does not depend on hashing.
#[derive(Debug, Clone, Default)]
pub struct ResourceManager {
    /// Font registry: font → font dictionary
    fonts: IndexMap<StandardFont, ObjectRef>,

    /// Graphics state registry: opacity in thousandths → ExtGState
    graphics_states: IndexMap<u32, ObjectRef>,
}

impl ResourceManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with the reusable fonts and opacity states
    /// already present in `doc`.
    pub fn for_document(doc: &PdfDocument) -> Self {
        let mut manager = Self::new();
        for (r, obj) in doc.graph().iter() {
            let Some(dict) = obj.as_dict() else { continue };
            match dict.get("Type").and_then(|t| t.as_name()) {
                Some("Font") => {
                    if let Some(font) = reusable_font(dict) {
                        manager.fonts.entry(font).or_insert(r);
                    }
                },
                Some("ExtGState") => {
                    if let Some(key) = reusable_opacity(dict) {
                        manager.graphics_states.entry(key).or_insert(r);
                    }
                },
                _ => {},
            }
        }
        if !manager.fonts.is_empty() {
            log::debug!("reusing {} standard fonts already in the document", manager.fonts.len());
        }
        manager
    }

    // === Font Management ===

    /// The font dictionary for `font`, created on first use.
    pub fn font(&mut self, doc: &mut PdfDocument, font: StandardFont) -> ObjectRef {
        *self
            .fonts
            .entry(font)
            .or_insert_with(|| doc.graph_mut().allocate(font.font_dict()))
    }

    /// Make `font` available on a page and return its resource name.
    pub fn page_font(&mut self, doc: &mut PdfDocument, page_index: usize, font: StandardFont) -> Result<String> {
        let r = self.font(doc, font);
        doc.add_page_resource(page_index, "Font", "F", r)
    }

    /// Registered fonts in registration order.
    pub fn fonts(&self) -> impl Iterator<Item = (StandardFont, ObjectRef)> + '_ {
        self.fonts.iter().map(|(f, r)| (*f, *r))
    }

    // === Graphics State Management ===

    /// An ExtGState setting fill and stroke alpha to `opacity`.
    pub fn opacity_state(&mut self, doc: &mut PdfDocument, opacity: f64) -> ObjectRef {
        let key = opacity_key(opacity);
        *self.graphics_states.entry(key).or_insert_with(|| {
            let alpha = Object::number(key as f64 / 1000.0);
            doc.graph_mut().allocate(Object::dict(vec![
                ("Type", Object::name("ExtGState")),
                ("ca", alpha.clone()),
                ("CA", alpha),
            ]))
        })
    }

    /// Make an opacity state available on a page and return its name.
    pub fn page_opacity(&mut self, doc: &mut PdfDocument, page_index: usize, opacity: f64) -> Result<String> {
        let r = self.opacity_state(doc, opacity);
        doc.add_page_resource(page_index, "ExtGState", "GS", r)
    }

    /// Number of graphics states registered.
    pub fn graphics_state_count(&self) -> usize {
        self.graphics_states.len()
    }
}

fn opacity_key(opacity: f64) -> u32 {
    (opacity.clamp(0.0, 1.0) * 1000.0).round() as u32
}

/// A font dictionary that is exactly what [`StandardFont::font_dict`] makes.
fn reusable_font(dict: &crate::object::Dict) -> Option<StandardFont> {
    if dict.get("Subtype").and_then(|s| s.as_name()) != Some("Type1") {
        return None;
    }
    let font = StandardFont::from_name(dict.get("BaseFont")?.as_name()?)?;
    match font.font_dict() {
        Object::Dictionary(expected) if &expected == dict => Some(font),
        _ => None,
    }
}

fn reusable_opacity(dict: &crate::object::Dict) -> Option<u32> {
    if dict.len() != 3 {
        return None;
    }
    let fill = dict.get("ca")?.as_number()?;
    let stroke = dict.get("CA")?.as_number()?;
    (fill == stroke).then(|| opacity_key(fill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn doc() -> PdfDocument {
        let mut doc = PdfDocument::create_empty();
        doc.add_page(Rect::new(0.0, 0.0, 100.0, 100.0), Default::default(), Vec::new())
            .unwrap();
        doc.add_page(Rect::new(0.0, 0.0, 100.0, 100.0), Default::default(), Vec::new())
            .unwrap();
        doc
    }

    #[test]
    fn test_font_created_once() {
        let mut doc = doc();
        let mut rm = ResourceManager::new();
        let before = doc.graph().len();
        let a = rm.page_font(&mut doc, 0, StandardFont::Helvetica).unwrap();
        let b = rm.page_font(&mut doc, 1, StandardFont::Helvetica).unwrap();
        assert_eq!(a, "F1");
        assert_eq!(b, "F1");
        assert_eq!(doc.graph().len(), before + 1);
        assert_eq!(rm.fonts().count(), 1);
    }

    #[test]
    fn test_existing_resources_are_found() {
        let mut doc = doc();
        let mut first = ResourceManager::new();
        let font = first.font(&mut doc, StandardFont::TimesBold);
        let gs = first.opacity_state(&mut doc, 0.3);

        let mut second = ResourceManager::for_document(&doc);
        assert_eq!(second.font(&mut doc, StandardFont::TimesBold), font);
        assert_eq!(second.opacity_state(&mut doc, 0.3001), gs);
        assert_ne!(second.opacity_state(&mut doc, 0.5), gs);
        assert_eq!(second.graphics_state_count(), 2);
    }
}
