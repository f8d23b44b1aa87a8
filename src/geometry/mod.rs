//! Geometric primitives and the UI-to-PDF coordinate mapping.
//!
//! PDF user space has its origin at the bottom-left of the page with y
//! growing upwards. UI surfaces place things from the top-left with y
//! growing downwards. [`ui_to_pdf`] is the only place that converts between
//! the two.

use crate::object::Object;
use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle: lower-left corner plus size in PDF space, or
/// top-left corner plus size in UI space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the origin corner
    pub x: f64,
    /// Y coordinate of the origin corner
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from position and dimensions.
    ///
    /// ```
    /// use pdf_graft::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 612.0, 792.0);
    /// assert_eq!(rect.top(), 792.0);
    /// ```
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two opposite corners in any order.
    ///
    /// ```
    /// use pdf_graft::geometry::Rect;
    ///
    /// let rect = Rect::from_points(110.0, 70.0, 10.0, 20.0);
    /// assert_eq!(rect, Rect::new(10.0, 20.0, 100.0, 50.0));
    /// ```
    pub fn from_points(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Read a PDF rectangle array `[llx lly urx ury]`.
    pub fn from_object(obj: &Object) -> Option<Self> {
        obj.as_rect().map(|[a, b, c, d]| Self::from_points(a, b, c, d))
    }

    /// The PDF rectangle array for this rectangle.
    pub fn to_object(&self) -> Object {
        Object::rect(self.x, self.y, self.right(), self.top())
    }

    /// Left edge.
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (PDF space).
    pub fn bottom(&self) -> f64 {
        self.y
    }

    /// Top edge (PDF space).
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// Center point.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether both dimensions are strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.bottom() >= self.bottom()
            && other.top() <= self.top()
    }
}

/// Common page sizes in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PageSize {
    /// US Letter, 612 x 792
    #[default]
    Letter,
    /// US Legal, 612 x 1008
    Legal,
    /// ISO A4, 595 x 842
    A4,
    /// ISO A5, 420 x 595
    A5,
    /// Explicit width and height
    Custom(f64, f64),
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::A5 => (420.0, 595.0),
            PageSize::Custom(w, h) => (w, h),
        }
    }

    /// The page rectangle anchored at the origin.
    pub fn rect(self) -> Rect {
        let (w, h) = self.dimensions();
        Rect::new(0.0, 0.0, w, h)
    }
}

/// What a placement represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementKind {
    /// Full signature
    Signature,
    /// Initials
    Initials,
    /// A date string
    Date,
    /// Free text
    Text,
}

/// A user-placed box of text in top-left-origin UI coordinates.
///
/// ```
/// use pdf_graft::geometry::{Placement, PlacementKind};
///
/// let json = r#"{"id":"p1","kind":"date","value":"2024-05-01",
///                "page_index":0,"x":50,"y":40,"width":120,"height":20}"#;
/// let p: Placement = serde_json::from_str(json).unwrap();
/// assert_eq!(p.kind, PlacementKind::Date);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Caller-chosen identifier
    pub id: String,
    /// Kind of content
    pub kind: PlacementKind,
    /// Text to draw
    pub value: String,
    /// Zero-based page index
    pub page_index: usize,
    /// Left edge, from the left of the page
    pub x: f64,
    /// Top edge, from the top of the page
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl Placement {
    /// The box in UI space.
    pub fn ui_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Convert a top-left-origin UI box to a PDF-space box on `page`.
///
/// `pdf_y = page_height - ui_y - box_height`, shifted by the page origin
/// when the page box does not start at zero.
///
/// ```
/// use pdf_graft::geometry::{ui_to_pdf, Rect};
///
/// let page = Rect::new(0.0, 0.0, 612.0, 792.0);
/// let pdf = ui_to_pdf(Rect::new(72.0, 100.0, 200.0, 50.0), page);
/// assert_eq!(pdf, Rect::new(72.0, 642.0, 200.0, 50.0));
/// ```
pub fn ui_to_pdf(ui: Rect, page: Rect) -> Rect {
    Rect::new(
        page.x + ui.x,
        page.y + page.height - ui.y - ui.height,
        ui.width,
        ui.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_object_roundtrip() {
        let r = Rect::new(10.0, 20.0, 300.5, 400.0);
        assert_eq!(Rect::from_object(&r.to_object()), Some(r));
        assert_eq!(Rect::from_object(&Object::Integer(1)), None);
    }

    #[test]
    fn test_rect_validity() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 5.0, -1.0).is_valid());
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains(&Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains(&Rect::new(90.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn test_ui_to_pdf_corners() {
        let page = PageSize::Letter.rect();
        // Top-left box touches the top edge.
        let top = ui_to_pdf(Rect::new(0.0, 0.0, 100.0, 40.0), page);
        assert_eq!(top.top(), 792.0);
        // Bottom box touches y = 0.
        let bottom = ui_to_pdf(Rect::new(0.0, 752.0, 100.0, 40.0), page);
        assert_eq!(bottom.bottom(), 0.0);
    }

    #[test]
    fn test_ui_to_pdf_offset_origin() {
        let page = Rect::new(50.0, 100.0, 500.0, 700.0);
        let pdf = ui_to_pdf(Rect::new(10.0, 10.0, 20.0, 30.0), page);
        assert_eq!(pdf, Rect::new(60.0, 760.0, 20.0, 30.0));
    }

    #[test]
    fn test_placement_serde() {
        let p = Placement {
            id: "sig".into(),
            kind: PlacementKind::Signature,
            value: "J. Doe".into(),
            page_index: 2,
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"kind\":\"signature\""));
        let back: Placement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
