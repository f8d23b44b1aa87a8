//! PDF content stream builder.
//!
//! Produces the operator sequences used for stamping: graphics state
//! save/restore, transforms, text objects, fills and XObject painting.

use super::object_serializer::write_real;
use crate::error::Result;
use std::io::Write;

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate matrix (cm)
    Transform(f64, f64, f64, f64, f64, f64),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font resource and size (Tf)
    SetFont(String, f64),
    /// Set text matrix (Tm)
    SetTextMatrix(f64, f64, f64, f64, f64, f64),
    /// Show text (Tj), already encoded for the font
    ShowText(Vec<u8>),
    /// Set fill color RGB (rg)
    SetFillColorRGB(f64, f64, f64),
    /// Set stroke color RGB (RG)
    SetStrokeColorRGB(f64, f64, f64),
    /// Rectangle (re)
    Rectangle(f64, f64, f64, f64),
    /// Fill (f)
    Fill,
    /// Stroke (S)
    Stroke,
    /// Set graphics state from an ExtGState resource (gs)
    SetExtGState(String),
    /// Paint XObject (Do)
    PaintXObject(String),
}

/// Builder for PDF content streams.
#[derive(Debug, Clone, Default)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
    in_text: bool,
}

impl ContentStreamBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw operation.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Begin a text object if one is not already open.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text {
            self.operations.push(ContentStreamOp::BeginText);
            self.in_text = true;
        }
        self
    }

    /// End the current text object, if any.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text {
            self.operations.push(ContentStreamOp::EndText);
            self.in_text = false;
        }
        self
    }

    /// Select a font resource.
    pub fn set_font(&mut self, resource_name: &str, size: f64) -> &mut Self {
        self.op(ContentStreamOp::SetFont(resource_name.to_string(), size))
    }

    /// Place text at `(x, y)` rotated counter-clockwise by `degrees`.
    pub fn text_at(&mut self, text: &str, x: f64, y: f64, degrees: f64) -> &mut Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.begin_text();
        self.op(ContentStreamOp::SetTextMatrix(cos, sin, -sin, cos, x, y));
        self.op(ContentStreamOp::ShowText(encode_win_ansi(text)))
    }

    /// Set the RGB fill color (components in 0..=1).
    pub fn set_fill_color(&mut self, r: f64, g: f64, b: f64) -> &mut Self {
        self.op(ContentStreamOp::SetFillColorRGB(r, g, b))
    }

    /// Set the RGB stroke color (components in 0..=1).
    pub fn set_stroke_color(&mut self, r: f64, g: f64, b: f64) -> &mut Self {
        self.op(ContentStreamOp::SetStrokeColorRGB(r, g, b))
    }

    /// Append a rectangle path.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(x, y, width, height))
    }

    /// Fill the current path.
    pub fn fill(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Fill)
    }

    /// Stroke the current path.
    pub fn stroke(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Stroke)
    }

    /// Save graphics state.
    pub fn save_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::SaveState)
    }

    /// Restore graphics state.
    pub fn restore_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::RestoreState)
    }

    /// Apply an ExtGState resource.
    pub fn set_ext_gstate(&mut self, resource_name: &str) -> &mut Self {
        self.op(ContentStreamOp::SetExtGState(resource_name.to_string()))
    }

    /// Concatenate a transformation matrix.
    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> &mut Self {
        self.op(ContentStreamOp::Transform(a, b, c, d, e, f))
    }

    /// Paint an image scaled into the rectangle `(x, y, width, height)`.
    pub fn draw_image(&mut self, resource_name: &str, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.save_state()
            .transform(width, 0.0, 0.0, height, x, y)
            .op(ContentStreamOp::PaintXObject(resource_name.to_string()))
            .restore_state()
    }

    /// Operations added so far.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.operations
    }

    /// Serialize to content stream bytes, closing an open text object.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for op in &self.operations {
            write_op(&mut buf, op)?;
            buf.push(b'\n');
        }
        if self.in_text {
            writeln!(buf, "ET")?;
        }
        Ok(buf)
    }
}

fn num(value: f64) -> String {
    let mut buf = Vec::new();
    write_real(&mut buf, value);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_op<W: Write>(w: &mut W, op: &ContentStreamOp) -> std::io::Result<()> {
    match op {
        ContentStreamOp::SaveState => write!(w, "q"),
        ContentStreamOp::RestoreState => write!(w, "Q"),
        ContentStreamOp::Transform(a, b, c, d, e, f)
        | ContentStreamOp::SetTextMatrix(a, b, c, d, e, f) => {
            let operator = if matches!(op, ContentStreamOp::Transform(..)) {
                "cm"
            } else {
                "Tm"
            };
            write!(
                w,
                "{} {} {} {} {} {} {}",
                num(*a),
                num(*b),
                num(*c),
                num(*d),
                num(*e),
                num(*f),
                operator
            )
        },
        ContentStreamOp::BeginText => write!(w, "BT"),
        ContentStreamOp::EndText => write!(w, "ET"),
        ContentStreamOp::SetFont(name, size) => write!(w, "/{} {} Tf", name, num(*size)),
        ContentStreamOp::ShowText(bytes) => {
            write!(w, "(")?;
            write_escaped(w, bytes)?;
            write!(w, ") Tj")
        },
        ContentStreamOp::SetFillColorRGB(r, g, b) => write!(w, "{} {} {} rg", num(*r), num(*g), num(*b)),
        ContentStreamOp::SetStrokeColorRGB(r, g, b) => {
            write!(w, "{} {} {} RG", num(*r), num(*g), num(*b))
        },
        ContentStreamOp::Rectangle(x, y, width, height) => {
            write!(w, "{} {} {} {} re", num(*x), num(*y), num(*width), num(*height))
        },
        ContentStreamOp::Fill => write!(w, "f"),
        ContentStreamOp::Stroke => write!(w, "S"),
        ContentStreamOp::SetExtGState(name) => write!(w, "/{} gs", name),
        ContentStreamOp::PaintXObject(name) => write!(w, "/{} Do", name),
    }
}

fn write_escaped<W: Write>(w: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => w.write_all(&[b'\\', b])?,
            b'\n' => w.write_all(b"\\n")?,
            b'\r' => w.write_all(b"\\r")?,
            0x20..=0x7E => w.write_all(&[b])?,
            _ => write!(w, "\\{:03o}", b)?,
        }
    }
    Ok(())
}

/// Encode text for a simple font using WinAnsiEncoding.
///
/// Latin-1 characters map directly, a handful of common typographic
/// characters use their 0x80-0x9F slots, and anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_block() {
        let mut b = ContentStreamBuilder::new();
        b.save_state()
            .set_fill_color(1.0, 0.0, 0.0)
            .begin_text()
            .set_font("F1", 12.0)
            .text_at("Hi (there)", 72.0, 700.5, 0.0)
            .end_text()
            .restore_state();
        let out = String::from_utf8(b.build().unwrap()).unwrap();
        assert_eq!(
            out,
            "q\n1 0 0 rg\nBT\n/F1 12 Tf\n1 0 0 1 72 700.5 Tm\n(Hi \\(there\\)) Tj\nET\nQ\n"
        );
    }

    #[test]
    fn test_rotated_text_matrix() {
        let mut b = ContentStreamBuilder::new();
        b.text_at("x", 10.0, 20.0, 90.0);
        match &b.operations()[1] {
            ContentStreamOp::SetTextMatrix(a, bb, c, d, e, f) => {
                assert!(a.abs() < 1e-9 && (bb - 1.0).abs() < 1e-9);
                assert!((c + 1.0).abs() < 1e-9 && d.abs() < 1e-9);
                assert_eq!((*e, *f), (10.0, 20.0));
            },
            other => panic!("unexpected op {:?}", other),
        }
        // Open text objects are closed on build.
        assert!(String::from_utf8(b.build().unwrap()).unwrap().ends_with("ET\n"));
    }

    #[test]
    fn test_image_and_rect() {
        let mut b = ContentStreamBuilder::new();
        b.draw_image("Im1", 0.0, 0.0, 200.0, 100.0).rect(1.0, 2.0, 3.0, 4.0).fill();
        let out = String::from_utf8(b.build().unwrap()).unwrap();
        assert_eq!(out, "q\n200 0 0 100 0 0 cm\n/Im1 Do\nQ\n1 2 3 4 re\nf\n");
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(encode_win_ansi("A\u{e9}\u{20ac}\u{4e2d}"), vec![b'A', 0xE9, 0x80, b'?']);
        let mut out = Vec::new();
        write_escaped(&mut out, &[0xE9]).unwrap();
        assert_eq!(out, b"\\351");
    }
}
