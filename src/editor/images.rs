//! JPEG to PDF conversion.
//!
//! JPEG data is embedded as-is under `/DCTDecode`; only the frame header
//! is read, to learn the dimensions and the number of components.

use crate::document::PdfDocument;
use crate::error::{Error, Result};
use crate::geometry::{PageSize, Rect};
use crate::object::{Dict, Object};
use crate::writer::ContentStreamBuilder;
use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

/// What the frame header of a JPEG says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JpegInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Color components: 1 (gray), 3 (RGB/YCbCr) or 4 (CMYK)
    pub components: u8,
    /// Sample precision
    pub bits_per_component: u8,
}

impl JpegInfo {
    fn color_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

/// Read the SOF header of a baseline or progressive JPEG.
///
/// Anything that is not a JPEG, or a JPEG whose frame header cannot be
/// found, is a [`Error::Validation`] error.
pub fn jpeg_info(data: &[u8]) -> Result<JpegInfo> {
    let invalid = |reason: &str| Error::Validation(format!("not a usable JPEG image: {}", reason));
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(invalid("missing SOI marker"));
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        pos += 2;
        match marker {
            // Fill bytes and stuffed zeros
            0xFF | 0x00 => continue,
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => break,
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                if pos + 8 > data.len() {
                    return Err(invalid("truncated frame header"));
                }
                let info = JpegInfo {
                    bits_per_component: data[pos + 2],
                    height: BigEndian::read_u16(&data[pos + 3..]) as u32,
                    width: BigEndian::read_u16(&data[pos + 5..]) as u32,
                    components: data[pos + 7],
                };
                if info.width == 0 || info.height == 0 {
                    return Err(invalid("zero-sized frame"));
                }
                if !matches!(info.components, 1 | 3 | 4) {
                    return Err(invalid("unsupported component count"));
                }
                return Ok(info);
            },
            _ => {
                if pos + 2 > data.len() {
                    break;
                }
                pos += BigEndian::read_u16(&data[pos..]) as usize;
            },
        }
    }
    Err(invalid("no frame header"))
}

/// How each image is laid out on its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ImageFit {
    /// The page takes the image's size, one point per pixel.
    #[default]
    Actual,
    /// Fixed-size pages; the image is centered and scaled down to fit
    /// inside the margin, never up.
    Fit {
        /// Page size
        page_size: PageSize,
        /// Margin on every side, in points
        margin: f64,
    },
}

/// Settings for [`images_to_pdf`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImagesToPdfOptions {
    /// Page layout
    pub fit: ImageFit,
}

/// One page per JPEG, in the order given.
pub fn images_to_pdf<B: AsRef<[u8]>>(jpegs: &[B], options: &ImagesToPdfOptions) -> Result<PdfDocument> {
    if jpegs.is_empty() {
        return Err(Error::Validation("no images given".to_string()));
    }
    if let ImageFit::Fit { page_size, margin } = options.fit {
        let (w, h) = page_size.dimensions();
        if margin < 0.0 || w - 2.0 * margin <= 0.0 || h - 2.0 * margin <= 0.0 {
            return Err(Error::Validation(format!(
                "margin {} leaves no room on a {}x{} page",
                margin, w, h
            )));
        }
    }
    let infos = jpegs
        .iter()
        .enumerate()
        .map(|(i, data)| {
            jpeg_info(data.as_ref()).map_err(|e| match e {
                Error::Validation(reason) => Error::Validation(format!("image {}: {}", i + 1, reason)),
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut doc = PdfDocument::create_empty();
    for (data, info) in jpegs.iter().zip(&infos) {
        let (page, placed) = layout(info, options.fit);
        let image = doc.graph_mut().allocate(image_xobject(data.as_ref(), info));

        let mut resources = Dict::new();
        resources.insert("XObject".to_string(), Object::dict(vec![("Im1", Object::Reference(image))]));
        let content = ContentStreamBuilder::new()
            .draw_image("Im1", placed.x, placed.y, placed.width, placed.height)
            .build()?;
        doc.add_page(page, resources, content)?;
    }
    log::info!("converted {} images to PDF", infos.len());
    Ok(doc)
}

fn image_xobject(data: &[u8], info: &JpegInfo) -> Object {
    let mut dict = Dict::new();
    dict.insert("Type".to_string(), Object::name("XObject"));
    dict.insert("Subtype".to_string(), Object::name("Image"));
    dict.insert("Width".to_string(), Object::Integer(info.width as i64));
    dict.insert("Height".to_string(), Object::Integer(info.height as i64));
    dict.insert("ColorSpace".to_string(), Object::name(info.color_space()));
    dict.insert("BitsPerComponent".to_string(), Object::Integer(info.bits_per_component as i64));
    dict.insert("Filter".to_string(), Object::name("DCTDecode"));
    if info.components == 4 {
        // Adobe CMYK JPEGs store inverted samples.
        let decode = (0..4).flat_map(|_| [Object::Integer(1), Object::Integer(0)]).collect();
        dict.insert("Decode".to_string(), Object::Array(decode));
    }
    Object::stream(dict, data.to_vec())
}

/// The page box and where the image goes on it.
fn layout(info: &JpegInfo, fit: ImageFit) -> (Rect, Rect) {
    let (w, h) = (info.width as f64, info.height as f64);
    match fit {
        ImageFit::Actual => {
            let page = Rect::new(0.0, 0.0, w, h);
            (page, page)
        },
        ImageFit::Fit { page_size, margin } => {
            let page = page_size.rect();
            let scale = ((page.width - 2.0 * margin) / w)
                .min((page.height - 2.0 * margin) / h)
                .min(1.0);
            let (sw, sh) = (w * scale, h * scale);
            let placed = Rect::new((page.width - sw) / 2.0, (page.height - sh) / 2.0, sw, sh);
            (page, placed)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest marker sequence `jpeg_info` accepts: SOI, an APP0 segment,
    /// SOF0 and EOI. No scan data, which is fine for embedding tests.
    fn fake_jpeg(width: u16, height: u16, components: u8) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x06, b'J', b'F', b'I', b'F']);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08]);
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&[components, 0x01, 0x11, 0x00]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_jpeg_info() {
        let info = jpeg_info(&fake_jpeg(640, 480, 3)).unwrap();
        assert_eq!((info.width, info.height, info.components), (640, 480, 3));
        assert_eq!(info.bits_per_component, 8);
    }

    #[test]
    fn test_not_a_jpeg() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert!(matches!(jpeg_info(png), Err(Error::Validation(_))));
        assert!(matches!(jpeg_info(&[0xFF, 0xD8, 0xFF, 0xD9]), Err(Error::Validation(_))));
        assert!(images_to_pdf(&[png.to_vec()], &Default::default()).is_err());
        assert!(images_to_pdf::<Vec<u8>>(&[], &Default::default()).is_err());
    }

    #[test]
    fn test_page_sized_to_image() {
        let doc = images_to_pdf(&[fake_jpeg(300, 200, 1), fake_jpeg(50, 80, 4)], &Default::default()).unwrap();
        assert_eq!(doc.page_count().unwrap(), 2);
        assert_eq!(doc.page(0).unwrap().media_box(), Rect::new(0.0, 0.0, 300.0, 200.0));
        let content = String::from_utf8(doc.page_content(0).unwrap()).unwrap();
        assert!(content.contains("300 0 0 200 0 0 cm"));
        assert!(content.contains("/Im1 Do"));
        doc.graph().validate().unwrap();
    }

    #[test]
    fn test_fit_scales_down_and_centers() {
        let options = ImagesToPdfOptions {
            fit: ImageFit::Fit {
                page_size: PageSize::Custom(200.0, 200.0),
                margin: 10.0,
            },
        };
        let doc = images_to_pdf(&[fake_jpeg(360, 90, 3)], &options).unwrap();
        let content = String::from_utf8(doc.page_content(0).unwrap()).unwrap();
        // 180 / 360 = 0.5, so the image is 180 x 45 at (10, 77.5).
        assert!(content.contains("180 0 0 45 10 77.5 cm"));

        let bad = ImagesToPdfOptions {
            fit: ImageFit::Fit {
                page_size: PageSize::Custom(200.0, 200.0),
                margin: 100.0,
            },
        };
        assert!(matches!(images_to_pdf(&[fake_jpeg(1, 1, 3)], &bad), Err(Error::Validation(_))));
    }
}
