//! PDF writing.
//!
//! ## Architecture
//!
//! ```text
//! PdfDocument
//!     ↓
//! [PdfWriter] full rewrite          [IncrementalWriter] appended update
//!     ↓                                  ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes → re-parsed before being handed back
//! ```
//!
//! Content for new pages and stamps is produced with
//! [`ContentStreamBuilder`]; text uses the [`StandardFont`]s.
//!
//! ```
//! use pdf_graft::document::PdfDocument;
//! use pdf_graft::writer::{self, SaveOptions};
//!
//! let doc = PdfDocument::create_empty();
//! let bytes = writer::save(&doc, &SaveOptions::full_rewrite())?;
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! # Ok::<(), pdf_graft::error::Error>(())
//! ```

mod content_stream;
mod font_manager;
mod incremental;
mod object_serializer;
mod pdf_writer;

pub use content_stream::{encode_win_ansi, ContentStreamBuilder, ContentStreamOp};
pub use font_manager::StandardFont;
pub use incremental::IncrementalWriter;
pub use object_serializer::{write_name, write_real, write_string, ObjectSerializer};
pub use pdf_writer::PdfWriter;

use crate::document::PdfDocument;
use crate::error::{Error, Result};
use std::path::Path;

/// How a document is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Append an update to the loaded bytes instead of rewriting
    pub incremental: bool,
    /// Flate-compress streams that have no filter
    pub compress: bool,
    /// Leave out objects not reachable from the trailer (full rewrite only)
    pub garbage_collect: bool,
    /// Header version override (full rewrite only)
    pub version: Option<String>,
    /// Re-parse the output before returning it
    pub validate: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self::full_rewrite()
    }
}

impl SaveOptions {
    /// Rewrite the whole file, dropping unreachable objects.
    pub fn full_rewrite() -> Self {
        Self {
            incremental: false,
            compress: false,
            garbage_collect: true,
            version: None,
            validate: true,
        }
    }

    /// Append changed objects to the original bytes.
    pub fn incremental() -> Self {
        Self {
            incremental: true,
            garbage_collect: false,
            ..Self::full_rewrite()
        }
    }

    /// Enable stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Override the header version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Serialize with default options (full rewrite, validated).
pub fn serialize(doc: &PdfDocument) -> Result<Vec<u8>> {
    save(doc, &SaveOptions::default())
}

/// Serialize with explicit options.
///
/// With `validate` set (the default) the bytes are parsed again and the page
/// count compared; a mismatch or parse failure is reported as
/// [`Error::MalformedDocument`] and nothing is returned.
pub fn save(doc: &PdfDocument, options: &SaveOptions) -> Result<Vec<u8>> {
    let bytes = if options.incremental {
        IncrementalWriter::new(options.clone()).write(doc)?
    } else {
        PdfWriter::new(options.clone()).write(doc)?
    };
    if options.validate {
        verify_output(doc, &bytes)?;
    }
    Ok(bytes)
}

/// [`save`] to a file.
pub fn save_to_file(doc: &PdfDocument, path: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
    let bytes = save(doc, options)?;
    std::fs::write(path.as_ref(), &bytes)?;
    log::info!("saved {} bytes to {}", bytes.len(), path.as_ref().display());
    Ok(())
}

fn verify_output(doc: &PdfDocument, bytes: &[u8]) -> Result<()> {
    let expected = doc.page_count()?;
    let reparsed = crate::reader::parse(bytes).map_err(|e| {
        Error::malformed(
            match &e {
                Error::MalformedDocument { offset, .. } => *offset,
                _ => 0,
            },
            format!("written output does not parse: {}", e),
        )
    })?;
    let found = reparsed.page_count()?;
    if found != expected {
        return Err(Error::malformed(
            0,
            format!("written output has {} pages, expected {}", found, expected),
        ));
    }
    Ok(())
}
