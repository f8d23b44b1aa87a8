// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

//! # PDF Graft
//!
//! A PDF object model with a copy-on-write mutation engine: parse a file,
//! merge, split, reorder, rotate, crop, stamp text, add or remove password
//! protection, and write the result back as a full rewrite or an
//! incremental update.
//!
//! ## Core Features
//!
//! ### Reading
//! - **Cross-reference**: classic tables and xref streams, `/Prev` chains,
//!   scan-based reconstruction of damaged files
//! - **Object streams**: expanded on load so the graph only holds plain objects
//! - **Encryption**: Standard security handler, RC4 40/128 and AES-128
//!
//! ### Editing
//! - **Page sets**: merge, split/extract/burst, organize, delete
//! - **Page properties**: rotation and crop boxes
//! - **Stamping**: free text, watermarks, page numbers, UI placements
//! - **Security**: protect and unlock
//! - **Images**: JPEG to PDF
//!
//! ### Writing
//! - **Deterministic output**: ascending object numbers, sorted keys
//! - **Incremental saves**: only changed objects are appended
//! - **Validation**: every output is parsed again before it is returned
//!
//! ## Architecture
//!
//! ```text
//! bytes → reader → ObjectGraph → PdfDocument → editor op → PdfDocument → writer → bytes
//! ```
//!
//! Editor operations never modify their inputs. A document is only ever
//! changed through `&mut` access by its single owner.
//!
//! ## Quick Start
//!
//! ```
//! use pdf_graft::geometry::Rect;
//! use pdf_graft::{merge, parse, serialize, split, PdfDocument};
//!
//! let mut a = PdfDocument::create_empty();
//! a.add_page(Rect::new(0.0, 0.0, 612.0, 792.0), Default::default(), Vec::new())?;
//! let b = a.clone();
//!
//! let merged = merge(&[a, b])?;
//! let bytes = serialize(&merged)?;
//! let reopened = parse(&bytes)?;
//! assert_eq!(reopened.page_count()?, 2);
//!
//! let first = split(&reopened, "1")?;
//! assert_eq!(first.page_count()?, 1);
//! # Ok::<(), pdf_graft::Error>(())
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Object model
pub mod graph;
pub mod object;

// Core PDF parsing
pub mod lexer;
pub mod objstm;
pub mod parser;
/// Parser configuration options
pub mod parser_config;
pub mod reader;
pub mod xref;
pub mod xref_reconstruction;

// Stream decoders
pub mod decoders;

// Encryption support
pub mod encryption;

// Document model
pub mod document;
pub mod geometry;
pub mod info;
pub mod page;

// Mutation operations
pub mod editor;

// PDF writing
pub mod writer;

// Configuration
pub mod config;

// Injected rendering/OCR/diff services
pub mod collaborators;

// Re-exports
pub use document::{EncryptionState, PdfDocument};
pub use editor::{
    apply_placements, burst, crop, delete_pages, extract_pages, images_to_pdf, merge, number_pages, organize,
    parse_page_ranges, protect, reorder, rotate, split, split_into_ranges, stamp_text, unlock, watermark,
};
pub use error::{Error, ErrorCategory, Result};
pub use object::{Object, ObjectRef};
pub use page::Page;
pub use reader::{parse, parse_file, parse_with_password};
pub use writer::{save, save_to_file, serialize, SaveOptions};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
