//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Opening PDF templates from bytes and saving them back to bytes
//! - Drawing text at absolute page coordinates (origin bottom-left)
//! - Embedding a TrueType font for non-Latin text
//! - Looking up and filling AcroForm text fields by name
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, PdfDocument};
//!
//! let mut doc = PdfDocument::open_from_bytes(&template_bytes)?;
//! doc.insert_text("Hana Hanada", 0, 200.0, 720.0, 12.0, Color::black())?;
//! doc.set_text_field("guardian_name", "Taro Hanada")?;
//! let filled = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod form;
mod text;

pub use document::{Color, PdfDocument};
pub use font::{FontData, STANDARD_FONT};
pub use form::{encode_text_string, FormField};
pub use text::{encode_win_ansi, generate_text_operators, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid page index: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Form field not found: {0}")]
    FormFieldNotFound(String),

    #[error("Form field is not a text field: {0}")]
    NotATextField(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
