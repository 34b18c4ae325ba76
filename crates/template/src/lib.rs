//! Template - field-mapping registry and auto-fill engine
//!
//! This crate provides:
//! - The static template registry (acroform vs coordinate placement)
//! - The application data record rendered into templates
//! - Template byte sources (directory, in-memory bundle)
//! - The auto-fill engine producing filled PDF bytes
//!
//! # Example
//!
//! ```ignore
//! use mapping::{MappingStore, MemoryStore};
//! use template::{ApplicationData, AutoFiller, Registry};
//!
//! let filler = AutoFiller::new(MappingStore::new(MemoryStore::new()), Registry::builtin()?);
//! let data = ApplicationData {
//!     child_name: Some("Hana Hanada".into()),
//!     ..Default::default()
//! };
//! let filled = filler.fill(&template_bytes, "temporary_care_application", &data)?;
//! std::fs::write("filled.pdf", &filled.bytes)?;
//! ```

mod application;
mod config;
mod filler;
mod registry;
mod source;

pub use application::{ApplicationData, APPLICATION_FIELDS};
pub use config::FillConfig;
pub use filler::{AutoFiller, FilledPdf, MappingSource};
pub use registry::{PdfFieldMapping, Registry, REGISTRY_JSON};
pub use source::{BytesTemplateSource, FileTemplateSource, TemplateSource};

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while resolving mappings or filling a template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Could not read template: {0}")]
    TemplateLoad(String),

    #[error("No mapping configured for template '{0}' - configure it first")]
    MappingNotFound(String),

    #[error("Invalid template registry: {0}")]
    InvalidRegistry(String),

    #[error("Internal rendering failure: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single field that could not be drawn or set during a fill
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("field '{field_id}': {reason}")]
pub struct FieldRenderError {
    pub field_id: String,
    pub reason: String,
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
