//! Mapping - field placement model, persistence and editing
//!
//! This crate provides:
//! - The field catalog and the coordinate-based mapping model
//! - A key-value persistence port with in-memory and filesystem backends
//! - The mapping store (save / load / delete / list per template name)
//! - The interactive mapping editor session
//!
//! # Example
//!
//! ```ignore
//! use mapping::{MappingEditor, MappingStore, MemoryStore};
//!
//! let store = MappingStore::new(MemoryStore::new());
//! let mut editor = MappingEditor::open("temporary_care_application", &store);
//! editor.select_field(catalog.get("childName").unwrap().clone());
//! editor.place_at(200.0, 720.0);
//! editor.save(&store)?;
//! ```

mod editor;
mod model;
mod store;

pub use editor::{EditorConfig, EditorState, MappingEditor, PreviewTransform};
pub use model::{
    upsert_mapping, Coordinate, DataField, FieldCatalog, FieldMapping, PdfMappingData,
    DEFAULT_FONT_SIZE,
};
pub use store::{FileStore, KeyValueStore, MappingStore, MemoryStore, DEFAULT_KEY_PREFIX};

use thiserror::Error;

/// Errors that can occur while storing or editing mappings
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Template name must not be empty")]
    InvalidTemplateName,

    #[error("Mapping for {0} has a non-finite coordinate or font size")]
    InvalidCoordinate(String),

    #[error("Duplicate field id in catalog: {0}")]
    DuplicateField(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, MappingError>;
