//! Field catalog and mapping data model

use crate::{MappingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Font size used when a placement does not specify one
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

/// A named data field available for placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    /// Identifier, unique within a catalog
    pub id: String,
    /// Display name
    pub label: String,
    /// Current bound value
    #[serde(default)]
    pub value: String,
}

impl DataField {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The set of data fields a user can place on a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    fields: Vec<DataField>,
}

impl FieldCatalog {
    /// Build a catalog, rejecting duplicate ids
    pub fn new(fields: Vec<DataField>) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.id == field.id) {
                return Err(MappingError::DuplicateField(field.id.clone()));
            }
        }
        Ok(Self { fields })
    }

    pub fn get(&self, id: &str) -> Option<&DataField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Collects fields, dropping any whose id was already seen
impl FromIterator<DataField> for FieldCatalog {
    fn from_iter<I: IntoIterator<Item = DataField>>(iter: I) -> Self {
        let mut fields: Vec<DataField> = Vec::new();
        for field in iter {
            if !fields.iter().any(|f| f.id == field.id) {
                fields.push(field);
            }
        }
        Self { fields }
    }
}

/// A position on a template page
///
/// `x`/`y` are page-space points with the origin at the bottom-left corner;
/// `page` is a zero-based page index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_font_size")]
    pub size: f32,
}

impl Coordinate {
    /// Coordinate with the default font size
    pub fn new(x: f64, y: f64, page: u32) -> Self {
        Self {
            x,
            y,
            page,
            size: DEFAULT_FONT_SIZE,
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Whether position and size are all finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.size.is_finite()
    }
}

/// Association between a data field and a coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub field_id: String,
    /// Denormalized copy of the field label for display
    pub field_label: String,
    pub coordinate: Coordinate,
}

impl FieldMapping {
    pub fn new(field: &DataField, coordinate: Coordinate) -> Self {
        Self {
            field_id: field.id.clone(),
            field_label: field.label.clone(),
            coordinate,
        }
    }
}

/// Persisted mapping set for one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfMappingData {
    pub template_name: String,
    pub fields: Vec<FieldMapping>,
    pub last_updated: DateTime<Utc>,
}

impl PdfMappingData {
    pub fn new(template_name: impl Into<String>, fields: Vec<FieldMapping>) -> Self {
        Self {
            template_name: template_name.into(),
            fields,
            last_updated: Utc::now(),
        }
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|m| m.field_id == field_id)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Insert a mapping, replacing any existing entry for the same field in place
///
/// Returns the index the mapping ended up at.
pub fn upsert_mapping(mappings: &mut Vec<FieldMapping>, mapping: FieldMapping) -> usize {
    match mappings.iter().position(|m| m.field_id == mapping.field_id) {
        Some(index) => {
            mappings[index] = mapping;
            index
        }
        None => {
            mappings.push(mapping);
            mappings.len() - 1
        }
    }
}
