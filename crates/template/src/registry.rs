//! Static template field-mapping registry

use crate::application::ApplicationData;
use crate::{Result, TemplateError};
use indexmap::IndexMap;
use mapping::Coordinate;
use serde::{Deserialize, Serialize};

/// Registry bundled with the crate
pub const REGISTRY_JSON: &str = include_str!("../data/registry.json");

/// How a template's fields are placed
///
/// The JSON form is `{"type": "acroform" | "coordinate", "fields": {...}}`.
/// A value that does not match the declared type fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "fields", rename_all = "lowercase")]
pub enum PdfFieldMapping {
    /// Logical field name -> AcroForm field name
    Acroform(IndexMap<String, String>),
    /// Logical field name -> absolute text position
    Coordinate(IndexMap<String, Coordinate>),
}

impl PdfFieldMapping {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Acroform(_) => "acroform",
            Self::Coordinate(_) => "coordinate",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Acroform(fields) => fields.len(),
            Self::Coordinate(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical field names in declaration order
    pub fn field_ids(&self) -> Vec<&str> {
        match self {
            Self::Acroform(fields) => fields.keys().map(String::as_str).collect(),
            Self::Coordinate(fields) => fields.keys().map(String::as_str).collect(),
        }
    }

    fn validate(&self, template_name: &str) -> Result<()> {
        let invalid =
            |reason: String| TemplateError::InvalidRegistry(format!("{template_name}: {reason}"));

        if self.is_empty() {
            return Err(invalid("no fields declared".to_string()));
        }

        for field_id in self.field_ids() {
            if !ApplicationData::is_known_field(field_id) {
                return Err(invalid(format!("unknown field '{field_id}'")));
            }
        }

        match self {
            Self::Acroform(fields) => {
                for (field_id, form_name) in fields {
                    if form_name.trim().is_empty() {
                        return Err(invalid(format!("empty form field name for '{field_id}'")));
                    }
                }
            }
            Self::Coordinate(fields) => {
                for (field_id, coord) in fields {
                    let position_ok = coord.x.is_finite()
                        && coord.y.is_finite()
                        && coord.x >= 0.0
                        && coord.y >= 0.0;
                    if !position_ok {
                        return Err(invalid(format!(
                            "invalid position ({}, {}) for '{field_id}'",
                            coord.x, coord.y
                        )));
                    }
                    if !(coord.size.is_finite() && coord.size > 0.0) {
                        return Err(invalid(format!(
                            "invalid font size {} for '{field_id}'",
                            coord.size
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Template name -> placement strategy, fixed at load time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    templates: IndexMap<String, PdfFieldMapping>,
}

impl Registry {
    /// The registry bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(REGISTRY_JSON)
    }

    /// Parse and validate a registry document
    pub fn from_json(json: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(json)
            .map_err(|e| TemplateError::InvalidRegistry(e.to_string()))?;
        registry.validate()?;
        Ok(registry)
    }

    /// Check every entry; called by [`Registry::from_json`]
    pub fn validate(&self) -> Result<()> {
        for (name, mapping) in &self.templates {
            if name.trim().is_empty() {
                return Err(TemplateError::InvalidRegistry(
                    "empty template name".to_string(),
                ));
            }
            mapping.validate(name)?;
        }
        Ok(())
    }

    pub fn get(&self, template_name: &str) -> Option<&PdfFieldMapping> {
        self.templates.get(template_name)
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
