//! Auto-fill engine

use crate::application::ApplicationData;
use crate::config::FillConfig;
use crate::registry::{PdfFieldMapping, Registry};
use crate::source::TemplateSource;
use crate::{FieldRenderError, Result, TemplateError};
use mapping::{Coordinate, KeyValueStore, MappingStore};
use pdf_core::{FontData, PdfDocument, PdfError};
use serde::Serialize;

/// Which mapping drove a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingSource {
    /// Coordinates the user placed with the mapping editor
    Saved,
    /// The static registry entry
    Registry,
}

/// Output of a fill
#[derive(Debug, Clone)]
pub struct FilledPdf {
    /// The serialized document
    pub bytes: Vec<u8>,
    pub source: MappingSource,
    /// Field ids that were drawn or set
    pub filled: Vec<String>,
    /// Field ids skipped because the data had no value
    pub skipped: Vec<String>,
    /// Fields that failed; the rest of the document is still filled
    pub errors: Vec<FieldRenderError>,
}

impl FilledPdf {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

enum Placement {
    Text(Coordinate),
    FormField(String),
}

struct ResolvedMapping {
    source: MappingSource,
    entries: Vec<(String, Placement)>,
}

/// Fills templates from saved mappings or the registry
///
/// Each call loads its own document, so one filler can serve concurrent
/// fills as long as its store backend allows shared reads.
pub struct AutoFiller<S> {
    store: MappingStore<S>,
    registry: Registry,
    config: FillConfig,
    font: Option<FontData>,
}

impl<S: KeyValueStore> AutoFiller<S> {
    pub fn new(store: MappingStore<S>, registry: Registry) -> Self {
        Self {
            store,
            registry,
            config: FillConfig::default(),
            font: None,
        }
    }

    pub fn with_config(mut self, config: FillConfig) -> Self {
        self.config = config;
        self
    }

    /// Draw coordinate text with an embedded TrueType font instead of Helvetica
    pub fn with_font(mut self, font: FontData) -> Self {
        self.font = Some(font);
        self
    }

    pub fn store(&self) -> &MappingStore<S> {
        &self.store
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &FillConfig {
        &self.config
    }

    /// Fill `template_bytes` with `data` using the mapping for `template_name`
    ///
    /// Fails with `MappingNotFound` before touching the bytes when no
    /// mapping exists, and with `TemplateLoad` when the bytes are not a
    /// readable PDF. Individual field failures are reported in
    /// [`FilledPdf::errors`].
    pub fn fill(
        &self,
        template_bytes: &[u8],
        template_name: &str,
        data: &ApplicationData,
    ) -> Result<FilledPdf> {
        let resolved = self.resolve(template_name)?;
        self.render(template_bytes, resolved, data)
    }

    /// Like [`AutoFiller::fill`], loading the template bytes from `source`
    pub fn fill_from_source<T: TemplateSource + ?Sized>(
        &self,
        source: &T,
        template_name: &str,
        data: &ApplicationData,
    ) -> Result<FilledPdf> {
        let resolved = self.resolve(template_name)?;
        let bytes = source.load(template_name)?;
        self.render(&bytes, resolved, data)
    }

    /// Which mapping source a fill of `template_name` would use
    pub fn mapping_source(&self, template_name: &str) -> Result<MappingSource> {
        self.resolve(template_name).map(|resolved| resolved.source)
    }

    fn resolve(&self, template_name: &str) -> Result<ResolvedMapping> {
        let resolved = if self.config.prefer_saved_mappings {
            self.resolve_saved(template_name)
                .or_else(|| self.resolve_registry(template_name))
        } else {
            self.resolve_registry(template_name)
                .or_else(|| self.resolve_saved(template_name))
        };

        match resolved {
            Some(resolved) => {
                log::debug!(
                    "filling {} from {:?} mapping ({} field(s))",
                    template_name,
                    resolved.source,
                    resolved.entries.len()
                );
                Ok(resolved)
            }
            None => Err(TemplateError::MappingNotFound(template_name.to_string())),
        }
    }

    fn resolve_saved(&self, template_name: &str) -> Option<ResolvedMapping> {
        let record = self.store.load(template_name)?;
        if record.is_empty() {
            return None;
        }

        let entries = record
            .fields
            .into_iter()
            .map(|m| (m.field_id, Placement::Text(m.coordinate)))
            .collect();

        Some(ResolvedMapping {
            source: MappingSource::Saved,
            entries,
        })
    }

    fn resolve_registry(&self, template_name: &str) -> Option<ResolvedMapping> {
        let mapping = self.registry.get(template_name)?;
        if mapping.is_empty() {
            return None;
        }

        let entries = match mapping {
            PdfFieldMapping::Acroform(fields) => fields
                .iter()
                .map(|(id, name)| (id.clone(), Placement::FormField(name.clone())))
                .collect(),
            PdfFieldMapping::Coordinate(fields) => fields
                .iter()
                .map(|(id, coord)| (id.clone(), Placement::Text(*coord)))
                .collect(),
        };

        Some(ResolvedMapping {
            source: MappingSource::Registry,
            entries,
        })
    }

    fn render(
        &self,
        template_bytes: &[u8],
        resolved: ResolvedMapping,
        data: &ApplicationData,
    ) -> Result<FilledPdf> {
        let mut doc = PdfDocument::open_from_bytes(template_bytes)
            .map_err(|e| TemplateError::TemplateLoad(e.to_string()))?;

        if let Some(font) = &self.font {
            doc.set_font(font.clone());
        }

        let mut filled = Vec::new();
        let mut skipped = Vec::new();
        let mut errors = Vec::new();

        for (field_id, placement) in resolved.entries {
            let Some(value) = data.get(&field_id) else {
                log::debug!("no value for {field_id}, skipping");
                skipped.push(field_id);
                continue;
            };

            let result = match &placement {
                Placement::Text(coord) => doc.insert_text(
                    value,
                    coord.page as usize,
                    coord.x,
                    coord.y,
                    self.config.font_size_or_default(coord.size),
                    self.config.color(),
                ),
                Placement::FormField(name) => doc.set_text_field(name, value),
            };

            match result {
                Ok(()) => filled.push(field_id),
                Err(e) => {
                    if let PdfError::FormFieldNotFound(name) = &e {
                        log::warn!("form field {name} not found for {field_id}, continuing");
                    } else {
                        log::warn!("failed to render {field_id}: {e}");
                    }
                    errors.push(FieldRenderError {
                        field_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let bytes = doc.to_bytes()?;

        Ok(FilledPdf {
            bytes,
            source: resolved.source,
            filled,
            skipped,
            errors,
        })
    }
}
