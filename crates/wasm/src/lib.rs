//! WASM bindings for hoiku-forms
//!
//! This crate provides JavaScript-friendly API for:
//! - Editing field mappings for a template (persisted in localStorage)
//! - Auto-filling a template with application data
//! - Building the field catalog shown in the editor
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { PdfMappingEditor, autoFill, fieldCatalog } from 'hoiku-wasm';
//!
//! await init();
//!
//! const editor = new PdfMappingEditor('temporary_care_application');
//! editor.setPageCount(2);
//! editor.selectField('childName');
//! editor.placeAtPreview(tapX, tapY, previewScale, 792);
//! editor.save();
//!
//! const result = autoFill(pdfBytes, 'temporary_care_application', { childName: 'Hana Hanada' });
//! download(result.bytes);
//! ```

mod storage;

pub use storage::WebStorage;

use mapping::{DataField, MappingStore, PreviewTransform};
use pdf_core::FontData;
use template::{ApplicationData, AutoFiller, FillConfig, MappingSource, Registry, APPLICATION_FIELDS};
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl ToString) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn local_store() -> Result<MappingStore<WebStorage>, JsValue> {
    Ok(MappingStore::new(WebStorage::local().map_err(js_error)?))
}

fn application_data(data: JsValue) -> Result<ApplicationData, JsValue> {
    if data.is_undefined() || data.is_null() {
        return Ok(ApplicationData::default());
    }
    Ok(serde_wasm_bindgen::from_value(data)?)
}

fn source_name(source: MappingSource) -> &'static str {
    match source {
        MappingSource::Saved => "saved",
        MappingSource::Registry => "registry",
    }
}

/// Mapping editor session for one template
#[wasm_bindgen]
pub struct PdfMappingEditor {
    inner: mapping::MappingEditor,
    store: MappingStore<WebStorage>,
}

#[wasm_bindgen]
impl PdfMappingEditor {
    /// Open a session, seeded with the mapping saved in localStorage
    ///
    /// @param templateName - Template identifier
    #[wasm_bindgen(constructor)]
    pub fn new(template_name: &str) -> Result<PdfMappingEditor, JsValue> {
        let store = local_store()?;
        let inner = mapping::MappingEditor::open(template_name, &store);
        Ok(PdfMappingEditor { inner, store })
    }

    #[wasm_bindgen(getter, js_name = templateName)]
    pub fn template_name(&self) -> String {
        self.inner.template_name().to_string()
    }

    /// Select a catalog field for placement
    ///
    /// @param fieldId - ApplicationData field id (e.g. "childName")
    #[wasm_bindgen(js_name = selectField)]
    pub fn select_field(&mut self, field_id: &str) -> Result<(), JsValue> {
        let (id, label) = APPLICATION_FIELDS
            .iter()
            .find(|(id, _)| *id == field_id)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown field: {field_id}")))?;
        self.inner.select_field(DataField::new(*id, *label, ""));
        Ok(())
    }

    #[wasm_bindgen(js_name = cancelSelection)]
    pub fn cancel_selection(&mut self) {
        self.inner.cancel_selection();
    }

    /// Id of the field awaiting placement, if any
    #[wasm_bindgen(getter, js_name = selectedFieldId)]
    pub fn selected_field_id(&self) -> Option<String> {
        self.inner.selected_field().map(|f| f.id.clone())
    }

    /// Place the selected field at page-space coordinates
    ///
    /// @returns false when no field was selected or a coordinate is not finite
    #[wasm_bindgen(js_name = placeAt)]
    pub fn place_at(&mut self, x: f64, y: f64) -> bool {
        self.inner.place_at(x, y).is_some()
    }

    /// Place the selected field at a tap on the scaled page preview
    ///
    /// @param viewX - Tap x in preview pixels (from left)
    /// @param viewY - Tap y in preview pixels (from top)
    /// @param scale - Preview pixels per PDF point
    /// @param pageHeight - Page height in points
    /// @returns false when nothing was placed, including a zero or non-finite scale
    #[wasm_bindgen(js_name = placeAtPreview)]
    pub fn place_at_preview(&mut self, view_x: f64, view_y: f64, scale: f64, page_height: f64) -> bool {
        let Some(transform) = PreviewTransform::new(scale, page_height) else {
            log::warn!("ignoring preview placement with scale {scale}");
            return false;
        };
        self.inner.place_at_preview(view_x, view_y, &transform).is_some()
    }

    #[wasm_bindgen(js_name = removeMapping)]
    pub fn remove_mapping(&mut self, field_id: &str) -> bool {
        self.inner.remove_mapping(field_id).is_some()
    }

    /// Remove every mapping once `confirm(count)` returns truthy
    ///
    /// @param confirm - Callback receiving the number of mappings
    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self, confirm: &js_sys::Function) -> Result<bool, JsValue> {
        let mut call_error = None;
        let cleared = self.inner.clear_all(|count| {
            match confirm.call1(&JsValue::NULL, &JsValue::from(count as u32)) {
                Ok(answer) => answer.is_truthy(),
                Err(e) => {
                    call_error = Some(e);
                    false
                }
            }
        });

        match call_error {
            Some(e) => Err(e),
            None => Ok(cleared),
        }
    }

    #[wasm_bindgen(js_name = setPageCount)]
    pub fn set_page_count(&mut self, count: u32) {
        self.inner.set_page_count(count);
    }

    #[wasm_bindgen(js_name = setPage)]
    pub fn set_page(&mut self, page: u32) -> bool {
        self.inner.set_page(page)
    }

    #[wasm_bindgen(js_name = nextPage)]
    pub fn next_page(&mut self) -> bool {
        self.inner.next_page()
    }

    #[wasm_bindgen(js_name = previousPage)]
    pub fn previous_page(&mut self) -> bool {
        self.inner.previous_page()
    }

    #[wasm_bindgen(getter, js_name = currentPage)]
    pub fn current_page(&self) -> u32 {
        self.inner.current_page()
    }

    #[wasm_bindgen(js_name = setFontSize)]
    pub fn set_font_size(&mut self, field_id: &str, size: f32) -> bool {
        self.inner.set_font_size(field_id, size)
    }

    /// Working mapping list as `[{ fieldId, fieldLabel, coordinate }]`
    pub fn mappings(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.inner.mappings())?)
    }

    /// Mappings on one page, for drawing markers
    #[wasm_bindgen(js_name = mappingsOnPage)]
    pub fn mappings_on_page(&self, page: u32) -> Result<JsValue, JsValue> {
        let on_page: Vec<_> = self.inner.mappings_on_page(page).collect();
        Ok(serde_wasm_bindgen::to_value(&on_page)?)
    }

    #[wasm_bindgen(getter, js_name = isDirty)]
    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    /// Persist the working list to localStorage
    ///
    /// @returns The saved record
    pub fn save(&mut self) -> Result<JsValue, JsValue> {
        let record = self.inner.save(&self.store).map_err(js_error)?;
        Ok(serde_wasm_bindgen::to_value(&record)?)
    }
}

/// Result of [`auto_fill`]
#[wasm_bindgen]
pub struct FillResult {
    inner: template::FilledPdf,
}

#[wasm_bindgen]
impl FillResult {
    /// Filled PDF bytes (Uint8Array)
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }

    /// "saved" or "registry"
    #[wasm_bindgen(getter)]
    pub fn source(&self) -> String {
        source_name(self.inner.source).to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn filled(&self) -> Vec<JsValue> {
        self.inner.filled.iter().map(|id| JsValue::from_str(id)).collect()
    }

    #[wasm_bindgen(getter)]
    pub fn skipped(&self) -> Vec<JsValue> {
        self.inner.skipped.iter().map(|id| JsValue::from_str(id)).collect()
    }

    /// Per-field failures as `[{ fieldId, reason }]`
    pub fn errors(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.errors)?)
    }
}

/// Fill a template with application data
///
/// @param templateBytes - Template PDF bytes (Uint8Array)
/// @param templateName - Template identifier
/// @param data - ApplicationData object
/// @param options - Optional FillConfig ({ defaultFontSize, textColor, preferSavedMappings })
/// @param fontBytes - Optional TTF bytes for non-Latin text
#[wasm_bindgen(js_name = autoFill)]
pub fn auto_fill(
    template_bytes: &[u8],
    template_name: &str,
    data: JsValue,
    options: JsValue,
    font_bytes: Option<Vec<u8>>,
) -> Result<FillResult, JsValue> {
    let data = application_data(data)?;
    let config: FillConfig = if options.is_undefined() || options.is_null() {
        FillConfig::default()
    } else {
        serde_wasm_bindgen::from_value(options)?
    };

    let registry = Registry::builtin().map_err(js_error)?;
    let mut filler = AutoFiller::new(local_store()?, registry).with_config(config);
    if let Some(font_bytes) = font_bytes {
        filler = filler.with_font(FontData::from_ttf("AppFont", &font_bytes).map_err(js_error)?);
    }

    let inner = filler
        .fill(template_bytes, template_name, &data)
        .map_err(js_error)?;
    if !inner.errors.is_empty() {
        log::warn!("{} field(s) could not be filled", inner.errors.len());
    }

    Ok(FillResult { inner })
}

/// Field catalog for the editor, bound to the given data
///
/// @param data - Optional ApplicationData object
/// @returns Array of { id, label, value }
#[wasm_bindgen(js_name = fieldCatalog)]
pub fn field_catalog(data: JsValue) -> Result<JsValue, JsValue> {
    let data = application_data(data)?;
    Ok(serde_wasm_bindgen::to_value(&data.catalog())?)
}

/// Every mapping record saved in localStorage
#[wasm_bindgen(js_name = listMappings)]
pub fn list_mappings() -> Result<JsValue, JsValue> {
    let records = local_store()?.list_all().map_err(js_error)?;
    Ok(serde_wasm_bindgen::to_value(&records)?)
}

#[wasm_bindgen(js_name = deleteMapping)]
pub fn delete_mapping(template_name: &str) -> Result<(), JsValue> {
    local_store()?.delete(template_name).map_err(js_error)
}

/// Template names known to the built-in registry
#[wasm_bindgen(js_name = registeredTemplates)]
pub fn registered_templates() -> Result<Vec<JsValue>, JsValue> {
    let registry = Registry::builtin().map_err(js_error)?;
    Ok(registry.template_names().map(JsValue::from_str).collect())
}
