//! Interactive mapping editor session

use crate::model::{upsert_mapping, Coordinate, DataField, FieldMapping, PdfMappingData};
use crate::store::{KeyValueStore, MappingStore};
use crate::{Result, DEFAULT_FONT_SIZE};
use serde::{Deserialize, Serialize};

/// Editor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Font size given to newly placed fields
    pub default_font_size: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Selection state of the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// Nothing selected; taps on the page are ignored
    Idle,
    /// A field is waiting to be placed
    FieldSelected(DataField),
}

/// Maps between a scaled on-screen page preview and PDF page space
///
/// Preview coordinates have their origin at the top-left corner and are
/// scaled by `scale`; page space is in points with a bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewTransform {
    pub scale: f64,
    pub page_height: f64,
}

impl PreviewTransform {
    /// `None` unless `scale` is finite and positive and `page_height` is finite
    pub fn new(scale: f64, page_height: f64) -> Option<Self> {
        if !(scale.is_finite() && scale > 0.0 && page_height.is_finite()) {
            return None;
        }
        Some(Self { scale, page_height })
    }

    /// Transform for a page of `page_width` x `page_height` points shown `view_width` wide
    pub fn fit_width(view_width: f64, page_width: f64, page_height: f64) -> Option<Self> {
        if !(page_width > 0.0) {
            return None;
        }
        Self::new(view_width / page_width, page_height)
    }

    pub fn to_page_space(&self, view_x: f64, view_y: f64) -> (f64, f64) {
        let x = view_x / self.scale;
        let y = self.page_height - view_y / self.scale;
        (x, y)
    }

    pub fn from_page_space(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale, (self.page_height - y) * self.scale)
    }
}

/// One editing session for a single template
///
/// Holds the working mapping list. Nothing is persisted until
/// [`MappingEditor::save`] is called.
#[derive(Debug, Clone)]
pub struct MappingEditor {
    template_name: String,
    state: EditorState,
    page: u32,
    page_count: Option<u32>,
    working: Vec<FieldMapping>,
    saved: Vec<FieldMapping>,
    config: EditorConfig,
}

impl MappingEditor {
    /// Start an empty session
    pub fn new(template_name: impl Into<String>) -> Self {
        Self::with_config(template_name, EditorConfig::default())
    }

    pub fn with_config(template_name: impl Into<String>, config: EditorConfig) -> Self {
        Self {
            template_name: template_name.into(),
            state: EditorState::Idle,
            page: 0,
            page_count: None,
            working: Vec::new(),
            saved: Vec::new(),
            config,
        }
    }

    /// Start a session seeded with whatever the store holds for the template
    pub fn open<S: KeyValueStore>(template_name: impl Into<String>, store: &MappingStore<S>) -> Self {
        let mut editor = Self::new(template_name);
        if let Some(record) = store.load(&editor.template_name) {
            log::debug!(
                "opened {} with {} saved mapping(s)",
                editor.template_name,
                record.fields.len()
            );
            editor.working = record.fields.clone();
            editor.saved = record.fields;
        }
        editor
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn selected_field(&self) -> Option<&DataField> {
        match &self.state {
            EditorState::FieldSelected(field) => Some(field),
            EditorState::Idle => None,
        }
    }

    /// Select a field for placement, replacing any current selection
    pub fn select_field(&mut self, field: DataField) {
        self.state = EditorState::FieldSelected(field);
    }

    pub fn cancel_selection(&mut self) {
        self.state = EditorState::Idle;
    }

    pub fn current_page(&self) -> u32 {
        self.page
    }

    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    /// Record the template's page count, clamping the current page into range
    pub fn set_page_count(&mut self, count: u32) {
        self.page_count = Some(count);
        if count > 0 && self.page >= count {
            self.page = count - 1;
        }
    }

    /// Move to a page; returns false and stays put if it is out of range
    pub fn set_page(&mut self, page: u32) -> bool {
        if let Some(count) = self.page_count {
            if page >= count {
                return false;
            }
        }
        self.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        match self.page.checked_add(1) {
            Some(page) => self.set_page(page),
            None => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.page.checked_sub(1) {
            Some(page) => self.set_page(page),
            None => false,
        }
    }

    /// Place the selected field at page-space `(x, y)` on the current page
    ///
    /// Ignored while idle, and ignored with the selection kept when `x` or
    /// `y` is not finite. An existing mapping for the same field is
    /// replaced in place and keeps its font size. The editor returns to
    /// idle afterwards.
    pub fn place_at(&mut self, x: f64, y: f64) -> Option<&FieldMapping> {
        if !(x.is_finite() && y.is_finite()) {
            log::debug!("ignoring placement at non-finite point ({x}, {y})");
            return None;
        }

        let field = match std::mem::replace(&mut self.state, EditorState::Idle) {
            EditorState::FieldSelected(field) => field,
            EditorState::Idle => return None,
        };

        let size = self
            .mapping_for(&field.id)
            .map(|m| m.coordinate.size)
            .unwrap_or(self.config.default_font_size);
        let coordinate = Coordinate::new(x, y, self.page).with_size(size);

        log::debug!(
            "placed {} at ({x}, {y}) on page {}",
            field.id,
            self.page
        );
        let index = upsert_mapping(&mut self.working, FieldMapping::new(&field, coordinate));
        self.working.get(index)
    }

    /// Place the selected field at a point tapped on the page preview
    pub fn place_at_preview(
        &mut self,
        view_x: f64,
        view_y: f64,
        transform: &PreviewTransform,
    ) -> Option<&FieldMapping> {
        let (x, y) = transform.to_page_space(view_x, view_y);
        self.place_at(x, y)
    }

    /// Remove the mapping for a field; returns it if one existed
    pub fn remove_mapping(&mut self, field_id: &str) -> Option<FieldMapping> {
        let index = self.working.iter().position(|m| m.field_id == field_id)?;
        Some(self.working.remove(index))
    }

    /// Empty the working list once `confirm` agrees
    ///
    /// `confirm` receives the number of mappings about to be dropped. The
    /// stored record is untouched until the next save.
    pub fn clear_all<F>(&mut self, confirm: F) -> bool
    where
        F: FnOnce(usize) -> bool,
    {
        if !confirm(self.working.len()) {
            return false;
        }
        self.working.clear();
        self.state = EditorState::Idle;
        true
    }

    /// Change the font size of an existing mapping
    pub fn set_font_size(&mut self, field_id: &str, size: f32) -> bool {
        if !(size.is_finite() && size > 0.0) {
            return false;
        }
        match self.working.iter_mut().find(|m| m.field_id == field_id) {
            Some(mapping) => {
                mapping.coordinate.size = size;
                true
            }
            None => false,
        }
    }

    pub fn mappings(&self) -> &[FieldMapping] {
        &self.working
    }

    pub fn mapping_for(&self, field_id: &str) -> Option<&FieldMapping> {
        self.working.iter().find(|m| m.field_id == field_id)
    }

    /// Mappings placed on `page`, for drawing markers on the preview
    pub fn mappings_on_page(&self, page: u32) -> impl Iterator<Item = &FieldMapping> {
        self.working.iter().filter(move |m| m.coordinate.page == page)
    }

    /// Whether the working list differs from what was last opened or saved
    pub fn is_dirty(&self) -> bool {
        self.working != self.saved
    }

    /// Persist the working list as a full overwrite of the stored record
    pub fn save<S: KeyValueStore>(&mut self, store: &MappingStore<S>) -> Result<PdfMappingData> {
        let record = store.save(&self.template_name, &self.working)?;
        self.working = record.fields.clone();
        self.saved = record.fields.clone();
        Ok(record)
    }
}
