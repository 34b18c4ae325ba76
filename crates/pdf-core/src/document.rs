//! PDF Document wrapper

use crate::font::{standard_font_dict, FontData};
use crate::form::{self, FormField};
use crate::text::{encode_win_ansi, generate_text_operators, TextRenderContext};
use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet};

/// Resource name of the standard font on pages we draw on
const STANDARD_FONT_RESOURCE: &str = "HkHelv";

/// Resource name of the embedded TrueType font on pages we draw on
const EMBEDDED_FONT_RESOURCE: &str = "HkEmb";

/// Maximum /Parent levels followed for inherited page attributes
const MAX_INHERIT_DEPTH: usize = 10;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// PDF Document wrapper providing high-level operations
///
/// Pages are addressed by zero-based index and coordinates are PDF page
/// space (points, origin bottom-left). Drawing is buffered per page and
/// written out by [`PdfDocument::to_bytes`].
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Optional TrueType font used instead of the standard font
    font: Option<FontData>,
    /// Buffered content operators per page (page index -> operators)
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
    /// Pages that reference the standard font
    standard_font_pages: BTreeSet<usize>,
    /// Pages that reference the embedded font
    embedded_font_pages: BTreeSet<usize>,
}

impl PdfDocument {
    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            font: None,
            page_content_buffer: BTreeMap::new(),
            standard_font_pages: BTreeSet::new(),
            embedded_font_pages: BTreeSet::new(),
        }
    }

    /// Open a PDF document from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Use a TrueType font for all subsequent text
    pub fn set_font(&mut self, font: FontData) {
        self.font = Some(font);
    }

    /// Object id of the page at a zero-based index
    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        u32::try_from(page)
            .ok()
            .and_then(|index| index.checked_add(1))
            .and_then(|number| pages.get(&number).copied())
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Get the page size (width, height) in points
    ///
    /// Reads the MediaBox, following the /Parent chain when it is inherited.
    /// Falls back to A4 when no MediaBox is present.
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;

        let media_box = match self.get_inherited(page_id, b"MediaBox")? {
            Some(Object::Array(arr)) => arr,
            Some(_) => return Err(PdfError::ParseError("MediaBox is not an array".to_string())),
            None => return Ok((595.28, 841.89)),
        };

        if media_box.len() < 4 {
            return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
        }

        let coord = |i: usize| -> Result<f64> {
            media_box[i]
                .as_f32()
                .map(|v| v as f64)
                .ok()
                .or_else(|| media_box[i].as_i64().ok().map(|v| v as f64))
                .ok_or_else(|| PdfError::ParseError(format!("Invalid MediaBox entry {i}")))
        };

        Ok((coord(2)? - coord(0)?, coord(3)? - coord(1)?))
    }

    /// Look up a page attribute, following the /Parent chain and resolving references
    fn get_inherited(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
        let mut current_id = page_id;

        for _ in 0..MAX_INHERIT_DEPTH {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            if let Ok(value) = dict.get(key) {
                let resolved = match value {
                    Object::Reference(id) => self.inner.get_object(*id)?.clone(),
                    other => other.clone(),
                };
                return Ok(Some(resolved));
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(None)
    }

    /// Draw text with its baseline starting at `(x, y)`
    ///
    /// # Arguments
    /// * `text` - Text to draw; empty text is a no-op
    /// * `page` - Page index (zero-based)
    /// * `x` - X coordinate in points (from left)
    /// * `y` - Y coordinate in points (from bottom)
    /// * `size` - Font size in points
    /// * `color` - Fill color
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        size: f32,
        color: Color,
    ) -> Result<()> {
        let page_count = self.page_count();
        if page >= page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        if text.is_empty() {
            return Ok(());
        }

        let (encoded, font_name) = match self.font.as_mut() {
            Some(font) => {
                let missing = text.chars().filter(|&c| !font.has_glyph(c)).count();
                if missing > 0 {
                    log::warn!(
                        "font {} has no glyph for {} character(s) of {:?}",
                        font.name,
                        missing,
                        text
                    );
                }
                font.add_chars(text);
                self.embedded_font_pages.insert(page);
                (font.encode_text_hex(text), EMBEDDED_FONT_RESOURCE)
            }
            None => {
                let (encoded, replaced) = encode_win_ansi(text);
                if replaced > 0 {
                    log::warn!(
                        "{} character(s) of {:?} are not encodable in the standard font",
                        replaced,
                        text
                    );
                }
                self.standard_font_pages.insert(page);
                (encoded, STANDARD_FONT_RESOURCE)
            }
        };

        let ctx = TextRenderContext {
            font_name: font_name.to_string(),
            font_size: size,
            color,
        };
        let operators = generate_text_operators(&encoded, x, y, &ctx);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// List the terminal AcroForm fields of the document
    pub fn form_fields(&self) -> Result<Vec<FormField>> {
        form::collect_fields(&self.inner)
    }

    /// Whether a form field with this (qualified or unique partial) name exists
    pub fn has_form_field(&self, name: &str) -> bool {
        form::find_field(&self.inner, name).is_ok()
    }

    /// Set the value of a named AcroForm text field
    ///
    /// Returns `FormFieldNotFound` when no such field exists and
    /// `NotATextField` when the field is not a text field.
    pub fn set_text_field(&mut self, name: &str, value: &str) -> Result<()> {
        form::set_text_field(&mut self.inner, name, value)
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        // 1. Add font resources to every page we drew on
        self.finalize_font_resources()?;

        // 2. Flush buffered content streams to pages
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Embed the TrueType font, wiring up the references between its objects
    fn embed_font_object(&mut self, font: &FontData) -> Result<ObjectId> {
        let objects = font.to_pdf_objects()?;

        let font_file_id = self.inner.add_object(objects.font_file_stream);

        let mut font_descriptor = objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let tounicode_id = self.inner.add_object(objects.tounicode_stream);

        let mut type0_font = objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        Ok(self.inner.add_object(type0_font))
    }

    fn finalize_font_resources(&mut self) -> Result<()> {
        let standard_pages = std::mem::take(&mut self.standard_font_pages);
        if !standard_pages.is_empty() {
            let font_id = self.inner.add_object(standard_font_dict());
            for page in standard_pages {
                self.add_font_to_page_resources(page, STANDARD_FONT_RESOURCE, font_id)?;
            }
        }

        let embedded_pages = std::mem::take(&mut self.embedded_font_pages);
        if !embedded_pages.is_empty() {
            if let Some(font) = self.font.clone() {
                let font_id = self.embed_font_object(&font)?;
                for page in embedded_pages {
                    self.add_font_to_page_resources(page, EMBEDDED_FONT_RESOURCE, font_id)?;
                }
            }
        }

        Ok(())
    }

    /// Add a font to a page's Resources dictionary
    ///
    /// Inherited or indirect resources are copied onto the page so the
    /// fonts it already uses stay reachable.
    fn add_font_to_page_resources(
        &mut self,
        page: usize,
        resource_name: &str,
        font_id: ObjectId,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        let mut resources_dict = match self.get_inherited(page_id, b"Resources")? {
            Some(Object::Dictionary(dict)) => dict,
            _ => Dictionary::new(),
        };

        let mut font_dict = match resources_dict.get(b"Font") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => self
                .inner
                .get_object(*id)
                .and_then(Object::as_dict)
                .cloned()
                .unwrap_or_else(|_| Dictionary::new()),
            _ => Dictionary::new(),
        };

        font_dict.set(resource_name, Object::Reference(font_id));
        resources_dict.set("Font", Object::Dictionary(font_dict));

        let page_dict = self
            .inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?;
        page_dict.set("Resources", Object::Dictionary(resources_dict));

        Ok(())
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Get a mutable reference to the underlying lopdf document
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, &content)?;
            }
        }

        Ok(())
    }

    /// Append content to a page's content stream
    ///
    /// The existing streams are kept as they are (filters included) and
    /// bracketed by new `q` and `Q` streams, so any transformation they
    /// leave on the graphics state does not move the appended text.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;

        let existing = {
            let page_dict = self
                .inner
                .get_object(page_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
            page_dict.get(b"Contents").ok().cloned()
        };

        let mut contents = match existing {
            Some(Object::Reference(ref_id)) => match self.inner.get_object(ref_id) {
                Ok(Object::Array(arr)) => arr.clone(),
                Ok(Object::Stream(_)) => vec![Object::Reference(ref_id)],
                _ => Vec::new(),
            },
            Some(Object::Array(arr)) => arr,
            Some(Object::Stream(stream)) => vec![Object::Reference(self.inner.add_object(stream))],
            _ => Vec::new(),
        };

        let mut new_content = Vec::with_capacity(content.len() + 3);
        if !contents.is_empty() {
            let save_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.insert(0, Object::Reference(save_id));
            new_content.extend_from_slice(b"\nQ\n");
        }
        new_content.extend_from_slice(content);

        let stream_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), new_content));
        contents.push(Object::Reference(stream_id));

        let page_dict = self
            .inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
        page_dict.set("Contents", Object::Array(contents));

        Ok(())
    }
}
