//! AcroForm text field access

use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// Maximum /Kids nesting followed while walking the field tree
const MAX_FIELD_DEPTH: usize = 32;

/// A terminal form field found in the document's AcroForm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Fully qualified name (partial names joined with '.')
    pub name: String,
    /// Field type (/FT), inherited from ancestors when absent
    pub field_type: Option<String>,
    /// Object holding the field dictionary
    pub id: ObjectId,
}

impl FormField {
    /// Last segment of the qualified name
    pub fn partial_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Whether this is a text field (/FT /Tx)
    pub fn is_text(&self) -> bool {
        self.field_type.as_deref() == Some("Tx")
    }
}

/// Encode a value as a PDF text string
///
/// ASCII stays a literal string; anything else becomes UTF-16BE with a BOM.
pub fn encode_text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise Latin-1)
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Follow a reference if needed
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Locate the AcroForm dictionary: either an indirect object id or inline in the catalog
enum AcroFormLocation {
    Indirect(ObjectId),
    Inline(ObjectId),
}

fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))
}

fn acroform_location(doc: &Document) -> Result<Option<AcroFormLocation>> {
    let catalog_id = catalog_id(doc)?;
    let catalog = doc.get_object(catalog_id)?.as_dict()?;

    match catalog.get(b"AcroForm") {
        Ok(Object::Reference(id)) => Ok(Some(AcroFormLocation::Indirect(*id))),
        Ok(Object::Dictionary(_)) => Ok(Some(AcroFormLocation::Inline(catalog_id))),
        _ => Ok(None),
    }
}

fn acroform_dict(doc: &Document) -> Result<Option<&Dictionary>> {
    let dict = match acroform_location(doc)? {
        None => return Ok(None),
        Some(AcroFormLocation::Indirect(id)) => doc.get_object(id)?.as_dict()?,
        Some(AcroFormLocation::Inline(catalog_id)) => doc
            .get_object(catalog_id)?
            .as_dict()?
            .get(b"AcroForm")?
            .as_dict()?,
    };
    Ok(Some(dict))
}

/// Collect all terminal fields of the document's AcroForm
pub(crate) fn collect_fields(doc: &Document) -> Result<Vec<FormField>> {
    let acroform = match acroform_dict(doc)? {
        Some(dict) => dict,
        None => return Ok(Vec::new()),
    };

    let fields = match acroform.get(b"Fields") {
        Ok(obj) => resolve(doc, obj)?.as_array()?.clone(),
        Err(_) => return Ok(Vec::new()),
    };

    let mut result = Vec::new();
    for field in &fields {
        if let Object::Reference(id) = field {
            collect_field_recursive(doc, *id, "", None, 0, &mut result)?;
        }
    }
    Ok(result)
}

fn collect_field_recursive(
    doc: &Document,
    id: ObjectId,
    parent_name: &str,
    parent_type: Option<&str>,
    depth: usize,
    result: &mut Vec<FormField>,
) -> Result<()> {
    if depth > MAX_FIELD_DEPTH {
        return Ok(());
    }

    let dict = match doc.get_object(id).and_then(Object::as_dict) {
        Ok(dict) => dict,
        Err(_) => return Ok(()),
    };

    let partial_name = match dict.get(b"T").map(|t| resolve(doc, t)) {
        Ok(Ok(Object::String(bytes, _))) => decode_text_string(bytes),
        _ => String::new(),
    };

    let name = match (parent_name.is_empty(), partial_name.is_empty()) {
        (true, _) => partial_name,
        (false, true) => parent_name.to_string(),
        (false, false) => format!("{parent_name}.{partial_name}"),
    };

    let field_type = dict
        .get(b"FT")
        .and_then(Object::as_name_str)
        .ok()
        .or(parent_type)
        .map(str::to_string);

    // Kids carrying /T are child fields; kids without /T are widget annotations
    let child_fields: Vec<ObjectId> = match dict.get(b"Kids").map(|k| resolve(doc, k)) {
        Ok(Ok(Object::Array(kids))) => kids
            .iter()
            .filter_map(|kid| kid.as_reference().ok())
            .filter(|kid_id| {
                doc.get_object(*kid_id)
                    .and_then(Object::as_dict)
                    .map(|d| d.has(b"T"))
                    .unwrap_or(false)
            })
            .collect(),
        _ => Vec::new(),
    };

    if child_fields.is_empty() {
        result.push(FormField {
            name,
            field_type,
            id,
        });
        return Ok(());
    }

    for kid_id in child_fields {
        collect_field_recursive(doc, kid_id, &name, field_type.as_deref(), depth + 1, result)?;
    }
    Ok(())
}

/// Find a field by qualified name, falling back to a unique partial-name match
pub(crate) fn find_field(doc: &Document, name: &str) -> Result<FormField> {
    let fields = collect_fields(doc)?;

    if let Some(field) = fields.iter().find(|f| f.name == name) {
        return Ok(field.clone());
    }

    let mut partial = fields.into_iter().filter(|f| f.partial_name() == name);
    match (partial.next(), partial.next()) {
        (Some(field), None) => Ok(field),
        _ => Err(PdfError::FormFieldNotFound(name.to_string())),
    }
}

/// Set the value of a text field and flag the form for appearance regeneration
pub(crate) fn set_text_field(doc: &mut Document, name: &str, value: &str) -> Result<()> {
    let field = find_field(doc, name)?;
    if !field.is_text() {
        return Err(PdfError::NotATextField(name.to_string()));
    }

    // Widgets of this field whose cached appearance is now stale
    let widget_ids: Vec<ObjectId> = match doc.get_object(field.id)?.as_dict()?.get(b"Kids") {
        Ok(Object::Array(kids)) => kids.iter().filter_map(|k| k.as_reference().ok()).collect(),
        _ => Vec::new(),
    };

    let field_dict = doc.get_object_mut(field.id)?.as_dict_mut()?;
    field_dict.set("V", encode_text_string(value));
    field_dict.remove(b"AP");

    for widget_id in widget_ids {
        if let Ok(widget) = doc.get_object_mut(widget_id).and_then(Object::as_dict_mut) {
            widget.remove(b"AP");
        }
    }

    set_need_appearances(doc)
}

fn set_need_appearances(doc: &mut Document) -> Result<()> {
    let acroform = match acroform_location(doc)? {
        None => return Ok(()),
        Some(AcroFormLocation::Indirect(id)) => doc.get_object_mut(id)?.as_dict_mut()?,
        Some(AcroFormLocation::Inline(catalog_id)) => doc
            .get_object_mut(catalog_id)?
            .as_dict_mut()?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?,
    };
    acroform.set("NeedAppearances", Object::Boolean(true));
    Ok(())
}
