//! Key-value persistence port and the mapping store built on it

use crate::model::{upsert_mapping, FieldMapping, PdfMappingData};
use crate::{MappingError, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key prefix for persisted mapping records
pub const DEFAULT_KEY_PREFIX: &str = "pdf_mapping_";

/// String key-value persistence (AsyncStorage / localStorage style)
pub trait KeyValueStore {
    /// Read a value; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<String>>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// In-memory store, safe to share between threads
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| MappingError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Directory-backed store: one `<encoded key>.json` file per key
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never observes a half-written record.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Bytes escaped in file names: everything but ASCII alphanumerics, `_` and `-`
const KEY_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// Escape a key into a portable file name
fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_SET).to_string()
}

fn decode_key(name: &str) -> Option<String> {
    percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".json") {
                if let Some(key) = decode_key(stem) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Persists one [`PdfMappingData`] record per template name
///
/// Records live under `prefix + template_name` as JSON. Every save is a
/// full overwrite; reads never fail, a missing or corrupt record is
/// reported as absent.
#[derive(Debug, Clone)]
pub struct MappingStore<S> {
    backend: S,
    prefix: String,
}

impl<S: KeyValueStore> MappingStore<S> {
    pub fn new(backend: S) -> Self {
        Self::with_prefix(backend, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(backend: S, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn key(&self, template_name: &str) -> String {
        format!("{}{}", self.prefix, template_name)
    }

    /// Persist the full mapping list for a template, stamped with the current time
    ///
    /// Duplicate field ids keep the position of their first occurrence and
    /// the value of their last. A mapping with a non-finite coordinate or
    /// font size is rejected and the stored record is left as it was.
    /// Returns the record as written.
    pub fn save(&self, template_name: &str, mappings: &[FieldMapping]) -> Result<PdfMappingData> {
        if template_name.is_empty() {
            return Err(MappingError::InvalidTemplateName);
        }
        if let Some(bad) = mappings.iter().find(|m| !m.coordinate.is_finite()) {
            return Err(MappingError::InvalidCoordinate(bad.field_id.clone()));
        }

        let mut fields = Vec::with_capacity(mappings.len());
        for mapping in mappings {
            upsert_mapping(&mut fields, mapping.clone());
        }

        let record = PdfMappingData::new(template_name, fields);
        let json = serde_json::to_string(&record)?;

        self.backend
            .set(&self.key(template_name), &json)
            .inspect_err(|e| log::warn!("failed to save mapping for {template_name}: {e}"))?;

        log::debug!(
            "saved {} mapping(s) for template {}",
            record.fields.len(),
            template_name
        );
        Ok(record)
    }

    /// Load the stored record for a template, if present and readable
    pub fn load(&self, template_name: &str) -> Option<PdfMappingData> {
        if template_name.is_empty() {
            return None;
        }

        let raw = match self.backend.get(&self.key(template_name)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("failed to read mapping for {template_name}: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("ignoring corrupt mapping for {template_name}: {e}");
                None
            }
        }
    }

    /// Remove the stored record for a template (no error if absent)
    pub fn delete(&self, template_name: &str) -> Result<()> {
        self.backend.remove(&self.key(template_name))
    }

    /// Every readable record under this store's prefix, skipping corrupt entries
    pub fn list_all(&self) -> Result<Vec<PdfMappingData>> {
        let mut records = Vec::new();

        for key in self.backend.keys()? {
            let Some(template_name) = key.strip_prefix(&self.prefix) else {
                continue;
            };
            if let Some(record) = self.load(template_name) {
                records.push(record);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, DataField};
    use pretty_assertions::assert_eq;

    fn mapping(id: &str, x: f64, y: f64) -> FieldMapping {
        FieldMapping::new(&DataField::new(id, id, ""), Coordinate::new(x, y, 0))
    }

    #[test]
    fn test_key_encoding_roundtrip() {
        let key = "pdf_mapping_一時保育/v2.pdf";
        let encoded = encode_key(key);
        assert!(encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"_-%".contains(&b)));
        assert_eq!(decode_key(&encoded).as_deref(), Some(key));
    }

    #[test]
    fn test_decode_key_rejects_invalid_utf8() {
        assert_eq!(decode_key("abc%FF"), None);
        assert_eq!(decode_key("abc%E4%B8"), None);
    }

    #[test]
    fn test_encode_key_keeps_safe_characters() {
        assert_eq!(encode_key("pdf_mapping_form-1"), "pdf_mapping_form-1");
        assert_eq!(encode_key("a.b c"), "a%2Eb%20c");
    }

    #[test]
    fn test_memory_store_basic() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_save_uses_prefixed_key() {
        let store = MappingStore::new(MemoryStore::new());
        store.save("t1", &[mapping("childName", 1.0, 2.0)]).unwrap();

        assert_eq!(store.backend().keys().unwrap(), vec!["pdf_mapping_t1"]);
    }

    #[test]
    fn test_save_collapses_duplicate_fields() {
        let store = MappingStore::new(MemoryStore::new());
        let record = store
            .save(
                "t1",
                &[
                    mapping("childName", 1.0, 1.0),
                    mapping("notes", 5.0, 5.0),
                    mapping("childName", 2.0, 2.0),
                ],
            )
            .unwrap();

        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[0], mapping("childName", 2.0, 2.0));
        assert_eq!(record.fields[1], mapping("notes", 5.0, 5.0));
    }

    #[test]
    fn test_save_rejects_non_finite_coordinates() {
        let store = MappingStore::new(MemoryStore::new());
        store.save("t1", &[mapping("childName", 200.0, 720.0)]).unwrap();

        let result = store.save(
            "t1",
            &[mapping("childName", 200.0, 720.0), mapping("notes", f64::NAN, 10.0)],
        );
        assert!(matches!(result, Err(MappingError::InvalidCoordinate(id)) if id == "notes"));

        let mut huge = mapping("notes", 10.0, 10.0);
        huge.coordinate.size = f32::INFINITY;
        assert!(matches!(
            store.save("t1", &[huge]),
            Err(MappingError::InvalidCoordinate(_))
        ));

        let kept = store.load("t1").unwrap();
        assert_eq!(kept.fields, vec![mapping("childName", 200.0, 720.0)]);
    }

    #[test]
    fn test_save_rejects_empty_template_name() {
        let store = MappingStore::new(MemoryStore::new());
        assert!(matches!(
            store.save("", &[]),
            Err(MappingError::InvalidTemplateName)
        ));
    }

    #[test]
    fn test_corrupt_record_reads_as_absent() {
        let store = MappingStore::new(MemoryStore::new());
        store
            .backend()
            .set("pdf_mapping_broken", "{not json")
            .unwrap();

        assert_eq!(store.load("broken"), None);
    }

    #[test]
    fn test_custom_prefix_isolates_records() {
        let backend = MemoryStore::new();
        let a = MappingStore::with_prefix(&backend, "a_");
        let b = MappingStore::with_prefix(&backend, "b_");

        a.save("t1", &[]).unwrap();

        assert!(a.load("t1").is_some());
        assert!(b.load("t1").is_none());
        assert_eq!(b.list_all().unwrap().len(), 0);
    }
}
