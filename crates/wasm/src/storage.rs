//! Browser localStorage backend

use mapping::{KeyValueStore, MappingError};
use wasm_bindgen::JsValue;

fn storage_error(op: &str, e: JsValue) -> MappingError {
    let detail = e.as_string().unwrap_or_else(|| format!("{e:?}"));
    MappingError::Storage(format!("localStorage {op} failed: {detail}"))
}

/// [`KeyValueStore`] over the page's `window.localStorage`
pub struct WebStorage {
    storage: web_sys::Storage,
}

impl WebStorage {
    /// Open the window's localStorage
    pub fn local() -> mapping::Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| MappingError::Storage("no window available".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| storage_error("open", e))?
            .ok_or_else(|| MappingError::Storage("localStorage is disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> mapping::Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| storage_error("read", e))
    }

    fn set(&self, key: &str, value: &str) -> mapping::Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| storage_error("write", e))
    }

    fn remove(&self, key: &str) -> mapping::Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| storage_error("remove", e))
    }

    fn keys(&self) -> mapping::Result<Vec<String>> {
        let len = self.storage.length().map_err(|e| storage_error("length", e))?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = self.storage.key(i).map_err(|e| storage_error("key", e))? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
