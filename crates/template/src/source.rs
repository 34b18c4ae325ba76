//! Where template PDF bytes come from

use crate::{Result, TemplateError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies the raw bytes of a template by name
pub trait TemplateSource {
    fn load(&self, template_name: &str) -> Result<Vec<u8>>;
}

/// Reads `<dir>/<template_name>.pdf`
#[derive(Debug, Clone)]
pub struct FileTemplateSource {
    dir: PathBuf,
}

impl FileTemplateSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, template_name: &str) -> PathBuf {
        self.dir.join(format!("{template_name}.pdf"))
    }
}

impl TemplateSource for FileTemplateSource {
    fn load(&self, template_name: &str) -> Result<Vec<u8>> {
        if template_name.is_empty() || template_name.contains(['/', '\\']) || template_name == ".." {
            return Err(TemplateError::TemplateLoad(format!(
                "invalid template name '{template_name}'"
            )));
        }

        let path = self.path_for(template_name);
        std::fs::read(&path)
            .map_err(|e| TemplateError::TemplateLoad(format!("{}: {}", path.display(), e)))
    }
}

/// Templates bundled in memory, e.g. compiled-in assets
#[derive(Debug, Clone, Default)]
pub struct BytesTemplateSource {
    templates: HashMap<String, Vec<u8>>,
}

impl BytesTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(template_name, bytes);
        self
    }

    pub fn insert(&mut self, template_name: impl Into<String>, bytes: Vec<u8>) {
        self.templates.insert(template_name.into(), bytes);
    }
}

impl TemplateSource for BytesTemplateSource {
    fn load(&self, template_name: &str) -> Result<Vec<u8>> {
        self.templates
            .get(template_name)
            .cloned()
            .ok_or_else(|| TemplateError::TemplateLoad(format!("unknown template '{template_name}'")))
    }
}
