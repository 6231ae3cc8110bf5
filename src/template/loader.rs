//! Template source loaders

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;

use super::resolver::normalize;

/// Errors that can occur while fetching a template's source
#[derive(Debug, Error)]
pub enum LoadError {
    /// No template under this name
    #[error("template '{name}' not found")]
    NotFound { name: String },

    /// Error reading template file
    #[error("error reading template '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A template imports itself, directly or through other templates
    #[error("circular import detected: {chain}")]
    Circular { chain: String },
}

/// Source of template text, keyed by canonical template name
pub trait TemplateLoader: fmt::Debug + Send + Sync {
    fn load(&self, name: &str) -> Result<String, LoadError>;
}

/// Reads templates from disk; names are file paths
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemLoader;

impl TemplateLoader for FileSystemLoader {
    fn load(&self, name: &str) -> Result<String, LoadError> {
        std::fs::read_to_string(name).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                name: name.to_string(),
            },
            _ => LoadError::Io {
                name: name.to_string(),
                source,
            },
        })
    }
}

/// In-memory templates, mostly for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, builder style
    pub fn with(mut self, name: &str, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    /// Add or replace a template; `name` is normalized like resolved filenames
    pub fn insert(&mut self, name: &str, source: impl Into<String>) {
        let key = normalize(Path::new(name)).to_string_lossy().into_owned();
        self.templates.insert(key, source.into());
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<String, LoadError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                name: name.to_string(),
            })
    }
}
