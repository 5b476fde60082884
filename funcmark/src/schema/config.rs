//! Schema files: TOML documents declaring extra functions.
//!
//! ```toml
//! [[function]]
//! name = "note"
//! params = ["text", "level"]
//! description = "Callout box"
//! [function.defaults]
//! level = "info"
//! ```

use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::block::Params;
use crate::schema::{RegistryError, Schema, SchemaRegistry};

#[derive(Debug, Default, Deserialize)]
pub struct SchemaFile {
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionEntry {
    pub name: String,

    #[serde(default)]
    pub params: Vec<String>,

    /// Defaults may be strings or integers.
    #[serde(default)]
    pub defaults: Params,

    #[serde(default)]
    pub description: String,
}

impl From<FunctionEntry> for Schema {
    fn from(entry: FunctionEntry) -> Self {
        Schema {
            name: entry.name,
            params: entry.params,
            defaults: entry.defaults,
            description: entry.description,
        }
    }
}

impl SchemaFile {
    pub fn from_toml_str(source: &str) -> Result<Self, RegistryError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let source = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

impl SchemaRegistry {
    /// Apply every function declared in `file` on top of this registry.
    pub fn extend_with(self, file: SchemaFile) -> Result<Self, RegistryError> {
        file.functions
            .into_iter()
            .try_fold(self, |registry, entry| registry.with_schema(entry.into()))
    }

    pub fn extend_from_file(self, path: &Path) -> Result<Self, RegistryError> {
        let file = SchemaFile::load(path)?;
        debug!("loaded {} function(s) from {}", file.functions.len(), path.display());
        self.extend_with(file)
    }
}
