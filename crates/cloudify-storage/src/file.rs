use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde::Deserialize;
use serde_json::Value;

use cloudify_core::{
    BlueprintRecord, CatalogDocument, CatalogEntry, DEFAULT_MAIN_FILE_NAME, catalog_json_schema,
    validate_blueprint_id, validate_catalog,
};

use crate::adapter::{BlueprintStore, PluginRegistry};
use crate::error::{Result, StorageError};
use crate::options::PluginQuery;

/// Per-blueprint metadata file naming the root document.
const BLUEPRINT_META_FILE: &str = ".blueprint.json";

/// Validate a catalog JSON document against the catalog JSON Schema.
pub fn validate_catalog_json(catalog_json: &Value) -> Result<()> {
    let schema = serde_json::to_value(catalog_json_schema())?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| StorageError::Schema(err.to_string()))?;

    if let Err(errors) = compiled.validate(catalog_json) {
        let messages: Vec<String> = errors
            .map(|error| {
                let path = error.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                format!("{path}: {error}")
            })
            .collect();
        return Err(StorageError::Schema(messages.join("; ")));
    }

    Ok(())
}

/// Read, schema-check, and validate a catalog file.
pub fn load_catalog_document(path: &Path) -> Result<CatalogDocument> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    validate_catalog_json(&value)?;
    let document: CatalogDocument = serde_json::from_value(value)?;
    validate_catalog(&document.plugins)?;
    Ok(document)
}

/// Catalog backed by a JSON file, re-read on every lookup.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<CatalogEntry>> {
        if !self.path.exists() {
            tracing::debug!(event = "catalog_missing", path = %self.path.display());
            return Ok(Vec::new());
        }
        Ok(load_catalog_document(&self.path)?.plugins)
    }
}

#[async_trait]
impl PluginRegistry for FileCatalog {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn find_plugins(&self, query: &PluginQuery) -> Result<Vec<CatalogEntry>> {
        let entries = self.load()?;
        Ok(entries
            .into_iter()
            .filter(|entry| query.matches(entry))
            .collect())
    }

    async fn list_plugins(&self) -> Result<Vec<CatalogEntry>> {
        self.load()
    }
}

#[derive(Debug, Deserialize)]
struct BlueprintMeta {
    main_file_name: String,
}

/// Blueprint store over an uploads directory laid out as `<root>/<blueprint_id>/`.
#[derive(Debug, Clone)]
pub struct DirectoryBlueprintStore {
    root: PathBuf,
}

impl DirectoryBlueprintStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlueprintStore for DirectoryBlueprintStore {
    fn backend(&self) -> &'static str {
        "directory"
    }

    async fn get_blueprint(&self, blueprint_id: &str) -> Result<Option<BlueprintRecord>> {
        validate_blueprint_id(blueprint_id)?;

        let dir = self.root.join(blueprint_id);
        if !dir.is_dir() {
            return Ok(None);
        }

        let meta_path = dir.join(BLUEPRINT_META_FILE);
        let main_file_name = if meta_path.exists() {
            let content = std::fs::read_to_string(&meta_path)?;
            let meta: BlueprintMeta = serde_json::from_str(&content)?;
            meta.main_file_name
        } else {
            DEFAULT_MAIN_FILE_NAME.to_string()
        };

        let record = BlueprintRecord::new(blueprint_id, dir, main_file_name)?;
        Ok(Some(record))
    }
}
