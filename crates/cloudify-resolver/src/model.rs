use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cloudify_core::{CatalogEntry, ImportKind};

/// One import statement and where it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImportRecord {
    /// Reference exactly as written in the document.
    pub reference: String,
    pub kind: ImportKind,
    /// Resolved location (package path, document path, or file path).
    pub location: String,
    /// Document containing the import statement.
    pub imported_by: String,
}

/// Output of parsing a deployment document with its imports composed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tosca_definitions_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Imports in the order they were resolved.
    #[serde(default)]
    pub imports: Vec<ImportRecord>,
    /// Catalog plugins requested through `plugin:` imports, first occurrence wins.
    #[serde(default)]
    pub deployment_plugins_to_install: Vec<CatalogEntry>,
    /// Remaining top-level sections (`node_types`, `node_templates`, `inputs`, ...).
    #[serde(default)]
    pub sections: BTreeMap<String, Value>,
}

impl Plan {
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }
}
