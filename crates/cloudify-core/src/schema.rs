use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::catalog::CatalogDocument;

/// Emit the JSON Schema for `catalog.json`.
pub fn catalog_json_schema() -> RootSchema {
    schema_for!(CatalogDocument)
}
