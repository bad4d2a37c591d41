use std::path::Path;

use cloudify_core::{BlueprintRecord, CatalogEntry};

use crate::error::Result;

use super::queries::{RawBlueprint, RawPlugin};

pub fn map_plugins(raw: Vec<RawPlugin>) -> Vec<CatalogEntry> {
    raw.into_iter().map(map_plugin).collect()
}

fn map_plugin(raw: RawPlugin) -> CatalogEntry {
    tracing::trace!(event = "plugin_row", id = %raw.id);
    CatalogEntry {
        package_name: raw.package_name,
        package_version: raw.package_version,
        supported_platform: blank_to_none(raw.supported_platform),
        distribution: blank_to_none(raw.distribution),
        distribution_release: blank_to_none(raw.distribution_release),
        package_path: blank_to_none(raw.package_path),
    }
}

pub fn map_blueprint(raw: RawBlueprint, resources_root: &Path) -> Result<BlueprintRecord> {
    let dir = resources_root.join(&raw.id);
    Ok(BlueprintRecord::new(raw.id, dir, raw.main_file_name)?)
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
