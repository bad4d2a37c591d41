use std::collections::BTreeMap;

use async_trait::async_trait;

use cloudify_core::{BlueprintRecord, CatalogEntry, validate_catalog};

use crate::adapter::{BlueprintStore, PluginRegistry};
use crate::error::Result;
use crate::options::PluginQuery;

/// Catalog held in memory, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: Vec<CatalogEntry>,
}

impl MemoryCatalog {
    /// Build a catalog, rejecting duplicate or malformed entries.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        validate_catalog(&entries)?;
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PluginRegistry for MemoryCatalog {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_plugins(&self, query: &PluginQuery) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect())
    }

    async fn list_plugins(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.entries.clone())
    }
}

/// Blueprint store held in memory, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlueprintStore {
    records: BTreeMap<String, BlueprintRecord>,
}

impl MemoryBlueprintStore {
    /// Build a store; a later record with the same id replaces an earlier one.
    pub fn new(records: impl IntoIterator<Item = BlueprintRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

#[async_trait]
impl BlueprintStore for MemoryBlueprintStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_blueprint(&self, blueprint_id: &str) -> Result<Option<BlueprintRecord>> {
        Ok(self.records.get(blueprint_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[tokio::test]
    async fn finds_only_exact_name_and_version() {
        let catalog = MemoryCatalog::new(vec![
            CatalogEntry::new("cloudify-script-plugin", "1.2").with_platform("any"),
            CatalogEntry::new("cloudify-script-plugin", "1.3").with_platform("any"),
            CatalogEntry::new("cloudify-fabric-plugin", "1.2").with_platform("any"),
        ])
        .expect("valid catalog");

        let found = catalog
            .find_plugins(&PluginQuery::new("cloudify-script-plugin", "1.2"))
            .await
            .expect("lookup");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package_version, "1.2");
    }

    #[test]
    fn rejects_duplicate_entries() {
        let result = MemoryCatalog::new(vec![
            CatalogEntry::new("p", "1").with_platform("any"),
            CatalogEntry::new("p", "1").with_platform("any"),
        ]);
        assert!(matches!(result, Err(StorageError::Core(_))));
    }

    #[tokio::test]
    async fn blueprint_lookup_is_by_exact_id() {
        let store = MemoryBlueprintStore::new([BlueprintRecord::new(
            "imported_blueprint",
            "/uploads/imported_blueprint",
            "blueprint.yaml",
        )
        .expect("record")]);

        assert!(store.get_blueprint("imported_blueprint").await.expect("lookup").is_some());
        assert!(store.get_blueprint("imported").await.expect("lookup").is_none());
    }
}
