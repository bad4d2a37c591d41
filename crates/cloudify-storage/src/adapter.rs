use std::sync::Arc;

use async_trait::async_trait;

use cloudify_core::{BlueprintRecord, CatalogEntry};

use crate::error::Result;
use crate::options::PluginQuery;

/// Read access to the registry of uploaded plugin packages.
///
/// Implementations only read shared state and must be safe to call from
/// several tasks at once.
#[async_trait]
pub trait PluginRegistry: Send + Sync {
    /// Returns the backend identifier (e.g. `postgres`).
    fn backend(&self) -> &'static str;

    /// All entries whose name and version equal the query, in a stable order.
    async fn find_plugins(&self, query: &PluginQuery) -> Result<Vec<CatalogEntry>>;

    /// Every registered entry, in a stable order.
    async fn list_plugins(&self) -> Result<Vec<CatalogEntry>>;
}

/// Read access to uploaded blueprints.
#[async_trait]
pub trait BlueprintStore: Send + Sync {
    /// Returns the backend identifier (e.g. `directory`).
    fn backend(&self) -> &'static str;

    /// Look up a blueprint by id; `None` when nothing was uploaded under it.
    async fn get_blueprint(&self, blueprint_id: &str) -> Result<Option<BlueprintRecord>>;
}

#[async_trait]
impl<T: PluginRegistry + ?Sized> PluginRegistry for Box<T> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn find_plugins(&self, query: &PluginQuery) -> Result<Vec<CatalogEntry>> {
        (**self).find_plugins(query).await
    }

    async fn list_plugins(&self) -> Result<Vec<CatalogEntry>> {
        (**self).list_plugins().await
    }
}

#[async_trait]
impl<T: PluginRegistry + ?Sized> PluginRegistry for Arc<T> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn find_plugins(&self, query: &PluginQuery) -> Result<Vec<CatalogEntry>> {
        (**self).find_plugins(query).await
    }

    async fn list_plugins(&self) -> Result<Vec<CatalogEntry>> {
        (**self).list_plugins().await
    }
}

#[async_trait]
impl<T: BlueprintStore + ?Sized> BlueprintStore for Box<T> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn get_blueprint(&self, blueprint_id: &str) -> Result<Option<BlueprintRecord>> {
        (**self).get_blueprint(blueprint_id).await
    }
}

#[async_trait]
impl<T: BlueprintStore + ?Sized> BlueprintStore for Arc<T> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn get_blueprint(&self, blueprint_id: &str) -> Result<Option<BlueprintRecord>> {
        (**self).get_blueprint(blueprint_id).await
    }
}
