use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::PgPool;

use cloudify_core::{BlueprintRecord, CatalogEntry};

use crate::adapter::{BlueprintStore, PluginRegistry};
use crate::error::Result;
use crate::options::PluginQuery;

mod mapper;
mod queries;

/// Catalog and blueprint store backed by the manager's PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    resources_root: PathBuf,
}

impl PostgresStore {
    /// Create a store using a pre-configured pool.
    ///
    /// `resources_root` is the directory uploaded blueprints are extracted to.
    pub fn new(pool: PgPool, resources_root: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            resources_root: resources_root.into(),
        }
    }
}

#[async_trait]
impl PluginRegistry for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn find_plugins(&self, query: &PluginQuery) -> Result<Vec<CatalogEntry>> {
        let rows =
            queries::list_plugins_by_name_version(&self.pool, &query.name, &query.version).await?;
        Ok(mapper::map_plugins(rows))
    }

    async fn list_plugins(&self) -> Result<Vec<CatalogEntry>> {
        let rows = queries::list_all_plugins(&self.pool).await?;
        Ok(mapper::map_plugins(rows))
    }
}

#[async_trait]
impl BlueprintStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn get_blueprint(&self, blueprint_id: &str) -> Result<Option<BlueprintRecord>> {
        match queries::fetch_blueprint(&self.pool, blueprint_id).await? {
            Some(raw) => Ok(Some(mapper::map_blueprint(raw, &self.resources_root)?)),
            None => Ok(None),
        }
    }
}
