use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use cloudify_core::{PlatformInfo, redact_database_url};
use cloudify_resolver::{ImportResolver, TracedResolver};
use cloudify_storage::{
    BlueprintStore, DirectoryBlueprintStore, FileCatalog, PluginRegistry, PostgresStore,
};

use crate::CliError;
use crate::config::{CatalogSource, ManagerConfig};

pub type ManagerResolver =
    TracedResolver<ImportResolver<Arc<dyn PluginRegistry>, Arc<dyn BlueprintStore>>>;

/// Storage backends selected by the configuration.
pub struct Backends {
    pub registry: Arc<dyn PluginRegistry>,
    pub blueprints: Arc<dyn BlueprintStore>,
}

impl Backends {
    pub fn describe(&self) -> String {
        format!("{}+{}", self.registry.backend(), self.blueprints.backend())
    }

    pub fn into_resolver(self, platform: PlatformInfo, tracing_enabled: bool) -> ManagerResolver {
        TracedResolver::new(
            ImportResolver::new(self.registry, self.blueprints, platform),
            tracing_enabled,
        )
    }
}

pub async fn connect(config: &ManagerConfig) -> Result<Backends, CliError> {
    match &config.catalog {
        CatalogSource::File { path } => Ok(Backends {
            registry: Arc::new(FileCatalog::new(path.clone())),
            blueprints: Arc::new(DirectoryBlueprintStore::new(config.blueprints_root.clone())),
        }),
        CatalogSource::Postgres {
            url,
            max_connections,
        } => {
            let redacted = redact_database_url(url);
            tracing::info!(
                event = "catalog_connecting",
                url = %redacted.redacted,
                max_connections = *max_connections
            );

            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .connect(url)
                .await?;
            let store = PostgresStore::new(pool, config.blueprints_root.clone());

            Ok(Backends {
                registry: Arc::new(store.clone()),
                blueprints: Arc::new(store),
            })
        }
    }
}
