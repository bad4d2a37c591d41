use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use cloudify_core::{CatalogEntry, ImportKind, ImportReference, PlatformInfo, classify};
use cloudify_storage::{BlueprintStore, PluginRegistry};

use crate::blueprint::BlueprintLookup;
use crate::catalog::{CatalogLookup, PluginRequest};
use crate::errors::{ResolveError, Result};

/// Outcome of resolving one import reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedLocation {
    /// A catalog plugin package.
    Plugin {
        reference: String,
        entry: CatalogEntry,
        package_path: String,
    },
    /// The root document of an uploaded blueprint.
    Blueprint {
        reference: String,
        blueprint_id: String,
        path: PathBuf,
    },
    /// Handed back untouched for the parser's own file resolution.
    Plain { reference: String },
}

impl ResolvedLocation {
    pub fn kind(&self) -> ImportKind {
        match self {
            ResolvedLocation::Plugin { .. } => ImportKind::Plugin,
            ResolvedLocation::Blueprint { .. } => ImportKind::Blueprint,
            ResolvedLocation::Plain { .. } => ImportKind::Plain,
        }
    }

    pub fn reference(&self) -> &str {
        match self {
            ResolvedLocation::Plugin { reference, .. }
            | ResolvedLocation::Blueprint { reference, .. }
            | ResolvedLocation::Plain { reference } => reference,
        }
    }

    /// Concrete location as a string: package path, document path, or the reference.
    pub fn location(&self) -> String {
        match self {
            ResolvedLocation::Plugin { package_path, .. } => package_path.clone(),
            ResolvedLocation::Blueprint { path, .. } => path.display().to_string(),
            ResolvedLocation::Plain { reference } => reference.clone(),
        }
    }
}

/// Capability handed to a DSL parser for turning import references into locations.
///
/// Every call is independent: same reference and same backing state give the
/// same result.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation>;
}

#[async_trait]
impl<T: Resolve + ?Sized> Resolve for Arc<T> {
    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation> {
        (**self).resolve(reference).await
    }
}

#[async_trait]
impl<T: Resolve + ?Sized> Resolve for Box<T> {
    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation> {
        (**self).resolve(reference).await
    }
}

/// Resolver that consults the plugin catalog and the blueprint store.
///
/// Holds no mutable state; lookups only read the backends.
#[derive(Debug, Clone)]
pub struct ImportResolver<R, S> {
    catalog: CatalogLookup<R>,
    blueprints: BlueprintLookup<S>,
}

impl<R: PluginRegistry, S: BlueprintStore> ImportResolver<R, S> {
    pub fn new(registry: R, store: S, platform: PlatformInfo) -> Self {
        Self {
            catalog: CatalogLookup::new(registry, platform),
            blueprints: BlueprintLookup::new(store),
        }
    }

    pub fn catalog(&self) -> &CatalogLookup<R> {
        &self.catalog
    }

    pub fn blueprints(&self) -> &BlueprintLookup<S> {
        &self.blueprints
    }

    /// Resolve a reference that has already been classified.
    pub async fn resolve_classified(&self, reference: ImportReference) -> Result<ResolvedLocation> {
        match reference {
            ImportReference::Plugin { raw, plugin } => {
                let Some(version) = plugin.version else {
                    return Err(ResolveError::InvalidReference {
                        reference: raw,
                        message: "plugin imports must specify ?version=".to_string(),
                    });
                };
                let request = PluginRequest {
                    name: plugin.name,
                    version,
                    platform: plugin.platform,
                    distribution: plugin.distribution,
                };
                let location = self.catalog.lookup(&raw, &request).await?;
                Ok(ResolvedLocation::Plugin {
                    reference: raw,
                    entry: location.entry,
                    package_path: location.package_path,
                })
            }
            ImportReference::Blueprint { raw, blueprint_id } => {
                let path = self.blueprints.lookup(&raw, &blueprint_id).await?;
                Ok(ResolvedLocation::Blueprint {
                    reference: raw,
                    blueprint_id,
                    path,
                })
            }
            ImportReference::Plain { raw } => Ok(ResolvedLocation::Plain { reference: raw }),
        }
    }
}

#[async_trait]
impl<R: PluginRegistry, S: BlueprintStore> Resolve for ImportResolver<R, S> {
    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation> {
        let classified = classify(reference);
        let kind = classified.kind();
        tracing::debug!(event = "import_classified", reference = %reference, kind = %kind);

        let outcome = self.resolve_classified(classified).await;
        match &outcome {
            Ok(resolved) => tracing::debug!(
                event = "import_resolved",
                reference = %reference,
                kind = %kind,
                location = %resolved.location()
            ),
            Err(err) => tracing::debug!(
                event = "import_failed",
                reference = %reference,
                kind = %kind,
                error_kind = err.kind(),
                error = %err
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cloudify_core::BlueprintRecord;
    use cloudify_storage::{
        MemoryBlueprintStore, MemoryCatalog, PluginQuery, Result as StorageResult,
    };

    use crate::errors::IncompatibilityReason;

    /// Registry that counts calls, to prove plain imports never reach storage.
    #[derive(Default)]
    struct CountingRegistry {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PluginRegistry for CountingRegistry {
        fn backend(&self) -> &'static str {
            "counting"
        }

        async fn find_plugins(&self, _query: &PluginQuery) -> StorageResult<Vec<CatalogEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn list_plugins(&self) -> StorageResult<Vec<CatalogEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn platform() -> PlatformInfo {
        PlatformInfo::new("linux_x86_64", "centos", "core")
    }

    fn resolver() -> ImportResolver<MemoryCatalog, MemoryBlueprintStore> {
        let catalog = MemoryCatalog::new(vec![
            CatalogEntry::new("cloudify-script-plugin", "1.2")
                .with_platform("any")
                .with_package_path("/plugins/script.wgn"),
            CatalogEntry::new("cloudify-openstack-plugin", "2.0.1")
                .with_platform("linux_x86_64")
                .with_distribution("ubuntu", "jammy")
                .with_package_path("/plugins/os.wgn"),
        ])
        .expect("catalog");
        let store = MemoryBlueprintStore::new([BlueprintRecord::new(
            "imported_blueprint",
            "/uploads/imported_blueprint",
            "blueprint.yaml",
        )
        .expect("record")]);
        ImportResolver::new(catalog, store, platform())
    }

    #[tokio::test]
    async fn resolves_plugin_import() {
        let resolved = resolver()
            .resolve("plugin:cloudify-script-plugin?version=1.2")
            .await
            .expect("resolved");
        assert_eq!(resolved.kind(), ImportKind::Plugin);
        assert_eq!(resolved.location(), "/plugins/script.wgn");
    }

    #[tokio::test]
    async fn distinguishes_missing_from_incompatible_plugins() {
        let resolver = resolver();

        let missing = resolver
            .resolve("plugin:cloudify-script-plugin?version=9.9")
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), "not_found");

        let incompatible = resolver
            .resolve("plugin:cloudify-openstack-plugin?version=2.0.1")
            .await
            .unwrap_err();
        assert_eq!(incompatible.kind(), "invalid_plugin");
        assert!(matches!(
            incompatible,
            ResolveError::InvalidPlugin {
                reason: IncompatibilityReason::Platform(_),
                ..
            }
        ));
        assert_eq!(
            incompatible.reference(),
            Some("plugin:cloudify-openstack-plugin?version=2.0.1")
        );
    }

    #[tokio::test]
    async fn plugin_import_without_version_is_malformed() {
        let err = resolver()
            .resolve("plugin:cloudify-script-plugin")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_reference");
    }

    #[tokio::test]
    async fn resolves_blueprint_import() {
        let resolved = resolver()
            .resolve("blueprint:imported_blueprint")
            .await
            .expect("resolved");
        assert_eq!(
            resolved,
            ResolvedLocation::Blueprint {
                reference: "blueprint:imported_blueprint".to_string(),
                blueprint_id: "imported_blueprint".to_string(),
                path: PathBuf::from("/uploads/imported_blueprint/blueprint.yaml"),
            }
        );

        let err = resolver().resolve("blueprint:absent").await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                kind: ImportKind::Blueprint,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn plain_imports_pass_through_without_storage_access() {
        let registry = Arc::new(CountingRegistry::default());
        let resolver = ImportResolver::new(
            Arc::clone(&registry),
            MemoryBlueprintStore::default(),
            platform(),
        );

        let resolved = resolver.resolve("types/types.yaml").await.expect("plain");
        assert_eq!(
            resolved,
            ResolvedLocation::Plain {
                reference: "types/types.yaml".to_string()
            }
        );
        assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolution_is_idempotent_and_concurrent_safe() {
        let resolver = Arc::new(resolver());
        let reference = "plugin:cloudify-script-plugin?version=1.2";

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move { resolver.resolve(reference).await })
            })
            .collect();

        let first = resolver.resolve(reference).await.expect("resolved");
        for handle in handles {
            let resolved = handle.await.expect("join").expect("resolved");
            assert_eq!(resolved, first);
        }
    }
}
