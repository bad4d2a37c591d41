use std::path::PathBuf;

use cloudify_core::ImportKind;
use cloudify_storage::BlueprintStore;

use crate::errors::{ResolveError, Result};

/// Resolves blueprint ids to the root document of the uploaded blueprint.
#[derive(Debug, Clone)]
pub struct BlueprintLookup<S> {
    store: S,
}

impl<S: BlueprintStore> BlueprintLookup<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn resolve_blueprint(&self, blueprint_id: &str) -> Result<PathBuf> {
        self.lookup(&format!("blueprint:{blueprint_id}"), blueprint_id)
            .await
    }

    /// Resolve `blueprint_id`, reporting failures against `reference`.
    pub async fn lookup(&self, reference: &str, blueprint_id: &str) -> Result<PathBuf> {
        if blueprint_id.trim().is_empty() {
            return Err(ResolveError::InvalidReference {
                reference: reference.to_string(),
                message: "blueprint id is empty".to_string(),
            });
        }

        match self.store.get_blueprint(blueprint_id).await? {
            Some(record) => Ok(record.root_document()),
            None => Err(ResolveError::NotFound {
                reference: reference.to_string(),
                kind: ImportKind::Blueprint,
            }),
        }
    }
}
