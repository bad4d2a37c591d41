//! Read-only lookup backends for the plugin catalog and the blueprint store.

pub mod adapter;
pub mod error;
pub mod file;
pub mod memory;
pub mod options;
pub mod postgres;

pub use adapter::{BlueprintStore, PluginRegistry};
pub use error::{Result, StorageError};
pub use file::{DirectoryBlueprintStore, FileCatalog, load_catalog_document, validate_catalog_json};
pub use memory::{MemoryBlueprintStore, MemoryCatalog};
pub use options::PluginQuery;
pub use postgres::PostgresStore;

pub use cloudify_core::{BlueprintRecord, CatalogEntry};
