//! Core contracts shared by the import resolution crates.
//!
//! This crate defines the plugin catalog and blueprint record types, the
//! import reference classifier, the platform installability policy, and
//! small helpers used by storage backends and the CLI.

pub mod blueprint;
pub mod catalog;
pub mod error;
pub mod platform;
pub mod redaction;
pub mod reference;
pub mod schema;
pub mod validation;

pub use blueprint::{BlueprintRecord, DEFAULT_MAIN_FILE_NAME, validate_blueprint_id};
pub use catalog::{CatalogDocument, CatalogEntry, SUPPORTED_PLATFORM_ANY};
pub use error::{Error, Result};
pub use platform::{
    MatchScore, PlatformField, PlatformInfo, PlatformMismatch, check_installable, match_score,
};
pub use redaction::{RedactedUrl, redact_database_url};
pub use reference::{ImportKind, ImportReference, PluginRef, classify};
pub use schema::catalog_json_schema;
pub use validation::{CatalogIssue, catalog_issues, validate_catalog};

/// Current contract version for catalog files.
pub const CATALOG_VERSION: &str = "0.1";
