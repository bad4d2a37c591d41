//! Import resolution for deployment documents.
//!
//! [`ImportResolver`] turns `plugin:` and `blueprint:` references into
//! concrete locations using a plugin registry and a blueprint store, and
//! hands every other reference back untouched. [`YamlDslParser`] composes a
//! document with its imports through any [`Resolve`] implementation.

pub mod audit;
pub mod blueprint;
pub mod catalog;
pub mod errors;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod traced;
pub mod yaml;

pub use audit::audit_catalog;
pub use blueprint::BlueprintLookup;
pub use catalog::{CatalogLookup, PackageLocation, PluginRequest};
pub use errors::{
    IncompatibilityReason, IssueSeverity, ParseError, ResolveError, Result, ValidationIssue,
    ValidationReport,
};
pub use model::{ImportRecord, Plan};
pub use parser::DslParser;
pub use resolver::{ImportResolver, Resolve, ResolvedLocation};
pub use schema::plan_json_schema;
pub use traced::TracedResolver;
pub use yaml::YamlDslParser;

/// Current contract version for `plan.json`.
pub const PLAN_VERSION: &str = "0.1";
