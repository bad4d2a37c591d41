use std::collections::BTreeSet;

use crate::catalog::CatalogEntry;
use crate::error::{Error, Result};

/// A consistency problem found in a plugin catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    /// Position of the offending entry.
    pub index: usize,
    pub code: &'static str,
    /// Entry field the issue points at, if any.
    pub field: Option<&'static str>,
    pub message: String,
}

/// Collect every consistency problem in a plugin catalog, in entry order.
///
/// This checks:
/// - package name and version are non-empty
/// - no two entries share `(name, version, platform, distribution)`
pub fn catalog_issues(entries: &[CatalogEntry]) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.package_name.trim().is_empty() {
            issues.push(CatalogIssue {
                index,
                code: "empty_package_name",
                field: Some("package_name"),
                message: format!("entry #{index} has an empty package_name"),
            });
        }
        if entry.package_version.trim().is_empty() {
            issues.push(CatalogIssue {
                index,
                code: "empty_package_version",
                field: Some("package_version"),
                message: format!(
                    "entry '{}' has an empty package_version",
                    entry.package_name
                ),
            });
        }
        if !seen.insert(entry.key()) {
            issues.push(CatalogIssue {
                index,
                code: "duplicate_entry",
                field: None,
                message: format!(
                    "duplicate entry: {} (platform {}, distribution {})",
                    entry.label(),
                    entry.supported_platform.as_deref().unwrap_or("-"),
                    entry.distribution.as_deref().unwrap_or("-")
                ),
            });
        }
    }

    issues
}

/// Validate internal consistency of a plugin catalog, failing on the first issue.
pub fn validate_catalog(entries: &[CatalogEntry]) -> Result<()> {
    match catalog_issues(entries).into_iter().next() {
        Some(issue) => Err(Error::InvalidCatalog(issue.message)),
        None => Ok(()),
    }
}
