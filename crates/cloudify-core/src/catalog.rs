use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::CATALOG_VERSION;

/// Marker used by plugins that can be installed on any platform.
pub const SUPPORTED_PLATFORM_ANY: &str = "any";

/// A plugin package registered in the catalog.
///
/// Entries are identified by `(package_name, package_version,
/// supported_platform, distribution)` and are never mutated once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogEntry {
    /// Plugin package name (e.g. `cloudify-script-plugin`).
    pub package_name: String,
    /// Plugin package version (e.g. `1.2`).
    pub package_version: String,
    /// Wagon platform tag (e.g. `linux_x86_64`) or `any`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_platform: Option<String>,
    /// Linux distribution the package was built for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    /// Distribution release (codename) the package was built for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_release: Option<String>,
    /// Location of the uploaded package archive (path or URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_path: Option<String>,
}

impl CatalogEntry {
    /// Create an entry with no platform constraints and no package location.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: name.into(),
            package_version: version.into(),
            supported_platform: None,
            distribution: None,
            distribution_release: None,
            package_path: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.supported_platform = Some(platform.into());
        self
    }

    pub fn with_distribution(
        mut self,
        distribution: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        self.distribution = Some(distribution.into());
        self.distribution_release = Some(release.into());
        self
    }

    pub fn with_package_path(mut self, path: impl Into<String>) -> Self {
        self.package_path = Some(path.into());
        self
    }

    /// Returns true when the entry declares itself installable everywhere.
    pub fn is_universal(&self) -> bool {
        self.supported_platform.as_deref() == Some(SUPPORTED_PLATFORM_ANY)
    }

    /// Identity tuple used for catalog uniqueness.
    pub fn key(&self) -> (&str, &str, Option<&str>, Option<&str>) {
        (
            self.package_name.as_str(),
            self.package_version.as_str(),
            self.supported_platform.as_deref(),
            self.distribution.as_deref(),
        )
    }

    /// Short human label (`name==version`).
    pub fn label(&self) -> String {
        format!("{}=={}", self.package_name, self.package_version)
    }
}

/// On-disk catalog file (`catalog.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogDocument {
    /// Contract version for this catalog format.
    #[serde(default = "default_catalog_version")]
    pub catalog_version: String,
    /// Registered plugin packages.
    #[serde(default)]
    pub plugins: Vec<CatalogEntry>,
}

impl Default for CatalogDocument {
    fn default() -> Self {
        Self {
            catalog_version: default_catalog_version(),
            plugins: Vec::new(),
        }
    }
}

fn default_catalog_version() -> String {
    CATALOG_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universal_marker_is_exact() {
        assert!(CatalogEntry::new("cloudify-script-plugin", "1.2")
            .with_platform("any")
            .is_universal());
        assert!(!CatalogEntry::new("p", "1")
            .with_platform("linux_x86_64")
            .is_universal());
    }

    #[test]
    fn key_ignores_release_and_package_path() {
        let a = CatalogEntry::new("p", "1")
            .with_platform("linux_x86_64")
            .with_distribution("centos", "core")
            .with_package_path("/a");
        let b = CatalogEntry::new("p", "1")
            .with_platform("linux_x86_64")
            .with_distribution("centos", "7")
            .with_package_path("/b");
        assert_eq!(a.key(), b.key());
    }
}
