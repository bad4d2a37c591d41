use cloudify_core::CatalogEntry;

/// Exact name and version a catalog lookup asks the registry for.
///
/// Platform and distribution filtering is left to the caller so that "no such
/// plugin" stays distinguishable from "plugin present but unusable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginQuery {
    pub name: String,
    pub version: String,
}

impl PluginQuery {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        entry.package_name == self.name && entry.package_version == self.version
    }
}
