use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const PLUGIN_PREFIX: &str = "plugin:";
const BLUEPRINT_PREFIX: &str = "blueprint:";

/// Classification tag of an import reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Plugin,
    Blueprint,
    Plain,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportKind::Plugin => "plugin",
            ImportKind::Blueprint => "blueprint",
            ImportKind::Plain => "plain",
        };
        f.write_str(name)
    }
}

/// Fields extracted from a `plugin:` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRef {
    pub name: String,
    pub version: Option<String>,
    pub distribution: Option<String>,
    pub platform: Option<String>,
}

/// A classified import reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportReference {
    Plugin { raw: String, plugin: PluginRef },
    Blueprint { raw: String, blueprint_id: String },
    Plain { raw: String },
}

impl ImportReference {
    pub fn kind(&self) -> ImportKind {
        match self {
            ImportReference::Plugin { .. } => ImportKind::Plugin,
            ImportReference::Blueprint { .. } => ImportKind::Blueprint,
            ImportReference::Plain { .. } => ImportKind::Plain,
        }
    }

    /// The reference exactly as written in the importing document.
    pub fn raw(&self) -> &str {
        match self {
            ImportReference::Plugin { raw, .. }
            | ImportReference::Blueprint { raw, .. }
            | ImportReference::Plain { raw } => raw,
        }
    }
}

/// Classify a raw import reference.
///
/// Total and pure: every string maps to exactly one kind and nothing outside
/// the string is consulted. Unrecognized syntax is `Plain`.
pub fn classify(raw: &str) -> ImportReference {
    let trimmed = raw.trim();

    if let Some(rest) = trimmed.strip_prefix(PLUGIN_PREFIX) {
        return ImportReference::Plugin {
            raw: raw.to_string(),
            plugin: parse_plugin_ref(rest),
        };
    }

    if let Some(rest) = trimmed.strip_prefix(BLUEPRINT_PREFIX) {
        return ImportReference::Blueprint {
            raw: raw.to_string(),
            blueprint_id: rest.trim().to_string(),
        };
    }

    ImportReference::Plain {
        raw: raw.to_string(),
    }
}

fn parse_plugin_ref(rest: &str) -> PluginRef {
    let (name, query) = match rest.split_once('?') {
        Some((name, query)) => (name, query),
        None => (rest, ""),
    };

    let mut plugin = PluginRef {
        name: name.trim().to_string(),
        version: None,
        distribution: None,
        platform: None,
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "version" => plugin.version = Some(value.to_string()),
            "distribution" => plugin.distribution = Some(value.to_string()),
            "platform" => plugin.platform = Some(value.to_string()),
            _ => {}
        }
    }

    plugin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_plugin_reference_with_query() {
        let reference =
            classify("plugin:cloudify-script-plugin?version=1.2&distribution=centos&x=1");
        let ImportReference::Plugin { plugin, .. } = &reference else {
            panic!("expected plugin reference, got {reference:?}");
        };
        assert_eq!(plugin.name, "cloudify-script-plugin");
        assert_eq!(plugin.version.as_deref(), Some("1.2"));
        assert_eq!(plugin.distribution.as_deref(), Some("centos"));
        assert_eq!(plugin.platform, None);
    }

    #[test]
    fn empty_query_values_count_as_absent() {
        let reference = classify("plugin:p?version=&platform=linux_x86_64");
        let ImportReference::Plugin { plugin, .. } = reference else {
            panic!("expected plugin reference");
        };
        assert_eq!(plugin.version, None);
        assert_eq!(plugin.platform.as_deref(), Some("linux_x86_64"));
    }

    #[test]
    fn classifies_blueprint_reference() {
        let reference = classify("blueprint:imported_blueprint");
        assert_eq!(reference.kind(), ImportKind::Blueprint);
        assert_eq!(
            reference,
            ImportReference::Blueprint {
                raw: "blueprint:imported_blueprint".to_string(),
                blueprint_id: "imported_blueprint".to_string(),
            }
        );
    }

    #[test]
    fn everything_else_is_plain_and_unchanged() {
        for raw in [
            "types.yaml",
            "http://www.getcloudify.org/spec/cloudify/4.3/types.yaml",
            "Plugin:upper-case.yaml",
            "",
            "   ",
        ] {
            let reference = classify(raw);
            assert_eq!(reference.kind(), ImportKind::Plain, "{raw:?}");
            assert_eq!(reference.raw(), raw);
        }
    }

    #[test]
    fn malformed_markup_still_classifies() {
        let reference = classify("plugin:");
        let ImportReference::Plugin { plugin, .. } = reference else {
            panic!("expected plugin reference");
        };
        assert!(plugin.name.is_empty());
        assert_eq!(classify("blueprint:").kind(), ImportKind::Blueprint);
    }
}
