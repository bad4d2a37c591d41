use cloudify_core::{CatalogEntry, ImportKind, PlatformInfo, check_installable, match_score};
use cloudify_storage::{PluginQuery, PluginRegistry};

use crate::errors::{IncompatibilityReason, ResolveError, Result};

/// A plugin request as carried by a `plugin:` import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRequest {
    pub name: String,
    pub version: String,
    pub platform: Option<String>,
    pub distribution: Option<String>,
}

impl PluginRequest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            platform: None,
            distribution: None,
        }
    }

    /// Canonical reference string used in errors for direct lookups.
    pub fn reference(&self) -> String {
        let mut reference = format!("plugin:{}?version={}", self.name, self.version);
        if let Some(distribution) = &self.distribution {
            reference.push_str(&format!("&distribution={distribution}"));
        }
        if let Some(platform) = &self.platform {
            reference.push_str(&format!("&platform={platform}"));
        }
        reference
    }
}

/// The catalog entry chosen for a plugin import and its package location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLocation {
    pub entry: CatalogEntry,
    pub package_path: String,
}

/// Resolves plugin name and version against the registry for one platform.
#[derive(Debug, Clone)]
pub struct CatalogLookup<R> {
    registry: R,
    platform: PlatformInfo,
}

impl<R: PluginRegistry> CatalogLookup<R> {
    pub fn new(registry: R, platform: PlatformInfo) -> Self {
        Self { registry, platform }
    }

    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolve `name==version`, optionally narrowed by platform and distribution.
    pub async fn resolve_plugin(
        &self,
        name: &str,
        version: &str,
        platform: Option<&str>,
        distribution: Option<&str>,
    ) -> Result<PackageLocation> {
        let request = PluginRequest {
            name: name.to_string(),
            version: version.to_string(),
            platform: platform.map(str::to_string),
            distribution: distribution.map(str::to_string),
        };
        self.lookup(&request.reference(), &request).await
    }

    /// Resolve a request, reporting failures against `reference`.
    pub async fn lookup(&self, reference: &str, request: &PluginRequest) -> Result<PackageLocation> {
        if request.name.trim().is_empty() {
            return Err(ResolveError::InvalidReference {
                reference: reference.to_string(),
                message: "plugin name is empty".to_string(),
            });
        }
        if request.version.trim().is_empty() {
            return Err(ResolveError::InvalidReference {
                reference: reference.to_string(),
                message: "plugin version is required".to_string(),
            });
        }

        let query = PluginQuery::new(request.name.as_str(), request.version.as_str());
        let entries = self.registry.find_plugins(&query).await?;
        tracing::debug!(
            event = "catalog_candidates",
            backend = self.registry.backend(),
            plugin = %request.name,
            version = %request.version,
            count = entries.len()
        );

        if entries.is_empty() {
            return Err(ResolveError::NotFound {
                reference: reference.to_string(),
                kind: ImportKind::Plugin,
            });
        }

        let entry = select_entry(entries, request, &self.platform).map_err(|reason| {
            ResolveError::InvalidPlugin {
                reference: reference.to_string(),
                reason,
            }
        })?;

        let Some(package_path) = entry.package_path.clone().filter(|path| !path.is_empty())
        else {
            return Err(ResolveError::InvalidPlugin {
                reference: reference.to_string(),
                reason: IncompatibilityReason::MissingPackage,
            });
        };

        Ok(PackageLocation {
            entry,
            package_path,
        })
    }
}

/// Pick the entry to use among those matching name and version.
///
/// Entries must satisfy the request filters. Installable entries are
/// preferred; among them the best match against the requested (or current)
/// platform and distribution wins, and a tie is ambiguous. With no
/// installable entry the best-matching candidate's mismatch is reported.
fn select_entry(
    entries: Vec<CatalogEntry>,
    request: &PluginRequest,
    platform: &PlatformInfo,
) -> std::result::Result<CatalogEntry, IncompatibilityReason> {
    let candidates: Vec<CatalogEntry> = entries
        .into_iter()
        .filter(|entry| satisfies_filters(entry, request))
        .collect();

    if candidates.is_empty() {
        return Err(IncompatibilityReason::FilterMismatch {
            platform: request.platform.clone(),
            distribution: request.distribution.clone(),
        });
    }

    let target = scoring_target(request, platform);
    let (installable, blocked): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .map(|entry| {
            let verdict = check_installable(&entry, platform);
            (entry, verdict)
        })
        .partition(|(_, verdict)| verdict.is_ok());

    if installable.is_empty() {
        let best = blocked
            .into_iter()
            .max_by_key(|(entry, _)| match_score(entry, &target));
        return match best {
            Some((_, Err(mismatch))) => Err(IncompatibilityReason::Platform(mismatch)),
            _ => Err(IncompatibilityReason::FilterMismatch {
                platform: request.platform.clone(),
                distribution: request.distribution.clone(),
            }),
        };
    }

    let scored: Vec<_> = installable
        .into_iter()
        .map(|(entry, _)| (match_score(&entry, &target), entry))
        .collect();
    let Some(top) = scored.iter().map(|(score, _)| *score).max() else {
        return Err(IncompatibilityReason::Ambiguous { candidates: 0 });
    };
    let mut winners: Vec<CatalogEntry> = scored
        .into_iter()
        .filter(|(score, _)| *score == top)
        .map(|(_, entry)| entry)
        .collect();

    if winners.len() > 1 {
        return Err(IncompatibilityReason::Ambiguous {
            candidates: winners.len(),
        });
    }

    winners.pop().ok_or(IncompatibilityReason::Ambiguous { candidates: 0 })
}

/// Request filters take the place of the detected platform when scoring.
fn scoring_target(request: &PluginRequest, platform: &PlatformInfo) -> PlatformInfo {
    PlatformInfo::new(
        request
            .platform
            .as_deref()
            .unwrap_or(platform.platform.as_str()),
        request
            .distribution
            .as_deref()
            .unwrap_or(platform.distribution.as_str()),
        platform.release.as_str(),
    )
}

fn satisfies_filters(entry: &CatalogEntry, request: &PluginRequest) -> bool {
    let platform_ok = match request.platform.as_deref() {
        None => true,
        Some(_) if entry.is_universal() => true,
        Some(wanted) => field_accepts(entry.supported_platform.as_deref(), wanted),
    };
    let distribution_ok = match request.distribution.as_deref() {
        None => true,
        Some(wanted) => field_accepts(entry.distribution.as_deref(), wanted),
    };
    platform_ok && distribution_ok
}

fn field_accepts(constraint: Option<&str>, wanted: &str) -> bool {
    match constraint {
        None | Some("") => true,
        Some(value) => value.eq_ignore_ascii_case(wanted),
    }
}
