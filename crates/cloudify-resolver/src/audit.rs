use std::collections::BTreeMap;

use cloudify_core::{CatalogEntry, PlatformInfo, catalog_issues, check_installable, match_score};

use crate::errors::{IssueSeverity, ValidationIssue, ValidationReport};

/// Audit a plugin catalog as seen from `platform`.
///
/// Errors are the catalog consistency issues (empty identity fields,
/// duplicate identities). Warnings flag entries that will fail at resolution
/// time on this host: no package path, not installable here, or installable
/// builds of the same `name==version` that match this host equally well.
pub fn audit_catalog(entries: &[CatalogEntry], platform: &PlatformInfo) -> ValidationReport {
    let mut report = ValidationReport::default();

    for issue in catalog_issues(entries) {
        let path = match issue.field {
            Some(field) => format!("/plugins/{}/{field}", issue.index),
            None => format!("/plugins/{}", issue.index),
        };
        let hint = (issue.code == "duplicate_entry")
            .then(|| "entries must differ by supported_platform or distribution".to_string());
        report.push(ValidationIssue::new(
            IssueSeverity::Error,
            issue.code,
            path,
            issue.message,
            hint,
        ));
    }

    let mut installable: BTreeMap<(&str, &str), Vec<&CatalogEntry>> = BTreeMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        let path = format!("/plugins/{idx}");

        if entry
            .package_path
            .as_deref()
            .is_none_or(|value| value.trim().is_empty())
        {
            report.push(ValidationIssue::new(
                IssueSeverity::Warning,
                "missing_package_path",
                format!("{path}/package_path"),
                format!("{} has no package path", entry.label()),
                None,
            ));
        }

        match check_installable(entry, platform) {
            Ok(()) => installable
                .entry((entry.package_name.as_str(), entry.package_version.as_str()))
                .or_default()
                .push(entry),
            Err(mismatch) => report.push(ValidationIssue::new(
                IssueSeverity::Warning,
                "not_installable",
                path,
                format!("{} is not installable here: {mismatch}", entry.label()),
                None,
            )),
        }
    }

    for ((name, version), builds) in installable {
        let scores: Vec<_> = builds
            .iter()
            .map(|entry| match_score(entry, platform))
            .collect();
        let Some(top) = scores.iter().max() else {
            continue;
        };
        let tied = scores.iter().filter(|score| *score == top).count();
        if tied > 1 {
            report.push(ValidationIssue::new(
                IssueSeverity::Warning,
                "ambiguous_entries",
                "/plugins",
                format!(
                    "{tied} installable builds of {name}=={version} match this platform equally"
                ),
                Some("narrow the entries by distribution or distribution_release".to_string()),
            ));
        }
    }

    report
}
