use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::error::{Error, Result};

const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Description of the environment plugins will be installed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Wagon-style platform tag (`<os>_<arch>`).
    pub platform: String,
    pub distribution: String,
    pub release: String,
}

impl PlatformInfo {
    pub fn new(
        platform: impl Into<String>,
        distribution: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            distribution: distribution.into().to_lowercase(),
            release: release.into().to_lowercase(),
        }
    }

    /// Detect the running environment from the target triple and `/etc/os-release`.
    pub fn detect() -> Result<Self> {
        let platform = current_platform_tag();
        let path = Path::new(OS_RELEASE_PATH);
        if !path.exists() {
            return Ok(Self::new(platform, "", ""));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|err| Error::Platform(format!("reading {OS_RELEASE_PATH}: {err}")))?;
        let (distribution, release) = parse_os_release(&content);
        Ok(Self::new(
            platform,
            distribution.unwrap_or_default(),
            release.unwrap_or_default(),
        ))
    }
}

impl fmt::Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.platform, self.distribution, self.release)
    }
}

/// Platform tag in the form wagon archives use, e.g. `linux_x86_64`.
pub fn current_platform_tag() -> String {
    format!("{}_{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Extract the distribution id and release codename from `os-release` content.
pub fn parse_os_release(content: &str) -> (Option<String>, Option<String>) {
    let mut id = None;
    let mut codename = None;
    let mut version_id = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "ID" => id = Some(value),
            "VERSION_CODENAME" => codename = Some(value),
            "VERSION_ID" => version_id = Some(value),
            _ => {}
        }
    }

    (
        id.map(|value| value.to_lowercase()),
        codename.or(version_id).map(|value| value.to_lowercase()),
    )
}

/// Field of a catalog entry that failed the installability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformField {
    Platform,
    Distribution,
    Release,
}

impl fmt::Display for PlatformField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformField::Platform => "platform",
            PlatformField::Distribution => "distribution",
            PlatformField::Release => "release",
        };
        f.write_str(name)
    }
}

/// Why an entry cannot be installed on the current platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformMismatch {
    pub field: PlatformField,
    pub required: Option<String>,
    pub current: String,
}

impl fmt::Display for PlatformMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mismatch: entry requires '{}', environment is '{}'",
            self.field,
            self.required.as_deref().unwrap_or("<unset>"),
            self.current
        )
    }
}

/// Check whether a catalog entry can be installed on `platform`.
///
/// An entry is installable when it declares `any`, or when its platform,
/// distribution, and release all equal the environment's. Unset or empty
/// fields never match, on either side. The first failing field is reported.
pub fn check_installable(
    entry: &CatalogEntry,
    platform: &PlatformInfo,
) -> std::result::Result<(), PlatformMismatch> {
    if entry.is_universal() {
        return Ok(());
    }

    let checks = [
        (
            PlatformField::Platform,
            entry.supported_platform.clone(),
            platform.platform.clone(),
        ),
        (
            PlatformField::Distribution,
            entry.distribution.as_deref().map(str::to_lowercase),
            platform.distribution.clone(),
        ),
        (
            PlatformField::Release,
            entry.distribution_release.as_deref().map(str::to_lowercase),
            platform.release.clone(),
        ),
    ];

    for (field, required, current) in checks {
        let required = required.filter(|value| !value.is_empty());
        if current.is_empty() || required.as_deref() != Some(current.as_str()) {
            return Err(PlatformMismatch {
                field,
                required,
                current,
            });
        }
    }

    Ok(())
}

/// How closely a catalog entry's constraints match a target environment.
///
/// Ordered by the number of non-empty fields equal to the target, then by
/// fewer fields naming something else. `any` never counts as a platform match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub matching: usize,
    pub conflicting: usize,
}

impl Ord for MatchScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.matching
            .cmp(&other.matching)
            .then_with(|| other.conflicting.cmp(&self.conflicting))
    }
}

impl PartialOrd for MatchScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Score `entry` against `target`, field by field.
pub fn match_score(entry: &CatalogEntry, target: &PlatformInfo) -> MatchScore {
    let platform = if entry.is_universal() {
        None
    } else {
        entry.supported_platform.as_deref()
    };
    let fields = [
        (platform, target.platform.as_str()),
        (entry.distribution.as_deref(), target.distribution.as_str()),
        (entry.distribution_release.as_deref(), target.release.as_str()),
    ];

    let mut score = MatchScore {
        matching: 0,
        conflicting: 0,
    };
    for (required, current) in fields {
        let Some(required) = required.filter(|value| !value.is_empty()) else {
            continue;
        };
        if !current.is_empty() && required.eq_ignore_ascii_case(current) {
            score.matching += 1;
        } else {
            score.conflicting += 1;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> PlatformInfo {
        PlatformInfo::new("platform1", "dist1", "rel1")
    }

    #[test]
    fn entry_without_constraints_is_not_installable() {
        let entry = CatalogEntry::new("p", "1");
        let err = check_installable(&entry, &env()).unwrap_err();
        assert_eq!(err.field, PlatformField::Platform);
    }

    #[test]
    fn any_platform_is_always_installable() {
        let entry = CatalogEntry::new("p", "1").with_platform("any");
        assert!(check_installable(&entry, &env()).is_ok());
    }

    #[test]
    fn platform_alone_is_not_enough() {
        let entry = CatalogEntry::new("p", "1").with_platform("platform1");
        let err = check_installable(&entry, &env()).unwrap_err();
        assert_eq!(err.field, PlatformField::Distribution);
    }

    #[test]
    fn distribution_without_platform_is_not_enough() {
        let entry = CatalogEntry::new("p", "1").with_distribution("dist1", "rel1");
        let err = check_installable(&entry, &env()).unwrap_err();
        assert_eq!(err.field, PlatformField::Platform);
    }

    #[test]
    fn full_match_is_installable_case_insensitively() {
        let entry = CatalogEntry::new("p", "1")
            .with_platform("platform1")
            .with_distribution("Dist1", "REL1");
        assert!(check_installable(&entry, &env()).is_ok());
    }

    #[test]
    fn release_mismatch_is_reported() {
        let entry = CatalogEntry::new("p", "1")
            .with_platform("platform1")
            .with_distribution("dist1", "rel2");
        let err = check_installable(&entry, &env()).unwrap_err();
        assert_eq!(err.field, PlatformField::Release);
        assert_eq!(err.required.as_deref(), Some("rel2"));
        assert_eq!(err.current, "rel1");
    }

    #[test]
    fn empty_fields_never_match_an_undetected_environment() {
        let unknown = PlatformInfo::new("platform1", "", "");
        let mut entry = CatalogEntry::new("p", "1").with_platform("platform1");
        entry.distribution = Some(String::new());
        entry.distribution_release = Some(String::new());

        let err = check_installable(&entry, &unknown).unwrap_err();
        assert_eq!(err.field, PlatformField::Distribution);
        assert_eq!(err.required, None);
    }

    #[test]
    fn match_score_prefers_matching_then_fewer_conflicts() {
        let centos = PlatformInfo::new("linux_x86_64", "centos", "core");
        let neutral = CatalogEntry::new("p", "1").with_platform("any");
        let foreign = CatalogEntry::new("p", "1")
            .with_platform("any")
            .with_distribution("rhel", "7");
        let native = CatalogEntry::new("p", "1")
            .with_platform("any")
            .with_distribution("CentOS", "core");

        let neutral = match_score(&neutral, &centos);
        let foreign = match_score(&foreign, &centos);
        let native = match_score(&native, &centos);

        assert_eq!(neutral, MatchScore { matching: 0, conflicting: 0 });
        assert_eq!(foreign, MatchScore { matching: 0, conflicting: 2 });
        assert_eq!(native, MatchScore { matching: 2, conflicting: 0 });
        assert!(native > neutral && neutral > foreign);
    }

    #[test]
    fn parses_os_release_codename_before_version_id() {
        let content = r#"
NAME="Ubuntu"
ID=ubuntu
VERSION_ID="22.04"
VERSION_CODENAME=jammy
"#;
        let (id, release) = parse_os_release(content);
        assert_eq!(id.as_deref(), Some("ubuntu"));
        assert_eq!(release.as_deref(), Some("jammy"));
    }

    #[test]
    fn parses_os_release_without_codename() {
        let content = "ID=\"centos\"\nVERSION_ID=\"7\"\n";
        let (id, release) = parse_os_release(content);
        assert_eq!(id.as_deref(), Some("centos"));
        assert_eq!(release.as_deref(), Some("7"));
    }
}
