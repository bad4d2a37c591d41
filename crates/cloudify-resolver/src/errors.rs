use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use cloudify_core::{ImportKind, PlatformMismatch};
use cloudify_storage::StorageError;

/// Why a catalog entry matching name and version cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncompatibilityReason {
    /// The entry is built for another platform, distribution, or release.
    Platform(PlatformMismatch),
    /// The selected entry has no package location.
    MissingPackage,
    /// Several installable entries match the platform equally well.
    Ambiguous { candidates: usize },
    /// Entries exist but none satisfies the requested platform/distribution.
    FilterMismatch {
        platform: Option<String>,
        distribution: Option<String>,
    },
}

impl fmt::Display for IncompatibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompatibilityReason::Platform(mismatch) => write!(f, "{mismatch}"),
            IncompatibilityReason::MissingPackage => {
                write!(f, "malformed catalog entry: missing package path")
            }
            IncompatibilityReason::Ambiguous { candidates } => {
                write!(f, "ambiguous match: {candidates} equally matching entries")
            }
            IncompatibilityReason::FilterMismatch {
                platform,
                distribution,
            } => write!(
                f,
                "no entry satisfies platform '{}' and distribution '{}'",
                platform.as_deref().unwrap_or("*"),
                distribution.as_deref().unwrap_or("*")
            ),
        }
    }
}

/// Errors surfaced by import resolution.
///
/// The resolver never retries and never swallows one of these; callers see
/// the offending reference exactly as written.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{kind} import '{reference}' not found")]
    NotFound { reference: String, kind: ImportKind },
    #[error("invalid plugin for import '{reference}': {reason}")]
    InvalidPlugin {
        reference: String,
        reason: IncompatibilityReason,
    },
    #[error("malformed import '{reference}': {message}")]
    InvalidReference { reference: String, message: String },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ResolveError {
    /// Stable tag callers can branch on.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::NotFound { .. } => "not_found",
            ResolveError::InvalidPlugin { .. } => "invalid_plugin",
            ResolveError::InvalidReference { .. } => "invalid_reference",
            ResolveError::Storage(_) => "storage",
        }
    }

    /// The offending reference, when the error is tied to one.
    pub fn reference(&self) -> Option<&str> {
        match self {
            ResolveError::NotFound { reference, .. }
            | ResolveError::InvalidPlugin { reference, .. }
            | ResolveError::InvalidReference { reference, .. } => Some(reference),
            ResolveError::Storage(_) => None,
        }
    }
}

/// Errors raised while parsing a deployment document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("yaml error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid document {}: {message}", path.display())]
    InvalidDocument { path: PathBuf, message: String },
    #[error("import '{reference}' from {} not found", importer.display())]
    ImportNotFound { reference: String, importer: PathBuf },
    #[error("unsupported import '{reference}'")]
    UnsupportedImport { reference: String },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ParseError {
    /// The resolver failure that aborted the parse, if any.
    pub fn resolve_error(&self) -> Option<&ResolveError> {
        match self {
            ParseError::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

/// Severity level for audit issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured audit issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated audit report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            IssueSeverity::Error => self.errors.push(issue),
            IssueSeverity::Warning => self.warnings.push(issue),
        }
    }
}

/// Result type for resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;
