use thiserror::Error;

/// Core error type shared across the workspace crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The plugin catalog violates its invariants.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    /// A blueprint record is malformed.
    #[error("invalid blueprint: {0}")]
    InvalidBlueprint(String),
    /// Platform information could not be determined.
    #[error("platform detection failed: {0}")]
    Platform(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;
