//! Error types for the speckit crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a [`SpecRepository`](crate::SpecRepository).
///
/// Any of these aborts the scan. Unreadable directories are not among them:
/// they are logged and skipped. Specs scanned before the failure stay in the
/// repository, so a caller holding a partial repository must treat it as
/// possibly incomplete.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Spec document could not be read from disk
    #[error("failed to read spec {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Spec document is not valid
    #[error("invalid spec document {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Spec document has no NAME key (strict loading only)
    #[error("spec document {} does not declare a NAME", .path.display())]
    MissingName { path: PathBuf },
}

/// Errors raised while walking `REQUIRES` graphs.
///
/// Unknown spec names are deliberately not an error: they contribute nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A spec transitively requires itself
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Names along the cycle, starting and ending with the repeated spec
        cycle: Vec<String>,
    },
}

/// Result type for loading operations
pub type Result<T> = std::result::Result<T, LoadError>;
