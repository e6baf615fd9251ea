//! Error types for repository operations

use crate::version::Version;

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RextError>;

/// Errors that can occur during repository operations
#[derive(Debug, thiserror::Error)]
pub enum RextError {
    /// A required request field is missing or structurally invalid.
    /// Always raised before any filesystem access is attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed version label: {0:?}")]
    MalformedVersion(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("version {version} of document {name} not found")]
    VersionNotFound { name: String, version: String },

    #[error("version {0} already exists, use update instead")]
    VersionAlreadyExists(Version),

    /// The requested version sorts below the current latest; the
    /// blocking label is carried for the caller.
    #[error("version {requested} is older than latest {latest}")]
    VersionTooOld { requested: Version, latest: Version },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RextError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
