//! On-disk layout and path resolution
//!
//! Layout under the repository root:
//! ```text
//! {root}/
//!   {document}/
//!     latest -> {major.minor.patch}   relative symlink to a version dir
//!     {major.minor.patch}/doc.rext    content file, one per version
//! ```
//!
//! `latest` is a reserved entry name; it is never a valid document or version
//! name and is excluded from every listing.

use std::path::{Path, PathBuf};

use crate::error::{Result, RextError};
use crate::version::Version;

/// Reserved name of the latest-version indirection inside a document dir
pub const LATEST_LINK: &str = "latest";

/// Name of the content file inside every version directory
pub const CONTENT_FILE: &str = "doc.rext";

/// Maps document names and version labels to repository paths
#[derive(Debug, Clone)]
pub struct RepoLayout {
    root: PathBuf,
}

impl RepoLayout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Repository root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all versions of a document
    pub fn document_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Directory of one specific version
    pub fn version_dir(&self, name: &str, version: Version) -> PathBuf {
        self.document_dir(name).join(version.to_string())
    }

    /// Content file of one specific version
    pub fn content_file(&self, name: &str, version: Version) -> PathBuf {
        self.version_dir(name, version).join(CONTENT_FILE)
    }

    /// The latest-version symlink of a document
    pub fn latest_link(&self, name: &str) -> PathBuf {
        self.document_dir(name).join(LATEST_LINK)
    }

    /// Resolve the current latest version label of a document by following
    /// its indirection. This is the only place version labels are recovered
    /// from storage rather than supplied by the caller.
    pub async fn resolve_latest(&self, name: &str) -> Result<Version> {
        let doc_dir = self.document_dir(name);
        if !tokio::fs::try_exists(&doc_dir).await? {
            return Err(RextError::DocumentNotFound(name.to_string()));
        }

        let link = self.latest_link(name);
        let target = match tokio::fs::read_link(&link).await {
            Ok(target) => target,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RextError::VersionNotFound {
                    name: name.to_string(),
                    version: LATEST_LINK.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        // The link targets a version dir; its final component is the label.
        target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RextError::MalformedVersion(target.display().to_string()))?
            .parse()
    }
}

/// Validate a caller-supplied document name before any filesystem access
///
/// Names become single path components under the root, so separators,
/// traversal tokens, and the reserved `latest` entry are all rejected.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RextError::invalid("document 'name' is required"));
    }
    if name == LATEST_LINK {
        return Err(RextError::invalid(format!(
            "document name {:?} is reserved",
            LATEST_LINK
        )));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(RextError::invalid(format!(
            "document name {:?} is not a valid path component",
            name
        )));
    }
    Ok(())
}
