//! Versioned document repository
//!
//! The engine behind the five public operations: create, list, retrieve,
//! update, destroy. Every operation resolves paths through [`RepoLayout`]
//! and keeps one invariant across its multi-step filesystem protocols: the
//! `latest` indirection of a document always names the maximum version
//! present, and no indirection exists for an empty document.

use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::content::Content;
use crate::error::{Result, RextError};
use crate::layout::{validate_name, RepoLayout, LATEST_LINK};
use crate::version::Version;

#[cfg(unix)]
use tokio::fs::symlink;
#[cfg(windows)]
use tokio::fs::symlink_dir as symlink;

/// A handle to one repository root
///
/// The root directory must already exist; it is created by the caller, never
/// by the engine. Mutating operations on the same document are serialized
/// through a per-document lock, so two writers cannot corrupt one document's
/// pointer; operations on different documents run without coordination since
/// their subtrees are disjoint.
#[derive(Debug)]
pub struct Repository {
    layout: RepoLayout,

    /// Per-document write locks, created lazily on first mutation
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Repository {
    /// Open a repository rooted at an existing directory
    ///
    /// Fails at construction time if the root does not exist or is not a
    /// directory; this is never deferred to the first operation.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        match tokio::fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(RextError::invalid(format!(
                    "repository root {:?} is not a directory",
                    root
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RextError::invalid(format!(
                    "can't find repository {:?}",
                    root
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            layout: RepoLayout::new(root),
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Repository root directory
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Acquire the write lock for one document name
    async fn lock_document(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Atomically point the latest indirection of `name` at `version`
    ///
    /// The new link is created under a temporary name and renamed over the
    /// old one, so a reader resolving `latest` sees either the previous
    /// target or the new one, never a missing or dangling pointer.
    async fn set_latest(&self, name: &str, version: Version) -> Result<()> {
        let link = self.layout.latest_link(name);
        let staging = self.layout.document_dir(name).join(".latest.tmp");

        // A stale staging link may survive an interrupted swap.
        let _ = tokio::fs::remove_file(&staging).await;
        symlink(version.to_string(), &staging).await?;
        tokio::fs::rename(&staging, &link).await?;
        Ok(())
    }

    /// Create a new version of a document
    ///
    /// For a document with no prior versions any well-formed label is
    /// admitted and becomes the first latest. Otherwise the label must sort
    /// strictly above the current latest: an equal label is rejected with
    /// [`RextError::VersionAlreadyExists`] and an older one with
    /// [`RextError::VersionTooOld`] naming the blocking label.
    pub async fn create(
        &self,
        name: &str,
        version: &str,
        content: impl Into<Content>,
    ) -> Result<()> {
        validate_name(name)?;
        let version: Version = version.parse()?;
        let content = content.into();

        let _guard = self.lock_document(name).await;

        let doc_dir = self.layout.document_dir(name);
        if tokio::fs::try_exists(&doc_dir).await? {
            let latest = self.layout.resolve_latest(name).await?;
            match version.cmp(&latest) {
                std::cmp::Ordering::Equal => {
                    return Err(RextError::VersionAlreadyExists(version));
                }
                std::cmp::Ordering::Less => {
                    return Err(RextError::VersionTooOld {
                        requested: version,
                        latest,
                    });
                }
                std::cmp::Ordering::Greater => {}
            }
        } else {
            tokio::fs::create_dir(&doc_dir).await?;
        }

        // The version must be fully on disk before the pointer moves to it.
        tokio::fs::create_dir(self.layout.version_dir(name, version)).await?;
        content
            .write_to(&self.layout.content_file(name, version))
            .await?;
        self.set_latest(name, version).await?;

        tracing::info!("Created document {} version {}", name, version);
        Ok(())
    }

    /// List the names of all documents in the repository
    pub async fn list_documents(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(self.layout.root()).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if name != LATEST_LINK => names.push(name),
                _ => {}
            }
        }

        Ok(names)
    }

    /// List all version labels of a document, in unspecified order
    ///
    /// The reserved `latest` entry is never included; entries that do not
    /// parse as version labels are skipped. A missing document is an error,
    /// not an empty listing.
    pub async fn list_versions(&self, name: &str) -> Result<Vec<Version>> {
        validate_name(name)?;

        let doc_dir = self.layout.document_dir(name);
        let mut entries = match tokio::fs::read_dir(&doc_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RextError::DocumentNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(v) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                versions.push(v);
            }
        }

        Ok(versions)
    }

    /// Resolve the current latest version label of a document
    pub async fn latest(&self, name: &str) -> Result<Version> {
        validate_name(name)?;
        self.layout.resolve_latest(name).await
    }

    /// Retrieve the content of one version of a document
    ///
    /// An omitted version (or the literal `"latest"` token) targets the
    /// current latest. The content is returned fully buffered.
    pub async fn retrieve(&self, name: &str, version: Option<&str>) -> Result<Bytes> {
        validate_name(name)?;

        let version = match version {
            None => None,
            Some(LATEST_LINK) => None,
            Some(label) => Some(label.parse::<Version>()?),
        };

        let version = match version {
            Some(v) => {
                let doc_dir = self.layout.document_dir(name);
                if !tokio::fs::try_exists(&doc_dir).await? {
                    return Err(RextError::DocumentNotFound(name.to_string()));
                }
                if !tokio::fs::try_exists(self.layout.version_dir(name, v)).await? {
                    return Err(RextError::VersionNotFound {
                        name: name.to_string(),
                        version: v.to_string(),
                    });
                }
                v
            }
            None => self.layout.resolve_latest(name).await?,
        };

        let data = tokio::fs::read(self.layout.content_file(name, version)).await?;
        Ok(Bytes::from(data))
    }

    /// Overwrite the content of the current latest version in place
    ///
    /// Never moves the latest pointer and never creates a version; the set
    /// of version labels is identical before and after. Other documents are
    /// untouched.
    pub async fn update(&self, name: &str, content: impl Into<Content>) -> Result<()> {
        validate_name(name)?;
        let content = content.into();

        let _guard = self.lock_document(name).await;

        let latest = self.layout.resolve_latest(name).await?;
        content
            .write_to(&self.layout.content_file(name, latest))
            .await?;

        tracing::debug!("Updated document {} at version {}", name, latest);
        Ok(())
    }

    /// Remove a document and its entire version history
    pub async fn destroy(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let _guard = self.lock_document(name).await;

        let doc_dir = self.layout.document_dir(name);
        if !tokio::fs::try_exists(&doc_dir).await? {
            return Err(RextError::DocumentNotFound(name.to_string()));
        }
        tokio::fs::remove_dir_all(&doc_dir).await?;

        tracing::info!("Destroyed document {}", name);
        Ok(())
    }

    /// Remove a single version of a document, leaving siblings intact
    ///
    /// When the removed version is the current latest, the pointer is
    /// rewound to the newest surviving version before the old directory is
    /// deleted, so it never dangles. Removing the only version removes the
    /// whole document: an empty document never keeps a pointer.
    pub async fn destroy_version(&self, name: &str, version: &str) -> Result<()> {
        validate_name(name)?;
        let version: Version = version.parse()?;

        let _guard = self.lock_document(name).await;

        let doc_dir = self.layout.document_dir(name);
        if !tokio::fs::try_exists(&doc_dir).await? {
            return Err(RextError::DocumentNotFound(name.to_string()));
        }
        let version_dir = self.layout.version_dir(name, version);
        if !tokio::fs::try_exists(&version_dir).await? {
            return Err(RextError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        let latest = self.layout.resolve_latest(name).await?;
        if version == latest {
            let survivor = self
                .list_versions(name)
                .await?
                .into_iter()
                .filter(|v| *v != version)
                .max();

            match survivor {
                Some(next) => self.set_latest(name, next).await?,
                None => {
                    tokio::fs::remove_dir_all(&doc_dir).await?;
                    tracing::info!("Destroyed document {} with last version {}", name, version);
                    return Ok(());
                }
            }
        }

        tokio::fs::remove_dir_all(&version_dir).await?;
        tracing::info!("Destroyed document {} version {}", name, version);
        Ok(())
    }
}
