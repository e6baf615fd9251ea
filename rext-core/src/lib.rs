//! Rext Core Library
//!
//! A filesystem-backed store for named documents with an immutable
//! per-document version history and a mutable `latest` indirection:
//! - Version labels and their numeric ordering
//! - On-disk layout and path resolution
//! - Buffered and streaming content sources
//! - The repository engine: create / list / retrieve / update / destroy

pub mod content;
pub mod error;
pub mod layout;
pub mod repository;
pub mod version;

pub use content::Content;
pub use error::{Result, RextError};
pub use layout::{RepoLayout, CONTENT_FILE, LATEST_LINK};
pub use repository::Repository;
pub use version::Version;
