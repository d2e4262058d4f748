//! Error types for loading and querying content.
//!
//! | Type | Scope | Effect |
//! |------|-------|--------|
//! | [`ItemError`] | one content file | collected, reload continues |
//! | [`LoadError`] | whole source | reload aborted, old snapshot kept |
//! | [`ContentError`] | service call | returned to the caller |

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`crate::service::ArticleService`].
#[derive(Debug, Error)]
pub enum ContentError {
    /// Slug absent, or hidden by the requested visibility.
    #[error("article not found: {slug}")]
    NotFound { slug: String },

    #[error("failed to reload articles")]
    Load(#[from] LoadError),

    /// A cached computation failed; nothing was cached.
    #[error("failed to compute `{key}`")]
    Compute {
        key: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ContentError {
    pub fn not_found(slug: impl Into<String>) -> Self {
        Self::NotFound { slug: slug.into() }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// The content source as a whole could not be enumerated.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("content directory `{}` does not exist", .0.display())]
    Missing(PathBuf),

    #[error("`{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

/// One content item that could not become an article.
#[derive(Debug, Error)]
#[error("{}: {reason}", path.display())]
pub struct ItemError {
    pub path: PathBuf,
    pub reason: ItemErrorReason,
}

impl ItemError {
    pub fn new(path: impl Into<PathBuf>, reason: ItemErrorReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }

    pub const fn is_duplicate(&self) -> bool {
        matches!(self.reason, ItemErrorReason::DuplicateSlug { .. })
    }
}

#[derive(Debug, Error)]
pub enum ItemErrorReason {
    #[error("unreadable: {0}")]
    Read(#[source] std::io::Error),

    #[error("missing front matter block")]
    MissingFrontMatter,

    #[error("invalid front matter: {0}")]
    FrontMatter(#[source] serde_yaml::Error),

    #[error("invalid `{field}` date: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("cannot derive a slug")]
    EmptySlug,

    #[error("no `date` in front matter and no file modification time")]
    MissingTimestamp,

    #[error("`{field}` is required for {kind} posts")]
    MissingField { field: &'static str, kind: &'static str },

    #[error("unknown post type `{0}`")]
    UnknownType(String),

    #[error("duplicate slug `{slug}`, first defined in {}", first.display())]
    DuplicateSlug { slug: String, first: PathBuf },
}
