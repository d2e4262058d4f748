//! In-memory content corpus.
//!
//! ```text
//! ContentSource ──► frontmatter::parse (rayon) ──► Loader fold ──► ContentIndex
//!   (walkdir)          RawItem → Article            dup slugs       immutable
//! ```
//!
//! A [`ContentIndex`] is never mutated after construction; reloading builds a
//! new one and swaps it in (see [`crate::store`]).

pub mod article;
pub mod frontmatter;
pub mod index;
pub mod loader;
pub mod pagination;
pub mod search;
pub mod source;
pub mod stats;

pub use article::{Article, ArticleSummary, PostType};
pub use index::ContentIndex;
pub use loader::{LoadOutcome, Loader};
pub use pagination::Pagination;
pub use search::SearchResult;
pub use source::{ContentSource, FsSource, RawItem};
pub use stats::{SnapshotInfo, Stats};

/// Page size used when a caller asks for zero items per page.
pub const DEFAULT_PER_PAGE: usize = 10;
