//! `[content]` section configuration.
//!
//! Where content lives and how listings are paged.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[content]` section in quire.toml.
///
/// # Example
/// ```toml
/// [content]
/// dir = "content"
/// extensions = ["md"]
/// per_page = 10
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ContentSection {
    /// Content directory, relative to the project root.
    #[serde(default = "defaults::content::dir")]
    #[educe(Default = defaults::content::dir())]
    pub dir: PathBuf,

    /// File extensions (without the dot) treated as content.
    #[serde(default = "defaults::content::extensions")]
    #[educe(Default = defaults::content::extensions())]
    pub extensions: Vec<String>,

    /// Listing page size when the caller gives none.
    #[serde(default = "defaults::content::per_page")]
    #[educe(Default = defaults::content::per_page())]
    pub per_page: usize,
}
