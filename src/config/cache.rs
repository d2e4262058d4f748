//! `[cache]` and `[feed]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[cache]` section in quire.toml.
///
/// # Example
/// ```toml
/// [cache]
/// ttl = 600   # seconds
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    /// Lifetime of derived views (stats, snapshot info), in seconds.
    #[serde(default = "defaults::cache::ttl")]
    #[educe(Default = defaults::cache::ttl())]
    pub ttl: u64,
}

impl CacheSection {
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

/// `[feed]` section in quire.toml.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FeedSection {
    /// Maximum number of items in the rss feed.
    #[serde(default = "defaults::feed::limit")]
    #[educe(Default = defaults::feed::limit())]
    pub limit: usize,

    /// URL segment between the site url and a post slug.
    #[serde(default = "defaults::feed::path_prefix")]
    #[educe(Default = defaults::feed::path_prefix())]
    pub path_prefix: String,
}
