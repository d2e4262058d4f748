//! Corpus-wide aggregates.
//!
//! Always computed fresh from a snapshot; caching is [`crate::cache`]'s job.

use super::{ArticleSummary, ContentIndex};
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::BTreeMap;

const POPULAR_TAGS: usize = 10;
const RECENT_POSTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Counts over one snapshot.
///
/// `tags` and `categories` are distinct over the whole corpus (drafts included);
/// `popular_tags` and `recent` only consider published posts.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total: usize,
    pub published: usize,
    pub drafts: usize,
    pub tags: usize,
    pub categories: usize,
    pub popular_tags: Vec<TagCount>,
    pub recent: Vec<ArticleSummary>,
    pub version: u64,
    pub computed_at: DateTime<Utc>,
}

/// Single pass over [`ContentIndex::get_all`].
pub fn compute_stats(index: &ContentIndex) -> Stats {
    let mut drafts = 0;
    let mut tags: FxHashSet<String> = FxHashSet::default();
    let mut categories: FxHashSet<String> = FxHashSet::default();
    // lowercased tag -> (first spelling, published count)
    let mut tag_counts: FxHashMap<String, (&str, usize)> = FxHashMap::default();
    let mut recent = Vec::with_capacity(RECENT_POSTS);

    for article in index.get_all() {
        let mut keys: Vec<String> = Vec::with_capacity(article.tags.len());
        for tag in &article.tags {
            let key = tag.to_lowercase();
            if keys.contains(&key) {
                continue;
            }
            keys.push(key.clone());
            if !article.draft {
                tag_counts.entry(key.clone()).or_insert((tag.as_str(), 0)).1 += 1;
            }
            tags.insert(key);
        }
        if let Some(category) = &article.category {
            categories.insert(category.to_lowercase());
        }

        if article.draft {
            drafts += 1;
        } else if recent.len() < RECENT_POSTS {
            recent.push(article.summary());
        }
    }

    let mut popular_tags: Vec<TagCount> = tag_counts
        .into_values()
        .map(|(name, count)| TagCount {
            name: name.to_owned(),
            count,
        })
        .collect();
    popular_tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    popular_tags.truncate(POPULAR_TAGS);

    let total = index.len();
    Stats {
        total,
        published: total - drafts,
        drafts,
        tags: tags.len(),
        categories: categories.len(),
        popular_tags,
        recent,
        version: index.version(),
        computed_at: Utc::now(),
    }
}

/// Debug view of the current snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub articles: usize,
    pub published: usize,
    pub drafts: usize,
    /// Published posts per type
    pub types: BTreeMap<&'static str, usize>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl SnapshotInfo {
    pub fn from_index(index: &ContentIndex) -> Self {
        Self {
            version: index.version(),
            loaded_at: index.loaded_at(),
            articles: index.len(),
            published: index.published_len(),
            drafts: index.drafts_len(),
            types: index
                .type_counts()
                .into_iter()
                .map(|(kind, count)| (kind.as_str(), count))
                .collect(),
            tags: index.tags(),
            categories: index.categories(),
        }
    }
}
