//! Immutable content snapshot with derived lookup maps.
//!
//! # Layout
//!
//! ```text
//! articles: [a0, a1, a2, ...]        canonical order (newest first, then slug)
//!     ▲
//!     ├── by_slug:     slug  → position
//!     ├── by_tag:      tag   → [positions]   (lowercased keys)
//!     ├── by_category: cat   → [positions]   (lowercased keys)
//!     ├── by_type:     type  → [positions]
//!     ├── published:   [positions]           exactly { i : !articles[i].draft }
//!     └── drafts:      [positions]
//! ```
//!
//! Every map stores positions into `articles`, built once in [`ContentIndex::new`],
//! so position lists inherit the canonical order for free.

use super::article::{Article, PostType};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use std::{cmp::Reverse, sync::Arc};

/// A point-in-time view of the whole corpus.
#[derive(Debug)]
pub struct ContentIndex {
    articles: Vec<Arc<Article>>,
    by_slug: FxHashMap<String, usize>,
    by_tag: FxHashMap<String, Vec<usize>>,
    by_category: FxHashMap<String, Vec<usize>>,
    by_type: FxHashMap<PostType, Vec<usize>>,
    published: Vec<usize>,
    drafts: Vec<usize>,
    version: u64,
    loaded_at: DateTime<Utc>,
}

impl ContentIndex {
    /// Build a snapshot from articles with unique slugs.
    ///
    /// Input order does not matter; articles are sorted into canonical order.
    /// Uniqueness is enforced by the loader, a repeated slug here keeps the
    /// first article in canonical order for lookups.
    pub fn new(articles: Vec<Article>, version: u64) -> Self {
        let mut articles: Vec<Arc<Article>> = articles.into_iter().map(Arc::new).collect();
        articles.sort_by(|a, b| {
            Reverse(a.created_at)
                .cmp(&Reverse(b.created_at))
                .then_with(|| a.slug.cmp(&b.slug))
        });

        let mut by_slug = FxHashMap::default();
        let mut by_tag: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut by_category: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut by_type: FxHashMap<PostType, Vec<usize>> = FxHashMap::default();
        let mut published = Vec::new();
        let mut drafts = Vec::new();

        for (pos, article) in articles.iter().enumerate() {
            by_slug.entry(article.slug.clone()).or_insert(pos);
            for tag in &article.tags {
                let positions = by_tag.entry(tag.to_lowercase()).or_default();
                // Two spellings of one tag on the same article share a key
                if positions.last() != Some(&pos) {
                    positions.push(pos);
                }
            }
            if let Some(category) = &article.category {
                by_category.entry(category.to_lowercase()).or_default().push(pos);
            }
            by_type.entry(article.kind).or_default().push(pos);
            if article.draft {
                drafts.push(pos);
            } else {
                published.push(pos);
            }
        }

        Self {
            articles,
            by_slug,
            by_tag,
            by_category,
            by_type,
            published,
            drafts,
            version,
            loaded_at: Utc::now(),
        }
    }

    /// The version-0 snapshot installed before the first load.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Arc<Article>> {
        self.by_slug.get(slug).map(|&pos| &self.articles[pos])
    }

    /// All articles, drafts included, in canonical order.
    pub fn get_all(&self) -> &[Arc<Article>] {
        &self.articles
    }

    pub fn get_published(&self) -> Vec<Arc<Article>> {
        self.collect(&self.published)
    }

    pub fn get_drafts(&self) -> Vec<Arc<Article>> {
        self.collect(&self.drafts)
    }

    /// Articles carrying `tag` (case-insensitive), drafts included.
    pub fn get_by_tag(&self, tag: &str) -> Vec<Arc<Article>> {
        self.lookup(&self.by_tag, tag)
    }

    /// Articles in `category` (case-insensitive), drafts included.
    pub fn get_by_category(&self, category: &str) -> Vec<Arc<Article>> {
        self.lookup(&self.by_category, category)
    }

    /// Published articles of one type, or of every type when `kind` is `None`.
    pub fn filter_published_by_type(&self, kind: Option<PostType>) -> Vec<Arc<Article>> {
        let Some(kind) = kind else {
            return self.get_published();
        };
        self.by_type
            .get(&kind)
            .map(|positions| self.collect_published(positions))
            .unwrap_or_default()
    }

    pub fn get_featured(&self, limit: usize) -> Vec<Arc<Article>> {
        self.published_iter()
            .filter(|a| a.featured)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get_recent(&self, limit: usize) -> Vec<Arc<Article>> {
        self.published_iter().take(limit).cloned().collect()
    }

    /// Distinct tags of published articles, sorted, in their first spelling.
    pub fn tags(&self) -> Vec<String> {
        self.distinct(|a| a.tags.iter().map(String::as_str).collect())
    }

    /// Distinct categories of published articles, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.distinct(|a| a.category.iter().map(String::as_str).collect())
    }

    /// `(tag, published count)` ordered by count descending, then name.
    pub fn tag_counts(&self) -> Vec<(String, usize)> {
        self.counts(&self.by_tag)
    }

    /// `(category, published count)` ordered by count descending, then name.
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        self.counts(&self.by_category)
    }

    /// Number of published articles per type.
    pub fn type_counts(&self) -> Vec<(PostType, usize)> {
        PostType::ALL
            .into_iter()
            .map(|kind| {
                let count = self.by_type.get(&kind).map_or(0, |positions| {
                    positions.iter().filter(|&&pos| !self.articles[pos].draft).count()
                });
                (kind, count)
            })
            .collect()
    }

    pub const fn version(&self) -> u64 {
        self.version
    }

    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn published_len(&self) -> usize {
        self.published.len()
    }

    pub fn drafts_len(&self) -> usize {
        self.drafts.len()
    }

    // ------------------------------------------------------------------------

    fn published_iter(&self) -> impl Iterator<Item = &Arc<Article>> {
        self.published.iter().map(|&pos| &self.articles[pos])
    }

    fn collect(&self, positions: &[usize]) -> Vec<Arc<Article>> {
        positions.iter().map(|&pos| Arc::clone(&self.articles[pos])).collect()
    }

    fn collect_published(&self, positions: &[usize]) -> Vec<Arc<Article>> {
        positions
            .iter()
            .map(|&pos| &self.articles[pos])
            .filter(|a| !a.draft)
            .cloned()
            .collect()
    }

    fn lookup(&self, map: &FxHashMap<String, Vec<usize>>, key: &str) -> Vec<Arc<Article>> {
        map.get(&key.to_lowercase())
            .map(|positions| self.collect(positions))
            .unwrap_or_default()
    }

    fn distinct<'a>(&'a self, keys: impl Fn(&'a Article) -> Vec<&'a str>) -> Vec<String> {
        let mut seen: FxHashMap<String, &str> = FxHashMap::default();
        for article in self.published_iter() {
            for key in keys(article.as_ref()) {
                seen.entry(key.to_lowercase()).or_insert(key);
            }
        }
        let mut out: Vec<String> = seen.into_values().map(str::to_owned).collect();
        out.sort_by_key(|s| s.to_lowercase());
        out
    }

    fn counts(&self, map: &FxHashMap<String, Vec<usize>>) -> Vec<(String, usize)> {
        let mut out: Vec<(String, usize)> = map
            .iter()
            .filter_map(|(key, positions)| {
                let published: Vec<_> =
                    positions.iter().filter(|&&pos| !self.articles[pos].draft).collect();
                let &&first = published.first()?;
                let name = self.display_key(first, key);
                Some((name, published.len()))
            })
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Original spelling of a lowercased key, taken from the article at `pos`.
    fn display_key(&self, pos: usize, key: &str) -> String {
        let article = &self.articles[pos];
        article
            .tags
            .iter()
            .chain(article.category.iter())
            .find(|s| s.to_lowercase() == key)
            .cloned()
            .unwrap_or_else(|| key.to_owned())
    }
}

impl Default for ContentIndex {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::article::tests::article;

    fn slugs(articles: &[Arc<Article>]) -> Vec<&str> {
        articles.iter().map(|a| a.slug.as_str()).collect()
    }

    fn sample() -> ContentIndex {
        let mut a = article("alpha", 1);
        a.tags = vec!["Rust".into(), "web".into()];
        a.category = Some("Programming".into());

        let mut b = article("beta", 2);
        b.tags = vec!["rust".into()];
        b.featured = true;

        let mut c = article("gamma", 3);
        c.draft = true;
        c.tags = vec!["rust".into()];
        c.category = Some("programming".into());

        let mut d = article("delta", 2);
        d.kind = PostType::Thought;

        ContentIndex::new(vec![a, b, c, d], 7)
    }

    #[test]
    fn test_canonical_order() {
        let index = sample();
        // newest first, same-day ties broken by slug
        assert_eq!(slugs(index.get_all()), ["gamma", "beta", "delta", "alpha"]);
        assert_eq!(index.version(), 7);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_published_and_drafts_partition() {
        let index = sample();
        assert_eq!(slugs(&index.get_published()), ["beta", "delta", "alpha"]);
        assert_eq!(slugs(&index.get_drafts()), ["gamma"]);
        assert_eq!(index.published_len() + index.drafts_len(), index.len());
    }

    #[test]
    fn test_get_by_slug() {
        let index = sample();
        assert_eq!(index.get_by_slug("beta").unwrap().slug, "beta");
        assert!(index.get_by_slug("missing").is_none());
        assert!(index.get_by_slug("gamma").unwrap().draft);
    }

    #[test]
    fn test_tag_spellings_on_one_article_index_once() {
        let mut a = article("alpha", 1);
        a.tags = vec!["Éclair".into(), "éclair".into()];
        let index = ContentIndex::new(vec![a], 1);

        assert_eq!(slugs(&index.get_by_tag("ÉCLAIR")), ["alpha"]);
        assert_eq!(index.tag_counts(), [("Éclair".to_string(), 1)]);
        assert_eq!(index.tags(), ["Éclair"]);
    }

    #[test]
    fn test_tag_and_category_lookup_ignores_case() {
        let index = sample();
        assert_eq!(slugs(&index.get_by_tag("RUST")), ["gamma", "beta", "alpha"]);
        assert_eq!(slugs(&index.get_by_category("programming")), ["gamma", "alpha"]);
        assert!(index.get_by_tag("go").is_empty());
        assert!(index.get_by_category("none").is_empty());
    }

    #[test]
    fn test_filter_published_by_type() {
        let index = sample();
        assert_eq!(slugs(&index.filter_published_by_type(Some(PostType::Thought))), ["delta"]);
        assert_eq!(
            slugs(&index.filter_published_by_type(Some(PostType::Article))),
            ["beta", "alpha"]
        );
        assert!(index.filter_published_by_type(Some(PostType::Ama)).is_empty());
        assert_eq!(index.filter_published_by_type(None).len(), 3);
    }

    #[test]
    fn test_featured_and_recent() {
        let index = sample();
        assert_eq!(slugs(&index.get_featured(5)), ["beta"]);
        assert_eq!(slugs(&index.get_recent(2)), ["beta", "delta"]);
    }

    #[test]
    fn test_distinct_tags_and_categories_skip_drafts() {
        let index = sample();
        // first published spelling wins
        assert_eq!(index.tags(), ["rust", "web"]);
        assert_eq!(index.categories(), ["Programming"]);
    }

    #[test]
    fn test_counts() {
        let index = sample();
        let tags = index.tag_counts();
        assert_eq!(tags[0].1, 2);
        assert!(tags[0].0.eq_ignore_ascii_case("rust"));
        assert_eq!(tags[1], ("web".to_string(), 1));

        assert_eq!(index.category_counts(), [("Programming".to_string(), 1)]);
    }

    #[test]
    fn test_type_counts() {
        let index = sample();
        let counts = index.type_counts();
        assert_eq!(counts[0], (PostType::Article, 2));
        assert_eq!(counts[1], (PostType::Thought, 1));
        assert_eq!(counts[2], (PostType::Link, 0));
    }

    #[test]
    fn test_empty_index() {
        let index = ContentIndex::empty();
        assert!(index.is_empty());
        assert_eq!(index.version(), 0);
        assert!(index.get_published().is_empty());
        assert!(index.tag_counts().is_empty());
    }
}
