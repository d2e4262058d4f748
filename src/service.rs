//! The article service: every read the outer surfaces are allowed to make.
//!
//! Each operation loads the current snapshot once and answers entirely from
//! it, so a reload landing mid-call can never mix two corpora in one answer.
//! Draft visibility is decided here, not by callers re-checking `draft`.

use crate::{
    cache::TtlCache,
    config::SiteConfig,
    content::{
        Article, ContentIndex, FsSource, Loader, Pagination, PostType, SearchResult, SnapshotInfo,
        Stats, search, stats::compute_stats,
    },
    error::ContentError,
    log,
    store::{ContentStore, ReloadReport},
};
use chrono::Utc;
use serde::Serialize;
use std::{sync::Arc, time::Duration};

const STATS_KEY: &str = "stats";
const SNAPSHOT_KEY: &str = "snapshot";

/// Whether slug lookups may resolve drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Drafts resolve as not found.
    Published,
    /// Drafts and published posts alike.
    IncludeDrafts,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePage {
    pub items: Vec<Arc<Article>>,
    pub pagination: Pagination,
}

impl ArticlePage {
    /// Paginate an already filtered, ordered listing.
    pub fn new(items: &[Arc<Article>], page: i64, per_page: usize) -> Self {
        let pagination = Pagination::new(page, items.len(), per_page);
        Self {
            items: pagination.slice(items).to_vec(),
            pagination,
        }
    }
}

/// Keep only posts of `kind`; `None` keeps everything.
pub fn retain_kind(items: &mut Vec<Arc<Article>>, kind: Option<PostType>) {
    if let Some(kind) = kind {
        items.retain(|a| a.kind == kind);
    }
}

/// Read and reload operations over the content corpus.
pub trait ArticleService: Send + Sync {
    /// Full corpus in canonical order, drafts included.
    fn get_all_articles(&self) -> Vec<Arc<Article>>;

    fn get_published_articles(&self) -> Vec<Arc<Article>>;

    fn get_article_by_slug(
        &self,
        slug: &str,
        visibility: Visibility,
    ) -> Result<Arc<Article>, ContentError>;

    fn get_draft_articles(&self) -> Vec<Arc<Article>>;

    /// Resolve a draft; published posts are `NotFound` here.
    fn get_draft_by_slug(&self, slug: &str) -> Result<Arc<Article>, ContentError>;

    fn get_articles_by_tag(&self, tag: &str) -> Vec<Arc<Article>>;

    fn get_articles_by_category(&self, category: &str) -> Vec<Arc<Article>>;

    fn get_articles_for_feed(&self, limit: usize) -> Vec<Arc<Article>>;

    fn get_featured_articles(&self, limit: usize) -> Vec<Arc<Article>>;

    fn get_recent_articles(&self, limit: usize) -> Vec<Arc<Article>>;

    fn get_tag_counts(&self) -> Vec<(String, usize)>;

    fn get_category_counts(&self) -> Vec<(String, usize)>;

    fn get_all_tags(&self) -> Vec<String>;

    fn get_all_categories(&self) -> Vec<String>;

    /// Published posts matching `query`, best match first.
    fn search_articles(&self, query: &str, limit: usize) -> Vec<SearchResult>;

    /// One page of published posts, optionally of a single type.
    fn list_published(&self, kind: Option<PostType>, page: i64, per_page: usize) -> ArticlePage;

    fn get_stats(&self) -> Result<Arc<Stats>, ContentError>;

    fn get_snapshot_info(&self) -> Result<Arc<SnapshotInfo>, ContentError>;

    fn reload_articles(&self) -> Result<ReloadReport, ContentError>;
}

/// [`ArticleService`] backed by a [`ContentStore`] and two derived-view caches.
#[derive(Debug)]
pub struct ContentService {
    store: ContentStore,
    stats: TtlCache<&'static str, Arc<Stats>>,
    snapshot_info: TtlCache<&'static str, Arc<SnapshotInfo>>,
}

impl ContentService {
    pub fn new(store: ContentStore, ttl: Duration) -> Self {
        Self {
            store,
            stats: TtlCache::new(ttl),
            snapshot_info: TtlCache::new(ttl),
        }
    }

    /// Service over the configured content directory. Nothing is loaded yet.
    pub fn from_config(config: &SiteConfig) -> Self {
        let source = FsSource::new(config.content_dir(), &config.content.extensions);
        Self::new(ContentStore::new(Loader::new(source)), config.cache.ttl())
    }

    pub fn snapshot(&self) -> Arc<ContentIndex> {
        self.store.snapshot()
    }

    /// `(hits, misses)` summed over both caches.
    pub fn cache_counters(&self) -> (u64, u64) {
        (
            self.stats.hits() + self.snapshot_info.hits(),
            self.stats.misses() + self.snapshot_info.misses(),
        )
    }
}

impl ArticleService for ContentService {
    fn get_all_articles(&self) -> Vec<Arc<Article>> {
        self.snapshot().get_all().to_vec()
    }

    fn get_published_articles(&self) -> Vec<Arc<Article>> {
        self.snapshot().get_published()
    }

    fn get_article_by_slug(
        &self,
        slug: &str,
        visibility: Visibility,
    ) -> Result<Arc<Article>, ContentError> {
        let snapshot = self.snapshot();
        match snapshot.get_by_slug(slug) {
            Some(article) if visibility == Visibility::IncludeDrafts || !article.draft => {
                Ok(Arc::clone(article))
            }
            _ => Err(ContentError::not_found(slug)),
        }
    }

    fn get_draft_articles(&self) -> Vec<Arc<Article>> {
        self.snapshot().get_drafts()
    }

    fn get_draft_by_slug(&self, slug: &str) -> Result<Arc<Article>, ContentError> {
        let snapshot = self.snapshot();
        snapshot
            .get_by_slug(slug)
            .filter(|a| a.draft)
            .cloned()
            .ok_or_else(|| ContentError::not_found(slug))
    }

    fn get_articles_by_tag(&self, tag: &str) -> Vec<Arc<Article>> {
        let mut articles = self.snapshot().get_by_tag(tag);
        articles.retain(|a| !a.draft);
        articles
    }

    fn get_articles_by_category(&self, category: &str) -> Vec<Arc<Article>> {
        let mut articles = self.snapshot().get_by_category(category);
        articles.retain(|a| !a.draft);
        articles
    }

    fn get_articles_for_feed(&self, limit: usize) -> Vec<Arc<Article>> {
        self.snapshot().get_recent(limit)
    }

    fn get_featured_articles(&self, limit: usize) -> Vec<Arc<Article>> {
        self.snapshot().get_featured(limit)
    }

    fn get_recent_articles(&self, limit: usize) -> Vec<Arc<Article>> {
        self.snapshot().get_recent(limit)
    }

    fn get_tag_counts(&self) -> Vec<(String, usize)> {
        self.snapshot().tag_counts()
    }

    fn get_category_counts(&self) -> Vec<(String, usize)> {
        self.snapshot().category_counts()
    }

    fn get_all_tags(&self) -> Vec<String> {
        self.snapshot().tags()
    }

    fn get_all_categories(&self) -> Vec<String> {
        self.snapshot().categories()
    }

    fn search_articles(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        search::search(&self.snapshot(), query, limit, Utc::now())
    }

    fn list_published(&self, kind: Option<PostType>, page: i64, per_page: usize) -> ArticlePage {
        let items = self.snapshot().filter_published_by_type(kind);
        ArticlePage::new(&items, page, per_page)
    }

    fn get_stats(&self) -> Result<Arc<Stats>, ContentError> {
        let snapshot = self.snapshot();
        self.stats
            .get_or_compute(&STATS_KEY, snapshot.version(), || {
                Ok::<_, anyhow::Error>(Arc::new(compute_stats(&snapshot)))
            })
            .map_err(|source| ContentError::Compute {
                key: STATS_KEY,
                source,
            })
    }

    fn get_snapshot_info(&self) -> Result<Arc<SnapshotInfo>, ContentError> {
        let snapshot = self.snapshot();
        self.snapshot_info
            .get_or_compute(&SNAPSHOT_KEY, snapshot.version(), || {
                Ok::<_, anyhow::Error>(Arc::new(SnapshotInfo::from_index(&snapshot)))
            })
            .map_err(|source| ContentError::Compute {
                key: SNAPSHOT_KEY,
                source,
            })
    }

    fn reload_articles(&self) -> Result<ReloadReport, ContentError> {
        let report = self.store.reload()?;

        // Entries are version-tagged already; clearing just drops the old values early
        let (hits, misses) = self.cache_counters();
        self.stats.clear();
        self.snapshot_info.clear();
        if hits + misses > 0 {
            log!("cache"; "cleared for v{} ({hits} hits, {misses} misses so far)", report.version);
        }

        Ok(report)
    }
}
