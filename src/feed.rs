//! rss feed generation.
//!
//! Turns the newest published posts into an rss 2.0 channel.

use crate::{config::SiteConfig, content::Article, service::ArticleService};
use anyhow::{Result, anyhow};
use regex::Regex;
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::sync::LazyLock;

/// Used when `[site] url` is not configured, so the channel still validates.
const FALLBACK_URL: &str = "http://localhost";

// ============================================================================
// Public API
// ============================================================================

/// Build the rss xml for up to `[feed] limit` published posts, newest first.
pub fn build_rss(service: &dyn ArticleService, config: &SiteConfig) -> Result<String> {
    let articles = service.get_articles_for_feed(config.feed.limit);
    let items: Vec<_> = articles
        .iter()
        .map(|article| article_to_rss_item(article, config))
        .collect();

    let channel = ChannelBuilder::default()
        .title(&config.site.title)
        .link(site_url(config))
        .description(&config.site.description)
        .language(config.site.language.clone())
        .generator(concat!("quire ", env!("CARGO_PKG_VERSION")).to_string())
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validation failed: {e}"))?;
    Ok(channel.to_string())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn site_url(config: &SiteConfig) -> &str {
    config
        .site
        .url
        .as_deref()
        .unwrap_or(FALLBACK_URL)
        .trim_end_matches('/')
}

/// `{site.url}/{feed.path_prefix}/{slug}`
fn article_link(article: &Article, config: &SiteConfig) -> String {
    let prefix = config.feed.path_prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", site_url(config), article.slug)
    } else {
        format!("{}/{prefix}/{}", site_url(config), article.slug)
    }
}

fn article_to_rss_item(article: &Article, config: &SiteConfig) -> rss::Item {
    let link = article_link(article, config);
    let description = if article.description.is_empty() {
        article.excerpt.clone()
    } else {
        article.description.clone()
    };
    let categories = article
        .tags
        .iter()
        .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
        .collect::<Vec<_>>();

    ItemBuilder::default()
        .title(article.display_title())
        .link(Some(link.clone()))
        .guid(GuidBuilder::default().permalink(true).value(link).build())
        .description(description)
        .pub_date(article.created_at.to_rfc2822())
        .author(normalize_rss_author(article.author.as_deref(), config))
        .categories(categories)
        .build()
}

/// Normalize author field to rss format: "email@example.com (Name)"
///
/// Priority:
/// 1. Post author if already in valid format
/// 2. Site author if in valid format
/// 3. Site email combined with the post author name, else the site author
fn normalize_rss_author(author: Option<&str>, config: &SiteConfig) -> String {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap()
    });

    if let Some(author) = author
        && RE_VALID_AUTHOR.is_match(author)
    {
        return author.to_owned();
    }

    let site_author = &config.site.author;
    if RE_VALID_AUTHOR.is_match(site_author) {
        return site_author.clone();
    }

    format!("{} ({})", config.site.email, author.unwrap_or(site_author.as_str()))
}
