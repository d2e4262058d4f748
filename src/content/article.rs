//! The article model and its derived text fields.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr, sync::LazyLock};

/// Average reading speed used for `reading_time`.
const WORDS_PER_MINUTE: usize = 200;
/// Maximum excerpt length in bytes (before the trailing ellipsis).
const EXCERPT_LEN: usize = 200;
/// Maximum synthesized title length for titleless posts.
const DISPLAY_TITLE_LEN: usize = 60;
/// Posts without a title and below this word count are thoughts.
const THOUGHT_MAX_WORDS: usize = 100;

// ============================================================================
// Post Type
// ============================================================================

/// Kind of post, from front-matter `type` or inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Article,
    Thought,
    Link,
    Ama,
}

impl PostType {
    pub const ALL: [PostType; 4] = [Self::Article, Self::Thought, Self::Link, Self::Ama];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Thought => "thought",
            Self::Link => "link",
            Self::Ama => "ama",
        }
    }

    /// Parse an optional type filter; the empty string means "all types".
    pub fn parse_filter(s: &str) -> Result<Option<Self>, String> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    /// Infer a type for posts that do not declare one.
    ///
    /// - has `link_url` → link
    /// - no title and fewer than 100 words → thought
    /// - otherwise → article
    pub fn infer(title: &str, link_url: Option<&str>, word_count: usize) -> Self {
        if link_url.is_some_and(|url| !url.is_empty()) {
            Self::Link
        } else if title.is_empty() && word_count < THOUGHT_MAX_WORDS {
            Self::Thought
        } else {
            Self::Article
        }
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "thought" => Ok(Self::Thought),
            "link" => Ok(Self::Link),
            "ama" => Ok(Self::Ama),
            other => Err(other.to_owned()),
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Article
// ============================================================================

/// A published or draft content unit.
///
/// Articles are immutable once they enter a snapshot and are shared as
/// `Arc<Article>` between the snapshot's sequence and its lookup maps.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Markdown source, rendering happens downstream
    pub body: String,
    #[serde(rename = "type")]
    pub kind: PostType,
    pub draft: bool,
    pub featured: bool,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asker_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub word_count: usize,
    /// Minutes
    pub reading_time: usize,
    pub excerpt: String,

    #[serde(skip)]
    pub source: PathBuf,
}

impl Article {
    /// Title, or a short synthesis of the body for titleless posts.
    ///
    /// Markdown syntax is stripped so the result is usable in feeds and meta tags.
    pub fn display_title(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }

        let text = strip_markdown(&self.body);
        if text.len() <= DISPLAY_TITLE_LEN {
            return text;
        }

        let cut = floor_char_boundary(&text, DISPLAY_TITLE_LEN);
        let head = match text[..cut].rfind(' ') {
            Some(idx) if idx > 20 => &text[..idx],
            _ => &text[..cut],
        };
        format!("{head}...")
    }

    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            slug: self.slug.clone(),
            title: self.display_title(),
            kind: self.kind,
            created_at: self.created_at,
            reading_time: self.reading_time,
        }
    }
}

/// Listing view of an article, used by stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleSummary {
    pub slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: PostType,
    pub created_at: DateTime<Utc>,
    pub reading_time: usize,
}

// ============================================================================
// Text Helpers
// ============================================================================

static RE_CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static RE_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_SYNTAX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_~`\[\]#>]+").unwrap());

/// Remove common markdown syntax and collapse whitespace.
pub fn strip_markdown(s: &str) -> String {
    let s = RE_CODE_BLOCK.replace_all(s, " ");
    let s = RE_IMAGE.replace_all(&s, "$1");
    let s = RE_LINK.replace_all(&s, "$1");
    let s = RE_SYNTAX.replace_all(&s, "");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

/// Minutes to read `words`, at least 1 when there is any text.
pub fn reading_time(words: usize) -> usize {
    match words {
        0 => 0,
        n => (n / WORDS_PER_MINUTE).max(1),
    }
}

/// Plain-text excerpt cut at a word boundary.
pub fn excerpt(body: &str) -> String {
    let text = strip_markdown(body);
    if text.len() <= EXCERPT_LEN {
        return text;
    }
    let cut = floor_char_boundary(&text, EXCERPT_LEN);
    let head = match text[..cut].rfind(' ') {
        Some(idx) if idx > 0 => &text[..idx],
        _ => &text[..cut],
    };
    format!("{head}...")
}

/// Turn arbitrary text into a URL slug: `"Hello, Wörld!"` → `"hello-world"`.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_ascii_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut end = max.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}
