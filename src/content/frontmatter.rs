//! Front-matter parsing: one [`RawItem`] into one [`Article`].
//!
//! Content files look like:
//!
//! ```text
//! ---
//! title: Hello World
//! date: 2024-01-15
//! tags: [rust, web]
//! category: programming
//! draft: false
//! ---
//! Markdown body...
//! ```
//!
//! Unknown front-matter keys are ignored so content can carry extra metadata.

use super::{
    article::{self, Article, PostType},
    source::RawItem,
};
use crate::error::{ItemError, ItemErrorReason};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rustc_hash::FxHashSet;
use serde::Deserialize;

const DELIMITER: &str = "---";

/// Front-matter keys understood by the parser.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    slug: Option<String>,
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    updated: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    tags: Vec<String>,
    category: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    categories: Vec<String>,
    draft: bool,
    featured: bool,
    author: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    link_url: Option<String>,
    asker: Option<String>,
    asker_email: Option<String>,
}

/// Accept both `tags: rust` and `tags: [rust, web]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// Split `text` into its YAML block and the remaining body.
///
/// Returns `None` when the text does not open with a `---` line or the block
/// is never closed.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start_matches('\u{feff}');
    let rest = text.trim_start().strip_prefix(DELIMITER)?;
    let rest = rest.strip_prefix('\r').unwrap_or(rest).strip_prefix('\n')?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse a raw item into an article, validating required fields.
pub fn parse(item: RawItem) -> Result<Article, ItemError> {
    let path = item.path.clone();
    parse_inner(item).map_err(|reason| ItemError::new(path, reason))
}

fn parse_inner(item: RawItem) -> Result<Article, ItemErrorReason> {
    let stem_slug = article::slugify(item.stem());
    let text = item.text.map_err(ItemErrorReason::Read)?;
    let (yaml, body) = split(&text).ok_or(ItemErrorReason::MissingFrontMatter)?;

    let fm: FrontMatter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml).map_err(ItemErrorReason::FrontMatter)?
    };

    let slug = match non_empty(fm.slug) {
        Some(slug) => slug,
        None => stem_slug,
    };
    if slug.is_empty() {
        return Err(ItemErrorReason::EmptySlug);
    }

    let body = body.trim().to_owned();
    let title = fm.title.unwrap_or_default().trim().to_owned();
    let link_url = non_empty(fm.link_url);
    let asker = non_empty(fm.asker);
    let words = article::word_count(&body);

    let kind = match non_empty(fm.kind) {
        Some(kind) => kind.parse().map_err(ItemErrorReason::UnknownType)?,
        None => PostType::infer(&title, link_url.as_deref(), words),
    };
    match kind {
        PostType::Link if link_url.is_none() => {
            return Err(ItemErrorReason::MissingField { field: "link_url", kind: "link" });
        }
        PostType::Ama if asker.is_none() => {
            return Err(ItemErrorReason::MissingField { field: "asker", kind: "ama" });
        }
        _ => {}
    }

    let modified = item.modified.map(DateTime::<Utc>::from);
    let created_at = match fm.date.as_deref() {
        Some(value) => parse_date("date", value)?,
        None => modified.ok_or(ItemErrorReason::MissingTimestamp)?,
    };
    let updated_at = match fm.updated.as_deref() {
        Some(value) => parse_date("updated", value)?,
        None => modified.unwrap_or(created_at),
    };

    let category = non_empty(fm.category)
        .or_else(|| fm.categories.into_iter().find_map(|c| non_empty(Some(c))));

    Ok(Article {
        slug,
        title,
        description: fm.description.unwrap_or_default().trim().to_owned(),
        excerpt: article::excerpt(&body),
        reading_time: article::reading_time(words),
        word_count: words,
        body,
        kind,
        draft: fm.draft,
        featured: fm.featured,
        tags: normalize_tags(fm.tags),
        category,
        author: non_empty(fm.author),
        link_url,
        // AMA-only fields
        asker: asker.filter(|_| kind == PostType::Ama),
        asker_email: non_empty(fm.asker_email).filter(|_| kind == PostType::Ama),
        created_at,
        updated_at,
        source: item.path,
    })
}

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` as UTC.
pub fn parse_date(field: &'static str, value: &str) -> Result<DateTime<Utc>, ItemErrorReason> {
    let s = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ItemErrorReason::InvalidDate {
            field,
            value: value.to_owned(),
        })
}

/// Trim, drop empties and case-insensitive duplicates, keep first spelling.
///
/// Duplicates are keyed by `to_lowercase`, the same key the index uses.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && seen.insert(tag.to_lowercase()) {
            out.push(tag.to_owned());
        }
    }
    out
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}
