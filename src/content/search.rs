//! Keyword search over the published posts of one snapshot.
//!
//! # Scoring
//!
//! ```text
//! per query term (summed over terms):
//!   title        exact 30 · prefix 20 · contains 15
//!   description  12
//!   tag          10   (first matching tag)
//!   category      8
//!   excerpt       5
//!   body          0.5 per occurrence, at most 10 occurrences
//!
//! then:
//!   all terms as one phrase in title +10, else in excerpt +5
//!   featured ×1.2
//!   created within the last 30 days ×1.1
//! ```
//!
//! Results are ordered by score, ties kept in canonical order.

use super::{Article, ContentIndex, article::strip_markdown};
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

/// Hard cap on results, also used when the caller passes `limit == 0`.
pub const MAX_RESULTS: usize = 100;

const MAX_BODY_OCCURRENCES: usize = 10;
const RECENT_DAYS: i64 = 30;

const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "are", "was", "were", "been", "have", "has", "had",
    "does", "did", "will", "would", "could", "should", "may", "might", "must", "can", "this",
    "that", "these", "those", "you", "she", "they", "him", "her", "them", "your", "his", "its",
    "our", "their", "not", "out", "about", "who", "what", "where", "when", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "only", "own",
    "same", "than", "too", "very", "just", "now",
];

/// One matching post.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub article: Arc<Article>,
    pub score: f64,
    /// In first-matched order: `title`, `description`, `tags`, `categories`,
    /// `excerpt`, `content`.
    pub matched_fields: Vec<&'static str>,
}

/// Lowercased query terms longer than two characters, stop words removed.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || ",.!?;:()[]{}\"'-_".contains(c))
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_owned)
        .collect()
}

/// Search the published posts of `index`, best match first.
///
/// `now` anchors the recency boost. At most `limit` results are returned,
/// capped at [`MAX_RESULTS`]; `limit == 0` means the cap.
pub fn search(
    index: &ContentIndex,
    query: &str,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<SearchResult> {
    let terms = tokenize(query);
    if terms.is_empty() {
        return Vec::new();
    }
    let limit = if limit == 0 { MAX_RESULTS } else { limit.min(MAX_RESULTS) };
    let recent_since = now - Duration::days(RECENT_DAYS);

    let mut results: Vec<SearchResult> = index
        .get_published()
        .into_par_iter()
        .filter_map(|article| {
            let (score, matched_fields) = score(&article, &terms, recent_since);
            (score > 0.0).then_some(SearchResult {
                article,
                score,
                matched_fields,
            })
        })
        .collect();

    // Stable: equal scores stay newest first
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    results
}

fn score(
    article: &Article,
    terms: &[String],
    recent_since: DateTime<Utc>,
) -> (f64, Vec<&'static str>) {
    let title = article.title.to_lowercase();
    let description = article.description.to_lowercase();
    let excerpt = article.excerpt.to_lowercase();
    let content = strip_markdown(&article.body).to_lowercase();
    let tags: Vec<String> = article.tags.iter().map(|t| t.to_lowercase()).collect();
    let category = article.category.as_deref().map(str::to_lowercase);

    let mut matched: Vec<&'static str> = Vec::new();
    let mut hit = |field: &'static str| {
        if !matched.contains(&field) {
            matched.push(field);
        }
    };

    let mut score = 0.0;
    for term in terms {
        let term = term.as_str();

        if title.contains(term) {
            score += if title == term {
                30.0
            } else if title.starts_with(term) {
                20.0
            } else {
                15.0
            };
            hit("title");
        }
        if description.contains(term) {
            score += 12.0;
            hit("description");
        }
        if tags.iter().any(|t| t.contains(term)) {
            score += 10.0;
            hit("tags");
        }
        if category.as_deref().is_some_and(|c| c.contains(term)) {
            score += 8.0;
            hit("categories");
        }
        if excerpt.contains(term) {
            score += 5.0;
            hit("excerpt");
        }
        let occurrences = content.matches(term).count().min(MAX_BODY_OCCURRENCES);
        if occurrences > 0 {
            score += occurrences as f64 * 0.5;
            hit("content");
        }
    }

    if terms.len() > 1 {
        let phrase = terms.join(" ");
        if title.contains(&phrase) {
            score += 10.0;
        } else if excerpt.contains(&phrase) {
            score += 5.0;
        }
    }

    if article.featured {
        score *= 1.2;
    }
    if article.created_at > recent_since {
        score *= 1.1;
    }

    (score, matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::article::tests::article;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn slugs(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.article.slug.as_str()).collect()
    }

    fn sample() -> ContentIndex {
        let mut a = article("ownership", 1);
        a.title = "Ownership in Rust".into();
        a.body = "Borrowing and ownership. Ownership again.".into();
        a.tags = vec!["rust".into()];
        a.category = Some("programming".into());

        let mut b = article("async", 2);
        b.title = "Async networking".into();
        b.description = "Tokio and rust futures".into();

        let mut c = article("rust", 3);
        c.title = "Rust".into();
        c.draft = true;

        let mut d = article("gardening", 4);
        d.title = "Tomatoes".into();
        d.body = "Nothing about programming here.".into();

        ContentIndex::new(vec![a, b, c, d], 1)
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("The Rust-lang, (borrow) checker!"), ["rust", "lang", "borrow", "checker"]);
        assert_eq!(tokenize("a an to of"), Vec::<String>::new());
        assert_eq!(tokenize("Éclair"), ["éclair"]);
    }

    #[test]
    fn test_title_outranks_description() {
        let index = sample();
        let results = search(&index, "rust", 10, now());

        // the draft titled exactly "Rust" is never searched
        assert_eq!(slugs(&results), ["ownership", "async"]);
        assert_eq!(results[0].matched_fields, ["title", "tags"]);
        assert_eq!(results[1].matched_fields, ["description"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_exact_title_scores_highest() {
        let mut exact = article("exact", 1);
        exact.title = "Tomatoes".into();
        let mut prefix = article("prefix", 2);
        prefix.title = "Tomatoes grow".into();
        let mut inner = article("inner", 3);
        inner.title = "Growing tomatoes".into();
        let index = ContentIndex::new(vec![exact, prefix, inner], 1);

        let results = search(&index, "tomatoes", 10, now());
        assert_eq!(slugs(&results), ["exact", "prefix", "inner"]);
        assert_eq!(results[0].score, 30.0);
        assert_eq!(results[1].score, 20.0);
        assert_eq!(results[2].score, 15.0);
    }

    #[test]
    fn test_body_occurrences_are_capped() {
        let mut a = article("a", 1);
        a.body = "word ".repeat(50);
        let index = ContentIndex::new(vec![a], 1);

        let results = search(&index, "word", 10, now());
        assert_eq!(results[0].score, 5.0);
        assert_eq!(results[0].matched_fields, ["content"]);
    }

    #[test]
    fn test_phrase_featured_and_recency_boosts() {
        let mut a = article("a", 1);
        a.title = "Borrow checker".into();
        a.featured = true;
        let index = ContentIndex::new(vec![a], 1);

        // prefix 20 + contains 15, +10 phrase, ×1.2 featured
        let old = search(&index, "borrow checker", 10, now());
        assert!((old[0].score - 54.0).abs() < 1e-9);

        let created = index.get_all()[0].created_at;
        let fresh = search(&index, "borrow checker", 10, created + Duration::days(1));
        assert!((fresh[0].score - 54.0 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_limit_and_empty_query() {
        let index = sample();
        assert_eq!(search(&index, "rust", 1, now()).len(), 1);
        assert_eq!(search(&index, "rust", 0, now()).len(), 2);
        assert!(search(&index, "the and", 10, now()).is_empty());
        assert!(search(&index, "", 10, now()).is_empty());
        assert!(search(&index, "zzz", 10, now()).is_empty());
    }

    #[test]
    fn test_serializes_flat() {
        let index = sample();
        let results = search(&index, "tomatoes", 10, now());
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["slug"], "gardening");
        assert_eq!(json["matched_fields"][0], "title");
        assert!(json["score"].as_f64().unwrap() > 0.0);
    }
}
