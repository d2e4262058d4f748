//! JSON api server.
//!
//! A thin `tiny_http` surface over [`ArticleService`]:
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /api/articles?page=&per_page=&type=` | page of published posts |
//! | `GET /api/articles/{slug}` | one published post |
//! | `GET /api/tags` | `[{name, count}]` over published posts |
//! | `GET /api/tags/{tag}?page=&per_page=` | page of posts with a tag |
//! | `GET /api/categories` | `[{name, count}]` over published posts |
//! | `GET /api/categories/{category}?page=&per_page=` | page of posts in a category |
//! | `GET /api/featured?limit=` | featured posts |
//! | `GET /api/recent?limit=` | newest posts |
//! | `GET /api/search?q=&limit=` | scored keyword search |
//! | `GET /api/drafts` | all drafts |
//! | `GET /api/drafts/{slug}` | one draft |
//! | `GET /api/stats` | cached corpus stats |
//! | `GET /api/snapshot` | cached snapshot debug info |
//! | `POST /api/reload` | reload the corpus now |
//! | `GET /feed.xml` | rss feed |
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │  Worker Threads  │   │  Watcher Thread  │   │   Ctrl+C Handler │
//! │  server.recv()   │   │  (content dir)   │   │                  │
//! └────────┬─────────┘   └────────┬─────────┘   └────────┬─────────┘
//!          │                      │                      │
//!          ▼                      ▼                      ▼
//!     route() reads         reload_articles()      server.unblock()
//!     one snapshot          swaps snapshot         per worker
//! ```

use crate::{
    config::SiteConfig,
    content::{Article, PostType},
    error::ContentError,
    feed::build_rss,
    log,
    service::{ArticlePage, ArticleService, Visibility, retain_kind},
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, thread};
use tiny_http::{Header, Method, Request, Response, Server};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// Default `limit` for featured and recent listings
const DEFAULT_LIMIT: usize = 5;

/// Default `limit` for search
const DEFAULT_SEARCH_LIMIT: usize = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the api server with optional content watching.
///
/// Blocks until Ctrl+C is received.
pub fn serve_site(
    service: &'static dyn ArticleService,
    config: &'static SiteConfig,
) -> Result<()> {
    let interface: std::net::IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface `{}`", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);
    let workers = config.serve.workers;

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        for _ in 0..workers {
            server_for_signal.unblock();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    if config.serve.watch {
        thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(service, config) {
                log!("watch"; "{err}");
            }
        });
    }

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let server = Arc::clone(&server);
            thread::spawn(move || {
                // `recv` errors once the server is unblocked
                while let Ok(request) = server.recv() {
                    if let Err(e) = handle_request(request, service, config) {
                        log!("serve"; "request error: {e}");
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().ok();
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_err = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// A fully rendered response, independent of the transport.
#[derive(Debug)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Reply {
    fn json(status: u16, value: &impl Serialize) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json; charset=utf-8",
                body,
            },
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    fn ok(value: &impl Serialize) -> Self {
        Self::json(200, value)
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            body: json!({ "error": message }).to_string(),
        }
    }

    fn from_content_error(err: &ContentError) -> Self {
        if err.is_not_found() {
            Self::error(404, &err.to_string())
        } else {
            Self::error(500, &error_chain(err))
        }
    }
}

fn handle_request(
    request: Request,
    service: &dyn ArticleService,
    config: &SiteConfig,
) -> Result<()> {
    let url = request.url().to_owned();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

    let reply = route(request.method(), path, query, service, config);
    if reply.status >= 500 {
        log!("error"; "{} {}: {}", request.method(), path, reply.body);
    }

    let header = Header::from_bytes("Content-Type", reply.content_type)
        .map_err(|()| anyhow::anyhow!("invalid content type header"))?;
    let response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(header);

    request.respond(response)?;
    Ok(())
}

/// Map one request to a reply.
fn route(
    method: &Method,
    path: &str,
    query: &str,
    service: &dyn ArticleService,
    config: &SiteConfig,
) -> Reply {
    let segments: Vec<_> = path.trim_matches('/').split('/').collect();
    let query = parse_query(query);

    match (method, segments.as_slice()) {
        (Method::Get, ["api", "articles"]) => list_articles(&query, service, config),
        (Method::Get, ["api", "articles", slug]) => {
            match service.get_article_by_slug(&decode(slug), Visibility::Published) {
                Ok(article) => Reply::ok(&article),
                Err(err) => Reply::from_content_error(&err),
            }
        }
        (Method::Get, ["api", "tags"]) => Reply::ok(&named_counts(service.get_tag_counts())),
        (Method::Get, ["api", "categories"]) => {
            Reply::ok(&named_counts(service.get_category_counts()))
        }
        (Method::Get, ["api", "search"]) => match query.get("q").map(|q| q.trim()) {
            Some(q) if !q.is_empty() => match limit_param(&query, DEFAULT_SEARCH_LIMIT) {
                Ok(limit) => Reply::ok(&service.search_articles(q, limit)),
                Err(reply) => reply,
            },
            _ => Reply::error(400, "missing search query `q`"),
        },
        (Method::Get, ["api", "featured"]) => match limit_param(&query, DEFAULT_LIMIT) {
            Ok(limit) => Reply::ok(&service.get_featured_articles(limit)),
            Err(reply) => reply,
        },
        (Method::Get, ["api", "recent"]) => match limit_param(&query, DEFAULT_LIMIT) {
            Ok(limit) => Reply::ok(&service.get_recent_articles(limit)),
            Err(reply) => reply,
        },
        (Method::Get, ["api", "tags", tag]) => {
            paginate(service.get_articles_by_tag(&decode(tag)), &query, config)
        }
        (Method::Get, ["api", "categories", category]) => {
            paginate(service.get_articles_by_category(&decode(category)), &query, config)
        }
        (Method::Get, ["api", "drafts"]) => Reply::ok(&service.get_draft_articles()),
        (Method::Get, ["api", "drafts", slug]) => match service.get_draft_by_slug(&decode(slug)) {
            Ok(article) => Reply::ok(&article),
            Err(err) => Reply::from_content_error(&err),
        },
        (Method::Get, ["api", "stats"]) => match service.get_stats() {
            Ok(stats) => Reply::ok(&stats),
            Err(err) => Reply::from_content_error(&err),
        },
        (Method::Get, ["api", "snapshot"]) => match service.get_snapshot_info() {
            Ok(info) => Reply::ok(&info),
            Err(err) => Reply::from_content_error(&err),
        },
        (Method::Post, ["api", "reload"]) => match service.reload_articles() {
            Ok(report) => Reply::ok(&json!({
                "version": report.version,
                "articles": report.articles,
                "errors": report.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "elapsed_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            })),
            Err(err) => Reply::from_content_error(&err),
        },
        (Method::Get, ["feed.xml"]) => match build_rss(service, config) {
            Ok(xml) => Reply {
                status: 200,
                content_type: "application/rss+xml; charset=utf-8",
                body: xml,
            },
            Err(err) => Reply::error(500, &format!("{err:#}")),
        },
        _ if is_known_route(&segments) => Reply::error(405, "method not allowed"),
        _ => Reply::error(404, "not found"),
    }
}

/// Paths [`route`] answers for some method.
fn is_known_route(segments: &[&str]) -> bool {
    matches!(
        segments,
        ["api", "articles" | "tags" | "categories" | "drafts"]
            | ["api", "articles" | "tags" | "categories" | "drafts", _]
            | ["api", "featured" | "recent" | "search" | "stats" | "snapshot" | "reload"]
            | ["feed.xml"]
    )
}

fn list_articles(
    query: &FxHashMap<String, String>,
    service: &dyn ArticleService,
    config: &SiteConfig,
) -> Reply {
    let params = kind_param(query).and_then(|kind| Ok((kind, page_params(query, config)?)));
    match params {
        Ok((kind, (page, per_page))) => Reply::ok(&service.list_published(kind, page, per_page)),
        Err(reply) => reply,
    }
}

/// Page of an already filtered listing, narrowed further by `type=`.
fn paginate(
    mut items: Vec<Arc<Article>>,
    query: &FxHashMap<String, String>,
    config: &SiteConfig,
) -> Reply {
    let params = kind_param(query).and_then(|kind| Ok((kind, page_params(query, config)?)));
    match params {
        Ok((kind, (page, per_page))) => {
            retain_kind(&mut items, kind);
            Reply::ok(&ArticlePage::new(&items, page, per_page))
        }
        Err(reply) => reply,
    }
}

/// `type` absent or empty means every type.
fn kind_param(query: &FxHashMap<String, String>) -> Result<Option<PostType>, Reply> {
    PostType::parse_filter(query.get("type").map_or("", String::as_str))
        .map_err(|other| Reply::error(400, &format!("unknown post type `{other}`")))
}

/// `page` defaults to 1 and `per_page` to `[content] per_page`.
fn page_params(query: &FxHashMap<String, String>, config: &SiteConfig) -> Result<(i64, usize), Reply> {
    let page = match query.get("page") {
        Some(v) => v
            .parse::<i64>()
            .map_err(|_| Reply::error(400, &format!("invalid page `{v}`")))?,
        None => 1,
    };
    let per_page = match query.get("per_page") {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| Reply::error(400, &format!("invalid per_page `{v}`")))?,
        None => config.content.per_page,
    };
    Ok((page, per_page))
}

fn limit_param(query: &FxHashMap<String, String>, default: usize) -> Result<usize, Reply> {
    match query.get("limit") {
        Some(v) => v
            .parse()
            .map_err(|_| Reply::error(400, &format!("invalid limit `{v}`"))),
        None => Ok(default),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn named_counts(counts: Vec<(String, usize)>) -> Vec<serde_json::Value> {
    counts
        .into_iter()
        .map(|(name, count)| json!({ "name": name, "count": count }))
        .collect()
}

/// `error: cause: root cause`
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Decode URL-encoded characters (e.g., %20 → space)
fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| s.to_owned())
}

fn parse_query(query: &str) -> FxHashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(&value.replace('+', " ")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        content::{Loader, source::MemorySource},
        service::ContentService,
        store::ContentStore,
    };
    use serde_json::Value;
    use std::time::Duration;

    fn service() -> ContentService {
        let mut items = Vec::new();
        for i in 1..=12 {
            let draft = i == 12;
            items.push((
                format!("post-{i:02}.md"),
                format!(
                    "---\ntitle: Post {i}\ndate: 2024-01-{i:02}\ntags: [Rust Lang]\ndraft: {draft}\n---\nBody."
                ),
            ));
        }
        items.push((
            "musing.md".into(),
            "---\ndate: 2024-02-01\n---\nShort thought.".into(),
        ));
        let refs: Vec<(&str, &str)> = items.iter().map(|(p, t)| (p.as_str(), t.as_str())).collect();

        let service = ContentService::new(
            ContentStore::new(Loader::new(MemorySource::new(&refs))),
            Duration::from_secs(60),
        );
        service.reload_articles().unwrap();
        service
    }

    fn get(service: &ContentService, url: &str) -> (u16, Value) {
        let config = SiteConfig::default();
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let reply = route(&Method::Get, path, query, service, &config);
        let body = serde_json::from_str(&reply.body).unwrap_or(Value::Null);
        (reply.status, body)
    }

    #[test]
    fn test_list_articles_pagination() {
        let service = service();
        let (status, body) = get(&service, "/api/articles?page=2&per_page=5");

        assert_eq!(status, 200);
        assert_eq!(body["items"].as_array().unwrap().len(), 5);
        assert_eq!(body["pagination"]["current_page"], 2);
        assert_eq!(body["pagination"]["total_items"], 12);
        assert_eq!(body["pagination"]["total_pages"], 3);
    }

    #[test]
    fn test_list_articles_type_filter() {
        let service = service();
        let (status, body) = get(&service, "/api/articles?type=thought");
        assert_eq!(status, 200);
        assert_eq!(body["items"][0]["slug"], "musing");
        assert_eq!(body["items"][0]["type"], "thought");

        // empty type means every type
        let (_, body) = get(&service, "/api/articles?type=&per_page=100");
        assert_eq!(body["items"].as_array().unwrap().len(), 12);

        let (status, _) = get(&service, "/api/articles?type=essay");
        assert_eq!(status, 400);
    }

    #[test]
    fn test_bad_page_params() {
        let service = service();
        assert_eq!(get(&service, "/api/articles?page=abc").0, 400);
        assert_eq!(get(&service, "/api/articles?per_page=-1").0, 400);
        // out of range pages are clamped, not rejected
        let (status, body) = get(&service, "/api/articles?page=-3");
        assert_eq!(status, 200);
        assert_eq!(body["pagination"]["current_page"], 1);
    }

    #[test]
    fn test_article_by_slug() {
        let service = service();
        let (status, body) = get(&service, "/api/articles/post-03");
        assert_eq!(status, 200);
        assert_eq!(body["title"], "Post 3");

        // drafts are hidden from the public route
        assert_eq!(get(&service, "/api/articles/post-12").0, 404);
        assert_eq!(get(&service, "/api/articles/missing").0, 404);
    }

    #[test]
    fn test_tag_route_decodes_and_hides_drafts() {
        let service = service();
        let (status, body) = get(&service, "/api/tags/rust%20lang?per_page=50");
        assert_eq!(status, 200);
        assert_eq!(body["pagination"]["total_items"], 11);
    }

    #[test]
    fn test_tag_route_type_filter() {
        let service = service();
        let (_, body) = get(&service, "/api/tags/rust%20lang?type=thought");
        assert_eq!(body["pagination"]["total_items"], 0);

        let (_, body) = get(&service, "/api/tags/rust%20lang?type=article&per_page=50");
        assert_eq!(body["pagination"]["total_items"], 11);
        assert_eq!(get(&service, "/api/tags/rust%20lang?type=essay").0, 400);
    }

    #[test]
    fn test_drafts_stats_snapshot() {
        let service = service();

        let (_, drafts) = get(&service, "/api/drafts");
        assert_eq!(drafts.as_array().unwrap().len(), 1);

        let (_, stats) = get(&service, "/api/stats");
        assert_eq!(stats["total"], 13);
        assert_eq!(stats["drafts"], 1);

        let (_, info) = get(&service, "/api/snapshot");
        assert_eq!(info["version"], 1);
        assert_eq!(info["types"]["thought"], 1);
    }

    #[test]
    fn test_counts_and_limited_listings() {
        let service = service();

        let (_, tags) = get(&service, "/api/tags");
        assert_eq!(tags[0]["name"], "Rust Lang");
        assert_eq!(tags[0]["count"], 11);

        let (_, categories) = get(&service, "/api/categories");
        assert!(categories.as_array().unwrap().is_empty());

        let (_, recent) = get(&service, "/api/recent?limit=2");
        assert_eq!(recent[0]["slug"], "musing");
        assert_eq!(recent.as_array().unwrap().len(), 2);
        assert_eq!(get(&service, "/api/recent").1.as_array().unwrap().len(), DEFAULT_LIMIT);
        assert_eq!(get(&service, "/api/featured?limit=x").0, 400);
        assert!(get(&service, "/api/featured").1.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_search_route() {
        let service = service();
        let (status, body) = get(&service, "/api/search?q=short+thought");
        assert_eq!(status, 200);
        assert_eq!(body[0]["slug"], "musing");
        assert_eq!(body[0]["matched_fields"][0], "excerpt");

        let (_, body) = get(&service, "/api/search?q=post&limit=3");
        assert_eq!(body.as_array().unwrap().len(), 3);
        // the draft never matches
        let (_, body) = get(&service, "/api/search?q=post&limit=50");
        assert_eq!(body.as_array().unwrap().len(), 11);

        assert_eq!(get(&service, "/api/search").0, 400);
        assert_eq!(get(&service, "/api/search?q=+").0, 400);
        assert_eq!(get(&service, "/api/search?q=post&limit=x").0, 400);
    }

    #[test]
    fn test_draft_by_slug() {
        let service = service();
        let (status, body) = get(&service, "/api/drafts/post-12");
        assert_eq!(status, 200);
        assert_eq!(body["draft"], true);
        assert_eq!(get(&service, "/api/drafts/post-01").0, 404);
    }

    #[test]
    fn test_reload_route() {
        let service = service();
        let config = SiteConfig::default();
        let reply = route(&Method::Post, "/api/reload", "", &service, &config);
        let body: Value = serde_json::from_str(&reply.body).unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(body["version"], 2);
        assert_eq!(body["articles"], 13);

        let reply = route(&Method::Get, "/api/reload", "", &service, &config);
        assert_eq!(reply.status, 405);
    }

    #[test]
    fn test_feed_route() {
        let service = service();
        let config = SiteConfig::default();
        let reply = route(&Method::Get, "/feed.xml", "", &service, &config);
        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("application/rss+xml"));
        assert!(reply.body.contains("<rss"));
    }

    #[test]
    fn test_unknown_route_and_method() {
        let service = service();
        let config = SiteConfig::default();
        assert_eq!(route(&Method::Get, "/nope", "", &service, &config).status, 404);
        assert_eq!(route(&Method::Get, "/api/nope", "", &service, &config).status, 404);
        assert_eq!(route(&Method::Delete, "/api/stats", "", &service, &config).status, 405);
        assert_eq!(route(&Method::Post, "/api/articles/post-01", "", &service, &config).status, 405);
    }

    #[test]
    fn test_parse_query() {
        let query = parse_query("page=2&type=&q=hello+world&tag=a%2Fb&flag");
        assert_eq!(query["page"], "2");
        assert_eq!(query["type"], "");
        assert_eq!(query["q"], "hello world");
        assert_eq!(query["tag"], "a/b");
        assert_eq!(query["flag"], "");
    }
}
