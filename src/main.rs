//! quire - an in-memory content engine for markdown personal sites.

mod cache;
mod cli;
mod config;
mod content;
mod error;
mod feed;
mod logger;
mod serve;
mod service;
mod store;
mod watch;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands, ListArgs};
use colored::Colorize;
use config::SiteConfig;
use content::{Article, PostType};
use serve::serve_site;
use service::{ArticlePage, ArticleService, ContentService, Visibility, retain_kind};
use std::{fs, sync::Arc};

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(SiteConfig::load(cli)?));
    let service: &'static ContentService = Box::leak(Box::new(ContentService::from_config(config)));

    let report = service
        .reload_articles()
        .with_context(|| format!("Failed to load {}", config.content_dir().display()))?;

    if cli.is_serve() {
        let source = if config.config_path.exists() {
            config.config_path.display().to_string()
        } else {
            "defaults".to_owned()
        };
        log!("load"; "{} articles, config from {source}", report.articles);
    }

    match &cli.command {
        Commands::List { args } => list(service, config, args),
        Commands::Show { slug, drafts } => show(service, slug, *drafts),
        Commands::Drafts => {
            print_table(&service.get_draft_articles());
            Ok(())
        }
        Commands::Search { query, limit, json } => search(service, query, *limit, *json),
        Commands::Stats { json } => stats(service, *json),
        Commands::Check => {
            let published = service.get_published_articles().len();
            let total = service.get_all_articles().len();
            if report.errors.is_empty() {
                log!("check"; "{total} articles ({published} published), no errors");
                Ok(())
            } else {
                bail!(
                    "{} of {} items failed to load",
                    report.errors.len(),
                    report.articles + report.errors.len()
                )
            }
        }
        Commands::Feed { output } => {
            let xml = feed::build_rss(service, config)?;
            match output {
                Some(path) => {
                    fs::write(path, xml).with_context(|| format!("Failed to write {}", path.display()))?;
                    log!("feed"; "{}", path.display());
                }
                None => println!("{xml}"),
            }
            Ok(())
        }
        Commands::Serve { .. } => serve_site(service, config),
    }
}

fn list(service: &dyn ArticleService, config: &SiteConfig, args: &ListArgs) -> Result<()> {
    let per_page = args.per_page.unwrap_or(config.content.per_page);
    let kind = PostType::parse_filter(args.kind.as_deref().unwrap_or_default())
        .map_err(|other| anyhow::anyhow!("unknown post type `{other}`"))?;
    let page = match (&args.tag, &args.category) {
        (Some(tag), _) => {
            let mut items = service.get_articles_by_tag(tag);
            retain_kind(&mut items, kind);
            ArticlePage::new(&items, args.page, per_page)
        }
        (_, Some(category)) => {
            let mut items = service.get_articles_by_category(category);
            retain_kind(&mut items, kind);
            ArticlePage::new(&items, args.page, per_page)
        }
        (None, None) => service.list_published(kind, args.page, per_page),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    print_table(&page.items);
    let p = page.pagination;
    println!(
        "{}",
        format!("page {}/{} · {} posts", p.current_page, p.total_pages, p.total_items).dimmed()
    );
    Ok(())
}

fn show(service: &dyn ArticleService, slug: &str, drafts: bool) -> Result<()> {
    let visibility = if drafts {
        Visibility::IncludeDrafts
    } else {
        Visibility::Published
    };
    let article = service.get_article_by_slug(slug, visibility)?;
    println!("{}", serde_json::to_string_pretty(&article)?);
    Ok(())
}

fn search(service: &dyn ArticleService, query: &str, limit: usize, json: bool) -> Result<()> {
    let results = service.search_articles(query, limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in &results {
        println!(
            "{:>6.1}  {:<32} {}",
            result.score,
            result.article.slug.bold(),
            result.matched_fields.join(",").dimmed()
        );
    }
    println!("{}", format!("{} matches", results.len()).dimmed());
    Ok(())
}

fn stats(service: &dyn ArticleService, json: bool) -> Result<()> {
    let stats = service.get_stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{:<12}{}", "total", stats.total);
    println!("{:<12}{}", "published", stats.published);
    println!("{:<12}{}", "drafts", stats.drafts);
    println!("{:<12}{}", "tags", stats.tags);
    println!("{:<12}{}", "categories", stats.categories);
    if !stats.popular_tags.is_empty() {
        let tags: Vec<_> = stats
            .popular_tags
            .iter()
            .map(|t| format!("{} ({})", t.name, t.count))
            .collect();
        println!("{:<12}{}", "popular", tags.join(", "));
    }
    for (label, names) in [
        ("tagged", service.get_all_tags()),
        ("filed in", service.get_all_categories()),
    ] {
        if !names.is_empty() {
            println!("{:<12}{}", label, names.join(", "));
        }
    }
    Ok(())
}

fn print_table(articles: &[Arc<Article>]) {
    for article in articles {
        let marker = if article.draft { "draft".red() } else { article.kind.as_str().cyan() };
        println!(
            "{}  {:<8} {:<32} {}",
            article.created_at.format("%Y-%m-%d"),
            marker,
            article.slug.bold(),
            article.display_title()
        );
    }
}
