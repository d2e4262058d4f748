//! Content directory watcher.
//!
//! Any create, modify or remove under the content directory schedules one
//! full corpus reload once events have been quiet for the debounce window.
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌────────────────────┐
//! │ notify   │───▶│ Debouncer │───▶│ reload_articles()  │
//! │ events   │    │ (300ms)   │    │ (atomic swap)      │
//! └──────────┘    └───────────┘    └────────────────────┘
//! ```

use crate::{config::SiteConfig, log, service::ArticleService};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::RecvTimeoutError,
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Content files, plus extensionless paths (directories being created or removed).
fn is_content_path(path: &Path, extensions: &[String]) -> bool {
    if is_temp_file(path) {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
        None => true,
    }
}

/// `/site/content/2024/post.md` → `content/2024/post.md`
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events into a single reload.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            window,
        }
    }

    fn add(&mut self, event: Event, extensions: &[String]) {
        let before = self.pending.len();
        self.pending.extend(
            event
                .paths
                .into_iter()
                .filter(|p| is_content_path(p, extensions)),
        );
        if self.pending.len() > before {
            self.last_event = Some(Instant::now());
        }
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.window)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            self.window
        }
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Event Handler
// =============================================================================

fn handle_changes(paths: &[PathBuf], service: &dyn ArticleService, root: &Path) {
    let trigger = match paths {
        [single] => rel_path(single, root),
        [first, rest @ ..] => format!("{} (+{} more)", rel_path(first, root), rest.len()),
        [] => return,
    };
    log!("watch"; "{trigger} changed, reloading...");

    // The store already logs the outcome and item errors
    if let Err(err) = service.reload_articles() {
        log!("watch"; "reload failed, still serving the previous corpus: {err}");
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the content directory and reload the corpus on change. Blocks.
pub fn watch_for_changes_blocking(service: &dyn ArticleService, config: &SiteConfig) -> Result<()> {
    let root = config.content_dir();
    let extensions = &config.content.extensions;

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch content: {}", root.display()))?;
    log!("watch"; "{}", root.display());

    let mut debouncer = Debouncer::new(Duration::from_millis(DEBOUNCE_MS));

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event, extensions),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(&debouncer.take(), service, &config.root);
            }
            Err(RecvTimeoutError::Disconnected) => break,
            // Irrelevant events, timeout without pending changes
            _ => {}
        }
    }

    Ok(())
}
