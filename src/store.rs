//! Current corpus snapshot with atomic reload.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  ContentStore (ArcSwap)                      │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐  │
//! │  │  Reader 1   │    │  Reader 2   │    │     Reloader     │  │
//! │  │  (request)  │    │  (request)  │    │ (watch / POST)   │  │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘  │
//! │         │                  │                    │            │
//! │         ▼                  ▼                    ▼            │
//! │     snapshot()         snapshot()      reload(): lock, load, │
//! │     (lock-free)        (lock-free)         store (atomic)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A reader keeps the `Arc<ContentIndex>` it loaded for as long as it needs
//! it, so a swap never tears a request in half.

use crate::{
    content::{ContentIndex, Loader},
    error::{ItemError, LoadError},
    log,
};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// What a successful reload installed.
#[derive(Debug)]
pub struct ReloadReport {
    pub version: u64,
    pub articles: usize,
    pub errors: Vec<ItemError>,
    pub elapsed: Duration,
}

pub struct ContentStore {
    current: ArcSwap<ContentIndex>,
    loader: Loader,
    reload_lock: Mutex<()>,
}

impl ContentStore {
    /// Create a store holding the empty version-0 snapshot.
    ///
    /// Call [`reload`](Self::reload) to load the corpus.
    pub fn new(loader: Loader) -> Self {
        Self {
            current: ArcSwap::from_pointee(ContentIndex::empty()),
            loader,
            reload_lock: Mutex::new(()),
        }
    }

    /// Current snapshot. Wait-free.
    #[inline]
    pub fn snapshot(&self) -> Arc<ContentIndex> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    /// Rebuild the corpus from the source and swap it in.
    ///
    /// Concurrent calls are serialized. On a terminal error the current
    /// snapshot stays installed and the error is returned.
    pub fn reload(&self) -> Result<ReloadReport, LoadError> {
        let _guard = self.reload_lock.lock();
        let start = Instant::now();
        let version = self.version() + 1;

        let outcome = match self.loader.load(version) {
            Ok(outcome) => outcome,
            Err(err) => {
                log!("reload"; "failed, keeping v{}: {err}", version - 1);
                return Err(err);
            }
        };

        for err in &outcome.errors {
            log!("error"; "{err}");
        }

        let articles = outcome.index.len();
        self.current.store(Arc::new(outcome.index));

        let elapsed = start.elapsed();
        let duplicates = outcome.errors.iter().filter(|e| e.is_duplicate()).count();
        log!(
            "reload";
            "v{version}: {articles} articles, {} skipped ({duplicates} duplicate) in {:.1?}",
            outcome.errors.len(),
            elapsed
        );

        Ok(ReloadReport {
            version,
            articles,
            errors: outcome.errors,
            elapsed,
        })
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("version", &self.version())
            .field("loader", &self.loader)
            .finish()
    }
}
