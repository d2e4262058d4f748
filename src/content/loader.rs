//! Builds a candidate [`ContentIndex`] from a [`ContentSource`].
//!
//! Parsing is parallel; folding is sequential so duplicate resolution is
//! deterministic (first item in source order wins).

use super::{ContentIndex, ContentSource, frontmatter};
use crate::error::{ItemError, ItemErrorReason, LoadError};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// Result of a successful load: the new index plus every per-item failure.
#[derive(Debug)]
pub struct LoadOutcome {
    pub index: ContentIndex,
    pub errors: Vec<ItemError>,
}

pub struct Loader {
    source: Box<dyn ContentSource>,
}

impl Loader {
    pub fn new(source: impl ContentSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Enumerate, parse and index the whole corpus.
    ///
    /// Only a failure to enumerate the source is an `Err`. Malformed items and
    /// duplicate slugs end up in [`LoadOutcome::errors`] and are left out of
    /// the index.
    pub fn load(&self, version: u64) -> Result<LoadOutcome, LoadError> {
        let items = self.source.read_all()?;
        let parsed: Vec<_> = items.into_par_iter().map(frontmatter::parse).collect();

        let mut seen: FxHashMap<String, PathBuf> = FxHashMap::default();
        let mut articles = Vec::with_capacity(parsed.len());
        let mut errors = Vec::new();

        for result in parsed {
            match result {
                Ok(article) => {
                    if let Some(first) = seen.get(&article.slug) {
                        errors.push(ItemError::new(
                            article.source.clone(),
                            ItemErrorReason::DuplicateSlug {
                                slug: article.slug.clone(),
                                first: first.clone(),
                            },
                        ));
                        continue;
                    }
                    seen.insert(article.slug.clone(), article.source.clone());
                    articles.push(article);
                }
                Err(err) => errors.push(err),
            }
        }

        Ok(LoadOutcome {
            index: ContentIndex::new(articles, version),
            errors,
        })
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("source", &self.source.describe())
            .finish()
    }
}
