//! Site configuration management for `quire.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                      |
//! |-------------|----------------------------------------------|
//! | `[site]`    | Site metadata (title, author, url)           |
//! | `[content]` | Content directory, extensions, page size     |
//! | `[cache]`   | TTL of cached derived views                  |
//! | `[feed]`    | rss item limit and link prefix               |
//! | `[serve]`   | JSON api server (port, interface, watch)     |
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "My Site"
//! url = "https://example.com"
//!
//! [content]
//! dir = "content"
//! per_page = 10
//!
//! [cache]
//! ttl = 3600
//!
//! [serve]
//! port = 5277
//! ```

mod cache;
mod content;
pub mod defaults;
mod error;
mod serve;
mod site;

use cache::{CacheSection, FeedSection};
use content::ContentSection;
use error::ConfigError;
use serve::ServeConfig;
use site::SiteSection;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Largest page size accepted from configuration.
const MAX_PER_PAGE: usize = 100;

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub content: ContentSection,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub feed: FeedSection,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `quire.toml` from the CLI root, falling back to defaults when the
    /// file does not exist, then apply CLI overrides and validate.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Absolute content directory.
    pub fn content_dir(&self) -> &Path {
        &self.content.dir
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = Self::normalize_path(cli.root.as_deref().unwrap_or(Path::new("./")));
        self.config_path = Self::normalize_path(&root.join(&cli.config));

        Self::update_option(&mut self.content.dir, cli.content.as_ref());
        self.content.dir = Self::normalize_path(&root.join(&self.content.dir));
        self.root = root;

        if let Commands::Serve {
            interface,
            port,
            watch,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration values that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl == 0 {
            bail!(ConfigError::Validation("[cache.ttl] must be positive".into()));
        }

        if !(1..=MAX_PER_PAGE).contains(&self.content.per_page) {
            bail!(ConfigError::Validation(format!(
                "[content.per_page] must be between 1 and {MAX_PER_PAGE}"
            )));
        }

        if self.content.extensions.is_empty() {
            bail!(ConfigError::Validation(
                "[content.extensions] must list at least one extension".into()
            ));
        }

        if let Some(url) = &self.site.url
            && !url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[site.url] must start with http:// or https://".into()
            ));
        }

        if self.serve.workers == 0 {
            bail!(ConfigError::Validation("[serve.workers] must be at least 1".into()));
        }

        Ok(())
    }
}
