//! `[serve]` section configuration.
//!
//! Contains JSON api server settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in quire.toml.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 3000
/// watch = true           # Reload the corpus when content changes
/// workers = 8
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 5277).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Watch the content directory and reload on change.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,

    /// Request handler threads.
    #[serde(default = "defaults::serve::workers")]
    #[educe(Default = defaults::serve::workers())]
    pub workers: usize,
}
