//! `[site]` section configuration.
//!
//! Basic site metadata used by the feed and the JSON api.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in quire.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [site]
/// title = "My Site"
/// description = "Notes and essays"
/// author = "Alice"
/// url = "https://example.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Site title, used as the rss channel title.
    #[serde(default = "defaults::site::title")]
    #[educe(Default = defaults::site::title())]
    pub title: String,

    /// Site description for the rss channel.
    #[serde(default)]
    pub description: String,

    /// Base URL for absolute links in the feed.
    #[serde(default = "defaults::site::url")]
    #[educe(Default = defaults::site::url())]
    pub url: Option<String>,

    /// Default author name for posts without one.
    #[serde(default = "defaults::site::author")]
    #[educe(Default = defaults::site::author())]
    pub author: String,

    /// Author email for rss `<author>` fields.
    #[serde(default = "defaults::site::email")]
    #[educe(Default = defaults::site::email())]
    pub email: String,

    /// BCP 47 language code (e.g., "en", "zh-Hans").
    #[serde(default = "defaults::site::language")]
    #[educe(Default = defaults::site::language())]
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_site_config_full() {
        let config = r#"
            [site]
            title = "Field Notes"
            description = "Notes and essays"
            url = "https://notes.example.com"
            author = "Alice"
            email = "alice@example.com"
            language = "en-GB"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.site.title, "Field Notes");
        assert_eq!(config.site.description, "Notes and essays");
        assert_eq!(config.site.url.as_deref(), Some("https://notes.example.com"));
        assert_eq!(config.site.author, "Alice");
        assert_eq!(config.site.email, "alice@example.com");
        assert_eq!(config.site.language, "en-GB");
    }

    #[test]
    fn test_site_config_defaults() {
        let config: SiteConfig = toml::from_str("[site]").unwrap();

        assert_eq!(config.site.title, "My Site");
        assert_eq!(config.site.description, "");
        assert_eq!(config.site.url, None);
        assert_eq!(config.site.author, "<YOUR_NAME>");
        assert_eq!(config.site.language, "en");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [site]
            title = "Test"
            unknown_field = "should_fail"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }
}
