//! Site configuration module.
//!
//! Handles loading and validating the optional `site.toml` at the site root.
//! Everything has a sensible default so a stock checkout builds without any
//! config file at all; the file exists to override the base URL and the
//! handful of well-known file locations.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! base_url = "https://b-log.to"        # Canonical origin for generated URLs
//! title = "b-log"                      # Suffix for <title> tags, feed title
//! author = "Jason Chien"               # Default article author
//!
//! template = "post.html"               # Article page template (shared with the live view)
//! posts_json = "data/posts.json"       # The post catalog
//! categories_json = "config/categories.json"
//! posts_dir = "posts"                  # Per-post markdown bodies
//! sitemap = "sitemap.xml"              # Sitemap output path
//! feed = "feed.json"                   # JSON Feed path (read and rewritten)
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! Note the asymmetry with the other inputs: a missing `site.toml` falls back
//! to defaults, but a missing category table or page template is always fatal
//! — those two are load-bearing for page generation and there is no sane
//! default for them.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Canonical origin for all generated absolute URLs (no trailing slash
    /// required; one is stripped if present).
    pub base_url: String,
    /// Site title, used as the `<title>` suffix and the feed title.
    pub title: String,
    /// Default author for posts that don't set one.
    pub author: String,
    /// Path (relative to the site root) of the article page template.
    pub template: String,
    /// Path of the post catalog.
    pub posts_json: String,
    /// Path of the category label → segment table.
    pub categories_json: String,
    /// Directory holding per-post markdown bodies (`<slug>.md`).
    pub posts_dir: String,
    /// Output path for the generated sitemap.
    pub sitemap: String,
    /// Path of the JSON Feed, read and rewritten in place.
    pub feed: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://b-log.to".to_string(),
            title: "b-log".to_string(),
            author: "Jason Chien".to_string(),
            template: "post.html".to_string(),
            posts_json: "data/posts.json".to_string(),
            categories_json: "config/categories.json".to_string(),
            posts_dir: "posts".to_string(),
            sitemap: "sitemap.xml".to_string(),
            feed: "feed.json".to_string(),
        }
    }
}

impl SiteConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "base_url must start with http:// or https://".into(),
            ));
        }
        if self.title.is_empty() {
            return Err(ConfigError::Validation("title must not be empty".into()));
        }
        Ok(())
    }

    /// The base URL without a trailing slash.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// The canonical WordPress-style URL for a post:
    /// `<base_url>/<segment>/<slug>/`.
    pub fn permalink(&self, segment: &str, slug: &str) -> String {
        format!("{}/{}/{}/", self.origin(), segment, slug)
    }

    /// Absolute URL for a site-relative path like `/assets/cover.webp`.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}/{}", self.origin(), path.trim_start_matches('/'))
    }
}

/// Load `site.toml` from the site root, falling back to defaults when the
/// file doesn't exist.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let path = root.join("site.toml");
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    let config: SiteConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_toml() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.base_url, "https://b-log.to");
        assert_eq!(config.template, "post.html");
    }

    #[test]
    fn partial_override() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("site.toml"),
            "base_url = \"https://example.org/\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.base_url, "https://example.org/");
        // untouched fields keep their defaults
        assert_eq!(config.posts_json, "data/posts.json");
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("site.toml"), "base_uri = \"typo\"\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn non_http_base_url_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("site.toml"), "base_url = \"ftp://x\"\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn permalink_normalizes_trailing_slash() {
        let config = SiteConfig {
            base_url: "https://example.org/".into(),
            ..SiteConfig::default()
        };
        assert_eq!(
            config.permalink("tech-analysis", "x"),
            "https://example.org/tech-analysis/x/"
        );
    }

    #[test]
    fn absolute_url_joins_relative_paths() {
        let config = SiteConfig::default();
        assert_eq!(
            config.absolute_url("/assets/cover.webp"),
            "https://b-log.to/assets/cover.webp"
        );
        assert_eq!(
            config.absolute_url("assets/cover.webp"),
            "https://b-log.to/assets/cover.webp"
        );
    }
}
