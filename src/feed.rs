//! JSON Feed reconciliation.
//!
//! `feed.json` is a [JSON Feed](https://www.jsonfeed.org/) consumed by feed
//! readers and linked from every page. Like the permalink tree, it can drift
//! from the catalog: new posts are missing from it, and category renames
//! leave items pointing at dead URLs. This module brings it back in line:
//!
//! - append an item for every catalog post the feed doesn't know;
//! - rewrite any item whose URL no longer matches the post's permalink;
//! - sort items newest-first;
//! - write the file only when something actually changed.
//!
//! Fields this tool doesn't understand (feed icon, custom extensions, hub
//! declarations) are round-tripped untouched via `#[serde(flatten)]` — the
//! feed is shared with the client and must not lose data here.
//!
//! Posts whose category has no segment mapping still get a feed item, under
//! the `uncategorized` path — a feed entry with a slightly wrong URL beats a
//! silently missing post announcement.

use crate::catalog::Post;
use crate::categories::CategoryMap;
use crate::config::SiteConfig;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fallback path segment for posts whose category label has no mapping.
const UNCATEGORIZED_SEGMENT: &str = "uncategorized";

#[derive(Debug, Serialize, Deserialize)]
pub struct Feed {
    pub version: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<FeedItem>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    /// The post slug.
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    #[serde(default)]
    pub date_published: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

/// What a feed reconciliation did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedReport {
    pub added: usize,
    pub urls_updated: usize,
    pub wrote: bool,
}

/// Reconcile `feed.json` with the catalog. A missing feed file starts from
/// an empty skeleton.
pub fn sync_feed(
    feed_path: &Path,
    posts: &[Post],
    categories: &CategoryMap,
    site: &SiteConfig,
) -> Result<FeedReport, FeedError> {
    let mut feed = read_or_init(feed_path, site)?;
    let mut report = FeedReport::default();

    let known: HashSet<&str> = feed.items.iter().map(|item| item.id.as_str()).collect();
    let missing: Vec<&Post> = posts
        .iter()
        .filter(|post| !known.contains(post.slug.as_str()))
        .collect();
    for post in missing {
        feed.items.push(feed_item(post, categories, site));
        report.added += 1;
    }

    // Re-point items whose post changed category since the item was written.
    let by_slug: BTreeMap<&str, &Post> = posts.iter().map(|p| (p.slug.as_str(), p)).collect();
    for item in &mut feed.items {
        if let Some(post) = by_slug.get(item.id.as_str()) {
            let correct = permalink_for(post, categories, site);
            if item.url != correct {
                item.url = correct;
                report.urls_updated += 1;
            }
        }
    }

    feed.items
        .sort_by_key(|item| std::cmp::Reverse(parse_timestamp(&item.date_published)));

    if report.added > 0 || report.urls_updated > 0 || !feed_path.exists() {
        let json = serde_json::to_string_pretty(&feed)?;
        fs::write(feed_path, json)?;
        report.wrote = true;
    }
    Ok(report)
}

fn read_or_init(path: &Path, site: &SiteConfig) -> Result<Feed, FeedError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Feed {
            version: "https://jsonfeed.org/version/1.1".to_string(),
            title: site.title.clone(),
            items: Vec::new(),
            extra: BTreeMap::new(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn feed_item(post: &Post, categories: &CategoryMap, site: &SiteConfig) -> FeedItem {
    FeedItem {
        id: post.slug.clone(),
        url: permalink_for(post, categories, site),
        title: post.title.clone(),
        content_text: Some(post.summary.clone()),
        date_published: normalize_timestamp(&post.published_at),
        date_modified: Some(normalize_timestamp(post.last_modified())),
        tags: post.tags.clone(),
        authors: vec![Author {
            name: post
                .author
                .clone()
                .unwrap_or_else(|| site.author.clone()),
        }],
        image: post.cover_image.as_ref().map(|img| {
            if img.starts_with("http") {
                img.clone()
            } else {
                site.absolute_url(img)
            }
        }),
        extra: BTreeMap::new(),
    }
}

fn permalink_for(post: &Post, categories: &CategoryMap, site: &SiteConfig) -> String {
    let segment = categories
        .resolve(&post.category)
        .unwrap_or(UNCATEGORIZED_SEGMENT);
    site.permalink(segment, &post.slug)
}

/// Parse the catalog's timestamps: either full RFC 3339 or a bare date.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical RFC 3339 form of a catalog timestamp; unparseable values pass
/// through untouched (the feed is not the place to invent data).
fn normalize_timestamp(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.to_rfc3339(),
        None => value.to_string(),
    }
}
