//! Post catalog loading and validation.
//!
//! `data/posts.json` is the source of truth for the whole site: the live
//! client renders the homepage and article views from it, and every build
//! step here (permalink pages, sitemap, feed) derives its desired state from
//! it. It is authored by hand and owned by the site editor — this module only
//! ever reads it.
//!
//! The one integrity rule enforced at load time is slug uniqueness. A slug is
//! the URL identity of a post; two posts sharing one would silently fight
//! over the same generated page, so a duplicate aborts the run before any
//! file is touched, naming both offending entries.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate slug \"{slug}\" shared by \"{first}\" and \"{second}\"")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
}

/// A single catalog entry.
///
/// `slug` and `category` (plus the optional `previous_category`) drive page
/// reconciliation; the remaining fields are content consumed by the page
/// renderer, the sitemap, and the feed. Unknown JSON fields are ignored —
/// the catalog schema is owned by the editor, not by this tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    pub category: String,
    /// Set by the editor when a post moves categories; a redirect is left
    /// behind at the old location.
    #[serde(default)]
    pub previous_category: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
}

impl Post {
    /// Timestamp of the most recent change: `updatedAt` when present,
    /// otherwise `publishedAt`.
    pub fn last_modified(&self) -> &str {
        self.updated_at.as_deref().unwrap_or(&self.published_at)
    }
}

/// Load the catalog and enforce slug uniqueness.
pub fn load_catalog(path: &Path) -> Result<Vec<Post>, CatalogError> {
    let content = fs::read_to_string(path)?;
    let posts: Vec<Post> = serde_json::from_str(&content)?;
    check_unique_slugs(&posts)?;
    Ok(posts)
}

/// Duplicate slugs are a fatal data error — detect them before any
/// filesystem mutation.
pub fn check_unique_slugs(posts: &[Post]) -> Result<(), CatalogError> {
    let mut seen: HashMap<&str, &Post> = HashMap::with_capacity(posts.len());
    for post in posts {
        if let Some(first) = seen.insert(&post.slug, post) {
            return Err(CatalogError::DuplicateSlug {
                slug: post.slug.clone(),
                first: first.title.clone(),
                second: post.title.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_minimal_catalog() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("posts.json");
        fs::write(
            &path,
            r#"[{"slug":"hello","title":"Hello","category":"技術開發","publishedAt":"2025-03-01"}]"#,
        )
        .unwrap();

        let posts = load_catalog(&path).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "hello");
        assert_eq!(posts[0].category, "技術開發");
        assert!(posts[0].previous_category.is_none());
    }

    #[test]
    fn camel_case_fields_deserialize() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("posts.json");
        fs::write(
            &path,
            r##"[{
                "slug": "moved",
                "title": "Moved Post",
                "category": "技術分析",
                "previousCategory": "技術開發",
                "coverImage": "/assets/cover.webp",
                "publishedAt": "2025-01-10",
                "updatedAt": "2025-02-20",
                "accentColor": "#556bff"
            }]"##,
        )
        .unwrap();

        let posts = load_catalog(&path).unwrap();
        let post = &posts[0];
        assert_eq!(post.previous_category.as_deref(), Some("技術開發"));
        assert_eq!(post.cover_image.as_deref(), Some("/assets/cover.webp"));
        assert_eq!(post.accent_color.as_deref(), Some("#556bff"));
        assert_eq!(post.last_modified(), "2025-02-20");
    }

    #[test]
    fn unknown_fields_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("posts.json");
        fs::write(
            &path,
            r#"[{"slug":"x","title":"X","category":"c","publishedAt":"2025-01-01","viewCount":42}]"#,
        )
        .unwrap();
        assert!(load_catalog(&path).is_ok());
    }

    #[test]
    fn duplicate_slug_names_both_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("posts.json");
        fs::write(
            &path,
            r#"[
                {"slug":"dup","title":"First Take","category":"a","publishedAt":"2025-01-01"},
                {"slug":"dup","title":"Second Take","category":"b","publishedAt":"2025-01-02"}
            ]"#,
        )
        .unwrap();

        match load_catalog(&path) {
            Err(CatalogError::DuplicateSlug { slug, first, second }) => {
                assert_eq!(slug, "dup");
                assert_eq!(first, "First Take");
                assert_eq!(second, "Second Take");
            }
            other => panic!("expected duplicate-slug error, got {other:?}"),
        }
    }

    #[test]
    fn last_modified_falls_back_to_published() {
        let post = Post {
            slug: "p".into(),
            title: "P".into(),
            category: "c".into(),
            previous_category: None,
            summary: String::new(),
            tags: vec![],
            cover_image: None,
            published_at: "2025-05-05".into(),
            updated_at: None,
            author: None,
            accent_color: None,
        };
        assert_eq!(post.last_modified(), "2025-05-05");
    }

    #[test]
    fn missing_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_catalog(&tmp.path().join("posts.json")),
            Err(CatalogError::Io(_))
        ));
    }
}
