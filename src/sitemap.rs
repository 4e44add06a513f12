//! Sitemap generation.
//!
//! Produces `sitemap.xml` covering the home page, the about page, and every
//! post at its WordPress-style permalink. Posts whose category has no
//! segment mapping are skipped with a warning, mirroring the reconciler.
//!
//! Generation is pure — the caller supplies the `now` timestamp and writes
//! the result — so tests never depend on the clock.

use crate::catalog::Post;
use crate::categories::CategoryMap;
use crate::config::SiteConfig;
use std::fmt::Write;

/// Render the sitemap XML. Returns the document and one warning line per
/// skipped post.
pub fn generate(
    posts: &[Post],
    categories: &CategoryMap,
    site: &SiteConfig,
    now: &str,
) -> (String, Vec<String>) {
    let mut xml = String::new();
    let mut warnings = Vec::new();

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    push_url(&mut xml, &format!("{}/", site.origin()), now, "daily", "1.0");
    push_url(
        &mut xml,
        &format!("{}/about.html", site.origin()),
        now,
        "monthly",
        "0.8",
    );

    for post in posts {
        let Some(segment) = categories.resolve(&post.category) else {
            warnings.push(format!(
                "no segment mapping for category \"{}\" — \"{}\" left out of the sitemap",
                post.category, post.slug
            ));
            continue;
        };
        push_url(
            &mut xml,
            &site.permalink(segment, &post.slug),
            post.last_modified(),
            "monthly",
            "0.9",
        );
    }

    xml.push_str("</urlset>\n");
    (xml, warnings)
}

fn push_url(xml: &mut String, loc: &str, lastmod: &str, changefreq: &str, priority: &str) {
    // infallible writes into a String
    let _ = write!(
        xml,
        "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
        xml_escape(loc),
        xml_escape(lastmod),
        changefreq,
        priority
    );
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{categories, post};

    #[test]
    fn contains_home_about_and_posts() {
        let posts = vec![post("hello", "Hello", "技術開發")];
        let (xml, warnings) = generate(&posts, &categories(), &SiteConfig::default(), "2025-06-01T00:00:00Z");

        assert!(warnings.is_empty());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<loc>https://b-log.to/</loc>"));
        assert!(xml.contains("<loc>https://b-log.to/about.html</loc>"));
        assert!(xml.contains("<loc>https://b-log.to/tech-development/hello/</loc>"));
    }

    #[test]
    fn lastmod_prefers_updated_at() {
        let mut p = post("hello", "Hello", "技術開發");
        p.published_at = "2025-01-01".into();
        p.updated_at = Some("2025-02-02".into());
        let (xml, _) = generate(&[p], &categories(), &SiteConfig::default(), "now");
        assert!(xml.contains("<lastmod>2025-02-02</lastmod>"));
    }

    #[test]
    fn unknown_category_warns_and_skips() {
        let posts = vec![post("lost", "Lost", "不存在的分類")];
        let (xml, warnings) = generate(&posts, &categories(), &SiteConfig::default(), "now");

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("不存在的分類"));
        assert!(!xml.contains("lost"));
    }

    #[test]
    fn hostile_slug_is_escaped() {
        let posts = vec![post("a&b", "AB", "技術開發")];
        let (xml, _) = generate(&posts, &categories(), &SiteConfig::default(), "now");
        assert!(xml.contains("a&amp;b"));
        assert!(!xml.contains("a&b<"));
    }
}
