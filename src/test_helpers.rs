//! Shared fixtures for unit tests.

use crate::catalog::Post;
use crate::categories::CategoryMap;
use crate::render::Template;
use tempfile::TempDir;

/// A post template mirroring the real `post.html`: all placeholder regions,
/// root-relative asset and navigation links.
const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
    <meta charset="UTF-8">
    <title>{{title}}</title>
    <meta name="description" content="{{description}}">
    <meta name="keywords" content="{{keywords}}">
    <link rel="canonical" href="{{canonical}}">
    {{social_meta}}
    <link rel="stylesheet" href="assets/main.css">
    <link rel="alternate" type="application/feed+json" href="feed.json">
</head>
<body>
    <nav>
        <a href="./">Home</a>
        <a href="about.html">About</a>
    </nav>
    <article id="article">{{article}}</article>
    <script src="assets/app.js"></script>
</body>
</html>
"#;

/// A catalog post with the given identity and sensible defaults everywhere
/// else. Tests mutate the returned value for the fields they care about.
pub fn post(slug: &str, title: &str, category: &str) -> Post {
    Post {
        slug: slug.into(),
        title: title.into(),
        category: category.into(),
        previous_category: None,
        summary: format!("{title} summary"),
        tags: vec![],
        cover_image: None,
        published_at: "2025-01-15".into(),
        updated_at: None,
        author: None,
        accent_color: None,
    }
}

/// The category table most tests run against.
pub fn categories() -> CategoryMap {
    CategoryMap::from_pairs([
        ("AI 分析", "ai-analysis"),
        ("技術開發", "tech-development"),
        ("技術分析", "tech-analysis"),
        ("開發哲學", "dev-philosophy"),
        ("文化觀察", "cultural-insights"),
    ])
    .unwrap()
}

pub fn template() -> Template {
    Template::from_html(TEMPLATE).unwrap()
}

/// An empty managed site root.
pub fn site_tree() -> TempDir {
    TempDir::new().unwrap()
}
