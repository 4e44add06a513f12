//! Page rendering for generated permalink pages.
//!
//! Two kinds of page come out of this module, both as plain strings of HTML:
//!
//! - **Content pages** — the article shell written to
//!   `<segment>/<slug>/index.html`. The document structure comes from the
//!   `post.html` template shared with the live client-rendered article view;
//!   this module fills in its placeholder regions (title, description,
//!   canonical URL, keywords, social metadata, optional static article body).
//! - **Redirect pages** — minimal documents left behind at a post's old
//!   category location, forwarding the reader (and crawlers, via the
//!   canonical link) to the current permalink.
//!
//! Rendering is deterministic: identical inputs produce byte-identical
//! output. The reconciler depends on that to decide whether a page on disk
//! needs rewriting at all.
//!
//! All catalog-supplied text passes through maud's escaping before it is
//! substituted into the template, so a hostile title cannot break out of the
//! markup. The template itself is a build-time asset and is trusted; a
//! template missing a required placeholder region is a fatal error at load
//! time, before anything is written.

use crate::catalog::Post;
use crate::config::SiteConfig;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Placeholder regions every template must carry.
const REQUIRED_PLACEHOLDERS: &[&str] = &[
    "{{title}}",
    "{{description}}",
    "{{canonical}}",
    "{{keywords}}",
    "{{social_meta}}",
];

/// Optional region for the statically rendered article body.
const ARTICLE_PLACEHOLDER: &str = "{{article}}";

/// The article page template, validated at load time.
#[derive(Debug, Clone)]
pub struct Template {
    html: String,
}

impl Template {
    /// Read and validate the template file. Absence is fatal — the template
    /// is a build-time asset, not user data.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let html = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_html(html)
    }

    /// Validate template markup held in memory.
    pub fn from_html(html: impl Into<String>) -> Result<Self, TemplateError> {
        let html = html.into();
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !html.contains(placeholder) {
                return Err(TemplateError::MissingPlaceholder(placeholder));
            }
        }
        Ok(Template { html })
    }
}

/// Render the full content page for a post at its current category segment.
///
/// `article_markdown`, when present, is the post's markdown body; it is
/// rendered into the `{{article}}` region so the permalink page carries
/// static content before the client-side renderer hydrates it.
pub fn render_content_page(
    template: &Template,
    post: &Post,
    segment: &str,
    article_markdown: Option<&str>,
    site: &SiteConfig,
) -> String {
    let canonical = site.permalink(segment, &post.slug);
    let page_title = format!("{} - {}", display_title(post), site.title);
    let image = post_image(post, site);
    let meta = social_meta(post, &canonical, &image, site).into_string();

    let mut html = adjust_asset_paths(&template.html);
    html = html
        .replace("{{title}}", &escape(&page_title))
        .replace("{{description}}", &escape(&post.summary))
        .replace("{{canonical}}", &escape(&canonical))
        .replace("{{keywords}}", &escape(&post.tags.join(", ")))
        .replace("{{social_meta}}", &meta);

    // The article body is substituted last so markdown that happens to
    // contain a "{{...}}" token is never treated as a placeholder.
    if html.contains(ARTICLE_PLACEHOLDER) {
        let body = match article_markdown {
            Some(md) => markdown_to_html(md),
            None => String::new(),
        };
        html = html.replace(ARTICLE_PLACEHOLDER, &body);
    }

    html
}

/// Render the minimal page that forwards a stale URL to the post's current
/// location. The target is a site-root-relative path, `/<segment>/<slug>/`.
pub fn render_redirect_page(target_segment: &str, slug: &str) -> String {
    let target = format!("/{}/{}/", target_segment, slug);
    let markup = html! {
        (DOCTYPE)
        html lang="zh-Hant" {
            head {
                meta charset="UTF-8";
                title { "Redirecting…" }
                link rel="canonical" href=(target);
                meta http-equiv="refresh" content={ "0;url=" (target) };
                script { (PreEscaped(format!("location.replace({});", js_string(&target)))) }
            }
            body {
                p {
                    "This post has moved to "
                    a href=(target) { (target) }
                    "."
                }
            }
        }
    };
    markup.into_string()
}

/// Extract the redirect target from a generated page, if the page is a
/// redirect page. Content pages (and anything else) return `None`.
///
/// The page variant is carried in the content itself rather than a sidecar
/// file; the `meta http-equiv="refresh"` tag is the signature.
pub fn redirect_target(html: &str) -> Option<&str> {
    let at = html.find("http-equiv=\"refresh\"")?;
    let rest = &html[at..];
    let url_at = rest.find("url=")?;
    let after = &rest[url_at + "url=".len()..];
    let end = after.find('"')?;
    Some(&after[..end])
}

/// The image URL for social cards: the post's cover image made absolute, or
/// a generated placeholder image when the post has none.
pub fn post_image(post: &Post, site: &SiteConfig) -> String {
    match &post.cover_image {
        Some(img) if img.starts_with("http") => img.clone(),
        Some(img) => site.absolute_url(img),
        None => {
            let favicon = urlencoding::encode_binary(
                format!("{}/favicon.ico", site.origin()).as_bytes(),
            )
            .into_owned();
            format!(
                "https://og-image.vercel.app/{}.png?theme=light&md=1&fontSize=100px&images={}",
                urlencoding::encode(display_title(post)),
                favicon
            )
        }
    }
}

fn display_title(post: &Post) -> &str {
    if post.title.is_empty() {
        "Untitled Post"
    } else {
        &post.title
    }
}

/// Open Graph, `article:*`, and Twitter Card metadata for a post. maud
/// escapes every interpolated value.
fn social_meta(post: &Post, canonical: &str, image: &str, site: &SiteConfig) -> Markup {
    let author = post.author.as_deref().unwrap_or(&site.author);
    let title = display_title(post);
    html! {
        meta property="og:type" content="article";
        meta property="og:url" content=(canonical);
        meta property="og:title" content=(title);
        meta property="og:description" content=(post.summary);
        meta property="og:image" content=(image);
        meta property="article:author" content=(author);
        meta property="article:published_time" content=(post.published_at);
        meta property="article:modified_time" content=(post.last_modified());
        meta property="article:section" content=(post.category);
        @for tag in &post.tags {
            meta property="article:tag" content=(tag);
        }
        meta name="twitter:card" content="summary_large_image";
        meta name="twitter:url" content=(canonical);
        meta name="twitter:title" content=(title);
        meta name="twitter:description" content=(post.summary);
        meta name="twitter:image" content=(image);
    }
}

/// The template is written with root-relative asset references; generated
/// pages live two directory levels down, so point those references back up.
fn adjust_asset_paths(html: &str) -> String {
    html.replace("href=\"assets/", "href=\"../../assets/")
        .replace("src=\"assets/", "src=\"../../assets/")
        .replace("href=\"./\"", "href=\"../../\"")
        .replace("href=\"about.html\"", "href=\"../../about.html\"")
        .replace("href=\"feed.json\"", "href=\"../../feed.json\"")
}

/// Escape text for substitution into HTML via maud.
fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Quote a string for inline JavaScript. `<` is escaped so the value can
/// never terminate the surrounding `<script>` element.
fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003c"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}
