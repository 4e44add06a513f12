//! # Permapress
//!
//! Build tool for a client-rendered blog that needs real, crawlable URLs.
//! The live site renders articles from `data/posts.json` in the browser;
//! this tool materializes a static WordPress-style permalink page
//! (`/<category-segment>/<slug>/index.html`) for every post so each one has
//! a stable URL that works without JavaScript and carries full social/SEO
//! metadata.
//!
//! # Architecture: Catalog-Driven Reconciliation
//!
//! The catalog is the single source of truth; everything on disk is derived
//! state that each run converges toward:
//!
//! ```text
//! data/posts.json ─┐
//! categories.json ─┼─→ sync     →  <segment>/<slug>/index.html  (pages + redirects)
//! post.html       ─┘   sitemap  →  sitemap.xml
//!                      feed     →  feed.json
//! ```
//!
//! The page sync is a two-pass reconciliation rather than a one-shot
//! generation:
//!
//! 1. **Materialize** — render every post's page at its current location
//!    (and a redirect at its declared previous location), writing only when
//!    bytes differ from disk.
//! 2. **Reconcile** — every pre-existing page that is no longer a current
//!    location is deleted (slug left the catalog) or converted into a
//!    redirect (post changed category), so the tree self-heals from edits
//!    the catalog never announced.
//!
//! Running the tool twice in a row performs zero writes the second time.
//! That property falls out of two choices: rendering is deterministic, and
//! every write goes through a compare-before-write gate.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Loads `data/posts.json`, enforces slug uniqueness |
//! | [`categories`] | Category label → URL segment table, defines the managed directories |
//! | [`render`] | Content pages (template + placeholders) and redirect pages (Maud) |
//! | [`reconcile`] | The two-pass page sync: materialize, then orphans and stale pages |
//! | [`sitemap`] | `sitemap.xml` covering home, about, and every permalink |
//! | [`feed`] | JSON Feed reconciliation — append, re-point, sort, conditional write |
//! | [`config`] | Optional `site.toml` with defaults for every knob |
//! | [`output`] | CLI output formatting — pure `format_*` functions plus print wrappers |
//!
//! # Design Decisions
//!
//! ## Redirects Are Pages, Not Server Config
//!
//! The site deploys to static hosting with no rewrite rules, so a category
//! move leaves an HTML page at the old URL: `meta refresh` plus a
//! `location.replace` script for readers, a `rel=canonical` link for
//! crawlers. The redirect marker lives in the page content itself (the
//! `meta http-equiv="refresh"` tag) — no sidecar manifest to drift out of
//! sync with the tree.
//!
//! ## Template File Plus Maud
//!
//! The article page shell is the same `post.html` the live client uses, so
//! the two views cannot drift; this tool fills its `{{...}}` placeholder
//! regions. Markup this tool fully owns — the social metadata block and the
//! whole redirect page — is generated with [Maud](https://maud.lambda.xyz/)
//! instead: compile-time checked, auto-escaped interpolation.
//!
//! ## Delete-by-Scan, Not Delete-by-Diff
//!
//! Orphan detection trusts the disk scan taken at the start of the run, and
//! the scan only looks inside directories named by a known category segment.
//! Anything else at the site root — assets, drafts, directories this tool
//! never created — is invisible and therefore untouchable. Empty-directory
//! pruning walks upward over canonicalized paths and stops hard at the site
//! root.

pub mod catalog;
pub mod categories;
pub mod config;
pub mod feed;
pub mod output;
pub mod reconcile;
pub mod render;
pub mod sitemap;

#[cfg(test)]
pub(crate) mod test_helpers;
