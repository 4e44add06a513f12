//! Permalink page reconciliation — the core of the build tool.
//!
//! Brings the on-disk tree of generated `<segment>/<slug>/index.html` pages
//! into agreement with the post catalog. The tree is fully owned by this
//! module: nothing else writes under the managed category directories, and
//! the catalog is read-only input.
//!
//! ## Desired end state
//!
//! After a successful run, for every catalog post with a resolvable
//! category:
//!
//! - exactly one content page exists at `<segment>/<slug>/index.html`;
//! - if the post declares a `previousCategory` resolving to a *different*
//!   segment, a redirect page sits at the old location pointing here;
//! - no page exists for a slug absent from the catalog (orphan), and no
//!   stale content page sits at a segment that no longer matches the post's
//!   category.
//!
//! ## Algorithm
//!
//! The existing tree is scanned up front (only directories named by a known
//! category segment are visible — a page under an unrecognized segment is
//! simply not ours to manage). Then two passes run:
//!
//! 1. **Materialization.** Every resolvable post is re-rendered at its
//!    current location, plus a redirect at its declared previous location.
//!    Rendering is unconditional; the *write* is skipped when the rendered
//!    bytes already match the file on disk, which is an exact check because
//!    rendering is deterministic. Posts are independent here, so this pass
//!    runs in parallel; directory creation is create-if-absent.
//! 2. **Reconciliation.** Every page found by the initial scan that is not a
//!    post's current location is either an orphan (slug gone from the
//!    catalog: delete it and prune now-empty parent directories) or stale
//!    (slug lives under a different segment now: leave it if it is already a
//!    correctly-targeted redirect, otherwise overwrite it with one). The
//!    second case self-heals category renames the editor made without
//!    setting `previousCategory`.
//!
//! Pass 2 only ever touches paths enumerated by the initial scan, and the
//! empty-directory pruning walks upward over canonicalized paths, stopping
//! hard at the managed root.
//!
//! ## Failure semantics
//!
//! A post whose category label is not in the table is skipped with a warning
//! and omitted from the desired state for the run — which means a page it
//! generated earlier is collected as an orphan. Filesystem errors abort the
//! run; there is no rollback, and a partial tree is recovered by the next
//! successful run re-converging (every operation here is idempotent).

use crate::catalog::Post;
use crate::categories::CategoryMap;
use crate::config::SiteConfig;
use crate::render::{self, Template};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scan error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// What happened to a single output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub pages_created: usize,
    pub pages_updated: usize,
    pub pages_unchanged: usize,
    pub redirects_created: usize,
    pub redirects_updated: usize,
    pub redirects_unchanged: usize,
    pub stale_converted: usize,
    pub orphans_removed: usize,
    pub skipped: Vec<SkippedPost>,
}

impl RunSummary {
    /// Total number of filesystem mutations the run performed. Zero on the
    /// second of two back-to-back runs over the same inputs.
    pub fn writes(&self) -> usize {
        self.pages_created
            + self.pages_updated
            + self.redirects_created
            + self.redirects_updated
            + self.stale_converted
            + self.orphans_removed
    }
}

/// A post excluded from the run because its category label has no mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPost {
    pub slug: String,
    pub label: String,
}

/// A generated page found by the initial disk scan.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExistingPage {
    segment: String,
    slug: String,
    path: PathBuf,
}

/// A catalog post with its resolved segment(s).
struct PlannedPage<'a> {
    post: &'a Post,
    segment: &'a str,
    /// Resolved previous segment, only when it differs from `segment`.
    previous_segment: Option<&'a str>,
}

/// Per-post result of the materialization pass.
struct PageActions {
    content: WriteOutcome,
    redirect: Option<WriteOutcome>,
}

/// Run one full reconciliation over `tree` (the site root).
pub fn sync(
    tree: &Path,
    catalog: &[Post],
    categories: &CategoryMap,
    template: &Template,
    site: &SiteConfig,
) -> Result<RunSummary, SyncError> {
    // Scan before writing anything: pass 2 must only operate on pages that
    // existed when the run started.
    let existing = scan_tree(tree, categories)?;

    let (plan, skipped) = plan_pages(catalog, categories);
    let index: BTreeMap<&str, &str> = plan
        .iter()
        .map(|p| (p.post.slug.as_str(), p.segment))
        .collect();

    let mut summary = RunSummary {
        skipped,
        ..RunSummary::default()
    };

    // Pass 1: materialize the desired state. Posts are independent.
    let posts_dir = tree.join(&site.posts_dir);
    let actions: Vec<PageActions> = plan
        .par_iter()
        .map(|page| materialize(tree, &posts_dir, page, template, site))
        .collect::<Result<_, SyncError>>()?;

    for action in &actions {
        tally(&mut summary, action);
    }

    // Pass 2: every pre-existing page that is not a current location is an
    // orphan or a stale page.
    for page in &existing {
        match index.get(page.slug.as_str()) {
            Some(current) if *current == page.segment => {}
            Some(current) => reconcile_stale(page, current, &mut summary)?,
            None => remove_orphan(tree, page, &mut summary)?,
        }
    }

    Ok(summary)
}

/// Resolve every post's category, splitting the catalog into pages to
/// materialize and posts to skip.
fn plan_pages<'a>(
    catalog: &'a [Post],
    categories: &'a CategoryMap,
) -> (Vec<PlannedPage<'a>>, Vec<SkippedPost>) {
    let mut plan = Vec::with_capacity(catalog.len());
    let mut skipped = Vec::new();

    for post in catalog {
        let Some(segment) = categories.resolve(&post.category) else {
            skipped.push(SkippedPost {
                slug: post.slug.clone(),
                label: post.category.clone(),
            });
            continue;
        };
        let previous_segment = post
            .previous_category
            .as_deref()
            .and_then(|label| categories.resolve(label))
            .filter(|previous| *previous != segment);
        plan.push(PlannedPage {
            post,
            segment,
            previous_segment,
        });
    }

    (plan, skipped)
}

/// Find every `<segment>/<slug>/index.html` under the managed tree. Only
/// directories named by a known category segment are visible; anything else
/// at the site root (assets, posts, unknown segments) is out of scope.
fn scan_tree(tree: &Path, categories: &CategoryMap) -> Result<Vec<ExistingPage>, SyncError> {
    let mut pages = Vec::new();
    for entry in WalkDir::new(tree).min_depth(3).max_depth(3) {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() != "index.html" {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(tree) else {
            continue;
        };
        let mut components = rel.components();
        let (Some(segment), Some(slug)) = (components.next(), components.next()) else {
            continue;
        };
        let segment = segment.as_os_str().to_string_lossy().into_owned();
        let slug = slug.as_os_str().to_string_lossy().into_owned();
        if !categories.contains_segment(&segment) {
            continue;
        }
        pages.push(ExistingPage {
            segment,
            slug,
            path: entry.path().to_owned(),
        });
    }
    Ok(pages)
}

/// Pass 1 body for one post: render the content page at the current
/// location and, when the post moved categories, a redirect at the old one.
fn materialize(
    tree: &Path,
    posts_dir: &Path,
    page: &PlannedPage,
    template: &Template,
    site: &SiteConfig,
) -> Result<PageActions, SyncError> {
    let article = read_article(posts_dir, &page.post.slug)?;
    let html = render::render_content_page(template, page.post, page.segment, article.as_deref(), site);

    let dir = tree.join(page.segment).join(&page.post.slug);
    fs::create_dir_all(&dir)?;
    let content = write_if_changed(&dir.join("index.html"), html.as_bytes())?;

    let redirect = match page.previous_segment {
        Some(previous) => {
            let dir = tree.join(previous).join(&page.post.slug);
            fs::create_dir_all(&dir)?;
            let html = render::render_redirect_page(page.segment, &page.post.slug);
            Some(write_if_changed(&dir.join("index.html"), html.as_bytes())?)
        }
        None => None,
    };

    Ok(PageActions { content, redirect })
}

/// Pass 2 body for a page sitting at a segment that no longer matches its
/// post's category: leave it when it already redirects to the right place,
/// otherwise overwrite it with a fresh redirect. Covers renames the
/// materialization pass knows nothing about (multi-hop renames, hand-edited
/// catalogs).
fn reconcile_stale(
    page: &ExistingPage,
    current_segment: &str,
    summary: &mut RunSummary,
) -> Result<(), SyncError> {
    let on_disk = fs::read_to_string(&page.path)?;
    let desired_target = format!("/{}/{}/", current_segment, page.slug);
    if render::redirect_target(&on_disk) == Some(desired_target.as_str()) {
        return Ok(());
    }
    let html = render::render_redirect_page(current_segment, &page.slug);
    fs::write(&page.path, html)?;
    summary.stale_converted += 1;
    Ok(())
}

/// Pass 2 body for a page whose slug left the catalog: delete it and prune
/// parent directories that became empty.
fn remove_orphan(
    tree: &Path,
    page: &ExistingPage,
    summary: &mut RunSummary,
) -> Result<(), SyncError> {
    fs::remove_file(&page.path)?;
    if let Some(dir) = page.path.parent() {
        prune_empty_dirs(dir, tree)?;
    }
    summary.orphans_removed += 1;
    Ok(())
}

/// Remove `start` and its ancestors while they are empty, stopping at the
/// managed root. Paths are compared canonicalized so the bound cannot be
/// fooled by trailing separators or symlinked spellings of the root.
fn prune_empty_dirs(start: &Path, root: &Path) -> io::Result<()> {
    let root = root.canonicalize()?;
    let mut dir = start.to_path_buf();
    loop {
        let canonical = dir.canonicalize()?;
        if canonical == root || !canonical.starts_with(&root) {
            break;
        }
        if fs::read_dir(&dir)?.next().is_some() {
            break;
        }
        fs::remove_dir(&dir)?;
        let Some(parent) = dir.parent() else { break };
        dir = parent.to_path_buf();
    }
    Ok(())
}

/// Write only when the bytes differ from what is on disk, reporting which
/// case applied. Keeps re-runs write-free without giving up re-rendering.
fn write_if_changed(path: &Path, bytes: &[u8]) -> io::Result<WriteOutcome> {
    match fs::read(path) {
        Ok(existing) if existing == bytes => Ok(WriteOutcome::Unchanged),
        Ok(_) => {
            fs::write(path, bytes)?;
            Ok(WriteOutcome::Updated)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::write(path, bytes)?;
            Ok(WriteOutcome::Created)
        }
        Err(e) => Err(e),
    }
}

/// The post's markdown body, when one exists. Absence is normal — the live
/// article view fetches markdown client-side anyway.
fn read_article(posts_dir: &Path, slug: &str) -> io::Result<Option<String>> {
    match fs::read_to_string(posts_dir.join(format!("{slug}.md"))) {
        Ok(markdown) => Ok(Some(markdown)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn tally(summary: &mut RunSummary, actions: &PageActions) {
    match actions.content {
        WriteOutcome::Created => summary.pages_created += 1,
        WriteOutcome::Updated => summary.pages_updated += 1,
        WriteOutcome::Unchanged => summary.pages_unchanged += 1,
    }
    match actions.redirect {
        Some(WriteOutcome::Created) => summary.redirects_created += 1,
        Some(WriteOutcome::Updated) => summary.redirects_updated += 1,
        Some(WriteOutcome::Unchanged) => summary.redirects_unchanged += 1,
        None => {}
    }
}
