use chrono::Utc;
use clap::{Parser, Subcommand};
use permapress::{catalog, categories, config, feed, output, reconcile, render, sitemap};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "permapress")]
#[command(about = "Permalink page builder for a catalog-driven blog")]
#[command(long_about = "\
Permalink page builder for a catalog-driven blog

data/posts.json is the source of truth. Every post gets a static page at
/<category-segment>/<slug>/, with redirects left behind when posts move
between categories, plus a sitemap and a JSON Feed kept in line with the
catalog.

Site layout:

  site/
  ├── site.toml                    # Optional config (defaults cover everything)
  ├── data/posts.json              # The post catalog (hand-authored)
  ├── config/categories.json       # Category label → URL segment table
  ├── post.html                    # Article template, shared with the live view
  ├── posts/<slug>.md              # Optional static article bodies
  ├── tech-development/<slug>/     # Generated permalink pages (managed)
  ├── sitemap.xml                  # Generated
  └── feed.json                    # Reconciled in place

Only directories named in categories.json are managed: pages are created,
converted to redirects, and removed there, and nowhere else.")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile permalink pages and redirects with the catalog
    Sync,
    /// Regenerate sitemap.xml
    Sitemap,
    /// Reconcile feed.json with the catalog
    Feed,
    /// Run everything: sync → sitemap → feed
    Build,
    /// Validate the catalog and category table without writing anything
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let root = &cli.root;
    let site = config::load_config(root)?;
    site.validate()?;

    match cli.command {
        Command::Sync => {
            let inputs = Inputs::load(root, &site)?;
            let template = render::Template::load(&root.join(&site.template))?;
            let summary =
                reconcile::sync(root, &inputs.posts, &inputs.categories, &template, &site)?;
            output::print_sync_summary(&summary);
        }
        Command::Sitemap => {
            let inputs = Inputs::load(root, &site)?;
            write_sitemap(root, &inputs, &site)?;
        }
        Command::Feed => {
            let inputs = Inputs::load(root, &site)?;
            let report =
                feed::sync_feed(&root.join(&site.feed), &inputs.posts, &inputs.categories, &site)?;
            output::print_feed_report(&report);
        }
        Command::Build => {
            let inputs = Inputs::load(root, &site)?;
            let template = render::Template::load(&root.join(&site.template))?;

            println!("==> Stage 1: Syncing permalink pages");
            let summary =
                reconcile::sync(root, &inputs.posts, &inputs.categories, &template, &site)?;
            output::print_sync_summary(&summary);

            println!("==> Stage 2: Writing sitemap");
            write_sitemap(root, &inputs, &site)?;

            println!("==> Stage 3: Reconciling feed");
            let report =
                feed::sync_feed(&root.join(&site.feed), &inputs.posts, &inputs.categories, &site)?;
            output::print_feed_report(&report);

            println!("==> Build complete");
        }
        Command::Check => {
            println!("==> Checking {}", root.display());
            let inputs = Inputs::load(root, &site)?;
            // template validation is part of the check — a missing
            // placeholder should fail here, not mid-sync
            render::Template::load(&root.join(&site.template))?;
            output::print_check_output(&inputs.posts, &inputs.categories);
            println!("==> Catalog is valid");
        }
    }

    Ok(())
}

/// The two data files every command needs, loaded and validated.
struct Inputs {
    posts: Vec<catalog::Post>,
    categories: categories::CategoryMap,
}

impl Inputs {
    fn load(root: &Path, site: &config::SiteConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let posts = catalog::load_catalog(&root.join(&site.posts_json))?;
        let categories = categories::CategoryMap::load(&root.join(&site.categories_json))?;
        Ok(Inputs { posts, categories })
    }
}

fn write_sitemap(
    root: &Path,
    inputs: &Inputs,
    site: &config::SiteConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now().format("%Y-%m-%d").to_string();
    let (xml, warnings) = sitemap::generate(&inputs.posts, &inputs.categories, site, &now);
    let path = root.join(&site.sitemap);
    std::fs::write(&path, xml)?;
    let urls = inputs.posts.len() + 2 - warnings.len();
    println!("{} written ({} URLs)", site.sitemap, urls);
    for warning in warnings {
        println!("    {warning}");
    }
    Ok(())
}
