//! CLI output formatting for every subcommand.
//!
//! Each report has a `format_*` function returning `Vec<String>` (pure, no
//! I/O, unit-testable) and a thin `print_*` wrapper that writes the lines to
//! stdout. Warnings always come last so they are the final thing on screen.

use crate::catalog::Post;
use crate::categories::CategoryMap;
use crate::feed::FeedReport;
use crate::reconcile::RunSummary;

/// Render the reconciliation run summary.
///
/// ```text
/// Pages
///     2 created, 1 updated, 40 unchanged
/// Redirects
///     1 created, 0 updated, 2 unchanged
/// Cleanup
///     1 stale page converted to a redirect
///     1 orphan removed
/// Warnings
///     unknown category "不存在的分類" — skipped "ghost-post"
/// ```
pub fn format_sync_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        "Pages".to_string(),
        format!(
            "    {} created, {} updated, {} unchanged",
            summary.pages_created, summary.pages_updated, summary.pages_unchanged
        ),
        "Redirects".to_string(),
        format!(
            "    {} created, {} updated, {} unchanged",
            summary.redirects_created, summary.redirects_updated, summary.redirects_unchanged
        ),
    ];

    if summary.stale_converted > 0 || summary.orphans_removed > 0 {
        lines.push("Cleanup".to_string());
        if summary.stale_converted > 0 {
            lines.push(format!(
                "    {} stale page{} converted to redirect{}",
                summary.stale_converted,
                plural(summary.stale_converted),
                plural(summary.stale_converted)
            ));
        }
        if summary.orphans_removed > 0 {
            lines.push(format!(
                "    {} orphan{} removed",
                summary.orphans_removed,
                plural(summary.orphans_removed)
            ));
        }
    }

    if !summary.skipped.is_empty() {
        lines.push("Warnings".to_string());
        for skip in &summary.skipped {
            lines.push(format!(
                "    unknown category \"{}\" — skipped \"{}\"",
                skip.label, skip.slug
            ));
        }
    }

    lines
}

pub fn print_sync_summary(summary: &RunSummary) {
    for line in format_sync_summary(summary) {
        println!("{line}");
    }
}

/// Render the `check` report: catalog and table stats plus any posts that
/// would be skipped by a sync.
pub fn format_check_output(posts: &[Post], categories: &CategoryMap) -> Vec<String> {
    let unresolved: Vec<&Post> = posts
        .iter()
        .filter(|post| categories.resolve(&post.category).is_none())
        .collect();

    let mut lines = vec![format!(
        "{} post{}, {} categor{} mapped",
        posts.len(),
        plural(posts.len()),
        categories.len(),
        if categories.len() == 1 { "y" } else { "ies" }
    )];

    if unresolved.is_empty() {
        lines.push("All categories resolve".to_string());
    } else {
        lines.push("Warnings".to_string());
        for post in unresolved {
            lines.push(format!(
                "    unknown category \"{}\" — \"{}\" would be skipped",
                post.category, post.slug
            ));
        }
    }

    lines
}

pub fn print_check_output(posts: &[Post], categories: &CategoryMap) {
    for line in format_check_output(posts, categories) {
        println!("{line}");
    }
}

/// Render the feed reconciliation report.
pub fn format_feed_report(report: &FeedReport) -> Vec<String> {
    if !report.wrote {
        return vec!["feed.json already up to date".to_string()];
    }
    vec![format!(
        "feed.json written: {} item{} added, {} URL{} updated",
        report.added,
        plural(report.added),
        report.urls_updated,
        plural(report.urls_updated)
    )]
}

pub fn print_feed_report(report: &FeedReport) {
    for line in format_feed_report(report) {
        println!("{line}");
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::SkippedPost;
    use crate::test_helpers::{categories, post};

    #[test]
    fn sync_summary_basic_counts() {
        let summary = RunSummary {
            pages_created: 2,
            pages_unchanged: 40,
            redirects_created: 1,
            ..RunSummary::default()
        };
        let lines = format_sync_summary(&summary);
        assert_eq!(lines[0], "Pages");
        assert!(lines[1].contains("2 created"));
        assert!(lines[1].contains("40 unchanged"));
        assert!(!lines.contains(&"Cleanup".to_string()));
        assert!(!lines.contains(&"Warnings".to_string()));
    }

    #[test]
    fn sync_summary_lists_warnings_last() {
        let summary = RunSummary {
            orphans_removed: 1,
            skipped: vec![SkippedPost {
                slug: "ghost".into(),
                label: "不存在的分類".into(),
            }],
            ..RunSummary::default()
        };
        let lines = format_sync_summary(&summary);
        let last = lines.last().unwrap();
        assert!(last.contains("不存在的分類"));
        assert!(last.contains("ghost"));
    }

    #[test]
    fn check_output_flags_unresolved() {
        let posts = vec![
            post("good", "Good", "技術分析"),
            post("bad", "Bad", "不存在的分類"),
        ];
        let lines = format_check_output(&posts, &categories());
        assert!(lines.iter().any(|l| l.contains("would be skipped")));
    }

    #[test]
    fn check_output_clean_catalog() {
        let posts = vec![post("good", "Good", "技術分析")];
        let lines = format_check_output(&posts, &categories());
        assert_eq!(lines[1], "All categories resolve");
    }

    #[test]
    fn feed_report_no_op() {
        let lines = format_feed_report(&FeedReport::default());
        assert_eq!(lines, vec!["feed.json already up to date".to_string()]);
    }

    #[test]
    fn feed_report_written() {
        let report = FeedReport {
            added: 2,
            urls_updated: 1,
            wrote: true,
        };
        let lines = format_feed_report(&report);
        assert!(lines[0].contains("2 items added"));
        assert!(lines[0].contains("1 URL updated"));
    }
}
