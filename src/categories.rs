//! Category label → URL segment resolution.
//!
//! The blog's catalog stores human-readable category labels (often CJK text,
//! e.g. `技術開發`); generated permalink URLs use ASCII segments
//! (`tech-development`). The mapping lives in `config/categories.json`, owned
//! by the site author:
//!
//! ```json
//! {
//!   "categoryMapping": {
//!     "AI 分析": "ai-analysis",
//!     "技術開發": "tech-development",
//!     "技術分析": "tech-analysis"
//!   }
//! }
//! ```
//!
//! The table is loaded once per run and passed explicitly into whatever needs
//! it — there is no lazily-initialized global. A missing or malformed table is
//! fatal; an individual label absent from the table is not (callers warn and
//! skip the post).
//!
//! The table also defines which top-level directories of the site are
//! *managed*: the page reconciler only scans directories named by a known
//! segment, so a directory under an unknown segment is invisible to it.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CategoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Category table validation error: {0}")]
    Validation(String),
}

/// On-disk shape of `config/categories.json`.
#[derive(Debug, Deserialize)]
struct CategoryFile {
    #[serde(rename = "categoryMapping")]
    category_mapping: BTreeMap<String, String>,
}

/// The label → segment table, validated.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    mapping: BTreeMap<String, String>,
}

impl CategoryMap {
    /// Load and validate the table. Absence or malformed JSON is fatal.
    pub fn load(path: &Path) -> Result<Self, CategoryError> {
        let content = fs::read_to_string(path)?;
        let file: CategoryFile = serde_json::from_str(&content)?;
        Self::from_mapping(file.category_mapping)
    }

    /// Build a table from `(label, segment)` pairs. Used by tests and by
    /// callers that already hold the mapping.
    pub fn from_pairs<L, S>(pairs: impl IntoIterator<Item = (L, S)>) -> Result<Self, CategoryError>
    where
        L: Into<String>,
        S: Into<String>,
    {
        Self::from_mapping(
            pairs
                .into_iter()
                .map(|(l, s)| (l.into(), s.into()))
                .collect(),
        )
    }

    fn from_mapping(mapping: BTreeMap<String, String>) -> Result<Self, CategoryError> {
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for (label, segment) in &mapping {
            if segment.is_empty() {
                return Err(CategoryError::Validation(format!(
                    "category \"{label}\" maps to an empty segment"
                )));
            }
            if segment.contains('/') || segment.contains('\\') {
                return Err(CategoryError::Validation(format!(
                    "segment \"{segment}\" (category \"{label}\") contains a path separator"
                )));
            }
            if segment.starts_with('.') {
                return Err(CategoryError::Validation(format!(
                    "segment \"{segment}\" (category \"{label}\") must not start with '.'"
                )));
            }
            // Two labels sharing a segment would make disk-scan attribution
            // ambiguous during reconciliation.
            if let Some(other) = seen.insert(segment, label) {
                return Err(CategoryError::Validation(format!(
                    "segment \"{segment}\" is mapped by both \"{other}\" and \"{label}\""
                )));
            }
        }
        Ok(CategoryMap { mapping })
    }

    /// Resolve a category label to its URL segment.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.mapping.get(label).map(String::as_str)
    }

    /// All known segments, in stable (label-sorted) order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.mapping.values().map(String::as_str)
    }

    /// Whether a directory name is one of the managed category segments.
    pub fn contains_segment(&self, segment: &str) -> bool {
        self.mapping.values().any(|s| s == segment)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn resolves_known_label() {
        let map = CategoryMap::from_pairs([("技術開發", "tech-development")]).unwrap();
        assert_eq!(map.resolve("技術開發"), Some("tech-development"));
    }

    #[test]
    fn unknown_label_is_none() {
        let map = CategoryMap::from_pairs([("技術開發", "tech-development")]).unwrap();
        assert_eq!(map.resolve("不存在的分類"), None);
    }

    #[test]
    fn loads_from_json_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("categories.json");
        fs::write(
            &path,
            r#"{"categoryMapping":{"AI 分析":"ai-analysis","技術分析":"tech-analysis"}}"#,
        )
        .unwrap();

        let map = CategoryMap::load(&path).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("AI 分析"), Some("ai-analysis"));
    }

    #[test]
    fn missing_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = CategoryMap::load(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(CategoryError::Io(_))));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("categories.json");
        fs::write(&path, "not json at all").unwrap();
        assert!(matches!(CategoryMap::load(&path), Err(CategoryError::Json(_))));
    }

    #[test]
    fn duplicate_segment_rejected() {
        let result = CategoryMap::from_pairs([("甲", "shared"), ("乙", "shared")]);
        match result {
            Err(CategoryError::Validation(msg)) => {
                assert!(msg.contains("shared"));
                assert!(msg.contains("甲"));
                assert!(msg.contains("乙"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn segment_with_slash_rejected() {
        let result = CategoryMap::from_pairs([("壞", "a/b")]);
        assert!(matches!(result, Err(CategoryError::Validation(_))));
    }

    #[test]
    fn empty_segment_rejected() {
        let result = CategoryMap::from_pairs([("壞", "")]);
        assert!(matches!(result, Err(CategoryError::Validation(_))));
    }

    #[test]
    fn dot_prefixed_segment_rejected() {
        let result = CategoryMap::from_pairs([("壞", ".hidden")]);
        assert!(matches!(result, Err(CategoryError::Validation(_))));
    }

    #[test]
    fn segments_enumerates_all() {
        let map = CategoryMap::from_pairs([("a", "seg-a"), ("b", "seg-b")]).unwrap();
        let segments: Vec<&str> = map.segments().collect();
        assert_eq!(segments, vec!["seg-a", "seg-b"]);
        assert!(map.contains_segment("seg-a"));
        assert!(!map.contains_segment("seg-c"));
    }
}
