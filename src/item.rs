use std::{
    cmp::Ordering,
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::text_util;

/// The text of an [`Item`] in two forms.
///
/// `display` is what the user sees, `search` is what the scorer compares
/// against. Both are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    display: String,
    search: String,
}

impl Term {
    /// A term whose search text is the display text itself.
    pub fn verbatim(text: impl Into<String>) -> Self {
        let display = text.into();
        Self {
            search: display.clone(),
            display,
        }
    }

    /// A term whose search text was derived (e.g. segmented) from the
    /// display text.
    pub fn derived(
        display: impl Into<String>,
        search: impl Into<String>,
    ) -> Self {
        Self {
            display: display.into(),
            search: search.into(),
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn search(&self) -> &str {
        &self.search
    }
}

/// One searchable unit extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    path: Option<PathBuf>,
    category: String,
    term: Term,
}

impl Item {
    pub fn new(
        path: Option<PathBuf>,
        category: impl Into<String>,
        term: Term,
    ) -> Self {
        Self {
            path,
            category: category.into(),
            term,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn term(&self) -> &Term {
        &self.term
    }
}

/// An [`Item`] that cleared the score threshold.
///
/// Equality and ordering look at the score only.
#[derive(Debug, Clone)]
pub struct Match {
    pub score: u8,
    pub item: Item,
}

impl Match {
    pub fn new(score: u8, item: Item) -> Self {
        Self { score, item }
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl Eq for Match {}

impl PartialOrd for Match {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Match {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

/// Width used when laying out a rendered match.
pub const RENDER_WIDTH: usize = 80;

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (file, dir) = match self.item.path() {
            Some(path) => (
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path.parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            None => ("None".to_string(), "None".to_string()),
        };
        let header_room = RENDER_WIDTH.saturating_sub(" • : ".len() + 16);

        writeln!(
            f,
            " • {}: (score = {})",
            text_util::shorten(&file, header_room),
            self.score
        )?;
        writeln!(f, "\tFound in {}, directory: {dir}:", self.item.category())?;
        write!(
            f,
            "\t\"{}\"",
            text_util::shorten(self.item.term().display(), RENDER_WIDTH - 10)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(display: &str) -> Item {
        Item::new(
            Some(PathBuf::from("/docs/paper.pdf")),
            "Filename",
            Term::verbatim(display),
        )
    }

    #[test]
    fn verbatim_term_searches_display_text() {
        let term = Term::verbatim("ipsum dolor");
        assert_eq!(term.display(), "ipsum dolor");
        assert_eq!(term.search(), "ipsum dolor");
    }

    #[test]
    fn derived_term_keeps_both_forms() {
        let term = Term::derived("foo_bar", "foo bar");
        assert_eq!(term.display(), "foo_bar");
        assert_eq!(term.search(), "foo bar");
    }

    #[test]
    fn matches_compare_by_score_only() {
        let a = Match::new(80, item("first"));
        let b = Match::new(80, item("second"));
        let c = Match::new(95, item("first"));

        assert_eq!(a, b);
        assert!(c > a);
    }

    #[test]
    fn display_mentions_file_category_and_text() {
        let rendered = Match::new(100, item("paper.pdf")).to_string();

        assert!(rendered.contains(" • paper.pdf: (score = 100)"));
        assert!(rendered.contains("Found in Filename, directory: /docs:"));
        assert!(rendered.contains("\"paper.pdf\""));
    }

    #[test]
    fn display_without_path() {
        let synthetic = Item::new(None, "Metadata", Term::verbatim("x"));
        let rendered = Match::new(70, synthetic).to_string();
        assert!(rendered.contains(" • None: (score = 70)"));
    }

    #[test]
    fn items_roundtrip_through_json() {
        let original = vec![item("a"), item("b")];
        let json = serde_json::to_string(&original).unwrap();
        let restored: Vec<Item> = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}
