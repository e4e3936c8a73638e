//! Line selection: decides which lines of a session log are worth keeping.
//!
//! Every line is classified exactly once into a [`Category`]. Three sources
//! of selection exist:
//!
//! 1. **[`keywords`]**: a severity depth (`critical`, `high`, `medium`)
//!    mapped to fixed keyword sets plus user keywords at `medium`.
//! 2. **[`preset`]**: named whitelist/blacklist bundles focused on one
//!    gameplay subsystem, with a hard critical override.
//! 3. **[`turn`]**: a structured pre-filter over the turn column of CSV
//!    session logs. It runs before classification and removes rows outright
//!    rather than assigning a category.
//!
//! Classification is case-insensitive substring containment on the line
//! text. It never looks at neighbouring lines; deciding what to keep around
//! a match is the job of [`crate::window`].

pub mod keywords;
pub mod preset;
pub mod turn;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use keywords::{Depth, KeywordSelector};
pub use preset::{Preset, PresetRegistry, PresetSelector};
pub use turn::{TurnColumn, TurnFilter, TurnPrefilter};

// ── Lines ──────────────────────────────────────────────────────────

/// One input line with a stable identity.
///
/// `source` and `row` locate the line in its file; `index` is its position
/// in the concatenated input sequence and must be strictly increasing across
/// a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Position in the concatenated input sequence.
    pub index: usize,
    /// Ordinal of the source file the line came from.
    pub source: usize,
    /// Zero-based row within its source. Row 0 of a CSV source is the header.
    pub row: usize,
    /// Line text without its terminator.
    pub text: String,
}

impl Line {
    /// A line from a single anonymous source, where `row == index`.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            source: 0,
            row: index,
            text: text.into(),
        }
    }

    /// Number a sequence of texts as lines of one source.
    pub fn numbered<I, T>(texts: I) -> Vec<Line>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Line::new(i, text))
            .collect()
    }
}

// ── Categories ─────────────────────────────────────────────────────

/// Why a line was selected, or `Noise` when it was not.
///
/// The category drives how much context the windower keeps around a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Critical,
    High,
    Custom,
    Noise,
}

impl Category {
    pub fn is_match(self) -> bool {
        self != Category::Noise
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Critical => "critical",
            Category::High => "high",
            Category::Custom => "custom",
            Category::Noise => "noise",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line paired with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub line: Line,
    pub category: Category,
}

// ── Classifier seam ────────────────────────────────────────────────

/// Anything that can classify a line from its text alone.
///
/// Implemented by the keyword and preset selectors and by
/// [`SelectionPolicy`]. Closures work too, which keeps windowing tests free
/// of keyword tables.
pub trait Classifier {
    fn classify(&self, text: &str) -> Category;

    /// Classify a line and keep it alongside the result.
    fn record(&self, line: Line) -> MatchRecord {
        let category = self.classify(&line.text);
        MatchRecord { line, category }
    }
}

impl<F> Classifier for F
where
    F: Fn(&str) -> Category,
{
    fn classify(&self, text: &str) -> Category {
        self(text)
    }
}

/// Returns `true` when `haystack` contains any of `needles`.
///
/// Both sides must already be lower-cased.
pub(crate) fn contains_any<S: AsRef<str>>(haystack: &str, needles: &[S]) -> bool {
    needles
        .iter()
        .any(|needle| haystack.contains(needle.as_ref()))
}

// ── Selection policy ───────────────────────────────────────────────

/// The fully resolved text selection policy for a run.
///
/// Turn filtering is not a variant here: it is a pre-filter applied by
/// [`TurnPrefilter`] before any line reaches the classifier.
#[derive(Debug, Clone)]
pub enum SelectionPolicy {
    KeywordDepth(KeywordSelector),
    Preset(PresetSelector),
}

impl SelectionPolicy {
    /// Short human-readable description for logs and reports.
    pub fn describe(&self) -> String {
        match self {
            SelectionPolicy::KeywordDepth(sel) => {
                format!("depth={} keywords=[{}]", sel.depth(), sel.keywords().join(", "))
            }
            SelectionPolicy::Preset(sel) => format!("preset={}", sel.preset().name),
        }
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::KeywordDepth(KeywordSelector::new(Depth::default()))
    }
}

impl Classifier for SelectionPolicy {
    fn classify(&self, text: &str) -> Category {
        match self {
            SelectionPolicy::KeywordDepth(sel) => sel.classify(text),
            SelectionPolicy::Preset(sel) => sel.classify(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_lines_share_one_source() {
        let lines = Line::numbered(["a", "b", "c"]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].index, 2);
        assert_eq!(lines[2].row, 2);
        assert!(lines.iter().all(|l| l.source == 0));
    }

    #[test]
    fn closures_are_classifiers() {
        let classifier = |text: &str| {
            if text.starts_with('!') {
                Category::Critical
            } else {
                Category::Noise
            }
        };
        let record = classifier.record(Line::new(4, "!boom"));
        assert_eq!(record.category, Category::Critical);
        assert_eq!(record.line.index, 4);
        assert_eq!(classifier.classify("quiet"), Category::Noise);
    }

    #[test]
    fn only_noise_is_not_a_match() {
        assert!(Category::Critical.is_match());
        assert!(Category::High.is_match());
        assert!(Category::Custom.is_match());
        assert!(!Category::Noise.is_match());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn default_policy_is_medium_depth() {
        let policy = SelectionPolicy::default();
        assert!(policy.describe().starts_with("depth=medium"));
        assert_eq!(policy.classify("Warning: slow frame"), Category::High);
    }
}
