//! How many lines of context to keep around a match.
//!
//! A [`ContextPolicy`] is either explicit (one before/after pair for every
//! match) or defers to a [`ContextDefaultsTable`] keyed by category:
//!
//! | Table | critical | high | custom |
//! |-------|----------|------|--------|
//! | `keyword` | 5 / 2 | 1 / 1 | 0 / 0 |
//! | `preset` | 2 / 4 | 2 / 4 | 2 / 4 |

use crate::error::{Error, Result};
use crate::select::Category;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Lines kept before and after one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Window {
    pub before: usize,
    pub after: usize,
}

impl Window {
    pub const fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }
}

// ── Defaults tables ────────────────────────────────────────────────

/// Names of the built-in defaults tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    KeywordDepth,
    Preset,
}

impl TableName {
    pub fn as_str(self) -> &'static str {
        match self {
            TableName::KeywordDepth => "keyword",
            TableName::Preset => "preset",
        }
    }

    pub fn table(self) -> &'static ContextDefaultsTable {
        match self {
            TableName::KeywordDepth => &ContextDefaultsTable::KEYWORD_DEPTH,
            TableName::Preset => &ContextDefaultsTable::PRESET,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" | "keyword-depth" | "keyword_depth" => Ok(TableName::KeywordDepth),
            "preset" => Ok(TableName::Preset),
            other => Err(Error::InvalidConfig(format!(
                "unknown context table '{other}': expected 'keyword' or 'preset'"
            ))),
        }
    }
}

/// Per-category context windows used when the policy is not explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextDefaultsTable {
    pub name: TableName,
    pub critical: Window,
    pub high: Window,
    pub custom: Window,
}

impl ContextDefaultsTable {
    pub const KEYWORD_DEPTH: Self = Self {
        name: TableName::KeywordDepth,
        critical: Window::new(5, 2),
        high: Window::new(1, 1),
        custom: Window::new(0, 0),
    };

    pub const PRESET: Self = Self {
        name: TableName::Preset,
        critical: Window::new(2, 4),
        high: Window::new(2, 4),
        custom: Window::new(2, 4),
    };

    /// Window for a category. Noise never gets one.
    pub fn window_for(&self, category: Category) -> Window {
        match category {
            Category::Critical => self.critical,
            Category::High => self.high,
            Category::Custom => self.custom,
            Category::Noise => Window::default(),
        }
    }

    /// Largest before-count of any category.
    pub fn max_before(&self) -> usize {
        self.critical
            .before
            .max(self.high.before)
            .max(self.custom.before)
    }
}

// ── Context policy ─────────────────────────────────────────────────

/// Resolved context settings for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextPolicy {
    pub before: usize,
    pub after: usize,
    /// When false, `before`/`after` are ignored in favour of the table.
    pub explicit: bool,
}

impl ContextPolicy {
    /// The same window for every match, regardless of category.
    pub fn explicit(before: usize, after: usize) -> Self {
        Self {
            before,
            after,
            explicit: true,
        }
    }

    /// Per-category windows from the active defaults table.
    pub fn defaults() -> Self {
        Self {
            before: 0,
            after: 0,
            explicit: false,
        }
    }

    pub fn window_for(&self, table: &ContextDefaultsTable, category: Category) -> Window {
        if !category.is_match() {
            return Window::default();
        }
        if self.explicit {
            Window::new(self.before, self.after)
        } else {
            table.window_for(category)
        }
    }

    /// Capacity the look-back buffer needs under this policy.
    pub fn max_before(&self, table: &ContextDefaultsTable) -> usize {
        if self.explicit {
            self.before
        } else {
            table.max_before()
        }
    }

    pub fn describe(&self, table: &ContextDefaultsTable) -> String {
        if self.explicit {
            format!("context={}/{}", self.before, self.after)
        } else {
            format!("context=table:{}", table.name)
        }
    }
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}
