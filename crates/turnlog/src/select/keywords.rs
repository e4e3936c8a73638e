//! Keyword-depth selection.
//!
//! Depths nest: `critical ⊂ high ⊂ medium`. Tiers are checked from most to
//! least severe so a line carrying both `Error:` and a custom keyword is
//! reported as `critical`.

use super::{Category, Classifier, contains_any};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Keywords selected at every depth.
pub const CRITICAL_KEYWORDS: [&str; 3] = ["fatal:", "error:", "severe:"];

/// Keywords added at `high` and `medium`.
pub const WARNING_KEYWORDS: [&str; 1] = ["warning:"];

/// How deep into the severity ladder selection reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Depth {
    /// Only fatal, error and severe lines.
    Critical,
    /// Critical plus warnings.
    High,
    /// High plus user keywords.
    #[default]
    Medium,
}

impl Depth {
    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Critical => "critical",
            Depth::High => "high",
            Depth::Medium => "medium",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Depth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Depth::Critical),
            "high" => Ok(Depth::High),
            "medium" => Ok(Depth::Medium),
            other => Err(Error::InvalidConfig(format!(
                "unknown depth '{other}' (expected critical, high or medium)"
            ))),
        }
    }
}

/// Classifies lines by the keyword tiers active at a [`Depth`].
#[derive(Debug, Clone)]
pub struct KeywordSelector {
    depth: Depth,
    /// Lower-cased, de-duplicated user keywords.
    custom: Vec<String>,
}

impl KeywordSelector {
    pub fn new(depth: Depth) -> Self {
        Self {
            depth,
            custom: Vec::new(),
        }
    }

    /// Add user keywords (builder pattern).
    ///
    /// Keywords are stored lower-cased. They only take part in selection at
    /// [`Depth::Medium`]; at shallower depths they are kept but ignored.
    pub fn with_custom_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !self.custom.contains(&keyword) {
                self.custom.push(keyword);
            }
        }
        self
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn custom_keywords(&self) -> &[String] {
        &self.custom
    }

    /// Every keyword that can select a line at this depth, most severe first.
    pub fn keywords(&self) -> Vec<&str> {
        let mut all: Vec<&str> = CRITICAL_KEYWORDS.to_vec();
        if self.depth >= Depth::High {
            all.extend(WARNING_KEYWORDS);
        }
        if self.depth == Depth::Medium {
            all.extend(self.custom.iter().map(String::as_str));
        }
        all
    }
}

impl Classifier for KeywordSelector {
    fn classify(&self, text: &str) -> Category {
        let lower = text.to_lowercase();
        if contains_any(&lower, &CRITICAL_KEYWORDS) {
            Category::Critical
        } else if self.depth >= Depth::High && contains_any(&lower, &WARNING_KEYWORDS) {
            Category::High
        } else if self.depth == Depth::Medium && contains_any(&lower, &self.custom) {
            Category::Custom
        } else {
            Category::Noise
        }
    }
}
