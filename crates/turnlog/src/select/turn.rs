//! Turn pre-filter for structured (CSV) session logs.
//!
//! Session CSVs carry the turn identifier in one column. When a
//! [`TurnFilter`] is set, only rows whose identifier is in the target set
//! survive; the header row (row 0 of each source) always survives. Rows whose
//! turn field is missing, not a number, or zero are treated as having no turn
//! and are dropped quietly while a filter is active. Turns count from 1.

use super::Line;
use crate::error::{Error, Result};
use crate::events::{DecisionEvent, DecisionObserver};
use crate::source::records::parse_record;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Header names recognized as the turn column, compared case-insensitively.
pub const TURN_COLUMN_NAMES: [&str; 3] = ["turn", "turnid", "turn_id"];

// ── TurnFilter ─────────────────────────────────────────────────────

/// Set of turn identifiers to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnFilter {
    targets: BTreeSet<u32>,
}

impl TurnFilter {
    /// Inclusive range `start..=end`. Fails when `start > end` or on turn 0.
    pub fn range(start: u32, end: u32) -> Result<Self> {
        if start == 0 {
            return Err(Error::InvalidConfig("turns count from 1, not 0".into()));
        }
        if start > end {
            return Err(Error::InvalidConfig(format!(
                "turn range start {start} is after end {end}"
            )));
        }
        Ok(Self {
            targets: (start..=end).collect(),
        })
    }

    pub fn from_turns(turns: impl IntoIterator<Item = u32>) -> Self {
        Self {
            targets: turns.into_iter().collect(),
        }
    }

    pub fn contains(&self, turn: u32) -> bool {
        self.targets.contains(&turn)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targeted turns in ascending order.
    pub fn turns(&self) -> impl Iterator<Item = u32> + '_ {
        self.targets.iter().copied()
    }

    /// Smallest and largest targeted turn.
    pub fn bounds(&self) -> Option<(u32, u32)> {
        Some((*self.targets.first()?, *self.targets.last()?))
    }
}

impl FromStr for TurnFilter {
    type Err = Error;

    /// Parses `"5-7"`, `"3"`, or comma lists such as `"1,4,6-8"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            Error::InvalidConfig(format!(
                "invalid turn range '{s}': expected START-END, a turn number, or a comma list"
            ))
        };
        let mut targets = BTreeSet::new();
        for part in s.split(',').map(str::trim) {
            if part.is_empty() {
                return Err(invalid());
            }
            match part.split_once('-') {
                Some((start, end)) => {
                    let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                    let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                    targets.extend(TurnFilter::range(start, end)?.targets);
                }
                None => {
                    let turn: u32 = part.parse().map_err(|_| invalid())?;
                    targets.extend(TurnFilter::range(turn, turn)?.targets);
                }
            }
        }
        Ok(Self { targets })
    }
}

impl fmt::Display for TurnFilter {
    /// Compact form: consecutive runs collapse to `start-end`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        for &turn in &self.targets {
            match runs.last_mut() {
                Some((_, end)) if end.checked_add(1) == Some(turn) => *end = turn,
                _ => runs.push((turn, turn)),
            }
        }
        let parts: Vec<String> = runs
            .iter()
            .map(|&(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{start}-{end}")
                }
            })
            .collect();
        f.write_str(&parts.join(","))
    }
}

// ── Turn column ────────────────────────────────────────────────────

/// Where to find the turn identifier in a CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnColumn {
    /// Zero-based field index.
    Index(usize),
    /// Header name, matched case-insensitively.
    Name(String),
}

impl FromStr for TurnColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidConfig("empty turn column".into()));
        }
        Ok(match s.parse::<usize>() {
            Ok(index) => TurnColumn::Index(index),
            Err(_) => TurnColumn::Name(s.to_string()),
        })
    }
}

/// Why a row has no usable turn identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MalformedField {
    /// The row has fewer fields than the turn column needs.
    TooFewFields { found: usize, column: usize },
    /// The turn field is not a positive integer.
    NotNumeric { value: String },
    /// The source header does not name the requested turn column.
    NoColumn,
}

impl fmt::Display for MalformedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedField::TooFewFields { found, column } => {
                write!(f, "{found} field(s), turn column is {column}")
            }
            MalformedField::NotNumeric { value } => {
                write!(f, "turn field '{value}' is not a positive integer")
            }
            MalformedField::NoColumn => f.write_str("no turn column in header"),
        }
    }
}

/// Extract the turn identifier from field `column` of a CSV record.
pub fn turn_field(row: &str, column: usize) -> std::result::Result<u32, MalformedField> {
    let record = parse_record(row);
    let raw = record.get(column).ok_or(MalformedField::TooFewFields {
        found: record.len(),
        column,
    })?;
    let raw = raw.trim();
    match raw.parse::<u32>() {
        Ok(turn) if turn > 0 => Ok(turn),
        _ => Err(MalformedField::NotNumeric {
            value: raw.to_string(),
        }),
    }
}

/// Resolve the turn column index from a header row.
///
/// Without an explicit column, the first header named like
/// [`TURN_COLUMN_NAMES`] wins, falling back to column 0.
pub fn resolve_column(header: &str, wanted: Option<&TurnColumn>) -> Option<usize> {
    let record = parse_record(header);
    let position = |name: &str| {
        record
            .iter()
            .position(|field| field.trim().eq_ignore_ascii_case(name))
    };
    match wanted {
        Some(TurnColumn::Index(index)) => Some(*index),
        Some(TurnColumn::Name(name)) => position(name.as_str()),
        None => Some(TURN_COLUMN_NAMES.iter().find_map(|n| position(*n)).unwrap_or(0)),
    }
}

// ── Pre-filter ─────────────────────────────────────────────────────

/// Counters for rows seen by a [`TurnPrefilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrefilterStats {
    /// Rows handed on to selection (headers included).
    pub passed: usize,
    /// Header rows retained unconditionally.
    pub headers: usize,
    /// Rows with a valid turn outside the target set.
    pub excluded: usize,
    /// Rows without a usable turn identifier.
    pub malformed: usize,
}

/// Applies a [`TurnFilter`] to the rows of structured sources, one line at a
/// time.
#[derive(Debug, Clone, Default)]
pub struct TurnPrefilter {
    filter: Option<TurnFilter>,
    column: Option<TurnColumn>,
    /// Source ordinal and resolved turn column of the last header seen.
    current: Option<(usize, Option<usize>)>,
    stats: PrefilterStats,
}

impl TurnPrefilter {
    /// `None` means "all turns": every row passes.
    pub fn new(filter: Option<TurnFilter>) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Pin the turn column instead of detecting it from the header.
    pub fn with_column(mut self, column: Option<TurnColumn>) -> Self {
        self.column = column;
        self
    }

    pub fn is_active(&self) -> bool {
        self.filter.is_some()
    }

    pub fn stats(&self) -> PrefilterStats {
        self.stats
    }

    /// Decide whether a row of a structured source reaches selection.
    pub fn admit(&mut self, line: &Line, observer: &dyn DecisionObserver) -> bool {
        if self.filter.is_none() {
            self.stats.passed += 1;
            return true;
        }

        if line.row == 0 {
            let column = resolve_column(&line.text, self.column.as_ref());
            if column.is_none() {
                warn!(
                    "Source #{} header has no turn column {:?}; its rows will be dropped",
                    line.source, self.column
                );
            }
            self.current = Some((line.source, column));
            self.stats.headers += 1;
            self.stats.passed += 1;
            observer.on_event(&DecisionEvent::HeaderRetained {
                index: line.index,
                source: line.source,
            });
            return true;
        }

        let column = match self.current {
            Some((source, column)) if source == line.source => column,
            // Source seen without its header row: only an explicit index applies.
            _ => match &self.column {
                Some(TurnColumn::Index(index)) => Some(*index),
                Some(TurnColumn::Name(_)) => None,
                None => Some(0),
            },
        };

        let outcome = match column {
            Some(column) => turn_field(&line.text, column),
            None => Err(MalformedField::NoColumn),
        };

        match outcome {
            Ok(turn) if self.filter.as_ref().is_some_and(|f| f.contains(turn)) => {
                self.stats.passed += 1;
                true
            }
            Ok(turn) => {
                self.stats.excluded += 1;
                observer.on_event(&DecisionEvent::TurnExcluded {
                    index: line.index,
                    turn,
                });
                false
            }
            Err(reason) => {
                self.stats.malformed += 1;
                observer.on_event(&DecisionEvent::TurnFieldMalformed {
                    index: line.index,
                    reason: &reason,
                });
                false
            }
        }
    }
}
