//! Run configuration for the [`Summarizer`](crate::summarize::Summarizer).
//!
//! Defaults select at `medium` keyword depth with per-category context from
//! the keyword table and no turn filter. Override with builder methods:
//!
//! ```ignore
//! let config = SummaryConfig::default()
//!     .with_selection(SelectionPolicy::Preset(PresetSelector::new(movement)))
//!     .with_context(ContextPolicy::explicit(3, 3))
//!     .with_turn_filter(Some("5-7".parse()?));
//! ```

use crate::select::{SelectionPolicy, TurnColumn, TurnFilter};
use crate::window::{ContextDefaultsTable, ContextPolicy, TableName};

/// Everything the engine needs besides the input lines.
#[derive(Debug, Clone, Default)]
pub struct SummaryConfig {
    pub selection: SelectionPolicy,
    pub context: ContextPolicy,
    /// Defaults table override. `None` follows the selection policy.
    pub table: Option<TableName>,
    /// Turn pre-filter for structured sources. `None` keeps all turns.
    pub turn_filter: Option<TurnFilter>,
    /// Turn column override. `None` detects it from each header.
    pub turn_column: Option<TurnColumn>,
}

impl SummaryConfig {
    pub fn new(selection: SelectionPolicy) -> Self {
        Self {
            selection,
            ..Default::default()
        }
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_context(mut self, context: ContextPolicy) -> Self {
        self.context = context;
        self
    }

    pub fn with_table(mut self, table: Option<TableName>) -> Self {
        self.table = table;
        self
    }

    pub fn with_turn_filter(mut self, filter: Option<TurnFilter>) -> Self {
        self.turn_filter = filter;
        self
    }

    pub fn with_turn_column(mut self, column: Option<TurnColumn>) -> Self {
        self.turn_column = column;
        self
    }

    /// The defaults table in effect: the override, else the one matching the
    /// selection policy.
    pub fn resolved_table(&self) -> TableName {
        self.table.unwrap_or(match self.selection {
            SelectionPolicy::KeywordDepth(_) => TableName::KeywordDepth,
            SelectionPolicy::Preset(_) => TableName::Preset,
        })
    }

    pub fn defaults_table(&self) -> &'static ContextDefaultsTable {
        self.resolved_table().table()
    }

    /// One-line summary for logs and reports.
    pub fn describe(&self) -> String {
        let mut parts = vec![
            self.selection.describe(),
            self.context.describe(self.defaults_table()),
        ];
        if let Some(filter) = &self.turn_filter {
            parts.push(format!("turns={filter}"));
        }
        parts.join(" ")
    }
}
