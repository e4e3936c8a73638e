//! Convenience re-exports for common `turnlog` types.
//!
//! ```ignore
//! use turnlog::prelude::*;
//! ```
//!
//! Covers configuring and running a summary. Input discovery and output
//! rendering live in [`crate::source`] and [`crate::output`].

// ── Engine ──────────────────────────────────────────────────────────
pub use crate::config::SummaryConfig;
pub use crate::summarize::{RunStats, Summarizer};
pub use crate::{Error, Result};

// ── Selection ───────────────────────────────────────────────────────
pub use crate::select::{
    Category, Classifier, Depth, KeywordSelector, Line, Preset, PresetRegistry, PresetSelector,
    SelectionPolicy, TurnColumn, TurnFilter,
};

// ── Windowing ───────────────────────────────────────────────────────
pub use crate::window::{
    ContextDefaultsTable, ContextPolicy, EmittedLine, LineSink, Role, TableName, WindowStats,
    Windower,
};

// ── Observers and sources ───────────────────────────────────────────
pub use crate::events::{
    CompositeObserver, DebugTrace, DecisionEvent, DecisionObserver, LoggingObserver, NoopObserver,
};
pub use crate::source::SourceText;
