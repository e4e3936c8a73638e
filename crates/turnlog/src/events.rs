//! Decision events and observers.
//!
//! The engine never writes diagnostics itself. It reports each decision as a
//! [`DecisionEvent`] to a [`DecisionObserver`], and callers decide what to do
//! with it.
//!
//! | Observer | Use case |
//! |----------|----------|
//! | [`NoopObserver`] | Tests and plain runs |
//! | [`LoggingObserver`] | Per-line decisions via `tracing` |
//! | [`DebugTrace`] | Capture the first N decisions for a JSON trace file |
//! | [`CompositeObserver`] | Fan out to several observers in order |

use crate::error::{Error, Result};
use crate::select::Category;
use crate::select::turn::MalformedField;
use crate::window::WindowStats;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, trace};

// ── Events ─────────────────────────────────────────────────────────

/// One decision made while summarizing.
#[derive(Debug)]
pub enum DecisionEvent<'a> {
    /// Header row of a structured source passed the turn filter.
    HeaderRetained { index: usize, source: usize },
    /// Row carried a valid turn outside the target set.
    TurnExcluded { index: usize, turn: u32 },
    /// Row had no usable turn identifier and was dropped.
    TurnFieldMalformed {
        index: usize,
        reason: &'a MalformedField,
    },
    /// A line was classified (matches and noise alike).
    Classified {
        index: usize,
        category: Category,
        text: &'a str,
    },
    /// A match was emitted with `before` lines recalled from history and an
    /// after-window of `after` lines.
    Matched {
        index: usize,
        category: Category,
        before: usize,
        after: usize,
    },
    /// A line was emitted as trailing context without being classified.
    TrailingContext { index: usize, remaining: usize },
    /// Input exhausted.
    Finished { stats: &'a WindowStats },
}

impl DecisionEvent<'_> {
    /// Index of the line the event is about, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            DecisionEvent::HeaderRetained { index, .. }
            | DecisionEvent::TurnExcluded { index, .. }
            | DecisionEvent::TurnFieldMalformed { index, .. }
            | DecisionEvent::Classified { index, .. }
            | DecisionEvent::Matched { index, .. }
            | DecisionEvent::TrailingContext { index, .. } => Some(*index),
            DecisionEvent::Finished { .. } => None,
        }
    }
}

// ── Observer trait ─────────────────────────────────────────────────

/// Receives decision events. All methods default to doing nothing.
pub trait DecisionObserver: Send + Sync {
    fn on_event(&self, event: &DecisionEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopObserver;
impl DecisionObserver for NoopObserver {}

/// Forwards decisions to `tracing`. Per-line events log at `trace`, so they
/// cost nothing unless `-vv` or `TURNLOG_LOG=trace` is set.
pub struct LoggingObserver;

impl DecisionObserver for LoggingObserver {
    fn on_event(&self, event: &DecisionEvent<'_>) {
        match event {
            DecisionEvent::HeaderRetained { index, source } => {
                debug!("Line {index}: header of source #{source} retained");
            }
            DecisionEvent::TurnExcluded { index, turn } => {
                trace!("Line {index}: turn {turn} outside filter");
            }
            DecisionEvent::TurnFieldMalformed { index, reason } => {
                trace!("Line {index}: dropped, {reason}");
            }
            DecisionEvent::Classified {
                index,
                category,
                text,
            } => {
                let preview: String = text.chars().take(120).collect();
                trace!("Line {index}: {category} {preview}");
            }
            DecisionEvent::Matched {
                index,
                category,
                before,
                after,
            } => {
                debug!("Line {index}: {category} match, {before} before, {after} after");
            }
            DecisionEvent::TrailingContext { index, remaining } => {
                trace!("Line {index}: trailing context ({remaining} left)");
            }
            DecisionEvent::Finished { stats } => {
                info!(
                    "Windowing done: {} read, {} written, {} matches",
                    stats.lines_read,
                    stats.lines_written,
                    stats.matches.total()
                );
            }
        }
    }
}

/// Dispatches events to several observers in registration order.
#[derive(Default)]
pub struct CompositeObserver<'a> {
    observers: Vec<&'a dyn DecisionObserver>,
}

impl<'a> CompositeObserver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: &'a dyn DecisionObserver) -> Self {
        self.observers.push(observer);
        self
    }

    /// Add `observer` only when `condition` holds.
    pub fn with_if(self, condition: bool, observer: &'a dyn DecisionObserver) -> Self {
        if condition { self.with(observer) } else { self }
    }

    /// Add an observer from an `Option`. `None` is a no-op.
    pub fn with_opt(self, observer: Option<&'a dyn DecisionObserver>) -> Self {
        match observer {
            Some(o) => self.with(o),
            None => self,
        }
    }
}

impl DecisionObserver for CompositeObserver<'_> {
    fn on_event(&self, event: &DecisionEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

// ── Debug trace ────────────────────────────────────────────────────

/// Default number of decisions kept by [`DebugTrace`].
pub const DEFAULT_TRACE_LIMIT: usize = 200;

/// One recorded decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub index: usize,
    pub decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Default)]
struct TraceState {
    entries: Vec<TraceEntry>,
    dropped: usize,
}

/// Records the first `limit` per-line decisions.
#[derive(Debug)]
pub struct DebugTrace {
    limit: usize,
    state: Mutex<TraceState>,
}

#[derive(Serialize)]
struct TraceFile<'a> {
    limit: usize,
    recorded: usize,
    dropped: usize,
    entries: &'a [TraceEntry],
}

impl DebugTrace {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            state: Mutex::new(TraceState::default()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Snapshot of the recorded entries.
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.lock().entries.clone()
    }

    /// Decisions seen after the limit was reached.
    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }

    pub fn to_json(&self) -> Result<String> {
        let state = self.lock();
        let file = TraceFile {
            limit: self.limit,
            recorded: state.entries.len(),
            dropped: state.dropped,
            entries: &state.entries,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Write the trace as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(path, json).map_err(|e| Error::io(path, e))?;
        info!("Debug trace written to {}", path.display());
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TraceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DebugTrace {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_LIMIT)
    }
}

fn entry(index: usize, decision: &'static str) -> TraceEntry {
    TraceEntry {
        index,
        decision,
        category: None,
        turn: None,
        detail: None,
        text: None,
    }
}

impl DecisionObserver for DebugTrace {
    fn on_event(&self, event: &DecisionEvent<'_>) {
        let record = match event {
            DecisionEvent::HeaderRetained { index, source } => TraceEntry {
                detail: Some(format!("source #{source}")),
                ..entry(*index, "header")
            },
            DecisionEvent::TurnExcluded { index, turn } => TraceEntry {
                turn: Some(*turn),
                ..entry(*index, "turn_excluded")
            },
            DecisionEvent::TurnFieldMalformed { index, reason } => TraceEntry {
                detail: Some(reason.to_string()),
                ..entry(*index, "malformed")
            },
            DecisionEvent::Classified {
                index,
                category,
                text,
            } => TraceEntry {
                category: Some(*category),
                text: Some((*text).to_string()),
                ..entry(*index, "classified")
            },
            DecisionEvent::Matched {
                index,
                category,
                before,
                after,
            } => TraceEntry {
                category: Some(*category),
                detail: Some(format!("before={before} after={after}")),
                ..entry(*index, "matched")
            },
            DecisionEvent::TrailingContext { index, remaining } => TraceEntry {
                detail: Some(format!("remaining={remaining}")),
                ..entry(*index, "after_context")
            },
            DecisionEvent::Finished { .. } => return,
        };

        let mut state = self.lock();
        if state.entries.len() < self.limit {
            state.entries.push(record);
        } else {
            state.dropped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);
    impl DecisionObserver for Counter {
        fn on_event(&self, _: &DecisionEvent<'_>) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn classified(index: usize) -> DecisionEvent<'static> {
        DecisionEvent::Classified {
            index,
            category: Category::Noise,
            text: "LogTemp: tick",
        }
    }

    #[test]
    fn composite_dispatches_to_all() {
        let a = Counter(AtomicUsize::new(0));
        let b = Counter(AtomicUsize::new(0));
        let composite = CompositeObserver::new()
            .with(&a)
            .with_if(false, &NoopObserver)
            .with_opt(Some(&b as &dyn DecisionObserver));
        composite.on_event(&classified(0));
        composite.on_event(&classified(1));
        assert_eq!(a.0.load(Ordering::Relaxed), 2);
        assert_eq!(b.0.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn debug_trace_stops_at_limit() {
        let trace = DebugTrace::new(2);
        for i in 0..5 {
            trace.on_event(&classified(i));
        }
        assert_eq!(trace.entries().len(), 2);
        assert_eq!(trace.dropped(), 3);
        assert_eq!(trace.entries()[1].index, 1);
    }

    #[test]
    fn debug_trace_json_shape() {
        let trace = DebugTrace::default();
        trace.on_event(&DecisionEvent::TurnExcluded { index: 3, turn: 9 });
        trace.on_event(&DecisionEvent::Matched {
            index: 4,
            category: Category::Critical,
            before: 2,
            after: 5,
        });
        let json: serde_json::Value = serde_json::from_str(&trace.to_json().unwrap()).unwrap();
        assert_eq!(json["limit"], 200);
        assert_eq!(json["recorded"], 2);
        assert_eq!(json["entries"][0]["decision"], "turn_excluded");
        assert_eq!(json["entries"][0]["turn"], 9);
        assert!(json["entries"][0].get("category").is_none());
        assert_eq!(json["entries"][1]["category"], "critical");
    }

    #[test]
    fn debug_trace_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces/run.json");
        let trace = DebugTrace::new(10);
        trace.on_event(&classified(7));
        trace.write_to(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"classified\""));
    }

    #[test]
    fn event_index() {
        assert_eq!(classified(5).index(), Some(5));
        let stats = WindowStats::default();
        assert_eq!(DecisionEvent::Finished { stats: &stats }.index(), None);
    }
}
