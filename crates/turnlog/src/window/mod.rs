//! Context windowing: which lines to keep around each match.
//!
//! The [`Windower`] consumes lines one at a time and pushes kept lines into a
//! [`LineSink`] as soon as they are decided. It holds two pieces of state:
//!
//! - a [`HistoryBuffer`] of the last `max_before` lines that were not
//!   emitted as matches, recalled as before-context when a match arrives;
//! - an after-countdown. While it is positive, lines are emitted as trailing
//!   context without being classified.
//!
//! Trailing-context lines also enter the history, so a later match may find
//! them there. The windower tracks the index of the last emitted line and
//! skips such entries, so no line is ever written twice. At end of input
//! nothing is flushed: noise that was never followed by a match is dropped.

pub mod history;
pub mod policy;

pub use history::HistoryBuffer;
pub use policy::{ContextDefaultsTable, ContextPolicy, TableName, Window};

use crate::error::Result;
use crate::events::{DecisionEvent, DecisionObserver, NoopObserver};
use crate::select::{Category, Classifier, Line};
use serde::Serialize;

// ── Output seam ────────────────────────────────────────────────────

/// Why a line was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Before,
    Match,
    After,
}

/// A line on its way to a sink. `category` is set only for matches.
#[derive(Debug, Clone, Copy)]
pub struct EmittedLine<'a> {
    pub line: &'a Line,
    pub category: Option<Category>,
    pub role: Role,
}

/// Destination for emitted lines, in output order.
pub trait LineSink {
    fn emit(&mut self, out: EmittedLine<'_>) -> Result<()>;
}

/// Collects owned copies of the emitted lines.
impl LineSink for Vec<Line> {
    fn emit(&mut self, out: EmittedLine<'_>) -> Result<()> {
        self.push(out.line.clone());
        Ok(())
    }
}

// ── Stats ──────────────────────────────────────────────────────────

/// Match counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub critical: usize,
    pub high: usize,
    pub custom: usize,
}

impl CategoryCounts {
    pub fn add(&mut self, category: Category) {
        match category {
            Category::Critical => self.critical += 1,
            Category::High => self.high += 1,
            Category::Custom => self.custom += 1,
            Category::Noise => {}
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.custom
    }
}

/// Counters for one windowing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowStats {
    /// Lines handed to the windower.
    pub lines_read: usize,
    /// Lines that went through the classifier.
    pub lines_classified: usize,
    pub lines_written: usize,
    pub matches: CategoryCounts,
    pub before_context: usize,
    pub after_context: usize,
}

// ── Windower ───────────────────────────────────────────────────────

/// Single-pass context windower.
pub struct Windower<'a> {
    policy: ContextPolicy,
    table: &'static ContextDefaultsTable,
    history: HistoryBuffer,
    countdown: usize,
    last_emitted: Option<usize>,
    stats: WindowStats,
    observer: &'a dyn DecisionObserver,
}

impl<'a> Windower<'a> {
    /// `table` supplies per-category windows when `policy` is not explicit.
    pub fn new(policy: ContextPolicy, table: &'static ContextDefaultsTable) -> Self {
        Self {
            policy,
            table,
            history: HistoryBuffer::new(policy.max_before(table)),
            countdown: 0,
            last_emitted: None,
            stats: WindowStats::default(),
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn DecisionObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn stats(&self) -> &WindowStats {
        &self.stats
    }

    /// Feed the next line. Lines must arrive in increasing `index` order.
    pub fn push<C, S>(&mut self, line: Line, classifier: &C, sink: &mut S) -> Result<()>
    where
        C: Classifier + ?Sized,
        S: LineSink + ?Sized,
    {
        self.stats.lines_read += 1;

        if self.countdown > 0 {
            self.countdown -= 1;
            self.emit(&line, None, Role::After, sink)?;
            self.stats.after_context += 1;
            self.observer.on_event(&DecisionEvent::TrailingContext {
                index: line.index,
                remaining: self.countdown,
            });
            self.history.push(line);
            return Ok(());
        }

        let category = classifier.classify(&line.text);
        self.stats.lines_classified += 1;
        self.observer.on_event(&DecisionEvent::Classified {
            index: line.index,
            category,
            text: &line.text,
        });

        if !category.is_match() {
            self.history.push(line);
            return Ok(());
        }

        let window = self.policy.window_for(self.table, category);
        let mut before = 0;
        for prev in self.history.take_last(window.before) {
            if self.last_emitted.is_some_and(|last| prev.index <= last) {
                continue;
            }
            self.emit(&prev, None, Role::Before, sink)?;
            before += 1;
        }
        self.stats.before_context += before;
        self.stats.matches.add(category);

        self.emit(&line, Some(category), Role::Match, sink)?;
        self.observer.on_event(&DecisionEvent::Matched {
            index: line.index,
            category,
            before,
            after: window.after,
        });
        self.countdown = window.after;
        Ok(())
    }

    /// End of input. Pending history is discarded.
    pub fn finish(self) -> WindowStats {
        self.observer
            .on_event(&DecisionEvent::Finished { stats: &self.stats });
        self.stats
    }

    fn emit<S>(
        &mut self,
        line: &Line,
        category: Option<Category>,
        role: Role,
        sink: &mut S,
    ) -> Result<()>
    where
        S: LineSink + ?Sized,
    {
        sink.emit(EmittedLine {
            line,
            category,
            role,
        })?;
        self.last_emitted = Some(line.index);
        self.stats.lines_written += 1;
        Ok(())
    }
}

/// Window a complete sequence into a vector.
pub fn window_lines<C>(
    lines: impl IntoIterator<Item = Line>,
    classifier: &C,
    policy: ContextPolicy,
    table: &'static ContextDefaultsTable,
) -> Result<(Vec<Line>, WindowStats)>
where
    C: Classifier + ?Sized,
{
    let mut out: Vec<Line> = Vec::new();
    let mut windower = Windower::new(policy, table);
    for line in lines {
        windower.push(line, classifier, &mut out)?;
    }
    Ok((out, windower.finish()))
}
