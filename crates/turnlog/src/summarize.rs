//! One summarization run: pre-filter, classify, window.
//!
//! ```text
//! sources ──► numbered lines ──► TurnPrefilter (CSV only) ──► Windower ──► sink
//!                                                              │
//!                                                 SelectionPolicy classifies
//! ```

use crate::config::SummaryConfig;
use crate::error::{Error, Result};
use crate::events::{DecisionObserver, NoopObserver};
use crate::select::TurnPrefilter;
use crate::select::turn::PrefilterStats;
use crate::source::{SourceText, numbered_lines};
use crate::window::{LineSink, WindowStats, Windower};
use serde::Serialize;
use tracing::{debug, info};

/// Counters for a complete run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Lines across all sources before any filtering.
    pub lines_total: usize,
    pub prefilter: PrefilterStats,
    pub window: WindowStats,
}

/// Drives the engine over a set of decoded sources.
pub struct Summarizer<'a> {
    config: SummaryConfig,
    observer: &'a dyn DecisionObserver,
}

impl<'a> Summarizer<'a> {
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            config,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn DecisionObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Refuse configurations that cannot do what was asked.
    pub fn validate(&self, sources: &[SourceText]) -> Result<()> {
        if let Some(filter) = &self.config.turn_filter {
            if filter.is_empty() {
                return Err(Error::InvalidConfig("turn filter selects no turns".into()));
            }
            if !sources.iter().any(|s| s.structured) {
                return Err(Error::InvalidConfig(
                    "turn filter needs a CSV source (use a .csv input or --csv)".into(),
                ));
            }
        }
        Ok(())
    }

    /// Summarize `sources` in order, pushing kept lines into `sink`.
    pub fn run<S>(&self, sources: &[SourceText], sink: &mut S) -> Result<RunStats>
    where
        S: LineSink + ?Sized,
    {
        self.validate(sources)?;
        info!(
            "Summarizing {} source(s): {}",
            sources.len(),
            self.config.describe()
        );

        let mut prefilter = TurnPrefilter::new(self.config.turn_filter.clone())
            .with_column(self.config.turn_column.clone());
        let mut windower = Windower::new(self.config.context, self.config.defaults_table())
            .with_observer(self.observer);
        let mut lines_total = 0;

        for (structured, line) in numbered_lines(sources) {
            lines_total += 1;
            if structured && !prefilter.admit(&line, self.observer) {
                continue;
            }
            windower.push(line, &self.config.selection, sink)?;
        }

        let stats = RunStats {
            lines_total,
            prefilter: prefilter.stats(),
            window: windower.finish(),
        };
        if prefilter.is_active() {
            debug!(
                "Turn filter: {} passed, {} excluded, {} malformed",
                stats.prefilter.passed, stats.prefilter.excluded, stats.prefilter.malformed
            );
        }
        Ok(stats)
    }
}
