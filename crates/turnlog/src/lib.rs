//! Session log summarizer for turn-based games.
//!
//! `turnlog` reads engine logs and turn CSVs, keeps the lines worth reading
//! when diagnosing a session, and writes a much smaller summary. The core is
//! a single-pass engine:
//!
//! 1. an optional **turn pre-filter** drops CSV rows outside a turn range;
//! 2. the **selector** classifies each remaining line as `critical`,
//!    `high`, `custom`, or `noise` by keyword depth or a named preset;
//! 3. the **windower** keeps context lines before and after each match from
//!    a bounded history buffer, never emitting a line twice.
//!
//! # Getting started
//!
//! ```ignore
//! use turnlog::prelude::*;
//!
//! let sources = vec![SourceText::from_text("game.log", std::fs::read_to_string("game.log")?)];
//! let config = SummaryConfig::default().with_context(ContextPolicy::explicit(2, 2));
//!
//! let mut kept: Vec<Line> = Vec::new();
//! let stats = Summarizer::new(config)
//!     .with_observer(&LoggingObserver)
//!     .run(&sources, &mut kept)?;
//! println!("{} of {} lines kept", stats.window.lines_written, stats.lines_total);
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`select`] | [`Line`](select::Line), [`Category`](select::Category), keyword depth, presets, turn pre-filter |
//! | [`window`] | [`Windower`](window::Windower), history buffer, context policy and defaults tables |
//! | [`summarize`] | [`Summarizer`](summarize::Summarizer): pre-filter, classify, window over decoded sources |
//! | [`source`] | Input discovery, encoding sniffing, CSV field splitting |
//! | [`output`] | Text and JSON sinks, run report, default output path |
//! | [`events`] | [`DecisionObserver`](events::DecisionObserver), logging observer, debug trace |
//! | [`config`] | [`SummaryConfig`](config::SummaryConfig) builder |
//! | [`error`] | [`Error`] and [`Result`] |

pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod prelude;
pub mod select;
pub mod source;
pub mod summarize;
pub mod window;

pub use error::{Error, Result};
