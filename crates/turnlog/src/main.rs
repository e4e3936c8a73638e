//! Summarize turn-based game session logs.
//!
//! # Examples
//!
//! ```sh
//! # Newest *.log in the current directory, falling back to Saved/TurnLogs
//! turnlog
//!
//! # Errors and warnings only, two lines of context each side
//! turnlog Saved/Logs/Lyra.log --depth high -C 2
//!
//! # Movement preset over the latest session CSV, turns 5 to 7, as JSON
//! turnlog --latest-session --preset movement --turn-range 5-7 --format json
//!
//! # Per-turn dumps with a decision trace
//! turnlog --turn-files 3-6 --debug-trace trace.json -v
//! ```

use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use turnlog::events::DEFAULT_TRACE_LIMIT;
use turnlog::output::{
    JsonSink, OutputFormat, SummaryReport, TextSink, create_output, default_output_path,
    write_json,
};
use turnlog::prelude::*;
use turnlog::source::discover::{DEFAULT_EXTENSION, TURN_LOG_DIR};
use turnlog::source::{InputSelection, read_sources};

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "TURNLOG_LOG";

/// Summarize turn-based game session logs.
///
/// Keeps lines that matter (errors, warnings, keyword or preset hits) plus
/// context around them, and writes them beside the first input.
#[derive(Parser)]
#[command(name = "turnlog", version)]
struct Cli {
    // ── Input ──────────────────────────────────────────────────
    /// Log or CSV files to summarize, concatenated in order
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Summarize the newest *.<ext> file in DIR
    #[arg(
        long,
        value_name = "DIR",
        num_args = 0..=1,
        default_missing_value = ".",
        conflicts_with_all = ["inputs", "latest_session", "turn_files"]
    )]
    latest_from_dir: Option<PathBuf>,

    /// Summarize the newest Session_<timestamp>.csv in the log directory
    #[arg(long, conflicts_with_all = ["inputs", "turn_files"])]
    latest_session: bool,

    /// Summarize TurnDebug_Turn<N>.csv files for a turn range (e.g. 5-10)
    #[arg(long, value_name = "RANGE", conflicts_with = "inputs")]
    turn_files: Option<TurnFilter>,

    /// Directory holding session and turn CSVs
    #[arg(long, value_name = "DIR", default_value = TURN_LOG_DIR)]
    log_dir: PathBuf,

    /// File extension searched for by --latest-from-dir and the default search
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    ext: String,

    // ── Selection ──────────────────────────────────────────────
    /// Keyword depth: critical, high, or medium
    #[arg(short, long, default_value = "medium", conflicts_with = "preset")]
    depth: Depth,

    /// Extra keywords, space or comma separated. Used at medium depth or added to a preset.
    /// Place input files before -k, or end the list with --
    #[arg(short, long, num_args = 1.., value_delimiter = ',', value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Named preset (see --list-presets)
    #[arg(short, long)]
    preset: Option<String>,

    /// JSON file of extra presets: [{"name", "description", "whitelist", "blacklist"}]
    #[arg(long, value_name = "FILE")]
    preset_file: Option<PathBuf>,

    /// Print available presets and exit
    #[arg(long)]
    list_presets: bool,

    // ── Context ────────────────────────────────────────────────
    /// Lines of context before each match
    #[arg(short = 'B', long, value_name = "N")]
    before: Option<usize>,

    /// Lines of context after each match
    #[arg(short = 'A', long, value_name = "N")]
    after: Option<usize>,

    /// Lines of context on both sides (overridden by -B / -A)
    #[arg(short = 'C', long, value_name = "N")]
    context: Option<usize>,

    /// Per-category defaults table used without -A/-B/-C: keyword or preset
    #[arg(long, value_name = "TABLE")]
    context_table: Option<TableName>,

    // ── Turn filter ────────────────────────────────────────────
    /// Keep only CSV rows whose turn is in RANGE (e.g. 5-7 or 1,4,6-8)
    #[arg(long, value_name = "RANGE")]
    turn_range: Option<TurnFilter>,

    /// Turn column by header name or zero-based index
    #[arg(long, value_name = "COLUMN")]
    turn_column: Option<TurnColumn>,

    /// Treat every input as CSV regardless of extension
    #[arg(long)]
    csv: bool,

    // ── Output ─────────────────────────────────────────────────
    /// Output path (default: <first input>_summary.<txt|json>)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Write the first decisions as JSON to FILE
    #[arg(long, value_name = "FILE")]
    debug_trace: Option<PathBuf>,

    /// Number of decisions kept by --debug-trace
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TRACE_LIMIT)]
    debug_trace_limit: usize,

    // ── Logging ────────────────────────────────────────────────
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn input_selection(&self) -> InputSelection {
        if !self.inputs.is_empty() {
            InputSelection::Files(self.inputs.clone())
        } else if let Some(dir) = &self.latest_from_dir {
            InputSelection::LatestFromDir {
                dir: dir.clone(),
                ext: self.ext.clone(),
            }
        } else if self.latest_session {
            InputSelection::LatestSession {
                dir: self.log_dir.clone(),
            }
        } else if let Some(turns) = &self.turn_files {
            InputSelection::TurnFiles {
                dir: self.log_dir.clone(),
                turns: turns.clone(),
            }
        } else {
            InputSelection::Auto {
                dir: PathBuf::from("."),
                ext: self.ext.clone(),
                fallback: self.log_dir.clone(),
            }
        }
    }

    fn context_policy(&self) -> ContextPolicy {
        if self.before.is_none() && self.after.is_none() && self.context.is_none() {
            return ContextPolicy::defaults();
        }
        ContextPolicy::explicit(
            self.before.or(self.context).unwrap_or(0),
            self.after.or(self.context).unwrap_or(0),
        )
    }

    fn selection_policy(&self, registry: &PresetRegistry) -> Result<SelectionPolicy> {
        match &self.preset {
            Some(name) => {
                let preset = registry.resolve(name)?.clone();
                Ok(SelectionPolicy::Preset(
                    PresetSelector::new(preset).with_custom_keywords(&self.keywords),
                ))
            }
            None => {
                if !self.keywords.is_empty() && self.depth != Depth::Medium {
                    warn!(
                        "Custom keywords are only used at medium depth; ignoring them at {}",
                        self.depth
                    );
                }
                Ok(SelectionPolicy::KeywordDepth(
                    KeywordSelector::new(self.depth).with_custom_keywords(&self.keywords),
                ))
            }
        }
    }

    fn summary_config(&self, registry: &PresetRegistry) -> Result<SummaryConfig> {
        Ok(SummaryConfig::new(self.selection_policy(registry)?)
            .with_context(self.context_policy())
            .with_table(self.context_table)
            .with_turn_filter(self.turn_range.clone())
            .with_turn_column(self.turn_column.clone()))
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn load_registry(preset_file: Option<&Path>) -> Result<PresetRegistry> {
    match preset_file {
        Some(path) => PresetRegistry::from_json_file(path),
        None => Ok(PresetRegistry::builtin().clone()),
    }
}

fn print_presets(registry: &PresetRegistry) {
    println!("Available presets:");
    for preset in registry.iter() {
        println!("  {:<12} {}", preset.name, preset.description);
        if !preset.whitelist.is_empty() {
            println!("  {:<12}   keep: {}", "", preset.whitelist.join(", "));
        }
        if !preset.blacklist.is_empty() {
            println!("  {:<12}   drop: {}", "", preset.blacklist.join(", "));
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let registry = load_registry(cli.preset_file.as_deref())?;
    if cli.list_presets {
        print_presets(&registry);
        return Ok(());
    }

    // Refuse bad policy before touching any input.
    let config = cli.summary_config(&registry)?;
    debug!("Policy: {}", config.describe());

    let paths = cli.input_selection().resolve()?;
    for path in &paths {
        info!("Input: {}", path.display());
    }
    let sources = read_sources(&paths, cli.csv)?;

    let output_path = match (&cli.output, paths.first()) {
        (Some(path), _) => path.clone(),
        (None, Some(first)) => default_output_path(first, cli.format),
        (None, None) => return Err(Error::NoInput("no input files resolved".into())),
    };

    let trace = cli
        .debug_trace
        .as_ref()
        .map(|_| DebugTrace::new(cli.debug_trace_limit));
    let observer = CompositeObserver::new()
        .with(&LoggingObserver)
        .with_opt(trace.as_ref().map(|t| t as &dyn DecisionObserver));

    let policy = config.describe();
    let summarizer = Summarizer::new(config).with_observer(&observer);
    summarizer.validate(&sources)?;

    let stats = match cli.format {
        OutputFormat::Text => {
            let mut sink = TextSink::new(create_output(&output_path)?);
            let stats = summarizer.run(&sources, &mut sink)?;
            sink.finish()?;
            stats
        }
        OutputFormat::Json => {
            let mut sink = JsonSink::new();
            let stats = summarizer.run(&sources, &mut sink)?;
            let report = SummaryReport::new(&sources, policy.clone(), &stats)
                .with_output(Some(output_path.clone()), cli.format);
            write_json(create_output(&output_path)?, &report, sink.lines())?;
            stats
        }
    };

    SummaryReport::new(&sources, policy, &stats)
        .with_output(Some(output_path), cli.format)
        .log();

    if let (Some(trace), Some(path)) = (&trace, &cli.debug_trace) {
        trace.write_to(path)?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
