//! Output rendering: where the summary goes and what it looks like.
//!
//! `text` writes kept lines straight through as they are decided. `json`
//! buffers them and writes one document with a run report at the end.

use crate::error::{Error, Result};
use crate::select::Category;
use crate::select::turn::PrefilterStats;
use crate::source::SourceText;
use crate::source::decode::TextEncoding;
use crate::summarize::RunStats;
use crate::window::{EmittedLine, LineSink, Role, WindowStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

// ── Format and path ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::InvalidConfig(format!(
                "unknown output format '{other}': expected 'text' or 'json'"
            ))),
        }
    }
}

/// `<stem>_summary.<ext>` next to the first input.
pub fn default_output_path(first_input: &Path, format: OutputFormat) -> PathBuf {
    let stem = first_input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string());
    let name = format!("{stem}_summary.{}", format.extension());
    match first_input.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Create `path` for writing, creating missing parent directories.
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    Ok(BufWriter::new(file))
}

// ── Sinks ──────────────────────────────────────────────────────────

/// Writes each kept line's text followed by a newline.
pub struct TextSink<W: Write> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> LineSink for TextSink<W> {
    fn emit(&mut self, out: EmittedLine<'_>) -> Result<()> {
        writeln!(self.writer, "{}", out.line.text)?;
        Ok(())
    }
}

/// One kept line in the JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonLine {
    pub index: usize,
    pub source: usize,
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub role: Role,
    pub text: String,
}

/// Buffers kept lines for [`write_json`].
#[derive(Debug, Default)]
pub struct JsonSink {
    lines: Vec<JsonLine>,
}

impl JsonSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[JsonLine] {
        &self.lines
    }
}

impl LineSink for JsonSink {
    fn emit(&mut self, out: EmittedLine<'_>) -> Result<()> {
        self.lines.push(JsonLine {
            index: out.line.index,
            source: out.line.source,
            row: out.line.row,
            category: out.category,
            role: out.role,
            text: out.line.text.clone(),
        });
        Ok(())
    }
}

// ── Report ─────────────────────────────────────────────────────────

/// One input as seen by the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputReport {
    pub path: PathBuf,
    pub encoding: TextEncoding,
    pub structured: bool,
    pub lines: usize,
}

impl From<&SourceText> for InputReport {
    fn from(src: &SourceText) -> Self {
        Self {
            path: src.path.clone(),
            encoding: src.encoding,
            structured: src.structured,
            lines: src.line_count(),
        }
    }
}

/// What a run read, how it selected, and what it kept.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub generated_at: DateTime<Utc>,
    pub inputs: Vec<InputReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub policy: String,
    pub lines_total: usize,
    pub turn_filter: PrefilterStats,
    pub window: WindowStats,
}

impl SummaryReport {
    pub fn new(sources: &[SourceText], policy: String, stats: &RunStats) -> Self {
        Self {
            generated_at: Utc::now(),
            inputs: sources.iter().map(InputReport::from).collect(),
            output: None,
            format: OutputFormat::default(),
            policy,
            lines_total: stats.lines_total,
            turn_filter: stats.prefilter,
            window: stats.window,
        }
    }

    pub fn with_output(mut self, path: Option<PathBuf>, format: OutputFormat) -> Self {
        self.output = path;
        self.format = format;
        self
    }

    /// Log the headline numbers at `info`.
    pub fn log(&self) {
        let m = &self.window.matches;
        info!(
            "{} of {} lines kept ({} critical, {} high, {} custom; {} before, {} after context)",
            self.window.lines_written,
            self.lines_total,
            m.critical,
            m.high,
            m.custom,
            self.window.before_context,
            self.window.after_context
        );
        if let Some(path) = &self.output {
            info!("Summary written to {}", path.display());
        }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    report: &'a SummaryReport,
    lines: &'a [JsonLine],
}

/// Write the report and kept lines as one pretty-printed JSON document.
pub fn write_json<W: Write>(mut writer: W, report: &SummaryReport, lines: &[JsonLine]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &JsonDocument { report, lines })?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
