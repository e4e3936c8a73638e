//! Input layer: finding, reading, and numbering log sources.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`discover`] | Picks the files to read (explicit, newest, session, per-turn) |
//! | [`decode`] | Sniffs UTF-8 / UTF-16 and decodes bytes to text |
//! | [`records`] | Splits CSV sources into records and records into fields |
//!
//! Sources are read whole and then numbered into [`Line`]s: one per physical
//! line of a plain log, one per record of a CSV source. Line indices are
//! global across all sources of a run; rows restart at 0 for each source.

pub mod decode;
pub mod discover;
pub mod records;

use crate::error::{Error, Result};
use crate::select::Line;
use decode::TextEncoding;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use discover::InputSelection;

/// One decoded input source.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub path: PathBuf,
    pub encoding: TextEncoding,
    pub text: String,
    /// Whether rows carry a turn column (CSV session logs).
    pub structured: bool,
}

impl SourceText {
    /// Wrap text that did not come from disk.
    pub fn from_text(name: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = name.into();
        let structured = is_csv_path(&path);
        Self {
            path,
            encoding: TextEncoding::Utf8,
            text: text.into(),
            structured,
        }
    }

    /// Mark the source as structured (or not) regardless of its extension.
    pub fn with_structured(mut self, structured: bool) -> Self {
        self.structured = structured;
        self
    }

    /// Number of lines, or records for a structured source.
    pub fn line_count(&self) -> usize {
        self.rows().len()
    }

    /// Raw text of each row: CSV records when structured, else lines.
    pub fn rows(&self) -> Vec<&str> {
        if self.structured {
            records::split_records(&self.text)
        } else {
            self.text.lines().collect()
        }
    }
}

/// Read and decode `path`. CSV is detected by extension unless `force_csv`.
pub fn read_source(path: &Path, force_csv: bool) -> Result<SourceText> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let (text, encoding) = decode::decode(&bytes);
    let structured = force_csv || is_csv_path(path);
    debug!(
        "Read {} ({} bytes, {encoding}, structured={structured})",
        path.display(),
        bytes.len()
    );
    Ok(SourceText {
        path: path.to_path_buf(),
        encoding,
        text,
        structured,
    })
}

/// Read every path in order.
pub fn read_sources(paths: &[PathBuf], force_csv: bool) -> Result<Vec<SourceText>> {
    paths.iter().map(|p| read_source(p, force_csv)).collect()
}

fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("csv"))
}

/// Number the lines of all sources as one concatenated sequence.
///
/// Yields `(structured, line)` pairs so callers can route CSV rows through
/// the turn filter.
pub fn numbered_lines(sources: &[SourceText]) -> impl Iterator<Item = (bool, Line)> + '_ {
    sources
        .iter()
        .enumerate()
        .flat_map(|(ordinal, src)| {
            src.rows().into_iter().enumerate().map(move |(row, text)| {
                (
                    src.structured,
                    Line {
                        index: 0,
                        source: ordinal,
                        row,
                        text: text.to_string(),
                    },
                )
            })
        })
        .enumerate()
        .map(|(index, (structured, mut line))| {
            line.index = index;
            (structured, line)
        })
}
