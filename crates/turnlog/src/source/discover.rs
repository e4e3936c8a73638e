//! Input discovery: which files a run should read.
//!
//! Mirrors how session logs are laid out by the game:
//!
//! ```text
//! Saved/
//!   Logs/LyraStarterGame.log          engine log (newest by mtime)
//!   TurnLogs/
//!     Session_2025.06.01-21.04.09.csv  one CSV per play session
//!     TurnDebug_Turn5.csv              optional per-turn dumps
//! ```

use crate::error::{Error, Result};
use crate::select::TurnFilter;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Extension searched when none is given.
pub const DEFAULT_EXTENSION: &str = "log";

/// Where the game writes turn CSVs, relative to the project directory.
pub const TURN_LOG_DIR: &str = "Saved/TurnLogs";

const SESSION_PREFIX: &str = "Session_";

/// Timestamp layouts seen in session file names, tried in order.
const SESSION_TIMESTAMP_FORMATS: [&str; 3] =
    ["%Y.%m.%d-%H.%M.%S", "%Y%m%d_%H%M%S", "%Y-%m-%d_%H-%M-%S"];

/// How the caller asked for input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSelection {
    /// Explicit paths, concatenated in order. Missing files are skipped.
    Files(Vec<PathBuf>),
    /// Newest `*.{ext}` in `dir` by modification time.
    LatestFromDir { dir: PathBuf, ext: String },
    /// Newest `Session_<timestamp>.csv` in `dir`.
    LatestSession { dir: PathBuf },
    /// `TurnDebug_Turn{n}.csv` for each targeted turn.
    TurnFiles { dir: PathBuf, turns: TurnFilter },
    /// Newest `*.{ext}` in `dir`, else the newest CSV under `fallback`.
    Auto {
        dir: PathBuf,
        ext: String,
        fallback: PathBuf,
    },
}

impl InputSelection {
    /// Resolve to the list of files to read. Never returns an empty list.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        match self {
            InputSelection::Files(paths) => {
                let existing: Vec<PathBuf> = paths
                    .iter()
                    .filter(|p| {
                        let found = p.is_file();
                        if !found {
                            warn!("Input file not found, skipping: {}", p.display());
                        }
                        found
                    })
                    .cloned()
                    .collect();
                if existing.is_empty() {
                    return Err(Error::NoInput("none of the given input files exist".into()));
                }
                Ok(existing)
            }
            InputSelection::LatestFromDir { dir, ext } => latest_file(dir, ext)?
                .map(|p| vec![p])
                .ok_or_else(|| {
                    Error::NoInput(format!("no *.{ext} files in '{}'", dir.display()))
                }),
            InputSelection::LatestSession { dir } => latest_session(dir)?
                .map(|p| vec![p])
                .ok_or_else(|| {
                    Error::NoInput(format!("no Session_*.csv files in '{}'", dir.display()))
                }),
            InputSelection::TurnFiles { dir, turns } => turn_files(dir, turns),
            InputSelection::Auto { dir, ext, fallback } => {
                match latest_file(dir, ext) {
                    Ok(Some(path)) => return Ok(vec![path]),
                    Ok(None) => {}
                    Err(e) => warn!("{e}"),
                }
                info!(
                    "No *.{ext} file in '{}'; falling back to '{}' for *.csv",
                    dir.display(),
                    fallback.display()
                );
                latest_file(fallback, "csv")?
                    .map(|p| vec![p])
                    .ok_or_else(|| {
                        Error::NoInput(format!(
                            "no *.{ext} in '{}' and no *.csv in '{}'",
                            dir.display(),
                            fallback.display()
                        ))
                    })
            }
        }
    }
}

/// Newest file with extension `ext` directly inside `dir`.
pub fn latest_file(dir: &Path, ext: &str) -> Result<Option<PathBuf>> {
    let ext = ext.trim_start_matches('.');
    let latest = files_in(dir)?
        .into_iter()
        .filter(|(path, _)| {
            path.extension()
                .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        })
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(path, _)| path);
    if let Some(path) = &latest {
        debug!("Latest *.{ext} in {}: {}", dir.display(), path.display());
    }
    Ok(latest)
}

/// Newest `Session_<timestamp>.csv` in `dir`.
///
/// Files whose name carries a parseable timestamp are ordered by it and
/// always beat files that don't; the rest fall back to modification time.
pub fn latest_session(dir: &Path) -> Result<Option<PathBuf>> {
    let latest = files_in(dir)?
        .into_iter()
        .filter_map(|(path, mtime)| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            if !is_session_file(&name) {
                return None;
            }
            Some((parse_session_timestamp(&name), mtime, path))
        })
        .max()
        .map(|(_, _, path)| path);
    Ok(latest)
}

fn is_session_file(name: &str) -> bool {
    name.starts_with(SESSION_PREFIX) && name.to_ascii_lowercase().ends_with(".csv")
}

/// Parse the timestamp out of a `Session_<timestamp>.csv` file name.
pub fn parse_session_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let stamp = stem.strip_prefix(SESSION_PREFIX)?;
    SESSION_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(stamp, fmt).ok())
}

/// Per-turn CSV dumps for every targeted turn that exists on disk.
pub fn turn_files(dir: &Path, turns: &TurnFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for turn in turns.turns() {
        let path = dir.join(format!("TurnDebug_Turn{turn}.csv"));
        if path.is_file() {
            files.push(path);
        } else {
            warn!("Turn log not found, skipping: {}", path.display());
        }
    }
    if files.is_empty() {
        return Err(Error::NoInput(format!(
            "no turn logs for turns {turns} in '{}'",
            dir.display()
        )));
    }
    Ok(files)
}

/// Regular files in `dir` with their modification times.
fn files_in(dir: &Path) -> Result<Vec<(PathBuf, SystemTime)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(meta) = entry.metadata() else {
            warn!("Could not stat '{}', skipping", path.display());
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((path, mtime));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "x\n").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn latest_file_picks_newest_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "old.log", 300);
        let newest = touch(dir.path(), "new.log", 10);
        touch(dir.path(), "newer.txt", 1);
        assert_eq!(latest_file(dir.path(), "log").unwrap(), Some(newest.clone()));
        assert_eq!(latest_file(dir.path(), ".LOG").unwrap(), Some(newest));
    }

    #[test]
    fn latest_file_none_when_no_match() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt", 5);
        assert_eq!(latest_file(dir.path(), "log").unwrap(), None);
    }

    #[test]
    fn missing_dir_is_io_error() {
        let err = latest_file(Path::new("/nonexistent/turnlog"), "log").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn session_timestamp_formats() {
        let ts = parse_session_timestamp("Session_2025.06.01-21.04.09.csv").unwrap();
        assert_eq!(ts.to_string(), "2025-06-01 21:04:09");
        assert!(parse_session_timestamp("Session_20250601_210409.csv").is_some());
        assert!(parse_session_timestamp("Session_latest.csv").is_none());
        assert!(parse_session_timestamp("Other_20250601_210409.csv").is_none());
    }

    #[test]
    fn latest_session_orders_by_name_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        // Older timestamp but touched most recently.
        touch(dir.path(), "Session_2025.06.01-09.00.00.csv", 1);
        let newest = touch(dir.path(), "Session_2025.06.02-08.00.00.csv", 500);
        touch(dir.path(), "Session_backup.csv", 0);
        touch(dir.path(), "TurnDebug_Turn1.csv", 0);
        assert_eq!(latest_session(dir.path()).unwrap(), Some(newest));
    }

    #[test]
    fn turn_files_skip_missing_turns() {
        let dir = tempfile::tempdir().unwrap();
        let t5 = touch(dir.path(), "TurnDebug_Turn5.csv", 0);
        let t7 = touch(dir.path(), "TurnDebug_Turn7.csv", 0);
        let files = turn_files(dir.path(), &"5-7".parse().unwrap()).unwrap();
        assert_eq!(files, vec![t5, t7]);
    }

    #[test]
    fn turn_files_none_found_is_no_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = turn_files(dir.path(), &"1-2".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::NoInput(_)));
    }

    #[test]
    fn explicit_files_skip_missing() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.log", 0);
        let selection = InputSelection::Files(vec![dir.path().join("missing.log"), a.clone()]);
        assert_eq!(selection.resolve().unwrap(), vec![a]);
        let none = InputSelection::Files(vec![dir.path().join("missing.log")]);
        assert!(matches!(none.resolve().unwrap_err(), Error::NoInput(_)));
    }

    #[test]
    fn auto_falls_back_to_turn_log_csvs() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("TurnLogs");
        std::fs::create_dir(&fallback).unwrap();
        let csv = touch(&fallback, "Session_x.csv", 0);
        let selection = InputSelection::Auto {
            dir: dir.path().to_path_buf(),
            ext: "log".into(),
            fallback,
        };
        assert_eq!(selection.resolve().unwrap(), vec![csv]);
    }
}
