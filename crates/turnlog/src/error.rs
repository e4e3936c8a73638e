//! Error type shared by every stage of a summarization run.
//!
//! The selection and windowing engine itself cannot fail; errors come from
//! policy resolution (refused before the engine starts) and from the I/O
//! layer around it.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving a run or moving lines in and out of it.
#[derive(Debug, Error)]
pub enum Error {
    /// A policy or flag combination that cannot produce a meaningful run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },

    /// Input discovery found nothing to summarize.
    #[error("no input found: {0}")]
    NoInput(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to an output sink failed mid-run.
    #[error("write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
