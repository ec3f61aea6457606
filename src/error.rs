// src/error.rs

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid regex {pattern:?}: {source}")]
    Regex {
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid regression threshold for {pattern:?}: {value}")]
    InvalidThreshold { pattern: String, value: f64 },

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("unknown commit {0:?}")]
    UnknownCommit(String),

    #[error("worker pool shut down before a task completed")]
    PoolClosed,

    #[error(transparent)]
    Analysis(#[from] AnalysisFailure),
}

/// Failure raised inside a worker task, carried back to the coordinator.
#[derive(Debug, Clone)]
pub struct AnalysisFailure {
    /// Series whose analysis failed
    pub entry_name: String,
    pub message: String,
    /// Kind of the original failure, e.g. `"panic"` or a detector error name
    pub category: String,
    /// Backtrace captured where the failure was caught
    pub trace: String,
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "analysis of {} failed ({}): {}",
            self.entry_name, self.category, self.message
        )
    }
}

impl std::error::Error for AnalysisFailure {}
