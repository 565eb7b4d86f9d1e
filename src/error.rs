use thiserror::Error;

use crate::models::scan_types::ScanPhase;

/// The media index could not execute a query.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("media index unavailable: {0}")]
    Unavailable(String),

    #[error("media index query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// A single column of a single row could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column `{column}` unreadable: {reason}")]
pub struct ColumnError {
    pub column: &'static str,
    pub reason: String,
}

impl ColumnError {
    pub fn new(column: &'static str, reason: impl Into<String>) -> Self {
        Self {
            column,
            reason: reason.into(),
        }
    }
}

/// Terminal failure of a load, reported through `MediaListener::on_failure`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{phase} query failed: {source}")]
    SourceUnavailable {
        phase: ScanPhase,
        #[source]
        source: SourceError,
    },

    /// The source or the listener panicked before the load finished.
    #[error("{phase} load panicked")]
    Panicked { phase: ScanPhase },

    #[error("media loader worker is unavailable")]
    WorkerUnavailable,

    #[error("invalid load config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
