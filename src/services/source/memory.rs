use std::sync::Mutex;

use super::MediaRecordSource;
use crate::error::SourceError;
use crate::models::media_types::MediaFilter;
use crate::models::record_types::{RecordBatch, RecordRow};

/// When an [`InMemorySource`] refuses to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    #[default]
    Never,
    Always,
    /// Bounded queries succeed, unbounded ones fail.
    UnboundedOnly,
}

/// Fixed rows held in memory, already ordered newest first.
///
/// Every query is recorded so callers can check how the index was used.
#[derive(Debug, Default)]
pub struct InMemorySource {
    rows: Vec<RecordRow>,
    ignore_filter: bool,
    failure: FailureMode,
    queries: Mutex<Vec<(MediaFilter, Option<usize>)>>,
}

impl InMemorySource {
    pub fn new(rows: Vec<RecordRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Return every row regardless of the requested filter, like an index
    /// that ignores its selection.
    pub fn ignoring_filter(mut self) -> Self {
        self.ignore_filter = true;
        self
    }

    pub fn with_failure(mut self, failure: FailureMode) -> Self {
        self.failure = failure;
        self
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<(MediaFilter, Option<usize>)> {
        self.queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

impl MediaRecordSource for InMemorySource {
    fn query(&self, filter: MediaFilter, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((filter, limit));
        }

        let fails = match self.failure {
            FailureMode::Never => false,
            FailureMode::Always => true,
            FailureMode::UnboundedOnly => limit.is_none(),
        };
        if fails {
            return Err(SourceError::unavailable("in-memory index is offline"));
        }

        let rows = self
            .rows
            .iter()
            .filter(|row| match row {
                Ok(record) => self.ignore_filter || filter.admits(record.kind),
                Err(_) => true,
            })
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(RecordBatch::new(rows, limit))
    }
}
