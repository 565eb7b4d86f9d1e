use crate::error::ColumnError;
use crate::models::media_types::MediaKind;

/// A row as read from the media index, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub id: i64,
    pub display_name: Option<String>,
    pub path: Option<String>,
    /// Container ("bucket") display name.
    pub bucket_display_name: Option<String>,
    /// Milliseconds. Only selected for queries that admit video.
    pub duration: Option<i64>,
    pub kind: MediaKind,
}

impl RawRecord {
    pub fn image(id: i64, name: &str, path: &str) -> Self {
        Self {
            id,
            display_name: Some(name.to_string()),
            path: Some(path.to_string()),
            bucket_display_name: None,
            duration: None,
            kind: MediaKind::Image,
        }
    }

    pub fn video(id: i64, name: &str, path: &str, duration: i64) -> Self {
        Self {
            duration: Some(duration),
            kind: MediaKind::Video,
            ..Self::image(id, name, path)
        }
    }

    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.bucket_display_name = Some(bucket.to_string());
        self
    }
}

/// One row of a batch; a column that could not be read fails only its row.
pub type RecordRow = Result<RawRecord, ColumnError>;

/// Rows returned by one query, newest first.
#[derive(Debug, Default)]
pub struct RecordBatch {
    rows: Vec<RecordRow>,
    limit: Option<usize>,
}

impl RecordBatch {
    pub fn new(rows: Vec<RecordRow>, limit: Option<usize>) -> Self {
        Self { rows, limit }
    }

    pub fn rows(&self) -> &[RecordRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// True when a bounded query filled its limit, so more rows may exist.
    pub fn is_truncated(&self) -> bool {
        self.limit.is_some_and(|limit| self.rows.len() == limit)
    }
}
