//! Media index adapters.
//!
//! The loader only sees [`MediaRecordSource`]; which adapter backs it is
//! decided once, when the host opens a [`SourceSpec`].

pub mod directory;
pub mod memory;
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::SourceError;
use crate::models::media_types::MediaFilter;
use crate::models::record_types::RecordBatch;

pub use directory::DirectoryMediaSource;
pub use memory::{FailureMode, InMemorySource};
pub use sqlite::{IndexRevision, MediaQuery, SqliteMediaSource};

/// An indexed media store.
///
/// `query` returns rows ordered by modification time, newest first. With a
/// `limit`, at most that many rows come back. An index that cannot be reached
/// is an `Err`, never an empty batch.
pub trait MediaRecordSource: Send + Sync {
    fn query(&self, filter: MediaFilter, limit: Option<usize>) -> Result<RecordBatch, SourceError>;
}

/// Where a host's media index lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A SQLite media index file.
    Index(PathBuf),
    /// A directory tree walked on every query.
    Directory { root: PathBuf, follow_links: bool },
}

pub fn open_source(spec: &SourceSpec) -> Result<Arc<dyn MediaRecordSource>, SourceError> {
    let source: Arc<dyn MediaRecordSource> = match spec {
        SourceSpec::Index(path) => Arc::new(SqliteMediaSource::open(path)?),
        SourceSpec::Directory { root, follow_links } => {
            Arc::new(DirectoryMediaSource::new(root)?.with_follow_links(*follow_links))
        }
    };
    Ok(source)
}
