use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::MediaRecordSource;
use crate::error::SourceError;
use crate::models::media_types::MediaFilter;
use crate::models::record_types::{RawRecord, RecordBatch};
use crate::services::fs_service;

/// Media index built by walking a directory tree on every query.
///
/// Rows carry no container name (the grouper falls back to the parent
/// directory) and no duration, since nothing is decoded.
#[derive(Debug, Clone)]
pub struct DirectoryMediaSource {
    root: PathBuf,
    follow_links: bool,
}

impl DirectoryMediaSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, SourceError> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self {
            root,
            follow_links: false,
        })
    }

    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Stable handle for a path; identical across queries of the same tree.
fn path_id(path: &Path) -> i64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    (hasher.finish() >> 1) as i64
}

impl MediaRecordSource for DirectoryMediaSource {
    fn query(&self, filter: MediaFilter, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        let files = fs_service::list_media_files_with_meta(&self.root, self.follow_links)?;

        let rows: Vec<_> = files
            .into_iter()
            .filter(|file| filter.admits(file.kind))
            .take(limit.unwrap_or(usize::MAX))
            .map(|file| {
                Ok(RawRecord {
                    id: path_id(&file.path),
                    display_name: file
                        .path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned()),
                    path: Some(file.path.to_string_lossy().into_owned()),
                    bucket_display_name: None,
                    duration: None,
                    kind: file.kind,
                })
            })
            .collect();

        debug!(
            "Walked {} for {}: {} rows (limit {:?})",
            self.root.display(),
            filter,
            rows.len(),
            limit
        );
        Ok(RecordBatch::new(rows, limit))
    }
}
