use indexmap::IndexMap;

use crate::models::media_types::{Folder, MediaItem};
use crate::services::fs_service;

/// Container used when neither the index nor the path names one.
pub const DEFAULT_FOLDER_NAME: &str = "SDCARD";

/// Buckets accepted items by container, keeping first-seen order for both
/// containers and the items inside them.
#[derive(Debug, Default)]
pub struct FolderGrouper {
    folders: IndexMap<String, Vec<MediaItem>>,
}

impl FolderGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index bucket name if present, else the parent directory name, else
    /// [`DEFAULT_FOLDER_NAME`].
    pub fn container_name(bucket: Option<&str>, item: &MediaItem) -> String {
        bucket
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .or_else(|| fs_service::parent_dir_name(item.path()))
            .unwrap_or_else(|| DEFAULT_FOLDER_NAME.to_string())
    }

    pub fn add(&mut self, bucket: Option<&str>, item: MediaItem) {
        let name = Self::container_name(bucket, &item);
        self.folders.entry(name).or_default().push(item);
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn into_folders(self) -> Vec<Folder> {
        self.folders
            .into_iter()
            .map(|(name, items)| Folder::new(name, items))
            .collect()
    }
}
