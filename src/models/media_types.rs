use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::services::fs_service;

/// Media type a record was tagged with by the index.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `media_type` column value used by the index.
    pub fn index_code(self) -> i64 {
        match self {
            MediaKind::Image => 1,
            MediaKind::Video => 3,
        }
    }

    pub fn from_index_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(MediaKind::Image),
            3 => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// One image or video accepted from the index.
///
/// Only the record mapper builds these; fields are read through accessors.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct MediaItem {
    id: i64,
    name: String,
    path: PathBuf,
    /// Milliseconds, 0 for images.
    duration: u64,
    kind: MediaKind,
}

impl MediaItem {
    pub(crate) fn new(id: i64, name: String, path: PathBuf, duration: u64, kind: MediaKind) -> Self {
        Self {
            id,
            name,
            path,
            duration,
            kind,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Items discovered under one container, in scan order.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Folder {
    name: String,
    items: Vec<MediaItem>,
}

impl Folder {
    pub(crate) fn new(name: String, items: Vec<MediaItem>) -> Self {
        Self { name, items }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }
}

/// Which media types a query selects.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaFilter {
    Images,
    Videos,
    ImagesAndVideos,
}

impl MediaFilter {
    pub fn admits(self, kind: MediaKind) -> bool {
        match self {
            MediaFilter::Images => kind == MediaKind::Image,
            MediaFilter::Videos => kind == MediaKind::Video,
            MediaFilter::ImagesAndVideos => true,
        }
    }

    pub fn includes_video(self) -> bool {
        self != MediaFilter::Images
    }

    pub fn kinds(self) -> &'static [MediaKind] {
        match self {
            MediaFilter::Images => &[MediaKind::Image],
            MediaFilter::Videos => &[MediaKind::Video],
            MediaFilter::ImagesAndVideos => &[MediaKind::Image, MediaKind::Video],
        }
    }
}

impl fmt::Display for MediaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MediaFilter::Images => "images",
            MediaFilter::Videos => "videos",
            MediaFilter::ImagesAndVideos => "images+videos",
        };
        f.write_str(label)
    }
}

/// Options for a single load call.
///
/// Every field defaults to off/empty, including when deserialized from a
/// partial JSON document.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LoadConfig {
    /// Also group results by container.
    pub folder_mode: bool,
    /// Include videos alongside images.
    pub include_video: bool,
    /// Restrict results to videos. Takes precedence over `include_video`.
    pub only_video: bool,
    /// Allow animated image formats such as GIF.
    pub include_animation: bool,
    /// Paths skipped regardless of the other options.
    pub excluded_paths: HashSet<PathBuf>,
}

impl LoadConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn with_folder_mode(mut self, enabled: bool) -> Self {
        self.folder_mode = enabled;
        self
    }

    pub fn with_include_video(mut self, enabled: bool) -> Self {
        self.include_video = enabled;
        self
    }

    pub fn with_only_video(mut self, enabled: bool) -> Self {
        self.only_video = enabled;
        self
    }

    pub fn with_include_animation(mut self, enabled: bool) -> Self {
        self.include_animation = enabled;
        self
    }

    /// Skip `path`. Stored normalized when it is a valid absolute path.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = fs_service::normalize_path(&path).unwrap_or(path);
        self.excluded_paths.insert(path);
        self
    }

    pub fn filter(&self) -> MediaFilter {
        if self.only_video {
            MediaFilter::Videos
        } else if self.include_video {
            MediaFilter::ImagesAndVideos
        } else {
            MediaFilter::Images
        }
    }

    /// `path` must already be normalized.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }
        self.excluded_paths.contains(path)
            || self
                .excluded_paths
                .iter()
                .any(|excluded| fs_service::normalize_path(excluded).as_deref() == Some(path))
    }
}
