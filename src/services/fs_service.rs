use crate::error::SourceError;
use crate::models::media_types::MediaKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "apng", "bmp", "webp", "heic", "heif", "avif", "tiff", "tif",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "3gp", "3g2", "mkv", "webm", "mov", "avi", "mpg", "mpeg", "ts",
];

const ANIMATED_EXTENSIONS: &[&str] = &["gif", "apng"];

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| candidates.iter().any(|c| c.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

pub fn is_image_file(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Animated image formats, judged by extension only.
pub fn is_animated_image(path: &Path) -> bool {
    has_extension(path, ANIMATED_EXTENSIONS)
}

pub fn media_kind(path: &Path) -> Option<MediaKind> {
    if is_video_file(path) {
        Some(MediaKind::Video)
    } else if is_image_file(path) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Lexically normalize an absolute path: drops `.` and resolves `..`
/// without touching the filesystem.
///
/// Returns `None` for empty, relative, or NUL-containing paths and for
/// paths whose `..` would climb above the root.
pub fn normalize_path(raw: &Path) -> Option<PathBuf> {
    if raw.as_os_str().is_empty() || !raw.has_root() {
        return None;
    }
    if raw.to_string_lossy().contains('\0') {
        return None;
    }

    let mut normalized = PathBuf::new();
    let mut depth = 0usize;
    for component in raw.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                normalized.pop();
                depth -= 1;
            }
            Component::Normal(name) => {
                normalized.push(name);
                depth += 1;
            }
        }
    }
    Some(normalized)
}

/// Name of the directory directly containing `path`, if it has one.
pub fn parent_dir_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().into_owned())
}

/// A media file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFileMeta {
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Seconds since the epoch, 0 when unknown.
    pub modified: i64,
}

/// Recursively list media files under `root`, newest first.
/// Hidden entries are skipped; unreadable entries are logged and skipped.
pub fn list_media_files_with_meta(
    root: &Path,
    follow_links: bool,
) -> Result<Vec<MediaFileMeta>, SourceError> {
    if !root.is_dir() {
        return Err(SourceError::unavailable(format!(
            "Directory does not exist: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(follow_links)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => return Err(SourceError::Io(e.into())),
            Err(e) => {
                debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(kind) = media_kind(entry.path()) else {
            continue;
        };

        let modified = entry
            .metadata()
            .ok()
            .and_then(|meta| meta.modified().ok())
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0) as i64;

        files.push(MediaFileMeta {
            path: entry.into_path(),
            kind,
            modified,
        });
    }

    // Newest first, ties broken by path so repeated scans agree.
    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));

    Ok(files)
}
