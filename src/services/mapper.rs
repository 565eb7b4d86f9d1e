use std::path::Path;
use thiserror::Error;

use crate::error::ColumnError;
use crate::models::media_types::{LoadConfig, MediaItem, MediaKind};
use crate::models::record_types::RecordRow;
use crate::services::fs_service;

/// Why a row was left out of a result. Never reported to the listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("row unreadable: {0}")]
    UnreadableColumn(ColumnError),

    #[error("path missing or not an absolute filesystem path")]
    InvalidPath,

    #[error("path is excluded")]
    Excluded,

    #[error("animated images are not allowed")]
    AnimatedFormat,

    #[error("only videos were requested")]
    WrongKind,

    #[error("display name missing")]
    MissingName,
}

/// Turn one index row into a `MediaItem`, or say why it is skipped.
///
/// Checks run in order: readable row, usable path, exclusion list, animated
/// format, video-only, display name.
pub fn map_record(row: &RecordRow, config: &LoadConfig) -> Result<MediaItem, Rejection> {
    let record = row.as_ref().map_err(|e| Rejection::UnreadableColumn(e.clone()))?;

    let raw_path = record
        .path
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(Rejection::InvalidPath)?;
    let path = fs_service::normalize_path(Path::new(raw_path)).ok_or(Rejection::InvalidPath)?;

    if config.is_excluded(&path) {
        return Err(Rejection::Excluded);
    }

    if !config.include_animation && fs_service::is_animated_image(&path) {
        return Err(Rejection::AnimatedFormat);
    }

    if config.only_video && record.kind != MediaKind::Video {
        return Err(Rejection::WrongKind);
    }

    let name = record
        .display_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or(Rejection::MissingName)?;

    let duration = record
        .duration
        .and_then(|d| u64::try_from(d).ok())
        .unwrap_or(0);

    Ok(MediaItem::new(record.id, name.to_string(), path, duration, record.kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record_types::RawRecord;

    fn image(path: &str) -> RecordRow {
        Ok(RawRecord::image(1, "a.jpg", path))
    }

    #[test]
    fn accepts_a_plain_image() {
        let item = map_record(&image("/sdcard/DCIM/a.jpg"), &LoadConfig::default()).unwrap();
        assert_eq!(item.id(), 1);
        assert_eq!(item.name(), "a.jpg");
        assert_eq!(item.path(), Path::new("/sdcard/DCIM/a.jpg"));
        assert_eq!(item.duration(), 0);
        assert!(!item.is_video());
    }

    #[test]
    fn keeps_video_duration() {
        let row = Ok(RawRecord::video(9, "clip.mp4", "/sdcard/clip.mp4", 12_345));
        let item = map_record(&row, &LoadConfig::default().with_only_video(true)).unwrap();
        assert_eq!(item.duration(), 12_345);
        assert!(item.is_video());
    }

    #[test]
    fn negative_duration_becomes_zero() {
        let row = Ok(RawRecord::video(9, "clip.mp4", "/sdcard/clip.mp4", -1));
        assert_eq!(map_record(&row, &LoadConfig::default()).unwrap().duration(), 0);
    }

    #[test]
    fn rejects_missing_or_bad_paths() {
        let config = LoadConfig::default();
        assert_eq!(map_record(&image(""), &config), Err(Rejection::InvalidPath));
        assert_eq!(map_record(&image("DCIM/a.jpg"), &config), Err(Rejection::InvalidPath));

        let mut record = RawRecord::image(1, "a.jpg", "/sdcard/a.jpg");
        record.path = None;
        assert_eq!(map_record(&Ok(record), &config), Err(Rejection::InvalidPath));
    }

    #[test]
    fn rejects_excluded_paths() {
        let config = LoadConfig::default().exclude("/sdcard/DCIM/a.jpg");
        assert_eq!(
            map_record(&image("/sdcard/DCIM/./a.jpg"), &config),
            Err(Rejection::Excluded)
        );
        assert!(map_record(&image("/sdcard/DCIM/b.jpg"), &config).is_ok());
    }

    #[test]
    fn animation_is_opt_in() {
        let gif = image("/sdcard/DCIM/funny.GIF");
        assert_eq!(
            map_record(&gif, &LoadConfig::default()),
            Err(Rejection::AnimatedFormat)
        );
        assert!(map_record(&gif, &LoadConfig::default().with_include_animation(true)).is_ok());
    }

    #[test]
    fn only_video_rejects_images() {
        let config = LoadConfig::default().with_only_video(true);
        assert_eq!(
            map_record(&image("/sdcard/a.jpg"), &config),
            Err(Rejection::WrongKind)
        );
    }

    #[test]
    fn rejects_missing_name() {
        let mut record = RawRecord::image(1, "a.jpg", "/sdcard/a.jpg");
        record.display_name = None;
        assert_eq!(
            map_record(&Ok(record.clone()), &LoadConfig::default()),
            Err(Rejection::MissingName)
        );

        record.display_name = Some(String::new());
        assert_eq!(
            map_record(&Ok(record), &LoadConfig::default()),
            Err(Rejection::MissingName)
        );
    }

    #[test]
    fn path_checks_come_before_name_checks() {
        let mut record = RawRecord::image(1, "a.gif", "/sdcard/a.gif");
        record.display_name = None;
        assert_eq!(
            map_record(&Ok(record), &LoadConfig::default()),
            Err(Rejection::AnimatedFormat)
        );
    }

    #[test]
    fn unreadable_rows_are_rejected() {
        let row: RecordRow = Err(ColumnError::new("_id", "invalid type"));
        assert!(matches!(
            map_record(&row, &LoadConfig::default()),
            Err(Rejection::UnreadableColumn(_))
        ));
    }
}
