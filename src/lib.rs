//! Asynchronous enumeration of the images and videos on a device.
//!
//! A [`MediaLoader`] queries a [`MediaRecordSource`] on its own worker
//! thread, maps rows into [`MediaItem`]s, drops excluded and disallowed
//! formats, optionally groups items into [`Folder`]s, and reports each phase
//! to a [`MediaListener`].

pub mod commands;
pub mod error;
pub mod models;
pub mod services;

pub use error::{ColumnError, LoadError, SourceError};
pub use models::media_types::{Folder, LoadConfig, MediaFilter, MediaItem, MediaKind};
pub use models::record_types::{RawRecord, RecordBatch, RecordRow};
pub use models::scan_types::{LoadEvent, LoaderState, MediaScanResult, ScanPhase};
pub use services::grouper::{FolderGrouper, DEFAULT_FOLDER_NAME};
pub use services::loader::{FnListener, MediaListener, MediaLoader, FIRST_PAGE_LIMIT};
pub use services::mapper::{map_record, Rejection};
pub use services::source::{open_source, MediaRecordSource, SourceSpec};
