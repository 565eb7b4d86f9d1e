use serde::Serialize;
use std::fmt;

use crate::error::LoadError;
use crate::models::media_types::{Folder, MediaItem};

/// Which pass of a load produced a delivery.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// Bounded first page; a complete delivery follows.
    FirstPage,
    /// Final result of the load.
    Complete,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPhase::FirstPage => f.write_str("first page"),
            ScanPhase::Complete => f.write_str("complete"),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct MediaScanResult {
    pub phase: ScanPhase,
    pub items: Vec<MediaItem>,
    /// Present only when the load ran in folder mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<Folder>>,
}

impl MediaScanResult {
    pub fn is_final(&self) -> bool {
        self.phase == ScanPhase::Complete
    }
}

/// A single delivery, for hosts that consume loads through a channel.
#[derive(Debug)]
pub enum LoadEvent {
    Result(MediaScanResult),
    Failure(LoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Running,
    Delivered,
    Failed,
}
