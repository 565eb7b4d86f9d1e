use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::error::LoadError;
use crate::models::media_types::LoadConfig;
use crate::models::scan_types::{LoadEvent, MediaScanResult};
use crate::services::loader::MediaLoader;

/// Start a load and hand back its deliveries as a channel.
///
/// The channel closes once the load has finished (or was dropped after an
/// abort), so `recv` returning `None` marks the end of the load.
pub fn stream_device_media(loader: &MediaLoader, config: LoadConfig) -> UnboundedReceiver<LoadEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    loader.load_device_media_files(config, tx);
    rx
}

/// Run a load to completion and return every phase it delivered, first
/// page included.
pub async fn scan_device_media(
    loader: &MediaLoader,
    config: LoadConfig,
) -> Result<Vec<MediaScanResult>, LoadError> {
    let mut rx = stream_device_media(loader, config);
    let mut results = Vec::new();

    while let Some(event) = rx.recv().await {
        match event {
            LoadEvent::Result(result) => results.push(result),
            LoadEvent::Failure(e) => return Err(e),
        }
    }

    if results.is_empty() {
        // The worker went away without a terminal callback.
        return Err(LoadError::WorkerUnavailable);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record_types::RawRecord;
    use crate::models::scan_types::ScanPhase;
    use crate::services::source::{FailureMode, InMemorySource};
    use std::sync::Arc;

    fn source(n: i64) -> InMemorySource {
        InMemorySource::new(
            (0..n)
                .map(|i| Ok(RawRecord::image(i, "p.jpg", &format!("/sdcard/DCIM/{i}.jpg"))))
                .collect(),
        )
    }

    #[tokio::test]
    async fn collects_every_phase() {
        let loader = MediaLoader::new(Arc::new(source(4))).with_first_page_limit(2);

        let results = scan_device_media(&loader, LoadConfig::default()).await.unwrap();

        let phases: Vec<_> = results.iter().map(|r| (r.phase, r.items.len())).collect();
        assert_eq!(phases, vec![(ScanPhase::FirstPage, 2), (ScanPhase::Complete, 4)]);
    }

    #[tokio::test]
    async fn failure_becomes_an_error() {
        let loader = MediaLoader::new(Arc::new(source(4).with_failure(FailureMode::Always)));

        let err = scan_device_media(&loader, LoadConfig::default()).await.unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { phase: ScanPhase::FirstPage, .. }));
    }
}
