//! Two-phase media loading on a dedicated worker thread.
//!
//! A load first asks the index for a bounded page so large libraries show
//! something quickly. Only when that page comes back full does the worker run
//! a second, unbounded query. Each finished phase is delivered to the
//! listener, and every load ends in exactly one terminal callback.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tokio::sync::mpsc::{self, error::SendError, UnboundedSender};
use tracing::{debug, error, info, trace, warn};

use crate::error::LoadError;
use crate::models::media_types::LoadConfig;
use crate::models::record_types::RecordBatch;
use crate::models::scan_types::{LoadEvent, LoaderState, MediaScanResult, ScanPhase};
use crate::services::grouper::FolderGrouper;
use crate::services::mapper;
use crate::services::source::MediaRecordSource;

/// Row limit of the first, bounded query.
pub const FIRST_PAGE_LIMIT: usize = 1_000;

/// Receives the outcome of a load. Called from the loader's worker thread,
/// so implementations should hand work off rather than block.
pub trait MediaListener: Send + 'static {
    /// Once per completed phase.
    fn on_result(&self, result: MediaScanResult);

    /// At most once, when the index cannot be queried.
    fn on_failure(&self, error: LoadError);
}

impl MediaListener for UnboundedSender<LoadEvent> {
    fn on_result(&self, result: MediaScanResult) {
        if self.send(LoadEvent::Result(result)).is_err() {
            debug!("Listener channel closed; dropping scan result");
        }
    }

    fn on_failure(&self, error: LoadError) {
        if self.send(LoadEvent::Failure(error)).is_err() {
            debug!("Listener channel closed; dropping load failure");
        }
    }
}

/// Listener built from a pair of closures.
pub struct FnListener<R, F> {
    on_result: R,
    on_failure: F,
}

impl<R, F> FnListener<R, F>
where
    R: Fn(MediaScanResult) + Send + 'static,
    F: Fn(LoadError) + Send + 'static,
{
    pub fn new(on_result: R, on_failure: F) -> Self {
        Self {
            on_result,
            on_failure,
        }
    }
}

impl<R, F> MediaListener for FnListener<R, F>
where
    R: Fn(MediaScanResult) + Send + 'static,
    F: Fn(LoadError) + Send + 'static,
{
    fn on_result(&self, result: MediaScanResult) {
        (self.on_result)(result)
    }

    fn on_failure(&self, error: LoadError) {
        (self.on_failure)(error)
    }
}

struct LoadJob {
    config: Arc<LoadConfig>,
    listener: Box<dyn MediaListener>,
}

/// How far a load got before it returned or unwound.
#[derive(Debug, Default)]
struct LoadProgress {
    delivered: Cell<Option<ScanPhase>>,
    terminated: Cell<bool>,
}

impl LoadProgress {
    /// Phase that was running when the load stopped early.
    fn interrupted_phase(&self) -> ScanPhase {
        match self.delivered.get() {
            Some(_) => ScanPhase::Complete,
            None => ScanPhase::FirstPage,
        }
    }
}

/// Loader state tagged with the worker that last wrote it. Only the newest
/// worker may change it, so a worker draining after an abort cannot
/// overwrite a newer load.
#[derive(Debug)]
struct WorkerState {
    generation: u64,
    state: LoaderState,
}

/// Loads device media in the background, one load at a time.
///
/// Loads issued while another is running queue behind it on the same worker.
/// The worker thread is started on first use and again after
/// [`abort_load_process`](Self::abort_load_process).
pub struct MediaLoader {
    source: Arc<dyn MediaRecordSource>,
    first_page_limit: usize,
    jobs: Mutex<Option<UnboundedSender<LoadJob>>>,
    state: Arc<Mutex<WorkerState>>,
}

impl MediaLoader {
    pub fn new(source: Arc<dyn MediaRecordSource>) -> Self {
        Self {
            source,
            first_page_limit: FIRST_PAGE_LIMIT,
            jobs: Mutex::new(None),
            state: Arc::new(Mutex::new(WorkerState {
                generation: 0,
                state: LoaderState::Idle,
            })),
        }
    }

    /// Override the first page size. Clamped to at least one row.
    pub fn with_first_page_limit(mut self, limit: usize) -> Self {
        self.first_page_limit = limit.max(1);
        self
    }

    pub fn first_page_limit(&self) -> usize {
        self.first_page_limit
    }

    /// `Running` while a load executes; otherwise the outcome of the last
    /// load, or `Idle` before the first one.
    pub fn state(&self) -> LoaderState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).state
    }

    /// Queue a load and return immediately. Results and failures arrive
    /// through `listener`.
    pub fn load_device_media_files<L: MediaListener>(&self, config: LoadConfig, listener: L) {
        let job = LoadJob {
            config: Arc::new(config),
            listener: Box::new(listener),
        };

        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);

        let job = match jobs.as_ref() {
            Some(sender) => match sender.send(job) {
                Ok(()) => return,
                // The worker thread is gone; start a fresh one below.
                Err(SendError(job)) => job,
            },
            None => job,
        };

        let rejected = match self.spawn_worker() {
            Ok(sender) => match sender.send(job) {
                Ok(()) => {
                    *jobs = Some(sender);
                    return;
                }
                Err(SendError(job)) => job,
            },
            Err(e) => {
                error!("Failed to start media loader worker: {}", e);
                job
            }
        };

        // The listener may queue another load from its callback.
        drop(jobs);
        rejected.listener.on_failure(LoadError::WorkerUnavailable);
    }

    /// Stop accepting loads on the current worker. Queued loads still run and
    /// a load in flight may still deliver; the next load starts a new worker.
    pub fn abort_load_process(&self) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.take().is_some() {
            info!("Media loader worker shut down");
        }
    }

    fn spawn_worker(&self) -> std::io::Result<UnboundedSender<LoadJob>> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<LoadJob>();
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let first_page_limit = self.first_page_limit;
        let generation = {
            let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
            current.generation += 1;
            current.generation
        };

        thread::Builder::new()
            .name("media-loader".to_string())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    set_state(&state, generation, LoaderState::Running);
                    let progress = LoadProgress::default();
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        run_load(
                            source.as_ref(),
                            &job.config,
                            first_page_limit,
                            job.listener.as_ref(),
                            &progress,
                        )
                    }));
                    let outcome = outcome.unwrap_or_else(|_| {
                        error!("Media load panicked; worker continues with the next load");
                        report_panic(job.listener.as_ref(), &progress);
                        LoaderState::Failed
                    });
                    set_state(&state, generation, outcome);
                }
                debug!("Media loader worker drained, exiting");
            })?;

        debug!("Started media loader worker");
        Ok(sender)
    }
}

impl std::fmt::Debug for MediaLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLoader")
            .field("first_page_limit", &self.first_page_limit)
            .field("state", &self.state())
            .finish()
    }
}

fn set_state(state: &Mutex<WorkerState>, generation: u64, next: LoaderState) {
    let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
    if current.generation == generation {
        current.state = next;
    } else {
        trace!("Stale worker {} left state {:?} alone", generation, next);
    }
}

/// Give a load that unwound its terminal callback, unless it already had one.
fn report_panic(listener: &dyn MediaListener, progress: &LoadProgress) {
    if progress.terminated.get() {
        return;
    }
    let phase = progress.interrupted_phase();
    let reported = panic::catch_unwind(AssertUnwindSafe(|| {
        listener.on_failure(LoadError::Panicked { phase });
    }));
    if reported.is_err() {
        error!("Listener panicked while receiving a load failure");
    }
}

/// Run both phases of one load and return its terminal state.
fn run_load(
    source: &dyn MediaRecordSource,
    config: &LoadConfig,
    first_page_limit: usize,
    listener: &dyn MediaListener,
    progress: &LoadProgress,
) -> LoaderState {
    let filter = config.filter();
    info!(
        "Loading {} (first page {}, folder mode {})",
        filter, first_page_limit, config.folder_mode
    );

    let first_page = match source.query(filter, Some(first_page_limit)) {
        Ok(batch) => batch,
        Err(e) => {
            warn!("First page query failed: {}", e);
            progress.terminated.set(true);
            listener.on_failure(LoadError::SourceUnavailable {
                phase: ScanPhase::FirstPage,
                source: e,
            });
            return LoaderState::Failed;
        }
    };

    let load_again = first_page.is_truncated();
    let phase = if load_again {
        ScanPhase::FirstPage
    } else {
        ScanPhase::Complete
    };
    let result = process_batch(&first_page, config, phase);
    drop(first_page);
    progress.delivered.set(Some(phase));
    progress.terminated.set(!load_again);
    listener.on_result(result);

    if !load_again {
        return LoaderState::Delivered;
    }

    match source.query(filter, None) {
        Ok(batch) => {
            let result = process_batch(&batch, config, ScanPhase::Complete);
            progress.delivered.set(Some(ScanPhase::Complete));
            progress.terminated.set(true);
            listener.on_result(result);
            LoaderState::Delivered
        }
        Err(e) => {
            warn!("Full query failed after first page: {}", e);
            progress.terminated.set(true);
            listener.on_failure(LoadError::SourceUnavailable {
                phase: ScanPhase::Complete,
                source: e,
            });
            LoaderState::Failed
        }
    }
}

/// Map, filter and optionally group one batch.
fn process_batch(batch: &RecordBatch, config: &LoadConfig, phase: ScanPhase) -> MediaScanResult {
    let mut items = Vec::with_capacity(batch.len());
    let mut grouper = config.folder_mode.then(FolderGrouper::new);
    let mut rejected = 0usize;

    for row in batch.rows() {
        match mapper::map_record(row, config) {
            Ok(item) => {
                if let (Some(grouper), Ok(record)) = (grouper.as_mut(), row) {
                    grouper.add(record.bucket_display_name.as_deref(), item.clone());
                }
                items.push(item);
            }
            Err(rejection) => {
                rejected += 1;
                trace!("Skipping row: {}", rejection);
            }
        }
    }

    debug!(
        "{}: {} rows, {} accepted, {} rejected",
        phase,
        batch.len(),
        items.len(),
        rejected
    );

    MediaScanResult {
        phase,
        items,
        folders: grouper.map(FolderGrouper::into_folders),
    }
}
