//! Batched, rate-aware retrieval across many artists.
//!
//! Artists are split into fixed-size batches that run strictly one after
//! another. Inside a batch up to `concurrency` artists are in flight, and
//! their starts are spaced at least `artist_delay` apart. A rate-limit
//! response from any artist pushes out a pause gate shared by the whole batch;
//! every catalog request in the batch, including pages of scans already under
//! way, waits on that gate.
//!
//! Failures stay artist-scoped. Only an authentication failure, or a run in
//! which nobody succeeded, fails the run as a whole.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use newreleases_common::{Artist, ArtistId, Error, RawRelease, Result};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ScanConfig, SchedulerConfig};
use crate::retrieval::{PauseGate, ReleaseRetriever};

/// Tunables for [`BatchScheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub batch_size: usize,
    pub concurrency: usize,
    /// Minimum spacing between artist starts in a batch.
    pub artist_delay: Duration,
    /// Delay between consecutive batches.
    pub batch_delay: Duration,
    /// Wait before the single retry of a transient failure.
    pub retry_backoff: Duration,
    pub window_days: u32,
    pub use_optimized_search: bool,
}

impl SchedulerOptions {
    pub fn from_config(scheduler: &SchedulerConfig, scan: &ScanConfig) -> Self {
        Self {
            batch_size: scheduler.batch_size,
            concurrency: scheduler.concurrency,
            artist_delay: Duration::from_millis(scheduler.artist_delay_ms),
            batch_delay: Duration::from_millis(scheduler.batch_delay_ms),
            retry_backoff: Duration::from_millis(scheduler.retry_backoff_ms),
            window_days: scan.window_days,
            use_optimized_search: scan.use_optimized_search,
        }
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default(), &ScanConfig::default())
    }
}

/// What happened to one artist.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub artist_id: ArtistId,
    pub artist_name: String,
    pub releases: Vec<RawRelease>,
    /// `Some` if the artist failed after its retry.
    pub error: Option<Error>,
}

/// An artist whose retrieval failed for good.
#[derive(Debug, Clone)]
pub struct FailedArtist {
    pub artist_id: ArtistId,
    pub artist_name: String,
    pub error: Error,
}

/// Result of a scheduler run that was not fatal.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Releases from every successful artist, in completion order.
    pub releases: Vec<RawRelease>,
    pub outcomes: Vec<RetrievalOutcome>,
    pub failed: Vec<FailedArtist>,
    pub total_artists: usize,
    pub succeeded_artists: usize,
    /// The run was interrupted; artists not yet started are absent.
    pub cancelled: bool,
}

impl RunReport {
    pub fn failed_artist_ids(&self) -> Vec<ArtistId> {
        self.failed.iter().map(|f| f.artist_id.clone()).collect()
    }
}

/// Progress notifications published while a run is in progress.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    BatchStarted {
        index: usize,
        total_batches: usize,
        artists: usize,
    },
    ArtistCompleted {
        artist_id: ArtistId,
        releases: usize,
        processed: usize,
        releases_so_far: usize,
    },
    ArtistFailed {
        artist_id: ArtistId,
        error: Error,
        processed: usize,
    },
    RunFinished {
        succeeded: usize,
        failed: usize,
        releases: usize,
        cancelled: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared per-batch state
// ---------------------------------------------------------------------------

/// Hands out artist start slots at least `spacing` apart.
struct StartTicker {
    last: Mutex<Instant>,
}

impl StartTicker {
    fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    /// The next slot: `spacing` after the previous one, and never sooner than
    /// `spacing` from now.
    fn next_slot(&self, spacing: Duration) -> Instant {
        let mut last = self.last.lock();
        let slot = (*last + spacing).max(Instant::now() + spacing);
        *last = slot;
        slot
    }
}

#[derive(Default)]
struct CollectorState {
    outcomes: Vec<RetrievalOutcome>,
    releases_found: usize,
}

/// Append-only results shared by every in-flight artist.
#[derive(Default)]
struct Collector {
    state: Mutex<CollectorState>,
}

impl Collector {
    /// Append an outcome and return `(processed, releases_so_far)`.
    fn push(&self, outcome: RetrievalOutcome) -> (usize, usize) {
        let mut state = self.state.lock();
        state.releases_found += outcome.releases.len();
        state.outcomes.push(outcome);
        (state.outcomes.len(), state.releases_found)
    }

    fn into_report(self, total_artists: usize, cancelled: bool) -> RunReport {
        let outcomes = self.state.into_inner().outcomes;
        let mut report = RunReport {
            total_artists,
            cancelled,
            ..RunReport::default()
        };

        for outcome in &outcomes {
            match &outcome.error {
                None => {
                    report.succeeded_artists += 1;
                    report.releases.extend(outcome.releases.iter().cloned());
                }
                Some(error) => report.failed.push(FailedArtist {
                    artist_id: outcome.artist_id.clone(),
                    artist_name: outcome.artist_name.clone(),
                    error: error.clone(),
                }),
            }
        }
        report.outcomes = outcomes;
        report
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct BatchScheduler {
    retriever: Arc<ReleaseRetriever>,
    options: SchedulerOptions,
    events: Option<broadcast::Sender<ScanEvent>>,
    cancel: CancellationToken,
}

impl BatchScheduler {
    pub fn new(retriever: Arc<ReleaseRetriever>, options: SchedulerOptions) -> Self {
        Self {
            retriever,
            options,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Publish progress on `sender`. Send errors (no receivers) are ignored.
    pub fn with_events(mut self, sender: broadcast::Sender<ScanEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Stop starting new batches and artists once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Retrieve recent releases for every artist.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] as soon as any artist hits it.
    /// - [`Error::AllArtistsFailed`] if at least one artist was attempted and
    ///   none succeeded.
    pub async fn run(&self, artists: &[Artist]) -> Result<RunReport> {
        let batch_size = self.options.batch_size.max(1);
        let concurrency = self.options.concurrency.max(1);
        let total_batches = artists.len().div_ceil(batch_size);
        let collector = Collector::default();

        info!(
            artists = artists.len(),
            batches = total_batches,
            batch_size,
            concurrency,
            window_days = self.options.window_days,
            optimized_search = self.options.use_optimized_search,
            "Starting release scan"
        );

        for (index, batch) in artists.chunks(batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            if index > 0 && !self.pause(self.options.batch_delay).await {
                break;
            }

            debug!(batch = index + 1, total_batches, artists = batch.len(), "Starting batch");
            self.emit(ScanEvent::BatchStarted {
                index,
                total_batches,
                artists: batch.len(),
            });

            let gate = PauseGate::default();
            let ticker = StartTicker::new();
            let mut results = stream::iter(batch.iter().enumerate())
                .map(|(position, artist)| {
                    self.process_artist(artist, position, &ticker, &gate, &collector)
                })
                .buffer_unordered(concurrency);

            while let Some(result) = results.next().await {
                if let Err(e) = result {
                    error!(error = %e, "Aborting scan: catalog rejected credentials");
                    return Err(e);
                }
            }
        }

        let cancelled = self.cancel.is_cancelled();
        let report = collector.into_report(artists.len(), cancelled);

        info!(
            total = report.total_artists,
            succeeded = report.succeeded_artists,
            failed = report.failed.len(),
            releases = report.releases.len(),
            cancelled,
            "Release scan finished"
        );
        self.emit(ScanEvent::RunFinished {
            succeeded: report.succeeded_artists,
            failed: report.failed.len(),
            releases: report.releases.len(),
            cancelled,
        });

        if report.succeeded_artists == 0 && !report.failed.is_empty() {
            return Err(Error::AllArtistsFailed {
                failed: report.failed.len(),
            });
        }

        Ok(report)
    }

    /// Retrieve one artist, retrying once. Only fatal errors are returned;
    /// everything else is recorded in `collector`.
    async fn process_artist(
        &self,
        artist: &Artist,
        position: usize,
        ticker: &StartTicker,
        gate: &PauseGate,
        collector: &Collector,
    ) -> Result<()> {
        if position > 0 && !self.pause_until(ticker.next_slot(self.options.artist_delay)).await {
            return Ok(());
        }
        if self.cancel.is_cancelled() || !self.wait_gate(gate).await {
            return Ok(());
        }

        let first = match self.fetch(artist, gate).await {
            Ok(releases) => {
                self.record(artist, Ok(releases), collector);
                return Ok(());
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => e,
        };

        let ready = if let Some(wait) = first.retry_after() {
            gate.extend(wait);
            warn!(
                artist_id = %artist.id,
                retry_after_secs = wait.as_secs(),
                "Rate limited; pausing batch before retry"
            );
            self.wait_gate(gate).await
        } else if first.is_transient() {
            warn!(artist_id = %artist.id, error = %first, "Retrying artist once");
            self.pause(self.options.retry_backoff).await && self.wait_gate(gate).await
        } else {
            false
        };

        if !ready {
            self.record(artist, Err(first), collector);
            return Ok(());
        }

        match self.fetch(artist, gate).await {
            Err(e) if e.is_fatal() => Err(e),
            result => {
                self.record(artist, result, collector);
                Ok(())
            }
        }
    }

    async fn fetch(&self, artist: &Artist, gate: &PauseGate) -> Result<Vec<RawRelease>> {
        self.retriever
            .fetch_paced(
                artist,
                self.options.window_days,
                self.options.use_optimized_search,
                gate,
            )
            .await
    }

    fn record(&self, artist: &Artist, result: Result<Vec<RawRelease>>, collector: &Collector) {
        let (releases, error) = match result {
            Ok(releases) => (releases, None),
            Err(e) => (Vec::new(), Some(e)),
        };
        let found = releases.len();
        let (processed, releases_so_far) = collector.push(RetrievalOutcome {
            artist_id: artist.id.clone(),
            artist_name: artist.name.clone(),
            releases,
            error: error.clone(),
        });

        match error {
            None => {
                debug!(
                    artist_id = %artist.id,
                    releases = found,
                    processed,
                    releases_so_far,
                    "Artist completed"
                );
                self.emit(ScanEvent::ArtistCompleted {
                    artist_id: artist.id.clone(),
                    releases: found,
                    processed,
                    releases_so_far,
                });
            }
            Some(error) => {
                warn!(
                    artist_id = %artist.id,
                    artist = %artist.name,
                    error = %error,
                    "Giving up on artist"
                );
                self.emit(ScanEvent::ArtistFailed {
                    artist_id: artist.id.clone(),
                    error,
                    processed,
                });
            }
        }
    }

    /// Sleep unless cancelled first. Returns `false` on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = sleep(duration) => true,
            _ = self.cancel.cancelled() => false,
        }
    }

    /// Sleep until `deadline` unless cancelled first.
    async fn pause_until(&self, deadline: Instant) -> bool {
        if deadline <= Instant::now() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = sleep_until(deadline) => true,
            _ = self.cancel.cancelled() => false,
        }
    }

    /// Wait for the batch gate to open unless cancelled first.
    async fn wait_gate(&self, gate: &PauseGate) -> bool {
        tokio::select! {
            _ = gate.wait() => true,
            _ = self.cancel.cancelled() => false,
        }
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
