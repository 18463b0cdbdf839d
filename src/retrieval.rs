//! Per-artist release retrieval.
//!
//! Two strategies fetch an artist's recent releases:
//!
//! - **Optimized search** (opt-in): one search combining an exact-artist
//!   filter with the catalog's "new releases" tag. If that query errors, the
//!   same strategy retries once without the tag and filters by date
//!   client-side. An empty or failed search falls through to the scan.
//! - **Paginated scan** (default): walks the artist's discography, which the
//!   catalog returns newest first, and stops at the first release older than
//!   the recency window.
//!
//! Rate limits are never retried here; they surface to the scheduler, which
//! throttles the whole batch. Every catalog request first waits on the
//! caller's [`PauseGate`], so a pause raised by one artist also holds back
//! scans that are already in progress.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use newreleases_common::{Artist, Error, RawRelease, Result};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogGateway, CatalogRelease, PageRequest, SearchQuery};
use crate::config::ScanConfig;

/// Results requested from a single search call.
const SEARCH_LIMIT: u32 = 50;

/// Tunables for [`ReleaseRetriever`].
#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    /// Discography items requested per page.
    pub page_size: u32,
    /// Hard cap on discography pages per artist.
    pub max_pages: u32,
    /// Keep scanning past an out-of-window item once the catalog has been
    /// seen returning releases out of date order.
    pub verify_ordering: bool,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for RetrieverOptions {
    fn from(scan: &ScanConfig) -> Self {
        Self {
            page_size: scan.page_size,
            max_pages: scan.max_pages,
            verify_ordering: scan.verify_ordering,
        }
    }
}

/// Which strategy produced a retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// Search answered with at least one matching release.
    OptimizedSearch,
    /// Search was tried, came back empty or failed, and the scan ran.
    FallbackScan,
    /// Only the scan ran.
    PaginatedScan,
}

/// Releases retrieved for one artist plus how they were obtained.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub releases: Vec<RawRelease>,
    pub strategy: RetrievalStrategy,
    /// Discography pages requested (search calls are not counted).
    pub pages_requested: u32,
    /// The discography was observed out of date order.
    pub out_of_order: bool,
}

enum State {
    TryOptimized,
    OptimizedSuccess(Vec<RawRelease>),
    OptimizedEmptyFallback,
    PaginatedScan { after_search: bool },
    Done(Retrieval),
}

struct ScanOutcome {
    releases: Vec<RawRelease>,
    pages: u32,
    out_of_order: bool,
}

/// A shared "no requests before" instant. Only ever moves later.
#[derive(Debug, Default)]
pub struct PauseGate {
    until: Mutex<Option<Instant>>,
}

impl PauseGate {
    /// Hold every request back for at least `wait` from now.
    pub fn extend(&self, wait: Duration) {
        let target = Instant::now() + wait;
        let mut until = self.until.lock();
        if until.map_or(true, |current| current < target) {
            *until = Some(target);
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        *self.until.lock()
    }

    /// Resolve once the gate is open. The deadline may move while waiting.
    pub async fn wait(&self) {
        while let Some(deadline) = self.deadline() {
            if deadline <= Instant::now() {
                return;
            }
            sleep_until(deadline).await;
        }
    }
}

/// Retrieves recent releases for one artist at a time.
pub struct ReleaseRetriever {
    gateway: Arc<dyn CatalogGateway>,
    options: RetrieverOptions,
}

impl ReleaseRetriever {
    pub fn new(gateway: Arc<dyn CatalogGateway>, options: RetrieverOptions) -> Self {
        Self { gateway, options }
    }

    /// Recent releases for `artist`, judged against the current time.
    pub async fn fetch_for_artist(
        &self,
        artist: &Artist,
        window_days: u32,
        use_optimized_search: bool,
    ) -> Result<Vec<RawRelease>> {
        self.retrieve(artist, window_days, use_optimized_search, Utc::now())
            .await
            .map(|r| r.releases)
    }

    /// Like [`fetch_for_artist`](Self::fetch_for_artist), with every catalog
    /// request held until `gate` is open.
    pub async fn fetch_paced(
        &self,
        artist: &Artist,
        window_days: u32,
        use_optimized_search: bool,
        gate: &PauseGate,
    ) -> Result<Vec<RawRelease>> {
        self.retrieve_paced(artist, window_days, use_optimized_search, Utc::now(), gate)
            .await
            .map(|r| r.releases)
    }

    /// Run the strategy state machine for one artist.
    ///
    /// # Errors
    ///
    /// `RateLimited`, `Unauthorized`, `Server`, `Network` and `Decode` errors
    /// from the discography scan are returned unchanged. `NotFound` yields an
    /// empty result.
    pub async fn retrieve(
        &self,
        artist: &Artist,
        window_days: u32,
        use_optimized_search: bool,
        now: DateTime<Utc>,
    ) -> Result<Retrieval> {
        self.retrieve_paced(artist, window_days, use_optimized_search, now, &PauseGate::default())
            .await
    }

    /// [`retrieve`](Self::retrieve) gated request by request on `gate`.
    pub async fn retrieve_paced(
        &self,
        artist: &Artist,
        window_days: u32,
        use_optimized_search: bool,
        now: DateTime<Utc>,
        gate: &PauseGate,
    ) -> Result<Retrieval> {
        let mut state = if use_optimized_search {
            State::TryOptimized
        } else {
            State::PaginatedScan { after_search: false }
        };

        loop {
            state = match state {
                State::TryOptimized => match self.optimized(artist, window_days, now, gate).await {
                    Ok(releases) if !releases.is_empty() => State::OptimizedSuccess(releases),
                    Ok(_) => {
                        debug!(artist_id = %artist.id, "Optimized search found nothing; scanning");
                        State::OptimizedEmptyFallback
                    }
                    Err(e) if ends_optimized(&e) => return Err(e),
                    Err(e) => {
                        warn!(
                            artist_id = %artist.id,
                            error = %e,
                            "Optimized search failed twice; scanning discography"
                        );
                        State::OptimizedEmptyFallback
                    }
                },
                State::OptimizedSuccess(releases) => State::Done(Retrieval {
                    releases,
                    strategy: RetrievalStrategy::OptimizedSearch,
                    pages_requested: 0,
                    out_of_order: false,
                }),
                State::OptimizedEmptyFallback => State::PaginatedScan { after_search: true },
                State::PaginatedScan { after_search } => {
                    let scan = self.paginated_scan(artist, window_days, now, gate).await?;
                    State::Done(Retrieval {
                        releases: scan.releases,
                        strategy: if after_search {
                            RetrievalStrategy::FallbackScan
                        } else {
                            RetrievalStrategy::PaginatedScan
                        },
                        pages_requested: scan.pages,
                        out_of_order: scan.out_of_order,
                    })
                }
                State::Done(retrieval) => {
                    info!(
                        artist_id = %artist.id,
                        artist = %artist.name,
                        releases = retrieval.releases.len(),
                        pages = retrieval.pages_requested,
                        strategy = ?retrieval.strategy,
                        "Retrieved releases"
                    );
                    return Ok(retrieval);
                }
            };
        }
    }

    /// Search with the recency tag, then without it if that query errors.
    async fn optimized(
        &self,
        artist: &Artist,
        window_days: u32,
        now: DateTime<Utc>,
        gate: &PauseGate,
    ) -> Result<Vec<RawRelease>> {
        let hits = match self.search(&SearchQuery::new_releases_by(&artist.name), gate).await {
            Ok(hits) => hits,
            Err(e) if ends_optimized(&e) => return Err(e),
            Err(e) => {
                debug!(
                    artist_id = %artist.id,
                    error = %e,
                    "Tagged search failed; retrying without recency tag"
                );
                self.search(&SearchQuery::by_artist(&artist.name), gate).await?
            }
        };

        Ok(hits
            .into_iter()
            .filter(|hit| hit.credits(&artist.id))
            .filter(|hit| {
                hit.release_date
                    .is_some_and(|date| date.is_within(window_days, now))
            })
            .map(|hit| hit.into_raw(artist))
            .collect())
    }

    async fn search(&self, query: &SearchQuery, gate: &PauseGate) -> Result<Vec<CatalogRelease>> {
        gate.wait().await;
        match self
            .gateway
            .search_releases(query, PageRequest::first(SEARCH_LIMIT))
            .await
        {
            Ok(page) => Ok(page.items),
            Err(Error::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Walk the discography newest first until the window is left behind.
    async fn paginated_scan(
        &self,
        artist: &Artist,
        window_days: u32,
        now: DateTime<Utc>,
        gate: &PauseGate,
    ) -> Result<ScanOutcome> {
        let page_size = self.options.page_size.max(1);
        let mut outcome = ScanOutcome {
            releases: Vec::new(),
            pages: 0,
            out_of_order: false,
        };
        let mut offset = 0u32;
        let mut previous: Option<DateTime<Utc>> = None;

        loop {
            if outcome.pages >= self.options.max_pages {
                warn!(
                    artist_id = %artist.id,
                    max_pages = self.options.max_pages,
                    "Stopping discography scan at page limit"
                );
                break;
            }

            gate.wait().await;
            let page = match self
                .gateway
                .artist_releases(&artist.id, PageRequest::at_offset(page_size, offset))
                .await
            {
                Ok(page) => page,
                Err(Error::NotFound(_)) => {
                    debug!(artist_id = %artist.id, "Artist not found; treating as no releases");
                    break;
                }
                Err(e) => return Err(e),
            };
            outcome.pages += 1;

            let received = page.items.len() as u32;
            let mut left_window = false;

            for item in page.items {
                let Some(date) = item.release_date else {
                    debug!(release_id = %item.id, "Skipping release without a usable date");
                    continue;
                };

                let instant = date.to_comparable_instant();
                if previous.is_some_and(|prev| instant > prev) && !outcome.out_of_order {
                    outcome.out_of_order = true;
                    warn!(
                        artist_id = %artist.id,
                        release_id = %item.id,
                        verify = self.options.verify_ordering,
                        "Discography returned out of date order"
                    );
                }
                previous = Some(instant);

                if date.is_within(window_days, now) {
                    outcome.releases.push(item.into_raw(artist));
                } else if !(self.options.verify_ordering && outcome.out_of_order) {
                    left_window = true;
                    break;
                }
            }

            if left_window || received < page_size || page.next.is_none() {
                break;
            }
            offset += received;
            if page.total.is_some_and(|total| offset >= total) {
                break;
            }
        }

        Ok(outcome)
    }
}

/// Errors that say nothing about search-endpoint health and must reach the
/// scheduler as they are.
fn ends_optimized(err: &Error) -> bool {
    err.is_fatal() || err.retry_after().is_some()
}
