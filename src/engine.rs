//! End-to-end release aggregation.
//!
//! The [`ReleaseEngine`] wires the pipeline together: collect every artist
//! source, merge into a unique artist set, retrieve recent releases through
//! the [`BatchScheduler`], then classify and sort the union.
//!
//! # Example
//!
//! ```rust,ignore
//! let gateway: Arc<dyn CatalogGateway> = Arc::new(HttpCatalog::new(&config.catalog)?);
//! let engine = ReleaseEngine::new(gateway.clone(), EngineOptions::from_config(&config));
//! let output = engine.run(CatalogArtistSource::enabled(gateway, &config.sources)).await?;
//! for release in &output.releases {
//!     println!("{} - {}", release.release.artist_name, release.release.name);
//! }
//! ```

use std::sync::Arc;

use newreleases_common::{ArtistId, ClassifiedRelease, Result, SourceTag};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::CatalogGateway;
use crate::classify;
use crate::config::Config;
use crate::merge::{ArtistRecord, MergeAccumulator, MergeReport};
use crate::retrieval::{ReleaseRetriever, RetrieverOptions};
use crate::scheduler::{BatchScheduler, ScanEvent, SchedulerOptions};
use crate::sources::ArtistSource;

/// Everything the engine needs besides the gateway.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub retriever: RetrieverOptions,
    pub scheduler: SchedulerOptions,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retriever: RetrieverOptions::from(&config.scan),
            scheduler: SchedulerOptions::from_config(&config.scheduler, &config.scan),
        }
    }

    /// Override the recency window.
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.scheduler.window_days = days;
        self
    }

    /// Override the retrieval strategy toggle.
    pub fn with_optimized_search(mut self, enabled: bool) -> Self {
        self.scheduler.use_optimized_search = enabled;
        self
    }
}

/// Run-level counts handed to rendering collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_artists: usize,
    pub succeeded_artists: usize,
    pub failed_artist_ids: Vec<ArtistId>,
    pub total_releases_found: usize,
    pub cancelled: bool,
}

/// Final product of a run.
#[derive(Debug, Clone, Serialize)]
pub struct EngineOutput {
    /// Classified releases, newest first.
    pub releases: Vec<ClassifiedRelease>,
    pub summary: RunSummary,
    pub merge: MergeReport,
}

pub struct ReleaseEngine {
    gateway: Arc<dyn CatalogGateway>,
    options: EngineOptions,
    events: Option<broadcast::Sender<ScanEvent>>,
    cancel: CancellationToken,
}

impl ReleaseEngine {
    pub fn new(gateway: Arc<dyn CatalogGateway>, options: EngineOptions) -> Self {
        Self {
            gateway,
            options,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Forward scheduler progress to `sender`.
    pub fn with_events(mut self, sender: broadcast::Sender<ScanEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Collect, merge, retrieve, classify.
    ///
    /// # Errors
    ///
    /// Fails only on an authentication failure (from a source or the
    /// catalog) or when every attempted artist failed. A source that fails
    /// for any other reason is skipped with a warning.
    pub async fn run(&self, sources: Vec<Box<dyn ArtistSource>>) -> Result<EngineOutput> {
        let mut collected: Vec<(SourceTag, Vec<ArtistRecord>)> = Vec::with_capacity(sources.len());

        for source in &sources {
            if self.cancel.is_cancelled() {
                break;
            }
            let tag = source.tag();
            match source.fetch().await {
                Ok(records) => collected.push((tag, records)),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(source = %tag, error = %e, "Skipping artist source"),
            }
        }

        collected.sort_by_key(|(tag, _)| SourceTag::ALL.iter().position(|t| t == tag));

        let merged = collected
            .into_iter()
            .fold(MergeAccumulator::new(), |acc, (tag, records)| acc.absorb(tag, records))
            .finish();

        let retriever = ReleaseRetriever::new(self.gateway.clone(), self.options.retriever.clone());
        let mut scheduler = BatchScheduler::new(Arc::new(retriever), self.options.scheduler.clone())
            .with_cancellation(self.cancel.clone());
        if let Some(tx) = &self.events {
            scheduler = scheduler.with_events(tx.clone());
        }

        let report = scheduler.run(&merged.artists).await?;
        let failed_artist_ids = report.failed_artist_ids();
        let releases = classify::filter_and_sort(report.releases, self.options.scheduler.window_days);

        let summary = RunSummary {
            total_artists: report.total_artists,
            succeeded_artists: report.succeeded_artists,
            failed_artist_ids,
            total_releases_found: releases.len(),
            cancelled: report.cancelled,
        };

        info!(
            artists = summary.total_artists,
            succeeded = summary.succeeded_artists,
            failed = summary.failed_artist_ids.len(),
            releases = summary.total_releases_found,
            gateway = self.gateway.name(),
            "Aggregation complete"
        );

        Ok(EngineOutput {
            releases,
            summary,
            merge: merged.report,
        })
    }
}
