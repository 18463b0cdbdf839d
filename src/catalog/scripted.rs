//! In-memory catalog used by unit tests.
//!
//! Serves fixed discographies page by page, answers searches from a table
//! keyed by rendered query, and can be told to fail specific calls first.
//! Discography calls are timestamped on tokio's clock so paused-time tests can
//! check when each request went out.

use std::collections::{HashMap, VecDeque};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use newreleases_common::{ArtistId, Error, PartialDate, ReleaseId, ReleaseType, Result};
use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

use super::gateway::{
    ArtistRef, CatalogGateway, CatalogRelease, Page, PageRequest, PageToken, SearchQuery,
};
use crate::merge::ArtistRecord;

#[derive(Default)]
pub struct ScriptedCatalog {
    discographies: HashMap<ArtistId, Vec<CatalogRelease>>,
    searches: HashMap<String, Result<Vec<CatalogRelease>>>,
    followed: Vec<ArtistRecord>,
    saved_tracks: Vec<ArtistRecord>,
    saved_albums: Vec<ArtistRecord>,
    release_failures: Mutex<HashMap<ArtistId, VecDeque<Error>>>,
    release_calls: Mutex<Vec<(ArtistId, u32, Instant)>>,
    search_calls: Mutex<Vec<String>>,
    page_delay: StdDuration,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discography(mut self, artist: &str, releases: Vec<CatalogRelease>) -> Self {
        self.discographies.insert(ArtistId::from(artist), releases);
        self
    }

    pub fn with_search(mut self, query: &SearchQuery, outcome: Result<Vec<CatalogRelease>>) -> Self {
        self.searches.insert(query.render(), outcome);
        self
    }

    pub fn with_followed(mut self, records: Vec<ArtistRecord>) -> Self {
        self.followed = records;
        self
    }

    pub fn with_saved_tracks(mut self, records: Vec<ArtistRecord>) -> Self {
        self.saved_tracks = records;
        self
    }

    pub fn with_saved_albums(mut self, records: Vec<ArtistRecord>) -> Self {
        self.saved_albums = records;
        self
    }

    /// Sleep `delay` before answering each discography call not queued to fail.
    pub fn with_page_delay(mut self, delay: StdDuration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Queue errors returned by the next discography calls for `artist`.
    pub fn failing_releases(self, artist: &str, errors: Vec<Error>) -> Self {
        self.release_failures
            .lock()
            .insert(ArtistId::from(artist), errors.into());
        self
    }

    pub fn release_calls(&self, artist: &str) -> usize {
        let id = ArtistId::from(artist);
        self.release_calls.lock().iter().filter(|(a, _, _)| *a == id).count()
    }

    /// When each discography request for `artist` was issued, in order.
    pub fn release_call_times(&self, artist: &str) -> Vec<Instant> {
        let id = ArtistId::from(artist);
        self.release_calls
            .lock()
            .iter()
            .filter(|(a, _, _)| *a == id)
            .map(|(_, _, at)| *at)
            .collect()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().clone()
    }
}

fn offset_page<T: Clone>(items: &[T], page: &PageRequest) -> Page<T> {
    let start = (page.offset() as usize).min(items.len());
    let end = (start + page.limit as usize).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        total: Some(items.len() as u32),
        next: (end < items.len()).then(|| PageToken::Offset(end as u32)),
    }
}

#[async_trait]
impl CatalogGateway for ScriptedCatalog {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn artist_releases(
        &self,
        artist_id: &ArtistId,
        page: PageRequest,
    ) -> Result<Page<CatalogRelease>> {
        self.release_calls
            .lock()
            .push((artist_id.clone(), page.offset(), Instant::now()));

        if let Some(err) = self
            .release_failures
            .lock()
            .get_mut(artist_id)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }

        if !self.page_delay.is_zero() {
            sleep(self.page_delay).await;
        }

        match self.discographies.get(artist_id) {
            Some(releases) => Ok(offset_page(releases, &page)),
            None => Err(Error::not_found(format!("/artists/{artist_id}/albums"))),
        }
    }

    async fn search_releases(
        &self,
        query: &SearchQuery,
        _page: PageRequest,
    ) -> Result<Page<CatalogRelease>> {
        let rendered = query.render();
        self.search_calls.lock().push(rendered.clone());

        match self.searches.get(&rendered) {
            Some(Ok(items)) => Ok(Page {
                items: items.clone(),
                total: Some(items.len() as u32),
                next: None,
            }),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(Page::empty()),
        }
    }

    async fn followed_artists(&self, page: PageRequest) -> Result<Page<ArtistRecord>> {
        let offset = page.after().and_then(|c| c.parse::<u32>().ok()).unwrap_or(0);
        let mut out = offset_page(&self.followed, &PageRequest::at_offset(page.limit, offset));
        out.next = out.next.map(|token| match token {
            PageToken::Offset(n) => PageToken::After(n.to_string()),
            other => other,
        });
        Ok(out)
    }

    async fn saved_tracks(&self, page: PageRequest) -> Result<Page<ArtistRecord>> {
        Ok(offset_page(&self.saved_tracks, &page))
    }

    async fn saved_albums(&self, page: PageRequest) -> Result<Page<ArtistRecord>> {
        Ok(offset_page(&self.saved_albums, &page))
    }
}

/// A release credited to `artist`, released `days_ago` days before `now`.
pub fn release_days_ago(
    id: &str,
    artist: &str,
    release_type: ReleaseType,
    track_count: u32,
    now: DateTime<Utc>,
    days_ago: i64,
) -> CatalogRelease {
    let date = (now - Duration::days(days_ago)).date_naive();
    CatalogRelease {
        id: ReleaseId::from(id),
        name: format!("Release {id}"),
        release_type,
        track_count,
        release_date: Some(PartialDate::from_naive(date)),
        artists: vec![ArtistRef {
            id: ArtistId::from(artist),
            name: artist.to_uppercase(),
        }],
        url: None,
    }
}

/// A full discography for `artist`: one album per entry of `ages`, newest first.
pub fn discography(artist: &str, now: DateTime<Utc>, ages: &[i64]) -> Vec<CatalogRelease> {
    ages.iter()
        .enumerate()
        .map(|(i, days)| {
            release_days_ago(&format!("{artist}-{i}"), artist, ReleaseType::Album, 10, now, *days)
        })
        .collect()
}
