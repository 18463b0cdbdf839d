//! Trait definition and page types for the remote music catalog.
//!
//! This module defines the [`CatalogGateway`] trait that every catalog
//! backend implements, along with the paging types its endpoints share. Each
//! method is a single logical request: gateways never retry, so backoff stays
//! with the callers that know which artist a failure belongs to.

use async_trait::async_trait;
use newreleases_common::{
    Artist, ArtistId, PartialDate, RawRelease, ReleaseId, ReleaseType, Result,
};
use serde::{Deserialize, Serialize};

use crate::merge::ArtistRecord;

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// Position of a page within a paginated endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// Zero-based item offset (discography, saved items, search).
    Offset(u32),
    /// Opaque cursor (followed artists).
    After(String),
}

/// Request for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of items to return.
    pub limit: u32,
    /// Where to start; `None` means the first page.
    pub token: Option<PageToken>,
}

impl PageRequest {
    /// First page of `limit` items.
    pub fn first(limit: u32) -> Self {
        Self { limit, token: None }
    }

    /// Page starting at `offset`.
    pub fn at_offset(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            token: Some(PageToken::Offset(offset)),
        }
    }

    /// Item offset requested, or 0 for cursor and first-page requests.
    pub fn offset(&self) -> u32 {
        match self.token {
            Some(PageToken::Offset(offset)) => offset,
            _ => 0,
        }
    }

    /// Cursor requested, if any.
    pub fn after(&self) -> Option<&str> {
        match &self.token {
            Some(PageToken::After(cursor)) => Some(cursor),
            _ => None,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total items across all pages, when the endpoint declares it.
    pub total: Option<u32>,
    /// Token for the following page; `None` on the last page.
    pub next: Option<PageToken>,
}

impl<T> Page<T> {
    /// A page with no items and nothing after it.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Some(0),
            next: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

/// An artist credited on a catalog release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: ArtistId,
    pub name: String,
}

/// A release as the catalog returns it, credited to one or more artists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRelease {
    pub id: ReleaseId,
    pub name: String,
    pub release_type: ReleaseType,
    pub track_count: u32,
    pub release_date: Option<PartialDate>,
    pub artists: Vec<ArtistRef>,
    pub url: Option<String>,
}

impl CatalogRelease {
    /// Whether `artist_id` is among the credited artists.
    pub fn credits(&self, artist_id: &ArtistId) -> bool {
        self.artists.iter().any(|a| &a.id == artist_id)
    }

    /// Attribute this release to the artist it was retrieved for.
    pub fn into_raw(self, artist: &Artist) -> RawRelease {
        RawRelease {
            id: self.id,
            name: self.name,
            release_type: self.release_type,
            track_count: self.track_count,
            release_date: self.release_date,
            artist_id: artist.id.clone(),
            artist_name: artist.name.clone(),
            url: self.url,
        }
    }
}

/// Search predicate for the catalog's release search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Exact artist name filter.
    pub artist_name: String,
    /// Restrict to the catalog's "new releases" tag.
    pub new_releases_only: bool,
}

impl SearchQuery {
    pub fn by_artist(artist_name: impl Into<String>) -> Self {
        Self {
            artist_name: artist_name.into(),
            new_releases_only: false,
        }
    }

    pub fn new_releases_by(artist_name: impl Into<String>) -> Self {
        Self {
            artist_name: artist_name.into(),
            new_releases_only: true,
        }
    }

    /// Render the query string understood by the search endpoint.
    pub fn render(&self) -> String {
        let name = self.artist_name.replace('"', "");
        if self.new_releases_only {
            format!("artist:\"{name}\" tag:new")
        } else {
            format!("artist:\"{name}\"")
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Async trait over the remote catalog's paginated endpoints.
///
/// Implementations map transport outcomes onto the shared error taxonomy
/// (`RateLimited`, `Unauthorized`, `NotFound`, `Server`, `Network`) and must
/// not retry internally.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Short, lowercase identifier for this backend (e.g. `"http"`).
    fn name(&self) -> &'static str;

    /// One page of an artist's discography (albums and singles), newest first.
    async fn artist_releases(
        &self,
        artist_id: &ArtistId,
        page: PageRequest,
    ) -> Result<Page<CatalogRelease>>;

    /// One page of release search results, in no particular order.
    async fn search_releases(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Page<CatalogRelease>>;

    /// One page of the artists the user follows (cursor paginated).
    async fn followed_artists(&self, page: PageRequest) -> Result<Page<ArtistRecord>>;

    /// Artists credited on one page of the user's liked tracks.
    async fn saved_tracks(&self, page: PageRequest) -> Result<Page<ArtistRecord>>;

    /// Artists credited on one page of the user's saved albums.
    async fn saved_albums(&self, page: PageRequest) -> Result<Page<ArtistRecord>>;
}
