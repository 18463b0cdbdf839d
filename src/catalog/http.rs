//! HTTP catalog gateway.
//!
//! Implements [`CatalogGateway`] against the catalog's JSON web API.
//!
//! Features:
//! - Token-bucket rate limiting at `requests_per_second` via [`governor`].
//! - Bearer authentication with a token supplied by the auth collaborator.
//! - Status mapping onto the shared error taxonomy, carrying the
//!   `Retry-After` hint on HTTP 429.
//! - No retries: one call, one request.

use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use newreleases_common::{
    ArtistId, Error, PartialDate, ReleaseId, ReleaseType, Result,
};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::gateway::{
    ArtistRef, CatalogGateway, CatalogRelease, Page, PageRequest, PageToken, SearchQuery,
};
use crate::config::CatalogConfig;
use crate::merge::ArtistRecord;

/// Release groups requested from the discography endpoint.
const INCLUDE_GROUPS: &str = "album,single";

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CursorPaging<T> {
    items: Vec<T>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    cursors: Option<Cursors>,
}

#[derive(Debug, Deserialize)]
struct Cursors {
    after: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireArtist {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    external_urls: ExternalUrls,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    popularity: Option<u8>,
    #[serde(default)]
    followers: Option<Followers>,
}

#[derive(Debug, Deserialize)]
struct Followers {
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireAlbum {
    id: String,
    name: String,
    album_type: ReleaseType,
    #[serde(default)]
    album_group: Option<String>,
    #[serde(default)]
    total_tracks: u32,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    artists: Vec<WireArtist>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    albums: Option<Paging<WireAlbum>>,
}

#[derive(Debug, Deserialize)]
struct FollowingResponse {
    artists: CursorPaging<WireArtist>,
}

#[derive(Debug, Deserialize)]
struct SavedTrack {
    track: Option<TrackArtists>,
}

#[derive(Debug, Deserialize)]
struct SavedAlbum {
    album: Option<TrackArtists>,
}

#[derive(Debug, Deserialize)]
struct TrackArtists {
    #[serde(default)]
    artists: Vec<WireArtist>,
}

// ---------------------------------------------------------------------------
// Gateway implementation
// ---------------------------------------------------------------------------

/// Catalog gateway backed by the catalog's HTTP API.
///
/// # Examples
///
/// ```no_run
/// use newreleases::catalog::HttpCatalog;
/// use newreleases::config::CatalogConfig;
///
/// let config = CatalogConfig {
///     access_token: Some("token".into()),
///     ..CatalogConfig::default()
/// };
/// let catalog = HttpCatalog::new(&config).unwrap();
/// ```
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    market: Option<String>,
    rate_limiter: DefaultDirectRateLimiter,
}

impl HttpCatalog {
    /// Build a gateway from catalog settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when no access token is available and
    /// [`Error::InvalidInput`] for an unusable request budget.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let access_token = config.resolve_access_token().ok_or_else(|| {
            Error::unauthorized("no access token configured; authenticate and set catalog.access_token")
        })?;

        let per_second = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| Error::invalid_input("requests_per_second must be at least 1"))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token,
            market: config.market.clone(),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Execute one rate-limited GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = self.url(path);
        debug!(url = %url, ?query, "Catalog request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::network(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = response.text().await.unwrap_or_default();
            let err = error_for_status(status, retry_after.as_deref(), path, &body);
            warn!(path, status = status.as_u16(), error = %err, "Catalog request failed");
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::decode(format!("unexpected response from {path}: {e}")))
    }

    /// Offset and limit parameters plus the market, when configured.
    fn paging_query(&self, page: &PageRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", page.limit.to_string()),
            ("offset", page.offset().to_string()),
        ];
        if let Some(market) = &self.market {
            query.push(("market", market.clone()));
        }
        query
    }
}

/// Map a non-success status onto the error taxonomy.
fn error_for_status(status: StatusCode, retry_after: Option<&str>, path: &str, body: &str) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Error::rate_limited(retry_after.and_then(parse_retry_after)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::unauthorized(format!("catalog rejected credentials for {path}"))
        }
        StatusCode::NOT_FOUND => Error::not_found(path.to_string()),
        _ => {
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("unexpected status").to_string()
            } else {
                body.chars().take(200).collect()
            };
            Error::server(status.as_u16(), message)
        }
    }
}

/// Parse a `Retry-After` value given in (possibly fractional) seconds.
fn parse_retry_after(value: &str) -> Option<std::time::Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(std::time::Duration::from_secs(secs));
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| std::time::Duration::from_secs(secs.ceil() as u64))
}

/// Next offset token for an offset-paginated response.
fn next_offset<T>(paging: &Paging<T>, page: &PageRequest) -> Option<PageToken> {
    paging.next.as_ref()?;
    let start = paging.offset.unwrap_or_else(|| page.offset());
    Some(PageToken::Offset(start + paging.items.len() as u32))
}

fn to_artist_record(artist: WireArtist) -> ArtistRecord {
    ArtistRecord {
        id: artist.id.unwrap_or_default(),
        name: artist.name,
        profile_url: artist.external_urls.spotify.unwrap_or_default(),
        genres: artist.genres,
        popularity: artist.popularity,
        follower_count: artist.followers.and_then(|f| f.total),
    }
}

fn to_catalog_release(album: WireAlbum) -> CatalogRelease {
    let release_type = match album.album_group.as_deref() {
        Some("appears_on") => ReleaseType::AppearsOn,
        _ => album.album_type,
    };

    let release_date = album.release_date.as_deref().and_then(|raw| {
        PartialDate::parse(raw)
            .map_err(|e| debug!(release_id = %album.id, error = %e, "Unparsable release date"))
            .ok()
    });

    CatalogRelease {
        id: ReleaseId::from(album.id),
        name: album.name,
        release_type,
        track_count: album.total_tracks,
        release_date,
        artists: album
            .artists
            .into_iter()
            .filter_map(|a| {
                a.id.map(|id| ArtistRef {
                    id: ArtistId::from(id),
                    name: a.name,
                })
            })
            .collect(),
        url: album.external_urls.spotify,
    }
}

#[async_trait]
impl CatalogGateway for HttpCatalog {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn artist_releases(
        &self,
        artist_id: &ArtistId,
        page: PageRequest,
    ) -> Result<Page<CatalogRelease>> {
        let mut query = self.paging_query(&page);
        query.push(("include_groups", INCLUDE_GROUPS.to_string()));

        let paging: Paging<WireAlbum> = self
            .get_json(&format!("/artists/{artist_id}/albums"), &query)
            .await?;

        let next = next_offset(&paging, &page);
        Ok(Page {
            total: paging.total,
            next,
            items: paging.items.into_iter().map(to_catalog_release).collect(),
        })
    }

    async fn search_releases(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Page<CatalogRelease>> {
        let mut params = self.paging_query(&page);
        params.push(("q", query.render()));
        params.push(("type", "album".to_string()));

        let response: SearchResponse = self.get_json("/search", &params).await?;
        let Some(paging) = response.albums else {
            return Ok(Page::empty());
        };

        let next = next_offset(&paging, &page);
        Ok(Page {
            total: paging.total,
            next,
            items: paging.items.into_iter().map(to_catalog_release).collect(),
        })
    }

    async fn followed_artists(&self, page: PageRequest) -> Result<Page<ArtistRecord>> {
        let mut query = vec![
            ("type", "artist".to_string()),
            ("limit", page.limit.to_string()),
        ];
        if let Some(after) = page.after() {
            query.push(("after", after.to_string()));
        }

        let response: FollowingResponse = self.get_json("/me/following", &query).await?;
        let paging = response.artists;

        let next = match (&paging.next, paging.cursors.and_then(|c| c.after)) {
            (Some(_), Some(after)) => Some(PageToken::After(after)),
            _ => None,
        };

        Ok(Page {
            total: paging.total,
            next,
            items: paging.items.into_iter().map(to_artist_record).collect(),
        })
    }

    async fn saved_tracks(&self, page: PageRequest) -> Result<Page<ArtistRecord>> {
        let query = self.paging_query(&page);
        let paging: Paging<SavedTrack> = self.get_json("/me/tracks", &query).await?;

        let next = next_offset(&paging, &page);
        Ok(Page {
            total: paging.total,
            next,
            items: paging
                .items
                .into_iter()
                .filter_map(|saved| saved.track)
                .flat_map(|track| track.artists)
                .map(to_artist_record)
                .collect(),
        })
    }

    async fn saved_albums(&self, page: PageRequest) -> Result<Page<ArtistRecord>> {
        let query = self.paging_query(&page);
        let paging: Paging<SavedAlbum> = self.get_json("/me/albums", &query).await?;

        let next = next_offset(&paging, &page);
        Ok(Page {
            total: paging.total,
            next,
            items: paging
                .items
                .into_iter()
                .filter_map(|saved| saved.album)
                .flat_map(|album| album.artists)
                .map(to_artist_record)
                .collect(),
        })
    }
}
