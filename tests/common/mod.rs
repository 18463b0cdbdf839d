//! Shared helpers for integration tests.
//!
//! Builds catalog-shaped JSON bodies for [`wiremock`] and a
//! [`CatalogConfig`] pointing at a mock server.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use newreleases::config::CatalogConfig;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Catalog settings aimed at `server`, with a generous request budget.
pub fn catalog_config(server: &MockServer) -> CatalogConfig {
    CatalogConfig {
        base_url: server.uri(),
        access_token: Some("test-token".into()),
        requests_per_second: 1000,
        timeout_secs: 5,
        ..CatalogConfig::default()
    }
}

/// `YYYY-MM-DD` for the day `days` before today (UTC).
pub fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days))
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

pub fn artist_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "artist",
        "external_urls": { "spotify": format!("https://open.example/artist/{id}") },
    })
}

pub fn album_json(id: &str, artist_id: &str, album_type: &str, tracks: u32, release_date: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Record {id}"),
        "album_type": album_type,
        "album_group": album_type,
        "total_tracks": tracks,
        "release_date": release_date,
        "release_date_precision": "day",
        "artists": [artist_json(artist_id, &artist_id.to_uppercase())],
        "external_urls": { "spotify": format!("https://open.example/album/{id}") },
    })
}

/// An offset-paginated envelope.
pub fn paging_json(items: Vec<Value>, offset: u32, limit: u32, total: u32) -> Value {
    let end = offset + items.len() as u32;
    let next = (end < total).then(|| format!("https://api.example/next?offset={end}&limit={limit}"));
    json!({
        "items": items,
        "limit": limit,
        "offset": offset,
        "total": total,
        "next": next,
    })
}

/// Liked-tracks envelope crediting each listed artist on its own track.
pub fn saved_tracks_json(artists: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = artists
        .iter()
        .map(|(id, name)| json!({ "track": { "name": "Song", "artists": [artist_json(id, name)] } }))
        .collect();
    let total = items.len() as u32;
    paging_json(items, 0, 50, total)
}

/// Saved-albums envelope.
pub fn saved_albums_json(artists: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = artists
        .iter()
        .map(|(id, name)| json!({ "album": { "name": "Album", "artists": [artist_json(id, name)] } }))
        .collect();
    let total = items.len() as u32;
    paging_json(items, 0, 50, total)
}

/// Followed-artists envelope with no further pages.
pub fn following_json(artists: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = artists.iter().map(|(id, name)| artist_json(id, name)).collect();
    json!({
        "artists": {
            "items": items,
            "total": artists.len(),
            "next": null,
            "cursors": { "after": null },
        }
    })
}
