use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when `catalog.access_token` is unset.
pub const ACCESS_TOKEN_ENV: &str = "NEWRELEASES_ACCESS_TOKEN";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog web API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token supplied by the auth collaborator
    #[serde(default)]
    pub access_token: Option<String>,

    /// Market (ISO 3166-1 alpha-2) used to filter releases
    #[serde(default)]
    pub market: Option<String>,

    /// Client-side request budget
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Per-request transport timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}
fn default_requests_per_second() -> u32 {
    10
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            market: None,
            requests_per_second: default_requests_per_second(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Token from the config file, falling back to [`ACCESS_TOKEN_ENV`].
    pub fn resolve_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Recency window in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Try the search endpoint before scanning discographies
    #[serde(default)]
    pub use_optimized_search: bool,

    /// Items per discography page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on discography pages per artist
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Detect out-of-order discography pages and fall back to a full scan
    #[serde(default)]
    pub verify_ordering: bool,
}

fn default_window_days() -> u32 {
    10
}
fn default_page_size() -> u32 {
    20
}
fn default_max_pages() -> u32 {
    50
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            use_optimized_search: false,
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            verify_ordering: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Artists in flight at once within a batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Minimum spacing between artist starts within a batch
    #[serde(default = "default_artist_delay_ms")]
    pub artist_delay_ms: u64,

    /// Delay between batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Wait before retrying a transient failure
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_batch_size() -> usize {
    10
}
fn default_concurrency() -> usize {
    1
}
fn default_artist_delay_ms() -> u64 {
    100
}
fn default_batch_delay_ms() -> u64 {
    1000
}
fn default_retry_backoff_ms() -> u64 {
    1000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            artist_delay_ms: default_artist_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default = "default_true")]
    pub followed: bool,

    #[serde(default = "default_true")]
    pub liked_tracks: bool,

    #[serde(default = "default_true")]
    pub saved_albums: bool,

    /// Cap on records read from each source
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_true() -> bool {
    true
}
fn default_max_items() -> usize {
    2000
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            followed: true,
            liked_tracks: true,
            saved_albums: true,
            max_items: default_max_items(),
        }
    }
}
