//! Artist sources feeding the merge step.
//!
//! A source yields raw [`ArtistRecord`]s, possibly with duplicate ids. The
//! catalog-backed implementation pages through the user's followed artists,
//! liked tracks, or saved albums.

use std::sync::Arc;

use async_trait::async_trait;
use newreleases_common::{Result, SourceTag};
use tracing::{debug, info};

use crate::catalog::{CatalogGateway, PageRequest};
use crate::config::SourcesConfig;
use crate::merge::ArtistRecord;

/// Largest page the library endpoints accept.
const LIBRARY_PAGE_SIZE: u32 = 50;

/// A collection of artists the user cares about.
#[async_trait]
pub trait ArtistSource: Send + Sync {
    /// Tag attached to every artist this source contributes.
    fn tag(&self) -> SourceTag;

    /// Read every record from the source.
    async fn fetch(&self) -> Result<Vec<ArtistRecord>>;
}

/// Source backed by one of the catalog's library endpoints.
pub struct CatalogArtistSource {
    gateway: Arc<dyn CatalogGateway>,
    tag: SourceTag,
    page_size: u32,
    max_items: usize,
}

impl CatalogArtistSource {
    pub fn new(gateway: Arc<dyn CatalogGateway>, tag: SourceTag, max_items: usize) -> Self {
        Self {
            gateway,
            tag,
            page_size: LIBRARY_PAGE_SIZE,
            max_items,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// One source per tag enabled in `config`, in canonical merge order.
    pub fn enabled(gateway: Arc<dyn CatalogGateway>, config: &SourcesConfig) -> Vec<Box<dyn ArtistSource>> {
        SourceTag::ALL
            .into_iter()
            .filter(|tag| match tag {
                SourceTag::Followed => config.followed,
                SourceTag::LikedTracks => config.liked_tracks,
                SourceTag::SavedAlbums => config.saved_albums,
            })
            .map(|tag| {
                Box::new(CatalogArtistSource::new(gateway.clone(), tag, config.max_items))
                    as Box<dyn ArtistSource>
            })
            .collect()
    }
}

#[async_trait]
impl ArtistSource for CatalogArtistSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn fetch(&self) -> Result<Vec<ArtistRecord>> {
        let mut records = Vec::new();
        let mut request = PageRequest::first(self.page_size);
        let mut pages = 0u32;

        loop {
            let page = match self.tag {
                SourceTag::Followed => self.gateway.followed_artists(request).await?,
                SourceTag::LikedTracks => self.gateway.saved_tracks(request).await?,
                SourceTag::SavedAlbums => self.gateway.saved_albums(request).await?,
            };
            pages += 1;
            debug!(source = %self.tag, page = pages, items = page.items.len(), "Read source page");

            records.extend(page.items);
            if records.len() >= self.max_items {
                records.truncate(self.max_items);
                break;
            }

            match page.next {
                Some(token) => {
                    request = PageRequest {
                        limit: self.page_size,
                        token: Some(token),
                    }
                }
                None => break,
            }
        }

        info!(source = %self.tag, records = records.len(), pages, "Collected artist source");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::scripted::ScriptedCatalog;

    fn records(prefix: &str, n: usize) -> Vec<ArtistRecord> {
        (0..n)
            .map(|i| ArtistRecord::new(format!("{prefix}{i}"), format!("Artist {i}"), format!("https://catalog/{prefix}{i}")))
            .collect()
    }

    #[tokio::test]
    async fn followed_follows_cursor_to_the_end() {
        let catalog = Arc::new(ScriptedCatalog::new().with_followed(records("f", 7)));
        let source = CatalogArtistSource::new(catalog, SourceTag::Followed, 100).with_page_size(3);

        let fetched = source.fetch().await.unwrap();
        assert_eq!(fetched.len(), 7);
        assert_eq!(fetched[6].id, "f6");
    }

    #[tokio::test]
    async fn max_items_caps_collection() {
        let catalog = Arc::new(ScriptedCatalog::new().with_saved_tracks(records("t", 20)));
        let source = CatalogArtistSource::new(catalog, SourceTag::LikedTracks, 5).with_page_size(4);

        let fetched = source.fetch().await.unwrap();
        assert_eq!(fetched.len(), 5);
    }

    #[tokio::test]
    async fn duplicates_pass_through_untouched() {
        let mut saved = records("s", 2);
        saved.push(saved[0].clone());
        let catalog = Arc::new(ScriptedCatalog::new().with_saved_albums(saved));
        let source = CatalogArtistSource::new(catalog, SourceTag::SavedAlbums, 100);

        assert_eq!(source.fetch().await.unwrap().len(), 3);
    }

    #[test]
    fn enabled_respects_config_and_order() {
        let catalog: Arc<dyn CatalogGateway> = Arc::new(ScriptedCatalog::new());
        let config = SourcesConfig {
            liked_tracks: false,
            ..SourcesConfig::default()
        };
        let tags: Vec<SourceTag> = CatalogArtistSource::enabled(catalog, &config)
            .iter()
            .map(|s| s.tag())
            .collect();
        assert_eq!(tags, vec![SourceTag::Followed, SourceTag::SavedAlbums]);
    }
}
