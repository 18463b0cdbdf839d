//! Access to the remote music catalog.
//!
//! # Module layout
//!
//! - [`gateway`] -- Trait definition and shared paging/release types.
//! - [`http`] -- Gateway backed by the catalog's HTTP API.

pub mod gateway;
pub mod http;

#[cfg(test)]
pub(crate) mod scripted;

pub use gateway::{
    ArtistRef, CatalogGateway, CatalogRelease, Page, PageRequest, PageToken, SearchQuery,
};
pub use http::HttpCatalog;
