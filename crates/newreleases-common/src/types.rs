//! Core type definitions for artists and releases.
//!
//! All enums serialize in snake_case, matching the catalog service's wire
//! vocabulary where one exists.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::date::PartialDate;
use crate::ids::{ArtistId, ReleaseId};

/// Where an artist of interest was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Artists the user follows directly.
    Followed,
    /// Artists credited on the user's liked tracks.
    LikedTracks,
    /// Artists credited on the user's saved albums.
    SavedAlbums,
}

impl SourceTag {
    /// Every source in canonical merge order; richer metadata comes first.
    pub const ALL: [SourceTag; 3] = [Self::Followed, Self::LikedTracks, Self::SavedAlbums];
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Followed => write!(f, "followed"),
            Self::LikedTracks => write!(f, "liked_tracks"),
            Self::SavedAlbums => write!(f, "saved_albums"),
        }
    }
}

/// An artist of interest, deduplicated across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    /// Catalog-unique id.
    pub id: ArtistId,
    /// Display name.
    pub name: String,
    /// Link to the artist's catalog profile.
    pub profile_url: String,
    /// Sources the artist was seen in, without duplicates.
    pub sources: Vec<SourceTag>,
    /// Genre labels, most specific first, when the source provides them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    /// Catalog popularity score (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u8>,
    /// Number of catalog followers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
}

impl Artist {
    /// Create an artist first seen in `source`, with no optional metadata.
    pub fn new(
        id: impl Into<ArtistId>,
        name: impl Into<String>,
        profile_url: impl Into<String>,
        source: SourceTag,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile_url: profile_url.into(),
            sources: vec![source],
            genres: Vec::new(),
            popularity: None,
            follower_count: None,
        }
    }

    /// Record that the artist was also seen in `source`.
    ///
    /// Returns `true` if the tag was new.
    pub fn add_source(&mut self, source: SourceTag) -> bool {
        if self.sources.contains(&source) {
            return false;
        }
        self.sources.push(source);
        true
    }

    /// Whether the artist was seen in `source`.
    pub fn has_source(&self, source: SourceTag) -> bool {
        self.sources.contains(&source)
    }
}

/// Release type as reported by the catalog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    /// A full-length album.
    Album,
    /// A single; may actually be an EP.
    Single,
    /// A compilation.
    Compilation,
    /// A release the artist only appears on.
    AppearsOn,
    /// Anything the catalog adds later.
    #[serde(other)]
    Other,
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Album => write!(f, "album"),
            Self::Single => write!(f, "single"),
            Self::Compilation => write!(f, "compilation"),
            Self::AppearsOn => write!(f, "appears_on"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A release exactly as retrieved, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRelease {
    /// Catalog-unique release id.
    pub id: ReleaseId,
    /// Release title.
    pub name: String,
    /// Catalog-declared type.
    pub release_type: ReleaseType,
    /// Number of tracks on the release.
    pub track_count: u32,
    /// Release date, `None` when the catalog value was missing or unparsable.
    pub release_date: Option<PartialDate>,
    /// Artist the release was retrieved for.
    pub artist_id: ArtistId,
    /// Display name of that artist.
    pub artist_name: String,
    /// Link to the release in the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Category assigned by classification. Singles never get one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseCategory {
    /// A full-length album.
    Album,
    /// An extended play.
    Ep,
}

impl fmt::Display for ReleaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Album => write!(f, "Album"),
            Self::Ep => write!(f, "EP"),
        }
    }
}

/// A release that survived classification and recency filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRelease {
    #[serde(flatten)]
    pub release: RawRelease,
    pub category: ReleaseCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_source_is_idempotent() {
        let mut artist = Artist::new("a1", "Artist", "https://x/a1", SourceTag::Followed);
        assert!(!artist.add_source(SourceTag::Followed));
        assert!(artist.add_source(SourceTag::LikedTracks));
        assert!(!artist.add_source(SourceTag::LikedTracks));
        assert_eq!(artist.sources, vec![SourceTag::Followed, SourceTag::LikedTracks]);
        assert!(artist.has_source(SourceTag::LikedTracks));
        assert!(!artist.has_source(SourceTag::SavedAlbums));
    }

    #[test]
    fn release_type_accepts_unknown_values() {
        let t: ReleaseType = serde_json::from_str("\"appears_on\"").unwrap();
        assert_eq!(t, ReleaseType::AppearsOn);
        let t: ReleaseType = serde_json::from_str("\"audiobook\"").unwrap();
        assert_eq!(t, ReleaseType::Other);
    }

    #[test]
    fn classified_release_flattens() {
        let release = RawRelease {
            id: ReleaseId::from("r1"),
            name: "Record".into(),
            release_type: ReleaseType::Album,
            track_count: 10,
            release_date: Some(PartialDate::parse("2025-08-15").unwrap()),
            artist_id: ArtistId::from("a1"),
            artist_name: "Artist".into(),
            url: None,
        };
        let json = serde_json::to_value(ClassifiedRelease {
            release,
            category: ReleaseCategory::Album,
        })
        .unwrap();
        assert_eq!(json["id"], "r1");
        assert_eq!(json["release_date"], "2025-08-15");
        assert_eq!(json["category"], "album");
    }

    #[test]
    fn source_tag_display_and_order() {
        assert_eq!(SourceTag::LikedTracks.to_string(), "liked_tracks");
        assert_eq!(SourceTag::ALL[0], SourceTag::Followed);
    }
}
