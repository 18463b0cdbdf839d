//! Typed ID wrappers for catalog identifiers.
//!
//! The catalog service hands out opaque string ids for artists and releases.
//! Wrapping them prevents passing a release id where an artist id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog-unique identifier for an artist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistId(String);

impl ArtistId {
    /// Borrow the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the id is empty or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for ArtistId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ArtistId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<ArtistId> for String {
    fn from(id: ArtistId) -> Self {
        id.0
    }
}

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog-unique identifier for a release (album, single, EP).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseId(String);

impl ReleaseId {
    /// Borrow the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ReleaseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ReleaseId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_id_empty_detection() {
        assert!(ArtistId::from("").is_empty());
        assert!(ArtistId::from("   ").is_empty());
        assert!(!ArtistId::from("abc").is_empty());
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ArtistId::from("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");

        let parsed: ReleaseId = serde_json::from_str("\"rel-1\"").unwrap();
        assert_eq!(parsed.as_str(), "rel-1");
    }

    #[test]
    fn display_matches_inner() {
        assert_eq!(ArtistId::from("x").to_string(), "x");
        assert_eq!(ReleaseId::from("y").to_string(), "y");
    }
}
