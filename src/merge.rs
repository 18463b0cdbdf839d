//! Multi-source artist deduplication.
//!
//! Each artist source adapts its native records into something implementing
//! [`ArtistSourceRecord`]. The [`MergeAccumulator`] folds those records into
//! one [`Artist`] per catalog id: the first occurrence supplies the metadata,
//! later occurrences only contribute their [`SourceTag`].
//!
//! # Example
//!
//! ```
//! use newreleases::merge::{ArtistRecord, MergeAccumulator};
//! use newreleases_common::SourceTag;
//!
//! let followed = vec![ArtistRecord::new("a1", "Artist", "https://example/a1")];
//! let liked = vec![ArtistRecord::new("a1", "Artist", "https://example/a1")];
//!
//! let merged = MergeAccumulator::new()
//!     .absorb(SourceTag::Followed, followed)
//!     .absorb(SourceTag::LikedTracks, liked)
//!     .finish();
//!
//! assert_eq!(merged.artists.len(), 1);
//! assert_eq!(merged.artists[0].sources.len(), 2);
//! ```

use std::collections::HashMap;

use newreleases_common::{Artist, ArtistId, SourceTag};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Capability set every artist-source record must provide.
pub trait ArtistSourceRecord {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn profile_url(&self) -> &str;

    fn genres(&self) -> &[String] {
        &[]
    }

    fn popularity(&self) -> Option<u8> {
        None
    }

    fn follower_count(&self) -> Option<u64> {
        None
    }
}

/// The boundary shape artist sources adapt into.
///
/// Full artist objects carry genres, popularity, and follower counts;
/// artists credited on tracks or albums only carry id, name, and url.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub id: String,
    pub name: String,
    pub profile_url: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u8>,
    #[serde(default)]
    pub follower_count: Option<u64>,
}

impl ArtistRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile_url: profile_url.into(),
            ..Self::default()
        }
    }
}

impl ArtistSourceRecord for ArtistRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn profile_url(&self) -> &str {
        &self.profile_url
    }

    fn genres(&self) -> &[String] {
        &self.genres
    }

    fn popularity(&self) -> Option<u8> {
        self.popularity
    }

    fn follower_count(&self) -> Option<u64> {
        self.follower_count
    }
}

impl ArtistSourceRecord for Artist {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn profile_url(&self) -> &str {
        &self.profile_url
    }

    fn genres(&self) -> &[String] {
        &self.genres
    }

    fn popularity(&self) -> Option<u8> {
        self.popularity
    }

    fn follower_count(&self) -> Option<u64> {
        self.follower_count
    }
}

/// Per-source tallies for one merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub tag: SourceTag,
    /// Records offered by the source, including dropped ones.
    pub total: usize,
    /// Records that created a new artist.
    pub new: usize,
    /// Records whose id was already known.
    pub duplicate: usize,
    /// Records without a usable id.
    pub dropped: usize,
}

impl SourceCounts {
    /// Zeroed tallies for `tag`.
    pub fn new(tag: SourceTag) -> Self {
        Self {
            tag,
            total: 0,
            new: 0,
            duplicate: 0,
            dropped: 0,
        }
    }
}

/// Observability summary of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub per_source: Vec<SourceCounts>,
    pub total_unique: usize,
    pub dropped_missing_id: usize,
}

/// Output of [`MergeAccumulator::finish`].
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Deduplicated artists, in first-seen order (callers must not rely on it).
    pub artists: Vec<Artist>,
    pub report: MergeReport,
}

/// Accumulates artists across sources.
///
/// The accumulator is moved into each [`absorb`](Self::absorb) call and handed
/// back, so there is exactly one owner of the dedup state at any time.
#[derive(Debug, Default)]
pub struct MergeAccumulator {
    artists: Vec<Artist>,
    index: HashMap<ArtistId, usize>,
    report: MergeReport,
}

impl MergeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one source's records into the accumulator.
    pub fn absorb<R, I>(mut self, tag: SourceTag, records: I) -> Self
    where
        R: ArtistSourceRecord,
        I: IntoIterator<Item = R>,
    {
        let mut counts = SourceCounts::new(tag);

        for record in records {
            counts.total += 1;

            let id = ArtistId::from(record.id().trim());
            if id.is_empty() {
                counts.dropped += 1;
                warn!(
                    source = %tag,
                    name = record.name(),
                    "Dropping artist record without an id"
                );
                continue;
            }

            match self.index.get(&id) {
                Some(&idx) => {
                    self.artists[idx].add_source(tag);
                    counts.duplicate += 1;
                }
                None => {
                    let artist = Artist {
                        id: id.clone(),
                        name: record.name().to_string(),
                        profile_url: record.profile_url().to_string(),
                        sources: vec![tag],
                        genres: record.genres().to_vec(),
                        popularity: record.popularity(),
                        follower_count: record.follower_count(),
                    };
                    self.index.insert(id, self.artists.len());
                    self.artists.push(artist);
                    counts.new += 1;
                }
            }
        }

        info!(
            source = %tag,
            total = counts.total,
            new = counts.new,
            duplicate = counts.duplicate,
            dropped = counts.dropped,
            "Merged artist source"
        );

        self.report.dropped_missing_id += counts.dropped;
        self.report.per_source.push(counts);
        self
    }

    /// Number of unique artists accumulated so far.
    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    /// Finish merging and hand out the deduplicated artists.
    pub fn finish(mut self) -> MergeResult {
        self.report.total_unique = self.artists.len();

        info!(
            unique = self.report.total_unique,
            dropped_missing_id = self.report.dropped_missing_id,
            "Artist merge complete"
        );

        MergeResult {
            artists: self.artists,
            report: self.report,
        }
    }
}

/// Merge several sources in the order given.
///
/// Pass sources in [`SourceTag::ALL`] order so the richest metadata wins.
pub fn merge<R: ArtistSourceRecord>(sources: Vec<(SourceTag, Vec<R>)>) -> MergeResult {
    sources
        .into_iter()
        .fold(MergeAccumulator::new(), |acc, (tag, records)| acc.absorb(tag, records))
        .finish()
}
