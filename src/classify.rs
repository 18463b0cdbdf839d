//! Release classification and recency filtering.
//!
//! Albums are always kept. Singles are kept as EPs when they look like one
//! (four or more tracks, or "ep" in the title); everything else is dropped.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use newreleases_common::{
    compare_newest_first, ClassifiedRelease, RawRelease, ReleaseCategory, ReleaseType,
};

/// Singles with at least this many tracks count as EPs.
pub const EP_MIN_TRACKS: u32 = 4;

/// Case-insensitive title marker that turns a single into an EP.
const EP_NAME_MARKER: &str = "ep";

/// Decide the category of a release, or `None` to exclude it.
pub fn classify(release: &RawRelease) -> Option<ReleaseCategory> {
    match release.release_type {
        ReleaseType::Album => Some(ReleaseCategory::Album),
        ReleaseType::Single if looks_like_ep(release) => Some(ReleaseCategory::Ep),
        _ => None,
    }
}

fn looks_like_ep(release: &RawRelease) -> bool {
    release.track_count >= EP_MIN_TRACKS
        || release.name.to_lowercase().contains(EP_NAME_MARKER)
}

/// Classify, filter to the last `window_days`, deduplicate, and sort newest
/// first, using the current time.
pub fn filter_and_sort(releases: Vec<RawRelease>, window_days: u32) -> Vec<ClassifiedRelease> {
    filter_and_sort_at(releases, window_days, Utc::now())
}

/// [`filter_and_sort`] against an explicit `now`.
///
/// Undated releases are dropped since they cannot be shown to be recent.
/// When the same release id appears more than once (an album credited to two
/// followed artists) the first occurrence is kept.
pub fn filter_and_sort_at(
    releases: Vec<RawRelease>,
    window_days: u32,
    now: DateTime<Utc>,
) -> Vec<ClassifiedRelease> {
    let mut seen = HashSet::new();

    let mut kept: Vec<ClassifiedRelease> = releases
        .into_iter()
        .filter_map(|release| classify(&release).map(|category| (release, category)))
        .filter(|(release, _)| {
            release
                .release_date
                .is_some_and(|date| date.is_within(window_days, now))
        })
        .filter(|(release, _)| seen.insert(release.id.clone()))
        .map(|(release, category)| ClassifiedRelease { release, category })
        .collect();

    kept.sort_by(|a, b| {
        compare_newest_first(a.release.release_date.as_ref(), b.release.release_date.as_ref())
    });

    tracing::debug!(kept = kept.len(), window_days, "Classified and filtered releases");
    kept
}
