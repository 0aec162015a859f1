use bevy::math::Vec2;
use tracing::debug;

use crate::agents::TargetRef;
use crate::target_cache::CacheEntry;

/// Index of the bucket a squared distance falls into: the first threshold
/// the distance does not exceed, or the unbounded final bucket past the
/// last threshold.
pub fn bucket_index(dist_sq: f32, thresholds_sq: &[f32]) -> usize {
    thresholds_sq
        .iter()
        .position(|threshold| dist_sq <= *threshold)
        .unwrap_or(thresholds_sq.len())
}

/// Rebuild one cache entry from an authoritative candidate snapshot.
///
/// The coarse `filter` captures everything knowable without a specific
/// requesting agent (alive, valid state, designated for the category).
/// Agent-relative checks stay in the orchestrator's validation pass.
/// An unavailable map or empty population yields an empty entry; absence
/// of targets is a normal outcome, not an error.
pub fn rebuild_entry(
    now: u64,
    origin: Vec2,
    thresholds_sq: &[f32],
    candidates: impl IntoIterator<Item = TargetRef>,
    filter: impl Fn(&TargetRef) -> bool,
) -> CacheEntry {
    let mut buckets: Vec<Vec<TargetRef>> = vec![Vec::new(); thresholds_sq.len() + 1];
    let mut scanned = 0usize;
    let mut kept = 0usize;

    for candidate in candidates {
        scanned += 1;
        if !filter(&candidate) {
            continue;
        }
        let dist_sq = candidate.position.distance_squared(origin);
        buckets[bucket_index(dist_sq, thresholds_sq)].push(candidate);
        kept += 1;
    }

    debug!(
        target: "work_engine::refresh",
        tick = now,
        scanned,
        kept,
        "target_cache.rebuilt"
    );
    CacheEntry::from_parts(now, origin, thresholds_sq.to_vec(), buckets)
}
