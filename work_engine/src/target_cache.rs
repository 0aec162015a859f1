use std::collections::HashMap;
use std::sync::Arc;

use bevy::math::Vec2;
use bevy::prelude::Resource;

use crate::agents::{MapId, TargetRef, WorkCategory};

/// Composite key for one cached candidate scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub map: MapId,
    pub category: WorkCategory,
}

impl CacheKey {
    pub fn new(map: MapId, category: WorkCategory) -> Self {
        Self { map, category }
    }
}

/// One completed candidate scan, partitioned into distance buckets relative
/// to the origin it was built for. Entries are immutable once published and
/// only ever replaced wholesale, so every agent reading the cache within a
/// tick observes the same snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    last_refresh_tick: u64,
    origin: Vec2,
    thresholds_sq: Vec<f32>,
    buckets: Vec<Vec<TargetRef>>,
}

impl CacheEntry {
    pub(crate) fn from_parts(
        last_refresh_tick: u64,
        origin: Vec2,
        thresholds_sq: Vec<f32>,
        buckets: Vec<Vec<TargetRef>>,
    ) -> Self {
        debug_assert_eq!(buckets.len(), thresholds_sq.len() + 1);
        Self {
            last_refresh_tick,
            origin,
            thresholds_sq,
            buckets,
        }
    }

    pub fn last_refresh_tick(&self) -> u64 {
        self.last_refresh_tick
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// The squared-distance thresholds this entry was partitioned with.
    pub fn thresholds_sq(&self) -> &[f32] {
        &self.thresholds_sq
    }

    /// Staleness is purely tick-based; the entry never observes world
    /// mutations directly. Fresh at its own tick, stale strictly after
    /// `interval` ticks have elapsed.
    pub fn is_stale(&self, now: u64, interval_ticks: u64) -> bool {
        now.saturating_sub(self.last_refresh_tick) > interval_ticks
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Targets of one bucket; an out-of-range index reads as empty.
    pub fn bucket(&self, index: usize) -> &[TargetRef] {
        self.buckets.get(index).map_or(&[], Vec::as_slice)
    }

    /// Targets in soft preference order: every target of the closest bucket
    /// before any of the next, preserving enumeration order inside each.
    pub fn iter(&self) -> impl Iterator<Item = &TargetRef> {
        self.buckets.iter().flatten()
    }

    pub fn target_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

/// Per-(map, category) store of candidate scans.
///
/// Entries are shared out as `Arc` so callers can hold a snapshot across
/// their own validation loop while a later tick replaces the slot.
#[derive(Resource, Debug, Default)]
pub struct TargetCache {
    entries: HashMap<CacheKey, Arc<CacheEntry>>,
    refreshes: u64,
}

impl TargetCache {
    pub fn get(&self, key: CacheKey) -> Option<Arc<CacheEntry>> {
        self.entries.get(&key).map(Arc::clone)
    }

    /// Publish a freshly built entry, replacing any previous one wholesale.
    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry) -> Arc<CacheEntry> {
        let entry = Arc::new(entry);
        self.entries.insert(key, Arc::clone(&entry));
        self.refreshes += 1;
        entry
    }

    /// Total refreshes published since session start. Telemetry only.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    pub fn invalidate(&mut self, key: CacheKey) {
        self.entries.remove(&key);
    }

    /// Eagerly drop every entry for a map. Invoked on map unload and on
    /// session reset so no cross-session target references survive.
    pub fn reset_caches(&mut self, map: MapId) {
        self.entries.retain(|key, _| key.map != map);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::TargetId;

    fn entry_at(tick: u64) -> CacheEntry {
        CacheEntry::from_parts(tick, Vec2::ZERO, vec![400.0], vec![Vec::new(), Vec::new()])
    }

    #[test]
    fn staleness_is_monotone_in_elapsed_ticks() {
        let interval = 180;
        let entry = entry_at(1000);
        assert!(!entry.is_stale(1000, interval));
        assert!(!entry.is_stale(1000 + interval, interval));
        assert!(entry.is_stale(1000 + interval + 1, interval));
        assert!(entry.is_stale(1000 + interval + 500, interval));
    }

    #[test]
    fn staleness_survives_clock_going_backwards() {
        // Saturating subtraction: an entry stamped "in the future" reads as
        // fresh rather than wrapping.
        let entry = entry_at(50);
        assert!(!entry.is_stale(10, 5));
    }

    #[test]
    fn reset_caches_only_clears_the_given_map() {
        let mut cache = TargetCache::default();
        let key_a = CacheKey::new(MapId(0), WorkCategory::Hauling);
        let key_b = CacheKey::new(MapId(1), WorkCategory::Hauling);
        cache.insert(key_a, entry_at(1));
        cache.insert(key_b, entry_at(1));

        cache.reset_caches(MapId(0));
        assert!(cache.get(key_a).is_none());
        assert!(cache.get(key_b).is_some());
    }

    #[test]
    fn insert_replaces_wholesale() {
        let mut cache = TargetCache::default();
        let key = CacheKey::new(MapId(0), WorkCategory::Cleaning);
        let first = cache.insert(key, entry_at(1));
        let second = cache.insert(key, entry_at(2));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.get(key).unwrap().last_refresh_tick(), 2);
        // The old snapshot stays usable for anyone still holding it.
        assert_eq!(first.last_refresh_tick(), 1);
    }

    #[test]
    fn entry_iterates_buckets_in_order() {
        let near = TargetRef::new(TargetId(1), Vec2::new(1.0, 0.0));
        let far = TargetRef::new(TargetId(2), Vec2::new(100.0, 0.0));
        let entry = CacheEntry::from_parts(
            0,
            Vec2::ZERO,
            vec![400.0],
            vec![vec![near.clone()], vec![far.clone()]],
        );
        let ids: Vec<_> = entry.iter().map(|target| target.id).collect();
        assert_eq!(ids, vec![TargetId(1), TargetId(2)]);
        assert_eq!(entry.target_count(), 2);
        assert!(!entry.is_empty());
    }

    #[test]
    fn out_of_range_bucket_reads_as_empty() {
        let entry = entry_at(0);
        assert_eq!(entry.bucket_count(), 2);
        assert!(entry.bucket(2).is_empty());
        assert!(entry.bucket(usize::MAX).is_empty());
    }
}
