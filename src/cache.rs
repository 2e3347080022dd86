//! Two-tier cache of influence maps keyed by trailing character sequence.
//!
//! Generating an influence map walks the statistics of every character in a
//! sequence, so short sequences that come up again and again are worth
//! keeping around.
//!
//! # Tiers
//!
//! - **Primary**: ordered map, unbounded, never evicted automatically. Only
//!   sequences that were asked for at least twice end up here.
//! - **Secondary**: FIFO of recently generated maps, bounded (32 by default).
//!   New entries go in at the head; the tail is evicted once the bound is
//!   exceeded. A hit here promotes the entry into the primary tier.
//!
//! A sequence lives in at most one tier at a time.
//!
//! # Observability
//!
//! Every lookup outcome is counted in [`CacheStats`], emitted as a `tracing`
//! trace event, and forwarded to an optional [`CacheObserver`].

use crate::library::InfluenceMap;
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

/// Default bound on the secondary tier.
pub const SECONDARY_CACHE_SIZE: usize = 32;

/// Where a lookup was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    PrimaryHit,
    /// Found in the secondary tier and promoted to the primary tier.
    SecondaryHit,
    Miss,
}

/// Hook notified of cache activity.
pub trait CacheObserver: Send {
    fn on_lookup(&mut self, sequence: &str, outcome: CacheOutcome);

    /// Called when `sequence` falls off the tail of the secondary tier.
    fn on_evict(&mut self, _sequence: &str) {}
}

/// Running counters of cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub primary_hits: u64,
    pub secondary_hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    fn record(&mut self, outcome: CacheOutcome) {
        match outcome {
            CacheOutcome::PrimaryHit => self.primary_hits += 1,
            CacheOutcome::SecondaryHit => self.secondary_hits += 1,
            CacheOutcome::Miss => self.misses += 1,
        }
    }
}

/// Primary ordered map plus a bounded FIFO secondary tier.
pub struct InfluenceCache {
    primary: BTreeMap<String, InfluenceMap>,
    secondary: VecDeque<(String, InfluenceMap)>,
    capacity: usize,
    stats: CacheStats,
    observer: Option<Box<dyn CacheObserver>>,
}

impl InfluenceCache {
    pub fn new() -> Self {
        Self::with_capacity(SECONDARY_CACHE_SIZE)
    }

    /// Create a cache whose secondary tier holds at most `capacity` entries.
    ///
    /// A capacity of 0 is raised to 1 so a freshly generated map can always
    /// be handed back from the cache.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            primary: BTreeMap::new(),
            secondary: VecDeque::with_capacity(capacity.max(1) + 1),
            capacity: capacity.max(1),
            stats: CacheStats::default(),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn CacheObserver>) {
        self.observer = Some(observer);
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn CacheObserver>> {
        self.observer.take()
    }

    fn record(&mut self, sequence: &str, outcome: CacheOutcome) {
        trace!(sequence, ?outcome, "influence cache lookup");
        self.stats.record(outcome);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_lookup(sequence, outcome);
        }
    }

    fn position_in_secondary(&self, sequence: &str) -> Option<usize> {
        self.secondary.iter().position(|(key, _)| key == sequence)
    }

    /// Take `sequence` out of the secondary tier, if present.
    fn take_secondary(&mut self, sequence: &str) -> Option<(String, InfluenceMap)> {
        let index = self.position_in_secondary(sequence)?;
        self.secondary.remove(index)
    }

    /// Look `sequence` up in both tiers without generating anything.
    ///
    /// A secondary hit is promoted to the primary tier.
    pub fn get(&mut self, sequence: &str) -> Option<&InfluenceMap> {
        if self.primary.contains_key(sequence) {
            self.record(sequence, CacheOutcome::PrimaryHit);
            return self.primary.get(sequence);
        }
        let (key, map) = self.take_secondary(sequence)?;
        self.record(&key, CacheOutcome::SecondaryHit);
        Some(&*self.primary.entry(key).or_insert(map))
    }

    /// Return the cached map for `sequence`, generating it with `compute` on
    /// a miss.
    ///
    /// Freshly generated maps enter the head of the secondary tier; the
    /// oldest secondary entry is evicted when the tier overflows.
    pub fn get_or_insert_with<F>(&mut self, sequence: &str, compute: F) -> &InfluenceMap
    where
        F: FnOnce() -> InfluenceMap,
    {
        if self.primary.contains_key(sequence) {
            self.record(sequence, CacheOutcome::PrimaryHit);
            return &self.primary[sequence];
        }

        if let Some((key, map)) = self.take_secondary(sequence) {
            self.record(&key, CacheOutcome::SecondaryHit);
            return self.primary.entry(key).or_insert(map);
        }

        self.record(sequence, CacheOutcome::Miss);
        self.secondary.push_front((sequence.to_owned(), compute()));
        while self.secondary.len() > self.capacity {
            if let Some((evicted, _)) = self.secondary.pop_back() {
                trace!(sequence = %evicted, "evicted from secondary influence cache");
                self.stats.evictions += 1;
                if let Some(observer) = self.observer.as_mut() {
                    observer.on_evict(&evicted);
                }
            }
        }
        &self.secondary[0].1
    }

    pub fn contains_primary(&self, sequence: &str) -> bool {
        self.primary.contains_key(sequence)
    }

    pub fn contains_secondary(&self, sequence: &str) -> bool {
        self.position_in_secondary(sequence).is_some()
    }

    pub fn primary_len(&self) -> usize {
        self.primary.len()
    }

    pub fn secondary_len(&self) -> usize {
        self.secondary.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop the unbounded primary tier, keeping the secondary FIFO.
    pub fn clear_primary(&mut self) {
        self.primary.clear();
    }

    /// Drop both tiers. Counters are kept.
    pub fn clear(&mut self) {
        self.primary.clear();
        self.secondary.clear();
    }
}

impl Default for InfluenceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InfluenceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluenceCache")
            .field("primary", &self.primary.len())
            .field("secondary", &self.secondary.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char_map::CharacterMap;
    use crate::histogram::OccurrenceHistogram;
    use std::sync::{Arc, Mutex};

    fn map_with(key: char) -> InfluenceMap {
        let mut map = CharacterMap::histograms(true);
        map.put(key, OccurrenceHistogram::from(vec![1]));
        map
    }

    #[derive(Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<(String, CacheOutcome)>>>,
        evicted: Arc<Mutex<Vec<String>>>,
    }

    impl CacheObserver for Recorder {
        fn on_lookup(&mut self, sequence: &str, outcome: CacheOutcome) {
            self.events.lock().unwrap().push((sequence.to_string(), outcome));
        }

        fn on_evict(&mut self, sequence: &str) {
            self.evicted.lock().unwrap().push(sequence.to_string());
        }
    }

    #[test]
    fn test_miss_then_promotion_then_primary_hit() {
        let mut cache = InfluenceCache::new();

        cache.get_or_insert_with("ab", || map_with('c'));
        assert!(cache.contains_secondary("ab"));
        assert!(!cache.contains_primary("ab"));

        let second = cache.get_or_insert_with("ab", || map_with('z'));
        assert!(second.contains_key('c'));
        assert!(cache.contains_primary("ab"));
        assert!(!cache.contains_secondary("ab"));

        cache.get_or_insert_with("ab", || map_with('z'));
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.secondary_hits, 1);
        assert_eq!(stats.primary_hits, 1);
    }

    #[test]
    fn test_secondary_evicts_oldest() {
        let mut cache = InfluenceCache::new();
        for i in 0..=SECONDARY_CACHE_SIZE {
            cache.get_or_insert_with(&format!("s{i}"), || map_with('x'));
        }

        assert_eq!(cache.secondary_len(), SECONDARY_CACHE_SIZE);
        assert!(!cache.contains_secondary("s0"));
        assert!(cache.contains_secondary("s1"));
        assert_eq!(cache.stats().evictions, 1);

        // The evicted entry is generated again rather than promoted
        assert!(cache.get("s0").is_none());
        cache.get_or_insert_with("s0", || map_with('y'));
        assert!(!cache.contains_primary("s0"));
        assert!(cache.contains_secondary("s0"));
        assert_eq!(cache.stats().misses, SECONDARY_CACHE_SIZE as u64 + 2);
    }

    #[test]
    fn test_get_promotes_without_computing() {
        let mut cache = InfluenceCache::with_capacity(2);
        assert!(cache.get("q").is_none());

        cache.get_or_insert_with("q", || map_with('u'));
        assert!(cache.get("q").is_some());
        assert!(cache.contains_primary("q"));
        assert_eq!(cache.secondary_len(), 0);
    }

    #[test]
    fn test_observer_sees_every_outcome() {
        let recorder = Recorder::default();
        let events = Arc::clone(&recorder.events);
        let evicted = Arc::clone(&recorder.evicted);

        let mut cache = InfluenceCache::with_capacity(1);
        cache.set_observer(Box::new(recorder));
        cache.get_or_insert_with("a", || map_with('b'));
        cache.get_or_insert_with("b", || map_with('c'));
        cache.get_or_insert_with("b", || map_with('c'));
        cache.get_or_insert_with("b", || map_with('c'));

        let events = events.lock().unwrap();
        let outcomes: Vec<CacheOutcome> = events.iter().map(|(_, o)| *o).collect();
        assert_eq!(
            outcomes,
            vec![
                CacheOutcome::Miss,
                CacheOutcome::Miss,
                CacheOutcome::SecondaryHit,
                CacheOutcome::PrimaryHit,
            ]
        );
        assert_eq!(*evicted.lock().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_clear() {
        let mut cache = InfluenceCache::new();
        cache.get_or_insert_with("a", || map_with('b'));
        cache.get_or_insert_with("a", || map_with('b'));
        cache.get_or_insert_with("c", || map_with('d'));

        cache.clear_primary();
        assert_eq!(cache.primary_len(), 0);
        assert_eq!(cache.secondary_len(), 1);

        cache.clear();
        assert_eq!(cache.secondary_len(), 0);
        assert_eq!(cache.capacity(), SECONDARY_CACHE_SIZE);
    }
}
