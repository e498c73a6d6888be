use std::collections::HashMap;

use crate::pair_key::PairKey;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    /// A call for this pair has been scheduled but has not settled.
    Pending,
    Ready(f64),
    Failed,
}

/// Memo of oracle results for one matrix build.
///
/// Scoped to a single build: a fresh cache is created per pass and dropped
/// with it, so nothing leaks across passes. Pending reservations let a
/// concurrent fan-out dedupe pairs before any result has arrived.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    slots: HashMap<PairKey, Slot>,
    hits: usize,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settled value for `key`, counting a hit when present.
    pub fn get(&mut self, key: &PairKey) -> Option<f64> {
        match self.slots.get(key) {
            Some(Slot::Ready(value)) => {
                self.hits += 1;
                Some(*value)
            }
            _ => None,
        }
    }

    pub fn put(&mut self, key: PairKey, value: f64) {
        self.slots.insert(key, Slot::Ready(value));
    }

    pub fn mark_failed(&mut self, key: PairKey) {
        self.slots.insert(key, Slot::Failed);
    }

    /// Claim `key` for an oracle call.
    ///
    /// Returns `true` when the caller must issue the call, `false` when the
    /// pair is already scheduled or settled (counted as a hit).
    pub fn reserve(&mut self, key: &PairKey) -> bool {
        if self.slots.contains_key(key) {
            self.hits += 1;
            return false;
        }
        self.slots.insert(key.clone(), Slot::Pending);
        true
    }

    pub fn is_failed(&self, key: &PairKey) -> bool {
        matches!(self.slots.get(key), Some(Slot::Failed))
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair_key::canonical_key;

    #[test]
    fn reserve_dedupes_unordered_pairs() {
        let mut cache = SimilarityCache::new();
        assert!(cache.reserve(&canonical_key("a", "b")));
        assert!(!cache.reserve(&canonical_key("b", "a")));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn pending_is_not_a_value() {
        let mut cache = SimilarityCache::new();
        let key = canonical_key("a", "b");
        cache.reserve(&key);
        assert_eq!(cache.get(&key), None);

        cache.put(key.clone(), 0.7);
        assert_eq!(cache.get(&canonical_key("b", "a")), Some(0.7));
    }

    #[test]
    fn failed_slot_reports_failure() {
        let mut cache = SimilarityCache::new();
        let key = canonical_key("x", "y");
        cache.reserve(&key);
        cache.mark_failed(key.clone());
        assert!(cache.is_failed(&key));
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn absent_key_misses() {
        let mut cache = SimilarityCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&canonical_key("q", "r")), None);
        assert_eq!(cache.hits(), 0);
    }
}
