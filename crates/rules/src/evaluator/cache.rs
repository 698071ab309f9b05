//! Memoization for one cache epoch.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tracing::debug;
use tracklogic_core::AccessibilityLevel;

/// Reference results (access queries only) and provider counts, valid
/// until the next [`invalidate`](LogicCache::invalidate).
///
/// Lookups and stores go through `&self` so queries stay re-entrant;
/// no borrow outlives a single call.
///
/// Also holds the reference keys currently being evaluated. A script host
/// that queries back into the tracker starts a fresh path, so the
/// in-flight keys are what carries the outer chain across that boundary.
#[derive(Debug, Default)]
pub struct LogicCache {
    epoch: u64,
    references: RefCell<HashMap<String, AccessibilityLevel>>,
    provider_counts: RefCell<HashMap<String, i32>>,
    in_flight: RefCell<HashMap<String, usize>>,
    cuts: Cell<u64>,
}

impl LogicCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn reference(&self, key: &str) -> Option<AccessibilityLevel> {
        self.references.borrow().get(key).copied()
    }

    pub fn store_reference(&self, key: String, level: AccessibilityLevel) {
        self.references.borrow_mut().insert(key, level);
    }

    pub fn provider_count(&self, code: &str) -> Option<i32> {
        self.provider_counts.borrow().get(code).copied()
    }

    pub fn store_provider_count(&self, code: &str, count: i32) {
        self.provider_counts
            .borrow_mut()
            .insert(code.to_string(), count);
    }

    /// How many evaluations of `key` are currently running.
    pub fn active(&self, key: &str) -> usize {
        self.in_flight.borrow().get(key).copied().unwrap_or(0)
    }

    pub fn enter(&self, key: &str) {
        *self
            .in_flight
            .borrow_mut()
            .entry(key.to_string())
            .or_insert(0) += 1;
    }

    pub fn leave(&self, key: &str) {
        let mut in_flight = self.in_flight.borrow_mut();
        if let Some(n) = in_flight.get_mut(key) {
            *n -= 1;
            if *n == 0 {
                in_flight.remove(key);
            }
        }
    }

    /// Record a recursion cut-off.
    pub fn note_cut(&self) {
        self.cuts.set(self.cuts.get() + 1);
    }

    /// Cut-offs so far. Compare two readings to learn whether a call
    /// produced a path-dependent result.
    pub fn cuts(&self) -> u64 {
        self.cuts.get()
    }

    pub fn len(&self) -> usize {
        self.references.borrow().len() + self.provider_counts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End the current epoch.
    pub fn invalidate(&mut self) {
        let dropped = self.len();
        self.references.get_mut().clear();
        self.provider_counts.get_mut().clear();
        self.epoch += 1;
        debug!(epoch = self.epoch, dropped, "logic cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_clears_and_bumps_epoch() {
        let mut cache = LogicCache::new();
        cache.store_reference("sec:A/B".into(), AccessibilityLevel::Normal);
        cache.store_provider_count("sword", 1);
        assert_eq!(cache.reference("sec:A/B"), Some(AccessibilityLevel::Normal));
        assert_eq!(cache.provider_count("sword"), Some(1));
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
        assert_eq!(cache.epoch(), 1);
        assert_eq!(cache.provider_count("sword"), None);
    }

    #[test]
    fn in_flight_keys_nest() {
        let cache = LogicCache::new();
        cache.enter("loc:A");
        cache.enter("loc:A");
        assert_eq!(cache.active("loc:A"), 2);
        cache.leave("loc:A");
        assert_eq!(cache.active("loc:A"), 1);
        cache.leave("loc:A");
        cache.leave("loc:A");
        assert_eq!(cache.active("loc:A"), 0);
        assert_eq!(cache.active("loc:B"), 0);
    }
}
