use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Storage IDentifier: a process-wide unique, monotonically assigned
/// identity for a `Device`. Preserved across `DeviceGraph::copy` and across
/// the probed-to-staging copy; the planner matches devices across two graphs
/// by comparing SIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sid(pub u64);

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates fresh SIDs. A single allocator is shared (via `Arc`) by a
/// probed graph and every staging graph cloned from it, so SIDs stay unique
/// across all live graphs during a run (spec §9: "Global counter for SID").
#[derive(Debug, Clone)]
pub struct SidAllocator {
    next: Arc<AtomicU64>,
}

impl Default for SidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SidAllocator {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn allocate(&self) -> Sid {
        Sid(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Advances the allocator so the next `allocate()` call returns
    /// something past `sid`, without ever moving it backwards. Used when
    /// loading a graph whose nodes already carry SIDs, so a later
    /// `add_device` can't hand out one that collides with something loaded.
    pub fn seed_past(&self, sid: Sid) {
        self.next.fetch_max(sid.0 + 1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_unique_increasing_sids() {
        let allocator = SidAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    #[test]
    fn shared_allocator_never_repeats_across_clones() {
        let allocator = SidAllocator::new();
        let cloned = allocator.clone();
        let a = allocator.allocate();
        let b = cloned.allocate();
        assert_ne!(a, b);
    }

    #[test]
    fn seed_past_avoids_colliding_with_loaded_sids() {
        let allocator = SidAllocator::new();
        allocator.seed_past(Sid(41));
        assert_eq!(allocator.allocate(), Sid(42));
    }

    #[test]
    fn seed_past_never_moves_the_counter_backwards() {
        let allocator = SidAllocator::new();
        let a = allocator.allocate();
        allocator.seed_past(Sid(0));
        let b = allocator.allocate();
        assert_eq!(b.0, a.0 + 1);
    }
}
