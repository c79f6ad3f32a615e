//! The internal wrapper around one live resource and its metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::ThreadId;
use std::time::Instant;

/// Per-slot bookkeeping visible to [`crate::Poolable::should_evict`].
///
/// `last_release_millis` is relative to the slot's own creation, not wall
/// clock time — cheap to read under contention and sufficient for the
/// staleness predicates eviction hooks typically want to express.
#[derive(Debug)]
pub struct SlotMetrics {
    created_at: Instant,
    acquire_count: AtomicU64,
    last_release_millis: AtomicU64,
}

impl SlotMetrics {
    fn new() -> Self {
        Self {
            created_at: Instant::now(),
            acquire_count: AtomicU64::new(0),
            last_release_millis: AtomicU64::new(0),
        }
    }

    /// How many times this slot has been delivered to a borrower.
    pub fn acquire_count(&self) -> u64 {
        self.acquire_count.load(Ordering::Relaxed)
    }

    /// Age of the underlying resource since it was allocated.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Milliseconds since creation at which this slot was last released back
    /// to the idle set. Zero if it has never been released.
    pub fn last_release_millis(&self) -> u64 {
        self.last_release_millis.load(Ordering::Relaxed)
    }

    pub(crate) fn record_acquire(&self) {
        self.acquire_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        let elapsed = self.created_at.elapsed().as_millis() as u64;
        self.last_release_millis.store(elapsed, Ordering::Relaxed);
    }
}

/// Monotonic slot lifecycle: `AVAILABLE -> ACQUIRED -> (AVAILABLE | DESTROYED)`.
/// `DESTROYED` is terminal. Tracked for debugging/assertions only — ownership
/// itself (idle set vs. borrower vs. destroy pipeline) is what the engine
/// actually relies on to guarantee exclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Available,
    Acquired,
    Destroyed,
}

/// One live resource plus its metrics and affinity tag.
pub struct Slot<T> {
    pub(crate) item: T,
    pub(crate) metrics: SlotMetrics,
    pub(crate) state: SlotState,
    /// The thread that last released this slot, for the affinity engine's
    /// "sticky" routing. `None` for a freshly allocated slot and unused by
    /// the queue engine entirely.
    pub(crate) affinity_key: Option<ThreadId>,
}

impl<T> Slot<T> {
    pub(crate) fn new(item: T) -> Self {
        Self {
            item,
            metrics: SlotMetrics::new(),
            state: SlotState::Available,
            affinity_key: None,
        }
    }

    pub fn metrics(&self) -> &SlotMetrics {
        &self.metrics
    }
}
