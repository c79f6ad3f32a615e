//! The idle set: a single central queue for the queue engine, or per-thread
//! sub-queues for the affinity engine.

use std::thread::ThreadId;

use crossbeam::queue::SegQueue;
use dashmap::DashMap;

use crate::slot::Slot;

pub(crate) enum IdleStore<T> {
    Queue(SegQueue<Slot<T>>),
    Affinity(DashMap<ThreadId, SegQueue<Slot<T>>>),
}

impl<T> IdleStore<T> {
    pub(crate) fn new_queue() -> Self {
        Self::Queue(SegQueue::new())
    }

    pub(crate) fn new_affinity() -> Self {
        Self::Affinity(DashMap::new())
    }

    /// Deposit a slot on actual release (or initial allocation, which counts
    /// as the constructing thread's first "use"). For the affinity engine
    /// this always routes by `key`, the thread releasing it right now, and
    /// overwrites whatever affinity tag the slot carried before — "the
    /// affinity key it was *last used by*" (spec.md §4.2), not the one it
    /// happened to start with. This is what lets re-routing across threads
    /// happen at all: without overwriting, a slot built by the constructing
    /// thread could never become sticky to any worker that later releases it.
    pub(crate) fn push(&self, mut slot: Slot<T>, key: ThreadId) {
        match self {
            Self::Queue(q) => q.push(slot),
            Self::Affinity(map) => {
                slot.affinity_key = Some(key);
                map.entry(key).or_insert_with(SegQueue::new).push(slot);
            }
        }
    }

    /// Requeue a slot the drain popped via [`Self::take_any`] but could not
    /// hand over (no pending borrower, or the borrower it found had already
    /// cancelled). Unlike [`Self::push`] this is not a release: the slot's
    /// existing affinity tag is preserved so merely inspecting it during a
    /// drain pass can never reroute it away from its owning thread. `key`
    /// (the draining thread) is only used as a fallback for the
    /// affinity-less case, which in practice cannot occur here since every
    /// slot reaching this method was deposited by [`Self::push`] first.
    pub(crate) fn push_back(&self, mut slot: Slot<T>, key: ThreadId) {
        match self {
            Self::Queue(q) => q.push(slot),
            Self::Affinity(map) => {
                let route = slot.affinity_key.unwrap_or(key);
                slot.affinity_key = Some(route);
                map.entry(route).or_insert_with(SegQueue::new).push(slot);
            }
        }
    }

    /// Take any one available slot (used by the global drain). For the
    /// affinity engine this scans sub-queues, stopping at the first
    /// non-empty one encountered — spec leaves the tie-break unspecified
    /// beyond "first non-empty encountered".
    pub(crate) fn take_any(&self) -> Option<Slot<T>> {
        match self {
            Self::Queue(q) => q.pop(),
            Self::Affinity(map) => {
                for entry in map.iter() {
                    if let Some(slot) = entry.value().pop() {
                        return Some(slot);
                    }
                }
                None
            }
        }
    }

    /// Fast path only: take a slot from exactly this thread's sub-queue.
    /// Always `None` for the queue engine.
    pub(crate) fn take_for(&self, key: ThreadId) -> Option<Slot<T>> {
        match self {
            Self::Queue(_) => None,
            Self::Affinity(map) => map.get(&key).and_then(|q| q.pop()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Queue(q) => q.len(),
            Self::Affinity(map) => map.iter().map(|e| e.value().len()).sum(),
        }
    }

    /// Drain every slot, regardless of sub-queue, for shutdown.
    pub(crate) fn drain_all(&self) -> Vec<Slot<T>> {
        match self {
            Self::Queue(q) => std::iter::from_fn(|| q.pop()).collect(),
            Self::Affinity(map) => map
                .iter()
                .flat_map(|e| std::iter::from_fn(|| e.value().pop()).collect::<Vec<_>>())
                .collect(),
        }
    }
}
