//! The lock-free drain loop shared by the queue engine and the affinity
//! engine's slow path, plus the release/invalidate/shutdown pipelines.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::ThreadId;
use std::time::Instant;

use crossbeam::queue::SegQueue;
use tokio::sync::Semaphore;

use crate::borrower::{Borrower, Delivery};
use crate::config::{PoolConfig, Topology};
use crate::error::{BuildError, InitError, PoolError};
use crate::idle::IdleStore;
use crate::metrics::{NoopRecorder, PoolMetricsRecorder, PoolSnapshot};
use crate::poolable::Poolable;
use crate::scheduler::AcquisitionScheduler;
use crate::slot::{Slot, SlotState};

pub(crate) struct PoolInner<P: Poolable> {
    pub(crate) resource: P,
    pub(crate) topology: Topology,
    pub(crate) size_max: usize,
    pub(crate) idle: IdleStore<P::Item>,
    pending: SegQueue<Arc<Borrower<P::Item>>>,
    permits: Semaphore,
    wip: AtomicUsize,
    terminated: AtomicBool,
    pub(crate) metrics_recorder: Arc<dyn PoolMetricsRecorder>,
    acquisition_scheduler: Option<Arc<dyn AcquisitionScheduler>>,
}

impl<P: Poolable> PoolInner<P> {
    pub(crate) async fn build(resource: P, config: PoolConfig) -> Result<Arc<Self>, BuildError> {
        config.validate()?;
        let size_max = config.size_max.get();
        let idle = match config.topology {
            Topology::Queue => IdleStore::new_queue(),
            Topology::Affinity => IdleStore::new_affinity(),
        };
        let inner = Arc::new(Self {
            resource,
            topology: config.topology,
            size_max,
            idle,
            pending: SegQueue::new(),
            permits: Semaphore::new(size_max),
            wip: AtomicUsize::new(0),
            terminated: AtomicBool::new(false),
            metrics_recorder: config
                .metrics_recorder
                .unwrap_or_else(|| Arc::new(NoopRecorder)),
            acquisition_scheduler: config.acquisition_scheduler,
        });

        // Eagerly-allocated slots go straight to idle without ever being
        // delivered, so they never hold a permit — `permits` tracks slots
        // currently out with a borrower (see `drain_pass`/`release` below),
        // and `initial_size <= size_max` (checked by `validate()` above) is
        // what bounds this loop instead.
        for index in 0..config.initial_size {
            match inner.resource.allocate().await {
                Ok(item) => {
                    inner.idle.push(Slot::new(item), std::thread::current().id());
                }
                Err(source) => {
                    for slot in inner.idle.drain_all() {
                        inner.destroy(slot).await;
                    }
                    return Err(BuildError::Init(InitError {
                        index,
                        total: config.initial_size,
                        source,
                    }));
                }
            }
        }

        Ok(inner)
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            idle: self.idle.len(),
            in_use: self.size_max - self.permits.available_permits(),
            pending: self.pending.len(),
            size_max: self.size_max,
        }
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Fast path: try to take a slot from this thread's own sub-queue
    /// without touching the pending queue or the WIP trampoline at all.
    pub(crate) fn take_affine(&self, key: ThreadId) -> Option<Slot<P::Item>> {
        self.idle.take_for(key)
    }

    pub(crate) fn enqueue(self: &Arc<Self>, borrower: Arc<Borrower<P::Item>>) {
        self.pending.push(borrower);
        self.drain();
    }

    /// The WIP trampoline: at most one thread executes `drain_pass` at a
    /// time. A thread that loses the race simply bumps the counter and
    /// trusts the active drainer to observe its work before exiting.
    pub(crate) fn drain(self: &Arc<Self>) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1usize;
        loop {
            self.drain_pass();
            let prior = self.wip.fetch_sub(missed, Ordering::AcqRel);
            missed = prior - missed;
            if missed == 0 {
                break;
            }
        }
    }

    /// Repeatedly match pending borrowers against idle slots or freshly
    /// allocated ones until neither is possible.
    fn drain_pass(self: &Arc<Self>) {
        loop {
            let idle_count = self.idle.len();
            let pending_count = self.pending.len();
            let remaining_permits = self.permits.available_permits();

            if idle_count == 0 && pending_count > 0 && remaining_permits > 0 {
                let Some(borrower) = self.pending.pop() else {
                    continue;
                };
                if !borrower.claim() {
                    continue;
                }
                let Ok(permit) = self.permits.try_acquire() else {
                    if borrower.unclaim() {
                        self.pending.push(borrower);
                    }
                    continue;
                };
                permit.forget();
                self.spawn_allocate(borrower);
            } else if idle_count > 0 && pending_count > 0 {
                let Some(slot) = self.idle.take_any() else {
                    continue;
                };
                if self.resource.should_evict(&slot.item, &slot.metrics) {
                    // Discovered evictable while still idle: this slot never
                    // held a permit (see note in `build()`), so destroying it
                    // here returns none either.
                    self.spawn_destroy(slot);
                    continue;
                }
                let Some(borrower) = self.pending.pop() else {
                    self.idle.push_back(slot, std::thread::current().id());
                    continue;
                };
                if !borrower.claim() {
                    self.idle.push_back(slot, std::thread::current().id());
                    continue;
                }
                // Handover consumes a permit exactly like the allocate path
                // does: idle + delivered <= size_max is an invariant, so with
                // idle_count > 0 here this can never actually be exhausted —
                // acquiring it regardless keeps the semaphore's bookkeeping
                // authoritative rather than relying on that proof at a distance.
                let Ok(permit) = self.permits.try_acquire() else {
                    self.idle.push_back(slot, std::thread::current().id());
                    if borrower.unclaim() {
                        self.pending.push(borrower);
                    }
                    continue;
                };
                permit.forget();
                self.deliver(borrower, slot);
            } else {
                break;
            }
        }
    }

    /// Hand a claimed slot to its borrower, honoring the configured
    /// [`AcquisitionScheduler`] if one is set. Left unset, delivery happens
    /// inline on whichever thread produced the match (the drain thread here,
    /// or the allocator's completion thread from `spawn_allocate`) — the
    /// non-deterministic baseline the core documents. When set, the actual
    /// resumption of the borrower's consumer is handed to the scheduler
    /// instead, normalizing away that non-determinism.
    fn deliver(self: &Arc<Self>, borrower: Arc<Borrower<P::Item>>, mut slot: Slot<P::Item>) {
        slot.state = SlotState::Acquired;
        slot.metrics.record_acquire();
        match &self.acquisition_scheduler {
            Some(scheduler) => {
                let inner = Arc::clone(self);
                scheduler.schedule(Box::pin(async move {
                    match borrower.deliver(slot) {
                        Delivery::Delivered => {}
                        Delivery::Recycle(slot) => inner.spawn_release(slot),
                    }
                }));
            }
            None => match borrower.deliver(slot) {
                Delivery::Delivered => {}
                Delivery::Recycle(slot) => self.spawn_release(slot),
            },
        }
    }

    fn spawn_allocate(self: &Arc<Self>, borrower: Arc<Borrower<P::Item>>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let start = Instant::now();
            match inner.resource.allocate().await {
                Ok(item) => {
                    inner
                        .metrics_recorder
                        .record_allocation_success_and_latency(start.elapsed());
                    inner.deliver(borrower, Slot::new(item));
                }
                Err(source) => {
                    inner
                        .metrics_recorder
                        .record_allocation_failure_and_latency(start.elapsed());
                    inner.permits.add_permits(1);
                    borrower.fail(PoolError::AllocationFailed(source));
                    inner.drain();
                }
            }
        });
    }

    pub(crate) fn spawn_destroy(self: &Arc<Self>, slot: Slot<P::Item>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.destroy(slot).await;
        });
    }

    pub(crate) fn spawn_release(self: &Arc<Self>, slot: Slot<P::Item>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = inner.release(slot).await {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "release handler failed on implicit drop");
                #[cfg(not(feature = "tracing"))]
                let _ = err;
            }
        });
    }

    async fn destroy(self: &Arc<Self>, mut slot: Slot<P::Item>) {
        slot.state = SlotState::Destroyed;
        let start = Instant::now();
        self.resource.destroy(slot.item).await;
        self.metrics_recorder.record_destroy_latency(start.elapsed());
    }

    /// The release pipeline shared by `PooledRef::drop` (errors logged) and
    /// `PooledRef::release` (errors returned), and by the cancel-during-claim
    /// and cancel-during-allocate races, which route an unwanted slot through
    /// here exactly as if its phantom borrower had released it.
    pub(crate) async fn release(self: &Arc<Self>, mut slot: Slot<P::Item>) -> Result<(), PoolError> {
        if self.is_terminated() {
            self.permits.add_permits(1);
            self.destroy(slot).await;
            return Ok(());
        }

        let start = Instant::now();
        match self.resource.release(&mut slot.item).await {
            Ok(()) => {
                self.metrics_recorder.record_reset_latency(start.elapsed());
                if self.resource.should_evict(&slot.item, &slot.metrics) {
                    self.permits.add_permits(1);
                    self.destroy(slot).await;
                } else {
                    slot.metrics.record_release();
                    slot.state = SlotState::Available;
                    self.permits.add_permits(1);
                    self.metrics_recorder.record_recycled();
                    self.idle.push(slot, std::thread::current().id());
                }
                self.drain();
                Ok(())
            }
            Err(source) => {
                self.permits.add_permits(1);
                self.destroy(slot).await;
                self.drain();
                Err(PoolError::ReleaseFailed(source))
            }
        }
    }

    pub(crate) async fn invalidate(self: &Arc<Self>, slot: Slot<P::Item>) {
        self.permits.add_permits(1);
        self.destroy(slot).await;
        self.drain();
    }

    /// Idempotent. First caller drains `pending` with `PoolShutDown` and
    /// destroys every idle slot; held slots are destroyed on their own
    /// eventual release, once `release()` observes `is_terminated()`.
    pub(crate) async fn shutdown(self: &Arc<Self>) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        while let Some(borrower) = self.pending.pop() {
            borrower.shutdown_fail(PoolError::ShutDown);
        }
        for slot in self.idle.drain_all() {
            self.destroy(slot).await;
        }
    }
}
