//! The public pool handle: construction, acquisition, and shutdown.

use std::sync::Arc;

use crate::borrower::Borrower;
use crate::config::{PoolConfig, Topology};
use crate::engine::PoolInner;
use crate::error::{BuildError, PoolError};
use crate::guard::{Acquire, PooledRef};
use crate::metrics::PoolSnapshot;
use crate::poolable::Poolable;
use crate::slot::SlotState;

/// A reactive, lock-free object pool over resources described by `P`.
///
/// Cheaply `Clone`-able: every clone shares the same underlying engine, idle
/// set, and pending queue. Selects the queue engine or the thread-affinity
/// engine at construction time via [`PoolConfig::topology`].
pub struct Pool<P: Poolable> {
    inner: Arc<PoolInner<P>>,
}

impl<P: Poolable> Clone for Pool<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Poolable> Pool<P> {
    /// Construct a pool, eagerly allocating `config.initial_size` resources.
    /// Any failure during eager allocation aborts construction; resources
    /// already allocated in that batch are destroyed before returning.
    pub async fn new(resource: P, config: PoolConfig) -> Result<Self, BuildError> {
        let inner = PoolInner::build(resource, config).await?;
        Ok(Self { inner })
    }

    /// Obtain a resource, allocating a new one if none is idle and capacity
    /// remains. The returned future is cancel-safe: dropping it before it
    /// resolves withdraws the request without leaking a permit.
    pub async fn acquire(&self) -> Result<PooledRef<P>, PoolError> {
        if self.inner.is_terminated() {
            return Err(PoolError::ShutDown);
        }

        if self.inner.topology == Topology::Affinity {
            let key = std::thread::current().id();
            if let Some(mut slot) = self.inner.take_affine(key) {
                if self.inner.resource.should_evict(&slot.item, &slot.metrics) {
                    self.inner.spawn_destroy(slot);
                } else {
                    self.inner.metrics_recorder.record_fast_path();
                    slot.state = SlotState::Acquired;
                    slot.metrics.record_acquire();
                    return Ok(PooledRef::new(slot, Arc::clone(&self.inner)));
                }
            }
            self.inner.metrics_recorder.record_slow_path();
        }

        let (borrower, rx) = Borrower::new();
        self.inner.enqueue(Arc::clone(&borrower));
        Acquire::new(borrower, rx)
            .await
            .map(|slot| PooledRef::new(slot, Arc::clone(&self.inner)))
    }

    /// Idempotent. Fails every pending borrower with [`PoolError::ShutDown`],
    /// destroys every idle slot, and marks the pool so that later `acquire`
    /// calls fail immediately. Slots already out with a borrower are
    /// destroyed the next time they are released, not here.
    pub async fn shutdown(&self) {
        self.inner.shutdown().await;
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.is_terminated()
    }

    /// Point-in-time counts: idle slots, slots out with borrowers, and
    /// borrowers still waiting.
    pub fn metrics(&self) -> PoolSnapshot {
        self.inner.snapshot()
    }

    pub fn idle_count(&self) -> usize {
        self.inner.idle.len()
    }

    pub fn in_use(&self) -> usize {
        self.inner.snapshot().in_use
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending_len()
    }
}

impl<P: Poolable> std::fmt::Debug for Pool<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.metrics();
        f.debug_struct("Pool")
            .field("idle", &snapshot.idle)
            .field("in_use", &snapshot.in_use)
            .field("pending", &snapshot.pending)
            .field("size_max", &snapshot.size_max)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
