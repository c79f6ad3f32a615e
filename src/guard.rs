//! The RAII handle returned by `acquire`, and the lazy future it resolves
//! from.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::borrower::Borrower;
use crate::engine::PoolInner;
use crate::error::PoolError;
use crate::poolable::Poolable;
use crate::slot::Slot;

/// The lazy, cancellable future behind a slow-path `acquire`. Dropping it
/// before it resolves is the cancellation signal described in the borrower
/// handle's state machine — no separate `cancel()` method is exposed.
pub(crate) struct Acquire<T> {
    borrower: Arc<Borrower<T>>,
    rx: oneshot::Receiver<Result<Slot<T>, PoolError>>,
}

impl<T> Acquire<T> {
    pub(crate) fn new(
        borrower: Arc<Borrower<T>>,
        rx: oneshot::Receiver<Result<Slot<T>, PoolError>>,
    ) -> Self {
        Self { borrower, rx }
    }
}

impl<T> Future for Acquire<T> {
    type Output = Result<Slot<T>, PoolError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(PoolError::ShutDown)))
    }
}

impl<T> Drop for Acquire<T> {
    fn drop(&mut self) {
        self.borrower.cancel();
    }
}

/// An exclusive handle to one pooled resource. Releases itself back to the
/// pool on drop; call [`Self::invalidate`] to force destruction instead, or
/// [`Self::release`] to await the release pipeline and observe its result.
pub struct PooledRef<P: Poolable> {
    slot: Option<Slot<P::Item>>,
    pool: Arc<PoolInner<P>>,
}

impl<P: Poolable> PooledRef<P> {
    pub(crate) fn new(slot: Slot<P::Item>, pool: Arc<PoolInner<P>>) -> Self {
        Self {
            slot: Some(slot),
            pool,
        }
    }

    /// How many times the underlying resource has been delivered, and how
    /// long ago it was created.
    pub fn metrics(&self) -> &crate::slot::SlotMetrics {
        self.slot.as_ref().expect("slot taken").metrics()
    }

    /// Destroy the resource unconditionally instead of recycling it —
    /// "this resource is poisoned."
    pub async fn invalidate(mut self) {
        let slot = self.slot.take().expect("slot taken");
        self.pool.clone().invalidate(slot).await;
    }

    /// Run the release pipeline and wait for it, observing
    /// [`PoolError::ReleaseFailed`] if the release handler errors. Prefer
    /// this over dropping the guard when the caller needs to know whether
    /// release succeeded; otherwise dropping is equivalent except that
    /// failures are only logged.
    pub async fn release(mut self) -> Result<(), PoolError> {
        let slot = self.slot.take().expect("slot taken");
        self.pool.clone().release(slot).await
    }
}

impl<P: Poolable> Deref for PooledRef<P> {
    type Target = P::Item;

    fn deref(&self) -> &Self::Target {
        &self.slot.as_ref().expect("slot taken").item
    }
}

impl<P: Poolable> DerefMut for PooledRef<P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.slot.as_mut().expect("slot taken").item
    }
}

impl<P: Poolable> Drop for PooledRef<P> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.pool.spawn_release(slot);
        }
    }
}

impl<P> std::fmt::Debug for PooledRef<P>
where
    P: Poolable,
    P::Item: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledRef")
            .field("item", &self.slot.as_ref().map(|s| &s.item))
            .finish()
    }
}
