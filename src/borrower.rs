//! The handle representing one pending `acquire` request.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::PoolError;
use crate::slot::Slot;

// INIT is implicit: a `Borrower` is never observable before it is pushed
// onto the pending queue, so construction starts directly at SUBSCRIBED.
const SUBSCRIBED: u8 = 1;
const CLAIMED: u8 = 2;
const CANCELLED: u8 = 3;
const DELIVERED: u8 = 4;
const FAILED: u8 = 5;
const CANCELLED_DELIVERED: u8 = 6;

/// Outcome of handing a slot to a borrower the drain has already claimed.
pub(crate) enum Delivery<T> {
    /// The borrower was still live; the slot is now theirs.
    Delivered,
    /// The borrower cancelled between claim and delivery; the slot was never
    /// handed to a consumer and must be routed through the release path as
    /// if the (phantom) borrower had released it immediately.
    Recycle(Slot<T>),
}

/// One pending `acquire` request: a CAS-guarded state machine plus the
/// one-shot channel used to resume its caller.
///
/// `INIT -> SUBSCRIBED -> (CLAIMED | CANCELLED) -> (DELIVERED | FAILED | CANCELLED_DELIVERED)`.
pub(crate) struct Borrower<T> {
    state: AtomicU8,
    sender: Mutex<Option<oneshot::Sender<Result<Slot<T>, PoolError>>>>,
}

impl<T> Borrower<T> {
    pub(crate) fn new() -> (
        std::sync::Arc<Self>,
        oneshot::Receiver<Result<Slot<T>, PoolError>>,
    ) {
        let (tx, rx) = oneshot::channel();
        let borrower = std::sync::Arc::new(Self {
            state: AtomicU8::new(SUBSCRIBED),
            sender: Mutex::new(Some(tx)),
        });
        (borrower, rx)
    }

    /// Attempt to take ownership of this borrower's delivery on behalf of the
    /// drain. Fails (returns `false`) if the borrower already cancelled.
    pub(crate) fn claim(&self) -> bool {
        self.state
            .compare_exchange(SUBSCRIBED, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called from the `Acquire` future's `Drop`. A no-op once the borrower
    /// has already reached a terminal state.
    pub(crate) fn cancel(&self) {
        loop {
            let current = self.state.load(Ordering::Acquire);
            if current != SUBSCRIBED && current != CLAIMED {
                return;
            }
            if self
                .state
                .compare_exchange(current, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Deliver an allocated or recycled slot to this (claimed) borrower. If
    /// the borrower cancelled after claim but before this call, the slot is
    /// handed back to the caller for recycling instead of being sent down
    /// the channel.
    pub(crate) fn deliver(&self, slot: Slot<T>) -> Delivery<T> {
        match self
            .state
            .compare_exchange(CLAIMED, DELIVERED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                if let Some(tx) = self.sender.lock().take() {
                    let _ = tx.send(Ok(slot));
                    return Delivery::Delivered;
                }
                Delivery::Recycle(slot)
            }
            Err(_) => {
                self.state.store(CANCELLED_DELIVERED, Ordering::Release);
                Delivery::Recycle(slot)
            }
        }
    }

    /// Fail this (claimed) borrower, e.g. because allocation errored. A
    /// no-op if the borrower already cancelled — the consumer must see no
    /// notification after cancel.
    pub(crate) fn fail(&self, err: PoolError) {
        if self
            .state
            .compare_exchange(CLAIMED, FAILED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            && let Some(tx) = self.sender.lock().take()
        {
            let _ = tx.send(Err(err));
        }
    }

    /// Revert a claim that could not be honored (no permit available). A
    /// concurrent `cancel()` may have already raced ahead of this call, in
    /// which case there is nothing left to revert: returns `false` and the
    /// borrower is simply dropped rather than requeued.
    pub(crate) fn unclaim(&self) -> bool {
        self.state
            .compare_exchange(CLAIMED, SUBSCRIBED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Force a still-pending or claimed-but-undelivered borrower to fail,
    /// used by `dispose()` to drain the pending queue with `PoolShutDown`.
    /// Unlike [`Self::fail`] this does not require the borrower to already
    /// be claimed — a borrower parked in the pending queue never was.
    pub(crate) fn shutdown_fail(&self, err: PoolError) {
        loop {
            let current = self.state.load(Ordering::Acquire);
            if current != SUBSCRIBED && current != CLAIMED {
                return;
            }
            if self
                .state
                .compare_exchange(current, FAILED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if let Some(tx) = self.sender.lock().take() {
                    let _ = tx.send(Err(err));
                }
                return;
            }
        }
    }
}
