//! Optional hook for normalizing which thread/task resumes a delivered borrower.

use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Interposed between "the drain decided a slot is ready" and "the borrower's
/// consumer is resumed". Left unset, delivery happens inline on whichever
/// thread produced the match — the acquiring thread, the releasing thread,
/// or a prior drainer — which is the documented, non-deterministic baseline.
pub trait AcquisitionScheduler: Send + Sync {
    fn schedule(&self, delivery: BoxFuture<'static, ()>);
}

/// Runs the delivery on a fresh `tokio` task, normalizing away the "which
/// thread completed the drain" non-determinism entirely.
pub struct SpawnScheduler;

impl AcquisitionScheduler for SpawnScheduler {
    fn schedule(&self, delivery: BoxFuture<'static, ()>) {
        tokio::spawn(delivery);
    }
}
