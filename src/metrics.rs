//! Passive metrics observer and the read-only counterpart exposed by the pool.

use std::time::Duration;

/// Fire-and-forget observer. Every method has a no-op default, so
/// implementing only the handful a caller cares about is enough.
pub trait PoolMetricsRecorder: Send + Sync {
    fn record_allocation_success_and_latency(&self, _latency: Duration) {}
    fn record_allocation_failure_and_latency(&self, _latency: Duration) {}
    fn record_recycled(&self) {}
    fn record_reset_latency(&self, _latency: Duration) {}
    fn record_destroy_latency(&self, _latency: Duration) {}
    /// Affinity engine only: a fast-path delivery bypassed the global drain.
    fn record_fast_path(&self) {}
    /// Affinity engine only: an acquire fell through to the global drain.
    fn record_slow_path(&self) {}
}

/// The default recorder: every event is dropped on the floor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl PoolMetricsRecorder for NoopRecorder {}

/// Logs every event at `trace` level via `tracing`. Gated by the `tracing`
/// feature; with it disabled this type still exists but every method is a
/// no-op, so swapping it in never requires conditional compilation at the
/// call site.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

#[cfg(feature = "tracing")]
impl PoolMetricsRecorder for TracingRecorder {
    fn record_allocation_success_and_latency(&self, latency: Duration) {
        tracing::trace!(?latency, "allocation succeeded");
    }

    fn record_allocation_failure_and_latency(&self, latency: Duration) {
        tracing::trace!(?latency, "allocation failed");
    }

    fn record_recycled(&self) {
        tracing::trace!("slot recycled");
    }

    fn record_reset_latency(&self, latency: Duration) {
        tracing::trace!(?latency, "release handler ran");
    }

    fn record_destroy_latency(&self, latency: Duration) {
        tracing::trace!(?latency, "slot destroyed");
    }

    fn record_fast_path(&self) {
        tracing::trace!("affinity fast path hit");
    }

    fn record_slow_path(&self) {
        tracing::trace!("affinity slow path taken");
    }
}

#[cfg(not(feature = "tracing"))]
impl PoolMetricsRecorder for TracingRecorder {}

/// Point-in-time read-only snapshot, the counterpart to the write-only
/// [`PoolMetricsRecorder`] observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub idle: usize,
    pub in_use: usize,
    pub pending: usize,
    pub size_max: usize,
}
