//! Plain configuration struct and the topology switch between engines.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::metrics::PoolMetricsRecorder;
use crate::scheduler::AcquisitionScheduler;

/// Selects the queue engine or the thread-affinity engine. A third topology
/// is not anticipated, so this is an enum rather than a `thread_affinity: bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Single central idle/pending queue pair, reconciled by one drain loop.
    #[default]
    Queue,
    /// Per-thread idle sub-queues with a fast path that bypasses the drain.
    Affinity,
}

/// Construction-time configuration. Not a builder by design — every field is
/// public and `PoolConfig` is a plain value type; use struct-update syntax
/// (`PoolConfig { topology: Topology::Affinity, ..PoolConfig::new(cap) }`) for
/// anything beyond the two or three fields most callers set.
#[derive(Clone)]
pub struct PoolConfig {
    /// Resources to allocate eagerly at construction. Any allocation failure
    /// there aborts construction entirely.
    pub initial_size: usize,
    /// Upper bound on concurrently live resources.
    pub size_max: NonZeroUsize,
    /// Queue engine vs. affinity engine.
    pub topology: Topology,
    /// Optional hint for which thread/task a delivered slot is resumed on.
    /// `None` means delivery happens inline on whichever thread produced the
    /// match — the non-deterministic baseline the core specifies.
    pub acquisition_scheduler: Option<Arc<dyn AcquisitionScheduler>>,
    /// Passive metrics observer. `None` installs a no-op recorder.
    pub metrics_recorder: Option<Arc<dyn PoolMetricsRecorder>>,
}

impl PoolConfig {
    /// A queue-topology config with the given capacity and nothing else set.
    pub fn new(size_max: NonZeroUsize) -> Self {
        Self {
            initial_size: 0,
            size_max,
            topology: Topology::Queue,
            acquisition_scheduler: None,
            metrics_recorder: None,
        }
    }

    #[must_use]
    pub fn with_initial_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    #[must_use]
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    #[must_use]
    pub fn with_acquisition_scheduler(mut self, scheduler: Arc<dyn AcquisitionScheduler>) -> Self {
        self.acquisition_scheduler = Some(scheduler);
        self
    }

    #[must_use]
    pub fn with_metrics_recorder(mut self, recorder: Arc<dyn PoolMetricsRecorder>) -> Self {
        self.metrics_recorder = Some(recorder);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_size > self.size_max.get() {
            return Err(ConfigError::InitialExceedsMax {
                initial_size: self.initial_size,
                size_max: self.size_max.get(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("initial_size", &self.initial_size)
            .field("size_max", &self.size_max)
            .field("topology", &self.topology)
            .field("acquisition_scheduler", &self.acquisition_scheduler.is_some())
            .field("metrics_recorder", &self.metrics_recorder.is_some())
            .finish()
    }
}
