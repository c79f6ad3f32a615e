//! Error taxonomy surfaced to acquirers and releasers.

/// Type-erased source error from user-supplied allocator/release/destroy hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = PoolError> = std::result::Result<T, E>;

/// Errors surfaced by [`crate::Pool`] to the caller that triggered them.
///
/// `DestroyHandlerFailed` deliberately has no variant here: destruction is
/// best-effort and its failures are logged, never propagated (see
/// [`crate::Pool::shutdown`] and the `destroy` hook in [`crate::Poolable`]).
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Raised for any acquire issued after [`crate::Pool::shutdown`], and for
    /// any borrower still pending when shutdown begins.
    #[error("pool is shut down")]
    ShutDown,

    /// The allocator failed while servicing a specific acquire. The permit it
    /// reserved has already been returned by the time this reaches the caller.
    #[error("allocation failed")]
    AllocationFailed(#[source] BoxError),

    /// The release handler failed for a specific release. The slot has
    /// already been destroyed and its permit returned.
    #[error("release handler failed")]
    ReleaseFailed(#[source] BoxError),
}

/// Failure of an eagerly-allocated initial slot during [`crate::Pool::new`].
#[derive(Debug, thiserror::Error)]
#[error("initial allocation {index} of {total} failed: {source}")]
pub struct InitError {
    pub index: usize,
    pub total: usize,
    #[source]
    pub source: BoxError,
}

/// Rejected [`crate::PoolConfig`] values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("initial_size ({initial_size}) must not exceed size_max ({size_max})")]
    InitialExceedsMax { initial_size: usize, size_max: usize },
}

/// Everything that can go wrong while constructing a [`crate::Pool`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Init(#[from] InitError),
}
