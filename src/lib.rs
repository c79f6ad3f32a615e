//! A reactive, lock-free object pool.
//!
//! [`Pool`] lends out expensive-to-create resources — database connections,
//! sockets, parsers, anything describable by [`Poolable`] — to many
//! concurrent callers, recycles them on release, and bounds their total
//! count. The coordination engine underneath is lock-free: a single
//! work-in-progress counter serializes the drain loop that matches pending
//! `acquire` calls against idle slots or newly allocated ones, so the hot
//! path never blocks on a mutex.
//!
//! Two topologies share that contract: [`Topology::Queue`] reconciles one
//! central idle/pending pair; [`Topology::Affinity`] additionally steers a
//! thread's requests toward resources that same thread released, with a
//! fast path that skips the drain loop entirely when one is available.
//!
//! ```no_run
//! use std::num::NonZeroUsize;
//! use nebula_pool::{Pool, PoolConfig, Poolable};
//!
//! struct Sockets;
//!
//! impl Poolable for Sockets {
//!     type Item = u64;
//!
//!     async fn allocate(&self) -> Result<u64, nebula_pool::BoxError> {
//!         Ok(42)
//!     }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = Pool::new(Sockets, PoolConfig::new(NonZeroUsize::new(10).unwrap())).await?;
//! let conn = pool.acquire().await?;
//! assert_eq!(*conn, 42);
//! # Ok(())
//! # }
//! ```

mod borrower;
mod config;
mod engine;
mod error;
mod guard;
mod idle;
mod metrics;
mod pool;
mod poolable;
mod scheduler;
mod slot;

pub use config::{PoolConfig, Topology};
pub use error::{BoxError, BuildError, ConfigError, InitError, PoolError, Result};
pub use guard::PooledRef;
pub use metrics::{NoopRecorder, PoolMetricsRecorder, PoolSnapshot, TracingRecorder};
pub use pool::Pool;
pub use poolable::Poolable;
pub use scheduler::{AcquisitionScheduler, BoxFuture, SpawnScheduler};
pub use slot::SlotMetrics;
