//! The allocator/release/destroy/eviction bundle a resource type implements.

use std::future::Future;

use crate::error::BoxError;
use crate::slot::SlotMetrics;

/// Describes how to create, recycle, and destroy one kind of pooled resource.
///
/// This is the sole seam between the pool's coordination engine (generic,
/// lock-free, and otherwise oblivious to what `Item` is) and the concrete
/// resource a caller wants pooled — a database connection, a socket, a
/// parser. One implementation fully answers the four questions the engine
/// needs: how to make one, how to clean one up between borrows, how to tear
/// one down for good, and when a released one should be torn down instead of
/// recycled.
pub trait Poolable: Send + Sync + 'static {
    /// The pooled resource itself.
    type Item: Send + 'static;

    /// Create a new instance. Invoked by the drain loop once a permit has
    /// been reserved; a failure here returns the permit and fails exactly
    /// the borrower that triggered the allocation.
    fn allocate(&self) -> impl Future<Output = Result<Self::Item, BoxError>> + Send;

    /// Clean an instance between borrows, before it re-enters the idle set.
    /// The default does nothing.
    fn release(
        &self,
        _item: &mut Self::Item,
    ) -> impl Future<Output = Result<(), BoxError>> + Send {
        async { Ok(()) }
    }

    /// Tear an instance down for good, on eviction or shutdown. Infallible:
    /// there is nothing left to report a failure to by this point.
    fn destroy(&self, item: Self::Item) -> impl Future<Output = ()> + Send {
        async move {
            drop(item);
        }
    }

    /// Called on handover, never on release: return `true` to destroy the
    /// slot instead of delivering it. The default never evicts.
    fn should_evict(&self, _item: &Self::Item, _metrics: &SlotMetrics) -> bool {
        false
    }
}
