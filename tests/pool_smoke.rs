//! End-to-end smoke test exercising eviction, allocation, and recycling
//! together, as laid out in the scenario catalog's "Smoke" case.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use nebula_pool::{Pool, PoolConfig, Poolable};

struct Counted {
    next_id: AtomicU64,
}

struct Instance {
    id: u64,
    used: u32,
}

impl Poolable for Counted {
    type Item = Instance;

    async fn allocate(&self) -> Result<Instance, nebula_pool::BoxError> {
        Ok(Instance {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            used: 0,
        })
    }

    async fn release(&self, item: &mut Instance) -> Result<(), nebula_pool::BoxError> {
        item.used += 1;
        Ok(())
    }

    fn should_evict(&self, item: &Instance, _metrics: &nebula_pool::SlotMetrics) -> bool {
        item.used >= 2
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn borrow_batches_reuse_until_eviction_then_allocate_fresh() {
    let resource = Counted {
        next_id: AtomicU64::new(0),
    };
    let config = PoolConfig::new(NonZeroUsize::new(3).unwrap()).with_initial_size(2);
    let pool = Pool::new(resource, config).await.unwrap();

    // Borrow 3: two idle instances plus one freshly allocated.
    let first_batch: Vec<_> = acquire_n(&pool, 3).await;
    let first_ids: Vec<u64> = first_batch.iter().map(|g| g.id).collect();
    assert_eq!(first_ids.len(), 3);

    // Borrow 3 more while the first batch is still held: all pend.
    let pool_clone = pool.clone();
    let pending = tokio::spawn(async move { acquire_n(&pool_clone, 3).await });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(pool.pending_count(), 3);

    // Releasing the first batch hands the same instances to the second batch.
    for guard in first_batch {
        guard.release().await.unwrap();
    }
    let second_batch = pending.await.unwrap();
    let mut second_ids: Vec<u64> = second_batch.iter().map(|g| g.id).collect();
    second_ids.sort_unstable();
    let mut expected_ids = first_ids;
    expected_ids.sort_unstable();
    assert_eq!(second_ids, expected_ids, "second batch should reuse instances");
    assert_eq!(pool.in_use(), 3);

    // Release the second batch -> now used == 2, so they are evicted on the
    // next handover rather than handed to a third batch as-is.
    let pool_clone = pool.clone();
    let third_waiting = tokio::spawn(async move { acquire_n(&pool_clone, 3).await });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    for guard in second_batch {
        guard.release().await.unwrap();
    }

    let third_batch = third_waiting.await.unwrap();
    let third_ids: Vec<u64> = third_batch.iter().map(|g| g.id).collect();
    assert!(
        third_ids.iter().all(|id| !expected_ids.contains(id)),
        "third batch should receive fresh instances, not the evicted ones"
    );
}

async fn acquire_n(
    pool: &Pool<Counted>,
    n: usize,
) -> Vec<nebula_pool::PooledRef<Counted>> {
    let mut guards = Vec::with_capacity(n);
    for _ in 0..n {
        guards.push(pool.acquire().await.unwrap());
    }
    guards
}
