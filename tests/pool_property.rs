//! Property tests for the permit-safety and idle/in-use invariants laid out
//! in the scenario catalog's testable properties #1 and #2.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use nebula_pool::{Pool, PoolConfig};
use proptest::prelude::*;

struct CountingResource {
    counter: AtomicU64,
}

impl CountingResource {
    fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

impl nebula_pool::Poolable for CountingResource {
    type Item = u64;

    async fn allocate(&self) -> Result<u64, nebula_pool::BoxError> {
        Ok(self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// At every observable point, `idle + in_use <= size_max`, across an
    /// arbitrary interleaving of acquire and release ops -- the pool-wide
    /// counterpart of testable property #1 ("permit safety").
    #[test]
    fn idle_plus_in_use_never_exceeds_size_max(
        size_max in 1usize..8,
        ops in proptest::collection::vec(prop_oneof![Just(true), Just(false)], 1..40),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let config = PoolConfig::new(NonZeroUsize::new(size_max).unwrap());
            let pool = Pool::new(CountingResource::new(), config).await.unwrap();
            let mut guards = Vec::new();

            for op_is_acquire in &ops {
                if *op_is_acquire {
                    if let Ok(guard) = pool.acquire().await {
                        guards.push(guard);
                    }
                } else if !guards.is_empty() {
                    guards.pop();
                    // give the spawned release task a chance to run
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }

                let snapshot = pool.metrics();
                prop_assert!(
                    snapshot.idle + snapshot.in_use <= size_max,
                    "invariant violated: idle={} + in_use={} > size_max={}",
                    snapshot.idle, snapshot.in_use, size_max,
                );
                prop_assert!(snapshot.in_use <= size_max);
            }

            drop(guards);
            tokio::time::sleep(Duration::from_millis(20)).await;

            let snapshot = pool.metrics();
            prop_assert_eq!(snapshot.in_use, 0, "all guards dropped, in_use should be 0");
            prop_assert!(snapshot.idle <= size_max);

            Ok(())
        })?;
    }
}

/// Deterministic counterpart: rapid acquire-release cycling never exceeds
/// `size_max` and never leaves a stray permit behind.
#[tokio::test(flavor = "multi_thread")]
async fn rapid_acquire_release_preserves_invariants() {
    let size_max = 4;
    let config = PoolConfig::new(NonZeroUsize::new(size_max).unwrap());
    let pool = Pool::new(CountingResource::new(), config).await.unwrap();

    for _ in 0..50 {
        let guard = pool.acquire().await.unwrap();
        drop(guard);
        tokio::time::sleep(Duration::from_millis(2)).await;

        let snapshot = pool.metrics();
        assert!(snapshot.idle + snapshot.in_use <= size_max);
    }

    assert_eq!(pool.in_use(), 0);
}
