// Pool throughput benchmarks.
//
// Measures raw pool acquire/release overhead with a zero-cost resource
// (no I/O, instant allocate/release/destroy), for both topologies.

use std::hint::black_box;
use std::num::NonZeroUsize;

use criterion::{Criterion, criterion_group, criterion_main};
use nebula_pool::{BoxError, Pool, PoolConfig, Poolable, Topology};

struct NoOp;

impl Poolable for NoOp {
    type Item = u64;

    async fn allocate(&self) -> Result<u64, BoxError> {
        Ok(0)
    }
}

fn pool_config(size_max: usize, topology: Topology) -> PoolConfig {
    PoolConfig::new(NonZeroUsize::new(size_max).unwrap())
        .with_initial_size(size_max)
        .with_topology(topology)
}

fn single_thread_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to build runtime");
    let pool = rt
        .block_on(Pool::new(NoOp, pool_config(64, Topology::Queue)))
        .expect("failed to create pool");

    c.bench_function("queue_single_thread_acquire_release", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let guard = pool.acquire().await.unwrap();
                drop(guard);
                tokio::task::yield_now().await;
                black_box(())
            }
        });
    });
}

fn multi_thread_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");
    let pool = rt
        .block_on(Pool::new(NoOp, pool_config(64, Topology::Queue)))
        .expect("failed to create pool");

    c.bench_function("queue_multi_thread_acquire_release", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let guard = pool.acquire().await.unwrap();
                drop(guard);
                tokio::task::yield_now().await;
                black_box(())
            }
        });
    });
}

fn contended_queue_engine(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");
    // Small pool to create contention on the WIP trampoline.
    let pool = rt
        .block_on(Pool::new(NoOp, pool_config(4, Topology::Queue)))
        .expect("failed to create pool");

    c.bench_function("queue_contended_acquire_release_4slots", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let guard = pool.acquire().await.unwrap();
                drop(guard);
                tokio::task::yield_now().await;
                black_box(())
            }
        });
    });
}

fn affinity_fast_path(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");
    let pool = rt
        .block_on(Pool::new(NoOp, pool_config(64, Topology::Affinity)))
        .expect("failed to create pool");

    // Warm up so the benchmarking thread owns a slot in its own sub-queue
    // before the timed loop starts.
    rt.block_on(async {
        let guard = pool.acquire().await.unwrap();
        drop(guard);
    });

    c.bench_function("affinity_fast_path_acquire_release", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let guard = pool.acquire().await.unwrap();
                drop(guard);
                black_box(())
            }
        });
    });
}

criterion_group!(
    benches,
    single_thread_throughput,
    multi_thread_throughput,
    contended_queue_engine,
    affinity_fast_path
);
criterion_main!(benches);
