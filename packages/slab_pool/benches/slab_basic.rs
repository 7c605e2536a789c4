//! Basic benchmarks for the `slab_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::alloc::Layout;
use std::hint::black_box;
use std::iter;
use std::time::Instant;

use criterion::{Criterion, criterion_group, criterion_main};
use slab_pool::SlabPool;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

type TestItem = usize;

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("slab_basic");

    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let layout = Layout::new::<TestItem>();

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(SlabPool::builder().slot_layout(layout).build()));
            }

            start.elapsed()
        });
    });

    group.bench_function("allocate_one", |b| {
        b.iter_custom(|iters| {
            let layout = Layout::new::<TestItem>();

            let mut pools = iter::repeat_with(|| SlabPool::builder().slot_layout(layout).build())
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let start = Instant::now();

            for pool in &mut pools {
                _ = black_box(pool.allocate());
            }

            start.elapsed()
        });
    });

    group.bench_function("deallocate_one", |b| {
        b.iter_custom(|iters| {
            let layout = Layout::new::<TestItem>();

            let mut pools = iter::repeat_with(|| SlabPool::builder().slot_layout(layout).build())
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let slots = pools
                .iter_mut()
                .map(SlabPool::allocate)
                .collect::<Vec<_>>();

            let start = Instant::now();

            for (pool, slot) in pools.iter_mut().zip(slots) {
                // SAFETY: The slot came from this pool and is deallocated exactly once.
                unsafe { pool.deallocate(black_box(slot)) };
            }

            start.elapsed()
        });
    });

    group.bench_function("locate_owner", |b| {
        b.iter_custom(|iters| {
            let layout = Layout::new::<TestItem>();

            let mut pool = SlabPool::builder().slot_layout(layout).build();
            let slot = pool.allocate();

            let start = Instant::now();

            for _ in 0..iters {
                _ = black_box(pool.locate_owner(black_box(slot)));
            }

            let elapsed = start.elapsed();

            // SAFETY: The slot came from this pool and is deallocated exactly once.
            unsafe { pool.deallocate(slot) };

            elapsed
        });
    });

    group.finish();

    let mut group = c.benchmark_group("slab_slow");

    group.bench_function("allocate_10k", |b| {
        b.iter_custom(|iters| {
            let layout = Layout::new::<TestItem>();

            let mut pools = iter::repeat_with(|| SlabPool::builder().slot_layout(layout).build())
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let start = Instant::now();

            for pool in &mut pools {
                for _ in 0..10_000 {
                    _ = black_box(pool.allocate());
                }
            }

            start.elapsed()
        });
    });

    group.bench_function("churn_10_times_1000", |b| {
        // Allocate 10 slots and free 5 of them, a thousand times over. This stresses the
        // LIFO reuse path once the pool reaches steady state.
        b.iter_custom(|iters| {
            let layout = Layout::new::<TestItem>();

            let mut pools = iter::repeat_with(|| SlabPool::builder().slot_layout(layout).build())
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let mut to_free = Vec::with_capacity(5);

            let start = Instant::now();

            for pool in &mut pools {
                for _ in 0..1000 {
                    to_free.clear();

                    for _ in 0..5 {
                        to_free.push(pool.allocate());
                    }

                    for _ in 0..5 {
                        _ = black_box(pool.allocate());
                    }

                    #[expect(clippy::iter_with_drain, reason = "to avoid moving the value")]
                    for slot in to_free.drain(..) {
                        // SAFETY: The slot came from this pool and is deallocated exactly once.
                        unsafe { pool.deallocate(slot) };
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}
