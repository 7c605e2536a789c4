//! Basic benchmarks for the `segregated_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use criterion::{Criterion, criterion_group, criterion_main};
use segregated_pool::RawSegregatedPool;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

type TestItem = u64;

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("segregated_basic");

    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(
                    RawSegregatedPool::builder().layout_of::<TestItem>().build(),
                ));
            }

            start.elapsed()
        });
    });

    group.bench_function("allocate_one_small", |b| {
        b.iter_custom(|iters| {
            let mut pools =
                iter::repeat_with(|| RawSegregatedPool::builder().layout_of::<TestItem>().build())
                    .take(usize::try_from(iters).unwrap())
                    .collect::<Vec<_>>();

            let start = Instant::now();

            for pool in &mut pools {
                _ = black_box(pool.allocate(black_box(10)));
            }

            start.elapsed()
        });
    });

    group.bench_function("allocate_deallocate_steady_state", |b| {
        b.iter_custom(|iters| {
            let mut pool = RawSegregatedPool::builder().layout_of::<TestItem>().build();

            // Warm the class so iterations measure the free-list path, not slab growth.
            let warmup = pool.allocate(10);
            // SAFETY: warmup came from this pool's allocate(10) and is freed exactly once.
            unsafe { pool.deallocate(warmup, 10) };

            let start = Instant::now();

            for _ in 0..iters {
                let region = black_box(pool.allocate(black_box(10)));

                // SAFETY: The region came from this pool's allocate(10) just above.
                unsafe { pool.deallocate(region, 10) };
            }

            start.elapsed()
        });
    });

    group.bench_function("classify_spread", |b| {
        b.iter_custom(|iters| {
            let pool = RawSegregatedPool::builder().layout_of::<TestItem>().build();

            let counts = [1_usize, 20, 300, 5000, 70_000, 1_000_000];

            let start = Instant::now();

            for _ in 0..iters {
                for count in counts {
                    _ = black_box(pool.class_capacity(black_box(count)));
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}
