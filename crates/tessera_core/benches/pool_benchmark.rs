//! # Slot Pool Benchmark
//!
//! REQUIREMENTS:
//! - alloc / free / commit stay O(1) per slot
//! - a full churn of 255 slots fits easily inside one frame
//!
//! Run with: `cargo bench --package tessera_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{SlotId, SlotPool};

/// Capacity used by the default engine configuration.
const CAPACITY: usize = 255;

/// Benchmark: fill the pool, free everything, commit.
fn bench_full_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_full_churn");

    for capacity in [64, CAPACITY, 4096] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                let mut pool: SlotPool<[u8; 128]> = SlotPool::new("bench", capacity);
                let mut ids: Vec<SlotId> = Vec::with_capacity(capacity);
                b.iter(|| {
                    ids.clear();
                    while let Some(id) = pool.alloc([0u8; 128]) {
                        ids.push(id);
                    }
                    for &id in &ids {
                        pool.free(id);
                    }
                    black_box(pool.apply_free())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: free every other slot, the worst case for swap-removal order.
fn bench_interleaved_free(c: &mut Criterion) {
    c.bench_function("pool_interleaved_free_255", |b| {
        let mut pool: SlotPool<u64> = SlotPool::new("bench", CAPACITY);
        b.iter(|| {
            while pool.alloc(0).is_some() {}
            let victims: Vec<SlotId> = pool.live().iter().copied().step_by(2).collect();
            for id in victims {
                pool.free(id);
            }
            black_box(pool.apply_free());
            let rest: Vec<SlotId> = pool.live().to_vec();
            for id in rest {
                pool.free(id);
            }
            pool.apply_free()
        });
    });
}

/// Benchmark: update-style pass over the live list.
fn bench_live_iteration(c: &mut Criterion) {
    c.bench_function("pool_live_iteration_255", |b| {
        let mut pool: SlotPool<u64> = SlotPool::new("bench", CAPACITY);
        while pool.alloc(1).is_some() {}
        b.iter(|| {
            let end = pool.live_end();
            let mut sum = 0u64;
            for pos in 0..end {
                if let Some(id) = pool.live_at(pos) {
                    sum += pool.get(id).copied().unwrap_or(0);
                }
            }
            black_box(sum)
        });
    });
}

criterion_group!(
    benches,
    bench_full_churn,
    bench_interleaved_free,
    bench_live_iteration,
);

criterion_main!(benches);
