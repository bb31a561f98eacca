//! Benchmarks for shardalloc.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shardalloc::ShardAlloc;
use std::thread;

fn bench_small_blocks(c: &mut Criterion) {
    let alloc = ShardAlloc::new();

    let mut group = c.benchmark_group("small_blocks");

    group.bench_function("alloc_free_64b", |b| {
        b.iter(|| {
            let p = alloc.allocate(64);
            black_box(p);
            unsafe { alloc.free(p) };
        })
    });

    group.bench_function("alloc_free_64b_batch_128", |b| {
        b.iter(|| {
            let mut ptrs = [std::ptr::null_mut::<u8>(); 128];
            for slot in ptrs.iter_mut() {
                *slot = alloc.allocate(64);
            }
            for &p in ptrs.iter() {
                unsafe { alloc.free(p) };
            }
        })
    });

    group.bench_function("alloc_free_mixed_classes", |b| {
        let sizes = [8usize, 64, 512, 4096];
        b.iter(|| {
            for &size in sizes.iter() {
                let p = alloc.allocate(size);
                black_box(p);
                unsafe { alloc.free(p) };
            }
        })
    });

    group.finish();
}

fn bench_large_regions(c: &mut Criterion) {
    let alloc = ShardAlloc::new();

    let mut group = c.benchmark_group("large_regions");

    group.bench_function("alloc_free_64kb", |b| {
        b.iter(|| {
            let p = alloc.allocate(64 * 1024);
            black_box(p);
            unsafe { alloc.free(p) };
        })
    });

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let alloc = ShardAlloc::new();

    let mut group = c.benchmark_group("contended");
    group.sample_size(10);

    group.bench_function("4_threads_1000_cycles", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|worker| {
                    let alloc = alloc.clone();
                    thread::spawn(move || {
                        let size = [8usize, 64, 512, 4096][worker % 4];
                        for _ in 0..1000 {
                            let p = alloc.allocate(size);
                            black_box(p);
                            unsafe { alloc.free(p) };
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_small_blocks,
    bench_large_regions,
    bench_contended
);
criterion_main!(benches);
