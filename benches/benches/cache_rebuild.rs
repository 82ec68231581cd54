// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_hierarchy::reduce::{max_depth, max_scalar};
use understory_hierarchy::{
    AncestorCache, LastDescendantCache, NextSiblingCache, Shape, SyncMode,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

/// A well formed depth array: mostly small steps, occasional climbs back towards the root.
fn gen_depths(n: usize, max: u8, seed: u64) -> Vec<u8> {
    let mut rng = Rng::new(seed);
    let mut out = Vec::with_capacity(n);
    let mut depth = 0_u8;
    for _ in 0..n {
        out.push(depth);
        depth = match rng.next_u64() % 8 {
            0..=3 if depth + 1 < max => depth + 1,
            4..=5 => depth,
            _ => (rng.next_u64() % (u64::from(depth) + 1)) as u8,
        };
    }
    out
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_depth");
    for &n in &[1024_usize, 16384, 262144] {
        let depths = gen_depths(n, 64, 0xDEE9_0001);
        group.throughput(Throughput::Bytes(n as u64));
        group.bench_function(format!("lanes_n{n}"), |b| {
            b.iter(|| black_box(max_depth(black_box(&depths))));
        });
        group.bench_function(format!("scalar_n{n}"), |b| {
            b.iter(|| black_box(max_scalar(black_box(&depths))));
        });
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    for &n in &[1024_usize, 16384] {
        let depths = gen_depths(n, 32, 0xDEE9_0002);
        let shape = Shape::new(&depths, 1);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("ancestor_n{n}"), |b| {
            let mut cache = AncestorCache::new();
            b.iter(|| {
                cache.invalidate();
                cache.rebuild(shape, None);
                black_box(cache.is_valid(shape))
            });
        });
        group.bench_function(format!("next_sibling_n{n}"), |b| {
            let mut cache = NextSiblingCache::new();
            b.iter(|| {
                cache.rebuild(shape);
                black_box(cache.is_valid(shape))
            });
        });
        group.bench_function(format!("last_descendant_n{n}"), |b| {
            let mut cache = LastDescendantCache::new();
            b.iter(|| {
                cache.rebuild(shape);
                black_box(cache.is_valid(shape))
            });
        });
    }
    group.finish();
}

fn bench_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("ancestor_patch");
    let n = 16384;
    let depths = gen_depths(n, 32, 0xDEE9_0003);
    // Simulate a leaf appended under the last node.
    let mut grown = depths.clone();
    grown.push(depths[n - 1] + 1);
    let before = Shape::new(&depths, 1);
    let after = Shape::new(&grown, 2);

    group.bench_function("full_rebuild", |b| {
        b.iter_batched(
            || {
                let mut cache = AncestorCache::with_capacity(64, 2 * n);
                cache.rebuild(before, None);
                cache
            },
            |mut cache| {
                cache.rebuild(after, None);
                black_box(cache.is_valid(after))
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("patch_tail", |b| {
        b.iter_batched(
            || {
                let mut cache = AncestorCache::with_capacity(64, 2 * n);
                cache.set_mode(SyncMode::AlwaysValid);
                cache.rebuild(before, None);
                cache
            },
            |mut cache| {
                cache.patch(after, n, after.len());
                black_box(cache.is_valid(after))
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_reduce, bench_rebuild, bench_patch);
criterion_main!(benches);
