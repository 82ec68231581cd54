// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_hierarchy::reduce::max_depth;
use understory_hierarchy::{CacheKinds, FlatHierarchy, HierarchyCaches, SyncMode};
use understory_hierarchy_baselines::{
    ChildVecTree, LinkedTree, TreeContract, is_ancestor_of, preorder,
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
    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

/// `(parent position or None for a root, value)` pairs that build a bushy forest.
fn gen_build_script(count: usize, seed: u64) -> Vec<(Option<usize>, u32)> {
    let mut rng = Rng::new(seed);
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let parent = if i == 0 || rng.below(64) == 0 {
            None
        } else {
            // Bias towards recent nodes to get some depth.
            Some(i - 1 - rng.below(i.min(16)))
        };
        out.push((parent, rng.next_u64() as u32 % 1000));
    }
    out
}

/// Build from a script. Parents are picked by preorder position among existing nodes.
fn build<T: TreeContract<Value = u32>>(tree: &mut T, script: &[(Option<usize>, u32)]) {
    let mut created: Vec<T::Handle> = Vec::with_capacity(script.len());
    for &(parent, value) in script {
        let handle = match parent {
            Some(p) => tree.create_child(created[p], value),
            None => tree.create_root(value),
        };
        created.push(handle);
    }
}

/// Flat build where handles shift: pick parents by preorder position instead.
fn build_flat(h: &mut FlatHierarchy<u32>, script: &[(Option<usize>, u32)], caches: &mut HierarchyCaches) {
    for &(parent, value) in script {
        match parent {
            Some(p) if !h.is_empty() => {
                let p = p % h.len();
                if h.depth(p) < 100 {
                    h.create_child_of_with(p, value, caches);
                }
            }
            _ => {
                h.create_root_with(value, caches);
            }
        }
    }
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[256_usize, 1024, 4096] {
        let script = gen_build_script(n, 0x5EED_0001);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("flat_uncached_n{n}"), |b| {
            b.iter(|| {
                let mut h = FlatHierarchy::<u32>::with_capacity(n);
                build_flat(&mut h, &script, &mut HierarchyCaches::new());
                black_box(h.len())
            });
        });
        group.bench_function(format!("child_vec_n{n}"), |b| {
            b.iter(|| {
                let mut tree = ChildVecTree::<u32>::new();
                build(&mut tree, &script);
                black_box(tree.len())
            });
        });
        group.bench_function(format!("linked_n{n}"), |b| {
            b.iter(|| {
                let mut tree = LinkedTree::<u32>::new();
                build(&mut tree, &script);
                black_box(tree.len())
            });
        });
    }
    group.finish();
}

fn bench_reparent(c: &mut Criterion) {
    let mut group = c.benchmark_group("reparent");
    let n = 2048;
    let script = gen_build_script(n, 0x5EED_0002);
    let moves: Vec<(usize, usize)> = {
        let mut rng = Rng::new(0xB0B0_CAFE);
        (0..256).map(|_| (rng.below(n), rng.below(n))).collect()
    };
    group.throughput(Throughput::Elements(moves.len() as u64));

    let flat_move = |h: &mut FlatHierarchy<u32>, caches: &mut HierarchyCaches| {
        for &(c, p) in &moves {
            let (c, p) = (c % h.len(), p % h.len());
            if c == p || h.is_ancestor_of(c, p) {
                continue;
            }
            let last = h.last_descendant(c);
            let height = max_depth(&h.depths()[c..=last]) - h.depth(c);
            if usize::from(h.depth(p)) + usize::from(height) >= 120 {
                continue;
            }
            h.make_child_of_with(c, p, caches);
        }
    };

    group.bench_function("flat_uncached", |b| {
        b.iter_batched(
            || {
                let mut h = FlatHierarchy::<u32>::new();
                build_flat(&mut h, &script, &mut HierarchyCaches::new());
                h
            },
            |mut h| {
                flat_move(&mut h, &mut HierarchyCaches::new());
                black_box(h.revision())
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("flat_always_valid", |b| {
        b.iter_batched(
            || {
                let mut h = FlatHierarchy::<u32>::new();
                build_flat(&mut h, &script, &mut HierarchyCaches::new());
                let mut caches = HierarchyCaches::with_mode(SyncMode::AlwaysValid);
                caches.refresh(h.shape(), CacheKinds::all());
                (h, caches)
            },
            |(mut h, mut caches)| {
                flat_move(&mut h, &mut caches);
                black_box(h.revision())
            },
            BatchSize::SmallInput,
        );
    });

    fn tree_moves<T: TreeContract<Value = u32>>(tree: &mut T, moves: &[(usize, usize)]) {
        for &(c, p) in moves {
            let order = preorder(tree);
            let (c, p) = (order[c % order.len()].1, order[p % order.len()].1);
            if c == p || is_ancestor_of(tree, c, p) {
                continue;
            }
            tree.reparent(c, p);
        }
    }

    group.bench_function("child_vec", |b| {
        b.iter_batched(
            || {
                let mut tree = ChildVecTree::<u32>::new();
                build(&mut tree, &script);
                tree
            },
            |mut tree| {
                tree_moves(&mut tree, &moves);
                black_box(tree.len())
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("linked", |b| {
        b.iter_batched(
            || {
                let mut tree = LinkedTree::<u32>::new();
                build(&mut tree, &script);
                tree
            },
            |mut tree| {
                tree_moves(&mut tree, &moves);
                black_box(tree.len())
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_ancestor_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_ancestor_of");
    let n = 4096;
    let script = gen_build_script(n, 0x5EED_0003);
    let mut h = FlatHierarchy::<u32>::new();
    build_flat(&mut h, &script, &mut HierarchyCaches::new());
    let mut caches = HierarchyCaches::new();
    caches.refresh(h.shape(), CacheKinds::ANCESTOR);
    let pairs: Vec<(usize, usize)> = {
        let mut rng = Rng::new(0xA11C_E5ED);
        (0..1024).map(|_| (rng.below(h.len()), rng.below(h.len()))).collect()
    };
    group.throughput(Throughput::Elements(pairs.len() as u64));

    group.bench_function("flat_linear", |b| {
        b.iter(|| {
            let hits = pairs.iter().filter(|&&(a, d)| h.is_ancestor_of(a, d)).count();
            black_box(hits)
        });
    });
    group.bench_function("flat_cached", |b| {
        let shape = h.shape();
        b.iter(|| {
            let hits = pairs
                .iter()
                .filter(|&&(a, d)| caches.ancestor.is_ancestor_of(shape, d, a))
                .count();
            black_box(hits)
        });
    });

    let mut tree = ChildVecTree::<u32>::new();
    build(&mut tree, &script);
    let handles: Vec<_> = preorder(&tree).into_iter().map(|(_, id)| id).collect();
    group.bench_function("child_vec_parent_walk", |b| {
        b.iter(|| {
            let hits = pairs
                .iter()
                .filter(|&&(a, d)| {
                    let (a, d) = (handles[a % handles.len()], handles[d % handles.len()]);
                    is_ancestor_of(&tree, a, d)
                })
                .count();
            black_box(hits)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_reparent, bench_ancestor_queries);
criterion_main!(benches);
