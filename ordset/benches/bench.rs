use core::hint::black_box;
use std::collections::BTreeSet;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ordset::RedBlackTree;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn gen_random_keys(count: usize, key_max: i32) -> Vec<i32> {
    let mut keys = Vec::with_capacity(count);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..count {
        keys.push(rng.gen_range(0..key_max));
    }
    assert_eq!(keys.len(), count);
    keys
}

pub fn gen_distinct_keys(count: usize, key_max: i32) -> Vec<i32> {
    assert!(count < key_max as usize);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let sample = rand::seq::index::sample(&mut rng, key_max as usize, count);
    let keys: Vec<i32> = sample.into_iter().map(|v| v as i32).collect();
    assert_eq!(keys.len(), count);
    keys
}

const SIZES: [usize; 3] = [100, 1000, 10_000];

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for count in SIZES {
        let keys = gen_random_keys(count, 1_000_000);

        group.bench_with_input(
            BenchmarkId::new("red_black_tree", count),
            &keys,
            |b, keys| {
                b.iter(|| {
                    let mut tree = RedBlackTree::new();
                    for &key in keys {
                        tree.insert(black_box(key));
                    }
                    tree
                })
            },
        );
        group.bench_with_input(BenchmarkId::new("btree_set", count), &keys, |b, keys| {
            b.iter(|| {
                let mut set = BTreeSet::new();
                for &key in keys {
                    set.insert(black_box(key));
                }
                set
            })
        });
    }
    group.finish();
}

fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    for count in SIZES {
        let keys = gen_distinct_keys(count, 1_000_000);
        let mut probes = keys.clone();
        probes.shuffle(&mut ChaCha8Rng::seed_from_u64(3));

        let mut tree = RedBlackTree::new();
        let mut set = BTreeSet::new();
        for &key in &keys {
            tree.insert(key);
            set.insert(key);
        }

        group.bench_with_input(
            BenchmarkId::new("red_black_tree", count),
            &probes,
            |b, probes| {
                b.iter(|| {
                    for key in probes {
                        black_box(tree.contains(key));
                    }
                })
            },
        );
        group.bench_with_input(BenchmarkId::new("btree_set", count), &probes, |b, probes| {
            b.iter(|| {
                for key in probes {
                    black_box(set.contains(key));
                }
            })
        });
    }
    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");
    for count in SIZES {
        let keys = gen_distinct_keys(count, 1_000_000);
        let mut order = keys.clone();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(4));

        group.bench_with_input(
            BenchmarkId::new("red_black_tree", count),
            &order,
            |b, order| {
                b.iter_batched(
                    || {
                        let mut tree = RedBlackTree::new();
                        for &key in &keys {
                            tree.insert(key);
                        }
                        tree
                    },
                    |mut tree| {
                        for key in order {
                            tree.delete(key).unwrap();
                        }
                        tree
                    },
                    BatchSize::LargeInput,
                )
            },
        );
        group.bench_with_input(BenchmarkId::new("btree_set", count), &order, |b, order| {
            b.iter_batched(
                || keys.iter().copied().collect::<BTreeSet<i32>>(),
                |mut set| {
                    for key in order {
                        set.remove(key);
                    }
                    set
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_contains, bench_delete);
criterion_main!(benches);
