use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use lab_btree::BTree;
use std::collections::BTreeMap;

const N: usize = 10_000;
const ORDERS: [usize; 3] = [3, 16, 64];

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn build(order: usize, keys: &[i64]) -> BTree<i64, i64> {
    let mut tree = BTree::new(order).expect("benchmark orders are valid");
    tree.extend(keys.iter().map(|&k| (k, k)));
    tree
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_insert(c: &mut Criterion, name: &str, keys: &[i64]) {
    let mut group = c.benchmark_group(name);

    for order in ORDERS {
        group.bench_function(BenchmarkId::new("BTree", order), |b| b.iter(|| build(order, keys)));
    }

    group.bench_function(BenchmarkId::new("std::BTreeMap", N), |b| {
        b.iter(|| keys.iter().map(|&k| (k, k)).collect::<BTreeMap<i64, i64>>());
    });

    group.finish();
}

fn bench_insert_ordered(c: &mut Criterion) {
    bench_insert(c, "insert_ordered", &ordered_keys(N));
}

fn bench_insert_random(c: &mut Criterion) {
    bench_insert(c, "insert_random", &random_keys(N));
}

fn bench_find_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("find_random");

    for order in ORDERS {
        let tree = build(order, &keys);
        group.bench_function(BenchmarkId::new("BTree", order), |b| {
            b.iter(|| {
                let mut sum = 0i64;
                for &k in &keys {
                    if let Some(&v) = tree.find(&k) {
                        sum = sum.wrapping_add(v);
                    }
                }
                sum
            });
        });
    }

    let std_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
    group.bench_function(BenchmarkId::new("std::BTreeMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &keys {
                if let Some(&v) = std_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.finish();
}

fn bench_remove_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("remove_random");

    for order in ORDERS {
        let tree = build(order, &keys);
        group.bench_function(BenchmarkId::new("BTree", order), |b| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| {
                    for &k in &keys {
                        tree.remove(&k);
                    }
                    tree
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(insert_benches, bench_insert_ordered, bench_insert_random);

criterion_group!(lookup_benches, bench_find_random, bench_remove_random);

criterion_main!(insert_benches, lookup_benches);
