//! Benchmarks for range space lookups and bulk updates.
//!
//! Run with: cargo bench -p nexus-space
//!
//! Every space is pre-populated with `RANGES` disjoint intervals of
//! alternating payloads so that nothing coalesces.

use std::net::Ipv4Addr;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use nexus_space::{DiscreteSpace, Interval, IpRange, IpSpace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const RANGES: u32 = 100_000;
const STRIDE: u32 = 16;
const OPS: usize = 10_000;

fn populated() -> DiscreteSpace<u32, u32> {
    let mut space = DiscreteSpace::with_capacity(RANGES as usize * 2);
    for i in 0..RANGES {
        space.mark(Interval::new(i * STRIDE, i * STRIDE + 7), i % 2);
    }
    space
}

fn points(seed: u64) -> Vec<u32> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..OPS).map(|_| rng.random_range(0..RANGES * STRIDE)).collect()
}

// ============================================================================
// Lookups
// ============================================================================

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");
    group.throughput(Throughput::Elements(OPS as u64));

    let space = populated();
    let hits: Vec<u32> = points(1).into_iter().map(|p| p - p % STRIDE).collect();
    let misses: Vec<u32> = points(2).into_iter().map(|p| p - p % STRIDE + 12).collect();

    group.bench_function("hit", |b| {
        b.iter(|| {
            for &p in &hits {
                black_box(space.find(p));
            }
        });
    });

    group.bench_function("miss", |b| {
        b.iter(|| {
            for &p in &misses {
                black_box(space.find(p));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Bulk updates
// ============================================================================

fn bench_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    group.throughput(Throughput::Elements(OPS as u64));

    let targets = points(3);

    group.bench_function("mark/narrow", |b| {
        let mut space = populated();
        b.iter(|| {
            for &p in &targets {
                space.mark(Interval::new(p, p + 3), p % 3);
            }
        });
    });

    group.bench_function("mark/wide", |b| {
        let mut space = populated();
        b.iter(|| {
            for &p in &targets {
                space.mark(Interval::new(p, p + STRIDE * 8), p % 3);
                space.mark(Interval::new(p, p + STRIDE * 8), p % 2);
            }
        });
    });

    group.bench_function("fill", |b| {
        let mut space = populated();
        b.iter(|| {
            for &p in &targets {
                space.fill(Interval::new(p, p + STRIDE * 2), 7);
            }
            space.erase(Interval::ALL);
            space.extend((0..RANGES).map(|i| (Interval::new(i * STRIDE, i * STRIDE + 7), i % 2)));
        });
    });

    group.bench_function("blend/or", |b| {
        let mut space = populated();
        b.iter(|| {
            for &p in &targets {
                space.blend(Interval::new(p, p + STRIDE * 4), &4, |acc, bits| {
                    *acc |= *bits;
                    true
                });
            }
        });
    });

    group.finish();
}

// ============================================================================
// IP space
// ============================================================================

fn bench_ip(c: &mut Criterion) {
    let mut group = c.benchmark_group("ip");
    group.throughput(Throughput::Elements(OPS as u64));

    let mut space: IpSpace<u32> = IpSpace::new();
    for i in 0..RANGES {
        let base = Ipv4Addr::from_bits(0x0a00_0000 + i * 256);
        let range = IpRange::from_network(base.into(), 25).unwrap();
        space.mark(range, i % 2);
    }
    let addrs: Vec<Ipv4Addr> = points(4)
        .into_iter()
        .map(|p| Ipv4Addr::from_bits(0x0a00_0000 + p * 16))
        .collect();

    group.bench_function("find_v4", |b| {
        b.iter(|| {
            for &a in &addrs {
                black_box(space.find_v4(a));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_find, bench_updates, bench_ip);
criterion_main!(benches);
