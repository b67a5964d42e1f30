//! Coordinator performance benchmarks.
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tempfile::TempDir;
use ticketq::coordinator::{Coordinator, CreateOptions};
use ticketq::store::Store;

fn open_coordinator() -> (TempDir, Coordinator) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tickets.db");
    Store::migrate(&path).unwrap();
    let store = Store::open(&path).unwrap();
    (dir, Coordinator::new(store))
}

fn bench_create(c: &mut Criterion) {
    c.bench_function("create", |b| {
        let (_dir, mut coord) = open_coordinator();
        let mut i = 0;
        b.iter(|| {
            i += 1;
            coord.create(&format!("bench ticket {i}"), CreateOptions::default()).unwrap()
        });
    });
}

fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("list");
    for &n in &[100usize, 1_000] {
        let (_dir, mut coord) = open_coordinator();
        for i in 0..n {
            coord.create(&format!("ticket {i}"), CreateOptions::default()).unwrap();
        }
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(coord.list(None, None).unwrap()));
        });
    }
    group.finish();
}

fn bench_claim_next(c: &mut Criterion) {
    c.bench_function("claim_next", |b| {
        let (_dir, mut coord) = open_coordinator();
        let mut i = 0;
        b.iter(|| {
            i += 1;
            coord.create(&format!("claimable {i}"), CreateOptions::default()).unwrap();
            coord.claim_next(&format!("agent-{i}")).unwrap()
        });
    });
}

criterion_group!(benches, bench_create, bench_list, bench_claim_next);
criterion_main!(benches);
