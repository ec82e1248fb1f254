//! # Ledger Benchmarks
//!
//! Performance benchmarks for accession-core parsing and minting.
//!
//! Run with: `cargo bench -p accession-core`

use accession_core::{MemoryLedger, Registry, StorageBackend, parse};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Registry with `size` numbers minted across a few collections.
fn populated_registry(size: usize) -> Registry<MemoryLedger> {
    let registry = Registry::new(MemoryLedger::new());
    for i in 0..size {
        let collection = ["a", "b", "c"][i % 3];
        registry.mint("oh", "1900", collection).expect("mint");
    }
    registry
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for input in ["1900oh001_a001", "1899 OH/ 151 AB 9 Sess 3", "11902test004_d001"] {
        group.bench_with_input(BenchmarkId::from_parameter(input), input, |b, input| {
            b.iter(|| black_box(parse(input)));
        });
    }

    group.finish();
}

fn bench_mint_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("mint_memory");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(populated_registry(size)));
        });
    }

    group.finish();
}

fn bench_mint_redb(c: &mut Criterion) {
    let temp = tempfile::tempdir().expect("temp dir");
    let registry =
        Registry::new(StorageBackend::with_redb(temp.path().join("bench.redb")).expect("open"));

    c.bench_function("mint_redb", |b| {
        b.iter(|| black_box(registry.mint("oh", "1900", "a").expect("mint")));
    });
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for size in [100, 1000].iter() {
        let registry = populated_registry(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(registry.lookup("1900oh050_b017")));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_mint_memory,
    bench_mint_redb,
    bench_lookup
);
criterion_main!(benches);
