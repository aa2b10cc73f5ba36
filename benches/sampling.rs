//! Benchmarks for the sampling hot path
//!
//! Run with: cargo bench
//!
//! `record` is called at the acquisition rate (500 Hz per channel on the
//! device), `estimate` once per poll cycle per channel; both need to stay
//! cheap at the sample log's small capacity.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use radiodial_rs::console::SampleLog;

fn bench_sample_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_log");

    group.bench_function("record", |b| {
        let mut log = SampleLog::new();
        let mut v: u16 = 0;
        b.iter(|| {
            v = (v + 7) % 1024;
            log.record(black_box(v));
        });
    });

    let mut partial = SampleLog::new();
    for i in 0..20u16 {
        partial.record(i * 13 % 1024);
    }
    group.bench_function("estimate_partial", |b| {
        b.iter(|| black_box(partial.estimate()))
    });

    let mut full = SampleLog::new();
    for i in 0..200u16 {
        full.record(i * 31 % 1024);
    }
    group.bench_function("estimate_trimmed", |b| {
        b.iter(|| black_box(full.estimate()))
    });

    group.finish();
}

criterion_group!(benches, bench_sample_log);
criterion_main!(benches);
