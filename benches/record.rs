use criterion::BenchmarkId;
use criterion::Throughput;
use criterion::{criterion_group, criterion_main, Criterion};
use hdrhistogram_core::Histogram;

fn record_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("Histogram/record_value");

    for significant_figures in 1..=5 {
        let histogram = Histogram::new(1, 3_600_000_000, significant_figures).unwrap();
        group.throughput(Throughput::Elements(1));
        group.bench_function(
            BenchmarkId::new("sig_figs", significant_figures),
            |b| b.iter(|| histogram.record_value(123_456)),
        );
    }
}

fn record_corrected_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("Histogram/record_corrected_value");

    let histogram = Histogram::new(1, 3_600_000_000, 3).unwrap();
    group.throughput(Throughput::Elements(1));
    group.bench_function("expected_interval/1000", |b| {
        b.iter(|| histogram.record_corrected_value(10_000, 1_000))
    });
}

fn add(c: &mut Criterion) {
    let mut group = c.benchmark_group("Histogram/add");

    let src = Histogram::new(1, 3_600_000_000, 3).unwrap();
    for v in 1..10_000 {
        src.record_value(v * 97);
    }

    group.bench_function("matching_geometry", |b| {
        b.iter(|| {
            let dst = Histogram::new(1, 3_600_000_000, 3).unwrap();
            dst.add(&src)
        })
    });
}

criterion_group!(benches, record_value, record_corrected_value, add);
criterion_main!(benches);
