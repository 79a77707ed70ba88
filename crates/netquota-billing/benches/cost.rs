//! Billing Benchmarks
//!
//! Critical paths of a monitoring invocation:
//! - Sample aggregation over a month of daily/hourly buckets
//! - Tiered cost calculation across every band
//! - Report rendering

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use netquota_billing::{
    QuotaEvaluator, TieredCostCalculator, UsageAggregator, UsageReportBuilder,
};
use netquota_common::{MetricSample, Quota, TransferUsage, UsageTotal};
use std::time::Duration;

// ============ AGGREGATION BENCHMARKS ============

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    // Daily buckets for a month, hourly buckets for a month
    for buckets in [31usize, 744].iter() {
        group.throughput(Throughput::Elements(*buckets as u64));
        group.bench_with_input(BenchmarkId::new("buckets", buckets), buckets, |b, &n| {
            let samples: Vec<_> = (0..n)
                .map(|i| MetricSample::sum((i as f64 + 1.0) * 1.0e7))
                .collect();
            b.iter(|| UsageAggregator::aggregate(black_box(&samples)));
        });
    }

    group.finish();
}

// ============ PRICING BENCHMARKS ============

fn bench_tiered_cost(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing");
    group.measurement_time(Duration::from_secs(5));

    let calculator = TieredCostCalculator::canonical();
    // One point inside each band
    for gb in [5_000.0f64, 20_000.0, 80_000.0, 250_000.0].iter() {
        group.bench_with_input(BenchmarkId::new("usage_gb", gb), gb, |b, &gb| {
            let usage = UsageTotal::from_gigabytes(gb);
            b.iter(|| calculator.estimate(black_box(&usage)));
        });
    }

    group.finish();
}

// ============ REPORT BENCHMARKS ============

fn bench_report(c: &mut Criterion) {
    let usage = TransferUsage::new(
        UsageTotal::from_megabytes(321.5),
        UsageTotal::from_megabytes(1500.0),
    );
    let quota = Quota::from_megabytes(1000.0);
    let calculator = TieredCostCalculator::canonical();

    c.bench_function("report/build", |b| {
        b.iter(|| {
            let evaluation = QuotaEvaluator::evaluate(&usage.outbound, &quota).ok()?;
            let cost = calculator.estimate(&usage.outbound);
            Some(
                UsageReportBuilder::new("i-0bench", black_box(usage), quota, evaluation, cost)
                    .build(),
            )
        });
    });
}

criterion_group!(benches, bench_aggregation, bench_tiered_cost, bench_report);
criterion_main!(benches);
