use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vitalrs::window::window_days;
use vitalrs::{
    classify, DayOrder, MetricKind, MetricSample, TrendAnalyzer, WindowAggregator,
};

/// Performance benchmarks for the aggregation pipeline
///
/// Sizes cover a single day of minute-level readings up to a year of daily
/// windows.

fn create_heart_rate_day(minutes: usize) -> Vec<MetricSample> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..minutes)
        .map(|i| {
            // Sweep through every zone over the day
            let value = 60.0 + (i % 120) as f64;
            MetricSample::new(MetricKind::HeartRate, start + Duration::minutes(i as i64), value)
        })
        .collect()
}

fn create_window_samples(days: usize, per_day: usize) -> Vec<MetricSample> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();
    (0..days)
        .flat_map(|d| {
            (0..per_day).map(move |i| {
                let ts = start + Duration::days(d as i64) + Duration::minutes(i as i64 * 5);
                MetricSample::new(MetricKind::HeartRateVariability, ts, 40.0 + ((d + i) % 40) as f64)
            })
        })
        .collect()
}

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("Zone Classification");

    for metric in MetricKind::ALL {
        group.bench_with_input(BenchmarkId::new("classify", metric), &metric, |b, &metric| {
            b.iter(|| {
                for v in 0..200 {
                    black_box(classify(metric, black_box(v as f64)));
                }
            });
        });
    }

    group.finish();
}

fn bench_window_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Window Aggregation");
    let aggregator = WindowAggregator::new();
    let offset = FixedOffset::east_opt(0).unwrap();

    for &days in &[7usize, 30, 90, 365] {
        let samples = create_window_samples(days, 48);
        let anchor = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(days as i64 - 1);
        let keys = window_days(anchor, days, DayOrder::Ascending).unwrap();

        group.throughput(Throughput::Elements(samples.len() as u64));
        group.bench_with_input(BenchmarkId::new("aggregate_samples", days), &samples, |b, samples| {
            b.iter(|| {
                black_box(aggregator.aggregate_samples(
                    MetricKind::HeartRateVariability,
                    &keys,
                    samples,
                    &offset,
                ))
            });
        });
    }

    group.finish();
}

fn bench_zone_breakdown(c: &mut Criterion) {
    let mut group = c.benchmark_group("Zone Breakdown");
    let aggregator = WindowAggregator::new();
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    for &minutes in &[60usize, 480, 1440] {
        let samples = create_heart_rate_day(minutes);

        group.throughput(Throughput::Elements(minutes as u64));
        group.bench_with_input(BenchmarkId::new("zone_breakdown", minutes), &samples, |b, samples| {
            b.iter(|| black_box(aggregator.zone_breakdown(MetricKind::HeartRate, day, samples)));
        });
    }

    group.finish();
}

fn bench_trend(c: &mut Criterion) {
    let mut group = c.benchmark_group("Trend Analysis");
    let analyzer = TrendAnalyzer::new();

    for &days in &[7usize, 30, 365] {
        let values: Vec<f64> = (0..days).map(|d| 45.0 + (d % 20) as f64).collect();

        group.bench_with_input(BenchmarkId::new("analyze", days), &values, |b, values| {
            b.iter(|| black_box(analyzer.analyze(values)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classification,
    bench_window_aggregation,
    bench_zone_breakdown,
    bench_trend
);
criterion_main!(benches);
