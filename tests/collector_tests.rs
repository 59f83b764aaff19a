use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use vitalrs::models::{DayKey, MetricKind, MetricSample};
use vitalrs::provider::{ProviderError, ProviderResult, SampleProvider};
use vitalrs::{CollectorConfig, SampleCollector, VitalError};

/// Scripted per-day provider behaviour
#[derive(Debug, Clone)]
enum Reply {
    Value(f64),
    NoData,
    Fail,
    Delay(Duration, f64),
    Panic,
}

struct ScriptedProvider {
    replies: HashMap<DayKey, Reply>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedProvider {
    fn new(replies: impl IntoIterator<Item = (DayKey, Reply)>) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.into_iter().collect(),
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }

    async fn reply(&self, metric: MetricKind, day: DayKey) -> ProviderResult<Option<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.replies.get(&day).cloned().unwrap_or(Reply::NoData) {
            Reply::Value(v) => Ok(Some(v)),
            Reply::NoData => Ok(None),
            Reply::Fail => Err(ProviderError::Query {
                metric,
                day,
                reason: "upstream returned 500".to_string(),
            }),
            Reply::Delay(delay, v) => {
                tokio::time::sleep(delay).await;
                Ok(Some(v))
            }
            Reply::Panic => panic!("provider bug on {}", day),
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl SampleProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_daily_average(&self, metric: MetricKind, day: DayKey) -> ProviderResult<Option<f64>> {
        self.reply(metric, day).await
    }

    async fn fetch_intraday_samples(
        &self,
        _metric: MetricKind,
        _day: DayKey,
    ) -> ProviderResult<Vec<MetricSample>> {
        Err(ProviderError::Unavailable("intraday not scripted".to_string()))
    }

    async fn fetch_counter_total(&self, metric: MetricKind, day: DayKey) -> ProviderResult<Option<f64>> {
        self.reply(metric, day).await
    }
}

fn day(d: u32) -> DayKey {
    NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
}

fn week() -> Vec<DayKey> {
    (1..=7).map(day).collect()
}

fn collector(provider: Arc<ScriptedProvider>, timeout_ms: u64) -> SampleCollector {
    SampleCollector::with_config(
        provider,
        CollectorConfig {
            per_day_timeout_ms: timeout_ms,
        },
    )
}

#[tokio::test]
async fn test_slow_day_times_out_and_join_completes() {
    let provider = ScriptedProvider::new(
        week()
            .into_iter()
            .map(|d| (d, Reply::Value(50.0)))
            .chain([(day(4), Reply::Delay(Duration::from_secs(30), 99.0))]),
    );

    let started = Instant::now();
    let collection = collector(provider, 100)
        .collect_daily(MetricKind::HeartRateVariability, &week())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(collection.values.len(), 7);
    assert_eq!(collection.value(&day(4)), None);
    assert_eq!(collection.timed_out_days, vec![day(4)]);
    assert_eq!(collection.days_with_data(), 6);
}

#[tokio::test]
async fn test_partial_failure_is_tolerated() {
    let provider = ScriptedProvider::new([
        (day(1), Reply::Value(14.0)),
        (day(2), Reply::Fail),
        (day(3), Reply::NoData),
        (day(4), Reply::Panic),
        (day(5), Reply::Value(16.0)),
    ]);

    let days: Vec<DayKey> = (1..=5).map(day).collect();
    let collection = collector(provider.clone(), 1_000)
        .collect_daily(MetricKind::RespiratoryRate, &days)
        .await
        .unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    assert_eq!(collection.value(&day(1)), Some(14.0));
    assert_eq!(collection.value(&day(2)), None);
    assert_eq!(collection.value(&day(3)), None);
    assert_eq!(collection.value(&day(4)), None);
    assert_eq!(collection.value(&day(5)), Some(16.0));
    assert_eq!(collection.failed_days, vec![day(2), day(4)]);
    assert_eq!(collection.missing_responses(), 2);
}

#[tokio::test]
async fn test_total_failure_is_provider_unavailable() {
    let provider = ScriptedProvider::new(week().into_iter().map(|d| (d, Reply::Fail)));

    let err = collector(provider, 1_000)
        .collect_daily(MetricKind::HeartRate, &week())
        .await
        .unwrap_err();

    match err {
        VitalError::ProviderUnavailable { provider, reason } => {
            assert_eq!(provider, "scripted");
            assert!(reason.contains("upstream returned 500"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_all_days_timing_out_is_provider_unavailable() {
    let provider = ScriptedProvider::new(
        week()
            .into_iter()
            .map(|d| (d, Reply::Delay(Duration::from_secs(30), 1.0))),
    );

    let err = collector(provider, 50)
        .collect_daily(MetricKind::Steps, &week())
        .await
        .unwrap_err();

    assert!(matches!(err, VitalError::ProviderUnavailable { .. }));
}

#[tokio::test]
async fn test_empty_days_are_a_response_not_an_outage() {
    let provider = ScriptedProvider::new(week().into_iter().map(|d| (d, Reply::NoData)));

    let collection = collector(provider, 1_000)
        .collect_daily(MetricKind::BloodOxygen, &week())
        .await
        .unwrap();

    assert_eq!(collection.days_with_data(), 0);
    assert_eq!(collection.missing_responses(), 0);
}

/// Completion order must not leak into day identity
#[tokio::test]
async fn test_results_keyed_by_day_regardless_of_completion_order() {
    let provider = ScriptedProvider::new(week().into_iter().map(|d| {
        let delay = Duration::from_millis(10 * (8 - u64::from(d.day())));
        (d, Reply::Delay(delay, f64::from(d.day())))
    }));

    let collection = collector(provider, 2_000)
        .collect_daily(MetricKind::RestingHeartRate, &week())
        .await
        .unwrap();

    for d in week() {
        assert_eq!(collection.value(&d), Some(f64::from(d.day())));
    }
    let keys: Vec<DayKey> = collection.values.keys().copied().collect();
    assert_eq!(keys, week());
}

/// Dropping the collection future leaves the detached day queries to finish on their own
#[tokio::test]
async fn test_cancelled_collection_is_harmless() {
    let provider = ScriptedProvider::new(
        week()
            .into_iter()
            .map(|d| (d, Reply::Delay(Duration::from_millis(50), 60.0))),
    );
    let collector = collector(provider.clone(), 1_000);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(5),
        collector.collect_daily(MetricKind::HeartRate, &week()),
    )
    .await;
    assert!(cancelled.is_err());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(provider.completed.load(Ordering::SeqCst), 7);

    // The collector stays usable after a cancelled request
    let collection = collector
        .collect_daily(MetricKind::HeartRate, &week())
        .await
        .unwrap();
    assert_eq!(collection.days_with_data(), 7);
}

#[tokio::test]
async fn test_intraday_failure_is_provider_unavailable() {
    let provider = ScriptedProvider::new([]);
    let err = collector(provider, 1_000)
        .collect_intraday(MetricKind::HeartRate, day(1))
        .await
        .unwrap_err();

    assert!(matches!(err, VitalError::ProviderUnavailable { .. }));
}

#[tokio::test]
async fn test_counter_day_absorbs_missing_value() {
    let provider = ScriptedProvider::new([(day(1), Reply::NoData)]);
    let total = collector(provider, 1_000)
        .collect_counter_day(MetricKind::Steps, day(1))
        .await
        .unwrap();

    assert_eq!(total, None);
}

#[tokio::test]
async fn test_counter_day_failure_is_provider_unavailable() {
    let provider = ScriptedProvider::new([(day(1), Reply::Fail)]);
    let err = collector(provider, 1_000)
        .collect_counter_day(MetricKind::Steps, day(1))
        .await
        .unwrap_err();

    match err {
        VitalError::ProviderUnavailable { provider, reason } => {
            assert_eq!(provider, "scripted");
            assert!(reason.contains("upstream returned 500"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_counter_day_timeout_is_provider_unavailable() {
    let provider = ScriptedProvider::new([(day(1), Reply::Delay(Duration::from_secs(30), 9_000.0))]);
    let err = collector(provider, 50)
        .collect_counter_day(MetricKind::Steps, day(1))
        .await
        .unwrap_err();

    assert!(matches!(err, VitalError::ProviderUnavailable { .. }));
}
