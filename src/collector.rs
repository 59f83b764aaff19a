//! Fan-out/fan-in collection of per-day values
//!
//! One tokio task is spawned per requested day and every task is bounded by
//! `per_day_timeout`. The join waits on the task handles themselves, so it
//! completes exactly once even when days fail, time out, or panic. Each task
//! owns its result until it is joined; if the caller drops the collection
//! future the detached tasks run to their timeout and their results are
//! discarded.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, VitalError};
use crate::models::{DayKey, MetricKind, MetricSample};
use crate::provider::SampleProvider;

/// Collector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Upper bound on a single provider query in milliseconds
    pub per_day_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            per_day_timeout_ms: 10_000,
        }
    }
}

impl CollectorConfig {
    pub fn per_day_timeout(&self) -> Duration {
        Duration::from_millis(self.per_day_timeout_ms)
    }
}

/// What happened to one day's query
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    /// Provider answered, possibly with no data
    Value(Option<f64>),
    /// Provider returned an error or the task panicked
    Failed(String),
    TimedOut,
}

impl DayOutcome {
    fn responded(&self) -> bool {
        matches!(self, DayOutcome::Value(_))
    }
}

/// Joined per-day results, keyed by day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyCollection {
    pub metric: MetricKind,
    pub values: BTreeMap<DayKey, Option<f64>>,
    pub failed_days: Vec<DayKey>,
    pub timed_out_days: Vec<DayKey>,
}

impl DailyCollection {
    pub fn value(&self, day: &DayKey) -> Option<f64> {
        self.values.get(day).copied().flatten()
    }

    pub fn days_with_data(&self) -> usize {
        self.values.values().filter(|v| v.is_some()).count()
    }

    /// Days that did not get a provider response
    pub fn missing_responses(&self) -> usize {
        self.failed_days.len() + self.timed_out_days.len()
    }
}

/// Issues parallel per-day queries against a sample provider
#[derive(Clone)]
pub struct SampleCollector {
    provider: Arc<dyn SampleProvider>,
    config: CollectorConfig,
}

impl SampleCollector {
    pub fn new(provider: Arc<dyn SampleProvider>) -> Self {
        Self::with_config(provider, CollectorConfig::default())
    }

    pub fn with_config(provider: Arc<dyn SampleProvider>, config: CollectorConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Query every day in parallel and join all results
    ///
    /// Counter metrics use the provider's counter total, every other metric
    /// its daily average. Individual failures become `None`; only a window in
    /// which no day got a response is reported as `ProviderUnavailable`.
    pub async fn collect_daily(&self, metric: MetricKind, days: &[DayKey]) -> Result<DailyCollection> {
        let timeout = self.config.per_day_timeout();
        let started = Instant::now();

        debug!(
            provider = self.provider.name(),
            metric = %metric,
            days = days.len(),
            "Fanning out per-day queries"
        );

        let handles: Vec<_> = days
            .iter()
            .map(|&day| {
                let provider = Arc::clone(&self.provider);
                tokio::spawn(async move {
                    let query = async {
                        if metric.is_counter() {
                            provider.fetch_counter_total(metric, day).await
                        } else {
                            provider.fetch_daily_average(metric, day).await
                        }
                    };
                    match tokio::time::timeout(timeout, query).await {
                        Ok(Ok(value)) => DayOutcome::Value(value),
                        Ok(Err(e)) => DayOutcome::Failed(e.to_string()),
                        Err(_) => DayOutcome::TimedOut,
                    }
                })
            })
            .collect();

        let joined = join_all(handles).await;

        let mut collection = DailyCollection {
            metric,
            values: BTreeMap::new(),
            failed_days: Vec::new(),
            timed_out_days: Vec::new(),
        };
        let mut responses = 0usize;
        let mut last_failure = None;

        // Handles are joined in request order, so zipping keeps day identity
        for (&day, joined) in days.iter().zip(joined) {
            let outcome = joined.unwrap_or_else(|e| DayOutcome::Failed(format!("task failed: {}", e)));

            if outcome.responded() {
                responses += 1;
            }

            let value = match outcome {
                DayOutcome::Value(value) => value,
                DayOutcome::Failed(reason) => {
                    warn!(metric = %metric, %day, %reason, "Day query failed");
                    collection.failed_days.push(day);
                    last_failure = Some(reason);
                    None
                }
                DayOutcome::TimedOut => {
                    warn!(metric = %metric, %day, timeout_ms = self.config.per_day_timeout_ms, "Day query timed out");
                    collection.timed_out_days.push(day);
                    None
                }
            };
            collection.values.insert(day, value);
        }

        debug!(
            metric = %metric,
            responses,
            with_data = collection.days_with_data(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Join complete"
        );

        if !days.is_empty() && responses == 0 {
            return Err(VitalError::ProviderUnavailable {
                provider: self.provider.name().to_string(),
                reason: last_failure.unwrap_or_else(|| {
                    format!("all {} day queries timed out", days.len())
                }),
            });
        }

        Ok(collection)
    }

    /// Intraday readings for a single day
    ///
    /// There is only one query, so a failure or timeout is a total outage.
    pub async fn collect_intraday(&self, metric: MetricKind, day: DayKey) -> Result<Vec<MetricSample>> {
        let timeout = self.config.per_day_timeout();

        match tokio::time::timeout(timeout, self.provider.fetch_intraday_samples(metric, day)).await {
            Ok(Ok(samples)) => {
                debug!(metric = %metric, %day, samples = samples.len(), "Intraday samples fetched");
                Ok(samples)
            }
            Ok(Err(e)) => Err(VitalError::ProviderUnavailable {
                provider: self.provider.name().to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(VitalError::ProviderUnavailable {
                provider: self.provider.name().to_string(),
                reason: format!("intraday query timed out after {}ms", self.config.per_day_timeout_ms),
            }),
        }
    }

    /// Counter total for a single day
    ///
    /// A day without data is `None`. With only one query there is nothing to
    /// absorb a failure into, so an error or timeout is a total outage.
    pub async fn collect_counter_day(&self, metric: MetricKind, day: DayKey) -> Result<Option<f64>> {
        let collection = self.collect_daily(metric, &[day]).await?;
        Ok(collection.value(&day))
    }
}
