//! Sample provider seam
//!
//! The wearable/health data source lives outside this crate. Everything the
//! engine needs from it goes through [`SampleProvider`]: one async query per
//! metric per day. Implementations must be `Send + Sync` because the collector
//! fans queries out across tokio tasks.

use async_trait::async_trait;
use chrono::{FixedOffset, Local, Offset};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{DayKey, MetricKind, MetricSample};
use crate::window::day_key;

/// Errors reported by a sample provider for a single query
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Source cannot be reached at all
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// One query failed
    #[error("Query for {metric} on {day} failed: {reason}")]
    Query {
        metric: MetricKind,
        day: DayKey,
        reason: String,
    },

    /// Provider does not record this metric
    #[error("Metric not supported by provider: {0}")]
    Unsupported(MetricKind),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Read-only async access to physiological samples
#[async_trait]
pub trait SampleProvider: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &'static str;

    /// Average of the metric over a calendar day, `None` when the day has no data
    async fn fetch_daily_average(&self, metric: MetricKind, day: DayKey)
        -> ProviderResult<Option<f64>>;

    /// Raw readings recorded during a calendar day
    async fn fetch_intraday_samples(
        &self,
        metric: MetricKind,
        day: DayKey,
    ) -> ProviderResult<Vec<MetricSample>>;

    /// Cumulative total of a counter metric for a calendar day
    async fn fetch_counter_total(&self, metric: MetricKind, day: DayKey)
        -> ProviderResult<Option<f64>>;
}

/// Provider backed by samples held in memory
///
/// Samples are bucketed by local calendar day under a fixed UTC offset.
/// Used by the CLI (samples loaded from a JSON file) and by tests.
#[derive(Debug, Clone)]
pub struct InMemorySampleProvider {
    samples: BTreeMap<(MetricKind, DayKey), Vec<MetricSample>>,
    offset: FixedOffset,
    offline: bool,
}

impl InMemorySampleProvider {
    /// Empty provider using the device's current UTC offset
    pub fn new() -> Self {
        Self::with_offset(Local::now().offset().fix())
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            samples: BTreeMap::new(),
            offset,
            offline: false,
        }
    }

    pub fn from_samples(samples: Vec<MetricSample>, offset: FixedOffset) -> Self {
        let mut provider = Self::with_offset(offset);
        provider.extend(samples);
        provider
    }

    pub fn push(&mut self, sample: MetricSample) {
        let day = day_key(&sample.timestamp, &self.offset);
        self.samples
            .entry((sample.metric, day))
            .or_default()
            .push(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = MetricSample>) {
        for sample in samples {
            self.push(sample);
        }
    }

    /// Simulate a total outage: every query fails
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    fn day_samples(&self, metric: MetricKind, day: DayKey) -> ProviderResult<&[MetricSample]> {
        if self.offline {
            return Err(ProviderError::Unavailable("in-memory provider is offline".to_string()));
        }
        Ok(self
            .samples
            .get(&(metric, day))
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }
}

impl Default for InMemorySampleProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleProvider for InMemorySampleProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_daily_average(
        &self,
        metric: MetricKind,
        day: DayKey,
    ) -> ProviderResult<Option<f64>> {
        let samples = self.day_samples(metric, day)?;
        if samples.is_empty() {
            return Ok(None);
        }
        let total: f64 = samples.iter().map(|s| s.value).sum();
        Ok(Some(total / samples.len() as f64))
    }

    async fn fetch_intraday_samples(
        &self,
        metric: MetricKind,
        day: DayKey,
    ) -> ProviderResult<Vec<MetricSample>> {
        let mut samples = self.day_samples(metric, day)?.to_vec();
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }

    async fn fetch_counter_total(
        &self,
        metric: MetricKind,
        day: DayKey,
    ) -> ProviderResult<Option<f64>> {
        if !metric.is_counter() {
            return Err(ProviderError::Unsupported(metric));
        }
        let samples = self.day_samples(metric, day)?;
        if samples.is_empty() {
            return Ok(None);
        }
        Ok(Some(samples.iter().map(|s| s.value).sum()))
    }
}
