//! Placeholder data for windows with no real samples
//!
//! The decision is all-or-nothing per window: a window with at least one real
//! day is returned untouched, a window with none has every day replaced by a
//! synthetic value drawn from the metric's plausible range. Synthetic days are
//! always flagged so consumers can show a demo-data indicator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{DailyAggregate, MetricKind, WindowResult};

/// Fallback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Synthesize placeholder values for unusable windows
    pub enabled: bool,

    /// Fixed seed for reproducible placeholder values
    pub seed: Option<u64>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
        }
    }
}

/// Closed range placeholder values are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Declared range for a metric
    pub fn for_metric(metric: MetricKind) -> Self {
        match metric {
            MetricKind::HeartRate => Self::new(60.0, 100.0),
            MetricKind::RestingHeartRate => Self::new(55.0, 75.0),
            MetricKind::HeartRateVariability => Self::new(40.0, 80.0),
            MetricKind::RespiratoryRate => Self::new(12.0, 20.0),
            MetricKind::BloodOxygen => Self::new(95.0, 100.0),
            MetricKind::Steps => Self::new(3000.0, 12000.0),
            MetricKind::ActiveCalories => Self::new(200.0, 600.0),
            MetricKind::Vo2Max => Self::new(35.0, 50.0),
        }
    }
}

/// Decides whether a window is usable and synthesizes one when it is not
#[derive(Debug, Clone, Default)]
pub struct FallbackPolicy {
    config: FallbackConfig,
}

impl FallbackPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FallbackConfig) -> Self {
        Self { config }
    }

    /// Usable iff at least one day has real samples
    pub fn is_usable(&self, window: &WindowResult) -> bool {
        window.is_usable()
    }

    /// Return the window unchanged when usable, otherwise a fully synthetic copy
    pub fn apply(&self, window: WindowResult) -> WindowResult {
        if self.is_usable(&window) || !self.config.enabled || window.is_empty() {
            return window;
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            metric = %window.metric,
            days = window.len(),
            "No samples in window, synthesizing placeholder values"
        );

        let metric = window.metric;
        let days = window
            .days
            .iter()
            .map(|d| DailyAggregate::synthetic(d.day, metric, Self::synthesize(metric, &mut rng)))
            .collect();

        WindowResult::new(metric, days)
    }

    fn synthesize(metric: MetricKind, rng: &mut StdRng) -> f64 {
        let range = PlausibleRange::for_metric(metric);
        let value = rng.gen_range(range.min..=range.max);
        if metric.is_counter() {
            value.round()
        } else {
            value
        }
    }
}
