//! Presentation-facing entry points
//!
//! Every request is computed fresh: window days are generated, collected from the
//! provider, aggregated, and passed through the fallback policy before trends,
//! goal figures, or zones are derived. Argument and configuration errors are
//! raised before any provider query is issued.

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::aggregator::WindowAggregator;
use crate::collector::SampleCollector;
use crate::config::AppConfig;
use crate::error::{Result, VitalError};
use crate::fallback::FallbackPolicy;
use crate::goals::{GoalProgressTracker, GoalStore};
use crate::models::{
    DayKey, DayOrder, GoalHistory, GoalProgress, MetricKind, TrendResult, WindowResult, ZoneBreakdown,
};
use crate::provider::SampleProvider;
use crate::trend::TrendAnalyzer;
use crate::window;
use crate::zones::{self, Zone};

/// Health metrics aggregation and derived-insight engine
#[derive(Clone)]
pub struct InsightEngine {
    collector: SampleCollector,
    aggregator: WindowAggregator,
    fallback: FallbackPolicy,
    trend: TrendAnalyzer,
    goals: GoalProgressTracker,
    anchor: Option<NaiveDate>,
}

impl InsightEngine {
    /// Engine with default settings
    pub fn new(provider: Arc<dyn SampleProvider>, goal_store: Arc<dyn GoalStore>) -> Self {
        Self {
            collector: SampleCollector::new(provider),
            aggregator: WindowAggregator::new(),
            fallback: FallbackPolicy::new(),
            trend: TrendAnalyzer::new(),
            goals: GoalProgressTracker::new(goal_store),
            anchor: None,
        }
    }

    /// Engine configured from an application config
    ///
    /// Goals are not taken from `config`; they are always read through `goal_store`.
    pub fn from_config(
        provider: Arc<dyn SampleProvider>,
        goal_store: Arc<dyn GoalStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            collector: SampleCollector::with_config(provider, config.collector.clone()),
            aggregator: WindowAggregator::with_config(config.zone_time.clone()),
            fallback: FallbackPolicy::with_config(config.fallback.clone()),
            trend: TrendAnalyzer::with_config(config.trend.clone()),
            goals: GoalProgressTracker::new(goal_store),
            anchor: None,
        }
    }

    /// Pin "today" to a fixed date instead of the local clock
    pub fn with_anchor(mut self, today: NaiveDate) -> Self {
        self.anchor = Some(today);
        self
    }

    pub fn today(&self) -> DayKey {
        self.anchor.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn goals(&self) -> &GoalProgressTracker {
        &self.goals
    }

    /// Day-level aggregates for the last `window_days` days, oldest first
    #[instrument(skip(self))]
    pub async fn get_window(&self, metric: MetricKind, window_days: usize) -> Result<WindowResult> {
        let days = window::window_days(self.today(), window_days, DayOrder::Ascending)?;

        let collection = self.collector.collect_daily(metric, &days).await?;
        let window = self.aggregator.from_collection(metric, &days, &collection);

        debug!(
            provider = self.collector.provider_name(),
            days_with_data = window.summary.days_with_data,
            missing = collection.missing_responses(),
            "Window aggregated"
        );

        Ok(self.fallback.apply(window))
    }

    /// Hours spent in each zone today
    pub async fn get_today_zone_breakdown(&self, metric: MetricKind) -> Result<ZoneBreakdown> {
        self.get_zone_breakdown(metric, self.today()).await
    }

    /// Hours spent in each zone on a given day
    #[instrument(skip(self))]
    pub async fn get_zone_breakdown(&self, metric: MetricKind, day: DayKey) -> Result<ZoneBreakdown> {
        let samples = self.collector.collect_intraday(metric, day).await?;
        Ok(self.aggregator.zone_breakdown(metric, day, &samples))
    }

    /// Recent against prior trend over the last `window_days` days
    #[instrument(skip(self))]
    pub async fn get_trend(&self, metric: MetricKind, window_days: usize) -> Result<TrendResult> {
        let window = self.get_window(metric, window_days).await?;
        Ok(self.trend.analyze_window(&window))
    }

    /// Today's progress towards the goal of a counter metric
    #[instrument(skip(self))]
    pub async fn get_goal_progress(&self, metric: MetricKind) -> Result<GoalProgress> {
        let goal = self.counter_goal(metric)?;
        let total = self.collector.collect_counter_day(metric, self.today()).await?;
        GoalProgressTracker::progress(metric, total, goal)
    }

    /// Days the goal was met, and the average, over the last `window_days` days
    #[instrument(skip(self))]
    pub async fn get_goal_history(&self, metric: MetricKind, window_days: usize) -> Result<GoalHistory> {
        let goal = self.counter_goal(metric)?;
        let window = self.get_window(metric, window_days).await?;
        GoalProgressTracker::history(&window, goal)
    }

    /// Direct zone lookup
    pub fn classify(&self, metric: MetricKind, value: f64) -> &'static Zone {
        zones::classify(metric, value)
    }

    fn counter_goal(&self, metric: MetricKind) -> Result<i64> {
        if !metric.is_counter() {
            return Err(VitalError::UnsupportedMetric {
                metric,
                operation: "goal tracking",
            });
        }
        self.goals.goal_for(metric)
    }
}
