use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;

use crate::zones::Zone;

/// Calendar-day identifier used as the aggregation grain
pub type DayKey = NaiveDate;

/// Physiological metrics supplied by the wearable data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    HeartRate,
    RestingHeartRate,
    HeartRateVariability,
    RespiratoryRate,
    BloodOxygen,
    Steps,
    ActiveCalories,
    Vo2Max,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::HeartRate,
        MetricKind::RestingHeartRate,
        MetricKind::HeartRateVariability,
        MetricKind::RespiratoryRate,
        MetricKind::BloodOxygen,
        MetricKind::Steps,
        MetricKind::ActiveCalories,
        MetricKind::Vo2Max,
    ];

    /// Unit the provider reports values in
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::HeartRate | MetricKind::RestingHeartRate => "bpm",
            MetricKind::HeartRateVariability => "ms",
            MetricKind::RespiratoryRate => "breaths/min",
            MetricKind::BloodOxygen => "%",
            MetricKind::Steps => "count",
            MetricKind::ActiveCalories => "kcal",
            MetricKind::Vo2Max => "ml/kg/min",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "Heart Rate",
            MetricKind::RestingHeartRate => "Resting Heart Rate",
            MetricKind::HeartRateVariability => "HRV",
            MetricKind::RespiratoryRate => "Respiratory Rate",
            MetricKind::BloodOxygen => "Blood Oxygen",
            MetricKind::Steps => "Steps",
            MetricKind::ActiveCalories => "Active Calories",
            MetricKind::Vo2Max => "VO2 Max",
        }
    }

    /// Cumulative daily counters are summed by the provider rather than averaged
    pub fn is_counter(&self) -> bool {
        matches!(self, MetricKind::Steps | MetricKind::ActiveCalories)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "heart_rate" | "hr" => Ok(MetricKind::HeartRate),
            "resting_heart_rate" | "rhr" => Ok(MetricKind::RestingHeartRate),
            "heart_rate_variability" | "hrv" => Ok(MetricKind::HeartRateVariability),
            "respiratory_rate" | "rr" => Ok(MetricKind::RespiratoryRate),
            "blood_oxygen" | "spo2" => Ok(MetricKind::BloodOxygen),
            "steps" => Ok(MetricKind::Steps),
            "active_calories" | "calories" => Ok(MetricKind::ActiveCalories),
            "vo2_max" | "vo2max" => Ok(MetricKind::Vo2Max),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

/// A single reading produced by the sample provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub metric: MetricKind,
}

impl MetricSample {
    pub fn new(metric: MetricKind, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            metric,
        }
    }
}

/// Day-level statistics for one metric
///
/// Statistics are `None` when the day had no data and fallback did not run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub day: DayKey,
    pub metric: MetricKind,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sample_count: usize,
    pub is_synthetic: bool,
}

impl DailyAggregate {
    pub fn empty(day: DayKey, metric: MetricKind) -> Self {
        Self {
            day,
            metric,
            mean: None,
            min: None,
            max: None,
            sample_count: 0,
            is_synthetic: false,
        }
    }

    /// A day summarised by the provider as a single scalar
    pub fn from_scalar(day: DayKey, metric: MetricKind, value: f64) -> Self {
        Self {
            day,
            metric,
            mean: Some(value),
            min: Some(value),
            max: Some(value),
            sample_count: 1,
            is_synthetic: false,
        }
    }

    /// Placeholder day; carries no samples
    pub fn synthetic(day: DayKey, metric: MetricKind, value: f64) -> Self {
        Self {
            day,
            metric,
            mean: Some(value),
            min: Some(value),
            max: Some(value),
            sample_count: 0,
            is_synthetic: true,
        }
    }

    /// True when real samples back this day
    pub fn has_data(&self) -> bool {
        self.sample_count > 0
    }
}

/// Ordering requested by a consumer of day sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOrder {
    /// Oldest first (aggregation)
    #[default]
    Ascending,
    /// Newest first (display)
    Descending,
}

/// Window-level statistics over the per-day means
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: Option<f64>,
    pub days_with_data: usize,
}

impl WindowSummary {
    /// Summarise the days that carry a value; empty days are skipped
    pub fn from_days(days: &[DailyAggregate]) -> Self {
        let values: Vec<f64> = days.iter().filter_map(|d| d.mean).collect();

        if values.is_empty() {
            return Self::default();
        }

        Self {
            mean: Some(values.iter().mean()),
            min: Some(Statistics::min(values.iter())),
            max: Some(Statistics::max(values.iter())),
            sum: Some(values.iter().sum()),
            days_with_data: values.len(),
        }
    }
}

/// Contiguous run of daily aggregates, oldest to newest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub metric: MetricKind,
    pub days: Vec<DailyAggregate>,
    pub summary: WindowSummary,
    /// Set when every day was synthesised by the fallback policy
    pub is_synthetic: bool,
}

impl WindowResult {
    pub fn new(metric: MetricKind, days: Vec<DailyAggregate>) -> Self {
        let summary = WindowSummary::from_days(&days);
        let is_synthetic = !days.is_empty() && days.iter().all(|d| d.is_synthetic);
        Self {
            metric,
            days,
            summary,
            is_synthetic,
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// At least one day carries real samples
    pub fn is_usable(&self) -> bool {
        self.days.iter().any(DailyAggregate::has_data)
    }

    /// Per-day means of days with a value, oldest first
    pub fn values(&self) -> Vec<f64> {
        self.days.iter().filter_map(|d| d.mean).collect()
    }

    pub fn last_day(&self) -> Option<DayKey> {
        self.days.last().map(|d| d.day)
    }

    /// Days in the order a consumer asked for
    pub fn ordered(&self, order: DayOrder) -> Vec<&DailyAggregate> {
        match order {
            DayOrder::Ascending => self.days.iter().collect(),
            DayOrder::Descending => self.days.iter().rev().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
            TrendDirection::Flat => write!(f, "flat"),
        }
    }
}

/// Recent against prior sub-window comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub recent_average: f64,
    pub prior_average: f64,
    pub percent_delta: f64,
    pub direction: TrendDirection,
    /// Number of daily values the trend was computed from
    pub sample_days: usize,
    pub is_synthetic: bool,
}

impl TrendResult {
    pub fn neutral(sample_days: usize) -> Self {
        Self {
            recent_average: 0.0,
            prior_average: 0.0,
            percent_delta: 0.0,
            direction: TrendDirection::Flat,
            sample_days,
            is_synthetic: false,
        }
    }
}

/// Today's progress towards a counter goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub current: i64,
    pub goal: i64,
    /// Fraction complete, clamped to [0, 1]
    pub percent: f64,
    pub met_goal: bool,
}

/// Goal attainment over a historical window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalHistory {
    pub met_count: usize,
    pub average: f64,
    pub days_with_data: usize,
    pub window_days: usize,
    pub is_synthetic: bool,
}

/// Hours credited to one zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneTime {
    pub zone: &'static Zone,
    pub hours: f64,
}

/// Time-in-zone for a single day, every zone of the table in table order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneBreakdown {
    pub metric: MetricKind,
    pub day: DayKey,
    pub zones: Vec<ZoneTime>,
    pub total_hours: f64,
    pub sample_count: usize,
}

impl ZoneBreakdown {
    pub fn hours_in(&self, label: &str) -> Option<f64> {
        self.zones
            .iter()
            .find(|zt| zt.zone.label == label)
            .map(|zt| zt.hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> DayKey {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("hrv".parse::<MetricKind>().unwrap(), MetricKind::HeartRateVariability);
        assert_eq!("blood-oxygen".parse::<MetricKind>().unwrap(), MetricKind::BloodOxygen);
        assert_eq!("VO2MAX".parse::<MetricKind>().unwrap(), MetricKind::Vo2Max);
        assert!("glucose".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_counter_metrics() {
        let counters: Vec<_> = MetricKind::ALL.iter().filter(|m| m.is_counter()).collect();
        assert_eq!(counters, vec![&MetricKind::Steps, &MetricKind::ActiveCalories]);
    }

    #[test]
    fn test_summary_skips_empty_days() {
        let days = vec![
            DailyAggregate::from_scalar(day(1), MetricKind::HeartRate, 60.0),
            DailyAggregate::empty(day(2), MetricKind::HeartRate),
            DailyAggregate::from_scalar(day(3), MetricKind::HeartRate, 70.0),
        ];

        let summary = WindowSummary::from_days(&days);
        assert_eq!(summary.mean, Some(65.0));
        assert_eq!(summary.min, Some(60.0));
        assert_eq!(summary.max, Some(70.0));
        assert_eq!(summary.sum, Some(130.0));
        assert_eq!(summary.days_with_data, 2);
    }

    #[test]
    fn test_summary_all_empty_is_absent() {
        let days = vec![
            DailyAggregate::empty(day(1), MetricKind::Steps),
            DailyAggregate::empty(day(2), MetricKind::Steps),
        ];

        let summary = WindowSummary::from_days(&days);
        assert_eq!(summary, WindowSummary::default());
        assert!(summary.mean.is_none());
    }

    #[test]
    fn test_window_ordering() {
        let window = WindowResult::new(
            MetricKind::Steps,
            vec![
                DailyAggregate::from_scalar(day(1), MetricKind::Steps, 1.0),
                DailyAggregate::from_scalar(day(2), MetricKind::Steps, 2.0),
            ],
        );

        let desc: Vec<_> = window.ordered(DayOrder::Descending).iter().map(|d| d.day).collect();
        assert_eq!(desc, vec![day(2), day(1)]);
        assert!(!window.is_synthetic);
        assert!(window.is_usable());
    }
}
