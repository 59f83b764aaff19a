use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use crate::collector::DailyCollection;
use crate::models::{
    DailyAggregate, DayKey, MetricKind, MetricSample, WindowResult, ZoneBreakdown, ZoneTime,
};
use crate::window::day_key;
use crate::zones::table_for;

/// Intraday zone-time settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTimeConfig {
    /// Gaps between consecutive samples longer than this are not credited to any zone
    pub max_sample_gap_minutes: u32,
}

impl Default for ZoneTimeConfig {
    fn default() -> Self {
        Self {
            max_sample_gap_minutes: 10,
        }
    }
}

/// Turns joined per-day values or raw samples into day-level aggregates
#[derive(Debug, Clone, Default)]
pub struct WindowAggregator {
    zone_time: ZoneTimeConfig,
}

impl WindowAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(zone_time: ZoneTimeConfig) -> Self {
        Self { zone_time }
    }

    /// One aggregate per requested day from the collector's per-day scalars
    ///
    /// Days absent from the collection, or present with `None`, are empty.
    pub fn from_collection(
        &self,
        metric: MetricKind,
        days: &[DayKey],
        collection: &DailyCollection,
    ) -> WindowResult {
        let aggregates = days
            .iter()
            .map(|&day| match collection.value(&day) {
                Some(value) => DailyAggregate::from_scalar(day, metric, value),
                None => DailyAggregate::empty(day, metric),
            })
            .collect();

        WindowResult::new(metric, aggregates)
    }

    /// One aggregate per requested day from raw readings
    ///
    /// Samples are assigned to local calendar days under `offset`; samples of
    /// other metrics or outside the window are ignored.
    pub fn aggregate_samples(
        &self,
        metric: MetricKind,
        days: &[DayKey],
        samples: &[MetricSample],
        offset: &FixedOffset,
    ) -> WindowResult {
        let mut by_day: BTreeMap<DayKey, Vec<f64>> =
            days.iter().map(|&d| (d, Vec::new())).collect();

        for sample in samples.iter().filter(|s| s.metric == metric) {
            if let Some(values) = by_day.get_mut(&day_key(&sample.timestamp, offset)) {
                values.push(sample.value);
            }
        }

        let aggregates = days
            .iter()
            .map(|&day| match by_day.get(&day) {
                Some(values) if !values.is_empty() => DailyAggregate {
                    day,
                    metric,
                    mean: Some(values.iter().mean()),
                    min: Some(Statistics::min(values.iter())),
                    max: Some(Statistics::max(values.iter())),
                    sample_count: values.len(),
                    is_synthetic: false,
                },
                _ => DailyAggregate::empty(day, metric),
            })
            .collect();

        WindowResult::new(metric, aggregates)
    }

    /// Hours spent in each zone over one day of readings
    ///
    /// Consecutive samples in the same zone form a run; each run is credited
    /// until the next run starts, and the last run ends at its final sample.
    /// Working pairwise gives the same totals: the interval between a sample
    /// and its successor belongs to the earlier sample's zone.
    pub fn zone_breakdown(&self, metric: MetricKind, day: DayKey, samples: &[MetricSample]) -> ZoneBreakdown {
        let table = table_for(metric);
        let max_gap_secs = i64::from(self.zone_time.max_sample_gap_minutes) * 60;

        let mut readings: Vec<&MetricSample> = samples.iter().filter(|s| s.metric == metric).collect();
        readings.sort_by_key(|s| s.timestamp);

        let mut seconds = vec![0i64; table.zones().len()];
        for pair in readings.windows(2) {
            let gap = (pair[1].timestamp - pair[0].timestamp).num_seconds();
            if gap <= 0 || gap > max_gap_secs {
                continue;
            }
            if let Some(index) = table.index_of(table.classify(pair[0].value)) {
                seconds[index] += gap;
            }
        }

        let zones: Vec<ZoneTime> = table
            .zones()
            .iter()
            .zip(&seconds)
            .map(|(zone, &secs)| ZoneTime {
                zone,
                hours: secs as f64 / 3600.0,
            })
            .collect();
        let total_hours = zones.iter().map(|z| z.hours).sum();

        ZoneBreakdown {
            metric,
            day,
            zones,
            total_hours,
            sample_count: readings.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn day(d: u32) -> DayKey {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn hr(hour: u32, minute: u32, value: f64) -> MetricSample {
        MetricSample::new(
            MetricKind::HeartRate,
            Utc.with_ymd_and_hms(2024, 7, 1, hour, minute, 0).unwrap(),
            value,
        )
    }

    #[test]
    fn test_from_collection_fills_gaps() {
        let days = vec![day(1), day(2), day(3)];
        let collection = DailyCollection {
            metric: MetricKind::RespiratoryRate,
            values: [(day(1), Some(14.0)), (day(2), None), (day(3), Some(16.0))]
                .into_iter()
                .collect(),
            failed_days: vec![],
            timed_out_days: vec![],
        };

        let window = WindowAggregator::new().from_collection(MetricKind::RespiratoryRate, &days, &collection);

        assert_eq!(window.len(), 3);
        assert_eq!(window.days[1].sample_count, 0);
        assert!(window.days[1].mean.is_none());
        assert_eq!(window.summary.mean, Some(15.0));
        assert_eq!(window.summary.days_with_data, 2);
    }

    #[test]
    fn test_all_empty_window_has_absent_summary() {
        let days = vec![day(1), day(2)];
        let collection = DailyCollection {
            metric: MetricKind::BloodOxygen,
            values: [(day(1), None), (day(2), None)].into_iter().collect(),
            failed_days: vec![],
            timed_out_days: vec![day(2)],
        };

        let window = WindowAggregator::new().from_collection(MetricKind::BloodOxygen, &days, &collection);

        assert!(window.summary.mean.is_none());
        assert!(window.summary.min.is_none());
        assert!(window.summary.max.is_none());
        assert!(!window.is_usable());
    }

    #[test]
    fn test_aggregate_samples_per_day() {
        let samples = vec![
            hr(6, 0, 50.0),
            hr(12, 0, 90.0),
            hr(18, 0, 70.0),
            MetricSample::new(MetricKind::Steps, Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap(), 500.0),
            MetricSample::new(MetricKind::HeartRate, Utc.with_ymd_and_hms(2024, 6, 20, 9, 0, 0).unwrap(), 200.0),
        ];

        let window = WindowAggregator::new().aggregate_samples(
            MetricKind::HeartRate,
            &[day(1), day(2)],
            &samples,
            &utc(),
        );

        let first = &window.days[0];
        assert_eq!(first.sample_count, 3);
        assert_eq!(first.mean, Some(70.0));
        assert_eq!(first.min, Some(50.0));
        assert_eq!(first.max, Some(90.0));
        assert_eq!(window.days[1].sample_count, 0);
        assert_eq!(window.summary.max, Some(70.0));
    }

    #[test]
    fn test_zone_breakdown_sums_runs() {
        // 30 min resting, 20 min moderate, 10 min vigorous, then the last reading
        let samples = vec![
            hr(8, 0, 70.0),
            hr(8, 10, 75.0),
            hr(8, 20, 80.0),
            hr(8, 30, 130.0),
            hr(8, 40, 140.0),
            hr(8, 50, 160.0),
            hr(9, 0, 165.0),
        ];

        let breakdown = WindowAggregator::new().zone_breakdown(MetricKind::HeartRate, day(1), &samples);

        assert_eq!(breakdown.zones.len(), 4);
        assert!((breakdown.hours_in("resting").unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(breakdown.hours_in("light"), Some(0.0));
        assert!((breakdown.hours_in("moderate").unwrap() - 20.0 / 60.0).abs() < 1e-9);
        assert!((breakdown.hours_in("vigorous").unwrap() - 10.0 / 60.0).abs() < 1e-9);
        assert!((breakdown.total_hours - 1.0).abs() < 1e-9);
        assert_eq!(breakdown.sample_count, 7);
    }

    #[test]
    fn test_zone_breakdown_skips_long_gaps() {
        let samples = vec![hr(8, 0, 70.0), hr(8, 5, 70.0), hr(11, 0, 130.0), hr(11, 5, 130.0)];

        let breakdown = WindowAggregator::new().zone_breakdown(MetricKind::HeartRate, day(1), &samples);

        assert!((breakdown.hours_in("resting").unwrap() - 5.0 / 60.0).abs() < 1e-9);
        assert!((breakdown.hours_in("moderate").unwrap() - 5.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_zone_breakdown_empty_day() {
        let breakdown = WindowAggregator::new().zone_breakdown(MetricKind::HeartRate, day(1), &[]);
        assert_eq!(breakdown.total_hours, 0.0);
        assert_eq!(breakdown.sample_count, 0);
        assert!(breakdown.zones.iter().all(|z| z.hours == 0.0));
    }
}
