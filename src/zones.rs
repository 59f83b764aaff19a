//! Qualitative zone tables
//!
//! Each metric owns an ordered list of zones keyed by lower bound. A zone's upper
//! bound is the next zone's lower bound, so the zones of a table partition the
//! real line by construction: the first zone also absorbs everything below its
//! nominal lower bound (including NaN) and the last zone is unbounded above.

use serde::Serialize;
use std::fmt;

use crate::models::MetricKind;

/// Errors found while validating a zone table
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    #[error("Zone table for {0} is empty")]
    EmptyTable(MetricKind),
    #[error("Zone '{label}' in {metric} table does not start above the previous zone")]
    UnorderedBound { metric: MetricKind, label: &'static str },
    #[error("Zone '{label}' in {metric} table has a non-finite lower bound")]
    NonFiniteBound { metric: MetricKind, label: &'static str },
}

/// Presentation severity tag attached to each zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Optimal,
    Normal,
    Caution,
    Alert,
}

impl Severity {
    /// Colour name the presentation layer maps the tag to
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Optimal => "green",
            Severity::Normal => "blue",
            Severity::Caution => "yellow",
            Severity::Alert => "red",
        }
    }
}

/// Where a zone starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum LowerBound {
    /// `[value, ...`
    Inclusive(f64),
    /// `(value, ...`
    Exclusive(f64),
}

impl LowerBound {
    pub fn value(&self) -> f64 {
        match self {
            LowerBound::Inclusive(v) | LowerBound::Exclusive(v) => *v,
        }
    }

    fn admits(&self, x: f64) -> bool {
        match self {
            LowerBound::Inclusive(v) => x >= *v,
            LowerBound::Exclusive(v) => x > *v,
        }
    }
}

/// A qualitative category a value falls into
#[derive(Debug, PartialEq, Serialize)]
pub struct Zone {
    pub label: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub lower: LowerBound,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

const fn zone(
    lower: LowerBound,
    label: &'static str,
    description: &'static str,
    severity: Severity,
) -> Zone {
    Zone {
        label,
        description,
        severity,
        lower,
    }
}

use LowerBound::{Exclusive, Inclusive};

static HEART_RATE_ZONES: [Zone; 4] = [
    zone(Inclusive(0.0), "resting", "Resting or everyday activity", Severity::Normal),
    zone(Inclusive(100.0), "light", "Light activity, easy movement", Severity::Optimal),
    zone(Inclusive(120.0), "moderate", "Moderate aerobic effort", Severity::Caution),
    zone(Inclusive(150.0), "vigorous", "Vigorous, high-intensity effort", Severity::Alert),
];

static RESTING_HEART_RATE_ZONES: [Zone; 5] = [
    zone(Inclusive(0.0), "athlete", "Typical of well-trained endurance athletes", Severity::Optimal),
    zone(Inclusive(40.0), "excellent", "Excellent cardiovascular fitness", Severity::Optimal),
    zone(Inclusive(60.0), "good", "Good cardiovascular fitness", Severity::Normal),
    zone(Inclusive(70.0), "average", "Average for most adults", Severity::Normal),
    zone(Inclusive(80.0), "above-average", "Higher than typical resting heart rate", Severity::Caution),
];

static HRV_ZONES: [Zone; 4] = [
    zone(Inclusive(0.0), "poor", "Low recovery, consider rest", Severity::Alert),
    zone(Inclusive(30.0), "fair", "Partial recovery", Severity::Caution),
    zone(Inclusive(50.0), "good", "Well recovered", Severity::Normal),
    zone(Inclusive(70.0), "excellent", "Fully recovered and ready", Severity::Optimal),
];

static RESPIRATORY_RATE_ZONES: [Zone; 3] = [
    zone(Inclusive(0.0), "below-normal", "Slower breathing than typical", Severity::Caution),
    zone(Inclusive(12.0), "normal", "Typical resting breathing rate", Severity::Normal),
    zone(Exclusive(20.0), "above-normal", "Faster breathing than typical", Severity::Caution),
];

static BLOOD_OXYGEN_ZONES: [Zone; 2] = [
    zone(Inclusive(0.0), "below-normal", "Oxygen saturation below the typical range", Severity::Alert),
    zone(Inclusive(95.0), "normal", "Healthy oxygen saturation", Severity::Normal),
];

static STEPS_ZONES: [Zone; 5] = [
    zone(Inclusive(0.0), "sedentary", "Mostly inactive day", Severity::Alert),
    zone(Inclusive(5000.0), "low-active", "Some movement", Severity::Caution),
    zone(Inclusive(7500.0), "somewhat-active", "Moderately active day", Severity::Normal),
    zone(Inclusive(10000.0), "active", "Active day", Severity::Optimal),
    zone(Inclusive(12500.0), "highly-active", "Very active day", Severity::Optimal),
];

static ACTIVE_CALORIES_ZONES: [Zone; 3] = [
    zone(Inclusive(0.0), "low", "Low active energy burn", Severity::Caution),
    zone(Inclusive(300.0), "moderate", "Moderate active energy burn", Severity::Normal),
    zone(Inclusive(600.0), "high", "High active energy burn", Severity::Optimal),
];

static VO2_MAX_ZONES: [Zone; 4] = [
    zone(Inclusive(0.0), "poor", "Below-average aerobic capacity", Severity::Alert),
    zone(Inclusive(35.0), "fair", "Fair aerobic capacity", Severity::Caution),
    zone(Inclusive(43.0), "good", "Good aerobic capacity", Severity::Normal),
    zone(Inclusive(53.0), "excellent", "Excellent aerobic capacity", Severity::Optimal),
];

/// Ordered zone list for one metric
///
/// Only [`table_for`] builds tables, so every table is one of the non-empty
/// statics above.
#[derive(Debug, Clone, Copy)]
pub struct ZoneTable {
    metric: MetricKind,
    zones: &'static [Zone],
}

impl ZoneTable {
    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    pub fn zones(&self) -> &'static [Zone] {
        self.zones
    }

    /// Zone containing `value`; values below the first bound, and NaN, fall in the first zone
    pub fn classify(&self, value: f64) -> &'static Zone {
        let zones = self.zones;
        zones
            .iter()
            .rev()
            .find(|z| z.lower.admits(value))
            .unwrap_or_else(|| &zones[0])
    }

    /// Upper bound of the zone at `index` as `(value, inclusive)`, `None` for the last zone
    pub fn upper_bound(&self, index: usize) -> Option<(f64, bool)> {
        self.zones.get(index + 1).map(|next| match next.lower {
            Inclusive(v) => (v, false),
            Exclusive(v) => (v, true),
        })
    }

    /// Position of a zone inside this table
    pub fn index_of(&self, zone: &Zone) -> Option<usize> {
        self.zones.iter().position(|z| std::ptr::eq(z, zone))
    }

    /// Range notation such as `[12, 20]` or `(20, inf)`
    pub fn describe_range(&self, index: usize) -> String {
        let zone = &self.zones[index];
        let open = match zone.lower {
            Inclusive(_) => '[',
            Exclusive(_) => '(',
        };
        match self.upper_bound(index) {
            Some((upper, true)) => format!("{}{}, {}]", open, zone.lower.value(), upper),
            Some((upper, false)) => format!("{}{}, {})", open, zone.lower.value(), upper),
            None => format!("{}{}, inf)", open, zone.lower.value()),
        }
    }

    /// Check that lower bounds are finite and strictly increasing
    pub fn validate(&self) -> Result<(), ZoneError> {
        let first = self.zones.first().ok_or(ZoneError::EmptyTable(self.metric))?;
        if !first.lower.value().is_finite() {
            return Err(ZoneError::NonFiniteBound {
                metric: self.metric,
                label: first.label,
            });
        }

        for pair in self.zones.windows(2) {
            let next = &pair[1];
            if !next.lower.value().is_finite() {
                return Err(ZoneError::NonFiniteBound {
                    metric: self.metric,
                    label: next.label,
                });
            }
            if next.lower.value() <= pair[0].lower.value() {
                return Err(ZoneError::UnorderedBound {
                    metric: self.metric,
                    label: next.label,
                });
            }
        }

        Ok(())
    }
}

/// Zone table for a metric
pub fn table_for(metric: MetricKind) -> ZoneTable {
    let zones: &'static [Zone] = match metric {
        MetricKind::HeartRate => &HEART_RATE_ZONES,
        MetricKind::RestingHeartRate => &RESTING_HEART_RATE_ZONES,
        MetricKind::HeartRateVariability => &HRV_ZONES,
        MetricKind::RespiratoryRate => &RESPIRATORY_RATE_ZONES,
        MetricKind::BloodOxygen => &BLOOD_OXYGEN_ZONES,
        MetricKind::Steps => &STEPS_ZONES,
        MetricKind::ActiveCalories => &ACTIVE_CALORIES_ZONES,
        MetricKind::Vo2Max => &VO2_MAX_ZONES,
    };
    ZoneTable { metric, zones }
}

/// Classify a value for a metric
pub fn classify(metric: MetricKind, value: f64) -> &'static Zone {
    table_for(metric).classify(value)
}
