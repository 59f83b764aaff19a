use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::models::{TrendDirection, TrendResult, WindowResult};

/// Trend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Entries in each of the recent and prior sub-windows
    pub sub_window: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self { sub_window: 3 }
    }
}

/// Compares the mean of the most recent entries against the earliest ones
///
/// The prior sub-window is the first `k` entries and the recent one the last
/// `k`, with `k = min(sub_window, len)`. For sequences shorter than `2k` the two
/// sub-windows share entries, which damps the reported change.
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrendConfig) -> Self {
        Self { config }
    }

    /// Trend over an oldest-to-newest sequence of daily values
    pub fn analyze(&self, values: &[f64]) -> TrendResult {
        if values.len() < 2 {
            return TrendResult::neutral(values.len());
        }

        let k = self.config.sub_window.max(1).min(values.len());
        let prior_average = values[..k].iter().mean();
        let recent_average = values[values.len() - k..].iter().mean();

        if prior_average == 0.0 {
            return TrendResult {
                recent_average,
                prior_average,
                ..TrendResult::neutral(values.len())
            };
        }

        let percent_delta = (recent_average - prior_average) / prior_average * 100.0;
        let direction = if percent_delta > 0.0 {
            TrendDirection::Up
        } else if percent_delta < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        };

        TrendResult {
            recent_average,
            prior_average,
            percent_delta,
            direction,
            sample_days: values.len(),
            is_synthetic: false,
        }
    }

    /// Trend over the days of a window that carry a value
    pub fn analyze_window(&self, window: &WindowResult) -> TrendResult {
        TrendResult {
            is_synthetic: window.is_synthetic,
            ..self.analyze(&window.values())
        }
    }
}
