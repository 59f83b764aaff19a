//! Daily goal progress for counter metrics
//!
//! Goal values are user configuration. They are read through an injected
//! [`GoalStore`] on every call and never cached here, so a settings change is
//! visible to the next request.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::error::{Result, VitalError};
use crate::models::{GoalHistory, GoalProgress, MetricKind, WindowResult};

/// User goal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSettings {
    pub daily_steps: i64,
    pub daily_active_calories: i64,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            daily_steps: 10_000,
            daily_active_calories: 500,
        }
    }
}

impl GoalSettings {
    /// Goal for a counter metric, `None` for metrics without goals
    pub fn goal_for(&self, metric: MetricKind) -> Option<i64> {
        match metric {
            MetricKind::Steps => Some(self.daily_steps),
            MetricKind::ActiveCalories => Some(self.daily_active_calories),
            _ => None,
        }
    }

    pub fn set_goal(&mut self, metric: MetricKind, goal: i64) -> Result<()> {
        validate_goal(metric, goal)?;
        match metric {
            MetricKind::Steps => self.daily_steps = goal,
            MetricKind::ActiveCalories => self.daily_active_calories = goal,
            _ => {
                return Err(VitalError::UnsupportedMetric {
                    metric,
                    operation: "goal tracking",
                })
            }
        }
        Ok(())
    }

    /// Reject non-positive goals
    pub fn validate(&self) -> Result<()> {
        validate_goal(MetricKind::Steps, self.daily_steps)?;
        validate_goal(MetricKind::ActiveCalories, self.daily_active_calories)
    }
}

fn validate_goal(metric: MetricKind, goal: i64) -> Result<()> {
    if goal <= 0 {
        return Err(VitalError::InvalidGoal { metric, goal });
    }
    Ok(())
}

/// Persistence seam for goal settings
pub trait GoalStore: Send + Sync {
    fn load(&self) -> Result<GoalSettings>;
    fn save(&self, settings: &GoalSettings) -> Result<()>;
}

/// Goal store held in memory
#[derive(Debug, Default)]
pub struct InMemoryGoalStore {
    settings: RwLock<GoalSettings>,
}

impl InMemoryGoalStore {
    pub fn new(settings: GoalSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

impl GoalStore for InMemoryGoalStore {
    fn load(&self) -> Result<GoalSettings> {
        self.settings
            .read()
            .map(|s| s.clone())
            .map_err(|_| VitalError::Configuration("goal settings lock poisoned".to_string()))
    }

    fn save(&self, settings: &GoalSettings) -> Result<()> {
        let mut guard = self
            .settings
            .write()
            .map_err(|_| VitalError::Configuration("goal settings lock poisoned".to_string()))?;
        *guard = settings.clone();
        Ok(())
    }
}

/// Compares counter totals against the user's goals
#[derive(Clone)]
pub struct GoalProgressTracker {
    store: Arc<dyn GoalStore>,
}

impl GoalProgressTracker {
    pub fn new(store: Arc<dyn GoalStore>) -> Self {
        Self { store }
    }

    /// Current valid goal for a counter metric
    pub fn goal_for(&self, metric: MetricKind) -> Result<i64> {
        let goal = self
            .store
            .load()?
            .goal_for(metric)
            .ok_or(VitalError::UnsupportedMetric {
                metric,
                operation: "goal tracking",
            })?;
        validate_goal(metric, goal)?;
        Ok(goal)
    }

    /// Update and persist a goal
    pub fn set_goal(&self, metric: MetricKind, goal: i64) -> Result<()> {
        let mut settings = self.store.load()?;
        settings.set_goal(metric, goal)?;
        self.store.save(&settings)?;
        debug!(metric = %metric, goal, "Goal updated");
        Ok(())
    }

    /// Progress of a day's total against a goal
    pub fn progress(metric: MetricKind, total: Option<f64>, goal: i64) -> Result<GoalProgress> {
        validate_goal(metric, goal)?;

        let current = total.map(|t| t.round() as i64).unwrap_or(0);
        let percent = (current as f64 / goal as f64).clamp(0.0, 1.0);

        Ok(GoalProgress {
            current,
            goal,
            percent,
            met_goal: current >= goal,
        })
    }

    /// Goal attainment over a window of daily totals
    pub fn history(window: &WindowResult, goal: i64) -> Result<GoalHistory> {
        validate_goal(window.metric, goal)?;

        let values = window.values();
        let met_count = values.iter().filter(|&&v| v >= goal as f64).count();
        let average = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };

        Ok(GoalHistory {
            met_count,
            average,
            days_with_data: values.len(),
            window_days: window.len(),
            is_synthetic: window.is_synthetic,
        })
    }
}
