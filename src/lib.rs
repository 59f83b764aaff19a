// Library interface for vitalrs modules
// This allows integration tests and the CLI to access the core functionality

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod goals;
pub mod logging;
pub mod models;
pub mod provider;
pub mod trend;
pub mod window;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use aggregator::{WindowAggregator, ZoneTimeConfig};
pub use collector::{CollectorConfig, DailyCollection, SampleCollector};
pub use config::{AppConfig, TomlGoalStore};
pub use engine::InsightEngine;
pub use error::{Result, VitalError};
pub use fallback::{FallbackConfig, FallbackPolicy, PlausibleRange};
pub use goals::{GoalProgressTracker, GoalSettings, GoalStore, InMemoryGoalStore};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use provider::{InMemorySampleProvider, ProviderError, SampleProvider};
pub use trend::{TrendAnalyzer, TrendConfig};
pub use zones::{classify, table_for, Severity, Zone, ZoneTable};
