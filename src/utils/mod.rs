pub mod cache;
pub mod telemetry;

pub use cache::{CacheStats, DecisionCache};
pub use telemetry::{TelemetryCollector, TelemetryStats};
