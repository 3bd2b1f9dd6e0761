//! Domain models and error types

pub mod errors;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use types::{
    ActivityBatches, ActivityLog, ActivityRecord, ComparisonDiff, Decision, Direction,
    FeatureVector, RawRecord, RecordKind, RiskFlag, RiskFlagSet, RiskTier, ScoreBreakdown,
    ScoreComponent, Verdict,
};
