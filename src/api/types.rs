//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::models::{AppError, ComparisonDiff, Decision, FeatureVector};
use crate::utils::{CacheStats, TelemetryStats};

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Query parameters
// ============================================

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub wallet: String,
    pub profile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeaturesQuery {
    pub wallet: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub wallet_a: String,
    pub wallet_b: String,
    pub profile: Option<String>,
}

// ============================================
// Response payloads
// ============================================

#[derive(Debug, Serialize)]
pub struct ScoreData {
    pub wallet: String,
    pub profile: String,
    pub cached: bool,
    pub decision: Decision,
}

#[derive(Debug, Serialize)]
pub struct FeaturesData {
    pub wallet: String,
    pub features: FeatureVector,
}

#[derive(Debug, Serialize)]
pub struct CompareData {
    pub wallet_a: Decision,
    pub wallet_b: Decision,
    pub diff: ComparisonDiff,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub uptime_seconds: u64,
    pub cache: CacheStats,
    pub telemetry: TelemetryStats,
}
