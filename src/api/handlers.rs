//! API Request Handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::types::*;
use crate::core::{engine, normalizer, policy};
use crate::models::{ActivityLog, AppError};
use crate::providers::EtherscanClient;
use crate::utils::{DecisionCache, TelemetryCollector};

/// Shared application state
pub struct AppState {
    pub provider: Arc<EtherscanClient>,
    pub cache: Arc<DecisionCache>,
    pub telemetry: Arc<TelemetryCollector>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(provider: Arc<EtherscanClient>, telemetry: Arc<TelemetryCollector>) -> Self {
        let cache = Arc::new(DecisionCache::new());

        // Background task: cleanup expired cache entries every 60 seconds
        let cache_clone = cache.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                let removed = cache_clone.cleanup_expired();
                if removed > 0 {
                    tracing::info!("🧹 Cache cleanup: {} expired entries removed", removed);
                }
            }
        });

        Self {
            provider,
            cache,
            telemetry,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

fn reject(err: &AppError, start: Instant) -> HandlerError {
    let status = StatusCode::from_u16(err.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(
            ApiError::from(err),
            start.elapsed().as_secs_f64() * 1000.0,
        )),
    )
}

/// EVM address check: 0x prefix + 40 hex chars
fn validate_address(wallet: &str) -> Result<String, AppError> {
    let w = wallet.trim();
    let hex = w
        .strip_prefix("0x")
        .filter(|rest| rest.len() == 40 && rest.chars().all(|c| c.is_ascii_hexdigit()));
    match hex {
        Some(_) => Ok(w.to_lowercase()),
        None => Err(AppError::invalid_address(wallet)),
    }
}

/// Fetch and normalize one wallet's history. Partial bucket failures
/// are absorbed inside the provider; an error here means the provider
/// failed outright and the request should surface it.
async fn fetch_log(state: &AppState, wallet: &str) -> Result<ActivityLog, AppError> {
    let batches = state.provider.fetch_activity(wallet).await?;
    Ok(normalizer::normalize(wallet, batches))
}

/// Comparison variant: one wallet's fetch failure degrades that side
/// to an empty log (hard-gate DENY) instead of failing the whole
/// comparison.
async fn fetch_log_degraded(state: &AppState, wallet: &str) -> ActivityLog {
    match fetch_log(state, wallet).await {
        Ok(log) => log,
        Err(e) => {
            warn!(wallet, error = %e, "Activity fetch failed, comparing with empty history");
            ActivityLog::empty(wallet)
        }
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Wallet Score
// ============================================

pub async fn get_score(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScoreQuery>,
) -> Result<Json<ApiResponse<ScoreData>>, HandlerError> {
    let start = Instant::now();

    let wallet = validate_address(&query.wallet).map_err(|e| reject(&e, start))?;

    // Resolve the profile up front so an unknown name is a 400 even
    // on what would otherwise be a cache hit
    let profile = policy::Profile::resolve(query.profile.as_deref())
        .map_err(|e| reject(&e, start))?;

    let key = DecisionCache::fingerprint(&wallet, profile.name);
    if let Some(decision) = state.cache.get(&key) {
        let latency = start.elapsed().as_secs_f64() * 1000.0;
        return Ok(Json(ApiResponse::success(
            ScoreData {
                wallet,
                profile: profile.name.to_string(),
                cached: true,
                decision,
            },
            latency,
        )));
    }

    let log = fetch_log(&state, &wallet).await.map_err(|e| reject(&e, start))?;
    let now_ts = chrono::Utc::now().timestamp();

    let decision = engine::compute_decision(&log, Some(profile.name), now_ts)
        .map_err(|e| reject(&e, start))?;

    let latency_ms = start.elapsed().as_millis() as u64;
    state.telemetry.record_decision(decision.verdict, latency_ms);
    state.cache.set(key, decision.clone());

    info!(
        wallet = %wallet,
        profile = %profile.name,
        score = decision.score,
        verdict = decision.verdict.as_str(),
        latency_ms,
        "Decision computed"
    );

    Ok(Json(ApiResponse::success(
        ScoreData {
            wallet,
            profile: profile.name.to_string(),
            cached: false,
            decision,
        },
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Feature Vector
// ============================================

pub async fn get_features(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeaturesQuery>,
) -> Result<Json<ApiResponse<FeaturesData>>, HandlerError> {
    let start = Instant::now();

    let wallet = validate_address(&query.wallet).map_err(|e| reject(&e, start))?;
    let log = fetch_log(&state, &wallet).await.map_err(|e| reject(&e, start))?;
    let now_ts = chrono::Utc::now().timestamp();

    let features = engine::compute_features(&log, now_ts);
    state.telemetry.record_feature_request();

    Ok(Json(ApiResponse::success(
        FeaturesData { wallet, features },
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Wallet Comparison
// ============================================

pub async fn compare_wallets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<ApiResponse<CompareData>>, HandlerError> {
    let start = Instant::now();

    let wallet_a = validate_address(&query.wallet_a).map_err(|e| reject(&e, start))?;
    let wallet_b = validate_address(&query.wallet_b).map_err(|e| reject(&e, start))?;
    let profile = policy::Profile::resolve(query.profile.as_deref())
        .map_err(|e| reject(&e, start))?;

    // Sequential fetches: the provider throttles globally anyway
    let log_a = fetch_log_degraded(&state, &wallet_a).await;
    let log_b = fetch_log_degraded(&state, &wallet_b).await;

    // One timestamp for both sides so the comparison is apples to
    // apples
    let now_ts = chrono::Utc::now().timestamp();

    let (decision_a, decision_b, diff) =
        engine::compare(&log_a, &log_b, Some(profile.name), now_ts)
            .map_err(|e| reject(&e, start))?;

    state.telemetry.record_comparison();

    info!(
        wallet_a = %wallet_a,
        wallet_b = %wallet_b,
        profile = %profile.name,
        score_delta = diff.score_delta,
        "Comparison computed"
    );

    Ok(Json(ApiResponse::success(
        CompareData {
            wallet_a: decision_a,
            wallet_b: decision_b,
            diff,
        },
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Service Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        uptime_seconds: state.uptime_seconds(),
        cache: state.cache.stats(),
        telemetry: state.telemetry.get_stats(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}
