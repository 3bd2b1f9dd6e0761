//! Scoring Policy Constants & Server Configuration
//!
//! The numeric thresholds and weights here are policy parameters, not
//! facts about the chain. They are shared across profiles: profiles
//! vary the *interpretation* of flags and scores (bands, terms,
//! strictness), never their computation. Tune here, and the property
//! tests in tests/pipeline_test.rs keep the invariants honest.

use crate::models::{AppError, AppResult};

// ============================================
// Flag thresholds (shared across profiles)
// ============================================

/// Hard-gate threshold: fewer total transactions than this and the
/// decision is DENY regardless of score
pub const MIN_HISTORY_TX: u32 = 10;

/// Wallets younger than this many days are flagged new_wallet
pub const NEW_WALLET_DAYS: u32 = 30;

/// diversity (distinct counterparties / total tx) below this is
/// flagged low_diversity
pub const MIN_DIVERSITY_RATIO: f64 = 0.10;

/// burstiness (max daily tx / mean daily tx) at or above this is
/// flagged bursty_activity
pub const MAX_BURSTINESS: f64 = 5.0;

/// Top counterparty share of tx count at or above this is flagged
/// counterparty_concentration
pub const MAX_CONCENTRATION: f64 = 0.50;

/// More than this many days since last activity is flagged dormant
pub const DORMANT_DAYS: u32 = 90;

/// Floor on the burstiness/consistency observation window, in days.
/// Without it a single tight cluster of activity would define its own
/// one-day window and look perfectly smooth.
pub const MIN_OBSERVATION_DAYS: u32 = 30;

// ============================================
// Score component ceilings (sum = 100)
// ============================================

pub const MAX_HISTORY_POINTS: i32 = 30;
pub const MAX_DIVERSITY_POINTS: i32 = 25;
pub const MAX_STABILITY_POINTS: i32 = 25;
pub const MAX_CONCENTRATION_POINTS: i32 = 20;

// Saturation points for component sub-formulas
/// Wallet age at which the age sub-score maxes out (~2 years)
pub const AGE_SATURATION_DAYS: f64 = 730.0;
/// Tx count at which the depth sub-score maxes out
pub const TX_SATURATION_COUNT: f64 = 200.0;
/// Distinct counterparties at which the diversity sub-score maxes out
pub const COUNTERPARTY_SATURATION: f64 = 50.0;
/// Distinct tokens at which the token sub-score maxes out
pub const TOKEN_SATURATION: f64 = 10.0;

/// Burstiness at or below this earns full stability points
pub const BURST_FULL_POINTS_AT: f64 = 2.0;
/// Burstiness at or above this earns zero stability points
pub const BURST_ZERO_POINTS_AT: f64 = 8.0;
/// Consistency (active days / window) at which its sub-score maxes out
pub const CONSISTENCY_SATURATION: f64 = 0.5;
/// Concentration share at or below this earns full points
pub const CONCENTRATION_FULL_AT: f64 = 0.10;
/// Concentration share at or above this earns zero points
pub const CONCENTRATION_ZERO_AT: f64 = 0.60;

// ============================================
// Per-flag score deductions
// ============================================

pub const DEDUCT_INSUFFICIENT_HISTORY: i32 = 20;
pub const DEDUCT_NEW_WALLET: i32 = 10;
pub const DEDUCT_BURSTY: i32 = 8;
pub const DEDUCT_DORMANT: i32 = 8;
pub const DEDUCT_LOW_DIVERSITY: i32 = 6;
pub const DEDUCT_CONCENTRATION: i32 = 6;
pub const DEDUCT_TRUNCATED: i32 = 2;

// ============================================
// Stablecoins (best-effort, by symbol)
// ============================================

pub const STABLE_SYMBOLS: &[&str] = &[
    "USDC", "USDT", "DAI", "TUSD", "USDP", "FDUSD", "FRAX", "LUSD", "GUSD",
];

// ============================================
// Cache
// ============================================

/// Default decision cache TTL: 5 minutes
pub const CACHE_TTL_SECS: u64 = 300;

// ============================================
// Server configuration (env-driven)
// ============================================

/// Runtime server configuration loaded from environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub etherscan_api_key: String,
}

impl ServerConfig {
    /// Load from environment.
    ///
    /// PORT is read first (Railway-style), then WALLETSCORE_PORT.
    /// ETHERSCAN_API_KEY is required.
    pub fn from_env() -> AppResult<Self> {
        let host = std::env::var("WALLETSCORE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .or_else(|_| std::env::var("WALLETSCORE_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let etherscan_api_key = std::env::var("ETHERSCAN_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::missing_api_key("ETHERSCAN_API_KEY"))?;

        Ok(Self {
            host,
            port,
            etherscan_api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_ceilings_sum_to_100() {
        let total = MAX_HISTORY_POINTS
            + MAX_DIVERSITY_POINTS
            + MAX_STABILITY_POINTS
            + MAX_CONCENTRATION_POINTS;
        assert_eq!(total, 100, "Component ceilings must sum to 100");
    }

    #[test]
    fn test_thresholds_are_sane() {
        assert!(MIN_DIVERSITY_RATIO > 0.0 && MIN_DIVERSITY_RATIO < 1.0);
        assert!(MAX_CONCENTRATION > MIN_DIVERSITY_RATIO);
        assert!(MAX_BURSTINESS > 1.0);
        assert!(MIN_HISTORY_TX > 0);
    }
}
