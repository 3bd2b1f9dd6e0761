//! WalletScore Library
//!
//! Explainable wallet credit scoring for DeFi lending:
//! - Normalizes raw on-chain activity into a canonical log
//! - Extracts a deterministic behavioral feature vector
//! - Evaluates boolean risk flags and a 0-100 score with breakdown
//! - Maps score + flags to lending decisions under named profiles
//! - Compares two wallets side by side

pub mod api;
pub mod config;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use config::ServerConfig;
pub use core::{engine, policy};
pub use models::{
    ActivityLog, AppError, AppResult, ComparisonDiff, Decision, ErrorCode, FeatureVector,
    RiskFlag, RiskFlagSet, RiskTier, ScoreBreakdown, Verdict,
};
pub use providers::EtherscanClient;
pub use utils::{CacheStats, DecisionCache, TelemetryCollector, TelemetryStats};
