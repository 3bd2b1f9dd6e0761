//! Flag Evaluator
//!
//! Applies the shared threshold constants to a FeatureVector and
//! produces the set of active risk flags. Each predicate is
//! independent; flags are not mutually exclusive. Profiles later vary
//! how flags are *interpreted*, never how they are computed.
//!
//! Per-flag predicates:
//! - insufficient_history: total_tx_count < MIN_HISTORY_TX (hard gate)
//! - new_wallet:           wallet_age_days < NEW_WALLET_DAYS
//! - low_diversity:        diversity < MIN_DIVERSITY_RATIO
//! - bursty_activity:      burstiness >= MAX_BURSTINESS
//! - counterparty_concentration: concentration >= MAX_CONCENTRATION
//! - dormant:              days_since_last > DORMANT_DAYS (needs history)
//! - history_truncated:    provider paging ceiling was hit

use crate::config;
use crate::models::{FeatureVector, RiskFlag, RiskFlagSet};

/// Evaluate all flags for one feature vector. Push order is fixed so
/// the output set is deterministic.
pub fn evaluate(fv: &FeatureVector) -> RiskFlagSet {
    let mut flags = Vec::new();

    if fv.total_tx_count < config::MIN_HISTORY_TX {
        flags.push(RiskFlag::InsufficientHistory);
    }
    if fv.wallet_age_days < config::NEW_WALLET_DAYS {
        flags.push(RiskFlag::NewWallet);
    }
    if fv.diversity < config::MIN_DIVERSITY_RATIO {
        flags.push(RiskFlag::LowDiversity);
    }
    if fv.burstiness >= config::MAX_BURSTINESS {
        flags.push(RiskFlag::BurstyActivity);
    }
    if fv.concentration >= config::MAX_CONCENTRATION {
        flags.push(RiskFlag::CounterpartyConcentration);
    }
    // Dormancy only means something once there is history to go
    // dormant from
    if fv.total_tx_count > 0 && fv.days_since_last_activity > config::DORMANT_DAYS {
        flags.push(RiskFlag::Dormant);
    }
    if fv.history_truncated {
        flags.push(RiskFlag::HistoryTruncated);
    }

    RiskFlagSet { flags }
}
