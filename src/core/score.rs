//! Scoring Engine
//!
//! Combines the feature vector and flag set into a 0-100 score with a
//! per-component point breakdown. Structured as an ordered list of
//! independent rules evaluated exactly once: no early exits, no
//! accumulation tricks, so the explanation is exhaustive and the same
//! inputs always produce the bit-identical breakdown.
//!
//! Components (ceilings sum to 100):
//! - history_depth  30  (wallet age + transaction count)
//! - diversity      25  (counterparties + tokens)
//! - stability      25  (burstiness + active-day consistency)
//! - concentration  20  (top counterparty share)
//!
//! Active flags append fixed negative entries. Total =
//! clamp(sum of all entries, 0, 100), so the breakdown sum always
//! reconciles with the reported score.

use crate::config;
use crate::models::{FeatureVector, RiskFlag, RiskFlagSet, ScoreBreakdown, ScoreComponent};

/// Score one wallet. Pure and deterministic.
pub fn score(fv: &FeatureVector, flags: &RiskFlagSet) -> ScoreBreakdown {
    let mut components = vec![
        history_depth(fv),
        diversity(fv),
        stability(fv),
        concentration(fv),
    ];

    for flag in &flags.flags {
        components.push(deduction(*flag));
    }

    let total = components.iter().map(|c| c.points).sum::<i32>().clamp(0, 100) as u8;

    ScoreBreakdown { total, components }
}

/// Linear ramp from full points at `full_at` down to zero at
/// `zero_at`, clamped
fn ramp_down(value: f64, full_at: f64, zero_at: f64, max_points: f64) -> f64 {
    if value <= full_at {
        max_points
    } else if value >= zero_at {
        0.0
    } else {
        max_points * (1.0 - (value - full_at) / (zero_at - full_at))
    }
}

fn saturate(value: f64, saturation: f64) -> f64 {
    (value / saturation).min(1.0)
}

fn history_depth(fv: &FeatureVector) -> ScoreComponent {
    let age_pts = saturate(fv.wallet_age_days as f64, config::AGE_SATURATION_DAYS) * 15.0;
    let depth_pts = saturate(fv.total_tx_count as f64, config::TX_SATURATION_COUNT) * 15.0;
    let points = (age_pts + depth_pts).round() as i32;

    ScoreComponent {
        name: "history_depth".to_string(),
        points,
        max_points: config::MAX_HISTORY_POINTS,
        explanation: format!(
            "Wallet age {} days, {} transactions on record",
            fv.wallet_age_days, fv.total_tx_count
        ),
    }
}

fn diversity(fv: &FeatureVector) -> ScoreComponent {
    let cp_pts = saturate(fv.unique_counterparties as f64, config::COUNTERPARTY_SATURATION) * 15.0;
    let token_pts = saturate(fv.unique_tokens as f64, config::TOKEN_SATURATION) * 10.0;
    let points = (cp_pts + token_pts).round() as i32;

    ScoreComponent {
        name: "diversity".to_string(),
        points,
        max_points: config::MAX_DIVERSITY_POINTS,
        explanation: format!(
            "{} distinct counterparties, {} distinct tokens, stablecoin ratio {:.2}",
            fv.unique_counterparties, fv.unique_tokens, fv.stablecoin_ratio
        ),
    }
}

fn stability(fv: &FeatureVector) -> ScoreComponent {
    if fv.total_tx_count == 0 {
        return ScoreComponent {
            name: "stability".to_string(),
            points: 0,
            max_points: config::MAX_STABILITY_POINTS,
            explanation: "No activity to assess".to_string(),
        };
    }

    let burst_pts = ramp_down(
        fv.burstiness,
        config::BURST_FULL_POINTS_AT,
        config::BURST_ZERO_POINTS_AT,
        15.0,
    );
    let consistency_pts = saturate(fv.consistency, config::CONSISTENCY_SATURATION) * 10.0;
    let points = (burst_pts + consistency_pts).round() as i32;

    ScoreComponent {
        name: "stability".to_string(),
        points,
        max_points: config::MAX_STABILITY_POINTS,
        explanation: format!(
            "Burstiness {:.2}, active on {} days (consistency {:.2})",
            fv.burstiness, fv.active_days, fv.consistency
        ),
    }
}

fn concentration(fv: &FeatureVector) -> ScoreComponent {
    if fv.total_tx_count == 0 {
        return ScoreComponent {
            name: "concentration".to_string(),
            points: 0,
            max_points: config::MAX_CONCENTRATION_POINTS,
            explanation: "No activity to assess".to_string(),
        };
    }

    let points = ramp_down(
        fv.concentration,
        config::CONCENTRATION_FULL_AT,
        config::CONCENTRATION_ZERO_AT,
        config::MAX_CONCENTRATION_POINTS as f64,
    )
    .round() as i32;

    ScoreComponent {
        name: "concentration".to_string(),
        points,
        max_points: config::MAX_CONCENTRATION_POINTS,
        explanation: format!(
            "Top counterparty accounts for {:.0}% of transactions",
            fv.concentration * 100.0
        ),
    }
}

fn deduction(flag: RiskFlag) -> ScoreComponent {
    let (points, why) = match flag {
        RiskFlag::InsufficientHistory => (
            config::DEDUCT_INSUFFICIENT_HISTORY,
            format!("Fewer than {} transactions", config::MIN_HISTORY_TX),
        ),
        RiskFlag::NewWallet => (
            config::DEDUCT_NEW_WALLET,
            format!("Wallet younger than {} days", config::NEW_WALLET_DAYS),
        ),
        RiskFlag::BurstyActivity => (
            config::DEDUCT_BURSTY,
            "Activity concentrated in short bursts".to_string(),
        ),
        RiskFlag::Dormant => (
            config::DEDUCT_DORMANT,
            format!("No activity for over {} days", config::DORMANT_DAYS),
        ),
        RiskFlag::LowDiversity => (
            config::DEDUCT_LOW_DIVERSITY,
            "Few counterparties relative to activity".to_string(),
        ),
        RiskFlag::CounterpartyConcentration => (
            config::DEDUCT_CONCENTRATION,
            "Volume dominated by a single counterparty".to_string(),
        ),
        RiskFlag::HistoryTruncated => (
            config::DEDUCT_TRUNCATED,
            "History partial, provider paging limit hit".to_string(),
        ),
    };

    ScoreComponent {
        name: format!("flag:{}", flag.as_str()),
        points: -points,
        max_points: 0,
        explanation: why,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flags;

    fn strong_vector() -> FeatureVector {
        FeatureVector {
            wallet_age_days: 730,
            total_tx_count: 500,
            unique_counterparties: 80,
            unique_tokens: 12,
            diversity: 0.16,
            burstiness: 1.4,
            concentration: 0.0125,
            active_days: 500,
            consistency: 0.68,
            days_since_last_activity: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_strong_wallet_scores_high() {
        let fv = strong_vector();
        let breakdown = score(&fv, &flags::evaluate(&fv));
        assert!(breakdown.total >= 80, "score was {}", breakdown.total);
    }

    #[test]
    fn test_breakdown_sum_reconciles() {
        let fv = strong_vector();
        let breakdown = score(&fv, &flags::evaluate(&fv));
        assert_eq!(
            breakdown.component_sum().clamp(0, 100) as u8,
            breakdown.total
        );
    }

    #[test]
    fn test_zero_contribution_components_listed() {
        let fv = FeatureVector::default();
        let breakdown = score(&fv, &flags::evaluate(&fv));
        let names: Vec<&str> = breakdown.components.iter().map(|c| c.name.as_str()).collect();
        // All four positive components present even when worth 0
        for name in ["history_depth", "diversity", "stability", "concentration"] {
            assert!(names.contains(&name), "missing component {}", name);
        }
        assert_eq!(breakdown.total, 0);
    }

    #[test]
    fn test_flags_deduct_points() {
        let fv = strong_vector();
        let clean = score(&fv, &RiskFlagSet::default());
        let flagged = score(
            &fv,
            &RiskFlagSet {
                flags: vec![RiskFlag::BurstyActivity, RiskFlag::Dormant],
            },
        );
        assert_eq!(
            flagged.total as i32,
            (clean.total as i32 - config::DEDUCT_BURSTY - config::DEDUCT_DORMANT).clamp(0, 100)
        );
    }

    #[test]
    fn test_score_floored_at_zero() {
        let fv = FeatureVector::default();
        let all_flags = RiskFlagSet {
            flags: vec![
                RiskFlag::InsufficientHistory,
                RiskFlag::NewWallet,
                RiskFlag::LowDiversity,
                RiskFlag::BurstyActivity,
                RiskFlag::Dormant,
                RiskFlag::CounterpartyConcentration,
            ],
        };
        let breakdown = score(&fv, &all_flags);
        assert_eq!(breakdown.total, 0);
        assert!(breakdown.component_sum() < 0);
    }

    #[test]
    fn test_history_monotonic_in_age() {
        let mut prev = 0;
        for age in [0u32, 10, 30, 100, 365, 730, 2000] {
            let fv = FeatureVector {
                wallet_age_days: age,
                ..strong_vector()
            };
            let breakdown = score(&fv, &RiskFlagSet::default());
            let pts = breakdown
                .components
                .iter()
                .find(|c| c.name == "history_depth")
                .unwrap()
                .points;
            assert!(pts >= prev, "history points fell from {} to {} at age {}", prev, pts, age);
            prev = pts;
        }
    }

    #[test]
    fn test_determinism_bit_identical() {
        let fv = strong_vector();
        let fs = flags::evaluate(&fv);
        let a = score(&fv, &fs);
        let b = score(&fv, &fs);
        assert_eq!(a, b);
    }
}
