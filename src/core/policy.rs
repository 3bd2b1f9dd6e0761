//! Decision Policy
//!
//! Maps (score, flags, profile) to a risk tier, a verdict, and
//! collateral/rate terms. Policy is data, not code: each profile is a
//! declarative row (score bands, medium-tier flag sensitivity,
//! high-tier strictness, tier->terms table) so new profiles are added
//! here without touching scoring.
//!
//! Evaluation order is fixed:
//! 1. hard gate: insufficient_history => DENY / HIGH, before anything
//! 2. profile score bands => tier
//! 3. tier + flag sensitivity => verdict
//! 4. tier => (max_ltv, apr) from the profile's terms table
//!
//! DENY decisions still report the terms that would apply, for
//! transparency.

use crate::models::{
    AppError, AppResult, Decision, RiskFlag, RiskFlagSet, RiskTier, ScoreBreakdown, Verdict,
};

/// Collateral and rate terms for one tier
#[derive(Debug, Clone, Copy)]
pub struct TierTerms {
    pub max_ltv: f64,
    pub apr: f64,
}

/// One named lending-policy configuration. Immutable, loaded once.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: &'static str,
    /// Scores at or above this are LOW tier
    pub low_min: u8,
    /// Scores at or above this (but below low_min) are MEDIUM tier
    pub medium_min: u8,
    /// Flags that demote a MEDIUM tier from ALLOW to LIMIT
    pub medium_limit_flags: &'static [RiskFlag],
    /// What HIGH tier gets when the hard gate did not fire
    pub high_verdict: Verdict,
    /// Terms per tier: [LOW, MEDIUM, HIGH]
    pub terms: [TierTerms; 3],
}

/// Profile applied when the caller supplies none
pub const DEFAULT_PROFILE: &str = "conservative";

static PROFILES: &[Profile] = &[
    Profile {
        name: "aave",
        low_min: 75,
        medium_min: 45,
        medium_limit_flags: &[RiskFlag::CounterpartyConcentration, RiskFlag::BurstyActivity],
        high_verdict: Verdict::Limit,
        terms: [
            TierTerms { max_ltv: 0.80, apr: 4.5 },
            TierTerms { max_ltv: 0.65, apr: 7.5 },
            TierTerms { max_ltv: 0.40, apr: 12.0 },
        ],
    },
    Profile {
        name: "morpho",
        low_min: 80,
        medium_min: 50,
        medium_limit_flags: &[
            RiskFlag::CounterpartyConcentration,
            RiskFlag::BurstyActivity,
            RiskFlag::Dormant,
        ],
        high_verdict: Verdict::Deny,
        terms: [
            TierTerms { max_ltv: 0.77, apr: 5.0 },
            TierTerms { max_ltv: 0.60, apr: 8.0 },
            TierTerms { max_ltv: 0.35, apr: 13.0 },
        ],
    },
    Profile {
        name: "conservative",
        low_min: 85,
        medium_min: 60,
        medium_limit_flags: &[
            RiskFlag::CounterpartyConcentration,
            RiskFlag::BurstyActivity,
            RiskFlag::Dormant,
            RiskFlag::NewWallet,
        ],
        high_verdict: Verdict::Deny,
        terms: [
            TierTerms { max_ltv: 0.70, apr: 6.0 },
            TierTerms { max_ltv: 0.50, apr: 9.5 },
            TierTerms { max_ltv: 0.25, apr: 15.0 },
        ],
    },
];

impl Profile {
    /// Look up a profile. None falls back to the documented default;
    /// a supplied but unknown name is a client error, never a silent
    /// default.
    pub fn resolve(name: Option<&str>) -> AppResult<&'static Profile> {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n.trim().to_lowercase(),
            _ => DEFAULT_PROFILE.to_string(),
        };
        PROFILES
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| AppError::unknown_profile(&name))
    }

    pub fn tier_for_score(&self, score: u8) -> RiskTier {
        if score >= self.low_min {
            RiskTier::Low
        } else if score >= self.medium_min {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub fn terms_for_tier(&self, tier: RiskTier) -> TierTerms {
        match tier {
            RiskTier::Low => self.terms[0],
            RiskTier::Medium => self.terms[1],
            RiskTier::High => self.terms[2],
        }
    }
}

/// Render the final decision for one wallet. One-shot classifier with
/// an explicit override rule, not a multi-step state machine.
pub fn decide(
    address: &str,
    profile: &Profile,
    breakdown: ScoreBreakdown,
    flags: RiskFlagSet,
) -> Decision {
    // 1. Hard gate overrides everything, including the score
    if flags.contains(RiskFlag::InsufficientHistory) {
        let terms = profile.terms_for_tier(RiskTier::High);
        return Decision {
            address: address.to_string(),
            profile: profile.name.to_string(),
            risk_tier: RiskTier::High,
            verdict: Verdict::Deny,
            max_ltv: terms.max_ltv,
            apr: terms.apr,
            score: breakdown.total,
            flags,
            breakdown,
        };
    }

    // 2. Score bands owned by the profile
    let tier = profile.tier_for_score(breakdown.total);

    // 3. Tier + flag sensitivity -> verdict
    let verdict = match tier {
        RiskTier::Low => Verdict::Allow,
        RiskTier::Medium => {
            if profile.medium_limit_flags.iter().any(|f| flags.contains(*f)) {
                Verdict::Limit
            } else {
                Verdict::Allow
            }
        }
        RiskTier::High => profile.high_verdict,
    };

    // 4. Terms from the profile's tier table
    let terms = profile.terms_for_tier(tier);

    Decision {
        address: address.to_string(),
        profile: profile.name.to_string(),
        risk_tier: tier,
        verdict,
        max_ltv: terms.max_ltv,
        apr: terms.apr,
        score: breakdown.total,
        flags,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreComponent;

    fn breakdown_with_total(total: u8) -> ScoreBreakdown {
        ScoreBreakdown {
            total,
            components: vec![ScoreComponent {
                name: "history_depth".to_string(),
                points: total as i32,
                max_points: 100,
                explanation: "fixture".to_string(),
            }],
        }
    }

    #[test]
    fn test_resolve_known_profiles() {
        for name in ["aave", "morpho", "conservative"] {
            assert_eq!(Profile::resolve(Some(name)).unwrap().name, name);
        }
        // Case-insensitive
        assert_eq!(Profile::resolve(Some("AAVE")).unwrap().name, "aave");
    }

    #[test]
    fn test_missing_profile_defaults_conservative() {
        assert_eq!(Profile::resolve(None).unwrap().name, "conservative");
        assert_eq!(Profile::resolve(Some("")).unwrap().name, "conservative");
    }

    #[test]
    fn test_unknown_profile_is_client_error() {
        let err = Profile::resolve(Some("compound")).unwrap_err();
        assert_eq!(err.code_str(), "POLICY_UNKNOWN_PROFILE");
    }

    #[test]
    fn test_hard_gate_overrides_score() {
        let profile = Profile::resolve(Some("aave")).unwrap();
        let flags = RiskFlagSet {
            flags: vec![RiskFlag::InsufficientHistory],
        };
        // Even a perfect score cannot pass the gate
        let decision = decide("0xabc", profile, breakdown_with_total(100), flags);
        assert_eq!(decision.verdict, Verdict::Deny);
        assert_eq!(decision.risk_tier, RiskTier::High);
        // Terms still reported for transparency
        assert!(decision.max_ltv > 0.0);
    }

    #[test]
    fn test_profile_bands_differ() {
        let score = 78;
        let aave = decide(
            "0xabc",
            Profile::resolve(Some("aave")).unwrap(),
            breakdown_with_total(score),
            RiskFlagSet::default(),
        );
        let conservative = decide(
            "0xabc",
            Profile::resolve(Some("conservative")).unwrap(),
            breakdown_with_total(score),
            RiskFlagSet::default(),
        );
        assert_eq!(aave.risk_tier, RiskTier::Low);
        assert_eq!(conservative.risk_tier, RiskTier::Medium);
    }

    #[test]
    fn test_medium_tier_flag_sensitivity() {
        let profile = Profile::resolve(Some("aave")).unwrap();
        let clean = decide(
            "0xabc",
            profile,
            breakdown_with_total(60),
            RiskFlagSet::default(),
        );
        assert_eq!(clean.verdict, Verdict::Allow);

        let concentrated = decide(
            "0xabc",
            profile,
            breakdown_with_total(60),
            RiskFlagSet {
                flags: vec![RiskFlag::CounterpartyConcentration],
            },
        );
        assert_eq!(concentrated.verdict, Verdict::Limit);
    }

    #[test]
    fn test_high_tier_strictness_varies() {
        let low_score = breakdown_with_total(20);
        let aave = decide(
            "0xabc",
            Profile::resolve(Some("aave")).unwrap(),
            low_score.clone(),
            RiskFlagSet::default(),
        );
        let morpho = decide(
            "0xabc",
            Profile::resolve(Some("morpho")).unwrap(),
            low_score,
            RiskFlagSet::default(),
        );
        assert_eq!(aave.verdict, Verdict::Limit);
        assert_eq!(morpho.verdict, Verdict::Deny);
    }

    #[test]
    fn test_terms_follow_tier() {
        let profile = Profile::resolve(Some("conservative")).unwrap();
        let low = decide("0xabc", profile, breakdown_with_total(90), RiskFlagSet::default());
        let high = decide("0xabc", profile, breakdown_with_total(10), RiskFlagSet::default());
        assert!(low.max_ltv > high.max_ltv);
        assert!(low.apr < high.apr);
    }
}
