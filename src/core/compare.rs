//! Comparator
//!
//! Pure composition over two already-computed decisions: a
//! side-by-side diff of score, tier and flags. Swapping the inputs
//! flips the delta sign and swaps the per-side fields, nothing else.

use crate::models::{ComparisonDiff, Decision, RiskFlag};

/// Diff two decisions (A relative to B).
pub fn diff(a: &Decision, b: &Decision) -> ComparisonDiff {
    ComparisonDiff {
        score_delta: a.score as i32 - b.score as i32,
        tier_a: a.risk_tier,
        tier_b: b.risk_tier,
        tier_changed: a.risk_tier != b.risk_tier,
        flags_only_a: only_in(&a.flags.flags, &b.flags.flags),
        flags_only_b: only_in(&b.flags.flags, &a.flags.flags),
    }
}

fn only_in(these: &[RiskFlag], those: &[RiskFlag]) -> Vec<RiskFlag> {
    these
        .iter()
        .copied()
        .filter(|f| !those.contains(f))
        .collect()
}
