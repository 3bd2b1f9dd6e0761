//! Decision Engine
//!
//! The entry points the serving layer calls: feature extraction, full
//! decision computation, and two-wallet comparison. Every function is
//! a pure, synchronous composition of the pipeline stages over
//! immutable inputs; `now_ts` is captured once by the caller so the
//! whole computation is a deterministic function of its arguments.

use crate::core::{compare as comparator, features, flags, policy, score};
use crate::models::{ActivityLog, AppResult, ComparisonDiff, Decision, FeatureVector};

/// Extract the feature vector for one wallet (explainability/export
/// surface).
pub fn compute_features(log: &ActivityLog, now_ts: i64) -> FeatureVector {
    features::extract(log, now_ts)
}

/// Run the full pipeline for one wallet under one profile.
///
/// Fails only on an unknown profile name. An empty activity log never
/// fails: it flows into the hard-gate path and yields a well-formed
/// DENY decision.
pub fn compute_decision(
    log: &ActivityLog,
    profile_name: Option<&str>,
    now_ts: i64,
) -> AppResult<Decision> {
    let profile = policy::Profile::resolve(profile_name)?;

    let fv = features::extract(log, now_ts);
    let flag_set = flags::evaluate(&fv);
    let breakdown = score::score(&fv, &flag_set);

    Ok(policy::decide(&log.address, profile, breakdown, flag_set))
}

/// Run the pipeline for two wallets and diff the outcomes.
///
/// Each side is evaluated independently; a wallet whose activity
/// could not be fetched arrives here as an empty log and degrades to
/// the hard-gate path instead of failing the comparison.
pub fn compare(
    log_a: &ActivityLog,
    log_b: &ActivityLog,
    profile_name: Option<&str>,
    now_ts: i64,
) -> AppResult<(Decision, Decision, ComparisonDiff)> {
    let decision_a = compute_decision(log_a, profile_name, now_ts)?;
    let decision_b = compute_decision(log_b, profile_name, now_ts)?;
    let diff = comparator::diff(&decision_a, &decision_b);
    Ok((decision_a, decision_b, diff))
}
