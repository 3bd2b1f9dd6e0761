//! Feature Extractor
//!
//! Reduces an ActivityLog to the fixed-shape FeatureVector. Pure
//! function of (log, now): no wall clock, no randomness, every
//! denominator guarded so NaN/infinity never leaks downstream.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::config;
use crate::models::{ActivityLog, Direction, FeatureVector, RecordKind};

const SECS_PER_DAY: i64 = 86_400;

/// Extract the feature vector for one wallet.
///
/// `now_ts` is captured once by the caller and threaded through as
/// data, which keeps repeated evaluation of the same inputs
/// bit-identical.
pub fn extract(log: &ActivityLog, now_ts: i64) -> FeatureVector {
    if log.is_empty() {
        // The all-zero vector: age 0, counts 0. This is the state
        // that trips the insufficient_history hard gate later.
        return FeatureVector {
            dropped_records: log.dropped_records,
            history_truncated: log.truncated,
            ..Default::default()
        };
    }

    let first_in_log = log.records.first().map(|r| r.timestamp).unwrap_or(now_ts);
    let last_ts = log.records.last().map(|r| r.timestamp).unwrap_or(now_ts);

    // Prefer the provider's first-ever lookup: the fetched pages can
    // start long after the wallet's true birth
    let first_ts = match log.first_seen_ts {
        Some(seen) => seen.min(first_in_log),
        None => first_in_log,
    };

    let wallet_age_days = days_between(first_ts, now_ts);
    let days_since_last_activity = days_between(last_ts, now_ts);

    let total = log.records.len() as u32;

    let mut counterparties: HashMap<&str, u32> = HashMap::new();
    let mut tokens: HashSet<&str> = HashSet::new();
    let mut day_buckets: HashMap<i64, u32> = HashMap::new();
    let mut inbound_value = 0.0;
    let mut outbound_value = 0.0;
    let mut erc20_count: u32 = 0;
    let mut stable_count: u32 = 0;

    for rec in &log.records {
        if !rec.counterparty.is_empty() {
            *counterparties.entry(rec.counterparty.as_str()).or_insert(0) += 1;
        }
        if let Some(token) = &rec.token {
            tokens.insert(token.as_str());
        }
        *day_buckets.entry(rec.timestamp.div_euclid(SECS_PER_DAY)).or_insert(0) += 1;

        match rec.direction {
            Direction::In => inbound_value += rec.value,
            Direction::Out => outbound_value += rec.value,
        }

        if rec.kind == RecordKind::Erc20 {
            erc20_count += 1;
            if let Some(sym) = &rec.token_symbol {
                if config::STABLE_SYMBOLS.contains(&sym.as_str()) {
                    stable_count += 1;
                }
            }
        }
    }

    let unique_counterparties = counterparties.len() as u32;
    let unique_tokens = tokens.len() as u32;
    let active_days = day_buckets.len() as u32;

    // Guarded ratios. total > 0 here (empty log returned early).
    let diversity = unique_counterparties as f64 / total as f64;

    // Observation window spans first-to-last activity in the log,
    // floored so a single tight cluster cannot define its own tiny
    // window and look smooth
    let span_days = days_between(first_in_log, last_ts) + 1;
    let window_days = span_days.max(config::MIN_OBSERVATION_DAYS);

    let max_per_day = day_buckets.values().copied().max().unwrap_or(0);
    let mean_per_day = total as f64 / window_days as f64;
    let burstiness = if mean_per_day > 0.0 {
        max_per_day as f64 / mean_per_day
    } else {
        0.0
    };

    let consistency = active_days as f64 / window_days as f64;

    let top_counterparty = counterparties.values().copied().max().unwrap_or(0);
    let concentration = top_counterparty as f64 / total as f64;

    let stablecoin_ratio = if erc20_count > 0 {
        stable_count as f64 / erc20_count as f64
    } else {
        0.0
    };

    FeatureVector {
        wallet_age_days,
        total_tx_count: total,
        unique_counterparties,
        unique_tokens,
        inbound_value,
        outbound_value,
        diversity,
        burstiness,
        concentration,
        active_days,
        consistency,
        stablecoin_ratio,
        days_since_last_activity,
        dropped_records: log.dropped_records,
        history_truncated: log.truncated,
    }
}

fn days_between(from_ts: i64, to_ts: i64) -> u32 {
    ((to_ts - from_ts).max(0) / SECS_PER_DAY) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityRecord, RiskFlag};

    const NOW: i64 = 1_700_000_000;

    fn record(ts: i64, counterparty: &str, direction: Direction, value: f64) -> ActivityRecord {
        ActivityRecord {
            kind: RecordKind::Normal,
            timestamp: ts,
            counterparty: counterparty.to_string(),
            value,
            token: None,
            token_symbol: None,
            direction,
            hash: Some(format!("0x{:x}", ts)),
        }
    }

    fn log_of(records: Vec<ActivityRecord>) -> ActivityLog {
        ActivityLog {
            address: "0xabc".to_string(),
            records,
            dropped_records: 0,
            first_seen_ts: None,
            truncated: false,
        }
    }

    #[test]
    fn test_empty_log_all_zero() {
        let fv = extract(&ActivityLog::empty("0xabc"), NOW);
        assert_eq!(fv.wallet_age_days, 0);
        assert_eq!(fv.total_tx_count, 0);
        assert_eq!(fv.diversity, 0.0);
        assert_eq!(fv.burstiness, 0.0);
        assert_eq!(fv.concentration, 0.0);
        let _ = RiskFlag::InsufficientHistory; // this vector is what trips it
    }

    #[test]
    fn test_no_nan_or_infinity_anywhere() {
        let logs = vec![
            log_of(vec![]),
            log_of(vec![record(NOW, "0xcp", Direction::In, 1.0)]),
            log_of(vec![
                record(NOW - 100, "", Direction::In, 0.0),
                record(NOW - 50, "", Direction::Out, 0.0),
            ]),
        ];
        for log in &logs {
            let fv = extract(log, NOW);
            for v in [
                fv.diversity,
                fv.burstiness,
                fv.concentration,
                fv.consistency,
                fv.stablecoin_ratio,
                fv.inbound_value,
                fv.outbound_value,
            ] {
                assert!(v.is_finite(), "non-finite feature from {:?}", log.records.len());
            }
        }
    }

    #[test]
    fn test_wallet_age_and_dormancy() {
        let log = log_of(vec![
            record(NOW - 400 * 86_400, "0xcp1", Direction::In, 1.0),
            record(NOW - 100 * 86_400, "0xcp2", Direction::Out, 0.5),
        ]);
        let fv = extract(&log, NOW);
        assert_eq!(fv.wallet_age_days, 400);
        assert_eq!(fv.days_since_last_activity, 100);
    }

    #[test]
    fn test_first_seen_hint_extends_age() {
        let mut log = log_of(vec![record(NOW - 10 * 86_400, "0xcp", Direction::In, 1.0)]);
        log.first_seen_ts = Some(NOW - 1000 * 86_400);
        let fv = extract(&log, NOW);
        assert_eq!(fv.wallet_age_days, 1000);
    }

    #[test]
    fn test_single_tight_cluster_is_bursty() {
        // 20 transactions inside one hour: the 30-day window floor
        // makes this high-burstiness even though the span is tiny
        let records = (0..20)
            .map(|i| record(NOW - 3600 + i * 60, "0xcp", Direction::In, 0.1))
            .collect();
        let fv = extract(&log_of(records), NOW);
        assert!(
            fv.burstiness >= config::MAX_BURSTINESS,
            "burstiness {} should trip the flag threshold",
            fv.burstiness
        );
    }

    #[test]
    fn test_even_activity_is_not_bursty() {
        // One transaction per day for 60 days
        let records = (0..60)
            .map(|i| record(NOW - i * 86_400, format!("0xcp{}", i % 10).as_str(), Direction::In, 0.1))
            .collect();
        let fv = extract(&log_of(records), NOW);
        assert!(fv.burstiness < 2.0, "burstiness {} too high", fv.burstiness);
    }

    #[test]
    fn test_concentration_by_count() {
        let log = log_of(vec![
            record(NOW - 300, "0xwhale", Direction::In, 1.0),
            record(NOW - 200, "0xwhale", Direction::In, 1.0),
            record(NOW - 100, "0xwhale", Direction::Out, 1.0),
            record(NOW - 50, "0xother", Direction::Out, 100.0),
        ]);
        let fv = extract(&log, NOW);
        // Share of tx count, not value: 3 of 4
        assert!((fv.concentration - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_value_totals_by_direction() {
        let log = log_of(vec![
            record(NOW - 300, "0xa", Direction::In, 2.5),
            record(NOW - 200, "0xb", Direction::In, 1.5),
            record(NOW - 100, "0xc", Direction::Out, 3.0),
        ]);
        let fv = extract(&log, NOW);
        assert!((fv.inbound_value - 4.0).abs() < 1e-9);
        assert!((fv.outbound_value - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stablecoin_ratio() {
        let mut a = record(NOW - 300, "0xa", Direction::In, 100.0);
        a.kind = RecordKind::Erc20;
        a.token = Some("0xusdc".to_string());
        a.token_symbol = Some("USDC".to_string());
        let mut b = record(NOW - 200, "0xb", Direction::In, 5.0);
        b.kind = RecordKind::Erc20;
        b.token = Some("0xpepe".to_string());
        b.token_symbol = Some("PEPE".to_string());

        let fv = extract(&log_of(vec![a, b]), NOW);
        assert!((fv.stablecoin_ratio - 0.5).abs() < 1e-9);
        assert_eq!(fv.unique_tokens, 2);
    }
}
