//! Activity Normalizer
//!
//! Merges the three Etherscan record buckets (ERC-20, normal,
//! internal) for one address into a single chronologically ordered
//! ActivityLog. Malformed rows are dropped and counted, never fatal:
//! sparse or dirty provider data is expected, and an empty log is a
//! first-class outcome handled downstream by the hard gate.

use std::collections::HashSet;

use crate::models::{
    ActivityBatches, ActivityLog, ActivityRecord, Direction, RawRecord, RecordKind,
};

/// Build a normalized activity log from raw provider batches.
///
/// - rows without a parsable timestamp or with a negative value are
///   dropped (counted in `dropped_records`)
/// - duplicates (same kind + tx hash) are removed; hashless rows are
///   kept as-is since there is nothing to dedupe on
/// - output is sorted ascending by timestamp, hash as tie-breaker so
///   ordering is deterministic
pub fn normalize(address: &str, batches: ActivityBatches) -> ActivityLog {
    let wallet = address.to_lowercase();
    let mut records = Vec::new();
    let mut dropped: u32 = 0;
    let mut seen: HashSet<(RecordKind, String)> = HashSet::new();

    let buckets = [
        (RecordKind::Erc20, batches.erc20),
        (RecordKind::Normal, batches.normal),
        (RecordKind::Internal, batches.internal),
    ];

    for (kind, rows) in buckets {
        for row in rows {
            match parse_record(&wallet, kind, &row) {
                Some(record) => {
                    if let Some(hash) = &record.hash {
                        if !seen.insert((kind, hash.clone())) {
                            continue; // duplicate
                        }
                    }
                    records.push(record);
                }
                None => dropped += 1,
            }
        }
    }

    // Stable order: timestamp, then hash so equal-second records do
    // not reshuffle between runs
    records.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.hash.cmp(&b.hash))
    });

    if dropped > 0 {
        tracing::debug!(wallet = %wallet, dropped, "Dropped malformed provider rows");
    }

    ActivityLog {
        address: wallet,
        records,
        dropped_records: dropped,
        first_seen_ts: batches.first_seen_ts,
        truncated: batches.truncated,
    }
}

/// Validate one raw row into an ActivityRecord, or None if malformed
fn parse_record(wallet: &str, kind: RecordKind, row: &RawRecord) -> Option<ActivityRecord> {
    let timestamp: i64 = row.time_stamp.as_deref()?.trim().parse().ok()?;
    if timestamp < 0 {
        return None;
    }

    let raw_value: f64 = match row.value.as_deref() {
        Some(v) => v.trim().parse().ok()?,
        None => 0.0,
    };
    if raw_value < 0.0 || !raw_value.is_finite() {
        return None;
    }

    // ERC-20 rows carry their own decimals; native transfers are wei
    let decimals: u32 = match kind {
        RecordKind::Erc20 => row
            .token_decimal
            .as_deref()
            .and_then(|d| d.trim().parse().ok())
            .unwrap_or(18),
        _ => 18,
    };
    let value = raw_value / 10f64.powi(decimals.min(38) as i32);

    let from = row.from.as_deref().unwrap_or("").to_lowercase();
    let to = row.to.as_deref().unwrap_or("").to_lowercase();

    let (direction, counterparty) = if from == wallet && !from.is_empty() {
        (Direction::Out, to)
    } else {
        (Direction::In, from)
    };

    let token = match kind {
        RecordKind::Erc20 => row
            .contract_address
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty()),
        _ => None,
    };

    let token_symbol = row
        .token_symbol
        .as_deref()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());

    Some(ActivityRecord {
        kind,
        timestamp,
        counterparty,
        value,
        token,
        token_symbol,
        direction,
        hash: row.hash.clone(),
    })
}
