//! Lightweight service counters exposed on the stats endpoint. Atomic
//! counters only, no external metrics stack.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::models::Verdict;

#[derive(Default)]
pub struct TelemetryCollector {
    decisions_allow: AtomicU64,
    decisions_limit: AtomicU64,
    decisions_deny: AtomicU64,
    comparisons: AtomicU64,
    feature_requests: AtomicU64,
    total_latency_ms: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryStats {
    pub decisions_total: u64,
    pub decisions_allow: u64,
    pub decisions_limit: u64,
    pub decisions_deny: u64,
    pub comparisons: u64,
    pub feature_requests: u64,
    pub avg_latency_ms: f64,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_decision(&self, verdict: Verdict, latency_ms: u64) {
        match verdict {
            Verdict::Allow => self.decisions_allow.fetch_add(1, Ordering::Relaxed),
            Verdict::Limit => self.decisions_limit.fetch_add(1, Ordering::Relaxed),
            Verdict::Deny => self.decisions_deny.fetch_add(1, Ordering::Relaxed),
        };
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_comparison(&self) {
        self.comparisons.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feature_request(&self) {
        self.feature_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let allow = self.decisions_allow.load(Ordering::Relaxed);
        let limit = self.decisions_limit.load(Ordering::Relaxed);
        let deny = self.decisions_deny.load(Ordering::Relaxed);
        let total = allow + limit + deny;
        let latency = self.total_latency_ms.load(Ordering::Relaxed);

        TelemetryStats {
            decisions_total: total,
            decisions_allow: allow,
            decisions_limit: limit,
            decisions_deny: deny,
            comparisons: self.comparisons.load(Ordering::Relaxed),
            feature_requests: self.feature_requests.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                latency as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}
