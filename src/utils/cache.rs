//! Decision Cache
//!
//! Keyed by wallet + profile so the same wallet under different
//! profiles never collides. Entries expire by TTL; a background task
//! sweeps expired entries so the map does not grow unbounded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::config::CACHE_TTL_SECS;
use crate::models::Decision;

#[derive(Clone)]
struct CacheEntry {
    decision: Decision,
    created_at: Instant,
}

/// TTL cache for computed decisions
pub struct DecisionCache {
    entries: DashMap<String, CacheEntry>,
    ttl_secs: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL_SECS)
    }

    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_secs,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache key: lowercase wallet + profile name
    pub fn fingerprint(address: &str, profile: &str) -> String {
        format!("{}:{}", address.to_lowercase(), profile)
    }

    pub fn get(&self, key: &str) -> Option<Decision> {
        if let Some(entry) = self.entries.get(key) {
            if entry.created_at.elapsed().as_secs() < self.ttl_secs {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache hit");
                return Some(entry.decision.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: String, decision: Decision) {
        self.entries.insert(
            key,
            CacheEntry {
                decision,
                created_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop every expired entry. Called periodically from a
    /// background task.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.created_at.elapsed().as_secs() < self.ttl_secs);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Cache cleanup");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            entries: self.entries.len(),
            hits,
            misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
            ttl_secs: self.ttl_secs,
        }
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskFlagSet, RiskTier, ScoreBreakdown, Verdict};

    fn decision(address: &str) -> Decision {
        Decision {
            address: address.to_string(),
            profile: "aave".to_string(),
            risk_tier: RiskTier::Low,
            verdict: Verdict::Allow,
            max_ltv: 0.8,
            apr: 4.5,
            score: 90,
            flags: RiskFlagSet::default(),
            breakdown: ScoreBreakdown {
                total: 90,
                components: vec![],
            },
        }
    }

    #[test]
    fn test_fingerprint_separates_profiles() {
        let a = DecisionCache::fingerprint("0xABC", "aave");
        let b = DecisionCache::fingerprint("0xabc", "morpho");
        assert_eq!(a, "0xabc:aave");
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_get_roundtrip() {
        let cache = DecisionCache::new();
        let key = DecisionCache::fingerprint("0xabc", "aave");
        cache.set(key.clone(), decision("0xabc"));

        let hit = cache.get(&key).unwrap();
        assert_eq!(hit.score, 90);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let cache = DecisionCache::new();
        assert!(cache.get("0xdead:aave").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = DecisionCache::with_ttl(0);
        let key = DecisionCache::fingerprint("0xabc", "aave");
        cache.set(key.clone(), decision("0xabc"));

        assert!(cache.get(&key).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_cleanup_expired() {
        let cache = DecisionCache::with_ttl(0);
        cache.set("a".to_string(), decision("0xa"));
        cache.set("b".to_string(), decision("0xb"));

        assert_eq!(cache.cleanup_expired(), 2);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_invalidate() {
        let cache = DecisionCache::new();
        cache.set("a".to_string(), decision("0xa"));
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
    }

    #[test]
    fn test_hit_rate() {
        let cache = DecisionCache::new();
        cache.set("a".to_string(), decision("0xa"));
        cache.get("a");
        cache.get("missing");

        let stats = cache.stats();
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }
}
