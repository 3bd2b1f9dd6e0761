//! Core Domain Types
//!
//! Everything the scoring pipeline passes between stages:
//! raw provider rows -> ActivityLog -> FeatureVector -> RiskFlagSet
//! -> ScoreBreakdown -> Decision. Each stage owns and returns a new
//! immutable value; no stage mutates its input.

use serde::{Deserialize, Serialize};

/// One raw row as returned by the Etherscan account endpoints.
///
/// Etherscan returns every numeric field as a string, and partial rows
/// do happen in the wild, so everything is optional here. The
/// normalizer decides what is usable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub time_stamp: Option<String>,
    pub hash: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub token_symbol: Option<String>,
    #[serde(default)]
    pub token_decimal: Option<String>,
}

/// Kind of on-chain event a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Erc20,
    Normal,
    Internal,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Erc20 => "erc20",
            RecordKind::Normal => "normal",
            RecordKind::Internal => "internal",
        }
    }
}

/// Direction of value flow relative to the wallet being scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

/// One validated on-chain event. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    pub kind: RecordKind,
    /// Unix timestamp (seconds)
    pub timestamp: i64,
    /// The other side of the transfer, lowercase. Empty when the
    /// provider row had no usable counterparty.
    pub counterparty: String,
    /// Value in whole native/token units (wei and raw token amounts
    /// are scaled down by their decimals during normalization)
    pub value: f64,
    /// Token contract address for ERC-20 transfers, None for native
    pub token: Option<String>,
    /// Token symbol, used for the stablecoin ratio feature
    pub token_symbol: Option<String>,
    pub direction: Direction,
    /// Transaction hash, kept for dedup diagnostics
    pub hash: Option<String>,
}

/// Chronologically ordered activity for one wallet.
///
/// Insertion order equals chronological order; may be empty (the
/// empty log is the state that later trips the hard gate).
#[derive(Debug, Clone, Serialize)]
pub struct ActivityLog {
    /// Wallet address, lowercase
    pub address: String,
    pub records: Vec<ActivityRecord>,
    /// Malformed rows dropped during normalization. Diagnostic only,
    /// never blocks scoring.
    pub dropped_records: u32,
    /// Earliest-ever transaction timestamp when the provider looked
    /// it up separately (full history can be older than the fetched
    /// pages)
    pub first_seen_ts: Option<i64>,
    /// True when the provider hit its paging ceiling and the log is
    /// known to be partial
    pub truncated: bool,
}

impl ActivityLog {
    /// An empty log for a wallet. Used when the provider returns
    /// nothing or fails: scoring degrades to the hard-gate path
    /// instead of erroring.
    pub fn empty(address: &str) -> Self {
        Self {
            address: address.to_lowercase(),
            records: Vec::new(),
            dropped_records: 0,
            first_seen_ts: None,
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fixed-shape feature snapshot derived from one ActivityLog.
///
/// Pure function of (log, now). Every ratio is guarded against a zero
/// denominator so no NaN/infinity ever reaches later stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureVector {
    /// Days since the earliest known transaction (0 for an empty log)
    pub wallet_age_days: u32,
    pub total_tx_count: u32,
    pub unique_counterparties: u32,
    pub unique_tokens: u32,
    /// Sum of inbound values, whole units
    pub inbound_value: f64,
    /// Sum of outbound values, whole units
    pub outbound_value: f64,
    /// Distinct counterparties / total tx count (0 for empty log)
    pub diversity: f64,
    /// Max tx-per-day over mean tx-per-day across the observation
    /// window; 0 for an empty log, higher = burstier
    pub burstiness: f64,
    /// Top counterparty's share of total transaction count (0-1)
    pub concentration: f64,
    /// Distinct UTC days with at least one transaction
    pub active_days: u32,
    /// active_days / observation window days (0-1)
    pub consistency: f64,
    /// Share of ERC-20 transfers involving a known stablecoin (0-1)
    pub stablecoin_ratio: f64,
    pub days_since_last_activity: u32,
    /// Carried through from normalization for the features endpoint
    pub dropped_records: u32,
    /// Provider hit its paging ceiling; history is partial
    pub history_truncated: bool,
}

/// Named boolean risk indicators, each an independent threshold
/// predicate over the feature vector. Not mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    NewWallet,
    BurstyActivity,
    LowDiversity,
    CounterpartyConcentration,
    Dormant,
    InsufficientHistory,
    HistoryTruncated,
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::NewWallet => "new_wallet",
            RiskFlag::BurstyActivity => "bursty_activity",
            RiskFlag::LowDiversity => "low_diversity",
            RiskFlag::CounterpartyConcentration => "counterparty_concentration",
            RiskFlag::Dormant => "dormant",
            RiskFlag::InsufficientHistory => "insufficient_history",
            RiskFlag::HistoryTruncated => "history_truncated",
        }
    }
}

/// Set of active risk flags, in fixed evaluation order so output is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskFlagSet {
    pub flags: Vec<RiskFlag>,
}

impl RiskFlagSet {
    pub fn contains(&self, flag: RiskFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }
}

/// One line of the score explanation. Deductions appear as entries
/// with negative points and max_points 0, so the breakdown stays
/// exhaustive: clamp(sum of points, 0, 100) == total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: String,
    pub points: i32,
    pub max_points: i32,
    pub explanation: String,
}

/// Total score (0-100) plus the itemized component list behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: u8,
    pub components: Vec<ScoreComponent>,
}

impl ScoreBreakdown {
    /// Raw (pre-clamp) sum of all component points
    pub fn component_sum(&self) -> i32 {
        self.components.iter().map(|c| c.points).sum()
    }
}

/// Coarse risk category derived from the score via profile bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

/// Lending verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "ALLOW")]
    Allow,
    #[serde(rename = "LIMIT")]
    Limit,
    #[serde(rename = "DENY")]
    Deny,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Allow => "ALLOW",
            Verdict::Limit => "LIMIT",
            Verdict::Deny => "DENY",
        }
    }
}

/// The lending-policy decision for one wallet under one profile.
/// Produced fresh per request, never mutated after creation.
///
/// DENY decisions still carry the terms that would apply if the gate
/// were overridden, for transparency; the verdict itself blocks use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub address: String,
    pub profile: String,
    pub risk_tier: RiskTier,
    pub verdict: Verdict,
    pub max_ltv: f64,
    pub apr: f64,
    pub score: u8,
    pub flags: RiskFlagSet,
    pub breakdown: ScoreBreakdown,
}

/// Side-by-side diff of two decisions.
///
/// compare(A, B) and compare(B, A) yield the same per-wallet
/// decisions with these fields sign-flipped / swapped consistently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonDiff {
    /// score(A) - score(B)
    pub score_delta: i32,
    pub tier_a: RiskTier,
    pub tier_b: RiskTier,
    pub tier_changed: bool,
    pub flags_only_a: Vec<RiskFlag>,
    pub flags_only_b: Vec<RiskFlag>,
}

/// The three raw record lists one provider fetch yields for a wallet,
/// plus fetch diagnostics consumed by the normalizer.
#[derive(Debug, Default)]
pub struct ActivityBatches {
    pub erc20: Vec<RawRecord>,
    pub normal: Vec<RawRecord>,
    pub internal: Vec<RawRecord>,
    /// Earliest-ever normal tx timestamp, looked up separately so
    /// wallet age is not capped by the fetch window
    pub first_seen_ts: Option<i64>,
    /// Any bucket hit the provider paging ceiling
    pub truncated: bool,
}
