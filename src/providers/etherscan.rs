//! Etherscan V2 Data Provider
//!
//! Fetches a wallet's ERC-20 transfer, normal-transaction and
//! internal-transaction history. This is the only I/O in the service
//! and it runs strictly before the scoring pipeline.
//!
//! Constraints respected here:
//! - Etherscan paging: page * offset <= 10000 (1000 rows x 10 pages)
//! - free-tier rate limit: global throttle of 400ms between calls,
//!   exponential backoff with jitter when rate-limited
//! - rows are filtered locally to a lookback window; with descending
//!   sort, paging stops as soon as a page reaches past the cutoff
//! - "No transactions found" is an empty bucket, not an error
//! - a single failed bucket degrades to empty and the pipeline's
//!   hard gate absorbs it; only a total failure aborts the request

use std::time::{Duration, Instant};

use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::{ActivityBatches, AppError, AppResult, ErrorCode, RawRecord};

const ETHERSCAN_V2_BASE: &str = "https://api.etherscan.io/v2/api";
const CHAIN_ID_ETH: u64 = 1;

const PAGE_SIZE: usize = 1000;
const MAX_PAGES: usize = 10;

/// How far back fetched activity reaches. Matches the horizon past
/// which the scoring components saturate anyway; the separate
/// first-seen lookup keeps wallet age accurate beyond it.
const LOOKBACK_DAYS: i64 = 730;
const SECS_PER_DAY: i64 = 86_400;

const REQUEST_TIMEOUT_SECS: u64 = 20;
const MIN_MS_BETWEEN_CALLS: u64 = 400;
const MAX_RETRIES: u32 = 6;
const BACKOFF_BASE_MS: u64 = 800;

/// Raw Etherscan response envelope. `result` is rows on success and a
/// free-text complaint on NOTOK, hence the Value.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

/// Etherscan V2 account-history client
pub struct EtherscanClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Global throttle shared by all calls on this client
    last_call: Mutex<Option<Instant>>,
}

impl EtherscanClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: ETHERSCAN_V2_BASE.to_string(),
            api_key: api_key.into(),
            last_call: Mutex::new(None),
        }
    }

    /// Fetch all three activity buckets plus the first-ever
    /// transaction timestamp for one address.
    pub async fn fetch_activity(&self, address: &str) -> AppResult<ActivityBatches> {
        let cutoff_ts = chrono::Utc::now().timestamp() - LOOKBACK_DAYS * SECS_PER_DAY;

        let mut truncated = false;
        let mut last_err: Option<AppError> = None;
        let mut failures = 0u8;

        // Buckets are fetched sequentially: the global throttle makes
        // concurrency a no-op against the free tier anyway
        let erc20 = self
            .fetch_bucket(address, "tokentx", cutoff_ts, &mut truncated, &mut failures, &mut last_err)
            .await;
        let normal = self
            .fetch_bucket(address, "txlist", cutoff_ts, &mut truncated, &mut failures, &mut last_err)
            .await;
        let internal = self
            .fetch_bucket(address, "txlistinternal", cutoff_ts, &mut truncated, &mut failures, &mut last_err)
            .await;

        if failures == 3 {
            return Err(last_err
                .unwrap_or_else(|| AppError::provider_error("All activity buckets failed")));
        }

        let first_seen_ts = match self.first_seen_ts(address).await {
            Ok(ts) => ts,
            Err(e) => {
                warn!(wallet = %address, error = %e, "First-seen lookup failed, age falls back to fetched window");
                None
            }
        };

        Ok(ActivityBatches {
            erc20,
            normal,
            internal,
            first_seen_ts,
            truncated,
        })
    }

    async fn fetch_bucket(
        &self,
        address: &str,
        action: &str,
        cutoff_ts: i64,
        truncated: &mut bool,
        failures: &mut u8,
        last_err: &mut Option<AppError>,
    ) -> Vec<RawRecord> {
        match self.fetch_action(address, action, cutoff_ts).await {
            Ok((rows, bucket_truncated)) => {
                debug!(wallet = %address, action, rows = rows.len(), "Bucket fetched");
                *truncated |= bucket_truncated;
                rows
            }
            Err(e) => {
                warn!(wallet = %address, action, error = %e, "Bucket fetch failed, degrading to empty");
                *failures += 1;
                *last_err = Some(e);
                Vec::new()
            }
        }
    }

    /// Page through one account action, newest first, keeping only
    /// rows at or after `cutoff_ts`. Descending sort lets paging stop
    /// the moment a page reaches past the cutoff. Returns the rows
    /// and whether the paging ceiling was hit with the window still
    /// open (history partial).
    async fn fetch_action(
        &self,
        address: &str,
        action: &str,
        cutoff_ts: i64,
    ) -> AppResult<(Vec<RawRecord>, bool)> {
        let mut all_rows: Vec<RawRecord> = Vec::new();
        let mut truncated = false;

        for page in 1..=MAX_PAGES {
            let rows = self
                .call_rows(&[
                    ("action", action.to_string()),
                    ("address", address.to_string()),
                    ("page", page.to_string()),
                    ("offset", PAGE_SIZE.to_string()),
                    ("sort", "desc".to_string()),
                ])
                .await?;

            let full_page = rows.len() >= PAGE_SIZE;
            let (kept, reached_cutoff) = split_at_cutoff(rows, cutoff_ts);
            all_rows.extend(kept);

            if reached_cutoff || !full_page {
                break;
            }
            if page == MAX_PAGES {
                truncated = true;
            }
        }

        Ok((all_rows, truncated))
    }

    /// Earliest-ever normal tx timestamp (sort=asc, offset=1), so
    /// wallet age reflects the full history and not just the fetched
    /// pages.
    async fn first_seen_ts(&self, address: &str) -> AppResult<Option<i64>> {
        let rows = self
            .call_rows(&[
                ("action", "txlist".to_string()),
                ("address", address.to_string()),
                ("page", "1".to_string()),
                ("offset", "1".to_string()),
                ("sort", "asc".to_string()),
            ])
            .await?;

        Ok(rows
            .first()
            .and_then(|r| r.time_stamp.as_deref())
            .and_then(|ts| ts.trim().parse::<i64>().ok()))
    }

    /// One call, parsed to rows. "No transactions found" is an empty
    /// list; NOTOK after retries is an error.
    async fn call_rows(&self, params: &[(&str, String)]) -> AppResult<Vec<RawRecord>> {
        let envelope = self.call(params).await?;

        if envelope.status == "1" {
            return serde_json::from_value(envelope.result).map_err(AppError::from);
        }

        if is_empty_result(&envelope) {
            return Ok(Vec::new());
        }

        Err(AppError::provider_error(format!(
            "Etherscan NOTOK: message={}, result={}",
            envelope.message, envelope.result
        )))
    }

    /// One Etherscan V2 call with global throttling and
    /// exponential-backoff retry on rate limits / transport errors.
    async fn call(&self, params: &[(&str, String)]) -> AppResult<Envelope> {
        let mut last_err = AppError::new(ErrorCode::ProviderError, "Retries exhausted");

        for attempt in 1..=MAX_RETRIES {
            self.throttle_wait().await;

            let mut query: Vec<(&str, String)> = vec![
                ("chainid", CHAIN_ID_ETH.to_string()),
                ("module", "account".to_string()),
                ("apikey", self.api_key.clone()),
            ];
            query.extend(params.iter().map(|(k, v)| (*k, v.clone())));

            let result = self
                .client
                .get(&self.base_url)
                .query(&query)
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .send()
                .await;

            let envelope: Option<Envelope> = match result {
                Ok(response) => response.json().await.ok(),
                Err(e) => {
                    last_err = AppError::from(e);
                    None
                }
            };

            let Some(envelope) = envelope else {
                self.backoff(attempt).await;
                continue;
            };

            if envelope.status == "1" {
                return Ok(envelope);
            }

            if is_rate_limited(&envelope) {
                last_err = AppError::provider_rate_limited(format!(
                    "{} / {}",
                    envelope.message, envelope.result
                ));
                self.backoff(attempt).await;
                continue;
            }

            // Other NOTOK (empty result, invalid key, ...) is not
            // going to improve with retries
            return Ok(envelope);
        }

        Err(last_err)
    }

    async fn throttle_wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let min_gap = Duration::from_millis(MIN_MS_BETWEEN_CALLS);
            let elapsed = prev.elapsed();
            if elapsed < min_gap {
                tokio::time::sleep(min_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn backoff(&self, attempt: u32) {
        let jitter = rand::thread_rng().gen_range(0..200);
        let sleep_ms = BACKOFF_BASE_MS * 2u64.pow(attempt.saturating_sub(1)) + jitter;
        debug!(attempt, sleep_ms, "Etherscan backoff");
        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
    }
}

/// Drop rows older than the cutoff and report whether any were seen
/// (with descending sort that means every later page is older too).
/// Rows with an unparsable timestamp pass through so the normalizer
/// counts them as dropped instead of them vanishing silently.
fn split_at_cutoff(rows: Vec<RawRecord>, cutoff_ts: i64) -> (Vec<RawRecord>, bool) {
    let mut reached_cutoff = false;
    let kept = rows
        .into_iter()
        .filter(|row| match row_ts(row) {
            Some(ts) if ts < cutoff_ts => {
                reached_cutoff = true;
                false
            }
            _ => true,
        })
        .collect();
    (kept, reached_cutoff)
}

fn row_ts(row: &RawRecord) -> Option<i64> {
    row.time_stamp.as_deref().and_then(|ts| ts.trim().parse().ok())
}

fn is_rate_limited(envelope: &Envelope) -> bool {
    let combined = format!("{} {}", envelope.message, envelope.result).to_lowercase();
    combined.contains("rate limit") || combined.contains("max calls per sec")
}

fn is_empty_result(envelope: &Envelope) -> bool {
    envelope.message.to_lowercase().contains("no transactions found")
        || matches!(&envelope.result, Value::Array(rows) if rows.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(status: &str, message: &str, result: Value) -> Envelope {
        Envelope {
            status: status.to_string(),
            message: message.to_string(),
            result,
        }
    }

    #[test]
    fn test_rate_limit_detection() {
        let e = envelope("0", "NOTOK", Value::String("Max calls per sec rate limit reached".into()));
        assert!(is_rate_limited(&e));

        let e = envelope("0", "NOTOK", Value::String("Invalid API Key".into()));
        assert!(!is_rate_limited(&e));
    }

    #[test]
    fn test_empty_result_detection() {
        let e = envelope("0", "No transactions found", Value::Array(vec![]));
        assert!(is_empty_result(&e));

        let e = envelope("0", "NOTOK", Value::String("error".into()));
        assert!(!is_empty_result(&e));
    }

    #[test]
    fn test_row_parsing_from_etherscan_shape() {
        let raw = serde_json::json!([{
            "timeStamp": "1700000000",
            "hash": "0xabc",
            "from": "0x1111111111111111111111111111111111111111",
            "to": "0x2222222222222222222222222222222222222222",
            "value": "1000000000000000000",
            "contractAddress": "",
            "tokenSymbol": "USDC",
            "tokenDecimal": "6"
        }]);

        let rows: Vec<RawRecord> = serde_json::from_value(raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time_stamp.as_deref(), Some("1700000000"));
        assert_eq!(rows[0].token_symbol.as_deref(), Some("USDC"));
    }

    fn row_at(ts: i64) -> RawRecord {
        RawRecord {
            time_stamp: Some(ts.to_string()),
            hash: Some(format!("0x{:x}", ts)),
            ..Default::default()
        }
    }

    #[test]
    fn test_cutoff_filters_old_rows_and_stops_paging() {
        let cutoff = 1_000;
        let rows = vec![row_at(3_000), row_at(2_000), row_at(500)];

        let (kept, reached_cutoff) = split_at_cutoff(rows, cutoff);
        assert_eq!(kept.len(), 2);
        assert!(reached_cutoff, "a pre-cutoff row must stop paging");
        assert!(kept.iter().all(|r| row_ts(r).unwrap() >= cutoff));
    }

    #[test]
    fn test_cutoff_keeps_whole_page_inside_window() {
        let rows = vec![row_at(3_000), row_at(2_000)];
        let (kept, reached_cutoff) = split_at_cutoff(rows, 1_000);
        assert_eq!(kept.len(), 2);
        assert!(!reached_cutoff);
    }

    #[test]
    fn test_cutoff_passes_unparsable_timestamps_through() {
        // The normalizer counts these as dropped; the window filter
        // must not make them vanish silently
        let rows = vec![
            row_at(2_000),
            RawRecord {
                time_stamp: Some("garbage".to_string()),
                hash: Some("0xbad".to_string()),
                ..Default::default()
            },
            RawRecord::default(),
        ];
        let (kept, reached_cutoff) = split_at_cutoff(rows, 1_000);
        assert_eq!(kept.len(), 3);
        assert!(!reached_cutoff);
    }

    #[test]
    fn test_partial_rows_deserialize() {
        // Missing fields must not fail deserialization; the
        // normalizer drops unusable rows later
        let raw = serde_json::json!([{ "hash": "0xabc" }]);
        let rows: Vec<RawRecord> = serde_json::from_value(raw).unwrap();
        assert!(rows[0].time_stamp.is_none());
    }
}
